use thiserror::Error;

use crate::{
    args::FrameworkTag,
    hresult::HResult,
    host::{LocatorFailure, LocatorStage, StrategyKind},
};

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::MalformedArgument {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::MalformedArgument {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Every stage of the bootstrap pipeline fails fast and reports upward through this type. No
/// stage retries on its own: a runtime-hosting chain that failed halfway may already have
/// acquired partial state, so repeating it is left to the caller.
///
/// # Error Categories
///
/// ## Argument Errors
/// - [`Error::MalformedArgument`] - The argument blob could not be decoded or encoded
/// - [`Error::UnsupportedFramework`] - The framework tag does not select any locator strategy
///
/// ## Runtime Hosting Errors
/// - [`Error::RuntimeStartFailed`] - A locator transition failed
/// - [`Error::EntryPointExecutionFailed`] - The runtime host could not run the managed method
/// - [`Error::StaleAdapterForNewRuntime`] - "File not found" while hosting the legacy runtime
///
/// ## Arbitration Errors
/// - [`Error::HookSlotExhausted`] - The hook slot table is full
/// - [`Error::InvalidHookSlot`] - A slot index outside the table or trampoline range
/// - [`Error::LockError`] - A registry lock was poisoned
///
/// ## Other
/// - [`Error::InjectionFailed`] - The external injection primitive reported a failure
/// - [`Error::Configuration`] - A configuration value is out of range
///
/// # Examples
///
/// ```rust
/// use clrshim::{args::AdapterArguments, Error};
///
/// match AdapterArguments::decode("only*three*fields") {
///     Err(Error::MalformedArgument { message, .. }) => println!("bad blob: {}", message),
///     Err(e) => println!("other error: {}", e),
///     Ok(_) => unreachable!(),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The argument blob does not follow the field-count contract.
    ///
    /// Raised before any OS call is made. Carries the source location where the problem was
    /// detected.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed argument - {file}:{line}: {message}")]
    MalformedArgument {
        /// The message to be printed for the MalformedArgument error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// The framework tag does not map to a runtime locator strategy.
    #[error("Unsupported framework '{moniker}' ({tag})")]
    UnsupportedFramework {
        /// The raw moniker as received in the argument blob
        moniker: String,
        /// The classification it produced
        tag: FrameworkTag,
    },

    /// A runtime locator transition failed; the attempt is terminal.
    #[error("{strategy} failed to start the runtime after reaching {stage}: {reason}")]
    RuntimeStartFailed {
        /// The strategy that was attempted
        strategy: StrategyKind,
        /// The last stage the locator reached successfully
        stage: LocatorStage,
        /// Why the next transition failed
        reason: LocatorFailure,
    },

    /// The runtime host could not execute the managed entry point.
    #[error("Executing {type_name}::{method_name} failed - {hresult}")]
    EntryPointExecutionFailed {
        /// Fully qualified managed type name
        type_name: String,
        /// Managed method name
        method_name: String,
        /// Status returned by the host
        hresult: HResult,
    },

    /// The legacy host reported "file not found" while executing the entry point.
    ///
    /// This is a sub-case of [`Error::EntryPointExecutionFailed`]. It usually means the target
    /// runs a newer runtime whose moniker is not in the allow-list yet, so the tag was
    /// classified as the legacy framework.
    #[error("Legacy host could not find the entry point ({hresult}); is '{moniker}' a newer runtime missing from the moniker list?")]
    StaleAdapterForNewRuntime {
        /// The raw moniker as received in the argument blob
        moniker: String,
        /// Status returned by the host
        hresult: HResult,
    },

    /// Every slot of the hook table is taken.
    #[error("No free hook slot left (capacity {0})")]
    HookSlotExhausted(usize),

    /// The slot index is outside the hook table or the trampoline table.
    #[error("Hook slot {0} is out of range")]
    InvalidHookSlot(usize),

    /// The external injection primitive failed.
    #[error("Injecting {module} into process {pid} failed: {message}")]
    InjectionFailed {
        /// Target process id
        pid: u32,
        /// Module that was being injected
        module: String,
        /// Description supplied by the injector
        message: String,
    },

    /// Failed to lock target.
    #[error("Failed to lock target")]
    LockError,

    /// A configuration value is invalid.
    #[error("Invalid configuration - {0}")]
    Configuration(String),
}
