//! Bootstrap Orchestrator.
//!
//! Glues the argument codec and the runtime locator together: decode the blob handed to the
//! injected module, classify its framework moniker, start a runtime and execute the managed
//! entry point.
//!
//! # Key Components
//!
//! - [`Orchestrator`] - One pipeline run over a [`crate::host::HostingPlatform`]
//! - [`BootstrapConfig`] - Names, allow-lists and switches, built from the environment
//! - [`ExecutionReport`] - What ran and what it returned
//! - [`adapter_entry`] / [`bootstrap_entry`] - Fire-and-forget wrappers for the exported entry
//!   points
//!
//! The injection trigger has no return channel, so the entry wrappers log the outcome and
//! drop it.

mod config;
mod console;
mod logging;
mod orchestrator;

pub use config::{
    BootstrapConfig, DEBUG_CONSOLE_ENV, DEFAULT_BOOTSTRAP_METHOD, DEFAULT_BOOTSTRAP_TYPE,
    LOG_FILTER_ENV, STRICT_MONIKERS_ENV,
};
pub use console::ConsoleGuard;
pub use logging::{init as init_logging, DebugSink};
pub use orchestrator::{ExecutionReport, Orchestrator};

use crate::{args::ArgumentLayout, host::HostingPlatform};

/// Entry of the five-field adapter stage.
///
/// Returns the report for callers that can use it; failures are logged and yield `None`.
pub fn adapter_entry<P: HostingPlatform + ?Sized>(
    platform: &P,
    blob: &str,
) -> Option<ExecutionReport> {
    entry(platform, ArgumentLayout::Adapter, blob)
}

/// Entry of the three-field bootstrap stage.
///
/// Returns the report for callers that can use it; failures are logged and yield `None`.
pub fn bootstrap_entry<P: HostingPlatform + ?Sized>(
    platform: &P,
    blob: &str,
) -> Option<ExecutionReport> {
    entry(platform, ArgumentLayout::Bootstrap, blob)
}

fn entry<P: HostingPlatform + ?Sized>(
    platform: &P,
    layout: ArgumentLayout,
    blob: &str,
) -> Option<ExecutionReport> {
    init_logging();

    let config = BootstrapConfig::from_env();
    if let Err(e) = config.validate() {
        log::error!("{}", e);
        return None;
    }

    match Orchestrator::new(platform, config).run(layout, blob) {
        Ok(report) => Some(report),
        Err(e) => {
            log::error!("{} entry failed: {}", layout, e);
            None
        }
    }
}
