//! Capabilities the runtime locator needs from the process it runs in.
//!
//! Every OS and runtime interaction of the locator goes through the traits in this module.
//! On Windows they are backed by the real hosting interfaces (see `host::clr`); tests back them
//! with recording stubs. All intermediate capabilities are returned as owned boxes, so dropping
//! one releases whatever the implementation acquired for it.

use crate::hresult::HResult;

/// Result of a single hosting call: the value, or the failing status code.
pub type HostResult<T> = std::result::Result<T, HResult>;

/// A started (or startable) managed runtime host.
///
/// This is the capability that finally runs the managed entry point.
pub trait RuntimeHost {
    /// Starts the runtime.
    ///
    /// Starting an already running runtime is allowed and must report success (`S_OK` or
    /// `S_FALSE`).
    fn start(&self) -> HResult;

    /// Runs `type_name::method_name(argument)` in the default application domain.
    ///
    /// The managed method must be static, take exactly one string and return a 32-bit integer.
    ///
    /// # Returns
    ///
    /// The managed return value, or the failing status code of the host.
    ///
    /// # Errors
    ///
    /// Returns the host's `HRESULT` if the assembly, type or method could not be resolved, or
    /// if the managed code threw.
    fn execute_in_default_app_domain(
        &self,
        assembly_path: &str,
        type_name: &str,
        method_name: &str,
        argument: &str,
    ) -> HostResult<u32>;
}

/// Information about one installed runtime version, resolved through a [`MetaHost`].
pub trait RuntimeInfo {
    /// Returns whether this runtime can be loaded side-by-side with the runtimes already active
    /// in the process.
    ///
    /// # Errors
    ///
    /// Returns the failing status code if the query itself failed.
    fn is_loadable(&self) -> HostResult<bool>;

    /// Loads the runtime (if needed) and returns its host interface.
    ///
    /// # Errors
    ///
    /// Returns the failing status code if the interface could not be obtained.
    fn runtime_host(&self) -> HostResult<Box<dyn RuntimeHost>>;
}

/// Discovery capability for installed runtime versions.
pub trait MetaHost {
    /// Resolves the runtime with exactly the given version string (e.g. `v4.0.30319`).
    ///
    /// # Errors
    ///
    /// Returns the failing status code if the version is not installed.
    fn runtime(&self, version: &str) -> HostResult<Box<dyn RuntimeInfo>>;
}

/// A resolved host factory export, ready to be called once.
pub type HostFactory = Box<dyn FnOnce() -> HostResult<Box<dyn RuntimeHost>>>;

/// A runtime module that is already loaded into the current process.
pub trait RuntimeModule {
    /// Resolves an exported host factory by name.
    ///
    /// Returns `None` if the module does not export `export`.
    fn host_factory(&self, export: &str) -> Option<HostFactory>;
}

/// Process-level entry point to the hosting capabilities.
///
/// # Examples
///
/// ```rust,ignore
/// use clrshim::host::{HostingPlatform, LocatorConfig, LocatorStrategy};
/// use clrshim::args::FrameworkTag;
///
/// fn start(platform: &dyn HostingPlatform) -> clrshim::Result<()> {
///     let strategy = LocatorStrategy::select(FrameworkTag::ModernRuntime, &LocatorConfig::default())
///         .expect("modern runtime is supported");
///     let host = strategy.locate(platform)?;
///     println!("runtime started through {}", host.strategy());
///     Ok(())
/// }
/// ```
pub trait HostingPlatform {
    /// Acquires the meta-host discovery capability.
    ///
    /// # Errors
    ///
    /// Returns the failing status code if the meta-host could not be created.
    fn meta_host(&self) -> HostResult<Box<dyn MetaHost>>;

    /// Probes for a module that is already loaded into the process.
    ///
    /// Implementations must not load the module on demand. Returns `None` if it is absent.
    fn loaded_module(&self, name: &str) -> Option<Box<dyn RuntimeModule>>;

    /// Allocates a diagnostic console for the process.
    ///
    /// Returns `true` only if a new console was allocated by this call.
    fn allocate_console(&self) -> bool {
        false
    }

    /// Frees a console previously allocated through [`Self::allocate_console`].
    fn free_console(&self) {}
}
