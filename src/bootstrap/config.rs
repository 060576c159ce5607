//! Bootstrap configuration.
//!
//! [`BootstrapConfig`] collects every knob of the bootstrap pipeline: the names the runtime
//! locator uses, the moniker allow-lists, the fixed managed entry point of the bootstrap stage
//! and the diagnostic console switch. The defaults reproduce the behaviour the injected stages
//! have always had, so [`BootstrapConfig::from_env`] only has to look at the opt-in environment
//! variables.
//!
//! # Example
//!
//! ```rust
//! use clrshim::bootstrap::BootstrapConfig;
//! use clrshim::host::LocatorConfig;
//!
//! let config = BootstrapConfig::default()
//!     .with_entry_point("MyDiver.Entry", "Run")
//!     .with_legacy_version("v4.0.30319")
//!     .with_console(true);
//! config.validate()?;
//! assert_eq!(config.locator.legacy_version, LocatorConfig::default().legacy_version);
//! # Ok::<(), clrshim::Error>(())
//! ```

use crate::{
    args::{MonikerTable, DELIMITER},
    host::LocatorConfig,
    Error, Result,
};

/// Presence (not value) of this variable enables the diagnostic console.
pub const DEBUG_CONSOLE_ENV: &str = "REMOTE_NET_UA_MAGIC_DEBUG";

/// Log filter in `env_logger` syntax.
pub const LOG_FILTER_ENV: &str = "CLRSHIM_LOG";

/// Presence of this variable turns on strict moniker classification.
pub const STRICT_MONIKERS_ENV: &str = "CLRSHIM_STRICT_MONIKERS";

/// Managed type the bootstrap stage starts.
pub const DEFAULT_BOOTSTRAP_TYPE: &str = "ScubaDiver.Diver";

/// Managed method the bootstrap stage starts.
pub const DEFAULT_BOOTSTRAP_METHOD: &str = "EntryPoint";

/// Configuration of one bootstrap orchestration.
///
/// # Default Configuration
///
/// - Legacy runtime `v4.0.30319`, modern module `coreclr.dll`, factory `GetCLRRuntimeHost`
/// - Bootstrap entry point `ScubaDiver.Diver::EntryPoint`
/// - Built-in moniker lists, non-strict
/// - No console
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BootstrapConfig {
    /// Names and versions used by the runtime locator strategies.
    pub locator: LocatorConfig,

    /// Framework moniker classification.
    pub monikers: MonikerTable,

    /// Managed type started by the three-field bootstrap stage.
    ///
    /// The five-field adapter stage carries its own type and ignores this.
    pub bootstrap_type: String,

    /// Managed method started by the three-field bootstrap stage.
    pub bootstrap_method: String,

    /// Allocate a diagnostic console for the duration of each run.
    pub console: bool,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        BootstrapConfig {
            locator: LocatorConfig::default(),
            monikers: MonikerTable::default(),
            bootstrap_type: DEFAULT_BOOTSTRAP_TYPE.to_string(),
            bootstrap_method: DEFAULT_BOOTSTRAP_METHOD.to_string(),
            console: false,
        }
    }
}

impl BootstrapConfig {
    /// Builds the configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var_os(name).is_some())
    }

    /// Builds the configuration from an arbitrary presence lookup.
    ///
    /// # Arguments
    ///
    /// * `is_set` - Returns whether the named variable is present
    #[must_use]
    pub fn from_lookup(is_set: impl Fn(&str) -> bool) -> Self {
        let config = BootstrapConfig::default();
        let monikers = config.monikers.clone().strict(is_set(STRICT_MONIKERS_ENV));
        BootstrapConfig {
            console: is_set(DEBUG_CONSOLE_ENV),
            monikers,
            ..config
        }
    }

    /// Sets the entry point of the bootstrap stage.
    ///
    /// # Returns
    ///
    /// Returns `self` for method chaining.
    #[must_use]
    pub fn with_entry_point(
        mut self,
        type_name: impl Into<String>,
        method_name: impl Into<String>,
    ) -> Self {
        self.bootstrap_type = type_name.into();
        self.bootstrap_method = method_name.into();
        self
    }

    /// Sets the runtime version the legacy strategy requests.
    #[must_use]
    pub fn with_legacy_version(mut self, version: impl Into<String>) -> Self {
        self.locator.legacy_version = version.into();
        self
    }

    /// Sets the module and factory export the modern strategy uses.
    #[must_use]
    pub fn with_runtime_module(
        mut self,
        module: impl Into<String>,
        factory_export: impl Into<String>,
    ) -> Self {
        self.locator.runtime_module = module.into();
        self.locator.host_factory_export = factory_export.into();
        self
    }

    /// Replaces the moniker table.
    #[must_use]
    pub fn with_monikers(mut self, monikers: MonikerTable) -> Self {
        self.monikers = monikers;
        self
    }

    /// Enables or disables the diagnostic console.
    #[must_use]
    pub fn with_console(mut self, console: bool) -> Self {
        self.console = console;
        self
    }

    /// Checks that every name is usable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if a name is empty, or if the entry point names contain
    /// the blob delimiter.
    pub fn validate(&self) -> Result<()> {
        let names = [
            ("legacy runtime version", &self.locator.legacy_version),
            ("runtime module", &self.locator.runtime_module),
            ("host factory export", &self.locator.host_factory_export),
            ("bootstrap type", &self.bootstrap_type),
            ("bootstrap method", &self.bootstrap_method),
        ];

        for (name, value) in names {
            if value.trim().is_empty() {
                return Err(Error::Configuration(format!("{} must not be empty", name)));
            }
        }

        for (name, value) in [
            ("bootstrap type", &self.bootstrap_type),
            ("bootstrap method", &self.bootstrap_method),
        ] {
            if value.contains(DELIMITER) {
                return Err(Error::Configuration(format!(
                    "{} '{}' contains the blob delimiter",
                    name, value
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::FrameworkTag;

    #[test]
    fn test_defaults() {
        let config = BootstrapConfig::default();
        assert_eq!(config.bootstrap_type, "ScubaDiver.Diver");
        assert_eq!(config.bootstrap_method, "EntryPoint");
        assert_eq!(config.locator.legacy_version, "v4.0.30319");
        assert_eq!(config.locator.runtime_module, "coreclr.dll");
        assert_eq!(config.locator.host_factory_export, "GetCLRRuntimeHost");
        assert!(!config.console);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_lookup_console_is_presence_based() {
        let config = BootstrapConfig::from_lookup(|name| name == DEBUG_CONSOLE_ENV);
        assert!(config.console);
        assert!(!config.monikers.is_strict());

        let config = BootstrapConfig::from_lookup(|_| false);
        assert!(!config.console);
    }

    #[test]
    fn test_from_lookup_strict() {
        let config = BootstrapConfig::from_lookup(|name| name == STRICT_MONIKERS_ENV);
        assert_eq!(config.monikers.classify("cobol-rt"), FrameworkTag::Unknown);
    }

    #[test]
    fn test_validate_rejects_empty_names() {
        let config = BootstrapConfig::default().with_legacy_version("");
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));

        let config = BootstrapConfig::default().with_runtime_module("coreclr.dll", " ");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_delimiter_in_entry_point() {
        let config = BootstrapConfig::default().with_entry_point("Bad*Type", "EntryPoint");
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));
    }
}
