//! The bootstrap pipeline.

use std::fmt;

use crate::{
    args::{AdapterArguments, ArgumentLayout, BootstrapArguments, FrameworkTag},
    bootstrap::{config::BootstrapConfig, console::ConsoleGuard},
    hresult::HResult,
    host::{unsupported, HostingPlatform, LocatorStrategy, StrategyKind},
    Error, Result,
};

/// Outcome of a successful orchestration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutionReport {
    /// Blob layout that was decoded.
    pub layout: ArgumentLayout,
    /// Classification of the framework moniker.
    pub framework: FrameworkTag,
    /// Locator strategy that started the runtime.
    pub strategy: StrategyKind,
    /// Managed type that was executed.
    pub type_name: String,
    /// Managed method that was executed.
    pub method_name: String,
    /// Raw 32-bit value returned by the managed entry point.
    pub return_value: u32,
}

impl ExecutionReport {
    /// The managed return value as the signed status the entry point declared.
    #[must_use]
    pub fn managed_status(&self) -> i32 {
        self.return_value as i32
    }

    /// Returns `true` if the managed entry point returned zero.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.return_value == 0
    }
}

impl fmt::Display for ExecutionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}::{} returned {} ({} via {})",
            self.type_name,
            self.method_name,
            self.managed_status(),
            self.framework,
            self.strategy
        )
    }
}

/// Drives one injected invocation from argument blob to managed entry point.
///
/// The pipeline is strictly sequential and fails fast:
///
/// 1. Decode the blob for the given [`ArgumentLayout`]
/// 2. Classify the framework moniker
/// 3. Select and run the locator strategy
/// 4. Execute the managed entry point on the started host
///
/// Nothing touches the platform, the diagnostic console included, before the blob decoded and
/// a strategy was selected.
///
/// # Examples
///
/// ```rust,ignore
/// use clrshim::args::ArgumentLayout;
/// use clrshim::bootstrap::{BootstrapConfig, Orchestrator};
/// use clrshim::host::WindowsPlatform;
///
/// let orchestrator = Orchestrator::new(&WindowsPlatform, BootstrapConfig::from_env());
/// let report = orchestrator.run(ArgumentLayout::Bootstrap, "C:\\app\\Diver.dll*9977*net48")?;
/// println!("{}", report);
/// # Ok::<(), clrshim::Error>(())
/// ```
pub struct Orchestrator<'p, P: HostingPlatform + ?Sized> {
    platform: &'p P,
    config: BootstrapConfig,
}

impl<'p, P: HostingPlatform + ?Sized> Orchestrator<'p, P> {
    /// Creates an orchestrator over `platform`.
    pub fn new(platform: &'p P, config: BootstrapConfig) -> Self {
        Orchestrator { platform, config }
    }

    /// The active configuration.
    pub fn config(&self) -> &BootstrapConfig {
        &self.config
    }

    /// Runs the pipeline once.
    ///
    /// # Errors
    ///
    /// - [`Error::MalformedArgument`] if the blob has too few fields
    /// - [`Error::UnsupportedFramework`] if the moniker selects no strategy (strict mode only)
    /// - [`Error::RuntimeStartFailed`] if the locator failed
    /// - [`Error::StaleAdapterForNewRuntime`] if the legacy host reported "file not found"
    /// - [`Error::EntryPointExecutionFailed`] for any other execution failure
    pub fn run(&self, layout: ArgumentLayout, blob: &str) -> Result<ExecutionReport> {
        let args = self.decode(layout, blob)?;
        let framework = self.config.monikers.classify(&args.framework);
        log::debug!(
            "{} blob for '{}' classified as {}",
            layout,
            args.framework,
            framework
        );

        let strategy = LocatorStrategy::select(framework, &self.config.locator)
            .ok_or_else(|| unsupported(&args.framework, framework))?;

        let _console = ConsoleGuard::acquire(self.platform, self.config.console);
        let host = strategy.locate(self.platform)?;

        let return_value = host
            .execute(
                &args.assembly_path,
                &args.type_name,
                &args.method_name,
                &args.argument,
            )
            .map_err(|hresult| execution_error(&args, framework, hresult))?;

        let report = ExecutionReport {
            layout,
            framework,
            strategy: host.strategy(),
            type_name: args.type_name,
            method_name: args.method_name,
            return_value,
        };

        if report.is_clean() {
            log::info!("{}", report);
        } else {
            log::warn!("{}", report);
        }
        Ok(report)
    }

    fn decode(&self, layout: ArgumentLayout, blob: &str) -> Result<AdapterArguments> {
        match layout {
            ArgumentLayout::Adapter => AdapterArguments::decode(blob),
            ArgumentLayout::Bootstrap => Ok(BootstrapArguments::decode(blob)?.with_entry_point(
                self.config.bootstrap_type.as_str(),
                self.config.bootstrap_method.as_str(),
            )),
        }
    }
}

fn execution_error(args: &AdapterArguments, framework: FrameworkTag, hresult: HResult) -> Error {
    if framework == FrameworkTag::LegacyFramework && hresult == HResult::FILE_NOT_FOUND {
        return Error::StaleAdapterForNewRuntime {
            moniker: args.framework.clone(),
            hresult,
        };
    }

    Error::EntryPointExecutionFailed {
        type_name: args.type_name.clone(),
        method_name: args.method_name.clone(),
        hresult,
    }
}
