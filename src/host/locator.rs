//! Runtime locator strategies.
//!
//! A [`LocatorStrategy`] turns a [`HostingPlatform`] into a [`StartedHost`], walking its
//! stage path through a [`LocatorAttempt`]. Intermediate capabilities live in locals, so every
//! early return drops exactly what was acquired up to that point.

use crate::{
    args::FrameworkTag,
    hresult::HResult,
    host::{
        platform::{HostResult, HostingPlatform, RuntimeHost},
        stage::{LocatorAttempt, LocatorFailure, LocatorStage, StrategyKind},
    },
    Error, Result,
};

/// Runtime version the legacy strategy asks the meta-host for.
pub const DEFAULT_LEGACY_VERSION: &str = "v4.0.30319";

/// Module the modern strategy expects to find loaded.
pub const DEFAULT_RUNTIME_MODULE: &str = "coreclr.dll";

/// Export of [`DEFAULT_RUNTIME_MODULE`] that produces the host interface.
pub const DEFAULT_HOST_FACTORY_EXPORT: &str = "GetCLRRuntimeHost";

/// Names and versions the locator strategies are parameterised with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocatorConfig {
    /// Exact version string resolved by [`StrategyKind::FixedVersionHost`].
    pub legacy_version: String,
    /// Module probed by [`StrategyKind::InProcessModuleHost`].
    pub runtime_module: String,
    /// Host factory export resolved from [`Self::runtime_module`].
    pub host_factory_export: String,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        LocatorConfig {
            legacy_version: DEFAULT_LEGACY_VERSION.to_string(),
            runtime_module: DEFAULT_RUNTIME_MODULE.to_string(),
            host_factory_export: DEFAULT_HOST_FACTORY_EXPORT.to_string(),
        }
    }
}

/// A fully parameterised locator strategy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LocatorStrategy {
    /// Resolve one exact runtime version through the meta-host, then start it.
    FixedVersionHost {
        /// Runtime version string
        version: String,
    },
    /// Take the host interface from the runtime module already loaded in the process.
    InProcessModuleHost {
        /// Runtime module name
        module: String,
        /// Host factory export
        factory_export: String,
    },
}

impl LocatorStrategy {
    /// Selects the strategy for a framework tag.
    ///
    /// Pure function of the tag; [`FrameworkTag::Unknown`] has no strategy.
    #[must_use]
    pub fn select(tag: FrameworkTag, config: &LocatorConfig) -> Option<Self> {
        match tag {
            FrameworkTag::LegacyFramework => Some(LocatorStrategy::FixedVersionHost {
                version: config.legacy_version.clone(),
            }),
            FrameworkTag::ModernRuntime => Some(LocatorStrategy::InProcessModuleHost {
                module: config.runtime_module.clone(),
                factory_export: config.host_factory_export.clone(),
            }),
            FrameworkTag::Unknown => None,
        }
    }

    /// The kind of this strategy.
    #[must_use]
    pub fn kind(&self) -> StrategyKind {
        match self {
            LocatorStrategy::FixedVersionHost { .. } => StrategyKind::FixedVersionHost,
            LocatorStrategy::InProcessModuleHost { .. } => StrategyKind::InProcessModuleHost,
        }
    }

    /// Runs the strategy to completion.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RuntimeStartFailed`] naming the last stage reached and the reason the
    /// next transition failed.
    pub fn locate<P: HostingPlatform + ?Sized>(&self, platform: &P) -> Result<StartedHost> {
        let mut attempt = LocatorAttempt::new(self.kind());
        log::debug!("Locating runtime through {}", self.kind());

        let host = match self {
            LocatorStrategy::FixedVersionHost { version } => {
                fixed_version(platform, version, &mut attempt)?
            }
            LocatorStrategy::InProcessModuleHost {
                module,
                factory_export,
            } => in_process_module(platform, module, factory_export, &mut attempt)?,
        };

        attempt.advance(LocatorStage::Started)?;
        log::info!("Runtime started through {}", attempt.strategy());

        Ok(StartedHost {
            host,
            strategy: attempt.strategy(),
            history: attempt.history().to_vec(),
        })
    }
}

fn fixed_version<P: HostingPlatform + ?Sized>(
    platform: &P,
    version: &str,
    attempt: &mut LocatorAttempt,
) -> Result<Box<dyn RuntimeHost>> {
    let meta_host = platform
        .meta_host()
        .map_err(|hr| attempt.fail(LocatorFailure::MetaHostUnavailable(hr)))?;
    attempt.advance(LocatorStage::MetaHostAcquired)?;

    let info = meta_host.runtime(version).map_err(|hresult| {
        attempt.fail(LocatorFailure::RuntimeNotFound {
            version: version.to_string(),
            hresult,
        })
    })?;
    attempt.advance(LocatorStage::RuntimeInfoResolved)?;

    match info.is_loadable() {
        Ok(true) => {}
        Ok(false) => {
            return Err(attempt.fail(LocatorFailure::NotLoadable {
                version: version.to_string(),
            }))
        }
        Err(hr) => return Err(attempt.fail(LocatorFailure::LoadabilityQueryFailed(hr))),
    }
    attempt.advance(LocatorStage::LoadabilityConfirmed)?;

    let host = info
        .runtime_host()
        .map_err(|hr| attempt.fail(LocatorFailure::HostInterfaceUnavailable(hr)))?;
    attempt.advance(LocatorStage::HostInterfaceObtained)?;

    let hr = host.start();
    if hr.is_failure() {
        return Err(attempt.fail(LocatorFailure::StartFailed(hr)));
    }
    if hr == HResult::S_FALSE {
        log::debug!("Runtime {} was already started", version);
    }

    Ok(host)
}

fn in_process_module<P: HostingPlatform + ?Sized>(
    platform: &P,
    module: &str,
    factory_export: &str,
    attempt: &mut LocatorAttempt,
) -> Result<Box<dyn RuntimeHost>> {
    let Some(runtime_module) = platform.loaded_module(module) else {
        return Err(attempt.fail(LocatorFailure::ModuleNotLoaded {
            module: module.to_string(),
        }));
    };
    attempt.advance(LocatorStage::ModuleProbed)?;

    let Some(factory) = runtime_module.host_factory(factory_export) else {
        return Err(attempt.fail(LocatorFailure::FactoryNotExported {
            module: module.to_string(),
            export: factory_export.to_string(),
        }));
    };
    attempt.advance(LocatorStage::FactoryResolved)?;

    let host = factory().map_err(|hr| attempt.fail(LocatorFailure::FactoryFailed(hr)))?;
    attempt.advance(LocatorStage::HostInterfaceObtained)?;

    Ok(host)
}

/// A started managed-runtime host in the current process.
///
/// Owned by exactly one orchestration; dropping it releases the host interface.
pub struct StartedHost {
    host: Box<dyn RuntimeHost>,
    strategy: StrategyKind,
    history: Vec<LocatorStage>,
}

impl StartedHost {
    /// The strategy that produced this host.
    #[must_use]
    pub fn strategy(&self) -> StrategyKind {
        self.strategy
    }

    /// The stages the locator passed through.
    #[must_use]
    pub fn history(&self) -> &[LocatorStage] {
        &self.history
    }

    /// Runs a static `int Method(string)` in the default application domain.
    ///
    /// # Errors
    ///
    /// Returns the host's failing status code.
    pub fn execute(
        &self,
        assembly_path: &str,
        type_name: &str,
        method_name: &str,
        argument: &str,
    ) -> HostResult<u32> {
        log::debug!(
            "Executing {}::{} from {} with '{}'",
            type_name,
            method_name,
            assembly_path,
            argument
        );
        self.host
            .execute_in_default_app_domain(assembly_path, type_name, method_name, argument)
    }
}

impl std::fmt::Debug for StartedHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StartedHost")
            .field("strategy", &self.strategy)
            .field("history", &self.history)
            .finish_non_exhaustive()
    }
}

/// Builds the error for a tag without a locator strategy.
pub(crate) fn unsupported(moniker: &str, tag: FrameworkTag) -> Error {
    Error::UnsupportedFramework {
        moniker: moniker.to_string(),
        tag,
    }
}
