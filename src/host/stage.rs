//! Locator state machine.
//!
//! A locator attempt walks a fixed, strategy-specific path of [`LocatorStage`]s. Each step
//! either advances to the next stage on the path or moves the attempt to the terminal failed
//! state. There are no retries and no fallback to another strategy.
//!
//! ```text
//! FixedVersionHost:
//!   Init -> MetaHostAcquired -> RuntimeInfoResolved -> LoadabilityConfirmed
//!        -> HostInterfaceObtained -> Started
//!
//! InProcessModuleHost:
//!   Init -> ModuleProbed -> FactoryResolved -> HostInterfaceObtained -> Started
//!
//! any failed transition -> Failed(reason)
//! ```

use strum::{Display, EnumIter};
use thiserror::Error;

use crate::{hresult::HResult, Error, Result};

/// A stage reached by a locator attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum LocatorStage {
    /// Nothing acquired yet.
    Init,
    /// The meta-host discovery capability is held.
    MetaHostAcquired,
    /// Runtime information for the requested version is held.
    RuntimeInfoResolved,
    /// The runtime reported it can be loaded side-by-side.
    LoadabilityConfirmed,
    /// The runtime module was found loaded in the process.
    ModuleProbed,
    /// The host factory export was resolved.
    FactoryResolved,
    /// The host interface is held.
    HostInterfaceObtained,
    /// The runtime is started; terminal success.
    Started,
}

/// The two interchangeable runtime locator strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum StrategyKind {
    /// Legacy host resolved through the meta-host for one exact version.
    FixedVersionHost,
    /// Modern host obtained from the already loaded runtime module.
    InProcessModuleHost,
}

const FIXED_VERSION_PATH: &[LocatorStage] = &[
    LocatorStage::Init,
    LocatorStage::MetaHostAcquired,
    LocatorStage::RuntimeInfoResolved,
    LocatorStage::LoadabilityConfirmed,
    LocatorStage::HostInterfaceObtained,
    LocatorStage::Started,
];

const IN_PROCESS_MODULE_PATH: &[LocatorStage] = &[
    LocatorStage::Init,
    LocatorStage::ModuleProbed,
    LocatorStage::FactoryResolved,
    LocatorStage::HostInterfaceObtained,
    LocatorStage::Started,
];

impl StrategyKind {
    /// The ordered stages a successful attempt of this strategy passes through.
    #[must_use]
    pub fn path(self) -> &'static [LocatorStage] {
        match self {
            StrategyKind::FixedVersionHost => FIXED_VERSION_PATH,
            StrategyKind::InProcessModuleHost => IN_PROCESS_MODULE_PATH,
        }
    }

    /// The stage that follows `stage` on this strategy's path, if any.
    #[must_use]
    pub fn successor(self, stage: LocatorStage) -> Option<LocatorStage> {
        let path = self.path();
        path.iter()
            .position(|s| *s == stage)
            .and_then(|i| path.get(i + 1))
            .copied()
    }
}

/// Why a locator transition failed.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LocatorFailure {
    /// The meta-host could not be created.
    #[error("meta-host unavailable ({0})")]
    MetaHostUnavailable(HResult),

    /// The exact runtime version is not installed.
    #[error("runtime {version} not found ({hresult})")]
    RuntimeNotFound {
        /// Requested version string
        version: String,
        /// Status returned by the meta-host
        hresult: HResult,
    },

    /// The side-by-side loadability query failed.
    #[error("loadability query failed ({0})")]
    LoadabilityQueryFailed(HResult),

    /// The runtime cannot be loaded next to the runtimes already in the process.
    ///
    /// Only a different version supplied from outside can get past this.
    #[error("runtime {version} cannot be loaded side-by-side")]
    NotLoadable {
        /// Requested version string
        version: String,
    },

    /// The host interface could not be obtained.
    #[error("host interface unavailable ({0})")]
    HostInterfaceUnavailable(HResult),

    /// Starting the runtime failed.
    #[error("start failed ({0})")]
    StartFailed(HResult),

    /// The runtime module is not loaded in the process.
    #[error("module {module} is not loaded")]
    ModuleNotLoaded {
        /// Probed module name
        module: String,
    },

    /// The runtime module does not export the host factory.
    #[error("{module} does not export {export}")]
    FactoryNotExported {
        /// Probed module name
        module: String,
        /// Missing export
        export: String,
    },

    /// The host factory returned a failure.
    #[error("host factory failed ({0})")]
    FactoryFailed(HResult),

    /// A transition that is not on the strategy's path was requested.
    #[error("invalid transition {from} -> {to}")]
    InvalidTransition {
        /// Current stage
        from: LocatorStage,
        /// Requested stage
        to: LocatorStage,
    },
}

/// Current state of a locator attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LocatorState {
    /// The attempt has reached this stage and may continue.
    Active(LocatorStage),
    /// The attempt failed while leaving `stage`; terminal.
    Failed {
        /// The last stage reached successfully
        stage: LocatorStage,
        /// Why the next transition failed
        reason: LocatorFailure,
    },
}

/// Bookkeeping for one locator attempt.
///
/// Enforces that stages are entered strictly in the order of the strategy's path and that a
/// failed attempt never advances again.
///
/// # Examples
///
/// ```rust
/// use clrshim::host::{LocatorAttempt, LocatorFailure, LocatorStage, StrategyKind};
///
/// let mut attempt = LocatorAttempt::new(StrategyKind::InProcessModuleHost);
/// attempt.advance(LocatorStage::ModuleProbed)?;
/// let err = attempt.fail(LocatorFailure::FactoryNotExported {
///     module: "coreclr.dll".into(),
///     export: "GetCLRRuntimeHost".into(),
/// });
/// assert!(attempt.is_failed());
/// assert!(attempt.advance(LocatorStage::FactoryResolved).is_err());
/// # let _ = err;
/// # Ok::<(), clrshim::Error>(())
/// ```
#[derive(Clone, Debug)]
pub struct LocatorAttempt {
    strategy: StrategyKind,
    state: LocatorState,
    history: Vec<LocatorStage>,
}

impl LocatorAttempt {
    /// Starts a new attempt in [`LocatorStage::Init`].
    #[must_use]
    pub fn new(strategy: StrategyKind) -> Self {
        LocatorAttempt {
            strategy,
            state: LocatorState::Active(LocatorStage::Init),
            history: vec![LocatorStage::Init],
        }
    }

    /// The strategy this attempt runs.
    #[must_use]
    pub fn strategy(&self) -> StrategyKind {
        self.strategy
    }

    /// The current state.
    #[must_use]
    pub fn state(&self) -> &LocatorState {
        &self.state
    }

    /// The last stage reached successfully.
    #[must_use]
    pub fn stage(&self) -> LocatorStage {
        match &self.state {
            LocatorState::Active(stage) | LocatorState::Failed { stage, .. } => *stage,
        }
    }

    /// Every stage reached so far, in order.
    #[must_use]
    pub fn history(&self) -> &[LocatorStage] {
        &self.history
    }

    /// Returns `true` once the attempt has failed.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self.state, LocatorState::Failed { .. })
    }

    /// Returns `true` once the attempt reached [`LocatorStage::Started`].
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.state == LocatorState::Active(LocatorStage::Started)
    }

    /// Moves to `next`, which must be the successor of the current stage.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RuntimeStartFailed`] with the recorded reason if the attempt already
    /// failed; its state is left untouched. Returns [`LocatorFailure::InvalidTransition`] if
    /// `next` is not the successor on the strategy's path, failing the attempt.
    pub fn advance(&mut self, next: LocatorStage) -> Result<()> {
        let current = self.stage();
        if let LocatorState::Failed { reason, .. } = &self.state {
            return Err(Error::RuntimeStartFailed {
                strategy: self.strategy,
                stage: current,
                reason: reason.clone(),
            });
        }
        if self.strategy.successor(current) != Some(next) {
            return Err(self.fail(LocatorFailure::InvalidTransition {
                from: current,
                to: next,
            }));
        }

        log::debug!("[{}] {} -> {}", self.strategy, current, next);
        self.state = LocatorState::Active(next);
        self.history.push(next);
        Ok(())
    }

    /// Moves the attempt to the terminal failed state and builds the matching error.
    pub fn fail(&mut self, reason: LocatorFailure) -> Error {
        let stage = self.stage();
        log::warn!("[{}] failed after {}: {}", self.strategy, stage, reason);

        self.state = LocatorState::Failed {
            stage,
            reason: reason.clone(),
        };

        Error::RuntimeStartFailed {
            strategy: self.strategy,
            stage,
            reason,
        }
    }
}
