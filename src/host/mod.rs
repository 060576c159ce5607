//! Runtime Locator.
//!
//! Finds or starts a managed runtime inside the current process and hands out a
//! [`StartedHost`] that can execute a managed entry point. Two strategies exist, selected
//! purely by the [`crate::args::FrameworkTag`] of the argument blob:
//!
//! - [`StrategyKind::FixedVersionHost`] resolves one exact runtime version through the
//!   meta-host, checks side-by-side loadability and starts it.
//! - [`StrategyKind::InProcessModuleHost`] requires the runtime module to be loaded already and
//!   asks its exported factory for the host interface.
//!
//! Both walk a validated stage path (see [`LocatorAttempt`]) and fail fast: the first failing
//! transition ends the attempt with [`crate::Error::RuntimeStartFailed`]. Nothing falls back to
//! the other strategy.
//!
//! All process interaction goes through [`HostingPlatform`]. On Windows,
//! [`WindowsPlatform`] implements it with the real hosting interfaces.
//!
//! # Examples
//!
//! ```rust,ignore
//! use clrshim::args::FrameworkTag;
//! use clrshim::host::{LocatorConfig, LocatorStrategy, WindowsPlatform};
//!
//! let strategy = LocatorStrategy::select(FrameworkTag::LegacyFramework, &LocatorConfig::default())
//!     .unwrap();
//! let host = strategy.locate(&WindowsPlatform)?;
//! let ret = host.execute("C:\\app\\Diver.dll", "ScubaDiver.Diver", "EntryPoint", "9977");
//! # Ok::<(), clrshim::Error>(())
//! ```

#[cfg(windows)]
mod clr;
mod guids;
mod locator;
mod platform;
mod stage;

#[cfg(windows)]
pub use clr::WindowsPlatform;
pub use guids::{
    CLSID_CLR_META_HOST, CLSID_CLR_RUNTIME_HOST, IID_ICLR_META_HOST, IID_ICLR_RUNTIME_HOST,
    IID_ICLR_RUNTIME_INFO,
};
pub(crate) use locator::unsupported;
pub use locator::{
    LocatorConfig, LocatorStrategy, StartedHost, DEFAULT_HOST_FACTORY_EXPORT,
    DEFAULT_LEGACY_VERSION, DEFAULT_RUNTIME_MODULE,
};
pub use platform::{
    HostFactory, HostResult, HostingPlatform, MetaHost, RuntimeHost, RuntimeInfo, RuntimeModule,
};
pub use stage::{LocatorAttempt, LocatorFailure, LocatorStage, LocatorState, StrategyKind};
