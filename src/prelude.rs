//! # clrshim Prelude
//!
//! The types needed to decode a blob, start a runtime, arbitrate frees or drive an injector,
//! importable in one line.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all clrshim operations
pub use crate::Error;

/// The result type used throughout clrshim
pub use crate::Result;

/// Platform-independent COM status code
pub use crate::HResult;

// ================================================================================================
// Argument Blobs
// ================================================================================================

/// Decoded blobs and their layouts
pub use crate::args::{AdapterArguments, ArgumentLayout, BootstrapArguments};

/// Framework moniker classification
pub use crate::args::{FrameworkTag, MonikerTable};

// ================================================================================================
// Runtime Hosting
// ================================================================================================

/// Locator strategies and their outcome
pub use crate::host::{
    LocatorConfig, LocatorFailure, LocatorStage, LocatorStrategy, StartedHost, StrategyKind,
};

/// Capabilities a hosting platform provides
pub use crate::host::{HostingPlatform, MetaHost, RuntimeHost, RuntimeInfo, RuntimeModule};

/// The Windows hosting platform
#[cfg(windows)]
pub use crate::host::WindowsPlatform;

/// The bootstrap pipeline
pub use crate::bootstrap::{BootstrapConfig, ExecutionReport, Orchestrator};

// ================================================================================================
// Arbitration and Injection
// ================================================================================================

/// Allocator arbitration
pub use crate::arbitration::{ArbitrationConfig, ArbitrationRegistry, FreeDecision, FreeFn};

/// Injection client
pub use crate::inject::{DiverRequest, InjectionClient, ModuleInjector, TargetProcess};
