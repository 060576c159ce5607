// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
//#![deny(unsafe_code)]
// - 'host/clr.rs' calls the runtime hosting interfaces through hand-written vtables
// - 'arbitration' stores and calls foreign deallocation routines
// - 'exports.rs' receives raw pointers from foreign callers

//! # clrshim
//!
//! An injectable native shim that starts a managed entry point inside an already running .NET
//! process, plus the native side of heap-ownership arbitration between that managed code and
//! the host's allocator.
//!
//! The shim is loaded into the target by an external injector, which calls one exported entry
//! point with a single string. That string is a `*`-separated argument blob naming the managed
//! assembly, the entry point, its argument and the target's framework moniker. The shim picks
//! a runtime hosting strategy from the moniker, attaches to (or starts) the runtime and runs
//! the entry point in the default application domain.
//!
//! ## Features
//!
//! - **Two hosting strategies** - Fixed-version meta-host for .NET Framework, in-process
//!   module discovery for .NET Core / .NET 5+
//! - **Validated state machine** - Every locator step is checked against the strategy's path
//!   and fails fast with the stage it reached
//! - **Pluggable platform** - All process interaction goes through
//!   [`host::HostingPlatform`], so the whole pipeline runs against stubs on any OS
//! - **Allocator arbitration** - Hooks for the host's free routines that never release memory
//!   the managed side has claimed
//! - **Producer side included** - [`inject::InjectionClient`] builds the blobs the shim
//!   consumes
//!
//! ## Quick Start
//!
//! ```rust
//! use clrshim::prelude::*;
//!
//! let args = AdapterArguments::decode("C:\\d\\Diver.dll*ScubaDiver.DllEntry*EntryPoint*9977*net8.0-windows")?;
//! let tag = MonikerTable::default().classify(&args.framework);
//! let strategy = LocatorStrategy::select(tag, &LocatorConfig::default());
//! assert_eq!(strategy.map(|s| s.kind()), Some(StrategyKind::InProcessModuleHost));
//! # Ok::<(), clrshim::Error>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! injector --(pid, module, export, blob)--> AdapterEntryPoint / LoadManagedProject
//!                                                   |
//!                      args: decode blob, classify moniker
//!                                                   |
//!                      host: FixedVersionHost | InProcessModuleHost -> StartedHost
//!                                                   |
//!                      bootstrap: ExecuteInDefaultAppDomain -> ExecutionReport
//!
//! managed side --(AddAddress, GetOrAddReplacement, ...)--> arbitration registry
//! host allocator --free--> hook_entry::<slot> --> suppressed | original free
//! ```
//!
//! ## Environment
//!
//! - `REMOTE_NET_UA_MAGIC_DEBUG` - present: allocate a diagnostic console during a run
//! - `CLRSHIM_LOG` - log filter in `env_logger` syntax, default `info`
//! - `CLRSHIM_STRICT_MONIKERS` - present: unknown monikers are rejected instead of treated as
//!   .NET Framework
//!
//! ## Error Handling
//!
//! All operations return [`Result<T, Error>`](Result):
//!
//! ```rust
//! use clrshim::{args::BootstrapArguments, Error};
//!
//! match BootstrapArguments::decode("C:\\app\\Diver.dll") {
//!     Ok(_) => println!("decoded"),
//!     Err(Error::MalformedArgument { message, .. }) => println!("Malformed: {}", message),
//!     Err(e) => println!("Other error: {}", e),
//! }
//! ```
//!
//! ## Development and Testing
//!
//! ```bash
//! cargo test
//! cargo bench --bench arbitration
//! cargo +nightly fuzz run argument_blob --release
//! ```
#[macro_use]
pub(crate) mod macros;

#[macro_use]
pub(crate) mod error;

/// Shared functionality which is used in unit tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use clrshim::prelude::*;
///
/// let registry = ArbitrationRegistry::new();
/// registry.protect(0x1000)?;
/// assert!(registry.is_protected(0x1000));
/// # Ok::<(), clrshim::Error>(())
/// ```
pub mod prelude;

/// Argument blob codec and framework moniker classification.
pub mod args;

/// Runtime locator: hosting capabilities, strategies and their state machine.
pub mod host;

/// The bootstrap pipeline from argument blob to managed entry point.
pub mod bootstrap;

/// Protected addresses and hooked deallocation routines.
pub mod arbitration;

/// Producer side: encodes blobs and drives an external injector.
pub mod inject;

/// The C ABI exported by the shim module.
pub mod exports;

/// Platform-independent `HRESULT` values.
pub mod hresult;

/// Result type for every fallible operation in this crate.
///
/// # Example
///
/// ```rust
/// use clrshim::{args::AdapterArguments, Result};
///
/// fn entry_type(blob: &str) -> Result<String> {
///     Ok(AdapterArguments::decode(blob)?.type_name)
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// The error type of this crate.
pub use error::Error;

pub use hresult::HResult;
