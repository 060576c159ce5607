//! Argument codec for blobs crossing the process boundary.
//!
//! The injection trigger can only hand one opaque string to the injected module. Everything
//! the shim needs (assembly path, entry point, the managed argument and the framework moniker)
//! is therefore packed positionally into a `*`-separated blob.
//!
//! # Key Components
//!
//! - [`split`] / [`join`] - The raw delimiter codec
//! - [`AdapterArguments`] / [`BootstrapArguments`] - Field layouts of the two injected stages
//! - [`MonikerTable`] / [`FrameworkTag`] - Framework moniker classification
//!
//! # Examples
//!
//! ```rust
//! use clrshim::args::{AdapterArguments, FrameworkTag, MonikerTable};
//!
//! let args = AdapterArguments::decode("C:\\d\\Diver.dll*ScubaDiver.DllEntry*EntryPoint*1234*NET8.0-WINDOWS")?;
//! assert_eq!(MonikerTable::default().classify(&args.framework), FrameworkTag::ModernRuntime);
//! # Ok::<(), clrshim::Error>(())
//! ```

mod blob;
mod codec;
mod framework;

pub use blob::{AdapterArguments, ArgumentLayout, BootstrapArguments};
pub use codec::{join, join_checked, split, DELIMITER};
pub use framework::{moniker_eq, FrameworkTag, MonikerTable, LEGACY_MONIKERS, MODERN_MONIKERS};
