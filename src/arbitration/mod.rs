//! Allocator Arbitration Registry.
//!
//! Managed code inside the host sometimes takes ownership of objects allocated by the host's
//! native allocator. When the host later frees such an object the managed side would be left
//! with a dangling pointer. The registry prevents that: the host's deallocation routines are
//! hooked, and a hooked free of a protected address is swallowed instead of reaching the
//! allocator.
//!
//! # Key Components
//!
//! - [`ArbitrationRegistry`] - Protected addresses plus the hook slot table
//! - [`ProtectedAddressSet`] - O(1) set of protected addresses
//! - [`HookSlotTable`] - Fixed-capacity slot index to original routine map
//! - [`hook_entry`] / [`TRAMPOLINES`] - One hook function per slot
//! - [`global`] - The process-wide instance used by the hooks and the C exports
//!
//! # Flow
//!
//! ```text
//! managed side:  GetOrAddReplacement(free) -> slot n -> TRAMPOLINES[n] (patched over free)
//!                AddAddress(obj) / RemoveAddress(obj)
//! host thread:   free(obj) -> hook_entry::<n> -> dispatch_free(n, obj)
//!                               protected -> Suppressed
//!                               otherwise -> original free(obj) -> Delegated
//! ```

mod addresses;
pub mod global;
mod registry;
mod slots;
mod trampoline;

pub use addresses::{ProtectedAddressSet, INITIAL_CAPACITY};
pub use registry::{ArbitrationConfig, ArbitrationRegistry, FreeDecision, DEFAULT_HOOK_CAPACITY};
pub use slots::{FreeFn, HookSlotTable};
pub use trampoline::{entry as trampoline_entry, hook_entry, TRAMPOLINES, TRAMPOLINE_COUNT};
