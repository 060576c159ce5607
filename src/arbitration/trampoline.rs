//! Per-slot hook entry points.
//!
//! The host's allocator calls a hook with just `(ptr, extra)`, so each slot needs its own
//! function that knows its index. [`hook_entry`] bakes the index in through a const generic and
//! [`TRAMPOLINES`] materialises one instance per slot.

use std::ffi::c_void;

use crate::arbitration::{global, slots::FreeFn};

/// Number of distinct hook entry points; the upper bound for any registry's hook capacity.
pub const TRAMPOLINE_COUNT: usize = 32;

/// Hook installed in place of the original routine registered in `SLOT`.
///
/// Forwards to the process-wide registry. Without an installed registry the pointer is leaked
/// and an error is logged, since there is no original routine to call.
///
/// # Safety
///
/// Must only be called by the hooked allocator with arguments valid for the original routine.
pub unsafe extern "C" fn hook_entry<const SLOT: usize>(ptr: *mut c_void, extra: *mut c_void) {
    match global::current() {
        Some(registry) => {
            registry.dispatch_free(SLOT, ptr, extra);
        }
        None => log::error!(
            "Hook slot {} called without an installed registry, leaking {:p}",
            SLOT,
            ptr
        ),
    }
}

macro_rules! trampolines {
    ($($slot:literal)*) => {
        [$(hook_entry::<$slot> as FreeFn),*]
    };
}

/// One hook entry per slot index.
pub static TRAMPOLINES: [FreeFn; TRAMPOLINE_COUNT] = trampolines![
    0 1 2 3 4 5 6 7 8 9 10 11 12 13 14 15
    16 17 18 19 20 21 22 23 24 25 26 27 28 29 30 31
];

/// The hook entry of `slot`, if the slot has one.
#[must_use]
pub fn entry(slot: usize) -> Option<FreeFn> {
    TRAMPOLINES.get(slot).copied()
}
