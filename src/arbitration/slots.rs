//! Fixed-capacity table of original deallocation routines.

use std::{
    ffi::c_void,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
};

use crate::{Error, Result};

/// Signature of a hooked deallocation routine: `free(ptr, extra)`.
///
/// `extra` is whatever the host's allocator passes beside the pointer (heap handle, size, ...);
/// it is forwarded untouched.
pub type FreeFn = unsafe extern "C" fn(ptr: *mut c_void, extra: *mut c_void);

/// Maps hook slot indices to the original routine each slot forwards to.
///
/// Slots are claimed under a mutex so two threads registering the same routine end up in the
/// same slot. Reads are lock-free. A claimed slot is never released.
#[derive(Debug)]
pub struct HookSlotTable {
    slots: Box<[AtomicUsize]>,
    claims: Mutex<()>,
}

impl HookSlotTable {
    /// Creates a table with `capacity` empty slots.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        HookSlotTable {
            slots: (0..capacity).map(|_| AtomicUsize::new(0)).collect(),
            claims: Mutex::new(()),
        }
    }

    /// Number of slots.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of claimed slots.
    #[must_use]
    pub fn claimed(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| s.load(Ordering::Acquire) != 0)
            .count()
    }

    /// The original routine in `slot`, if claimed.
    #[must_use]
    pub fn get(&self, slot: usize) -> Option<FreeFn> {
        let raw = self.slots.get(slot)?.load(Ordering::Acquire);
        if raw == 0 {
            return None;
        }
        // SAFETY: non-zero values are only ever stored from a FreeFn in `claim`
        Some(unsafe { std::mem::transmute::<usize, FreeFn>(raw) })
    }

    /// Index of the slot holding `original`, if any.
    #[must_use]
    pub fn find(&self, original: FreeFn) -> Option<usize> {
        let raw = original as usize;
        self.slots
            .iter()
            .position(|s| s.load(Ordering::Acquire) == raw)
    }

    /// Returns the slot of `original`, claiming the first free one if needed.
    ///
    /// # Errors
    ///
    /// - [`Error::HookSlotExhausted`] if `original` is new and every slot is taken
    /// - [`Error::LockError`] if the claim lock is poisoned
    pub fn claim(&self, original: FreeFn) -> Result<usize> {
        let _guard = lock!(self.claims)?;

        if let Some(slot) = self.find(original) {
            return Ok(slot);
        }

        let free = self
            .slots
            .iter()
            .position(|s| s.load(Ordering::Acquire) == 0)
            .ok_or(Error::HookSlotExhausted(self.capacity()))?;

        self.slots[free].store(original as usize, Ordering::Release);
        Ok(free)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static SEEN: AtomicUsize = AtomicUsize::new(0);

    // Distinct bodies so the two routines never share an address
    unsafe extern "C" fn first(_: *mut c_void, _: *mut c_void) {
        SEEN.fetch_add(1, Ordering::Relaxed);
    }

    unsafe extern "C" fn second(_: *mut c_void, _: *mut c_void) {
        SEEN.fetch_add(2, Ordering::Relaxed);
    }

    #[test]
    fn test_claim_is_stable() {
        let table = HookSlotTable::new(4);
        let a = table.claim(first).unwrap();
        let b = table.claim(second).unwrap();
        assert_eq!((a, b), (0, 1));
        assert_eq!(table.claim(first).unwrap(), a);
        assert_eq!(table.claimed(), 2);
    }

    #[test]
    fn test_get() {
        let table = HookSlotTable::new(2);
        assert!(table.get(0).is_none());
        assert!(table.get(7).is_none());

        let slot = table.claim(second).unwrap();
        assert_eq!(table.get(slot).map(|f| f as usize), Some(second as usize));
    }

    #[test]
    fn test_exhaustion() {
        let table = HookSlotTable::new(1);
        table.claim(first).unwrap();
        assert!(matches!(
            table.claim(second),
            Err(Error::HookSlotExhausted(1))
        ));
        // An already registered routine still resolves when full
        assert_eq!(table.claim(first).unwrap(), 0);
    }
}
