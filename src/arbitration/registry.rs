//! The arbitration registry.

use std::{ffi::c_void, sync::RwLock};

use crate::{
    arbitration::{
        addresses::ProtectedAddressSet,
        slots::{FreeFn, HookSlotTable},
        trampoline::{self, TRAMPOLINE_COUNT},
    },
    Error, Result,
};

/// Default number of hook slots.
pub const DEFAULT_HOOK_CAPACITY: usize = 10;

/// Sizing of an [`ArbitrationRegistry`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArbitrationConfig {
    /// Number of hook slots, at most [`TRAMPOLINE_COUNT`].
    pub hook_capacity: usize,
}

impl Default for ArbitrationConfig {
    fn default() -> Self {
        ArbitrationConfig {
            hook_capacity: DEFAULT_HOOK_CAPACITY,
        }
    }
}

impl ArbitrationConfig {
    /// Sets the number of hook slots.
    #[must_use]
    pub fn with_hook_capacity(mut self, capacity: usize) -> Self {
        self.hook_capacity = capacity;
        self
    }

    /// Checks that every hook slot has a trampoline.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the capacity is zero or exceeds
    /// [`TRAMPOLINE_COUNT`].
    pub fn validate(&self) -> Result<()> {
        if self.hook_capacity == 0 || self.hook_capacity > TRAMPOLINE_COUNT {
            return Err(Error::Configuration(format!(
                "hook capacity {} must be within 1..={}",
                self.hook_capacity, TRAMPOLINE_COUNT
            )));
        }
        Ok(())
    }
}

/// What a hooked free did with a pointer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FreeDecision {
    /// The pointer is protected; the original routine was not called.
    Suppressed,
    /// The original routine of the slot freed the pointer.
    Delegated,
    /// The slot has no original routine; the pointer was leaked and an error logged.
    Unregistered,
}

/// Shared state arbitrating which deallocations the host allocator may perform.
///
/// The managed side protects addresses it took ownership of and installs one hook per
/// deallocation routine of the host. Every hooked free lands in [`Self::dispatch_free`], which
/// swallows frees of protected addresses and forwards the rest to the original routine.
///
/// All methods take `&self`; the address set sits behind a `RwLock` and slot claims behind a
/// mutex, so the registry can be shared freely between the host's threads.
///
/// # Examples
///
/// ```rust
/// use std::ffi::c_void;
/// use clrshim::arbitration::{ArbitrationRegistry, FreeDecision};
///
/// unsafe extern "C" fn host_free(_ptr: *mut c_void, _heap: *mut c_void) {}
///
/// let registry = ArbitrationRegistry::new();
/// let slot = registry.allocate_hook_slot(host_free)?;
///
/// let object = 0x7ff0_1000usize as *mut c_void;
/// registry.protect(object as usize)?;
/// let decision = unsafe { registry.dispatch_free(slot, object, std::ptr::null_mut()) };
/// assert_eq!(decision, FreeDecision::Suppressed);
/// # Ok::<(), clrshim::Error>(())
/// ```
#[derive(Debug)]
pub struct ArbitrationRegistry {
    protected: RwLock<ProtectedAddressSet>,
    slots: HookSlotTable,
}

impl Default for ArbitrationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ArbitrationRegistry {
    /// Creates a registry with [`DEFAULT_HOOK_CAPACITY`] slots.
    #[must_use]
    pub fn new() -> Self {
        ArbitrationRegistry {
            protected: RwLock::new(ProtectedAddressSet::new()),
            slots: HookSlotTable::new(DEFAULT_HOOK_CAPACITY),
        }
    }

    /// Creates a registry sized by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the configuration is invalid.
    pub fn with_config(config: ArbitrationConfig) -> Result<Self> {
        config.validate()?;
        Ok(ArbitrationRegistry {
            protected: RwLock::new(ProtectedAddressSet::new()),
            slots: HookSlotTable::new(config.hook_capacity),
        })
    }

    /// Protects `address` from the host's deallocation routines.
    ///
    /// Returns `false` if it was already protected.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LockError`] if the address set lock is poisoned.
    pub fn protect(&self, address: usize) -> Result<bool> {
        let added = write_lock!(self.protected)?.insert(address);
        if added {
            log::trace!("Protected {:#x}", address);
        }
        Ok(added)
    }

    /// Lifts the protection of `address`. Returns `false` if it was not protected.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LockError`] if the address set lock is poisoned.
    pub fn unprotect(&self, address: usize) -> Result<bool> {
        let removed = write_lock!(self.protected)?.remove(address);
        if removed {
            log::trace!("Unprotected {:#x}", address);
        }
        Ok(removed)
    }

    /// Returns `true` if `address` is protected.
    #[must_use]
    pub fn is_protected(&self, address: usize) -> bool {
        read_lock_recover!(self.protected).contains(address)
    }

    /// Number of protected addresses.
    #[must_use]
    pub fn protected_count(&self) -> usize {
        read_lock_recover!(self.protected).len()
    }

    /// Number of hook slots.
    #[must_use]
    pub fn hook_capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Returns the slot forwarding to `original`, claiming a new one if needed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HookSlotExhausted`] once every slot holds another routine.
    pub fn allocate_hook_slot(&self, original: FreeFn) -> Result<usize> {
        let slot = self.slots.claim(original).inspect_err(|e| log::warn!("{}", e))?;
        log::debug!("Free routine {:p} uses hook slot {}", original as *const (), slot);
        Ok(slot)
    }

    /// The original routine registered in `slot`.
    #[must_use]
    pub fn original_for(&self, slot: usize) -> Option<FreeFn> {
        self.slots.get(slot)
    }

    /// The hook to install in place of the routine held by `slot`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHookSlot`] if `slot` is outside the table.
    pub fn hook_for_slot(&self, slot: usize) -> Result<FreeFn> {
        if slot >= self.hook_capacity() {
            return Err(Error::InvalidHookSlot(slot));
        }
        trampoline::entry(slot).ok_or(Error::InvalidHookSlot(slot))
    }

    /// Claims a slot for `original` and returns its hook in one step.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HookSlotExhausted`] once every slot holds another routine.
    pub fn replacement_for(&self, original: FreeFn) -> Result<FreeFn> {
        self.hook_for_slot(self.allocate_hook_slot(original)?)
    }

    /// Arbitrates one free issued through the hook of `slot`.
    ///
    /// The address set lock is released before the original routine runs, so the original may
    /// re-enter the registry.
    ///
    /// # Safety
    ///
    /// `ptr` and `extra` must be valid arguments for the original routine of `slot`.
    pub unsafe fn dispatch_free(
        &self,
        slot: usize,
        ptr: *mut c_void,
        extra: *mut c_void,
    ) -> FreeDecision {
        if self.is_protected(ptr as usize) {
            log::trace!("Suppressed free of {:p} through slot {}", ptr, slot);
            return FreeDecision::Suppressed;
        }

        match self.slots.get(slot) {
            Some(original) => {
                original(ptr, extra);
                FreeDecision::Delegated
            }
            None => {
                log::error!(
                    "Hook slot {} has no original free routine, leaking {:p}",
                    slot,
                    ptr
                );
                FreeDecision::Unregistered
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::frees::{calls, COUNTING_FREES};

    fn addr(value: usize) -> *mut c_void {
        value as *mut c_void
    }

    #[test]
    fn test_protect_then_free_is_suppressed() {
        let registry = ArbitrationRegistry::new();
        let slot = registry.allocate_hook_slot(COUNTING_FREES[0]).unwrap();
        let before = calls(0);

        assert!(registry.protect(0xA000).unwrap());
        let decision = unsafe { registry.dispatch_free(slot, addr(0xA000), addr(0)) };

        assert_eq!(decision, FreeDecision::Suppressed);
        assert_eq!(calls(0), before);
    }

    #[test]
    fn test_unprotect_then_free_delegates_once() {
        let registry = ArbitrationRegistry::new();
        let slot = registry.allocate_hook_slot(COUNTING_FREES[1]).unwrap();
        let before = calls(1);

        registry.protect(0xB000).unwrap();
        assert!(registry.unprotect(0xB000).unwrap());
        let decision = unsafe { registry.dispatch_free(slot, addr(0xB000), addr(0)) };

        assert_eq!(decision, FreeDecision::Delegated);
        assert_eq!(calls(1), before + 1);
    }

    #[test]
    fn test_unprotect_absent_is_noop() {
        let registry = ArbitrationRegistry::new();
        assert!(!registry.unprotect(0xC000).unwrap());
        assert_eq!(registry.protected_count(), 0);
    }

    #[test]
    fn test_unregistered_slot_leaks() {
        let registry = ArbitrationRegistry::new();
        let decision = unsafe { registry.dispatch_free(3, addr(0xD000), addr(0)) };
        assert_eq!(decision, FreeDecision::Unregistered);
    }

    #[test]
    fn test_same_routine_same_slot() {
        let registry = ArbitrationRegistry::new();
        let first = registry.allocate_hook_slot(COUNTING_FREES[2]).unwrap();
        let second = registry.allocate_hook_slot(COUNTING_FREES[2]).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_eleventh_routine_exhausts_default_table() {
        let registry = ArbitrationRegistry::new();
        for (i, free) in COUNTING_FREES.iter().take(DEFAULT_HOOK_CAPACITY).enumerate() {
            assert_eq!(registry.allocate_hook_slot(*free).unwrap(), i);
        }

        assert!(matches!(
            registry.allocate_hook_slot(COUNTING_FREES[DEFAULT_HOOK_CAPACITY]),
            Err(Error::HookSlotExhausted(DEFAULT_HOOK_CAPACITY))
        ));
        assert!(registry
            .replacement_for(COUNTING_FREES[DEFAULT_HOOK_CAPACITY])
            .is_err());
    }

    #[test]
    fn test_hook_for_slot_bounds() {
        let registry =
            ArbitrationRegistry::with_config(ArbitrationConfig::default().with_hook_capacity(2))
                .unwrap();
        assert!(registry.hook_for_slot(1).is_ok());
        assert!(matches!(
            registry.hook_for_slot(2),
            Err(Error::InvalidHookSlot(2))
        ));
    }

    #[test]
    fn test_replacement_is_trampoline_of_slot() {
        let registry = ArbitrationRegistry::new();
        let hook = registry.replacement_for(COUNTING_FREES[3]).unwrap();
        let slot = registry.allocate_hook_slot(COUNTING_FREES[3]).unwrap();
        assert_eq!(
            hook as usize,
            registry.hook_for_slot(slot).unwrap() as usize
        );
    }

    #[test]
    fn test_config_validation() {
        assert!(ArbitrationConfig::default().validate().is_ok());
        assert!(ArbitrationConfig::default()
            .with_hook_capacity(TRAMPOLINE_COUNT)
            .validate()
            .is_ok());
        assert!(matches!(
            ArbitrationRegistry::with_config(
                ArbitrationConfig::default().with_hook_capacity(TRAMPOLINE_COUNT + 1)
            ),
            Err(Error::Configuration(_))
        ));
        assert!(ArbitrationConfig::default()
            .with_hook_capacity(0)
            .validate()
            .is_err());
    }
}
