//! Exported C ABI.
//!
//! These are the symbols the injection trigger and the managed side resolve by name. None of
//! them unwinds into the caller: errors are logged and mapped to the sentinel the signature
//! allows (`-1`, null, or nothing).

#![allow(non_snake_case)]

use std::{
    ffi::c_void,
    panic::{catch_unwind, AssertUnwindSafe},
};

use crate::{
    arbitration::{global, ArbitrationRegistry, FreeFn},
    Result,
};

/// Runs `f` against the process-wide registry, mapping errors and panics to `fallback`.
fn with_registry<T>(
    export: &str,
    fallback: T,
    f: impl FnOnce(&ArbitrationRegistry) -> Result<T>,
) -> T {
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        let registry = global::current_or_install()?;
        f(&registry)
    }));

    match outcome {
        Ok(Ok(value)) => value,
        Ok(Err(e)) => {
            log::error!("{}: {}", export, e);
            fallback
        }
        Err(_) => {
            log::error!("{}: panicked", export);
            fallback
        }
    }
}

/// Protects `address` from the hooked deallocation routines.
#[no_mangle]
pub extern "C" fn AddAddress(address: *mut c_void) {
    with_registry("AddAddress", (), |registry| {
        registry.protect(address as usize).map(|_| ())
    });
}

/// Lifts the protection of `address`; unknown addresses are ignored.
#[no_mangle]
pub extern "C" fn RemoveAddress(address: *mut c_void) {
    with_registry("RemoveAddress", (), |registry| {
        registry.unprotect(address as usize).map(|_| ())
    });
}

/// Returns the hook slot for `original`, or `-1` if it is null or no slot is left.
#[no_mangle]
pub extern "C" fn AllocateHookForModule(original: Option<FreeFn>) -> i32 {
    let Some(original) = original else {
        log::error!("AllocateHookForModule: null free routine");
        return -1;
    };

    with_registry("AllocateHookForModule", -1, |registry| {
        let slot = registry.allocate_hook_slot(original)?;
        Ok(i32::try_from(slot).unwrap_or(-1))
    })
}

/// Returns the hook function of `slot`, or null if the slot is out of range.
#[no_mangle]
pub extern "C" fn GetHookForSlot(slot: i32) -> *mut c_void {
    let Ok(slot) = usize::try_from(slot) else {
        log::error!("GetHookForSlot: negative slot {}", slot);
        return std::ptr::null_mut();
    };

    with_registry("GetHookForSlot", std::ptr::null_mut(), |registry| {
        Ok(registry.hook_for_slot(slot)? as *mut c_void)
    })
}

/// Returns the hook to patch over `original`, or null if it is null or no slot is left.
#[no_mangle]
pub extern "C" fn GetOrAddReplacement(original: Option<FreeFn>) -> *mut c_void {
    let Some(original) = original else {
        log::error!("GetOrAddReplacement: null free routine");
        return std::ptr::null_mut();
    };

    with_registry("GetOrAddReplacement", std::ptr::null_mut(), |registry| {
        Ok(registry.replacement_for(original)? as *mut c_void)
    })
}

#[cfg(windows)]
mod windows_entry {
    use std::{
        ffi::c_void,
        panic::{catch_unwind, AssertUnwindSafe},
    };

    use widestring::U16CStr;
    use windows::Win32::{
        Foundation::{BOOL, HINSTANCE, TRUE},
        System::SystemServices::{DLL_PROCESS_ATTACH, DLL_PROCESS_DETACH},
    };

    use crate::{
        arbitration::{global, ArbitrationConfig},
        bootstrap::{self, ExecutionReport},
        host::WindowsPlatform,
    };

    unsafe fn run_entry(
        export: &str,
        argument: *const u16,
        entry: fn(&WindowsPlatform, &str) -> Option<ExecutionReport>,
    ) {
        if argument.is_null() {
            bootstrap::init_logging();
            log::error!("{}: null argument", export);
            return;
        }

        let blob = U16CStr::from_ptr_str(argument).to_string_lossy();
        if catch_unwind(AssertUnwindSafe(|| entry(&WindowsPlatform, &blob))).is_err() {
            log::error!("{}: panicked", export);
        }
    }

    /// Runs the five-field adapter stage.
    ///
    /// # Safety
    ///
    /// `argument` must be null or a NUL-terminated UTF-16 string.
    #[no_mangle]
    pub unsafe extern "C" fn AdapterEntryPoint(argument: *const u16) {
        run_entry("AdapterEntryPoint", argument, bootstrap::adapter_entry::<WindowsPlatform>);
    }

    /// Runs the three-field bootstrap stage.
    ///
    /// # Safety
    ///
    /// `argument` must be null or a NUL-terminated UTF-16 string.
    #[no_mangle]
    pub unsafe extern "C" fn LoadManagedProject(argument: *const u16) {
        run_entry("LoadManagedProject", argument, bootstrap::bootstrap_entry::<WindowsPlatform>);
    }

    /// Installs the arbitration registry on attach and tears it down on detach.
    #[no_mangle]
    pub extern "system" fn DllMain(_module: HINSTANCE, reason: u32, _reserved: *mut c_void) -> BOOL {
        match reason {
            DLL_PROCESS_ATTACH => {
                // Under the loader lock: allocate only, no logger setup
                let _ = global::install(ArbitrationConfig::default());
            }
            DLL_PROCESS_DETACH => {
                global::teardown();
            }
            _ => {}
        }
        TRUE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        arbitration::TRAMPOLINE_COUNT,
        test::{
            frees::{calls, COUNTING_FREES},
            GLOBAL_REGISTRY_LOCK,
        },
    };

    #[test]
    fn test_exported_arbitration_flow() {
        let _guard = GLOBAL_REGISTRY_LOCK.lock().unwrap();
        global::teardown();

        let slot = AllocateHookForModule(Some(COUNTING_FREES[14]));
        assert_eq!(slot, 0);
        assert_eq!(AllocateHookForModule(Some(COUNTING_FREES[14])), slot);

        let hook = GetOrAddReplacement(Some(COUNTING_FREES[14]));
        assert_eq!(hook, GetHookForSlot(slot));
        let hook: FreeFn = unsafe { std::mem::transmute(hook) };

        let object = 0xF000 as *mut c_void;
        let before = calls(14);

        AddAddress(object);
        unsafe { hook(object, std::ptr::null_mut()) };
        assert_eq!(calls(14), before);

        RemoveAddress(object);
        RemoveAddress(object);
        unsafe { hook(object, std::ptr::null_mut()) };
        assert_eq!(calls(14), before + 1);

        global::teardown();
    }

    #[test]
    fn test_exported_sentinels() {
        let _guard = GLOBAL_REGISTRY_LOCK.lock().unwrap();
        global::teardown();

        assert_eq!(AllocateHookForModule(None), -1);
        assert!(GetOrAddReplacement(None).is_null());
        assert!(GetHookForSlot(-1).is_null());
        assert!(GetHookForSlot(TRAMPOLINE_COUNT as i32).is_null());

        for free in COUNTING_FREES.iter().take(10) {
            assert!(AllocateHookForModule(Some(*free)) >= 0);
        }
        assert_eq!(AllocateHookForModule(Some(COUNTING_FREES[10])), -1);
        assert!(GetOrAddReplacement(Some(COUNTING_FREES[11])).is_null());

        global::teardown();
    }
}
