//! Windows implementation of the hosting capabilities.
//!
//! The runtime hosting interfaces are not part of the `windows` crate, so the vtables are laid
//! out by hand. Only the slots the locator calls are typed; the rest are kept as opaque
//! pointers so the offsets stay right. Every interface pointer is wrapped in a [`ComPtr`] that
//! calls `Release` on drop.

use std::{
    ffi::{c_void, CString},
    marker::PhantomData,
    ptr::NonNull,
};

use widestring::U16CString;
use windows::{
    core::{GUID, HRESULT, PCSTR, PCWSTR},
    Win32::{
        Foundation::HMODULE,
        System::{
            Console::{AllocConsole, FreeConsole},
            LibraryLoader::{GetModuleHandleW, GetProcAddress, LoadLibraryW},
        },
    },
};

use crate::{
    hresult::HResult,
    host::{
        guids::{
            CLSID_CLR_META_HOST, CLSID_CLR_RUNTIME_HOST, IID_ICLR_META_HOST,
            IID_ICLR_RUNTIME_HOST, IID_ICLR_RUNTIME_INFO,
        },
        HostFactory, HostResult, HostingPlatform, MetaHost, RuntimeHost, RuntimeInfo,
        RuntimeModule,
    },
};

type Slot = *const c_void;

type ClrCreateInstanceFn = unsafe extern "system" fn(
    clsid: *const GUID,
    riid: *const GUID,
    ppinterface: *mut *mut c_void,
) -> HRESULT;

type GetClrRuntimeHostFn =
    unsafe extern "system" fn(riid: *const GUID, ppv: *mut *mut c_void) -> HRESULT;

#[repr(C)]
#[allow(dead_code)]
struct IUnknownVtbl {
    query_interface: Slot,
    add_ref: Slot,
    release: unsafe extern "system" fn(*mut c_void) -> u32,
}

#[repr(C)]
#[allow(dead_code)]
struct ICLRMetaHostVtbl {
    base: IUnknownVtbl,
    get_runtime:
        unsafe extern "system" fn(*mut c_void, PCWSTR, *const GUID, *mut *mut c_void) -> HRESULT,
}

#[repr(C)]
#[allow(dead_code)]
struct ICLRRuntimeInfoVtbl {
    base: IUnknownVtbl,
    get_version_string: Slot,
    get_runtime_directory: Slot,
    is_loaded: Slot,
    load_error_string: Slot,
    load_library: Slot,
    get_proc_address: Slot,
    get_interface: unsafe extern "system" fn(
        *mut c_void,
        *const GUID,
        *const GUID,
        *mut *mut c_void,
    ) -> HRESULT,
    is_loadable: unsafe extern "system" fn(*mut c_void, *mut i32) -> HRESULT,
}

#[repr(C)]
#[allow(dead_code)]
struct ICLRRuntimeHostVtbl {
    base: IUnknownVtbl,
    start: unsafe extern "system" fn(*mut c_void) -> HRESULT,
    stop: Slot,
    set_host_control: Slot,
    get_clr_control: Slot,
    unload_app_domain: Slot,
    execute_in_app_domain: Slot,
    get_current_app_domain_id: Slot,
    execute_application: Slot,
    execute_in_default_app_domain: unsafe extern "system" fn(
        *mut c_void,
        PCWSTR,
        PCWSTR,
        PCWSTR,
        PCWSTR,
        *mut u32,
    ) -> HRESULT,
}

/// Owned COM interface pointer whose vtable starts with `IUnknown`.
struct ComPtr<V> {
    raw: NonNull<c_void>,
    _vtbl: PhantomData<*const V>,
}

impl<V> ComPtr<V> {
    /// Takes ownership of one reference.
    ///
    /// # Safety
    ///
    /// `raw` must be null or a live interface pointer whose vtable has layout `V`.
    unsafe fn from_raw(raw: *mut c_void) -> Option<Self> {
        NonNull::new(raw).map(|raw| ComPtr {
            raw,
            _vtbl: PhantomData,
        })
    }

    fn as_raw(&self) -> *mut c_void {
        self.raw.as_ptr()
    }

    fn vtbl(&self) -> &V {
        // SAFETY: from_raw guarantees a live object whose first field is a `*const V`
        unsafe { &**(self.raw.as_ptr() as *const *const V) }
    }
}

impl<V> Drop for ComPtr<V> {
    fn drop(&mut self) {
        // SAFETY: every vtable used with ComPtr starts with IUnknownVtbl
        unsafe {
            let vtbl = *(self.raw.as_ptr() as *const *const IUnknownVtbl);
            ((*vtbl).release)(self.raw.as_ptr());
        }
    }
}

fn to_guid(guid: &uguid::Guid) -> GUID {
    let b = guid.to_bytes();
    GUID::from_values(
        u32::from_le_bytes([b[0], b[1], b[2], b[3]]),
        u16::from_le_bytes([b[4], b[5]]),
        u16::from_le_bytes([b[6], b[7]]),
        [b[8], b[9], b[10], b[11], b[12], b[13], b[14], b[15]],
    )
}

fn wide(value: &str) -> HostResult<U16CString> {
    U16CString::from_str(value).map_err(|_| HResult::E_INVALIDARG)
}

fn check(hr: HRESULT) -> HostResult<()> {
    HResult(hr.0).ok()
}

/// The hosting capabilities of the current Windows process.
#[derive(Clone, Copy, Debug, Default)]
pub struct WindowsPlatform;

impl HostingPlatform for WindowsPlatform {
    fn meta_host(&self) -> HostResult<Box<dyn MetaHost>> {
        let module = wide("mscoree.dll")?;
        // mscoree stays loaded for the lifetime of the runtime
        let mscoree = unsafe { LoadLibraryW(PCWSTR::from_raw(module.as_ptr())) }
            .map_err(|e| HResult(e.code().0))?;

        let create_instance: ClrCreateInstanceFn = unsafe {
            match GetProcAddress(mscoree, windows::core::s!("CLRCreateInstance")) {
                Some(p) => std::mem::transmute(p),
                None => return Err(HResult::E_NOINTERFACE),
            }
        };

        let mut raw = std::ptr::null_mut();
        let hr = unsafe {
            create_instance(
                &to_guid(&CLSID_CLR_META_HOST),
                &to_guid(&IID_ICLR_META_HOST),
                &mut raw,
            )
        };
        check(hr)?;

        let ptr = unsafe { ComPtr::from_raw(raw) }.ok_or(HResult::E_NOINTERFACE)?;
        Ok(Box::new(ClrMetaHost { ptr }))
    }

    fn loaded_module(&self, name: &str) -> Option<Box<dyn RuntimeModule>> {
        let name = wide(name).ok()?;
        let module = unsafe { GetModuleHandleW(PCWSTR::from_raw(name.as_ptr())) }.ok()?;
        Some(Box::new(LoadedModule { module }))
    }

    fn allocate_console(&self) -> bool {
        unsafe { AllocConsole() }.is_ok()
    }

    fn free_console(&self) {
        if let Err(e) = unsafe { FreeConsole() } {
            log::debug!("FreeConsole failed: {}", e);
        }
    }
}

struct ClrMetaHost {
    ptr: ComPtr<ICLRMetaHostVtbl>,
}

impl MetaHost for ClrMetaHost {
    fn runtime(&self, version: &str) -> HostResult<Box<dyn RuntimeInfo>> {
        let version = wide(version)?;
        let mut raw = std::ptr::null_mut();
        let hr = unsafe {
            (self.ptr.vtbl().get_runtime)(
                self.ptr.as_raw(),
                PCWSTR::from_raw(version.as_ptr()),
                &to_guid(&IID_ICLR_RUNTIME_INFO),
                &mut raw,
            )
        };
        check(hr)?;

        let ptr = unsafe { ComPtr::from_raw(raw) }.ok_or(HResult::E_NOINTERFACE)?;
        Ok(Box::new(ClrRuntimeInfo { ptr }))
    }
}

struct ClrRuntimeInfo {
    ptr: ComPtr<ICLRRuntimeInfoVtbl>,
}

impl RuntimeInfo for ClrRuntimeInfo {
    fn is_loadable(&self) -> HostResult<bool> {
        let mut loadable = 0i32;
        let hr = unsafe { (self.ptr.vtbl().is_loadable)(self.ptr.as_raw(), &mut loadable) };
        check(hr)?;
        Ok(loadable != 0)
    }

    fn runtime_host(&self) -> HostResult<Box<dyn RuntimeHost>> {
        let mut raw = std::ptr::null_mut();
        let hr = unsafe {
            (self.ptr.vtbl().get_interface)(
                self.ptr.as_raw(),
                &to_guid(&CLSID_CLR_RUNTIME_HOST),
                &to_guid(&IID_ICLR_RUNTIME_HOST),
                &mut raw,
            )
        };
        check(hr)?;
        ClrRuntimeHost::boxed(raw)
    }
}

struct LoadedModule {
    module: HMODULE,
}

impl RuntimeModule for LoadedModule {
    fn host_factory(&self, export: &str) -> Option<HostFactory> {
        let export = CString::new(export).ok()?;
        let proc = unsafe { GetProcAddress(self.module, PCSTR::from_raw(export.as_ptr().cast())) }?;
        let factory: GetClrRuntimeHostFn = unsafe { std::mem::transmute(proc) };

        Some(Box::new(move || {
            let mut raw = std::ptr::null_mut();
            let hr = unsafe { factory(&to_guid(&IID_ICLR_RUNTIME_HOST), &mut raw) };
            check(hr)?;
            ClrRuntimeHost::boxed(raw)
        }))
    }
}

struct ClrRuntimeHost {
    ptr: ComPtr<ICLRRuntimeHostVtbl>,
}

impl ClrRuntimeHost {
    fn boxed(raw: *mut c_void) -> HostResult<Box<dyn RuntimeHost>> {
        let ptr = unsafe { ComPtr::from_raw(raw) }.ok_or(HResult::E_NOINTERFACE)?;
        Ok(Box::new(ClrRuntimeHost { ptr }))
    }
}

impl RuntimeHost for ClrRuntimeHost {
    fn start(&self) -> HResult {
        let hr = unsafe { (self.ptr.vtbl().start)(self.ptr.as_raw()) };
        HResult(hr.0)
    }

    fn execute_in_default_app_domain(
        &self,
        assembly_path: &str,
        type_name: &str,
        method_name: &str,
        argument: &str,
    ) -> HostResult<u32> {
        let assembly_path = wide(assembly_path)?;
        let type_name = wide(type_name)?;
        let method_name = wide(method_name)?;
        let argument = wide(argument)?;

        let mut ret = 0u32;
        let hr = unsafe {
            (self.ptr.vtbl().execute_in_default_app_domain)(
                self.ptr.as_raw(),
                PCWSTR::from_raw(assembly_path.as_ptr()),
                PCWSTR::from_raw(type_name.as_ptr()),
                PCWSTR::from_raw(method_name.as_ptr()),
                PCWSTR::from_raw(argument.as_ptr()),
                &mut ret,
            )
        };
        check(hr)?;
        Ok(ret)
    }
}
