//! Shared test fixtures.
//!
//! [`StubPlatform`] implements every hosting capability in memory. Its behaviour is scripted
//! through [`StubBehavior`] and every call is recorded into a [`StubLog`] that tests inspect
//! afterwards.

use std::sync::{Arc, Mutex};

use crate::{
    hresult::HResult,
    host::{
        HostFactory, HostResult, HostingPlatform, MetaHost, RuntimeHost, RuntimeInfo,
        RuntimeModule,
    },
};

/// One recorded `ExecuteInDefaultAppDomain` call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Execution {
    pub assembly_path: String,
    pub type_name: String,
    pub method_name: String,
    pub argument: String,
}

/// Scripted outcome of every stub call. The default succeeds everywhere.
#[derive(Clone, Debug)]
pub struct StubBehavior {
    pub meta_host: HostResult<()>,
    pub runtime: HostResult<()>,
    pub loadable: HostResult<bool>,
    pub host_interface: HostResult<()>,
    pub start_result: HResult,
    pub runtime_module_loaded: bool,
    pub factory_exported: bool,
    pub factory_result: HostResult<()>,
    pub execute_result: HostResult<u32>,
    pub console_available: bool,
}

impl Default for StubBehavior {
    fn default() -> Self {
        StubBehavior {
            meta_host: Ok(()),
            runtime: Ok(()),
            loadable: Ok(true),
            host_interface: Ok(()),
            start_result: HResult::S_OK,
            runtime_module_loaded: true,
            factory_exported: true,
            factory_result: Ok(()),
            execute_result: Ok(0),
            console_available: true,
        }
    }
}

/// Everything the stubs observed.
#[derive(Clone, Debug, Default)]
pub struct StubLog {
    pub meta_host_requests: usize,
    pub requested_versions: Vec<String>,
    pub host_requests: usize,
    pub start_calls: usize,
    pub probed_modules: Vec<String>,
    pub resolved_exports: Vec<String>,
    pub executions: Vec<Execution>,
    pub acquired: usize,
    pub released: usize,
    pub consoles_allocated: usize,
    pub consoles_freed: usize,
}

type SharedLog = Arc<Mutex<StubLog>>;

/// In-memory hosting platform.
pub struct StubPlatform {
    behavior: StubBehavior,
    log: SharedLog,
}

impl StubPlatform {
    pub fn new(behavior: StubBehavior) -> Self {
        StubPlatform {
            behavior,
            log: Arc::default(),
        }
    }

    /// Snapshot of the calls recorded so far.
    pub fn log(&self) -> StubLog {
        self.log.lock().unwrap().clone()
    }
}

// Counts acquisition on creation and release on drop
struct Tracked {
    log: SharedLog,
}

impl Tracked {
    fn new(log: &SharedLog) -> Self {
        log.lock().unwrap().acquired += 1;
        Tracked { log: log.clone() }
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.log.lock().unwrap().released += 1;
    }
}

struct StubMetaHost {
    behavior: StubBehavior,
    log: SharedLog,
    _tracked: Tracked,
}

struct StubRuntimeInfo {
    behavior: StubBehavior,
    log: SharedLog,
    _tracked: Tracked,
}

struct StubRuntimeHost {
    behavior: StubBehavior,
    log: SharedLog,
    _tracked: Tracked,
}

struct StubRuntimeModule {
    behavior: StubBehavior,
    log: SharedLog,
    _tracked: Tracked,
}

impl StubRuntimeHost {
    fn boxed(behavior: &StubBehavior, log: &SharedLog) -> Box<dyn RuntimeHost> {
        Box::new(StubRuntimeHost {
            behavior: behavior.clone(),
            log: log.clone(),
            _tracked: Tracked::new(log),
        })
    }
}

impl HostingPlatform for StubPlatform {
    fn meta_host(&self) -> HostResult<Box<dyn MetaHost>> {
        self.log.lock().unwrap().meta_host_requests += 1;
        self.behavior.meta_host?;
        Ok(Box::new(StubMetaHost {
            behavior: self.behavior.clone(),
            log: self.log.clone(),
            _tracked: Tracked::new(&self.log),
        }))
    }

    fn loaded_module(&self, name: &str) -> Option<Box<dyn RuntimeModule>> {
        self.log.lock().unwrap().probed_modules.push(name.to_string());
        if !self.behavior.runtime_module_loaded {
            return None;
        }
        Some(Box::new(StubRuntimeModule {
            behavior: self.behavior.clone(),
            log: self.log.clone(),
            _tracked: Tracked::new(&self.log),
        }))
    }

    fn allocate_console(&self) -> bool {
        if self.behavior.console_available {
            self.log.lock().unwrap().consoles_allocated += 1;
        }
        self.behavior.console_available
    }

    fn free_console(&self) {
        self.log.lock().unwrap().consoles_freed += 1;
    }
}

impl MetaHost for StubMetaHost {
    fn runtime(&self, version: &str) -> HostResult<Box<dyn RuntimeInfo>> {
        self.log
            .lock()
            .unwrap()
            .requested_versions
            .push(version.to_string());
        self.behavior.runtime?;
        Ok(Box::new(StubRuntimeInfo {
            behavior: self.behavior.clone(),
            log: self.log.clone(),
            _tracked: Tracked::new(&self.log),
        }))
    }
}

impl RuntimeInfo for StubRuntimeInfo {
    fn is_loadable(&self) -> HostResult<bool> {
        self.behavior.loadable
    }

    fn runtime_host(&self) -> HostResult<Box<dyn RuntimeHost>> {
        self.log.lock().unwrap().host_requests += 1;
        self.behavior.host_interface?;
        Ok(StubRuntimeHost::boxed(&self.behavior, &self.log))
    }
}

impl RuntimeModule for StubRuntimeModule {
    fn host_factory(&self, export: &str) -> Option<HostFactory> {
        self.log
            .lock()
            .unwrap()
            .resolved_exports
            .push(export.to_string());
        if !self.behavior.factory_exported {
            return None;
        }

        let behavior = self.behavior.clone();
        let log = self.log.clone();
        Some(Box::new(move || {
            log.lock().unwrap().host_requests += 1;
            behavior.factory_result?;
            Ok(StubRuntimeHost::boxed(&behavior, &log))
        }))
    }
}

impl RuntimeHost for StubRuntimeHost {
    fn start(&self) -> HResult {
        self.log.lock().unwrap().start_calls += 1;
        self.behavior.start_result
    }

    fn execute_in_default_app_domain(
        &self,
        assembly_path: &str,
        type_name: &str,
        method_name: &str,
        argument: &str,
    ) -> HostResult<u32> {
        self.log.lock().unwrap().executions.push(Execution {
            assembly_path: assembly_path.to_string(),
            type_name: type_name.to_string(),
            method_name: method_name.to_string(),
            argument: argument.to_string(),
        });
        self.behavior.execute_result
    }
}

/// Counting deallocation routines for the arbitration tests.
///
/// Each index is a distinct function with its own counter, so tests that assert call counts
/// must use indices no other test dispatches to.
pub mod frees {
    use std::{
        ffi::c_void,
        sync::atomic::{AtomicUsize, Ordering},
    };

    use crate::arbitration::FreeFn;

    #[allow(clippy::declare_interior_mutable_const)]
    const ZERO: AtomicUsize = AtomicUsize::new(0);

    pub static FREE_CALLS: [AtomicUsize; 16] = [ZERO; 16];

    unsafe extern "C" fn counting_free<const N: usize>(_ptr: *mut c_void, _extra: *mut c_void) {
        FREE_CALLS[N].fetch_add(1, Ordering::SeqCst);
    }

    pub const COUNTING_FREES: [FreeFn; 16] = [
        counting_free::<0>,
        counting_free::<1>,
        counting_free::<2>,
        counting_free::<3>,
        counting_free::<4>,
        counting_free::<5>,
        counting_free::<6>,
        counting_free::<7>,
        counting_free::<8>,
        counting_free::<9>,
        counting_free::<10>,
        counting_free::<11>,
        counting_free::<12>,
        counting_free::<13>,
        counting_free::<14>,
        counting_free::<15>,
    ];

    pub fn calls(index: usize) -> usize {
        FREE_CALLS[index].load(Ordering::SeqCst)
    }
}

/// Serialises tests that install or tear down the process-wide registry.
pub static GLOBAL_REGISTRY_LOCK: Mutex<()> = Mutex::new(());
