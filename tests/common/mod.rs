//! Scripted hosting platform shared by the integration tests.

#![allow(dead_code)]

use std::{cell::RefCell, rc::Rc};

use clrshim::{
    host::{HostFactory, HostResult, HostingPlatform, MetaHost, RuntimeHost, RuntimeInfo, RuntimeModule},
    HResult,
};

/// What the scripted runtime does at each step.
#[derive(Clone, Debug)]
pub struct Script {
    pub legacy_installed: bool,
    pub loadable: bool,
    pub start: HResult,
    pub runtime_module_loaded: bool,
    pub execute: HostResult<u32>,
}

impl Default for Script {
    fn default() -> Self {
        Script {
            legacy_installed: true,
            loadable: true,
            start: HResult::S_OK,
            runtime_module_loaded: true,
            execute: Ok(0),
        }
    }
}

/// Calls observed by the scripted runtime, in order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Trace {
    pub calls: Vec<String>,
}

impl Trace {
    pub fn contains(&self, call: &str) -> bool {
        self.calls.iter().any(|c| c == call)
    }

    pub fn executions(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| c.strip_prefix("execute "))
            .collect()
    }
}

type Shared = Rc<RefCell<Trace>>;

pub struct ScriptedPlatform {
    script: Script,
    trace: Shared,
}

impl ScriptedPlatform {
    pub fn new(script: Script) -> Self {
        ScriptedPlatform {
            script,
            trace: Shared::default(),
        }
    }

    pub fn trace(&self) -> Trace {
        self.trace.borrow().clone()
    }
}

fn record(trace: &Shared, call: impl Into<String>) {
    trace.borrow_mut().calls.push(call.into());
}

struct Scripted {
    script: Script,
    trace: Shared,
}

impl Scripted {
    fn boxed(script: &Script, trace: &Shared) -> Box<Self> {
        Box::new(Scripted {
            script: script.clone(),
            trace: trace.clone(),
        })
    }
}

impl HostingPlatform for ScriptedPlatform {
    fn meta_host(&self) -> HostResult<Box<dyn MetaHost>> {
        record(&self.trace, "meta_host");
        Ok(Scripted::boxed(&self.script, &self.trace))
    }

    fn loaded_module(&self, name: &str) -> Option<Box<dyn RuntimeModule>> {
        record(&self.trace, format!("probe {}", name));
        if !self.script.runtime_module_loaded {
            return None;
        }
        Some(Scripted::boxed(&self.script, &self.trace))
    }
}

impl MetaHost for Scripted {
    fn runtime(&self, version: &str) -> HostResult<Box<dyn RuntimeInfo>> {
        record(&self.trace, format!("runtime {}", version));
        if !self.script.legacy_installed {
            return Err(HResult::E_INVALIDARG);
        }
        Ok(Scripted::boxed(&self.script, &self.trace))
    }
}

impl RuntimeInfo for Scripted {
    fn is_loadable(&self) -> HostResult<bool> {
        Ok(self.script.loadable)
    }

    fn runtime_host(&self) -> HostResult<Box<dyn RuntimeHost>> {
        record(&self.trace, "runtime_host");
        Ok(Scripted::boxed(&self.script, &self.trace))
    }
}

impl RuntimeModule for Scripted {
    fn host_factory(&self, export: &str) -> Option<HostFactory> {
        record(&self.trace, format!("factory {}", export));
        let host: Box<dyn RuntimeHost> = Scripted::boxed(&self.script, &self.trace);
        Some(Box::new(move || Ok(host)))
    }
}

impl RuntimeHost for Scripted {
    fn start(&self) -> HResult {
        record(&self.trace, "start");
        self.script.start
    }

    fn execute_in_default_app_domain(
        &self,
        assembly_path: &str,
        type_name: &str,
        method_name: &str,
        argument: &str,
    ) -> HostResult<u32> {
        record(
            &self.trace,
            format!(
                "execute {}|{}|{}|{}",
                assembly_path, type_name, method_name, argument
            ),
        );
        self.script.execute
    }
}
