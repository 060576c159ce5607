//! Injection Client.
//!
//! The producer side of the argument blob. It encodes the blob for one of the two injected
//! stages and hands it, together with the shim module and the export to call, to an external
//! [`ModuleInjector`]. How the module actually gets into the target process is not this crate's
//! concern.
//!
//! # Examples
//!
//! ```rust
//! use std::{cell::RefCell, path::Path};
//! use clrshim::inject::{DiverRequest, InjectionClient, InjectorError, ModuleInjector, TargetProcess};
//!
//! #[derive(Default)]
//! struct Recorder(RefCell<Vec<String>>);
//!
//! impl ModuleInjector for Recorder {
//!     fn inject(
//!         &self,
//!         _pid: u32,
//!         _module: &Path,
//!         _export: &str,
//!         argument: &str,
//!         _unload: bool,
//!     ) -> Result<(), InjectorError> {
//!         self.0.borrow_mut().push(argument.to_string());
//!         Ok(())
//!     }
//! }
//!
//! let client = InjectionClient::new(Recorder::default(), "C:\\toolkit");
//! let request = DiverRequest::new("C:\\toolkit\\ScubaDiver.dll", "9977", "net48");
//! client.inject_adapter(TargetProcess::new(4242, true), &request)?;
//! # Ok::<(), clrshim::Error>(())
//! ```

use std::path::{Path, PathBuf};

use crate::{
    args::{AdapterArguments, BootstrapArguments},
    Error, Result,
};

/// Shim module injected into 32-bit targets.
pub const MODULE_X86: &str = "UnmanagedAdapterDLL.dll";

/// Shim module injected into 64-bit targets.
pub const MODULE_X64: &str = "UnmanagedAdapterDLL_x64.dll";

/// Export that runs the five-field adapter stage.
pub const ADAPTER_EXPORT: &str = "AdapterEntryPoint";

/// Export that runs the three-field bootstrap stage.
pub const BOOTSTRAP_EXPORT: &str = "LoadManagedProject";

/// Managed type the adapter stage is pointed at by default.
pub const DEFAULT_DIVER_TYPE: &str = "ScubaDiver.DllEntry";

/// Managed method the adapter stage is pointed at by default.
pub const DEFAULT_DIVER_METHOD: &str = "EntryPoint";

/// Appended to the diver argument when the diver must connect back instead of listening.
pub const REVERSE_SUFFIX: &str = "~reverse";

/// Error reported by a [`ModuleInjector`].
pub type InjectorError = Box<dyn std::error::Error + Send + Sync>;

/// The external injection primitive.
///
/// Loads `module_path` into process `pid` and calls `export` with `argument` as its only
/// parameter. With `unload` set, the module is unloaded again once the export returns.
/// Fire-and-forget: nothing comes back from the export.
pub trait ModuleInjector {
    /// Injects the module and triggers the export.
    ///
    /// # Errors
    ///
    /// Returns whatever prevented the injection.
    fn inject(
        &self,
        pid: u32,
        module_path: &Path,
        export: &str,
        argument: &str,
        unload: bool,
    ) -> std::result::Result<(), InjectorError>;
}

/// The process to inject into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TargetProcess {
    /// Process id.
    pub pid: u32,
    /// Whether the process is 64-bit; selects the shim module.
    pub is_64bit: bool,
}

impl TargetProcess {
    /// Describes a target process.
    #[must_use]
    pub fn new(pid: u32, is_64bit: bool) -> Self {
        TargetProcess { pid, is_64bit }
    }
}

/// What to start inside the target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiverRequest {
    /// Path of the managed diver assembly, as seen by the target.
    pub assembly_path: String,
    /// Argument for the diver, usually its listening port.
    pub argument: String,
    /// Framework moniker of the target.
    pub framework: String,
    /// Ask the diver to connect back instead of listening.
    pub reverse: bool,
}

impl DiverRequest {
    /// Creates a request.
    pub fn new(
        assembly_path: impl Into<String>,
        argument: impl Into<String>,
        framework: impl Into<String>,
    ) -> Self {
        DiverRequest {
            assembly_path: assembly_path.into(),
            argument: argument.into(),
            framework: framework.into(),
            reverse: false,
        }
    }

    /// Sets the reverse-connection flag.
    #[must_use]
    pub fn with_reverse(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }

    /// The argument as the diver receives it.
    #[must_use]
    pub fn diver_argument(&self) -> String {
        if self.reverse {
            format!("{}{}", self.argument, REVERSE_SUFFIX)
        } else {
            self.argument.clone()
        }
    }
}

/// Encodes argument blobs and drives a [`ModuleInjector`].
pub struct InjectionClient<I: ModuleInjector> {
    injector: I,
    toolkit_dir: PathBuf,
    diver_type: String,
    diver_method: String,
    unload: bool,
}

impl<I: ModuleInjector> InjectionClient<I> {
    /// Creates a client that finds the shim modules in `toolkit_dir`.
    pub fn new(injector: I, toolkit_dir: impl Into<PathBuf>) -> Self {
        InjectionClient {
            injector,
            toolkit_dir: toolkit_dir.into(),
            diver_type: DEFAULT_DIVER_TYPE.to_string(),
            diver_method: DEFAULT_DIVER_METHOD.to_string(),
            unload: true,
        }
    }

    /// Whether the injector unloads the shim after the export returned. Defaults to `true`.
    #[must_use]
    pub fn with_unload(mut self, unload: bool) -> Self {
        self.unload = unload;
        self
    }

    /// Points the adapter stage at another managed entry point.
    #[must_use]
    pub fn with_entry_point(
        mut self,
        type_name: impl Into<String>,
        method_name: impl Into<String>,
    ) -> Self {
        self.diver_type = type_name.into();
        self.diver_method = method_name.into();
        self
    }

    /// The injector this client drives.
    pub fn injector(&self) -> &I {
        &self.injector
    }

    /// Path of the shim module matching the target's bitness.
    #[must_use]
    pub fn module_path(&self, target: TargetProcess) -> PathBuf {
        let module = if target.is_64bit {
            MODULE_X64
        } else {
            MODULE_X86
        };
        self.toolkit_dir.join(module)
    }

    /// Injects the shim and runs the adapter stage with a five-field blob.
    ///
    /// # Errors
    ///
    /// - [`Error::MalformedArgument`] if a field contains the blob delimiter
    /// - [`Error::InjectionFailed`] if the injector failed
    pub fn inject_adapter(&self, target: TargetProcess, request: &DiverRequest) -> Result<()> {
        let blob = AdapterArguments {
            assembly_path: request.assembly_path.clone(),
            type_name: self.diver_type.clone(),
            method_name: self.diver_method.clone(),
            argument: request.diver_argument(),
            framework: request.framework.clone(),
        }
        .encode()?;

        self.inject(target, ADAPTER_EXPORT, &blob)
    }

    /// Injects the shim and runs the bootstrap stage with a three-field blob.
    ///
    /// # Errors
    ///
    /// - [`Error::MalformedArgument`] if a field contains the blob delimiter
    /// - [`Error::InjectionFailed`] if the injector failed
    pub fn inject_bootstrap(&self, target: TargetProcess, request: &DiverRequest) -> Result<()> {
        let blob = BootstrapArguments {
            assembly_path: request.assembly_path.clone(),
            argument: request.diver_argument(),
            framework: request.framework.clone(),
        }
        .encode()?;

        self.inject(target, BOOTSTRAP_EXPORT, &blob)
    }

    fn inject(&self, target: TargetProcess, export: &str, blob: &str) -> Result<()> {
        let module = self.module_path(target);
        log::info!(
            "Injecting {} into {} ({})",
            module.display(),
            target.pid,
            export
        );

        self.injector
            .inject(target.pid, &module, export, blob, self.unload)
            .map_err(|e| Error::InjectionFailed {
                pid: target.pid,
                module: module.display().to_string(),
                message: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::ArgumentLayout;
    use std::cell::RefCell;

    #[derive(Debug, PartialEq, Eq)]
    struct Call {
        pid: u32,
        module: PathBuf,
        export: String,
        argument: String,
        unload: bool,
    }

    #[derive(Default)]
    struct Recorder {
        calls: RefCell<Vec<Call>>,
        fail: bool,
    }

    impl ModuleInjector for Recorder {
        fn inject(
            &self,
            pid: u32,
            module_path: &Path,
            export: &str,
            argument: &str,
            unload: bool,
        ) -> std::result::Result<(), InjectorError> {
            if self.fail {
                return Err("access denied".into());
            }
            self.calls.borrow_mut().push(Call {
                pid,
                module: module_path.to_path_buf(),
                export: export.to_string(),
                argument: argument.to_string(),
                unload,
            });
            Ok(())
        }
    }

    #[test]
    fn test_adapter_blob() {
        let client = InjectionClient::new(Recorder::default(), "tools");
        let request = DiverRequest::new("tools/ScubaDiver.dll", "9977", "net6.0-windows");
        client
            .inject_adapter(TargetProcess::new(100, true), &request)
            .unwrap();

        let calls = client.injector().calls.borrow();
        assert_eq!(
            calls[0],
            Call {
                pid: 100,
                module: PathBuf::from("tools").join(MODULE_X64),
                export: ADAPTER_EXPORT.into(),
                argument: "tools/ScubaDiver.dll*ScubaDiver.DllEntry*EntryPoint*9977*net6.0-windows"
                    .into(),
                unload: true,
            }
        );
        assert!(ArgumentLayout::Adapter.fields(&calls[0].argument).is_ok());
    }

    #[test]
    fn test_bootstrap_blob_with_reverse() {
        let client = InjectionClient::new(Recorder::default(), "tools");
        let request = DiverRequest::new("D.dll", "9977", "net48").with_reverse(true);
        client
            .inject_bootstrap(TargetProcess::new(7, false), &request)
            .unwrap();

        let calls = client.injector().calls.borrow();
        assert_eq!(calls[0].module, PathBuf::from("tools").join(MODULE_X86));
        assert_eq!(calls[0].export, BOOTSTRAP_EXPORT);
        assert_eq!(calls[0].argument, "D.dll*9977~reverse*net48");
    }

    #[test]
    fn test_unload_passed_to_injector() {
        let client = InjectionClient::new(Recorder::default(), "t").with_unload(false);
        let request = DiverRequest::new("D.dll", "9977", "net48");
        client
            .inject_adapter(TargetProcess::new(3, true), &request)
            .unwrap();
        client
            .inject_bootstrap(TargetProcess::new(3, true), &request)
            .unwrap();

        let calls = client.injector().calls.borrow();
        assert_eq!(calls.len(), 2);
        assert!(calls.iter().all(|call| !call.unload));
    }

    #[test]
    fn test_custom_entry_point() {
        let client =
            InjectionClient::new(Recorder::default(), "t").with_entry_point("My.Entry", "Go");
        client
            .inject_adapter(TargetProcess::new(1, true), &DiverRequest::new("a", "b", "c"))
            .unwrap();
        assert_eq!(client.injector().calls.borrow()[0].argument, "a*My.Entry*Go*b*c");
    }

    #[test]
    fn test_delimiter_in_path_rejected_before_injecting() {
        let client = InjectionClient::new(Recorder::default(), "t");
        let request = DiverRequest::new("C:\\odd*dir\\D.dll", "1", "net48");
        assert!(matches!(
            client.inject_bootstrap(TargetProcess::new(1, true), &request),
            Err(Error::MalformedArgument { .. })
        ));
        assert!(client.injector().calls.borrow().is_empty());
    }

    #[test]
    fn test_injector_failure() {
        let client = InjectionClient::new(
            Recorder {
                fail: true,
                ..Recorder::default()
            },
            "t",
        );
        let err = client
            .inject_adapter(TargetProcess::new(55, true), &DiverRequest::new("a", "b", "c"))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::InjectionFailed { pid: 55, ref message, .. } if message == "access denied"
        ));
    }
}
