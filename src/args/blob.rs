//! Positional argument blobs for the two injected stages.
//!
//! Producer and consumer share a field-count contract per stage:
//!
//! | Stage | Fields |
//! |-------|--------|
//! | Adapter | `assemblyPath*typeName*methodName*diverArgument*frameworkTag` |
//! | Bootstrap | `assemblyPath*diverArgument*frameworkTag` |
//!
//! Fewer fields than required is a hard failure. Surplus fields are ignored so an older shim
//! keeps working with a producer that appends new fields.

use strum::Display;

use crate::{
    args::codec::{join_checked, split, DELIMITER},
    Result,
};

/// The injected stage that consumes a blob, and thereby its field layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display)]
pub enum ArgumentLayout {
    /// Five fields, the managed type and method travel inside the blob.
    #[strum(to_string = "adapter")]
    Adapter,
    /// Three fields, the managed type and method come from configuration.
    #[strum(to_string = "bootstrap")]
    Bootstrap,
}

impl ArgumentLayout {
    /// Minimum number of fields the layout requires.
    #[must_use]
    pub fn min_fields(self) -> usize {
        match self {
            ArgumentLayout::Adapter => 5,
            ArgumentLayout::Bootstrap => 3,
        }
    }

    /// Splits `blob` and enforces the field-count contract.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::MalformedArgument`] if fewer than [`Self::min_fields`] fields are
    /// present.
    pub fn fields(self, blob: &str) -> Result<Vec<String>> {
        let parts = split(blob, DELIMITER);
        if parts.len() < self.min_fields() {
            return Err(malformed_error!(
                "{} blob needs {} fields, got {}",
                self,
                self.min_fields(),
                parts.len()
            ));
        }
        Ok(parts)
    }
}

/// Decoded adapter-stage arguments.
///
/// # Examples
///
/// ```rust
/// use clrshim::args::AdapterArguments;
///
/// let args = AdapterArguments::decode(
///     "C:\\app\\ScubaDiver.dll*ScubaDiver.DllEntry*EntryPoint*9977*net48",
/// )?;
/// assert_eq!(args.type_name, "ScubaDiver.DllEntry");
/// assert_eq!(args.argument, "9977");
/// assert_eq!(args.framework, "net48");
/// # Ok::<(), clrshim::Error>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdapterArguments {
    /// Path of the managed assembly to load.
    pub assembly_path: String,
    /// Fully qualified managed type containing the entry point.
    pub type_name: String,
    /// Name of the static entry point method.
    pub method_name: String,
    /// The single string handed to the entry point.
    pub argument: String,
    /// Raw framework moniker.
    pub framework: String,
}

impl AdapterArguments {
    /// Decodes a five-field adapter blob.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::MalformedArgument`] if the blob has fewer than five fields.
    pub fn decode(blob: &str) -> Result<Self> {
        let mut fields = ArgumentLayout::Adapter.fields(blob)?.into_iter();
        // Length was checked above
        let mut next = || fields.next().unwrap_or_default();

        Ok(AdapterArguments {
            assembly_path: next(),
            type_name: next(),
            method_name: next(),
            argument: next(),
            framework: next(),
        })
    }

    /// Encodes the arguments as a five-field blob.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::MalformedArgument`] if a field contains the delimiter or the
    /// framework moniker is empty.
    pub fn encode(&self) -> Result<String> {
        join_checked(&[
            ("assembly path", self.assembly_path.as_str()),
            ("type name", self.type_name.as_str()),
            ("method name", self.method_name.as_str()),
            ("argument", self.argument.as_str()),
            ("framework", self.framework.as_str()),
        ])
    }
}

/// Decoded bootstrap-stage arguments.
///
/// # Examples
///
/// ```rust
/// use clrshim::args::BootstrapArguments;
///
/// let args = BootstrapArguments::decode("C:\\app\\Diver.dll*hello*net6.0-windows")?;
/// assert_eq!(args.assembly_path, "C:\\app\\Diver.dll");
/// assert_eq!(args.argument, "hello");
/// # Ok::<(), clrshim::Error>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BootstrapArguments {
    /// Path of the managed assembly to load.
    pub assembly_path: String,
    /// The single string handed to the entry point.
    pub argument: String,
    /// Raw framework moniker.
    pub framework: String,
}

impl BootstrapArguments {
    /// Decodes a three-field bootstrap blob.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::MalformedArgument`] if the blob has fewer than three fields.
    pub fn decode(blob: &str) -> Result<Self> {
        let mut fields = ArgumentLayout::Bootstrap.fields(blob)?.into_iter();
        let mut next = || fields.next().unwrap_or_default();

        Ok(BootstrapArguments {
            assembly_path: next(),
            argument: next(),
            framework: next(),
        })
    }

    /// Encodes the arguments as a three-field blob.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::MalformedArgument`] if a field contains the delimiter or the
    /// framework moniker is empty.
    pub fn encode(&self) -> Result<String> {
        join_checked(&[
            ("assembly path", self.assembly_path.as_str()),
            ("argument", self.argument.as_str()),
            ("framework", self.framework.as_str()),
        ])
    }

    /// Widens the arguments with the entry point the bootstrap stage is configured for.
    #[must_use]
    pub fn with_entry_point(
        self,
        type_name: impl Into<String>,
        method_name: impl Into<String>,
    ) -> AdapterArguments {
        AdapterArguments {
            assembly_path: self.assembly_path,
            type_name: type_name.into(),
            method_name: method_name.into(),
            argument: self.argument,
            framework: self.framework,
        }
    }
}
