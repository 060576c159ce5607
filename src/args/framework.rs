//! Framework moniker classification.
//!
//! The last field of every argument blob names the target framework with a free-text moniker
//! such as `net6.0-windows` or `net48`. [`MonikerTable`] maps it to a [`FrameworkTag`], which in
//! turn decides the runtime locator strategy. The allow-lists are plain data so new runtime
//! releases only need a new entry.

use strum::{Display, EnumIter};

/// Classification of the framework moniker carried in the argument blob.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum FrameworkTag {
    /// .NET Framework hosted through the fixed-version meta-host.
    #[strum(to_string = "legacy framework")]
    LegacyFramework,
    /// .NET Core / .NET 5+ whose runtime module is already loaded in the process.
    #[strum(to_string = "modern runtime")]
    ModernRuntime,
    /// No strategy applies. Only produced in strict mode.
    #[strum(to_string = "unknown framework")]
    Unknown,
}

/// Monikers that select the modern in-process host.
pub const MODERN_MONIKERS: &[&str] = &[
    "netcoreapp3.0",
    "netcoreapp3.1",
    "net5.0-windows",
    "net6.0-windows",
    "net7.0-windows",
    "net8.0-windows",
    "net9.0-windows",
    "native",
];

/// Monikers that explicitly select the legacy host.
///
/// Unmatched monikers fall back to the legacy host anyway, so this list only matters in strict
/// mode.
pub const LEGACY_MONIKERS: &[&str] = &[
    "net40", "net45", "net451", "net452", "net46", "net461", "net462", "net47", "net471",
    "net472", "net48", "net481",
];

/// Case-insensitive, exact-length comparison of two monikers.
///
/// # Examples
///
/// ```rust
/// use clrshim::args::moniker_eq;
///
/// assert!(moniker_eq("NET6.0-WINDOWS", "net6.0-windows"));
/// assert!(!moniker_eq("net6.0-windows7", "net6.0-windows"));
/// ```
#[must_use]
pub fn moniker_eq(a: &str, b: &str) -> bool {
    a.len() == b.len()
        && a.chars()
            .zip(b.chars())
            .all(|(x, y)| x.to_lowercase().eq(y.to_lowercase()))
}

/// Allow-list driven classifier for framework monikers.
///
/// # Default Behavior
///
/// Monikers found in the modern list classify as [`FrameworkTag::ModernRuntime`]. Every other
/// moniker, including typos and runtimes released after the list was last updated, classifies
/// as [`FrameworkTag::LegacyFramework`]. With [`MonikerTable::strict`] enabled, only monikers in
/// the legacy list classify as legacy and the rest become [`FrameworkTag::Unknown`].
///
/// # Examples
///
/// ```rust
/// use clrshim::args::{FrameworkTag, MonikerTable};
///
/// let table = MonikerTable::default();
/// assert_eq!(table.classify("Net6.0-Windows"), FrameworkTag::ModernRuntime);
/// assert_eq!(table.classify("cobol-rt"), FrameworkTag::LegacyFramework);
///
/// let strict = MonikerTable::default().strict(true);
/// assert_eq!(strict.classify("cobol-rt"), FrameworkTag::Unknown);
///
/// let extended = MonikerTable::default().with_modern_moniker("net10.0-windows");
/// assert_eq!(extended.classify("NET10.0-WINDOWS"), FrameworkTag::ModernRuntime);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MonikerTable {
    modern: Vec<String>,
    legacy: Vec<String>,
    strict: bool,
}

impl Default for MonikerTable {
    fn default() -> Self {
        MonikerTable {
            modern: MODERN_MONIKERS.iter().map(|m| (*m).to_string()).collect(),
            legacy: LEGACY_MONIKERS.iter().map(|m| (*m).to_string()).collect(),
            strict: false,
        }
    }
}

impl MonikerTable {
    /// Adds a moniker that selects the modern host.
    #[must_use]
    pub fn with_modern_moniker(mut self, moniker: impl Into<String>) -> Self {
        self.modern.push(moniker.into());
        self
    }

    /// Adds a moniker that selects the legacy host.
    #[must_use]
    pub fn with_legacy_moniker(mut self, moniker: impl Into<String>) -> Self {
        self.legacy.push(moniker.into());
        self
    }

    /// Enables or disables strict mode.
    #[must_use]
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Returns `true` if unmatched monikers classify as [`FrameworkTag::Unknown`].
    #[must_use]
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Classifies a moniker.
    #[must_use]
    pub fn classify(&self, moniker: &str) -> FrameworkTag {
        if self.modern.iter().any(|m| moniker_eq(m, moniker)) {
            return FrameworkTag::ModernRuntime;
        }

        if !self.strict || self.legacy.iter().any(|m| moniker_eq(m, moniker)) {
            return FrameworkTag::LegacyFramework;
        }

        FrameworkTag::Unknown
    }
}
