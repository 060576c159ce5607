//! Platform-independent COM status codes.
//!
//! The hosting interfaces report every outcome as a 32-bit `HRESULT`. [`HResult`] mirrors that
//! value without depending on any Windows bindings, so the locator state machine and its tests
//! compile and run on every platform.

use std::fmt;

/// A 32-bit COM status code. Negative values are failures.
///
/// # Examples
///
/// ```rust
/// use clrshim::HResult;
///
/// assert!(HResult::S_OK.is_success());
/// assert!(HResult::S_FALSE.is_success());
/// assert!(HResult::FILE_NOT_FOUND.is_failure());
/// assert_eq!(HResult::FILE_NOT_FOUND.to_string(), "0x80070002");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HResult(pub i32);

impl HResult {
    /// Operation succeeded.
    pub const S_OK: Self = Self(0);

    /// Operation succeeded but had nothing to do (e.g. runtime already started).
    pub const S_FALSE: Self = Self(1);

    /// Unspecified failure.
    pub const E_FAIL: Self = Self(0x8000_4005_u32 as i32);

    /// The requested interface is not supported.
    pub const E_NOINTERFACE: Self = Self(0x8000_4002_u32 as i32);

    /// One or more arguments are invalid.
    pub const E_INVALIDARG: Self = Self(0x8007_0057_u32 as i32);

    /// Win32 `ERROR_FILE_NOT_FOUND` wrapped as an `HRESULT`.
    ///
    /// Returned by the legacy host when the assembly, type or method cannot be located.
    pub const FILE_NOT_FOUND: Self = Self(0x8007_0002_u32 as i32);

    /// Returns `true` for success codes (`S_OK`, `S_FALSE`, ...).
    #[must_use]
    pub fn is_success(self) -> bool {
        self.0 >= 0
    }

    /// Returns `true` for failure codes.
    #[must_use]
    pub fn is_failure(self) -> bool {
        self.0 < 0
    }

    /// Converts the code into a `Result`, keeping the failure code as the error.
    ///
    /// # Errors
    ///
    /// Returns `Err(self)` if the code is a failure.
    pub fn ok(self) -> std::result::Result<(), HResult> {
        if self.is_success() {
            Ok(())
        } else {
            Err(self)
        }
    }

    /// Returns the raw bits as an unsigned value.
    #[must_use]
    pub fn bits(self) -> u32 {
        self.0 as u32
    }
}

impl fmt::Display for HResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.bits())
    }
}

impl From<i32> for HResult {
    fn from(value: i32) -> Self {
        HResult(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_and_failure() {
        assert!(HResult::S_OK.ok().is_ok());
        assert!(HResult::S_FALSE.ok().is_ok());
        assert_eq!(HResult::E_FAIL.ok(), Err(HResult::E_FAIL));
        assert!(HResult::E_NOINTERFACE.is_failure());
    }

    #[test]
    fn test_display_is_hex() {
        assert_eq!(HResult::S_OK.to_string(), "0x00000000");
        assert_eq!(HResult::E_FAIL.to_string(), "0x80004005");
        assert_eq!(HResult::FILE_NOT_FOUND.bits(), 0x8007_0002);
    }
}
