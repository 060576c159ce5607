//! Delimiter-separated field codec.
//!
//! The blob crossing the process boundary is a single string whose fields are separated by a
//! reserved delimiter. There is no escaping: a field that contains the delimiter would shift
//! every following field, which is why [`join_checked`] refuses to produce such a blob.

use crate::Result;

/// The reserved field delimiter of the argument blob.
pub const DELIMITER: &str = "*";

/// Splits `input` on every non-overlapping occurrence of `delimiter`.
///
/// Empty fields between two delimiters are kept. A trailing remainder only becomes a field when
/// it is non-empty, so `"a*b*"` yields two fields. An input without any delimiter yields a
/// single field equal to the input, an empty input yields no fields, and an empty delimiter
/// yields the whole input as one field.
///
/// # Examples
///
/// ```rust
/// use clrshim::args::split;
///
/// assert_eq!(split("a*b*c", "*"), vec!["a", "b", "c"]);
/// assert_eq!(split("a**c", "*"), vec!["a", "", "c"]);
/// assert_eq!(split("a*b*", "*"), vec!["a", "b"]);
/// assert_eq!(split("plain", "*"), vec!["plain"]);
/// assert!(split("", "*").is_empty());
/// ```
#[must_use]
pub fn split(input: &str, delimiter: &str) -> Vec<String> {
    if delimiter.is_empty() {
        return if input.is_empty() {
            Vec::new()
        } else {
            vec![input.to_string()]
        };
    }

    let mut parts = Vec::new();
    let mut rest = input;
    while let Some(end) = rest.find(delimiter) {
        parts.push(rest[..end].to_string());
        rest = &rest[end + delimiter.len()..];
    }

    if !rest.is_empty() {
        parts.push(rest.to_string());
    }

    parts
}

/// Joins `fields` with `delimiter`; the inverse of [`split`].
///
/// `split(join(fields))` reproduces `fields` whenever no field contains the delimiter and the
/// last field is non-empty.
///
/// # Examples
///
/// ```rust
/// use clrshim::args::{join, split};
///
/// let fields = ["C:\\app\\Diver.dll", "hello", "net6.0-windows"];
/// let blob = join(&fields, "*");
/// assert_eq!(blob, "C:\\app\\Diver.dll*hello*net6.0-windows");
/// assert_eq!(split(&blob, "*"), fields);
/// ```
#[must_use]
pub fn join<S: AsRef<str>>(fields: &[S], delimiter: &str) -> String {
    let mut out = String::new();
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push_str(delimiter);
        }
        out.push_str(field.as_ref());
    }
    out
}

/// Joins `fields` with [`DELIMITER`], refusing fields that would corrupt the field boundaries.
///
/// # Arguments
///
/// * `fields` - Named fields, the name is only used for the error message
///
/// # Errors
///
/// Returns [`crate::Error::MalformedArgument`] if a field contains the delimiter, or if the
/// last field is empty (it would be dropped on decode).
pub fn join_checked(fields: &[(&str, &str)]) -> Result<String> {
    for (name, value) in fields {
        if value.contains(DELIMITER) {
            return Err(malformed_error!(
                "Field '{}' contains the reserved delimiter '{}': {}",
                name,
                DELIMITER,
                value
            ));
        }
    }

    if let Some((name, value)) = fields.last() {
        if value.is_empty() {
            return Err(malformed_error!(
                "Trailing field '{}' must not be empty",
                name
            ));
        }
    }

    let values: Vec<&str> = fields.iter().map(|(_, value)| *value).collect();
    Ok(join(&values, DELIMITER))
}
