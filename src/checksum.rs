//! Per-line integrity checking.
//!
//! Every CGGTTS record ends in a two-uppercase-hex-digit field holding the
//! mod-256 sum of every preceding byte of the line, the blank separating the
//! field included. A mismatch is always fatal; metrology consumers must not
//! trust corrupted measurements.

use crate::lines::Line;
use crate::{Error, Result};

/// Mod-256 sum of the bytes of `dat`.
#[must_use]
pub fn checksum(dat: &str) -> u8 {
    dat.bytes().fold(0u8, u8::wrapping_add)
}

/// Verify the trailing checksum field of `line`, returning the line content
/// preceding the field (trailing separator included).
pub(crate) fn verify(line: &Line) -> Result<&str> {
    let text = line.text.as_str();
    if text.len() < 3 || !text.is_ascii() {
        return Err(Error::Format {
            line: line.number,
            field: "checksum",
            value: text.to_string(),
        });
    }
    let (content, field) = text.split_at(text.len() - 2);
    let expected = u8::from_str_radix(field, 16).map_err(|_| Error::Format {
        line: line.number,
        field: "checksum",
        value: field.to_string(),
    })?;
    let computed = checksum(content);
    if computed != expected {
        return Err(Error::Checksum {
            line: line.number,
            computed,
            expected,
        });
    }
    Ok(content)
}
