//! Textual codec for correlation vectors
//!
//! Wire format: `base[.ext]+[!]`
//! - `base`: fixed-length base64 root (length depends on the version)
//! - `ext`: non-negative decimal integers, `.`-joined
//! - `!`: optional terminator marking the vector immutable
//!
//! Everything before the last delimiter is the *base vector*; the last
//! segment is the live extension counter.

use crate::{CvError, CvResult};

/// Segment delimiter
pub const DELIMITER: char = '.';

/// Terminator appended to immutable vectors
pub const TERMINATOR: char = '!';

/// Fields recovered from a vector string
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Decoded<'a> {
    /// Everything before the last delimiter
    pub base_vector: &'a str,
    /// Value of the last segment
    pub extension: u32,
    /// Whether the string carried the terminator
    pub immutable: bool,
}

/// A non-empty vector ending with the terminator is immutable.
#[inline]
pub fn is_immutable(correlation_vector: &str) -> bool {
    !correlation_vector.is_empty() && correlation_vector.ends_with(TERMINATOR)
}

/// Render `(base_vector, extension, immutable)` as a vector string
pub fn format(base_vector: &str, extension: u32, immutable: bool) -> String {
    let mut out = String::with_capacity(base_vector.len() + 12);
    out.push_str(base_vector);
    out.push(DELIMITER);
    out.push_str(&extension.to_string());
    if immutable {
        out.push(TERMINATOR);
    }
    out
}

/// Split a vector string into its fields.
///
/// Returns `None` when there is no delimiter or the last segment is not a
/// non-negative decimal that fits the extension counter.
pub fn decode(correlation_vector: &str) -> Option<Decoded<'_>> {
    let last = correlation_vector.rfind(DELIMITER)?;
    let base_vector = &correlation_vector[..last];
    let mut ext = &correlation_vector[last + DELIMITER.len_utf8()..];

    let immutable = is_immutable(correlation_vector);
    if immutable {
        ext = ext.strip_suffix(TERMINATOR)?;
    }

    let extension = parse_extension(ext)?;
    Some(Decoded {
        base_vector,
        extension,
        immutable,
    })
}

/// Parse a single extension segment (ASCII digits only, fits in u32)
pub fn parse_extension(segment: &str) -> Option<u32> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

/// Number of decimal digits in `value` (zero has one digit)
#[inline]
pub fn digit_count(value: u32) -> usize {
    value.checked_ilog10().map_or(1, |d| d as usize + 1)
}

/// Would `{base_vector}.{extension}` be longer than `max_length`?
///
/// An empty base vector is never oversized.
pub fn is_oversized(base_vector: &str, extension: u32, max_length: usize) -> bool {
    if base_vector.is_empty() {
        return false;
    }
    let size = base_vector.chars().count() + 1 + digit_count(extension);
    size > max_length
}

/// Structural validation used when strict creation is enabled
pub fn validate(correlation_vector: &str, base_length: usize, max_length: usize) -> CvResult<()> {
    if correlation_vector.is_empty() || correlation_vector.chars().count() > max_length {
        return Err(CvError::InvalidArgument(format!(
            "The correlation vector can not be null or bigger than {} characters",
            max_length
        )));
    }

    let mut parts = correlation_vector.split(DELIMITER);
    let root = parts.next().unwrap_or_default();
    let invalid = || {
        CvError::InvalidArgument(format!(
            "Invalid correlation vector {}. Invalid base value {}",
            correlation_vector, root
        ))
    };

    if root.chars().count() != base_length {
        return Err(invalid());
    }

    let mut extensions = 0usize;
    for part in parts {
        if parse_extension(part).is_none() {
            return Err(invalid());
        }
        extensions += 1;
    }
    if extensions == 0 {
        return Err(invalid());
    }

    Ok(())
}
