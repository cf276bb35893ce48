//! Value extraction for the `key = "value"` dialects.
//!
//! Machine descriptors and snapshot metadata write `key = "value"`; disk image
//! descriptors write `key="value"`. Both are handled by [`extract_value`], the
//! caller choosing the marker.
//!
//! The value ends at the *last* terminator on the line, not the first one
//! after the marker. Lines holding a single quoted value parse correctly;
//! a line with two quoted values would yield everything between the first
//! opening quote and the final closing one.

/// Marker used by `.vmx` and `.vmsd` files.
pub const SPACED_MARKER: &str = " = \"";

pub const QUOTE: char = '"';

/// Returns the text between the first `marker` and the last `terminator`.
///
/// `None` when the marker is missing or no terminator follows it.
pub fn extract_value<'a>(line: &'a str, marker: &str, terminator: char) -> Option<&'a str> {
    let start = line.find(marker)? + marker.len();
    let end = line.rfind(terminator)?;
    if end < start {
        return None;
    }
    Some(&line[start..end])
}

/// A key and its quoted value, borrowed from the source line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyValue<'a> {
    pub key: &'a str,
    pub value: &'a str,
}

impl<'a> KeyValue<'a> {
    /// Parse a `key = "value"` line.
    pub fn parse(line: &'a str) -> Option<Self> {
        let key_end = line.find(SPACED_MARKER)?;
        let value = extract_value(line, SPACED_MARKER, QUOTE)?;
        Some(Self {
            key: &line[..key_end],
            value,
        })
    }
}
