//! Active disk selection from a machine descriptor (`.vmx`).

use super::bounded_disk_name;
use super::error::{ChainError, ChainResult};
use super::extract::{QUOTE, SPACED_MARKER, extract_value};
use crate::models::DiskSelection;
use camino::Utf8Path;
use std::io;

/// Every disk attachment key ends with this, e.g. `scsi0:0.fileName = "x.vmdk"`.
pub const FILE_NAME_PATTERN: &str = ".fileName = \"";

/// Finds the first hard-disk attachment in a machine descriptor.
///
/// A line qualifies when it contains [`FILE_NAME_PATTERN`], starts with one
/// of the configured controller buses, and its value does not end in a
/// removable-media extension. Scanning stops at the first qualifying line.
///
/// # Errors
///
/// - [`ChainError::NoDiskFound`] if the stream ends without a qualifying line
/// - [`ChainError::MalformedInput`] if a qualifying line has no closing quote
///   or names a file longer than `max_name_len`
/// - [`ChainError::Io`] if reading a line fails
pub fn select_active_disk<I>(
    descriptor: &Utf8Path,
    lines: I,
    selection: &DiskSelection,
    max_name_len: usize,
) -> ChainResult<String>
where
    I: IntoIterator<Item = io::Result<String>>,
{
    for line in lines {
        let line = line?;
        tracing::trace!("vmx line: {}", line);

        if !line.contains(FILE_NAME_PATTERN) || !selection.is_controller_key(&line) {
            continue;
        }

        let file_name = extract_value(&line, SPACED_MARKER, QUOTE).ok_or_else(|| {
            ChainError::MalformedInput(format!("unterminated disk attachment: {}", line))
        })?;

        if selection.is_removable(file_name) {
            tracing::debug!("Skipping removable media: {}", file_name);
            continue;
        }

        let disk = bounded_disk_name(file_name, max_name_len)?;
        tracing::info!("Got disk in vmx file: {}", disk);
        return Ok(disk);
    }

    Err(ChainError::NoDiskFound(descriptor.to_path_buf()))
}
