//! Small string and filesystem helpers shared across the crate.

use std::error::Error;
use std::fs as stdfs;
use tracing::{info, instrument};

/// Byte offset of the end of the first `max_chars` characters of `s`.
///
/// Returns `s.len()` when `s` is shorter than `max_chars`. The result is
/// always a char boundary, so `&s[..char_boundary(s, n)]` never panics.
pub fn char_boundary(s: &str, max_chars: usize) -> usize {
    s.char_indices()
        .nth(max_chars)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to `max` characters with an ellipsis and
/// byte count indicator appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    let end = char_boundary(s, max);
    if end == s.len() {
        s.to_string()
    } else {
        format!("{}…(+{} bytes)", &s[..end], s.len() - end)
    }
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then writes and removes a probe file.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or is not writable.
#[instrument(level = "info", skip_all, fields(path = %path))]
pub fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    stdfs::create_dir_all(path)?;
    let probe_path = format!("{}/..__probe_write__", path.trim_end_matches('/'));
    stdfs::File::create(&probe_path)?;
    let _ = stdfs::remove_file(&probe_path);
    info!("Log directory is writable");
    Ok(())
}
