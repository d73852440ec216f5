//! Atomic file writes for session persistence.
//!
//! Writes go to a temporary file in the target directory, are fsynced, and
//! then renamed over the destination so a crash mid-write never leaves a
//! truncated session file behind.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

/// Atomically write `content` to `path` using temp file + fsync + rename.
///
/// The temporary file is created in the same directory as the target so the
/// final rename stays on one filesystem. Parent directories are created if
/// missing.
///
/// # Errors
///
/// Returns any I/O error from directory creation, the write, the fsync, or
/// the final rename.
pub fn write_file_atomic(path: &Path, content: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let temp_dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut temp_file = NamedTempFile::new_in(temp_dir)?;
    temp_file.write_all(content.as_bytes())?;
    temp_file.as_file().sync_all()?;

    temp_file
        .persist(path)
        .map_err(|e| e.error)?;

    Ok(())
}
