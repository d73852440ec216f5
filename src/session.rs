//! Session persistence for the CLI.
//!
//! The workflow request outlives a single invocation, so each command loads
//! the request from a JSON session file, applies one transition, and writes
//! the result back atomically. The file is the CLI's only state.

use std::path::Path;

use anyhow::{Context, Result};

use docloom_engine::WorkflowRequest;
use docloom_utils::atomic_write::write_file_atomic;

/// Session file used when `--session` is not given.
pub const DEFAULT_SESSION_FILE: &str = "docloom-session.json";

/// Load the persisted workflow request.
///
/// # Errors
///
/// Fails when the file is missing (no workflow started yet) or does not
/// parse as a workflow request.
pub fn load(path: &Path) -> Result<WorkflowRequest> {
    let raw = std::fs::read_to_string(path).with_context(|| {
        format!(
            "no session at {} (start one with `docloom new <topic>`)",
            path.display()
        )
    })?;
    serde_json::from_str(&raw)
        .with_context(|| format!("session file {} is not a valid workflow request", path.display()))
}

/// Persist the workflow request, replacing the file atomically.
///
/// # Errors
///
/// Fails when the file cannot be written.
pub fn save(path: &Path, request: &WorkflowRequest) -> Result<()> {
    let json = serde_json::to_string_pretty(request)
        .context("failed to serialize workflow request")?;
    write_file_atomic(path, &json)
        .with_context(|| format!("failed to write session file {}", path.display()))
}

/// Delete the session file if it exists.
///
/// # Errors
///
/// Fails when the file exists but cannot be removed.
pub fn clear(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => {
            Err(e).with_context(|| format!("failed to remove session file {}", path.display()))
        }
    }
}
