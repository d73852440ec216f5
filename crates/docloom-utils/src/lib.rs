//! Foundation utilities shared across the docloom workspace.
//!
//! This crate sits at the bottom of the dependency graph and owns the
//! cross-cutting pieces every other crate needs: the error taxonomy,
//! tracing initialization, and atomic file writes for session persistence.

pub mod atomic_write;
pub mod error;
pub mod exit_codes;
pub mod logging;
