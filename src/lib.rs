//! docloom: three-stage document generation workflow.
//!
//! A topic goes in, a drafted outline comes back for local editing, and a
//! confirmed outline is turned into regenerated content and a downloadable
//! document by the remote generation service. The crates divide as follows:
//!
//! - `docloom-outline` — the outline model: sections, points, normalization,
//!   submission validation.
//! - `docloom-client` — typed HTTP client for the generation service, plus
//!   the [`WorkflowApi`] seam the state machine depends on.
//! - `docloom-engine` — the workflow state machine
//!   (`Draft → OutlineReady → Generating → Complete`, recoverable `Failed`)
//!   and the serialized [`WorkflowHandle`].
//! - `docloom-config` — TOML configuration with discovery and defaults.
//! - `docloom-utils` — error taxonomy, exit codes, logging, atomic writes.
//!
//! This crate re-exports the public surface and adds the CLI front end.

pub mod cli;
pub mod session;

pub use docloom_client::{download_url, HttpWorkflowClient, WorkflowApi};
pub use docloom_client::{
    CreateOutlineRequest, CreateOutlineResponse, GenerateDocumentResponse, UpdateOutlineRequest,
    UpdateOutlineResponse,
};
pub use docloom_config::Config;
pub use docloom_engine::{
    ErrorInfo, RetryPoint, Stage, WorkflowEngine, WorkflowHandle, WorkflowRequest,
};
pub use docloom_outline::{ContentMap, DocumentType, Outline, Section};
pub use docloom_utils::error::{
    ApiError, ConfigError, OutlineError, RemoteStep, ValidationError, WorkflowError,
};
pub use docloom_utils::exit_codes::ExitCode;
