//! Error taxonomy for docloom workflow operations.
//!
//! Errors are split by origin:
//!
//! | Type | Origin |
//! |------|--------|
//! | `ValidationError` | Local input checks, caught before any network call |
//! | `OutlineError` | Positional edits against the outline model |
//! | `ApiError` | Normalized remote-call failures (transport or service) |
//! | `WorkflowError` | State-machine level failures, wrapping the above |
//! | `ConfigError` | Configuration file discovery and parsing |
//!
//! `WorkflowError` is the type callers of the state machine see. Use
//! [`WorkflowError::to_exit_code`] to map errors to CLI exit codes.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::exit_codes::ExitCode;

/// Local validation failure. Never reaches the network; the workflow stage
/// does not change when one of these is reported.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("topic must not be empty")]
    EmptyTopic,

    #[error("page limit must be at least 1 (got {given})")]
    InvalidPageLimit { given: u32 },

    #[error("outline must contain at least one section")]
    EmptyOutline,

    #[error("section {index} has an empty title")]
    UntitledSection { index: usize },

    #[error("section {index} (\"{title}\") has no points after normalization")]
    EmptySection { index: usize, title: String },
}

/// Positional edit against the outline model referenced a slot that does not
/// exist. Indices are positional, not stored ids; removal shifts later
/// entries down by one.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutlineError {
    #[error("index {index} is out of range (length {len})")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Normalized failure from one remote call.
///
/// The workflow client maps every transport or HTTP outcome to one of these
/// variants; the `detail` strings for `Validation` and `Server` are the
/// service's own `detail` field, surfaced verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Transport-level failure: no HTTP response was received.
    #[error("network error: {0}")]
    Network(String),

    /// The service rejected the request as invalid (400/422).
    #[error("request rejected: {detail}")]
    Validation { detail: String },

    /// Any other non-2xx response, including unknown request ids (404).
    #[error("server error {status}: {detail}")]
    Server { status: u16, detail: String },

    /// The call did not complete within the configured timeout.
    #[error("request timed out after {}s", duration.as_secs())]
    Timeout { duration: Duration },
}

/// Identifies which remote call a failure came from.
///
/// The confirm sequence is strictly ordered; when a step fails, every later
/// step is never attempted, so the step recorded here also tells you which
/// steps were aborted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteStep {
    CreateOutline,
    UpdateOutline,
    RegenerateContent,
    GenerateDocument,
}

impl RemoteStep {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateOutline => "create-outline",
            Self::UpdateOutline => "update-outline",
            Self::RegenerateContent => "regenerate-content",
            Self::GenerateDocument => "generate-document",
        }
    }
}

impl std::fmt::Display for RemoteStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State-machine level error returned by workflow transitions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Outline(#[from] OutlineError),

    /// A remote call failed. Later steps of the sequence were not attempted.
    #[error("{step} failed: {source}")]
    Remote {
        step: RemoteStep,
        #[source]
        source: ApiError,
    },

    /// The requested transition is not legal from the current stage.
    #[error("cannot {action} while the workflow is in stage {stage}")]
    InvalidStage {
        stage: &'static str,
        action: &'static str,
    },

    /// A confirm sequence is already running against this request.
    #[error("a confirm sequence is already in flight for this request")]
    ConfirmInFlight,

    /// The workflow has not been assigned a request id by the service yet.
    #[error("workflow has no request id yet; submit a topic first")]
    MissingRequestId,
}

impl WorkflowError {
    /// Map this error to a CLI exit code.
    ///
    /// | Exit code | Errors |
    /// |-----------|--------|
    /// | 2 | Validation, outline edits, illegal transitions, missing id |
    /// | 9 | Confirm already in flight |
    /// | 70 | Remote call failure |
    #[must_use]
    pub fn to_exit_code(&self) -> ExitCode {
        match self {
            Self::Validation(_) | Self::Outline(_) | Self::InvalidStage { .. } | Self::MissingRequestId => {
                ExitCode::USAGE
            }
            Self::ConfirmInFlight => ExitCode::BUSY,
            Self::Remote { .. } => ExitCode::REMOTE_FAILURE,
        }
    }
}

/// Configuration loading and validation errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    NotFound { path: String },

    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
