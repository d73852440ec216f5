//! Workflow state machine for docloom.
//!
//! A document generation session moves through four stages: `Draft` (topic not
//! yet submitted), `OutlineReady` (drafted outline under local edit),
//! `Generating` (confirm sequence running), and `Complete` (artifact rendered),
//! with a recoverable `Failed` stage recording where to resume. The
//! [`WorkflowEngine`] owns the request and enforces the transitions; the
//! [`WorkflowHandle`] serializes access when the engine is shared.

mod engine;
mod handle;
mod request;

pub use engine::WorkflowEngine;
pub use handle::WorkflowHandle;
pub use request::{ErrorInfo, RetryPoint, Stage, WorkflowRequest};
