//! The workflow request: one long-lived generation session and its stage.

use serde::{Deserialize, Serialize};

use docloom_outline::{ContentMap, DocumentType, Outline};
use docloom_utils::error::{ApiError, RemoteStep};

/// Where a failed workflow resumes once the user retries or edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryPoint {
    /// The topic submission failed; resubmit the topic.
    Draft,
    /// The confirm sequence failed; correct the outline and confirm again.
    OutlineReady,
}

/// Coarse-grained progress marker for a workflow request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "stage")]
pub enum Stage {
    /// No request id yet; waiting for topic submission.
    Draft,
    /// Outline drafted; the user is editing it locally.
    OutlineReady,
    /// The confirm sequence is running against the service.
    Generating,
    /// Final document rendered; a download URL is available.
    Complete,
    /// A remote call failed; `retry_from` says where recovery resumes.
    Failed { retry_from: RetryPoint },
}

impl Stage {
    /// Stable stage name for logs and error messages.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::OutlineReady => "outline-ready",
            Self::Generating => "generating",
            Self::Complete => "complete",
            Self::Failed { .. } => "failed",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Snapshot of the error that moved the workflow to `Failed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Which remote step failed; `None` would mean a non-remote cause, but
    /// only remote failures are recorded here today.
    pub step: Option<RemoteStep>,
    /// Human-readable message; for server failures this is the service's
    /// `detail` field verbatim.
    pub message: String,
    /// HTTP status, when the failure came from a response.
    pub status: Option<u16>,
}

impl ErrorInfo {
    /// Record a remote failure.
    #[must_use]
    pub fn from_api(step: RemoteStep, error: &ApiError) -> Self {
        let (message, status) = match error {
            ApiError::Server { status, detail } => (detail.clone(), Some(*status)),
            ApiError::Validation { detail } => (detail.clone(), None),
            other => (other.to_string(), None),
        };
        Self {
            step: Some(step),
            message,
            status,
        }
    }
}

/// One document generation session: the authoritative copy of the topic,
/// title, outline, generated content, and progress stage.
///
/// Mutated exclusively through the state machine's transition operations.
///
/// Invariants:
/// - `request_id` is `None` only in `Draft` and never changes once assigned.
/// - `content` never describes a title/outline that has been edited since it
///   was generated (edits clear it).
/// - `document_url` is `Some` only in `Complete`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowRequest {
    pub request_id: Option<String>,
    pub topic: String,
    pub page_limit: u32,
    pub document_type: DocumentType,
    pub title: String,
    pub outline: Outline,
    pub content: Option<ContentMap>,
    pub document_url: Option<String>,
    pub stage: Stage,
    pub last_error: Option<ErrorInfo>,
}

impl WorkflowRequest {
    /// Fresh draft with no topic submitted yet.
    #[must_use]
    pub fn draft(page_limit: u32, document_type: DocumentType) -> Self {
        Self {
            request_id: None,
            topic: String::new(),
            page_limit,
            document_type,
            title: String::new(),
            outline: Outline::new(),
            content: None,
            document_url: None,
            stage: Stage::Draft,
            last_error: None,
        }
    }

    /// Drop artifacts derived from the current title/outline. Called on every
    /// successful local edit so stale content is never observable.
    pub(crate) fn invalidate_generated(&mut self) {
        self.content = None;
        self.document_url = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_starts_without_request_id() {
        let request = WorkflowRequest::draft(10, DocumentType::Ppt);
        assert_eq!(request.stage, Stage::Draft);
        assert!(request.request_id.is_none());
        assert!(request.content.is_none());
        assert!(request.document_url.is_none());
    }

    #[test]
    fn stage_serializes_with_retry_point() {
        let stage = Stage::Failed {
            retry_from: RetryPoint::OutlineReady,
        };
        let json = serde_json::to_value(stage).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"stage": "failed", "retry_from": "outline_ready"})
        );
    }

    #[test]
    fn error_info_captures_server_detail_and_status() {
        let info = ErrorInfo::from_api(
            RemoteStep::RegenerateContent,
            &ApiError::Server {
                status: 500,
                detail: "重新生成内容失败".to_string(),
            },
        );
        assert_eq!(info.message, "重新生成内容失败");
        assert_eq!(info.status, Some(500));
        assert_eq!(info.step, Some(RemoteStep::RegenerateContent));
    }

    #[test]
    fn error_info_for_network_failure_has_no_status() {
        let info = ErrorInfo::from_api(
            RemoteStep::CreateOutline,
            &ApiError::Network("connection refused".to_string()),
        );
        assert!(info.status.is_none());
        assert!(info.message.contains("connection refused"));
    }

    #[test]
    fn workflow_request_round_trips_through_json() {
        let mut request = WorkflowRequest::draft(15, DocumentType::Word);
        request.topic = "量化投资策略".to_string();
        request.stage = Stage::OutlineReady;
        request.request_id = Some("abc-123".to_string());

        let json = serde_json::to_string(&request).unwrap();
        let back: WorkflowRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, request);
    }
}
