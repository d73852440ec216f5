//! Request and response shapes for the generation service's JSON API.
//!
//! These mirror the service contract exactly; nothing here carries workflow
//! state. The service may attach extra fields (`success`, `message`) to some
//! responses; deserialization tolerates and, where useful, captures them.

use serde::{Deserialize, Serialize};

use docloom_outline::{ContentMap, DocumentType, Outline};

/// Body for `POST /api/generate-outline`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOutlineRequest {
    pub topic: String,
    pub page_limit: u32,
    pub document_type: DocumentType,
}

/// Response from `POST /api/generate-outline`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOutlineResponse {
    pub request_id: String,
    pub title: String,
    pub outline: Outline,
}

/// Body for `PUT /api/edit-workflow-outline/{request_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateOutlineRequest {
    pub outline: Outline,
    pub title: String,
}

/// Response from `PUT /api/edit-workflow-outline/{request_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateOutlineResponse {
    pub title: String,
    pub outline: Outline,
}

/// Response from `POST /api/regenerate-content/{request_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegenerateContentResponse {
    pub content: ContentMap,
}

/// Response from `POST /api/generate-document/{request_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateDocumentResponse {
    pub file_path: String,
    /// Human-readable status line some service versions attach.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Error body the service sends with non-2xx responses.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct ErrorBody {
    pub detail: String,
}
