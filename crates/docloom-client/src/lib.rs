//! Typed client for the docloom generation service.
//!
//! One operation per remote call, each taking the minimal required fields and
//! returning a typed result or a normalized [`ApiError`]. The client owns no
//! workflow state; side effects are confined to network I/O.
//!
//! The [`WorkflowApi`] trait is the seam the state machine depends on, so
//! engine tests can substitute stub backends without a network.

mod http;
pub mod wire;

use async_trait::async_trait;
use tracing::debug;

use docloom_config::Config;
use docloom_outline::ContentMap;
pub use docloom_utils::error::ApiError;
use docloom_utils::error::ConfigError;

use crate::http::HttpClient;
pub use crate::wire::{
    CreateOutlineRequest, CreateOutlineResponse, GenerateDocumentResponse, UpdateOutlineRequest,
    UpdateOutlineResponse,
};
use crate::wire::RegenerateContentResponse;

/// Remote operations of the generation service, one method per call.
///
/// `update_outline` is idempotent: sending the same outline twice yields the
/// same stored outline. The regenerate/generate calls operate on whatever the
/// service last stored for the request id; the state machine is responsible
/// for only invoking them after a successful update.
#[async_trait]
pub trait WorkflowApi: Send + Sync {
    /// Create a new generation request from a topic; the service assigns the
    /// request id and drafts a title and outline.
    async fn create_outline(
        &self,
        request: &CreateOutlineRequest,
    ) -> Result<CreateOutlineResponse, ApiError>;

    /// Persist an edited outline and title for an existing request.
    async fn update_outline(
        &self,
        request_id: &str,
        request: &UpdateOutlineRequest,
    ) -> Result<UpdateOutlineResponse, ApiError>;

    /// Regenerate body content from the outline last stored for the request.
    async fn regenerate_content(&self, request_id: &str) -> Result<ContentMap, ApiError>;

    /// Render the final document and return its relative file path.
    async fn generate_document(
        &self,
        request_id: &str,
    ) -> Result<GenerateDocumentResponse, ApiError>;
}

/// Relative download URL for a generated artifact.
///
/// The service routes `GET /download/{file_path}` with the whole path as one
/// percent-encoded segment, so slashes inside `file_path` are encoded too.
#[must_use]
pub fn download_url(file_path: &str) -> String {
    format!("/download/{}", urlencoding::encode(file_path))
}

/// HTTP implementation of [`WorkflowApi`] against a configured service.
#[derive(Debug, Clone)]
pub struct HttpWorkflowClient {
    http: HttpClient,
    base_url: String,
}

impl HttpWorkflowClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the configuration is invalid or the HTTP
    /// client cannot be constructed.
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        config.validate()?;

        let http = HttpClient::new(
            config.service.connect_timeout(),
            config.service.timeout(),
            config.service.max_retries,
        )?;

        Ok(Self {
            http,
            base_url: config.base_url().to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn request_url(&self, prefix: &str, request_id: &str) -> String {
        format!(
            "{}{prefix}/{}",
            self.base_url,
            urlencoding::encode(request_id)
        )
    }
}

#[async_trait]
impl WorkflowApi for HttpWorkflowClient {
    async fn create_outline(
        &self,
        request: &CreateOutlineRequest,
    ) -> Result<CreateOutlineResponse, ApiError> {
        debug!(
            topic = %request.topic,
            page_limit = request.page_limit,
            document_type = %request.document_type,
            "creating outline"
        );

        let builder = reqwest::Client::new()
            .post(self.url("/api/generate-outline"))
            .json(request);

        let response = self.http.execute_with_retry(builder, "create-outline").await?;
        let parsed: CreateOutlineResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Network(format!("failed to parse create-outline response: {e}")))?;

        debug!(request_id = %parsed.request_id, sections = parsed.outline.len(), "outline created");
        Ok(parsed)
    }

    async fn update_outline(
        &self,
        request_id: &str,
        request: &UpdateOutlineRequest,
    ) -> Result<UpdateOutlineResponse, ApiError> {
        debug!(request_id, sections = request.outline.len(), "updating outline");

        let builder = reqwest::Client::new()
            .put(self.request_url("/api/edit-workflow-outline", request_id))
            .json(request);

        let response = self.http.execute_with_retry(builder, "update-outline").await?;
        response
            .json()
            .await
            .map_err(|e| ApiError::Network(format!("failed to parse update-outline response: {e}")))
    }

    async fn regenerate_content(&self, request_id: &str) -> Result<ContentMap, ApiError> {
        debug!(request_id, "regenerating content");

        let builder = reqwest::Client::new()
            .post(self.request_url("/api/regenerate-content", request_id));

        let response = self
            .http
            .execute_with_retry(builder, "regenerate-content")
            .await?;
        let parsed: RegenerateContentResponse = response.json().await.map_err(|e| {
            ApiError::Network(format!("failed to parse regenerate-content response: {e}"))
        })?;

        debug!(request_id, sections = parsed.content.len(), "content regenerated");
        Ok(parsed.content)
    }

    async fn generate_document(
        &self,
        request_id: &str,
    ) -> Result<GenerateDocumentResponse, ApiError> {
        debug!(request_id, "generating document");

        let builder = reqwest::Client::new()
            .post(self.request_url("/api/generate-document", request_id));

        let response = self
            .http
            .execute_with_retry(builder, "generate-document")
            .await?;
        let parsed: GenerateDocumentResponse = response.json().await.map_err(|e| {
            ApiError::Network(format!("failed to parse generate-document response: {e}"))
        })?;

        debug!(request_id, file_path = %parsed.file_path, "document generated");
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_builds_from_default_config() {
        let client = HttpWorkflowClient::new(&Config::default());
        assert!(client.is_ok());
    }

    #[test]
    fn client_rejects_invalid_config() {
        let mut config = Config::default();
        config.service.base_url = String::new();
        assert!(HttpWorkflowClient::new(&config).is_err());
    }

    #[test]
    fn url_joins_base_and_path() {
        let client = HttpWorkflowClient::new(&Config::minimal_for_testing()).unwrap();
        assert_eq!(
            client.url("/api/generate-outline"),
            "http://127.0.0.1:1/api/generate-outline"
        );
    }

    #[test]
    fn request_url_encodes_request_id() {
        let client = HttpWorkflowClient::new(&Config::minimal_for_testing()).unwrap();
        assert_eq!(
            client.request_url("/api/regenerate-content", "abc/../def"),
            "http://127.0.0.1:1/api/regenerate-content/abc%2F..%2Fdef"
        );
    }

    #[test]
    fn download_url_percent_encodes_whole_path() {
        assert_eq!(
            download_url("documents/量化投资_90ae.pptx"),
            "/download/documents%2F%E9%87%8F%E5%8C%96%E6%8A%95%E8%B5%84_90ae.pptx"
        );
    }

    #[test]
    fn download_url_passes_plain_names_through() {
        assert_eq!(download_url("deck.pptx"), "/download/deck.pptx");
    }
}
