//! The workflow state machine.
//!
//! `Draft → OutlineReady → Generating → Complete`, with a recoverable
//! `Failed` stage. The engine owns the authoritative [`WorkflowRequest`] and
//! is the only writer to it; the client layer below owns no state and the
//! presentation layer above only reads snapshots.
//!
//! The confirm sequence is the consistency-critical part: update the outline,
//! regenerate content, render the document, strictly in that order and
//! short-circuiting on the first failure, so content and the final artifact
//! are always derived from the outline last successfully persisted.

use std::sync::Arc;

use tracing::{info, warn};

use docloom_client::{
    download_url, CreateOutlineRequest, UpdateOutlineRequest, WorkflowApi,
};
use docloom_outline::{DocumentType, Outline};
use docloom_utils::error::{ApiError, RemoteStep, ValidationError, WorkflowError};

use crate::request::{ErrorInfo, RetryPoint, Stage, WorkflowRequest};

/// State machine driving one document generation session.
///
/// Not designed for concurrent transitions on the same request; wrap it in a
/// [`WorkflowHandle`](crate::WorkflowHandle) when it must be shared.
pub struct WorkflowEngine {
    api: Arc<dyn WorkflowApi>,
    request: WorkflowRequest,
}

impl WorkflowEngine {
    /// New engine with a fresh draft request.
    #[must_use]
    pub fn new(api: Arc<dyn WorkflowApi>, page_limit: u32, document_type: DocumentType) -> Self {
        Self {
            api,
            request: WorkflowRequest::draft(page_limit, document_type),
        }
    }

    /// Resume an engine from a previously captured request (e.g. a CLI
    /// session file).
    #[must_use]
    pub fn from_request(api: Arc<dyn WorkflowApi>, request: WorkflowRequest) -> Self {
        Self { api, request }
    }

    /// The current request state.
    #[must_use]
    pub fn request(&self) -> &WorkflowRequest {
        &self.request
    }

    /// The current stage.
    #[must_use]
    pub fn stage(&self) -> Stage {
        self.request.stage
    }

    /// Submit the topic and draft an outline.
    ///
    /// Legal from `Draft` (and from `Failed` after a draft-time failure).
    /// Local validation failures are reported without changing the stage;
    /// remote failures move to `Failed { retry_from: Draft }`.
    ///
    /// # Errors
    ///
    /// `WorkflowError::Validation` for an empty topic or zero page limit,
    /// `WorkflowError::InvalidStage` outside `Draft`, or
    /// `WorkflowError::Remote` when the service call fails.
    pub async fn submit_topic(
        &mut self,
        topic: &str,
        page_limit: u32,
        document_type: DocumentType,
    ) -> Result<(), WorkflowError> {
        match self.request.stage {
            Stage::Draft
            | Stage::Failed {
                retry_from: RetryPoint::Draft,
            } => {}
            other => {
                return Err(WorkflowError::InvalidStage {
                    stage: other.name(),
                    action: "submit a topic",
                })
            }
        }

        let topic = topic.trim();
        if topic.is_empty() {
            return Err(ValidationError::EmptyTopic.into());
        }
        if page_limit == 0 {
            return Err(ValidationError::InvalidPageLimit { given: page_limit }.into());
        }

        let wire_request = CreateOutlineRequest {
            topic: topic.to_string(),
            page_limit,
            document_type,
        };

        self.request.topic = topic.to_string();
        self.request.page_limit = page_limit;
        self.request.document_type = document_type;

        match self.api.create_outline(&wire_request).await {
            Ok(response) => {
                info!(
                    request_id = %response.request_id,
                    sections = response.outline.len(),
                    "outline drafted"
                );
                self.request.request_id = Some(response.request_id);
                self.request.title = response.title;
                self.request.outline = response.outline;
                self.request.invalidate_generated();
                self.request.last_error = None;
                self.request.stage = Stage::OutlineReady;
                Ok(())
            }
            Err(error) => {
                warn!(error = %error, "outline drafting failed");
                self.request.last_error =
                    Some(ErrorInfo::from_api(RemoteStep::CreateOutline, &error));
                self.request.stage = Stage::Failed {
                    retry_from: RetryPoint::Draft,
                };
                Err(WorkflowError::Remote {
                    step: RemoteStep::CreateOutline,
                    source: error,
                })
            }
        }
    }

    /// Gate for local edits: legal in `OutlineReady`, in `Complete` (so a
    /// finished document can be revised and regenerated), and in
    /// `Failed { retry_from: OutlineReady }`. Checks only; the stage moves in
    /// [`Self::commit_edit`] once the mutation has actually succeeded, so a
    /// rejected edit leaves the request exactly as it was.
    fn check_edit(&self, action: &'static str) -> Result<(), WorkflowError> {
        match self.request.stage {
            Stage::OutlineReady
            | Stage::Complete
            | Stage::Failed {
                retry_from: RetryPoint::OutlineReady,
            } => Ok(()),
            other => Err(WorkflowError::InvalidStage {
                stage: other.name(),
                action,
            }),
        }
    }

    /// Commit a successful local edit: back to `OutlineReady`, recorded error
    /// gone, generated artifacts invalidated.
    fn commit_edit(&mut self) {
        self.request.stage = Stage::OutlineReady;
        self.request.last_error = None;
        self.request.invalidate_generated();
    }

    /// Replace the document title. Local only; clears generated content.
    pub fn set_title(&mut self, title: impl Into<String>) -> Result<(), WorkflowError> {
        self.check_edit("edit the title")?;
        self.request.title = title.into();
        self.commit_edit();
        Ok(())
    }

    /// Replace the whole outline. Local only; clears generated content.
    pub fn replace_outline(&mut self, outline: Outline) -> Result<(), WorkflowError> {
        self.check_edit("edit the outline")?;
        self.request.outline = outline;
        self.commit_edit();
        Ok(())
    }

    /// Append a placeholder section.
    pub fn add_section(&mut self) -> Result<(), WorkflowError> {
        self.check_edit("edit the outline")?;
        self.request.outline.add_section();
        self.commit_edit();
        Ok(())
    }

    /// Remove the section at `index`.
    pub fn remove_section(&mut self, index: usize) -> Result<(), WorkflowError> {
        self.check_edit("edit the outline")?;
        self.request.outline.remove_section(index)?;
        self.commit_edit();
        Ok(())
    }

    /// Retitle the section at `index`.
    pub fn set_section_title(
        &mut self,
        index: usize,
        title: impl Into<String>,
    ) -> Result<(), WorkflowError> {
        self.check_edit("edit the outline")?;
        self.request.outline.section_mut(index)?.title = title.into();
        self.commit_edit();
        Ok(())
    }

    /// Append a placeholder point to the section at `section`.
    pub fn add_point(&mut self, section: usize) -> Result<(), WorkflowError> {
        self.check_edit("edit the outline")?;
        self.request.outline.section_mut(section)?.add_point();
        self.commit_edit();
        Ok(())
    }

    /// Remove point `point` from the section at `section`.
    pub fn remove_point(&mut self, section: usize, point: usize) -> Result<(), WorkflowError> {
        self.check_edit("edit the outline")?;
        self.request.outline.section_mut(section)?.remove_point(point)?;
        self.commit_edit();
        Ok(())
    }

    /// Rewrite point `point` of the section at `section`.
    pub fn set_point(
        &mut self,
        section: usize,
        point: usize,
        text: impl Into<String>,
    ) -> Result<(), WorkflowError> {
        self.check_edit("edit the point")?;
        let section = self.request.outline.section_mut(section)?;
        let len = section.content.len();
        let slot = section
            .content
            .get_mut(point)
            .ok_or(docloom_utils::error::OutlineError::IndexOutOfRange { index: point, len })?;
        *slot = text.into();
        self.commit_edit();
        Ok(())
    }

    /// Run the confirm sequence: persist the edited outline, regenerate
    /// content from it, render the document.
    ///
    /// The three remote calls are strictly sequential and short-circuit: a
    /// failed `update_outline` means `regenerate_content` and
    /// `generate_document` are never invoked. On success the request is
    /// `Complete` and the returned string is the relative download URL; on
    /// failure the request is `Failed { retry_from: OutlineReady }` with the
    /// triggering error attached and the local outline untouched.
    ///
    /// # Errors
    ///
    /// `WorkflowError::Validation` before any network call when the outline
    /// is unfit to submit (the stage does not advance), or
    /// `WorkflowError::Remote` naming the step that failed.
    pub async fn confirm(&mut self) -> Result<String, WorkflowError> {
        match self.request.stage {
            Stage::OutlineReady => {}
            Stage::Failed {
                retry_from: RetryPoint::OutlineReady,
            } => {
                self.request.stage = Stage::OutlineReady;
                self.request.last_error = None;
            }
            other => {
                return Err(WorkflowError::InvalidStage {
                    stage: other.name(),
                    action: "confirm the outline",
                })
            }
        }

        let request_id = self
            .request
            .request_id
            .clone()
            .ok_or(WorkflowError::MissingRequestId)?;

        let outline = self.request.outline.normalized();
        outline.validate_for_submission()?;
        let title = self.request.title.trim().to_string();

        info!(request_id = %request_id, sections = outline.len(), "confirm sequence started");
        self.request.stage = Stage::Generating;

        match self.run_confirm_sequence(&request_id, outline, title).await {
            Ok(outcome) => {
                info!(request_id = %request_id, url = %outcome.document_url, "document ready");
                self.request.title = outcome.title;
                self.request.outline = outcome.outline;
                self.request.content = Some(outcome.content);
                self.request.document_url = Some(outcome.document_url.clone());
                self.request.last_error = None;
                self.request.stage = Stage::Complete;
                Ok(outcome.document_url)
            }
            Err((step, error)) => {
                warn!(request_id = %request_id, step = %step, error = %error, "confirm sequence failed");
                self.request.last_error = Some(ErrorInfo::from_api(step, &error));
                self.request.stage = Stage::Failed {
                    retry_from: RetryPoint::OutlineReady,
                };
                Err(WorkflowError::Remote {
                    step,
                    source: error,
                })
            }
        }
    }

    /// Re-enter the confirm sequence after a failure, using the current local
    /// edits. Re-runs `update_outline` first, which is idempotent, so a retry
    /// after a partial failure is safe.
    ///
    /// # Errors
    ///
    /// `WorkflowError::InvalidStage` unless the request is in
    /// `Failed { retry_from: OutlineReady }`; otherwise as [`Self::confirm`].
    pub async fn retry(&mut self) -> Result<String, WorkflowError> {
        match self.request.stage {
            Stage::Failed {
                retry_from: RetryPoint::OutlineReady,
            } => self.confirm().await,
            other => Err(WorkflowError::InvalidStage {
                stage: other.name(),
                action: "retry",
            }),
        }
    }

    /// Discard the request and start over with a fresh draft, keeping the
    /// page limit and document type as defaults for the next run.
    pub fn restart(&mut self) {
        info!("workflow restarted");
        self.request =
            WorkflowRequest::draft(self.request.page_limit, self.request.document_type);
    }

    /// The three remote calls, in order, with the failing step attached to
    /// any error. Results are applied to the request only by the caller on
    /// full success, so a mid-sequence failure leaves local state untouched.
    async fn run_confirm_sequence(
        &self,
        request_id: &str,
        outline: Outline,
        title: String,
    ) -> Result<ConfirmOutcome, (RemoteStep, ApiError)> {
        let update = UpdateOutlineRequest { outline, title };
        let updated = self
            .api
            .update_outline(request_id, &update)
            .await
            .map_err(|e| (RemoteStep::UpdateOutline, e))?;

        let content = self
            .api
            .regenerate_content(request_id)
            .await
            .map_err(|e| (RemoteStep::RegenerateContent, e))?;

        let document = self
            .api
            .generate_document(request_id)
            .await
            .map_err(|e| (RemoteStep::GenerateDocument, e))?;

        Ok(ConfirmOutcome {
            title: updated.title,
            outline: updated.outline,
            content,
            document_url: download_url(&document.file_path),
        })
    }
}

/// Everything a successful confirm sequence produced, applied atomically.
struct ConfirmOutcome {
    title: String,
    outline: Outline,
    content: docloom_outline::ContentMap,
    document_url: String,
}
