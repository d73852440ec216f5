//! Shared, serialized access to a [`WorkflowEngine`].
//!
//! Edits queue up behind whatever holds the lock; confirm and retry refuse to
//! queue and instead reject immediately when a confirm sequence is already in
//! flight, so one request never runs two generation passes at once.

use std::sync::Arc;

use tokio::sync::Mutex;

use docloom_client::WorkflowApi;
use docloom_outline::{DocumentType, Outline};
use docloom_utils::error::WorkflowError;

use crate::engine::WorkflowEngine;
use crate::request::{Stage, WorkflowRequest};

/// Cloneable handle serializing transitions on one workflow request.
#[derive(Clone)]
pub struct WorkflowHandle {
    inner: Arc<Mutex<WorkflowEngine>>,
}

impl WorkflowHandle {
    /// Handle over a fresh draft.
    #[must_use]
    pub fn new(api: Arc<dyn WorkflowApi>, page_limit: u32, document_type: DocumentType) -> Self {
        Self {
            inner: Arc::new(Mutex::new(WorkflowEngine::new(api, page_limit, document_type))),
        }
    }

    /// Handle over a restored request.
    #[must_use]
    pub fn from_request(api: Arc<dyn WorkflowApi>, request: WorkflowRequest) -> Self {
        Self {
            inner: Arc::new(Mutex::new(WorkflowEngine::from_request(api, request))),
        }
    }

    /// Current state of the request, cloned out.
    pub async fn snapshot(&self) -> WorkflowRequest {
        self.inner.lock().await.request().clone()
    }

    /// Current stage.
    pub async fn stage(&self) -> Stage {
        self.inner.lock().await.stage()
    }

    /// See [`WorkflowEngine::submit_topic`].
    ///
    /// # Errors
    ///
    /// As [`WorkflowEngine::submit_topic`].
    pub async fn submit_topic(
        &self,
        topic: &str,
        page_limit: u32,
        document_type: DocumentType,
    ) -> Result<(), WorkflowError> {
        self.inner
            .lock()
            .await
            .submit_topic(topic, page_limit, document_type)
            .await
    }

    /// See [`WorkflowEngine::set_title`].
    ///
    /// # Errors
    ///
    /// As [`WorkflowEngine::set_title`].
    pub async fn set_title(&self, title: impl Into<String>) -> Result<(), WorkflowError> {
        self.inner.lock().await.set_title(title)
    }

    /// See [`WorkflowEngine::replace_outline`].
    ///
    /// # Errors
    ///
    /// As [`WorkflowEngine::replace_outline`].
    pub async fn replace_outline(&self, outline: Outline) -> Result<(), WorkflowError> {
        self.inner.lock().await.replace_outline(outline)
    }

    /// See [`WorkflowEngine::add_section`].
    ///
    /// # Errors
    ///
    /// As [`WorkflowEngine::add_section`].
    pub async fn add_section(&self) -> Result<(), WorkflowError> {
        self.inner.lock().await.add_section()
    }

    /// See [`WorkflowEngine::remove_section`].
    ///
    /// # Errors
    ///
    /// As [`WorkflowEngine::remove_section`].
    pub async fn remove_section(&self, index: usize) -> Result<(), WorkflowError> {
        self.inner.lock().await.remove_section(index)
    }

    /// See [`WorkflowEngine::set_section_title`].
    ///
    /// # Errors
    ///
    /// As [`WorkflowEngine::set_section_title`].
    pub async fn set_section_title(
        &self,
        index: usize,
        title: impl Into<String>,
    ) -> Result<(), WorkflowError> {
        self.inner.lock().await.set_section_title(index, title)
    }

    /// See [`WorkflowEngine::add_point`].
    ///
    /// # Errors
    ///
    /// As [`WorkflowEngine::add_point`].
    pub async fn add_point(&self, section: usize) -> Result<(), WorkflowError> {
        self.inner.lock().await.add_point(section)
    }

    /// See [`WorkflowEngine::remove_point`].
    ///
    /// # Errors
    ///
    /// As [`WorkflowEngine::remove_point`].
    pub async fn remove_point(&self, section: usize, point: usize) -> Result<(), WorkflowError> {
        self.inner.lock().await.remove_point(section, point)
    }

    /// See [`WorkflowEngine::set_point`].
    ///
    /// # Errors
    ///
    /// As [`WorkflowEngine::set_point`].
    pub async fn set_point(
        &self,
        section: usize,
        point: usize,
        text: impl Into<String>,
    ) -> Result<(), WorkflowError> {
        self.inner.lock().await.set_point(section, point, text)
    }

    /// Run the confirm sequence. Rejects with `ConfirmInFlight` instead of
    /// waiting when another confirm or retry holds the engine.
    ///
    /// # Errors
    ///
    /// `WorkflowError::ConfirmInFlight` when a sequence is already running,
    /// otherwise as [`WorkflowEngine::confirm`].
    pub async fn confirm(&self) -> Result<String, WorkflowError> {
        let mut engine = self
            .inner
            .try_lock()
            .map_err(|_| WorkflowError::ConfirmInFlight)?;
        engine.confirm().await
    }

    /// Retry a failed confirm sequence; same in-flight rejection as
    /// [`Self::confirm`].
    ///
    /// # Errors
    ///
    /// `WorkflowError::ConfirmInFlight` when a sequence is already running,
    /// otherwise as [`WorkflowEngine::retry`].
    pub async fn retry(&self) -> Result<String, WorkflowError> {
        let mut engine = self
            .inner
            .try_lock()
            .map_err(|_| WorkflowError::ConfirmInFlight)?;
        engine.retry().await
    }

    /// Discard the request and start a fresh draft.
    pub async fn restart(&self) {
        self.inner.lock().await.restart();
    }
}
