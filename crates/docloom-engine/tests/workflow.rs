//! End-to-end state machine tests against a scripted in-process backend.
//!
//! The stub records how often each remote operation runs and can be told to
//! fail a specific step, which is enough to pin down the confirm sequence's
//! ordering, short-circuiting, and recovery behavior without a network.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use docloom_client::{
    CreateOutlineRequest, CreateOutlineResponse, GenerateDocumentResponse, UpdateOutlineRequest,
    UpdateOutlineResponse, WorkflowApi,
};
use docloom_engine::{RetryPoint, Stage, WorkflowEngine, WorkflowHandle};
use docloom_outline::{ContentMap, DocumentType, Outline, Section};
use docloom_utils::error::{ApiError, RemoteStep, ValidationError, WorkflowError};

/// Which remote step the stub should fail on its next invocation.
#[derive(Clone, Copy, PartialEq, Eq)]
enum FailAt {
    CreateOutline,
    UpdateOutline,
    RegenerateContent,
    GenerateDocument,
}

/// Scripted backend: succeeds with canned data unless told to fail one step.
struct StubApi {
    create_calls: AtomicUsize,
    update_calls: AtomicUsize,
    regenerate_calls: AtomicUsize,
    generate_calls: AtomicUsize,
    fail_at: Mutex<Option<FailAt>>,
    /// When set, `update_outline` signals the first notify and then parks
    /// until the second fires. Used to hold a confirm sequence open.
    gate: Option<(Arc<Notify>, Arc<Notify>)>,
}

impl StubApi {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            create_calls: AtomicUsize::new(0),
            update_calls: AtomicUsize::new(0),
            regenerate_calls: AtomicUsize::new(0),
            generate_calls: AtomicUsize::new(0),
            fail_at: Mutex::new(None),
            gate: None,
        })
    }

    fn gated(entered: Arc<Notify>, release: Arc<Notify>) -> Arc<Self> {
        Arc::new(Self {
            create_calls: AtomicUsize::new(0),
            update_calls: AtomicUsize::new(0),
            regenerate_calls: AtomicUsize::new(0),
            generate_calls: AtomicUsize::new(0),
            fail_at: Mutex::new(None),
            gate: Some((entered, release)),
        })
    }

    fn fail_next(&self, step: FailAt) {
        *self.fail_at.lock().unwrap() = Some(step);
    }

    /// Consume the scripted failure if it matches this step.
    fn take_failure(&self, step: FailAt) -> Option<ApiError> {
        let mut slot = self.fail_at.lock().unwrap();
        if *slot == Some(step) {
            *slot = None;
            Some(ApiError::Server {
                status: 500,
                detail: "生成失败".to_string(),
            })
        } else {
            None
        }
    }

    fn calls(&self) -> (usize, usize, usize, usize) {
        (
            self.create_calls.load(Ordering::SeqCst),
            self.update_calls.load(Ordering::SeqCst),
            self.regenerate_calls.load(Ordering::SeqCst),
            self.generate_calls.load(Ordering::SeqCst),
        )
    }
}

#[async_trait]
impl WorkflowApi for StubApi {
    async fn create_outline(
        &self,
        request: &CreateOutlineRequest,
    ) -> Result<CreateOutlineResponse, ApiError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.take_failure(FailAt::CreateOutline) {
            return Err(error);
        }
        Ok(CreateOutlineResponse {
            request_id: "req-42".to_string(),
            title: format!("{}研究分析", request.topic),
            outline: Outline::from(vec![
                Section::with_points("主题概述", vec!["背景信息", "核心内容"]),
                Section::with_points("详细分析", vec!["关键要点"]),
            ]),
        })
    }

    async fn update_outline(
        &self,
        _request_id: &str,
        request: &UpdateOutlineRequest,
    ) -> Result<UpdateOutlineResponse, ApiError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        if let Some((entered, release)) = &self.gate {
            entered.notify_one();
            release.notified().await;
        }
        if let Some(error) = self.take_failure(FailAt::UpdateOutline) {
            return Err(error);
        }
        Ok(UpdateOutlineResponse {
            title: request.title.clone(),
            outline: request.outline.clone(),
        })
    }

    async fn regenerate_content(&self, _request_id: &str) -> Result<ContentMap, ApiError> {
        self.regenerate_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.take_failure(FailAt::RegenerateContent) {
            return Err(error);
        }
        Ok(ContentMap::from([
            ("主题概述".to_string(), "概述正文。".to_string()),
            ("详细分析".to_string(), "分析正文。".to_string()),
        ]))
    }

    async fn generate_document(
        &self,
        _request_id: &str,
    ) -> Result<GenerateDocumentResponse, ApiError> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.take_failure(FailAt::GenerateDocument) {
            return Err(error);
        }
        Ok(GenerateDocumentResponse {
            file_path: "documents/量化投资_90ae.pptx".to_string(),
            message: Some("文档生成成功".to_string()),
        })
    }
}

async fn ready_engine(api: Arc<StubApi>) -> WorkflowEngine {
    let mut engine = WorkflowEngine::new(api as Arc<dyn WorkflowApi>, 10, DocumentType::Ppt);
    engine
        .submit_topic("量化投资策略", 10, DocumentType::Ppt)
        .await
        .unwrap();
    engine
}

#[tokio::test]
async fn happy_path_ends_complete_with_download_url() {
    let api = StubApi::new();
    let mut engine = ready_engine(Arc::clone(&api)).await;
    assert_eq!(engine.stage(), Stage::OutlineReady);
    assert_eq!(engine.request().title, "量化投资策略研究分析");

    engine.set_section_title(1, "风险评估").unwrap();
    engine.add_point(1).unwrap();
    engine.set_point(1, 1, "最大回撤控制").unwrap();

    let url = engine.confirm().await.unwrap();
    assert_eq!(
        url,
        "/download/documents%2F%E9%87%8F%E5%8C%96%E6%8A%95%E8%B5%84_90ae.pptx"
    );

    let request = engine.request();
    assert_eq!(request.stage, Stage::Complete);
    assert_eq!(request.document_url.as_deref(), Some(url.as_str()));
    let content = request.content.as_ref().unwrap();
    assert_eq!(content.get("主题概述").map(String::as_str), Some("概述正文。"));

    assert_eq!(api.calls(), (1, 1, 1, 1));
}

#[tokio::test]
async fn confirm_with_empty_outline_makes_no_remote_calls() {
    let api = StubApi::new();
    let mut engine = ready_engine(Arc::clone(&api)).await;
    engine.replace_outline(Outline::new()).unwrap();

    let err = engine.confirm().await.unwrap_err();
    assert_eq!(
        err,
        WorkflowError::Validation(ValidationError::EmptyOutline)
    );
    assert_eq!(engine.stage(), Stage::OutlineReady);
    // Only the initial create_outline ever hit the backend.
    assert_eq!(api.calls(), (1, 0, 0, 0));
}

#[tokio::test]
async fn confirm_rejects_section_left_empty_after_normalization() {
    let api = StubApi::new();
    let mut engine = ready_engine(Arc::clone(&api)).await;
    engine
        .replace_outline(Outline::from(vec![Section::with_points(
            "主题概述",
            vec!["   ", ""],
        )]))
        .unwrap();

    let err = engine.confirm().await.unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::Validation(ValidationError::EmptySection { index: 0, .. })
    ));
    assert_eq!(engine.stage(), Stage::OutlineReady);
    assert_eq!(api.calls(), (1, 0, 0, 0));
}

#[tokio::test]
async fn failed_update_short_circuits_the_sequence() {
    let api = StubApi::new();
    let mut engine = ready_engine(Arc::clone(&api)).await;
    api.fail_next(FailAt::UpdateOutline);

    let err = engine.confirm().await.unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::Remote {
            step: RemoteStep::UpdateOutline,
            ..
        }
    ));
    // Neither downstream step ran.
    assert_eq!(api.calls(), (1, 1, 0, 0));
    assert_eq!(
        engine.stage(),
        Stage::Failed {
            retry_from: RetryPoint::OutlineReady
        }
    );
}

#[tokio::test]
async fn mid_sequence_failure_preserves_local_edits_and_is_retryable() {
    let api = StubApi::new();
    let mut engine = ready_engine(Arc::clone(&api)).await;
    engine.set_section_title(0, "编辑后的章节").unwrap();
    let outline_before = engine.request().outline.clone();

    api.fail_next(FailAt::RegenerateContent);
    let err = engine.confirm().await.unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::Remote {
            step: RemoteStep::RegenerateContent,
            ..
        }
    ));

    let request = engine.request();
    assert_eq!(
        request.stage,
        Stage::Failed {
            retry_from: RetryPoint::OutlineReady
        }
    );
    assert_eq!(request.outline, outline_before);
    assert!(request.content.is_none());
    let error = request.last_error.as_ref().unwrap();
    assert_eq!(error.step, Some(RemoteStep::RegenerateContent));
    assert_eq!(error.status, Some(500));
    assert_eq!(api.calls(), (1, 1, 1, 0));

    let url = engine.retry().await.unwrap();
    assert!(url.starts_with("/download/"));
    assert_eq!(engine.stage(), Stage::Complete);
    assert!(engine.request().last_error.is_none());
    // The retry re-ran the whole sequence from update_outline.
    assert_eq!(api.calls(), (1, 2, 2, 1));
}

#[tokio::test]
async fn failed_document_generation_is_recoverable_too() {
    let api = StubApi::new();
    let mut engine = ready_engine(Arc::clone(&api)).await;

    api.fail_next(FailAt::GenerateDocument);
    let err = engine.confirm().await.unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::Remote {
            step: RemoteStep::GenerateDocument,
            ..
        }
    ));
    assert!(engine.request().document_url.is_none());
    assert_eq!(api.calls(), (1, 1, 1, 1));

    engine.retry().await.unwrap();
    assert_eq!(engine.stage(), Stage::Complete);
}

#[tokio::test]
async fn create_failure_is_retryable_from_draft() {
    let api = StubApi::new();
    api.fail_next(FailAt::CreateOutline);

    let mut engine =
        WorkflowEngine::new(Arc::clone(&api) as Arc<dyn WorkflowApi>, 10, DocumentType::Ppt);
    let err = engine
        .submit_topic("量化投资策略", 10, DocumentType::Ppt)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::Remote {
            step: RemoteStep::CreateOutline,
            ..
        }
    ));
    assert_eq!(
        engine.stage(),
        Stage::Failed {
            retry_from: RetryPoint::Draft
        }
    );
    assert!(engine.request().request_id.is_none());

    engine
        .submit_topic("量化投资策略", 10, DocumentType::Ppt)
        .await
        .unwrap();
    assert_eq!(engine.stage(), Stage::OutlineReady);
    assert_eq!(api.calls(), (2, 0, 0, 0));
}

#[tokio::test]
async fn concurrent_confirm_is_rejected_while_one_is_in_flight() {
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let api = StubApi::gated(Arc::clone(&entered), Arc::clone(&release));

    let handle = WorkflowHandle::new(
        Arc::clone(&api) as Arc<dyn WorkflowApi>,
        10,
        DocumentType::Ppt,
    );
    handle
        .submit_topic("量化投资策略", 10, DocumentType::Ppt)
        .await
        .unwrap();

    let first = {
        let handle = handle.clone();
        tokio::spawn(async move { handle.confirm().await })
    };

    // Wait until the first confirm is parked inside update_outline.
    entered.notified().await;

    let err = handle.confirm().await.unwrap_err();
    assert_eq!(err, WorkflowError::ConfirmInFlight);
    let err = handle.retry().await.unwrap_err();
    assert_eq!(err, WorkflowError::ConfirmInFlight);

    release.notify_one();
    let url = first.await.unwrap().unwrap();
    assert!(url.starts_with("/download/"));
    assert_eq!(handle.stage().await, Stage::Complete);
    assert_eq!(api.calls(), (1, 1, 1, 1));
}

#[tokio::test]
async fn handle_serializes_edits_and_keeps_snapshots_consistent() {
    let api = StubApi::new();
    let handle = WorkflowHandle::new(
        Arc::clone(&api) as Arc<dyn WorkflowApi>,
        10,
        DocumentType::Word,
    );
    handle
        .submit_topic("宏观经济展望", 12, DocumentType::Word)
        .await
        .unwrap();

    handle.set_title("2026宏观经济展望").await.unwrap();
    handle.add_section().await.unwrap();
    handle.set_section_title(2, "政策建议").await.unwrap();

    let snapshot = handle.snapshot().await;
    assert_eq!(snapshot.title, "2026宏观经济展望");
    assert_eq!(snapshot.outline.len(), 3);
    assert_eq!(snapshot.document_type, DocumentType::Word);
    assert!(snapshot.content.is_none());

    handle.confirm().await.unwrap();
    assert_eq!(handle.stage().await, Stage::Complete);

    handle.restart().await;
    let fresh = handle.snapshot().await;
    assert_eq!(fresh.stage, Stage::Draft);
    assert!(fresh.request_id.is_none());
    assert_eq!(fresh.page_limit, 12);
}
