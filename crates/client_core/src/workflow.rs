//! Document extraction/validation workflow.
//!
//! The controller reconciles the backend's document lifecycle with what the
//! view can show. Every load is tagged with the document it targets and a
//! generation number; a completion whose tag no longer matches the newest
//! request is dropped so an old response cannot overwrite fresher state.

use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use shared::{
    domain::{DocumentId, DocumentStatus},
    protocol::DocumentRecord,
};
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::{
    backend::ClinicBackend,
    error::ClientError,
    normalizer::{decode_payload, normalize, IncompleteDocumentError, NormalizedPatientData, PayloadDecodeError},
};

const LOAD_FAILED: &str = "Failed to load document";
const EXTRACT_FAILED: &str = "Failed to extract data";
const APPROVE_FAILED: &str = "Failed to approve document";
const NOT_PARSED: &str = "Document has not been parsed yet";

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("document {0} has not been parsed yet")]
    DocumentNotParsed(DocumentId),
    #[error(transparent)]
    Fetch(#[from] ClientError),
    #[error(transparent)]
    Incomplete(#[from] IncompleteDocumentError),
    #[error(transparent)]
    Decode(#[from] PayloadDecodeError),
    #[error("{action} is not available while the document is {mode}")]
    ActionNotAllowed {
        action: WorkflowAction,
        mode: &'static str,
    },
    #[error("{action} targets document {requested} but {current} is loaded")]
    DocumentMismatch {
        action: WorkflowAction,
        requested: DocumentId,
        current: String,
    },
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("request for document {0} was superseded by a newer one")]
    Superseded(DocumentId),
}

impl WorkflowError {
    /// Text for the error screen: server detail first, local wording otherwise.
    pub fn user_message(&self) -> String {
        match self {
            Self::DocumentNotParsed(_) => NOT_PARSED.to_string(),
            Self::Fetch(err) => err.user_message(LOAD_FAILED),
            Self::Incomplete(_) | Self::Decode(_) => LOAD_FAILED.to_string(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowAction {
    Extract,
    Approve,
    Back,
}

impl std::fmt::Display for WorkflowAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Extract => "extract",
            Self::Approve => "approve",
            Self::Back => "back",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowPhase {
    Idle,
    Loading,
    Error { message: String },
    AwaitingExtraction,
    Extracting,
    Ready,
    Approved,
}

impl WorkflowPhase {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Error { .. } => "in error",
            Self::AwaitingExtraction => "awaiting extraction",
            Self::Extracting => "extracting",
            Self::Ready => "ready for review",
            Self::Approved => "approved",
        }
    }
}

/// What the document screen renders.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewMode {
    Idle,
    Loading,
    Error { message: String },
    /// Document preview with an "extract" call to action.
    AwaitingExtraction,
    Extracting,
    /// Validation interface over the normalized data.
    Validating,
    Approved,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AvailableActions {
    pub extract: bool,
    pub approve: bool,
    pub back: bool,
}

impl AvailableActions {
    pub fn allows(&self, action: WorkflowAction) -> bool {
        match action {
            WorkflowAction::Extract => self.extract,
            WorkflowAction::Approve => self.approve,
            WorkflowAction::Back => self.back,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowView {
    pub document_id: Option<DocumentId>,
    pub status: Option<DocumentStatus>,
    pub file_path: Option<String>,
    pub mode: ViewMode,
    pub actions: AvailableActions,
    pub data: Option<Arc<NormalizedPatientData>>,
}

/// Derives the screen mode from the phase and whether normalized data exists.
pub fn derive_view_mode(phase: &WorkflowPhase, has_data: bool) -> ViewMode {
    match phase {
        WorkflowPhase::Idle => ViewMode::Idle,
        WorkflowPhase::Loading => ViewMode::Loading,
        WorkflowPhase::Error { message } => ViewMode::Error {
            message: message.clone(),
        },
        WorkflowPhase::AwaitingExtraction => ViewMode::AwaitingExtraction,
        WorkflowPhase::Extracting => ViewMode::Extracting,
        WorkflowPhase::Ready if has_data => ViewMode::Validating,
        WorkflowPhase::Ready => ViewMode::Loading,
        WorkflowPhase::Approved => ViewMode::Approved,
    }
}

pub fn derive_actions(mode: &ViewMode) -> AvailableActions {
    match mode {
        ViewMode::Idle => AvailableActions::default(),
        ViewMode::AwaitingExtraction => AvailableActions {
            extract: true,
            approve: false,
            back: true,
        },
        ViewMode::Validating => AvailableActions {
            extract: false,
            approve: true,
            back: true,
        },
        ViewMode::Loading | ViewMode::Error { .. } | ViewMode::Extracting | ViewMode::Approved => {
            AvailableActions {
                extract: false,
                approve: false,
                back: true,
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowEvent {
    PhaseChanged(ViewMode),
    Notification(Notification),
    NavigateBack,
    /// Validation finished and the document is approved; leave the screen.
    NavigateAway,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationOutcome {
    Completed,
    Back,
}

/// External review surface that receives the normalized data and resolves
/// with one of its two completion signals.
#[async_trait]
pub trait ValidationInterface: Send + Sync {
    async fn review(&self, data: &NormalizedPatientData) -> anyhow::Result<ValidationOutcome>;
}

pub struct MissingValidationInterface;

#[async_trait]
impl ValidationInterface for MissingValidationInterface {
    async fn review(&self, data: &NormalizedPatientData) -> anyhow::Result<ValidationOutcome> {
        Err(anyhow!(
            "validation interface unavailable for document {}",
            data.document_id
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct RequestTag {
    document_id: DocumentId,
    generation: u64,
}

struct WorkflowState {
    document_id: Option<DocumentId>,
    generation: u64,
    phase: WorkflowPhase,
    record: Option<DocumentRecord>,
    data: Option<Arc<NormalizedPatientData>>,
}

impl WorkflowState {
    fn is_current(&self, tag: &RequestTag) -> bool {
        self.generation == tag.generation && self.document_id.as_ref() == Some(&tag.document_id)
    }

    fn view(&self) -> WorkflowView {
        let mode = derive_view_mode(&self.phase, self.data.is_some());
        WorkflowView {
            document_id: self.document_id.clone(),
            status: self.record.as_ref().map(|record| record.status.clone()),
            file_path: self.record.as_ref().and_then(|record| record.file_path.clone()),
            actions: derive_actions(&mode),
            mode,
            data: self.data.clone(),
        }
    }
}

enum Loaded {
    AwaitingExtraction(DocumentRecord),
    Ready(DocumentRecord, NormalizedPatientData),
}

pub struct DocumentWorkflow {
    backend: Arc<dyn ClinicBackend>,
    validation: Arc<dyn ValidationInterface>,
    inner: Mutex<WorkflowState>,
    events: broadcast::Sender<WorkflowEvent>,
}

impl DocumentWorkflow {
    pub fn new(backend: Arc<dyn ClinicBackend>) -> Arc<Self> {
        Self::new_with_validation(backend, Arc::new(MissingValidationInterface))
    }

    pub fn new_with_validation(
        backend: Arc<dyn ClinicBackend>,
        validation: Arc<dyn ValidationInterface>,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(64);
        Arc::new(Self {
            backend,
            validation,
            inner: Mutex::new(WorkflowState {
                document_id: None,
                generation: 0,
                phase: WorkflowPhase::Idle,
                record: None,
                data: None,
            }),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.events.subscribe()
    }

    pub async fn view(&self) -> WorkflowView {
        self.inner.lock().await.view()
    }

    pub async fn phase(&self) -> WorkflowPhase {
        self.inner.lock().await.phase.clone()
    }

    /// Fetches the document and, once extraction exists, its parsed payload.
    pub async fn load(&self, document_id: DocumentId) -> Result<WorkflowView, WorkflowError> {
        self.load_with_phase(document_id, WorkflowPhase::Loading)
            .await
    }

    async fn load_with_phase(
        &self,
        document_id: DocumentId,
        pending: WorkflowPhase,
    ) -> Result<WorkflowView, WorkflowError> {
        let tag = {
            let mut guard = self.inner.lock().await;
            if guard.document_id.as_ref() != Some(&document_id) {
                guard.record = None;
                guard.data = None;
            }
            guard.document_id = Some(document_id.clone());
            self.begin_request(&mut guard, pending)
        };

        let outcome = self.fetch_document(&document_id).await;
        self.finish_load(tag, outcome).await
    }

    /// Triggers backend extraction, then reloads the document on success.
    pub async fn extract(&self, document_id: DocumentId) -> Result<WorkflowView, WorkflowError> {
        let tag = {
            let mut guard = self.inner.lock().await;
            self.ensure_current_document(&guard, WorkflowAction::Extract, &document_id)?;
            self.ensure_allowed(&guard, WorkflowAction::Extract)?;
            self.begin_request(&mut guard, WorkflowPhase::Extracting)
        };

        info!(document_id = %document_id, "workflow: extraction requested");
        match self.backend.extract_document(&document_id).await {
            Ok(()) => {
                {
                    let guard = self.inner.lock().await;
                    if !guard.is_current(&tag) {
                        debug!(document_id = %document_id, "workflow: discarding stale extraction result");
                        return Err(WorkflowError::Superseded(document_id));
                    }
                }
                self.notify(NotificationLevel::Success, "Data extracted successfully");
                // Full reload; the extraction response is not trusted as the final shape.
                self.load_with_phase(document_id, WorkflowPhase::Extracting)
                    .await
            }
            Err(err) => {
                warn!(document_id = %document_id, error = %err, "workflow: extraction failed");
                let mut guard = self.inner.lock().await;
                if guard.is_current(&tag) {
                    self.set_phase(&mut guard, WorkflowPhase::AwaitingExtraction);
                    drop(guard);
                    self.notify(NotificationLevel::Error, err.user_message(EXTRACT_FAILED));
                } else {
                    debug!(document_id = %document_id, "workflow: dropping stale extraction failure");
                }
                Err(err.into())
            }
        }
    }

    /// Hands the normalized data to the validation interface and reacts to
    /// whichever completion signal it resolves with.
    pub async fn approve(&self) -> Result<WorkflowView, WorkflowError> {
        let (tag, data) = {
            let guard = self.inner.lock().await;
            self.ensure_allowed(&guard, WorkflowAction::Approve)?;
            let data = guard.data.clone().ok_or(WorkflowError::ActionNotAllowed {
                action: WorkflowAction::Approve,
                mode: guard.phase.name(),
            })?;
            let document_id = data.document_id.clone();
            (
                RequestTag {
                    document_id,
                    generation: guard.generation,
                },
                data,
            )
        };

        match self.validation.review(&data).await {
            Ok(ValidationOutcome::Completed) => self.complete_validation_for(&tag).await,
            Ok(ValidationOutcome::Back) => {
                self.go_back();
                Ok(self.view().await)
            }
            Err(err) => {
                warn!(document_id = %tag.document_id, error = %err, "workflow: validation failed");
                self.notify(NotificationLevel::Error, APPROVE_FAILED);
                Err(WorkflowError::Validation(err.to_string()))
            }
        }
    }

    /// "Validation complete" callback for the validation interface.
    pub async fn complete_validation(&self) -> Result<WorkflowView, WorkflowError> {
        let tag = {
            let guard = self.inner.lock().await;
            self.ensure_allowed(&guard, WorkflowAction::Approve)?;
            let document_id = guard.document_id.clone().ok_or(WorkflowError::ActionNotAllowed {
                action: WorkflowAction::Approve,
                mode: guard.phase.name(),
            })?;
            RequestTag {
                document_id,
                generation: guard.generation,
            }
        };
        self.complete_validation_for(&tag).await
    }

    /// "Back" callback; navigation itself belongs to the host.
    pub fn go_back(&self) {
        debug!("workflow: navigate back requested");
        let _ = self.events.send(WorkflowEvent::NavigateBack);
    }

    async fn complete_validation_for(&self, tag: &RequestTag) -> Result<WorkflowView, WorkflowError> {
        let mut guard = self.inner.lock().await;
        if !guard.is_current(tag) {
            debug!(document_id = %tag.document_id, "workflow: discarding stale validation completion");
            return Err(WorkflowError::Superseded(tag.document_id.clone()));
        }
        self.set_phase(&mut guard, WorkflowPhase::Approved);
        let view = guard.view();
        drop(guard);

        info!(document_id = %tag.document_id, "workflow: document approved");
        self.notify(NotificationLevel::Success, "Document approved");
        let _ = self.events.send(WorkflowEvent::NavigateAway);
        Ok(view)
    }

    async fn fetch_document(&self, document_id: &DocumentId) -> Result<Loaded, WorkflowError> {
        let record = self.backend.get_document(document_id).await?;
        let Some(parsed_doc_id) = record.parsed_doc_id() else {
            return Err(WorkflowError::DocumentNotParsed(document_id.clone()));
        };

        if !record.status.has_extraction() {
            return Ok(Loaded::AwaitingExtraction(record));
        }

        let raw = self.backend.get_parsed_document(&parsed_doc_id).await?;
        let payload = decode_payload(&raw)?;
        let data = normalize(document_id, &record, Some(&payload))?;
        Ok(Loaded::Ready(record, data))
    }

    async fn finish_load(
        &self,
        tag: RequestTag,
        outcome: Result<Loaded, WorkflowError>,
    ) -> Result<WorkflowView, WorkflowError> {
        let mut guard = self.inner.lock().await;
        if !guard.is_current(&tag) {
            debug!(
                document_id = %tag.document_id,
                generation = tag.generation,
                "workflow: discarding stale load completion"
            );
            return Err(WorkflowError::Superseded(tag.document_id));
        }

        match outcome {
            Ok(Loaded::AwaitingExtraction(record)) => {
                guard.record = Some(record);
                guard.data = None;
                self.set_phase(&mut guard, WorkflowPhase::AwaitingExtraction);
                Ok(guard.view())
            }
            Ok(Loaded::Ready(record, data)) => {
                guard.record = Some(record);
                guard.data = Some(Arc::new(data));
                self.set_phase(&mut guard, WorkflowPhase::Ready);
                Ok(guard.view())
            }
            Err(err) => {
                warn!(document_id = %tag.document_id, error = %err, "workflow: load failed");
                guard.data = None;
                self.set_phase(
                    &mut guard,
                    WorkflowPhase::Error {
                        message: err.user_message(),
                    },
                );
                Err(err)
            }
        }
    }

    fn begin_request(&self, state: &mut WorkflowState, phase: WorkflowPhase) -> RequestTag {
        state.generation += 1;
        self.set_phase(state, phase);
        RequestTag {
            document_id: state
                .document_id
                .clone()
                .unwrap_or_else(|| DocumentId::from("")),
            generation: state.generation,
        }
    }

    fn ensure_allowed(&self, state: &WorkflowState, action: WorkflowAction) -> Result<(), WorkflowError> {
        if state.view().actions.allows(action) {
            Ok(())
        } else {
            Err(WorkflowError::ActionNotAllowed {
                action,
                mode: state.phase.name(),
            })
        }
    }

    fn ensure_current_document(
        &self,
        state: &WorkflowState,
        action: WorkflowAction,
        document_id: &DocumentId,
    ) -> Result<(), WorkflowError> {
        match &state.document_id {
            Some(current) if current == document_id => Ok(()),
            current => Err(WorkflowError::DocumentMismatch {
                action,
                requested: document_id.clone(),
                current: current
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| "no document".to_string()),
            }),
        }
    }

    fn set_phase(&self, state: &mut WorkflowState, phase: WorkflowPhase) {
        if state.phase == phase {
            return;
        }
        info!(
            from = state.phase.name(),
            to = phase.name(),
            document_id = state.document_id.as_ref().map(DocumentId::as_str).unwrap_or(""),
            "workflow: phase change"
        );
        state.phase = phase;
        let mode = derive_view_mode(&state.phase, state.data.is_some());
        let _ = self.events.send(WorkflowEvent::PhaseChanged(mode));
    }

    fn notify(&self, level: NotificationLevel, message: impl Into<String>) {
        let _ = self.events.send(WorkflowEvent::Notification(Notification {
            level,
            message: message.into(),
        }));
    }
}

#[cfg(test)]
#[path = "tests/workflow_tests.rs"]
mod tests;
