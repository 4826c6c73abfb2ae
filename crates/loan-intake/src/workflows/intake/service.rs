use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use super::domain::{
    validate_upload, ApplicationId, DocumentSlot, TagSelection, UploadKind, UploadRejection,
    UploadedFile,
};
use super::repository::{
    ApplicationRecord, ApplicationRepository, DocumentRecord, DocumentStore, RepositoryError,
    StorageError, SubmissionUpdate,
};
use super::state::{DocumentSlotState, SlotStatus, VideoState, VideoStatus};
use crate::workflows::verification::{DocumentVerification, VerificationVerdict};

static APPLICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_application_id() -> ApplicationId {
    let id = APPLICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ApplicationId(format!("app-{id:06}"))
}

/// In-progress intake for one application.
#[derive(Debug, Clone, Default)]
pub struct IntakeSession {
    documents: BTreeMap<DocumentSlot, DocumentSlotState>,
    video: VideoState,
    tags: TagSelection,
    submitting: bool,
}

impl IntakeSession {
    fn slot(&self, slot: DocumentSlot) -> DocumentSlotState {
        self.documents.get(&slot).cloned().unwrap_or_default()
    }

    fn slot_mut(&mut self, slot: DocumentSlot) -> &mut DocumentSlotState {
        self.documents.entry(slot).or_default()
    }

    fn ensure_open(&self) -> Result<(), IntakeServiceError> {
        if self.submitting {
            Err(IntakeServiceError::SubmissionInProgress)
        } else {
            Ok(())
        }
    }

    /// First unmet submission requirement, in the order the form checks them.
    pub fn blocker(&self) -> Option<SubmissionBlocker> {
        let unverified: Vec<DocumentSlot> = DocumentSlot::ALL
            .into_iter()
            .filter(|slot| self.slot(*slot).status() != SlotStatus::Verified)
            .collect();
        if !unverified.is_empty() {
            return Some(SubmissionBlocker::DocumentsUnverified(unverified));
        }
        if self.video.status != VideoStatus::Success {
            return Some(SubmissionBlocker::VideoMissing);
        }
        if self.tags.selected().is_empty() {
            return Some(SubmissionBlocker::TagsMissing);
        }
        None
    }

    fn submission_update(&self) -> Result<SubmissionUpdate, IntakeServiceError> {
        if let Some(blocker) = self.blocker() {
            return Err(IntakeServiceError::Incomplete(blocker));
        }

        let documents = DocumentSlot::ALL
            .into_iter()
            .map(|slot| {
                let state = self.slot(slot);
                let verdict = state.verdict();
                let record = DocumentRecord {
                    url: state.url().unwrap_or_default().to_string(),
                    verified: state.status() == SlotStatus::Verified,
                    confidence: verdict.map(|verdict| verdict.confidence).unwrap_or(0.0),
                    warnings: verdict
                        .map(|verdict| verdict.warnings.clone())
                        .unwrap_or_default(),
                };
                (slot, record)
            })
            .collect();

        Ok(SubmissionUpdate {
            documents,
            video_link: self.video.url.clone().unwrap_or_default(),
            tags: self.tags.selected().to_vec(),
            verification_completed: true,
            verification_date: Utc::now(),
        })
    }

    fn view(&self, application_id: &ApplicationId) -> SessionView {
        SessionView {
            application_id: application_id.clone(),
            documents: DocumentSlot::ALL
                .into_iter()
                .map(|slot| SlotView::new(slot, &self.slot(slot)))
                .collect(),
            video: self.video.clone(),
            tags: self.tags.clone(),
            ready_to_submit: !self.submitting && self.blocker().is_none(),
            submitting: self.submitting,
        }
    }
}

/// Unmet requirement preventing submission.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionBlocker {
    #[error("Please ensure all documents are verified")]
    DocumentsUnverified(Vec<DocumentSlot>),
    #[error("Please upload a pitch video")]
    VideoMissing,
    #[error("Please select at least one tag")]
    TagsMissing,
}

/// Status of one slot as exposed to API clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotView {
    pub slot: DocumentSlot,
    pub status: SlotStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_result: Option<VerificationVerdict>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SlotView {
    fn new(slot: DocumentSlot, state: &DocumentSlotState) -> Self {
        let label = slot.label();
        let message = match (state.status(), state.verdict()) {
            (SlotStatus::Verified, _) => Some(format!("{label} verified successfully!")),
            (SlotStatus::VerificationFailed, Some(verdict))
                if verdict == &VerificationVerdict::technical_failure() =>
            {
                Some(format!("Failed to verify {label}. Please try again."))
            }
            (SlotStatus::VerificationFailed, Some(verdict)) => match verdict.first_warning() {
                Some(warning) => Some(format!("{label} verification failed: {warning}")),
                None => Some(format!(
                    "{label} verification failed. Please upload a valid document."
                )),
            },
            (SlotStatus::Error, _) => {
                Some(format!("{label} could not be uploaded. Please try again."))
            }
            _ => None,
        };

        Self {
            slot,
            status: state.status(),
            file_name: state.file_name().map(str::to_string),
            url: state.url().map(str::to_string),
            verification_result: state.verdict().cloned(),
            message,
        }
    }
}

/// Snapshot of an application's intake progress.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub application_id: ApplicationId,
    pub documents: Vec<SlotView>,
    pub video: VideoState,
    pub tags: TagSelection,
    pub ready_to_submit: bool,
    pub submitting: bool,
}

/// Error raised by the intake service.
#[derive(Debug, thiserror::Error)]
pub enum IntakeServiceError {
    #[error("no intake session for application {0}")]
    SessionNotFound(ApplicationId),
    #[error("{} is already being processed", .0.label())]
    SlotBusy(DocumentSlot),
    #[error("pitch video is already being processed")]
    VideoBusy,
    #[error("application documents were already submitted")]
    AlreadySubmitted,
    #[error("application submission is in progress")]
    SubmissionInProgress,
    #[error(transparent)]
    Rejected(#[from] UploadRejection),
    #[error(transparent)]
    Incomplete(#[from] SubmissionBlocker),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Service composing object storage, the verifier, and the application repository.
pub struct IntakeService<R, S> {
    repository: Arc<R>,
    storage: Arc<S>,
    verifier: Arc<dyn DocumentVerification>,
    sessions: Mutex<HashMap<ApplicationId, IntakeSession>>,
}

impl<R, S> IntakeService<R, S>
where
    R: ApplicationRepository + 'static,
    S: DocumentStore + 'static,
{
    pub fn new(
        repository: Arc<R>,
        storage: Arc<S>,
        verifier: Arc<dyn DocumentVerification>,
    ) -> Self {
        Self {
            repository,
            storage,
            verifier,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<ApplicationId, IntakeSession>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `f` against the session under the lock. Never called across external I/O.
    fn with_session<T>(
        &self,
        application_id: &ApplicationId,
        f: impl FnOnce(&mut IntakeSession) -> Result<T, IntakeServiceError>,
    ) -> Result<T, IntakeServiceError> {
        {
            let mut sessions = self.sessions();
            if let Some(session) = sessions.get_mut(application_id) {
                return f(session);
            }
        }
        Err(self.missing_session(application_id))
    }

    /// Submitted applications have no session; tell them apart from unknown ids.
    fn missing_session(&self, application_id: &ApplicationId) -> IntakeServiceError {
        match self.repository.fetch(application_id) {
            Ok(Some(record)) if record.verification_completed => {
                IntakeServiceError::AlreadySubmitted
            }
            _ => IntakeServiceError::SessionNotFound(application_id.clone()),
        }
    }

    /// Number of sessions held in memory. Sessions are dropped on submission.
    pub fn open_sessions(&self) -> usize {
        self.sessions().len()
    }

    /// Create a new application record and an empty intake session for it.
    pub fn open(&self) -> Result<SessionView, IntakeServiceError> {
        let application_id = next_application_id();
        let record = self
            .repository
            .insert(ApplicationRecord::new(application_id.clone()))?;
        let session = IntakeSession::default();
        let view = session.view(&record.id);
        self.sessions().insert(record.id.clone(), session);
        info!(application_id = %record.id, "intake session opened");
        Ok(view)
    }

    /// Open (or return) the session for an application created elsewhere.
    pub fn resume(
        &self,
        application_id: &ApplicationId,
    ) -> Result<SessionView, IntakeServiceError> {
        let record = self
            .repository
            .fetch(application_id)?
            .ok_or(RepositoryError::NotFound)?;
        if record.verification_completed {
            return Err(IntakeServiceError::AlreadySubmitted);
        }
        let mut sessions = self.sessions();
        let session = sessions.entry(application_id.clone()).or_default();
        Ok(session.view(application_id))
    }

    pub fn status(
        &self,
        application_id: &ApplicationId,
    ) -> Result<SessionView, IntakeServiceError> {
        self.with_session(application_id, |session| Ok(session.view(application_id)))
    }

    /// Validate, store, and verify one document. Verification failures settle the slot
    /// as `verification-failed` with the technical-failure verdict instead of erroring.
    pub fn upload_document(
        &self,
        application_id: &ApplicationId,
        slot: DocumentSlot,
        file: UploadedFile,
    ) -> Result<SlotView, IntakeServiceError> {
        self.with_session(application_id, |session| {
            session.ensure_open()?;
            session
                .slot_mut(slot)
                .begin(&file.name)
                .map_err(|_| IntakeServiceError::SlotBusy(slot))
        })?;

        if let Err(rejection) = validate_upload(&file, UploadKind::Document) {
            warn!(%application_id, slot = slot.key(), reason = %rejection, "document rejected");
            self.fail_slot(application_id, slot)?;
            return Err(rejection.into());
        }

        let key = format!("{application_id}/{}/{}", slot.key(), file.name);
        let stored = match self.storage.put(&key, &file) {
            Ok(stored) => stored,
            Err(err) => {
                warn!(%application_id, slot = slot.key(), error = %err, "document upload failed");
                self.fail_slot(application_id, slot)?;
                return Err(err.into());
            }
        };

        self.with_session(application_id, |session| {
            session
                .slot_mut(slot)
                .stored(stored.url.clone())
                .map_err(|_| IntakeServiceError::SlotBusy(slot))
        })?;

        info!(
            %application_id,
            slot = slot.key(),
            category = %slot.category(),
            "verifying document"
        );
        let verdict = match self.verifier.verify(&file.bytes, slot.category()) {
            Ok(verdict) => verdict,
            Err(err) => {
                warn!(
                    %application_id,
                    slot = slot.key(),
                    error = %err,
                    "document verification failed"
                );
                VerificationVerdict::technical_failure()
            }
        };

        self.with_session(application_id, |session| {
            let state = session.slot_mut(slot);
            let status = state
                .settle(verdict)
                .map_err(|_| IntakeServiceError::SlotBusy(slot))?;
            info!(%application_id, slot = slot.key(), status = status.label(), "document settled");
            Ok(SlotView::new(slot, state))
        })
    }

    fn fail_slot(
        &self,
        application_id: &ApplicationId,
        slot: DocumentSlot,
    ) -> Result<(), IntakeServiceError> {
        self.with_session(application_id, |session| {
            session
                .slot_mut(slot)
                .rejected()
                .map_err(|_| IntakeServiceError::SlotBusy(slot))
        })
    }

    pub fn upload_video(
        &self,
        application_id: &ApplicationId,
        file: UploadedFile,
    ) -> Result<VideoState, IntakeServiceError> {
        self.with_session(application_id, |session| {
            session.ensure_open()?;
            if session.video.status.is_busy() {
                return Err(IntakeServiceError::VideoBusy);
            }
            session.video = VideoState {
                status: VideoStatus::Validating,
                url: None,
                error: None,
            };
            Ok(())
        })?;

        let outcome = validate_upload(&file, UploadKind::Video)
            .map_err(IntakeServiceError::from)
            .and_then(|()| {
                let key = format!("{application_id}/video/{}", file.name);
                self.storage.put(&key, &file).map_err(IntakeServiceError::from)
            });

        self.with_session(application_id, |session| match outcome {
            Ok(stored) => {
                session.video = VideoState {
                    status: VideoStatus::Success,
                    url: Some(stored.url),
                    error: None,
                };
                info!(%application_id, "pitch video uploaded");
                Ok(session.video.clone())
            }
            Err(err) => {
                let message = match &err {
                    IntakeServiceError::Rejected(rejection) => rejection.to_string(),
                    _ => "Failed to upload video. Please try again.".to_string(),
                };
                warn!(%application_id, error = %err, "pitch video upload failed");
                session.video = VideoState {
                    status: VideoStatus::Error,
                    url: None,
                    error: Some(message),
                };
                Err(err)
            }
        })
    }

    /// Replace the selected tags. Unknown tags become custom tags.
    pub fn select_tags(
        &self,
        application_id: &ApplicationId,
        tags: &[String],
    ) -> Result<TagSelection, IntakeServiceError> {
        self.with_session(application_id, |session| {
            session.ensure_open()?;
            session.tags.replace_selection(tags);
            Ok(session.tags.clone())
        })
    }

    /// Persist the verified documents, video link, and tags onto the application record.
    ///
    /// The session refuses changes while the write is in flight and is dropped once the
    /// record is merged; a failed write reopens it.
    pub fn submit(
        &self,
        application_id: &ApplicationId,
    ) -> Result<ApplicationRecord, IntakeServiceError> {
        let update = self.with_session(application_id, |session| {
            session.ensure_open()?;
            let update = session.submission_update()?;
            session.submitting = true;
            Ok(update)
        })?;

        let record = match self.persist_submission(application_id, update) {
            Ok(record) => record,
            Err(err) => {
                warn!(%application_id, error = %err, "application submission failed");
                if let Some(session) = self.sessions().get_mut(application_id) {
                    session.submitting = false;
                }
                return Err(err);
            }
        };

        self.sessions().remove(application_id);
        info!(%application_id, tags = record.tags.len(), "application documents submitted");
        Ok(record)
    }

    fn persist_submission(
        &self,
        application_id: &ApplicationId,
        update: SubmissionUpdate,
    ) -> Result<ApplicationRecord, IntakeServiceError> {
        let mut record = self
            .repository
            .fetch(application_id)?
            .ok_or(RepositoryError::NotFound)?;
        self.repository.merge(application_id, update.clone())?;
        record.apply(update);
        Ok(record)
    }
}
