use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::workflows::intake::domain::{ApplicationId, DocumentSlot, UploadedFile};
use crate::workflows::intake::repository::{
    ApplicationRecord, ApplicationRepository, DocumentStore, RepositoryError, StorageError,
    StoredObject, SubmissionUpdate,
};
use crate::workflows::intake::service::IntakeService;
use crate::workflows::verification::{
    ClassificationError, DocumentCategory, DocumentVerification, VerificationError,
    VerificationVerdict,
};

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) records: Arc<Mutex<HashMap<ApplicationId, ApplicationRecord>>>,
    pub(super) merges: Arc<Mutex<Vec<SubmissionUpdate>>>,
}

impl MemoryRepository {
    pub(super) fn record(&self, id: &ApplicationId) -> Option<ApplicationRecord> {
        self.records.lock().expect("lock").get(id).cloned()
    }

    pub(super) fn merge_count(&self) -> usize {
        self.merges.lock().expect("lock").len()
    }
}

impl ApplicationRepository for MemoryRepository {
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("lock");
        if guard.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        Ok(self.records.lock().expect("lock").get(id).cloned())
    }

    fn merge(&self, id: &ApplicationId, update: SubmissionUpdate) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("lock");
        let record = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        record.apply(update.clone());
        self.merges.lock().expect("lock").push(update);
        Ok(())
    }
}

/// Memory repository whose first `fetch` parks until the test releases it.
pub(super) struct GatedRepository {
    pub(super) inner: MemoryRepository,
    gate: Mutex<Option<(Sender<()>, Receiver<()>)>>,
}

/// Test-side ends of the gate: `entered` fires when `fetch` parks, `release` lets it go.
pub(super) struct Gate {
    pub(super) entered: Receiver<()>,
    pub(super) release: Sender<()>,
}

impl GatedRepository {
    pub(super) fn new(inner: MemoryRepository) -> (Self, Gate) {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        (
            Self {
                inner,
                gate: Mutex::new(Some((entered_tx, release_rx))),
            },
            Gate {
                entered: entered_rx,
                release: release_tx,
            },
        )
    }
}

impl ApplicationRepository for GatedRepository {
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        self.inner.insert(record)
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        let gate = self.gate.lock().expect("lock").take();
        if let Some((entered, release)) = gate {
            entered.send(()).expect("test listening");
            release.recv().expect("test releases the gate");
        }
        self.inner.fetch(id)
    }

    fn merge(&self, id: &ApplicationId, update: SubmissionUpdate) -> Result<(), RepositoryError> {
        self.inner.merge(id, update)
    }
}

/// Repository whose writes always fail.
pub(super) struct UnavailableRepository;

impl ApplicationRepository for UnavailableRepository {
    fn insert(&self, _record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn merge(&self, _id: &ApplicationId, _update: SubmissionUpdate) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryStore {
    pub(super) keys: Arc<Mutex<Vec<String>>>,
}

impl MemoryStore {
    pub(super) fn stored_keys(&self) -> Vec<String> {
        self.keys.lock().expect("lock").clone()
    }
}

impl DocumentStore for MemoryStore {
    fn put(&self, key: &str, _file: &UploadedFile) -> Result<StoredObject, StorageError> {
        self.keys.lock().expect("lock").push(key.to_string());
        Ok(StoredObject {
            url: format!("memory://{key}"),
        })
    }
}

pub(super) struct FailingStore;

impl DocumentStore for FailingStore {
    fn put(&self, _key: &str, _file: &UploadedFile) -> Result<StoredObject, StorageError> {
        Err(StorageError::Unavailable)
    }
}

/// Verifier returning a fixed verdict per category, and recording each call.
#[derive(Default, Clone)]
pub(super) struct StubVerifier {
    verdicts: Arc<Mutex<HashMap<DocumentCategory, VerificationVerdict>>>,
    fail: bool,
    pub(super) calls: Arc<Mutex<Vec<DocumentCategory>>>,
}

impl StubVerifier {
    pub(super) fn accepting() -> Self {
        Self::default()
    }

    pub(super) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub(super) fn set_verdict(&self, category: DocumentCategory, verdict: VerificationVerdict) {
        self.verdicts.lock().expect("lock").insert(category, verdict);
    }

    pub(super) fn call_count(&self) -> usize {
        self.calls.lock().expect("lock").len()
    }
}

impl DocumentVerification for StubVerifier {
    fn verify(
        &self,
        _file: &[u8],
        category: DocumentCategory,
    ) -> Result<VerificationVerdict, VerificationError> {
        self.calls.lock().expect("lock").push(category);
        if self.fail {
            return Err(ClassificationError::Timeout(60).into());
        }
        Ok(self
            .verdicts
            .lock()
            .expect("lock")
            .get(&category)
            .cloned()
            .unwrap_or_else(accepted_verdict))
    }
}

pub(super) fn accepted_verdict() -> VerificationVerdict {
    VerificationVerdict {
        is_valid: true,
        confidence: 0.95,
        warnings: Vec::new(),
        analysis: "The document appears authentic.".to_string(),
    }
}

pub(super) fn rejected_verdict() -> VerificationVerdict {
    VerificationVerdict {
        is_valid: false,
        confidence: 0.2,
        warnings: vec!["The statement shows signs of tampering, an issue".to_string()],
        analysis: "Invalid statement. The statement shows signs of tampering, an issue."
            .to_string(),
    }
}

pub(super) type TestService = IntakeService<MemoryRepository, MemoryStore>;

pub(super) fn build_service() -> (Arc<TestService>, MemoryRepository, MemoryStore, StubVerifier) {
    build_service_with(StubVerifier::accepting())
}

pub(super) fn build_service_with(
    verifier: StubVerifier,
) -> (Arc<TestService>, MemoryRepository, MemoryStore, StubVerifier) {
    let repository = MemoryRepository::default();
    let store = MemoryStore::default();
    let service = IntakeService::new(
        Arc::new(repository.clone()),
        Arc::new(store.clone()),
        Arc::new(verifier.clone()),
    );
    (Arc::new(service), repository, store, verifier)
}

pub(super) fn pdf_file(name: &str) -> UploadedFile {
    UploadedFile::new(name, "application/pdf", b"%PDF-1.4 scanned document".to_vec())
}

pub(super) fn video_file() -> UploadedFile {
    UploadedFile::new("pitch.mp4", "video/mp4", vec![0_u8; 2048])
}

/// Uploads and verifies every slot, the video, and one tag.
pub(super) fn complete_intake<R, S>(service: &IntakeService<R, S>, id: &ApplicationId)
where
    R: ApplicationRepository + 'static,
    S: DocumentStore + 'static,
{
    for slot in DocumentSlot::ALL {
        service
            .upload_document(id, slot, pdf_file(&format!("{}.pdf", slot.key())))
            .expect("document upload");
    }
    service.upload_video(id, video_file()).expect("video upload");
    service
        .select_tags(id, &["Technology".to_string()])
        .expect("tags selected");
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 256 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
