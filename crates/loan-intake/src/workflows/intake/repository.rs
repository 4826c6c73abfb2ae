use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{ApplicationId, DocumentSlot, UploadedFile};

/// Persisted verification summary for one document slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub url: String,
    pub verified: bool,
    pub confidence: f64,
    pub warnings: Vec<String>,
}

/// Loan application aggregate as stored by the application database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationRecord {
    pub id: ApplicationId,
    #[serde(default)]
    pub documents: BTreeMap<DocumentSlot, DocumentRecord>,
    #[serde(default)]
    pub video_link: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub verification_completed: bool,
    #[serde(default)]
    pub verification_date: Option<DateTime<Utc>>,
}

impl ApplicationRecord {
    pub fn new(id: ApplicationId) -> Self {
        Self {
            id,
            documents: BTreeMap::new(),
            video_link: None,
            tags: Vec::new(),
            verification_completed: false,
            verification_date: None,
        }
    }

    /// Merge-style write: only the submitted fields are replaced.
    pub fn apply(&mut self, update: SubmissionUpdate) {
        self.documents = update.documents;
        self.video_link = Some(update.video_link);
        self.tags = update.tags;
        self.verification_completed = update.verification_completed;
        self.verification_date = Some(update.verification_date);
    }
}

/// Fields written when the applicant submits the document step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionUpdate {
    pub documents: BTreeMap<DocumentSlot, DocumentRecord>,
    pub video_link: String,
    pub tags: Vec<String>,
    pub verification_completed: bool,
    pub verification_date: DateTime<Utc>,
}

/// Storage abstraction for the application database.
pub trait ApplicationRepository: Send + Sync {
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError>;
    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError>;
    fn merge(&self, id: &ApplicationId, update: SubmissionUpdate) -> Result<(), RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("Application not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Reference to a stored upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredObject {
    pub url: String,
}

/// Object storage boundary: accepts a file, returns a retrievable URL.
pub trait DocumentStore: Send + Sync {
    fn put(&self, key: &str, file: &UploadedFile) -> Result<StoredObject, StorageError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Upload service unavailable")]
    Unavailable,
    #[error("upload failed: {0}")]
    Io(#[from] std::io::Error),
}
