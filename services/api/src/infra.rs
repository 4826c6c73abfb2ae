use loan_intake::workflows::intake::{
    ApplicationId, ApplicationRecord, ApplicationRepository, DocumentStore, RepositoryError,
    StorageError, StoredObject, SubmissionUpdate, UploadedFile,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryApplicationRepository {
    records: Arc<Mutex<HashMap<ApplicationId, ApplicationRecord>>>,
}

impl InMemoryApplicationRepository {
    fn records(&self) -> MutexGuard<'_, HashMap<ApplicationId, ApplicationRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ApplicationRepository for InMemoryApplicationRepository {
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        let mut guard = self.records();
        if guard.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        Ok(self.records().get(id).cloned())
    }

    fn merge(&self, id: &ApplicationId, update: SubmissionUpdate) -> Result<(), RepositoryError> {
        let mut guard = self.records();
        let record = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        record.apply(update);
        Ok(())
    }
}

/// Object store writing uploads under a local directory and handing back `file://` URLs.
#[derive(Debug, Clone)]
pub(crate) struct LocalDirectoryStore {
    root: PathBuf,
}

impl LocalDirectoryStore {
    pub(crate) fn new(root: impl Into<PathBuf>) -> std::io::Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            root: std::fs::canonicalize(&root)?,
        })
    }

    /// Relative path for `key`, restricted to plain segments with a content-type extension.
    fn relative_path(key: &str, content_type: &str) -> PathBuf {
        let mut path: PathBuf = Path::new(key)
            .components()
            .filter_map(|component| match component {
                Component::Normal(segment) => Some(sanitize_segment(&segment.to_string_lossy())),
                _ => None,
            })
            .filter(|segment| !segment.is_empty())
            .collect();

        if path.as_os_str().is_empty() {
            path.push("upload");
        }
        if path.extension().is_none() {
            let extension = mime_guess::get_mime_extensions_str(content_type)
                .and_then(|extensions| extensions.first());
            if let Some(extension) = extension {
                path.set_extension(extension);
            }
        }
        path
    }
}

fn sanitize_segment(segment: &str) -> String {
    segment
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect::<String>()
        .trim_matches('.')
        .to_string()
}

impl DocumentStore for LocalDirectoryStore {
    fn put(&self, key: &str, file: &UploadedFile) -> Result<StoredObject, StorageError> {
        let path = self
            .root
            .join(Self::relative_path(key, &file.content_type));
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, &file.bytes)?;
        debug!(path = %path.display(), bytes = file.size(), "stored upload");

        Ok(StoredObject {
            url: format!("file://{}", path.display()),
        })
    }
}
