//! Loan application document intake.
//!
//! An intake session tracks the four document slots, the pitch video, and the sector
//! tags for one application. Each document is validated, stored, and verified before
//! its slot settles; submission merges the verified set onto the application record.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;
pub mod state;

#[cfg(test)]
mod tests;

pub use domain::{
    validate_upload, ApplicationId, DocumentSlot, TagSelection, UnknownSlotError, UploadKind,
    UploadRejection, UploadedFile, DEFAULT_TAGS,
};
pub use repository::{
    ApplicationRecord, ApplicationRepository, DocumentRecord, DocumentStore, RepositoryError,
    StorageError, StoredObject, SubmissionUpdate,
};
pub use router::{intake_router, FILE_NAME_HEADER, UPLOAD_BODY_LIMIT};
pub use service::{IntakeService, IntakeServiceError, SessionView, SlotView, SubmissionBlocker};
pub use state::{
    DocumentSlotState, SlotEvent, SlotStatus, TransitionError, VideoState, VideoStatus,
};
