use serde::{Deserialize, Serialize};

use crate::workflows::verification::VerificationVerdict;

/// Lifecycle of one document upload slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SlotStatus {
    #[default]
    Idle,
    Validating,
    Verifying,
    Verified,
    VerificationFailed,
    Error,
}

/// Inputs that move a slot between states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotEvent {
    FileReceived,
    FileStored,
    FileRejected,
    VerdictAccepted,
    VerdictRejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot apply {event:?} while slot is {}", from.label())]
pub struct TransitionError {
    pub from: SlotStatus,
    pub event: SlotEvent,
}

impl SlotStatus {
    pub const fn label(self) -> &'static str {
        match self {
            SlotStatus::Idle => "idle",
            SlotStatus::Validating => "validating",
            SlotStatus::Verifying => "verifying",
            SlotStatus::Verified => "verified",
            SlotStatus::VerificationFailed => "verification-failed",
            SlotStatus::Error => "error",
        }
    }

    /// A slot with work in flight refuses new files.
    pub const fn is_busy(self) -> bool {
        matches!(self, SlotStatus::Validating | SlotStatus::Verifying)
    }

    pub fn apply(self, event: SlotEvent) -> Result<SlotStatus, TransitionError> {
        use SlotEvent::*;
        use SlotStatus::*;

        match (self, event) {
            (Idle | Verified | VerificationFailed | Error, FileReceived) => Ok(Validating),
            (Validating, FileStored) => Ok(Verifying),
            (Validating, FileRejected) => Ok(Error),
            (Verifying, VerdictAccepted) => Ok(Verified),
            (Verifying, VerdictRejected) => Ok(VerificationFailed),
            (from, event) => Err(TransitionError { from, event }),
        }
    }
}

/// Lifecycle of the pitch video upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VideoStatus {
    #[default]
    Idle,
    Validating,
    Success,
    Error,
}

impl VideoStatus {
    pub const fn label(self) -> &'static str {
        match self {
            VideoStatus::Idle => "idle",
            VideoStatus::Validating => "validating",
            VideoStatus::Success => "success",
            VideoStatus::Error => "error",
        }
    }

    pub const fn is_busy(self) -> bool {
        matches!(self, VideoStatus::Validating)
    }
}

/// Per-slot state kept by the intake session.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DocumentSlotState {
    status: SlotStatus,
    file_name: Option<String>,
    url: Option<String>,
    verdict: Option<VerificationVerdict>,
}

impl DocumentSlotState {
    pub fn status(&self) -> SlotStatus {
        self.status
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn verdict(&self) -> Option<&VerificationVerdict> {
        self.verdict.as_ref()
    }

    /// Starts a new attempt; the previous url and verdict are dropped.
    pub fn begin(&mut self, file_name: &str) -> Result<(), TransitionError> {
        self.status = self.status.apply(SlotEvent::FileReceived)?;
        self.file_name = Some(file_name.to_string());
        self.url = None;
        self.verdict = None;
        Ok(())
    }

    pub fn stored(&mut self, url: String) -> Result<(), TransitionError> {
        self.status = self.status.apply(SlotEvent::FileStored)?;
        self.url = Some(url);
        Ok(())
    }

    pub fn rejected(&mut self) -> Result<(), TransitionError> {
        self.status = self.status.apply(SlotEvent::FileRejected)?;
        Ok(())
    }

    /// Records the verdict and settles on verified or verification-failed.
    pub fn settle(&mut self, verdict: VerificationVerdict) -> Result<SlotStatus, TransitionError> {
        let event = if verdict.is_accepted() {
            SlotEvent::VerdictAccepted
        } else {
            SlotEvent::VerdictRejected
        };
        self.status = self.status.apply(event)?;
        self.verdict = Some(verdict);
        Ok(self.status)
    }
}

/// Pitch video state kept by the intake session.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VideoState {
    pub status: VideoStatus,
    pub url: Option<String>,
    pub error: Option<String>,
}
