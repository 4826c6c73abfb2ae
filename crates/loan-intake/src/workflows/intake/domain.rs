use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::workflows::verification::DocumentCategory;

/// Identifier wrapper for loan applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Upload slots on the intake form, each verified as one document category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DocumentSlot {
    IdentityProof,
    BankStatements,
    TaxReturns,
    AddressProof,
}

impl DocumentSlot {
    pub const ALL: [DocumentSlot; 4] = [
        DocumentSlot::IdentityProof,
        DocumentSlot::BankStatements,
        DocumentSlot::TaxReturns,
        DocumentSlot::AddressProof,
    ];

    pub const fn category(self) -> DocumentCategory {
        match self {
            DocumentSlot::IdentityProof => DocumentCategory::IdentityProof,
            DocumentSlot::BankStatements => DocumentCategory::BankStatement,
            DocumentSlot::TaxReturns => DocumentCategory::IncomeTax,
            DocumentSlot::AddressProof => DocumentCategory::AddressProof,
        }
    }

    pub const fn key(self) -> &'static str {
        match self {
            DocumentSlot::IdentityProof => "identityProof",
            DocumentSlot::BankStatements => "bankStatements",
            DocumentSlot::TaxReturns => "taxReturns",
            DocumentSlot::AddressProof => "addressProof",
        }
    }

    /// Human label used in user-facing messages, e.g. "Bank Statements".
    pub const fn label(self) -> &'static str {
        match self {
            DocumentSlot::IdentityProof => "Identity Proof",
            DocumentSlot::BankStatements => "Bank Statements",
            DocumentSlot::TaxReturns => "Tax Returns",
            DocumentSlot::AddressProof => "Address Proof",
        }
    }
}

impl FromStr for DocumentSlot {
    type Err = UnknownSlotError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        DocumentSlot::ALL
            .into_iter()
            .find(|slot| slot.key() == value)
            .ok_or_else(|| UnknownSlotError(value.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown document slot: {0}")]
pub struct UnknownSlotError(pub String);

/// File received from the client, before validation.
#[derive(Clone)]
pub struct UploadedFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Content type without parameters, lowercased. Unparseable types yield an empty string.
    fn essence(&self) -> String {
        self.content_type
            .parse::<mime::Mime>()
            .map(|mime| mime.essence_str().to_ascii_lowercase())
            .unwrap_or_default()
    }
}

impl fmt::Debug for UploadedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadedFile")
            .field("name", &self.name)
            .field("content_type", &self.content_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// What kind of upload a file is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Document,
    Video,
}

impl UploadKind {
    pub const fn max_bytes(self) -> usize {
        match self {
            UploadKind::Document => 5 * 1024 * 1024,
            UploadKind::Video => 50 * 1024 * 1024,
        }
    }

    pub const fn allowed_types(self) -> &'static [&'static str] {
        match self {
            UploadKind::Document => &["application/pdf", "image/jpeg", "image/png"],
            UploadKind::Video => &["video/mp4", "video/quicktime"],
        }
    }
}

/// Reasons an upload is refused before it reaches storage.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadRejection {
    #[error("File size should be less than 5MB")]
    DocumentTooLarge,
    #[error("Only PDF, JPEG, and PNG files are allowed")]
    UnsupportedDocumentType,
    #[error("Video size should be less than 50MB")]
    VideoTooLarge,
    #[error("Only MP4 and MOV formats are allowed")]
    UnsupportedVideoType,
}

impl UploadRejection {
    pub const fn too_large(kind: UploadKind) -> Self {
        match kind {
            UploadKind::Document => UploadRejection::DocumentTooLarge,
            UploadKind::Video => UploadRejection::VideoTooLarge,
        }
    }
}

pub fn validate_upload(file: &UploadedFile, kind: UploadKind) -> Result<(), UploadRejection> {
    if file.size() > kind.max_bytes() {
        return Err(UploadRejection::too_large(kind));
    }

    let essence = file.essence();
    if !kind.allowed_types().contains(&essence.as_str()) {
        return Err(match kind {
            UploadKind::Document => UploadRejection::UnsupportedDocumentType,
            UploadKind::Video => UploadRejection::UnsupportedVideoType,
        });
    }

    Ok(())
}

pub const DEFAULT_TAGS: [&str; 18] = [
    "Technology",
    "Manufacturing",
    "Healthcare",
    "Agribusiness",
    "Renewable-Energy",
    "Education",
    "E-commerce",
    "Infrastructure",
    "Financial-Services",
    "Consumer-Goods",
    "Artisanal-and-Handicrafts",
    "Sustainable-and-Social-Enterprises",
    "Green Buildings",
    "Sustainable Agriculture",
    "Sustainable Forestry",
    "Green Transportation",
    "Waste Management",
    "Recycling",
];

/// Sector tags offered to the applicant and the subset they picked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagSelection {
    available: Vec<String>,
    selected: Vec<String>,
}

impl Default for TagSelection {
    fn default() -> Self {
        Self {
            available: DEFAULT_TAGS.iter().map(|tag| tag.to_string()).collect(),
            selected: Vec::new(),
        }
    }
}

impl TagSelection {
    pub fn available(&self) -> &[String] {
        &self.available
    }

    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    /// Selects a tag; tags outside the offered list are added to it as custom tags.
    /// Blank input and repeats are ignored.
    pub fn select(&mut self, tag: &str) -> bool {
        let tag = tag.trim();
        if tag.is_empty() || self.selected.iter().any(|existing| existing == tag) {
            return false;
        }
        if !self.available.iter().any(|existing| existing == tag) {
            self.available.push(tag.to_string());
        }
        self.selected.push(tag.to_string());
        true
    }

    pub fn deselect(&mut self, tag: &str) -> bool {
        let before = self.selected.len();
        self.selected.retain(|existing| existing != tag.trim());
        before != self.selected.len()
    }

    /// Replaces the selection, keeping first-seen order.
    pub fn replace_selection<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.selected.clear();
        for tag in tags {
            self.select(tag.as_ref());
        }
    }
}
