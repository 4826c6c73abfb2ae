use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Minimum confidence a valid verdict needs before the intake flow accepts it.
pub const ACCEPTANCE_THRESHOLD: f64 = 0.6;

/// The four document types the verification pipeline understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DocumentCategory {
    IdentityProof,
    AddressProof,
    IncomeTax,
    BankStatement,
}

impl DocumentCategory {
    pub const ALL: [DocumentCategory; 4] = [
        DocumentCategory::IdentityProof,
        DocumentCategory::AddressProof,
        DocumentCategory::IncomeTax,
        DocumentCategory::BankStatement,
    ];

    pub const fn key(self) -> &'static str {
        match self {
            DocumentCategory::IdentityProof => "identityProof",
            DocumentCategory::AddressProof => "addressProof",
            DocumentCategory::IncomeTax => "incomeTax",
            DocumentCategory::BankStatement => "bankStatement",
        }
    }
}

impl fmt::Display for DocumentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for DocumentCategory {
    type Err = UnknownCategoryError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        DocumentCategory::ALL
            .into_iter()
            .find(|category| category.key() == trimmed)
            .ok_or_else(|| UnknownCategoryError(trimmed.to_string()))
    }
}

/// Raised when a caller names a category outside the fixed catalog.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown document category: {0}")]
pub struct UnknownCategoryError(pub String);

/// One upload attempt handed to the verifier.
#[derive(Debug, Clone)]
pub struct VerificationRequest {
    pub file_content: Vec<u8>,
    pub category: DocumentCategory,
}

/// Structured outcome of verifying a single document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationVerdict {
    pub is_valid: bool,
    pub confidence: f64,
    pub warnings: Vec<String>,
    pub analysis: String,
}

impl VerificationVerdict {
    pub(crate) fn text_too_short() -> Self {
        Self::rejected(
            0.1,
            "Text extraction failed, or the document is too irrelevant for verification.",
            "The extracted text is too short or irrelevant to be verified.",
        )
    }

    pub(crate) fn incomplete_document() -> Self {
        Self::rejected(
            0.3,
            "Document content is incomplete.",
            "The document is incomplete or cannot be verified properly.",
        )
    }

    pub(crate) fn missing_income_terms() -> Self {
        Self::rejected(
            0.2,
            "Missing key terms like 'income' or 'tax return'.",
            "The document does not appear to be a valid income tax return.",
        )
    }

    /// Verdict recorded by callers when extraction or classification failed outright.
    pub fn technical_failure() -> Self {
        Self::rejected(
            0.1,
            "Verification process failed.",
            "Document verification process failed due to technical issues.",
        )
    }

    fn rejected(confidence: f64, warning: &str, analysis: &str) -> Self {
        Self {
            is_valid: false,
            confidence,
            warnings: vec![warning.to_string()],
            analysis: analysis.to_string(),
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.is_valid && self.confidence >= ACCEPTANCE_THRESHOLD
    }

    pub fn first_warning(&self) -> Option<&str> {
        self.warnings.first().map(String::as_str)
    }
}
