//! Document verification pipeline: OCR, language-model analysis, and keyword scoring.
//!
//! `DocumentVerifier` runs the stages in order for one file and returns a
//! `VerificationVerdict`. Extraction and model failures propagate to the caller; the
//! intake service turns them into a technical-failure verdict.

pub mod classifier;
pub mod domain;
pub mod extractor;
pub mod gemini;
pub mod orchestrator;
pub mod prompts;
pub mod router;
pub mod scorer;
pub mod tesseract;

#[cfg(test)]
mod tests;

use crate::config::{ModelConfig, OcrConfig};

pub use classifier::{ClassificationError, Classifier, LanguageModel};
pub use domain::{
    DocumentCategory, UnknownCategoryError, VerificationRequest, VerificationVerdict,
    ACCEPTANCE_THRESHOLD,
};
pub use extractor::{DocumentFormat, ExtractionError, TextExtractor};
pub use gemini::GeminiClient;
pub use orchestrator::{
    DocumentVerification, DocumentVerifier, VerificationError, MIN_EXTRACTED_CHARS,
};
pub use prompts::{build_instruction, prompt_for, PREAMBLE};
pub use router::{verification_router, VERIFY_BODY_LIMIT};
pub use scorer::{confidence_for, AnalysisScorer, Assessment, KeywordScorer};
pub use tesseract::TesseractExtractor;

/// Verifier wired to the production OCR engine and language model.
pub type DefaultVerifier = DocumentVerifier<TesseractExtractor, GeminiClient>;

pub fn default_verifier(
    ocr: &OcrConfig,
    model: &ModelConfig,
) -> Result<DefaultVerifier, VerificationError> {
    let extractor = TesseractExtractor::new(ocr);
    let client = GeminiClient::new(model)?;
    Ok(DocumentVerifier::new(extractor, client))
}
