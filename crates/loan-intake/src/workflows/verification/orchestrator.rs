use tracing::{debug, info};

use super::classifier::{ClassificationError, Classifier, LanguageModel};
use super::domain::{DocumentCategory, VerificationRequest, VerificationVerdict};
use super::extractor::{ExtractionError, TextExtractor};
use super::scorer::{AnalysisScorer, KeywordScorer};

/// OCR output shorter than this is treated as unusable.
pub const MIN_EXTRACTED_CHARS: usize = 100;

const INCOMPLETE_MARKER: &str = "not a complete document";

/// Failure of the whole verification call. Content rejections are verdicts, not errors.
#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
    #[error("text extraction failed: {0}")]
    Extraction(#[from] ExtractionError),
    #[error("document classification failed: {0}")]
    Classification(#[from] ClassificationError),
}

/// Entry point the intake flow calls for each uploaded document.
pub trait DocumentVerification: Send + Sync {
    fn verify(
        &self,
        file: &[u8],
        category: DocumentCategory,
    ) -> Result<VerificationVerdict, VerificationError>;
}

/// Sequences extraction, classification, and scoring, then applies the override rules.
pub struct DocumentVerifier<E, M> {
    extractor: E,
    classifier: Classifier<M>,
    scorer: Box<dyn AnalysisScorer>,
}

impl<E, M> DocumentVerifier<E, M>
where
    E: TextExtractor,
    M: LanguageModel,
{
    pub fn new(extractor: E, model: M) -> Self {
        Self::with_scorer(extractor, model, Box::new(KeywordScorer))
    }

    pub fn with_scorer(extractor: E, model: M, scorer: Box<dyn AnalysisScorer>) -> Self {
        Self {
            extractor,
            classifier: Classifier::new(model),
            scorer,
        }
    }

    pub fn verify_request(
        &self,
        request: &VerificationRequest,
    ) -> Result<VerificationVerdict, VerificationError> {
        self.verify(&request.file_content, request.category)
    }
}

impl<E, M> DocumentVerification for DocumentVerifier<E, M>
where
    E: TextExtractor,
    M: LanguageModel,
{
    fn verify(
        &self,
        file: &[u8],
        category: DocumentCategory,
    ) -> Result<VerificationVerdict, VerificationError> {
        let text = self.extractor.extract(file)?;
        let extracted_chars = text.chars().count();

        if extracted_chars < MIN_EXTRACTED_CHARS {
            info!(%category, extracted_chars, "extracted text too short for verification");
            return Ok(VerificationVerdict::text_too_short());
        }

        let analysis = self.classifier.classify(&text, category)?;
        let assessment = self.scorer.score(&analysis);
        debug!(
            %category,
            is_valid = assessment.is_valid,
            warnings = assessment.warnings.len(),
            "scored model analysis"
        );

        if assessment.is_valid && analysis.to_lowercase().contains(INCOMPLETE_MARKER) {
            info!(%category, "model flagged document as incomplete");
            return Ok(VerificationVerdict::incomplete_document());
        }

        if category == DocumentCategory::IncomeTax
            && !text.contains("income")
            && !text.contains("tax return")
        {
            info!(%category, "income tax return lacks key terms");
            return Ok(VerificationVerdict::missing_income_terms());
        }

        Ok(VerificationVerdict {
            is_valid: assessment.is_valid,
            confidence: assessment.confidence,
            warnings: assessment.warnings,
            analysis,
        })
    }
}
