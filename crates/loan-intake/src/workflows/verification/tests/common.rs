use std::sync::{Arc, Mutex};

use crate::workflows::verification::classifier::{ClassificationError, LanguageModel};
use crate::workflows::verification::extractor::{ExtractionError, TextExtractor};
use crate::workflows::verification::orchestrator::DocumentVerifier;

pub(super) struct StaticExtractor(pub(super) String);

impl TextExtractor for StaticExtractor {
    fn extract(&self, _file: &[u8]) -> Result<String, ExtractionError> {
        Ok(self.0.clone())
    }
}

pub(super) struct FailingExtractor;

impl TextExtractor for FailingExtractor {
    fn extract(&self, _file: &[u8]) -> Result<String, ExtractionError> {
        Err(ExtractionError::EngineUnavailable("tesseract".to_string()))
    }
}

#[derive(Clone)]
pub(super) struct ScriptedModel {
    response: String,
    pub(super) prompts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedModel {
    pub(super) fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(super) fn calls(&self) -> Vec<String> {
        self.prompts.lock().expect("prompt mutex poisoned").clone()
    }
}

impl LanguageModel for ScriptedModel {
    fn generate(&self, prompt: &str) -> Result<String, ClassificationError> {
        self.prompts
            .lock()
            .expect("prompt mutex poisoned")
            .push(prompt.to_string());
        Ok(self.response.clone())
    }
}

pub(super) struct FailingModel;

impl LanguageModel for FailingModel {
    fn generate(&self, _prompt: &str) -> Result<String, ClassificationError> {
        Err(ClassificationError::Timeout(60))
    }
}

/// OCR text comfortably past the minimum length for an identity card.
pub(super) fn identity_text() -> String {
    "GOVERNMENT OF EXAMPLE - NATIONAL IDENTITY CARD\nName: Priya Raman\nID Number: 4481 2290 1123\n\
     Date of Birth: 14/02/1990\nAddress: 12 Lake View Road, Pune\nValid Until: 31/12/2031\n"
        .to_string()
}

/// Income tax acknowledgement containing the lowercase key terms.
pub(super) fn tax_return_text() -> String {
    "INDIAN INCOME TAX RETURN ACKNOWLEDGEMENT\nThis tax return was filed electronically for \
     assessment year 2024-25. Gross total income: 12,40,000. Taxable income: 10,90,000.\n"
        .to_string()
}

/// Long OCR text with neither "income" nor "tax return" in lowercase.
pub(super) fn unrelated_text() -> String {
    "MONTHLY ELECTRICITY BILL\nConsumer Number: 88-1200-331\nBilling Period: 01/03/2024 to \
     31/03/2024\nAmount Due: 2,310.00\nPlease pay before the due date to avoid late fees.\n"
        .to_string()
}

pub(super) fn verifier_with(
    text: String,
    analysis: &str,
) -> (DocumentVerifier<StaticExtractor, ScriptedModel>, ScriptedModel) {
    let model = ScriptedModel::new(analysis);
    let verifier = DocumentVerifier::new(StaticExtractor(text), model.clone());
    (verifier, model)
}

pub(super) async fn read_json_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
