use tracing::debug;

use super::domain::DocumentCategory;
use super::prompts::build_instruction;

/// Errors raised by the language-model call.
#[derive(Debug, thiserror::Error)]
pub enum ClassificationError {
    #[error("language model api key is not configured")]
    MissingApiKey,
    #[error("language model request failed: {0}")]
    Transport(String),
    #[error("language model request timed out after {0}s")]
    Timeout(u64),
    #[error("language model returned status {status}: {body}")]
    Upstream { status: u16, body: String },
    #[error("language model response could not be parsed: {0}")]
    ResponseParsing(String),
    #[error("language model returned no text")]
    EmptyResponse,
}

/// Single prompt in, single completion out. No streaming.
pub trait LanguageModel: Send + Sync {
    fn generate(&self, prompt: &str) -> Result<String, ClassificationError>;
}

/// Pairs the prompt catalog with a language model.
pub struct Classifier<M> {
    model: M,
}

impl<M: LanguageModel> Classifier<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }

    /// Returns the model's analysis verbatim.
    pub fn classify(
        &self,
        extracted_text: &str,
        category: DocumentCategory,
    ) -> Result<String, ClassificationError> {
        let instruction = build_instruction(category, extracted_text);
        debug!(%category, prompt_chars = instruction.len(), "requesting document analysis");
        self.model.generate(&instruction)
    }
}
