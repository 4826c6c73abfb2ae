use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::classifier::{ClassificationError, LanguageModel};
use crate::config::ModelConfig;

/// Blocking client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    base_url: String,
    model: String,
    api_key: Option<String>,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl GeminiClient {
    pub fn new(config: &ModelConfig) -> Result<Self, ClassificationError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|err| ClassificationError::Transport(err.to_string()))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            client,
            timeout_secs: config.timeout_secs,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

fn request_body(prompt: &str) -> GenerateRequest<'_> {
    GenerateRequest {
        contents: [Content {
            parts: [Part { text: prompt }],
        }],
    }
}

/// Concatenates the text parts of the first candidate.
fn response_text(body: &str) -> Result<String, ClassificationError> {
    let parsed: GenerateResponse = serde_json::from_str(body)
        .map_err(|err| ClassificationError::ResponseParsing(err.to_string()))?;

    let text = parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .map(|part| part.text)
                .collect::<String>()
        })
        .unwrap_or_default();

    if text.is_empty() {
        return Err(ClassificationError::EmptyResponse);
    }
    Ok(text)
}

impl LanguageModel for GeminiClient {
    fn generate(&self, prompt: &str) -> Result<String, ClassificationError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ClassificationError::MissingApiKey)?;

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&request_body(prompt))
            .send()
            .map_err(|err| {
                if err.is_timeout() {
                    ClassificationError::Timeout(self.timeout_secs)
                } else {
                    ClassificationError::Transport(err.to_string())
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|err| ClassificationError::Transport(err.to_string()))?;

        if !status.is_success() {
            warn!(status = status.as_u16(), model = %self.model, "language model call rejected");
            return Err(ClassificationError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        response_text(&body)
    }
}
