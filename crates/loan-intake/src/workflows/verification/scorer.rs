use serde::{Deserialize, Serialize};

const NEGATIVE_KEYWORDS: [&str; 3] = ["invalid", "reject", "fake"];
const WARNING_KEYWORDS: [&str; 3] = ["warning", "concern", "issue"];

/// Validity flag, confidence, and warnings derived from a model analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    pub is_valid: bool,
    pub confidence: f64,
    pub warnings: Vec<String>,
}

/// Turns raw analysis text into an assessment.
pub trait AnalysisScorer: Send + Sync {
    fn score(&self, analysis: &str) -> Assessment;
}

/// Keyword heuristic over free-text analysis.
///
/// Any sentence mentioning a warning keyword counts, benign or not. The model is
/// instructed to use the negative keywords verbatim when it judges a document invalid.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordScorer;

impl AnalysisScorer for KeywordScorer {
    fn score(&self, analysis: &str) -> Assessment {
        let lowered = analysis.to_lowercase();
        let is_valid = !NEGATIVE_KEYWORDS
            .iter()
            .any(|keyword| lowered.contains(keyword));
        let warnings = extract_warnings(analysis);
        let confidence = confidence_for(is_valid, warnings.len());

        Assessment {
            is_valid,
            confidence,
            warnings,
        }
    }
}

/// Fixed confidence table keyed on validity and warning count.
pub fn confidence_for(is_valid: bool, warning_count: usize) -> f64 {
    match (is_valid, warning_count) {
        (false, _) => 0.2,
        (true, 0) => 0.95,
        (true, 1..=2) => 0.8,
        (true, _) => 0.6,
    }
}

fn extract_warnings(analysis: &str) -> Vec<String> {
    analysis
        .split(['.', '!', '?'])
        .filter(|sentence| {
            let lowered = sentence.to_lowercase();
            WARNING_KEYWORDS
                .iter()
                .any(|keyword| lowered.contains(keyword))
        })
        .map(str::trim)
        .filter(|sentence| !sentence.is_empty())
        .map(str::to_string)
        .collect()
}
