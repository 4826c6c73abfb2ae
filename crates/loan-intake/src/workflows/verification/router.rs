use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, State},
    routing::post,
    Json, Router,
};
use tracing::{error, warn};

use super::domain::{DocumentCategory, VerificationVerdict};
use super::orchestrator::DocumentVerification;
use crate::error::AppError;

/// Raw documents larger than this are refused before OCR.
pub const VERIFY_BODY_LIMIT: usize = 5 * 1024 * 1024;

/// Stateless endpoint running one file through the verification pipeline.
pub fn verification_router(verifier: Arc<dyn DocumentVerification>) -> Router {
    Router::new()
        .route("/api/v1/verify/:category", post(verify_handler))
        .layer(DefaultBodyLimit::max(VERIFY_BODY_LIMIT))
        .with_state(verifier)
}

/// Extraction and model failures answer with the technical-failure verdict.
pub(crate) async fn verify_handler(
    State(verifier): State<Arc<dyn DocumentVerification>>,
    Path(category): Path<String>,
    body: Bytes,
) -> Result<Json<VerificationVerdict>, AppError> {
    let category: DocumentCategory = category.parse()?;

    let outcome = tokio::task::spawn_blocking(move || verifier.verify(&body, category)).await;

    let verdict = match outcome {
        Ok(Ok(verdict)) => verdict,
        Ok(Err(err)) => {
            warn!(%category, error = %err, "document verification failed");
            VerificationVerdict::technical_failure()
        }
        Err(err) => {
            error!(%category, error = %err, "verification task aborted");
            VerificationVerdict::technical_failure()
        }
    };
    Ok(Json(verdict))
}
