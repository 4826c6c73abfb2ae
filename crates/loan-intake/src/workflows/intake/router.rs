use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, DefaultBodyLimit, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, warn};

use super::domain::{ApplicationId, DocumentSlot, UploadKind, UploadRejection, UploadedFile};
use super::repository::{ApplicationRepository, DocumentStore, RepositoryError};
use super::service::{IntakeService, IntakeServiceError, SubmissionBlocker};

/// Largest request body accepted; the video cap plus room for framing.
pub const UPLOAD_BODY_LIMIT: usize = UploadKind::Video.max_bytes() + 1024 * 1024;

/// Header carrying the original file name of a raw-body upload.
pub const FILE_NAME_HEADER: &str = "x-file-name";

/// Router builder exposing the document intake endpoints.
pub fn intake_router<R, S>(service: Arc<IntakeService<R, S>>) -> Router
where
    R: ApplicationRepository + 'static,
    S: DocumentStore + 'static,
{
    Router::new()
        .route("/api/v1/applications", post(open_handler::<R, S>))
        .route(
            "/api/v1/applications/:application_id",
            get(status_handler::<R, S>),
        )
        .route(
            "/api/v1/applications/:application_id/documents/:slot",
            put(document_handler::<R, S>),
        )
        .route(
            "/api/v1/applications/:application_id/video",
            put(video_handler::<R, S>),
        )
        .route(
            "/api/v1/applications/:application_id/tags",
            put(tags_handler::<R, S>),
        )
        .route(
            "/api/v1/applications/:application_id/submit",
            post(submit_handler::<R, S>),
        )
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT))
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub struct TagsRequest {
    pub tags: Vec<String>,
}

pub(crate) fn uploaded_file(headers: &HeaderMap, body: Bytes) -> UploadedFile {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    let name = headers
        .get(FILE_NAME_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or("upload");
    UploadedFile::new(name, content_type, body.to_vec())
}

/// Bodies cut off by the request limit answer with the upload size message.
fn body_rejection(kind: UploadKind, rejection: BytesRejection) -> Response {
    let status = rejection.status();
    warn!(%status, error = %rejection.body_text(), "upload body refused");
    let message = if status == StatusCode::PAYLOAD_TOO_LARGE {
        UploadRejection::too_large(kind).to_string()
    } else {
        rejection.body_text()
    };
    (status, Json(json!({ "error": message }))).into_response()
}

pub(crate) fn error_response(err: IntakeServiceError) -> Response {
    let status = match &err {
        IntakeServiceError::SessionNotFound(_)
        | IntakeServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        IntakeServiceError::SlotBusy(_)
        | IntakeServiceError::VideoBusy
        | IntakeServiceError::AlreadySubmitted
        | IntakeServiceError::SubmissionInProgress
        | IntakeServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        IntakeServiceError::Rejected(_) | IntakeServiceError::Incomplete(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        IntakeServiceError::Storage(_) => StatusCode::BAD_GATEWAY,
        IntakeServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let payload = match &err {
        IntakeServiceError::Incomplete(SubmissionBlocker::DocumentsUnverified(slots)) => json!({
            "error": err.to_string(),
            "pending": slots,
        }),
        _ => json!({ "error": err.to_string() }),
    };
    (status, Json(payload)).into_response()
}

fn join_failure(err: tokio::task::JoinError) -> Response {
    error!(error = %err, "intake task aborted");
    let payload = json!({ "error": "Document verification process failed due to technical issues." });
    (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
}

pub(crate) async fn open_handler<R, S>(State(service): State<Arc<IntakeService<R, S>>>) -> Response
where
    R: ApplicationRepository + 'static,
    S: DocumentStore + 'static,
{
    match service.open() {
        Ok(view) => (StatusCode::CREATED, Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn status_handler<R, S>(
    State(service): State<Arc<IntakeService<R, S>>>,
    Path(application_id): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
    S: DocumentStore + 'static,
{
    let id = ApplicationId(application_id);
    let view = match service.status(&id) {
        Err(IntakeServiceError::SessionNotFound(_)) => service.resume(&id),
        other => other,
    };
    match view {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn document_handler<R, S>(
    State(service): State<Arc<IntakeService<R, S>>>,
    Path((application_id, slot)): Path<(String, String)>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response
where
    R: ApplicationRepository + 'static,
    S: DocumentStore + 'static,
{
    let body = match body {
        Ok(body) => body,
        Err(rejection) => return body_rejection(UploadKind::Document, rejection),
    };
    let slot: DocumentSlot = match slot.parse() {
        Ok(slot) => slot,
        Err(err) => {
            let payload = json!({ "error": format!("{err}") });
            return (StatusCode::NOT_FOUND, Json(payload)).into_response();
        }
    };
    let id = ApplicationId(application_id);
    let file = uploaded_file(&headers, body);

    // OCR and the model call block; keep them off the async workers.
    let outcome =
        tokio::task::spawn_blocking(move || service.upload_document(&id, slot, file)).await;

    match outcome {
        Ok(Ok(view)) => (StatusCode::OK, Json(view)).into_response(),
        Ok(Err(err)) => error_response(err),
        Err(err) => join_failure(err),
    }
}

pub(crate) async fn video_handler<R, S>(
    State(service): State<Arc<IntakeService<R, S>>>,
    Path(application_id): Path<String>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response
where
    R: ApplicationRepository + 'static,
    S: DocumentStore + 'static,
{
    let body = match body {
        Ok(body) => body,
        Err(rejection) => return body_rejection(UploadKind::Video, rejection),
    };
    let id = ApplicationId(application_id);
    let file = uploaded_file(&headers, body);

    match tokio::task::spawn_blocking(move || service.upload_video(&id, file)).await {
        Ok(Ok(video)) => (StatusCode::OK, Json(video)).into_response(),
        Ok(Err(err)) => error_response(err),
        Err(err) => join_failure(err),
    }
}

pub(crate) async fn tags_handler<R, S>(
    State(service): State<Arc<IntakeService<R, S>>>,
    Path(application_id): Path<String>,
    Json(request): Json<TagsRequest>,
) -> Response
where
    R: ApplicationRepository + 'static,
    S: DocumentStore + 'static,
{
    let id = ApplicationId(application_id);
    match service.select_tags(&id, &request.tags) {
        Ok(tags) => (StatusCode::OK, Json(tags)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn submit_handler<R, S>(
    State(service): State<Arc<IntakeService<R, S>>>,
    Path(application_id): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
    S: DocumentStore + 'static,
{
    let id = ApplicationId(application_id);
    match tokio::task::spawn_blocking(move || service.submit(&id)).await {
        Ok(Ok(record)) => (StatusCode::OK, Json(record)).into_response(),
        Ok(Err(err)) => error_response(err),
        Err(err) => join_failure(err),
    }
}
