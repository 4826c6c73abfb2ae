use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use loan_intake::workflows::intake::{
    intake_router, ApplicationRepository, DocumentStore, IntakeService,
};
use loan_intake::workflows::verification::{verification_router, DocumentVerification};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_intake_routes<R, S>(
    service: Arc<IntakeService<R, S>>,
    verifier: Arc<dyn DocumentVerification>,
) -> axum::Router
where
    R: ApplicationRepository + 'static,
    S: DocumentStore + 'static,
{
    intake_router(service)
        .merge(verification_router(verifier))
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{InMemoryApplicationRepository, LocalDirectoryStore};
    use axum::body::Body;
    use axum::http::Request;
    use loan_intake::workflows::verification::{
        DocumentCategory, VerificationError, VerificationVerdict,
    };
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tower::ServiceExt;

    struct ApprovingVerifier;

    impl DocumentVerification for ApprovingVerifier {
        fn verify(
            &self,
            _file: &[u8],
            _category: DocumentCategory,
        ) -> Result<VerificationVerdict, VerificationError> {
            Ok(VerificationVerdict {
                is_valid: true,
                confidence: 0.95,
                warnings: Vec::new(),
                analysis: "Authentic.".to_string(),
            })
        }
    }

    fn app_state(ready: bool) -> AppState {
        let recorder = PrometheusBuilder::new().build_recorder();
        AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(recorder.handle()),
        }
    }

    fn app(dir: &std::path::Path, state: AppState) -> axum::Router {
        let verifier: Arc<dyn DocumentVerification> = Arc::new(ApprovingVerifier);
        let service = Arc::new(IntakeService::new(
            Arc::new(InMemoryApplicationRepository::default()),
            Arc::new(LocalDirectoryStore::new(dir).expect("store")),
            verifier.clone(),
        ));
        with_intake_routes(service, verifier).layer(Extension(state))
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("read body");
        serde_json::from_slice(&body).expect("json payload")
    }

    #[tokio::test]
    async fn healthcheck_reports_ok() {
        let Json(body) = healthcheck().await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn readiness_follows_the_flag() {
        let state = app_state(false);
        let response = readiness_endpoint(Extension(state.clone()))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        state.readiness.store(true, Ordering::Release);
        let response = readiness_endpoint(Extension(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "ready");
    }

    #[tokio::test]
    async fn metrics_endpoint_serves_prometheus_text() {
        let response = metrics_endpoint(Extension(app_state(true)))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; version=0.0.4"
        );
    }

    #[tokio::test]
    async fn combined_router_serves_intake_and_verification() {
        let dir = tempfile::tempdir().expect("tempdir");
        let router = app(dir.path(), app_state(true));

        let response = router
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);

        let response = router
            .clone()
            .oneshot(
                Request::post("/api/v1/verify/bankStatement")
                    .body(Body::from(b"%PDF-1.4".to_vec()))
                    .unwrap(),
            )
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["isValid"], true);

        let response = router
            .clone()
            .oneshot(
                Request::post("/api/v1/applications")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::CREATED);
        let id = json_body(response).await["applicationId"]
            .as_str()
            .expect("id")
            .to_string();

        let response = router
            .oneshot(
                Request::put(format!("/api/v1/applications/{id}/documents/identityProof"))
                    .header(header::CONTENT_TYPE, "image/jpeg")
                    .header("x-file-name", "passport scan.jpg")
                    .body(Body::from(vec![0xFF, 0xD8, 0xFF, 0xE0]))
                    .unwrap(),
            )
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
        let slot = json_body(response).await;
        assert_eq!(slot["status"], "verified");
        let url = slot["url"].as_str().expect("url");
        assert!(url.starts_with("file://"));
        assert!(url.ends_with("/identityProof/passport_scan.jpg"));
    }
}
