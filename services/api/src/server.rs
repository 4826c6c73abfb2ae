use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryApplicationRepository, LocalDirectoryStore};
use crate::routes::with_intake_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use loan_intake::config::AppConfig;
use loan_intake::error::AppError;
use loan_intake::telemetry;
use loan_intake::workflows::intake::IntakeService;
use loan_intake::workflows::verification::{default_verifier, DocumentVerification};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    if config.model.api_key.is_none() {
        warn!("GEMINI_API_KEY is not set; every document will fail verification");
    }

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    // The blocking HTTP client must be built off the async workers.
    let (ocr, model) = (config.ocr.clone(), config.model.clone());
    let verifier = tokio::task::spawn_blocking(move || default_verifier(&ocr, &model))
        .await
        .map_err(std::io::Error::other)??;
    let verifier: Arc<dyn DocumentVerification> = Arc::new(verifier);

    let repository = Arc::new(InMemoryApplicationRepository::default());
    let storage = Arc::new(LocalDirectoryStore::new(&config.storage.upload_dir)?);
    let intake_service = Arc::new(IntakeService::new(repository, storage, verifier.clone()));

    let app = with_intake_routes(intake_service, verifier)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        upload_dir = %config.storage.upload_dir.display(),
        model = %config.model.model,
        "loan intake service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
