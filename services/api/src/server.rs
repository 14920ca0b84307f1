use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryEventPublisher};
use crate::routes::with_interview_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use interview_ai::assessment::{InterviewAssessmentService, OfflineProvider};
use interview_ai::config::AppConfig;
use interview_ai::error::AppError;
use interview_ai::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry, config.environment)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let publisher = Arc::new(InMemoryEventPublisher::default());
    let assessment_service = Arc::new(InterviewAssessmentService::new(
        Arc::new(OfflineProvider),
        publisher,
        config.engine.clone(),
    ));

    let app = with_interview_routes(assessment_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        external_analysis = config.engine.external.enabled,
        "interview assessment engine ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
