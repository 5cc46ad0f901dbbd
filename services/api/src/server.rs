use crate::cli::ServeArgs;
use crate::infra::{
    seed_demo_organization, AppState, InMemoryConversationStore, InMemoryRequestStore,
    InMemoryShelterStore,
};
use crate::routes::with_fostering_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use shelter_ops::config::AppConfig;
use shelter_ops::error::AppError;
use shelter_ops::telemetry;
use shelter_ops::workflows::fostering::{
    AssignmentEngine, FosteringState, OrganizationId, RequestLifecycleManager,
};
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

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let shelter = Arc::new(InMemoryShelterStore::default());
    let requests = Arc::new(InMemoryRequestStore::default());
    let conversations = Arc::new(InMemoryConversationStore::default());
    seed_demo_organization(
        &shelter,
        &conversations,
        &OrganizationId("org-demo".to_string()),
    );

    let state = FosteringState {
        assignments: Arc::new(AssignmentEngine::new(
            shelter.clone(),
            conversations.clone(),
        )),
        requests: Arc::new(RequestLifecycleManager::new(
            shelter,
            requests,
            conversations,
        )),
    };

    let app = with_fostering_routes(state)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "shelter operations service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
