use crate::cli::ServeArgs;
use crate::infra::{
    seed_demo_data, AppState, InMemoryApplicationRepository, InMemoryIdentityRepository,
    InMemoryJobRepository, TokenSessions,
};
use crate::routes::with_board_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use talentboard::board::{BoardState, LifecycleService, NotificationHub};
use talentboard::config::AppConfig;
use talentboard::error::AppError;
use talentboard::telemetry;
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

    let identities = Arc::new(InMemoryIdentityRepository::default());
    let jobs = Arc::new(InMemoryJobRepository::default());
    let applications = Arc::new(InMemoryApplicationRepository::default());
    let hub = Arc::new(NotificationHub::new());
    let sessions = Arc::new(TokenSessions::new(config.auth.admin_token.clone()));

    if args.demo_data {
        seed_demo_data(identities.as_ref(), sessions.as_ref()).map_err(|err| {
            AppError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                err.to_string(),
            ))
        })?;
    }

    let service = Arc::new(LifecycleService::new(
        identities,
        jobs,
        applications,
        hub.clone(),
    ));

    let app = with_board_routes(BoardState { service, sessions })
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "talentboard service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
