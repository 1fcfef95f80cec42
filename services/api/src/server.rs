use crate::cli::ServeArgs;
use crate::infra::{
    demo_snapshot, load_snapshot, AppState, FilePolicySource, InMemoryDispatchRepository,
};
use crate::routes::with_dispatch_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use chrono::Local;
use courier_dispatch::config::AppConfig;
use courier_dispatch::dispatch::DispatchService;
use courier_dispatch::error::AppError;
use courier_dispatch::telemetry;
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

    // Fail fast on a broken policy; later edits are re-read per run.
    let policy = config.dispatch.load_policy()?;
    info!(
        auto_assign_enabled = policy.auto_assign_enabled,
        soft_rules = policy.active_soft_rules().len(),
        "assignment policy loaded"
    );

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let snapshot = match args.snapshot.take() {
        Some(path) => load_snapshot(&path)?,
        None => demo_snapshot(Local::now().date_naive()),
    };
    let repository = Arc::new(InMemoryDispatchRepository::from_snapshot(snapshot));
    let policy_source = Arc::new(FilePolicySource::new(config.dispatch.policy_path.clone()));
    let dispatch_service = Arc::new(DispatchService::new(repository, policy_source));

    let app = with_dispatch_routes(dispatch_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "courier dispatch service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
