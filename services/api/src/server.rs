use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_service_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use energy_community::config::AppConfig;
use energy_community::error::AppError;
use energy_community::telemetry;
use energy_community::{EligibilityService, SnapshotStore};
use std::sync::atomic::AtomicBool;
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
    if let Some(data_dir) = args.data_dir.take() {
        config.data.data_dir = data_dir;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let snapshots = Arc::new(SnapshotStore::new());
    let app_state = AppState {
        readiness: Arc::new(AtomicBool::new(false)),
        metrics: Arc::new(prometheus_handle),
        snapshots: snapshots.clone(),
        data_dir: config.data.data_dir.clone(),
    };

    let service = Arc::new(EligibilityService::new(snapshots));
    let app = with_service_routes(service)
        .layer(Extension(app_state.clone()))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Serve /health while the first load runs; /ready flips once it succeeds.
    let loader = app_state.clone();
    tokio::task::spawn_blocking(move || {
        if loader.reload().is_err() {
            warn!("initial data load failed; waiting for POST /api/v1/admin/reload");
        }
    });

    info!(
        ?config.environment,
        %addr,
        data_dir = %config.data.data_dir.display(),
        "energy community eligibility service listening"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
