use crate::cli::ServeArgs;
use crate::infra::{load_dataset, AppState, DatasetStore};
use crate::routes::csr_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use csr_score::config::AppConfig;
use csr_score::error::AppError;
use csr_score::telemetry;
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

    let outcome = load_dataset(&config.data)?;
    info!(
        source = %config.data.source_path.display(),
        mode = ?config.data.score_mode,
        records = outcome.dataset.len(),
        excluded = outcome.diagnostics.len(),
        "CSR dataset ready"
    );
    let store = DatasetStore::new(outcome.dataset, config.data.clone());

    let app = csr_routes()
        .layer(Extension(store))
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "CSR scoring service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
