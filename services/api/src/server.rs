use crate::cli::ServeArgs;
use crate::infra::{in_memory_service, seed_catalog, AppState};
use crate::routes::with_package_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;
use travel_agency::config::AppConfig;
use travel_agency::error::AppError;
use travel_agency::telemetry;

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

    let service = in_memory_service(config.booking);
    if let Some(path) = args.catalog.take() {
        seed_catalog(&path, &service)?;
    }

    let app = with_package_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        refund = ?config.booking.refund,
        package_capacity = ?config.booking.package_capacity,
        "travel booking service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
