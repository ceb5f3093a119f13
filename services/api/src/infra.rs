use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;
use travel_agency::packages::{
    BookingPolicy, CatalogImportError, CatalogImporter, CatalogSummary, InMemoryTravelRepository,
    TravelPackageService,
};

pub(crate) type Service = TravelPackageService<InMemoryTravelRepository>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Booking service over a fresh process-local store.
pub(crate) fn in_memory_service(policy: BookingPolicy) -> Arc<Service> {
    let repository = Arc::new(InMemoryTravelRepository::default());
    Arc::new(TravelPackageService::new(repository, policy))
}

pub(crate) fn seed_catalog(
    path: &Path,
    service: &Service,
) -> Result<CatalogSummary, CatalogImportError> {
    let summary = CatalogImporter::from_path(path, service)?;
    info!(
        path = %path.display(),
        destinations = summary.destinations.len(),
        activities = summary.activities.len(),
        "catalog seeded"
    );
    Ok(summary)
}
