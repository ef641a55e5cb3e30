use std::collections::BTreeMap;

use opsgate_domain::OperationCatalog;
use opsgate_domain::timestamp::to_epoch_seconds;
use serde::Serialize;
use ts_rs::TS;

/// Liveness and readiness payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/health-response.ts"
)]
pub struct HealthResponse {
    /// `ok` or `not_ready`.
    pub status: &'static str,
    pub catalog_loaded: bool,
    pub route_count: usize,
    /// Catalog source modification time in epoch seconds.
    pub catalog_modified_at: Option<f64>,
}

impl HealthResponse {
    /// Summarizes a catalog snapshot.
    #[must_use]
    pub fn from_catalog(status: &'static str, catalog: &OperationCatalog) -> Self {
        Self {
            status,
            catalog_loaded: !catalog.is_empty(),
            route_count: catalog.len(),
            catalog_modified_at: catalog.source_modified_at().map(to_epoch_seconds),
        }
    }
}

/// Catalog statistics payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/catalog-info-response.ts"
)]
pub struct CatalogInfoResponse {
    pub route_count: usize,
    pub catalog_modified_at: Option<f64>,
    pub last_reload: Option<f64>,
    pub categories: BTreeMap<String, usize>,
    pub providers: BTreeMap<String, usize>,
    pub destructive_count: usize,
}

impl From<&OperationCatalog> for CatalogInfoResponse {
    fn from(catalog: &OperationCatalog) -> Self {
        Self {
            route_count: catalog.len(),
            catalog_modified_at: catalog.source_modified_at().map(to_epoch_seconds),
            last_reload: catalog.loaded_at().map(to_epoch_seconds),
            categories: catalog
                .category_counts()
                .iter()
                .map(|(category, count)| (category.as_str().to_owned(), *count))
                .collect(),
            providers: catalog.provider_counts().clone(),
            destructive_count: catalog.destructive_count(),
        }
    }
}

/// Service descriptor served at the root path.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/service-descriptor-response.ts"
)]
pub struct ServiceDescriptorResponse {
    pub service: &'static str,
    pub version: &'static str,
    /// Execution mode resolved for the calling request.
    pub mode: String,
    pub health: &'static str,
    pub catalog: &'static str,
    pub gateway_enabled: bool,
}
