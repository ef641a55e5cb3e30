use std::sync::Arc;

use opsgate_core::AppResult;
use opsgate_domain::{OperationCatalog, OperationDescriptor, RouteKey};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::gateway_ports::CatalogSource;

/// Application service owning the active operation catalog.
///
/// Readers receive an `Arc` snapshot; reloads swap the whole catalog so no
/// reader ever observes a partially built table.
#[derive(Clone)]
pub struct CatalogService {
    source: Arc<dyn CatalogSource>,
    active: Arc<RwLock<Arc<OperationCatalog>>>,
}

impl CatalogService {
    /// Creates a catalog service serving an empty catalog until loaded.
    #[must_use]
    pub fn new(source: Arc<dyn CatalogSource>) -> Self {
        Self {
            source,
            active: Arc::new(RwLock::new(Arc::new(OperationCatalog::default()))),
        }
    }

    /// Loads the catalog at startup.
    ///
    /// Failure is logged and leaves the empty catalog in place.
    pub async fn load_initial(&self) -> usize {
        match self.source.load().await {
            Ok(catalog) => {
                let route_count = catalog.len();
                info!(
                    location = %self.source.location(),
                    route_count,
                    destructive_count = catalog.destructive_count(),
                    "operation catalog loaded"
                );
                self.replace(catalog).await;
                route_count
            }
            Err(error) => {
                warn!(
                    location = %self.source.location(),
                    error = %error,
                    "operation catalog unavailable at startup, serving empty catalog"
                );
                0
            }
        }
    }

    /// Reloads the catalog when the source changed since the active load.
    ///
    /// Returns whether a new catalog was swapped in.
    pub async fn reload_if_changed(&self) -> AppResult<bool> {
        let modified_at = self.source.modified_at().await?;
        if self.snapshot().await.source_modified_at() == Some(modified_at) {
            return Ok(false);
        }

        info!(location = %self.source.location(), "operation catalog changed, reloading");
        let catalog = self.source.load().await?;
        info!(
            route_count = catalog.len(),
            destructive_count = catalog.destructive_count(),
            "operation catalog reloaded"
        );
        self.replace(catalog).await;
        Ok(true)
    }

    /// Returns the active catalog.
    pub async fn snapshot(&self) -> Arc<OperationCatalog> {
        self.active.read().await.clone()
    }

    /// Looks up one operation in the active catalog.
    pub async fn lookup(&self, key: &RouteKey) -> Option<OperationDescriptor> {
        self.snapshot().await.get(key).cloned()
    }

    async fn replace(&self, catalog: OperationCatalog) {
        *self.active.write().await = Arc::new(catalog);
    }
}
