use async_trait::async_trait;
use chrono::{DateTime, Utc};
use opsgate_core::AppResult;
use opsgate_domain::OperationCatalog;

/// Port for reading the compiled operation catalog.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Returns a human-readable location for logs.
    fn location(&self) -> String;

    /// Returns the modification time of the underlying source.
    async fn modified_at(&self) -> AppResult<DateTime<Utc>>;

    /// Reads and parses the full catalog.
    async fn load(&self) -> AppResult<OperationCatalog>;
}
