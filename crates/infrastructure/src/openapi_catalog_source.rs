use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use opsgate_application::CatalogSource;
use opsgate_core::{AppError, AppResult};
use opsgate_domain::{
    OperationCatalog, OperationCategory, OperationDescriptor, OperationDescriptorInput, RouteKey,
};
use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Deserialize)]
struct OpenApiDocument {
    #[serde(default)]
    paths: BTreeMap<String, OpenApiPathItem>,
}

#[derive(Debug, Deserialize)]
struct OpenApiPathItem {
    post: Option<OpenApiOperation>,
}

#[derive(Debug, Deserialize)]
struct OpenApiOperation {
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    description: String,
    #[serde(default, rename = "x-command")]
    command: String,
    #[serde(default, rename = "x-idempotent")]
    idempotent: bool,
    #[serde(default, rename = "x-destructive")]
    destructive: bool,
}

/// Operation catalog compiled to an OpenAPI JSON document.
///
/// Every `POST /resources/{resource}/{provider}/{action}` path becomes one
/// operation; the first tag is its category.
#[derive(Debug, Clone)]
pub struct OpenApiCatalogSource {
    path: PathBuf,
}

impl OpenApiCatalogSource {
    /// Creates a source reading the document at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn parse(&self, raw: &str, modified_at: DateTime<Utc>) -> AppResult<OperationCatalog> {
        let document: OpenApiDocument = serde_json::from_str(raw).map_err(|error| {
            AppError::CatalogLoad(format!(
                "invalid operation catalog '{}': {error}",
                self.path.display()
            ))
        })?;

        let mut descriptors = Vec::with_capacity(document.paths.len());
        for (path, item) in document.paths {
            let Some(operation) = item.post else {
                warn!(path = %path, "skipping catalog path without a post operation");
                continue;
            };
            let key = match RouteKey::parse_path(&path) {
                Ok(key) => key,
                Err(error) => {
                    warn!(path = %path, error = %error, "skipping catalog path with unexpected format");
                    continue;
                }
            };

            let category = operation
                .tags
                .first()
                .map(|tag| OperationCategory::from_tag(tag))
                .unwrap_or_default();
            descriptors.push(OperationDescriptor::new(
                key,
                OperationDescriptorInput {
                    command: operation.command,
                    category,
                    description: operation.description,
                    idempotent: operation.idempotent,
                    destructive: operation.destructive,
                },
            ));
        }

        Ok(OperationCatalog::new(
            descriptors,
            Some(modified_at),
            Utc::now(),
        ))
    }
}

#[async_trait]
impl CatalogSource for OpenApiCatalogSource {
    fn location(&self) -> String {
        self.path.display().to_string()
    }

    async fn modified_at(&self) -> AppResult<DateTime<Utc>> {
        let metadata = tokio::fs::metadata(&self.path).await.map_err(|error| {
            AppError::CatalogLoad(format!(
                "operation catalog '{}' is unavailable: {error}",
                self.path.display()
            ))
        })?;
        let modified = metadata.modified().map_err(|error| {
            AppError::CatalogLoad(format!(
                "operation catalog '{}' has no modification time: {error}",
                self.path.display()
            ))
        })?;

        Ok(DateTime::<Utc>::from(modified))
    }

    async fn load(&self) -> AppResult<OperationCatalog> {
        let modified_at = self.modified_at().await?;
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|error| {
            AppError::CatalogLoad(format!(
                "failed to read operation catalog '{}': {error}",
                self.path.display()
            ))
        })?;

        self.parse(&raw, modified_at)
    }
}
