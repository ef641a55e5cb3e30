use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use opsgate_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

const RESOURCE_PATH_PREFIX: &str = "resources";

/// Typed `(resource, provider, action)` lookup key for one catalog operation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RouteKey {
    resource: String,
    provider: String,
    action: String,
}

impl RouteKey {
    /// Creates a route key from its three path segments.
    pub fn new(
        resource: impl Into<String>,
        provider: impl Into<String>,
        action: impl Into<String>,
    ) -> AppResult<Self> {
        let key = Self {
            resource: resource.into(),
            provider: provider.into(),
            action: action.into(),
        };

        for segment in [&key.resource, &key.provider, &key.action] {
            if segment.trim().is_empty() || segment.contains('/') {
                return Err(AppError::Validation(format!(
                    "invalid route segment '{segment}'"
                )));
            }
        }

        Ok(key)
    }

    /// Parses a `/resources/{resource}/{provider}/{action}` path.
    pub fn parse_path(path: &str) -> AppResult<Self> {
        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
        match segments.as_slice() {
            [prefix, resource, provider, action] if *prefix == RESOURCE_PATH_PREFIX => {
                Self::new(*resource, *provider, *action)
            }
            _ => Err(AppError::Validation(format!(
                "unexpected operation path format '{path}'"
            ))),
        }
    }

    /// Returns the resource segment.
    #[must_use]
    pub fn resource(&self) -> &str {
        self.resource.as_str()
    }

    /// Returns the provider segment.
    #[must_use]
    pub fn provider(&self) -> &str {
        self.provider.as_str()
    }

    /// Returns the action segment.
    #[must_use]
    pub fn action(&self) -> &str {
        self.action.as_str()
    }

    /// Returns the canonical catalog path for this key.
    #[must_use]
    pub fn path(&self) -> String {
        self.to_string()
    }
}

impl Display for RouteKey {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            formatter,
            "/{RESOURCE_PATH_PREFIX}/{}/{}/{}",
            self.resource, self.provider, self.action
        )
    }
}

/// Operation category taken from the first catalog tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OperationCategory {
    /// Read-only inspection.
    #[default]
    Info,
    /// State-changing administration.
    Admin,
    /// Read-only health probe used by gate and drift checks.
    Monitor,
    /// Interactive session or reachability probe.
    Connect,
}

impl OperationCategory {
    /// Maps a catalog tag to a category, defaulting to `info`.
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "admin" => Self::Admin,
            "monitor" => Self::Monitor,
            "connect" => Self::Connect,
            _ => Self::Info,
        }
    }

    /// Returns the stable category name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Admin => "admin",
            Self::Monitor => "monitor",
            Self::Connect => "connect",
        }
    }
}

impl From<String> for OperationCategory {
    fn from(value: String) -> Self {
        Self::from_tag(value.as_str())
    }
}

impl From<OperationCategory> for String {
    fn from(value: OperationCategory) -> Self {
        value.as_str().to_owned()
    }
}

/// Mutable fields accepted when building an operation descriptor.
#[derive(Debug, Clone, Default)]
pub struct OperationDescriptorInput {
    /// Fully resolved shell command.
    pub command: String,
    /// Operation category.
    pub category: OperationCategory,
    /// Human-readable description.
    pub description: String,
    /// Whether the operation may run while another operator holds the lock.
    pub idempotent: bool,
    /// Whether live execution requires explicit confirmation.
    pub destructive: bool,
}

/// One catalog entry binding a route key to a command and safety metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationDescriptor {
    key: RouteKey,
    command: String,
    category: OperationCategory,
    description: String,
    idempotent: bool,
    destructive: bool,
}

impl OperationDescriptor {
    /// Creates an immutable descriptor.
    #[must_use]
    pub fn new(key: RouteKey, input: OperationDescriptorInput) -> Self {
        Self {
            key,
            command: input.command,
            category: input.category,
            description: input.description,
            idempotent: input.idempotent,
            destructive: input.destructive,
        }
    }

    /// Returns the route key.
    #[must_use]
    pub fn key(&self) -> &RouteKey {
        &self.key
    }

    /// Returns the canonical catalog path.
    #[must_use]
    pub fn path(&self) -> String {
        self.key.path()
    }

    /// Returns the resource name.
    #[must_use]
    pub fn resource(&self) -> &str {
        self.key.resource()
    }

    /// Returns the provider name.
    #[must_use]
    pub fn provider(&self) -> &str {
        self.key.provider()
    }

    /// Returns the action name.
    #[must_use]
    pub fn action(&self) -> &str {
        self.key.action()
    }

    /// Returns the resolved command.
    #[must_use]
    pub fn command(&self) -> &str {
        self.command.as_str()
    }

    /// Returns the category.
    #[must_use]
    pub fn category(&self) -> OperationCategory {
        self.category
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        self.description.as_str()
    }

    /// Returns whether the operation ignores the deployment lock.
    #[must_use]
    pub fn idempotent(&self) -> bool {
        self.idempotent
    }

    /// Returns whether the operation needs explicit confirmation.
    #[must_use]
    pub fn destructive(&self) -> bool {
        self.destructive
    }
}

/// Immutable route table plus load metadata.
///
/// A catalog is built once per load and replaced wholesale on reload.
#[derive(Debug, Clone, Default)]
pub struct OperationCatalog {
    operations: BTreeMap<RouteKey, OperationDescriptor>,
    source_modified_at: Option<DateTime<Utc>>,
    loaded_at: Option<DateTime<Utc>>,
    categories: BTreeMap<OperationCategory, usize>,
    providers: BTreeMap<String, usize>,
    destructive_count: usize,
}

impl OperationCatalog {
    /// Builds a catalog from descriptors. Later duplicates replace earlier ones.
    #[must_use]
    pub fn new(
        descriptors: impl IntoIterator<Item = OperationDescriptor>,
        source_modified_at: Option<DateTime<Utc>>,
        loaded_at: DateTime<Utc>,
    ) -> Self {
        let operations: BTreeMap<RouteKey, OperationDescriptor> = descriptors
            .into_iter()
            .map(|descriptor| (descriptor.key.clone(), descriptor))
            .collect();

        let mut categories = BTreeMap::new();
        let mut providers = BTreeMap::new();
        let mut destructive_count = 0;
        for descriptor in operations.values() {
            *categories.entry(descriptor.category).or_insert(0) += 1;
            *providers
                .entry(descriptor.provider().to_owned())
                .or_insert(0) += 1;
            if descriptor.destructive {
                destructive_count += 1;
            }
        }

        Self {
            operations,
            source_modified_at,
            loaded_at: Some(loaded_at),
            categories,
            providers,
            destructive_count,
        }
    }

    /// Looks up one operation.
    #[must_use]
    pub fn get(&self, key: &RouteKey) -> Option<&OperationDescriptor> {
        self.operations.get(key)
    }

    /// Returns the number of loaded operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Returns whether no operations are loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Iterates operations in key order.
    pub fn iter(&self) -> impl Iterator<Item = &OperationDescriptor> {
        self.operations.values()
    }

    /// Iterates monitor-category operations bound to one resource.
    pub fn monitors_for<'a>(
        &'a self,
        resource: &'a str,
    ) -> impl Iterator<Item = &'a OperationDescriptor> + 'a {
        self.operations.values().filter(move |descriptor| {
            descriptor.resource() == resource
                && descriptor.category() == OperationCategory::Monitor
        })
    }

    /// Returns the modification time of the source the catalog was read from.
    #[must_use]
    pub fn source_modified_at(&self) -> Option<DateTime<Utc>> {
        self.source_modified_at
    }

    /// Returns when the catalog was built, `None` for the empty startup catalog.
    #[must_use]
    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.loaded_at
    }

    /// Returns operation counts per category.
    #[must_use]
    pub fn category_counts(&self) -> &BTreeMap<OperationCategory, usize> {
        &self.categories
    }

    /// Returns operation counts per provider.
    #[must_use]
    pub fn provider_counts(&self) -> &BTreeMap<String, usize> {
        &self.providers
    }

    /// Returns the number of destructive operations.
    #[must_use]
    pub fn destructive_count(&self) -> usize {
        self.destructive_count
    }
}
