use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use opsgate_domain::{
    AUDIT_OUTPUT_LIMIT, AuditMode, OperationCatalog, OperationDescriptor, truncate_chars,
};
use tracing::{error, info, warn};

use crate::audit_log_service::{AuditLogService, ExecutionRecord};
use crate::catalog_service::CatalogService;
use crate::gateway_ports::CommandRunner;

/// Maximum number of output characters shown per gate check.
pub const GATE_OUTPUT_DISPLAY_LIMIT: usize = 500;

/// Outcome of one monitor run in a gate check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    /// Exit code zero.
    Pass,
    /// Non-zero exit code.
    Fail,
    /// The command could not be run.
    Error,
}

impl CheckStatus {
    /// Returns the stable status name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Fail => "fail",
            Self::Error => "error",
        }
    }
}

/// One monitor run in a gate check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateCheck {
    /// `provider/action` label.
    pub name: String,
    /// Classified outcome.
    pub status: CheckStatus,
    /// Exit code, absent when the command could not be run.
    pub returncode: Option<i32>,
    /// Output capped for display.
    pub output: String,
    /// Wall time, absent when the command could not be run.
    pub duration_ms: Option<u64>,
    /// Command that was run.
    pub command: String,
}

/// Gate result for one resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceGate {
    /// Resource name.
    pub resource: String,
    /// `None` when the resource has no monitor operations.
    pub healthy: Option<bool>,
    /// Monitor runs.
    pub checks: Vec<GateCheck>,
}

/// Aggregate gate result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateReport {
    /// Whether every checked resource is healthy.
    pub gate_pass: bool,
    /// Resources with at least one monitor operation.
    pub resources_checked: usize,
    /// Resources without monitor operations.
    pub resources_skipped: usize,
    /// Per-resource results in request order.
    pub results: Vec<ResourceGate>,
}

/// Drift classification of one monitor operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriftStatus {
    /// No prior successful run exists.
    NoBaseline,
    /// The current run fails.
    Degraded,
    /// The current run succeeds with different output.
    Drifted,
    /// The current run matches the baseline.
    Ok,
}

impl DriftStatus {
    /// Returns the stable status name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoBaseline => "no_baseline",
            Self::Degraded => "degraded",
            Self::Drifted => "drifted",
            Self::Ok => "ok",
        }
    }

    /// Returns whether the status flags its resource as drifted.
    #[must_use]
    pub fn flags_drift(&self) -> bool {
        matches!(self, Self::Degraded | Self::Drifted)
    }
}

/// One monitor comparison in a drift check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriftCheck {
    /// `provider/action` label.
    pub name: String,
    /// Classification.
    pub status: DriftStatus,
    /// Current output.
    pub current: String,
    /// Output of the last successful run.
    pub baseline: Option<String>,
    /// Command that was run.
    pub command: String,
}

/// Drift result for one resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDrift {
    /// Resource name.
    pub resource: String,
    /// Whether any check is drifted or degraded.
    pub drifted: bool,
    /// Monitor comparisons.
    pub checks: Vec<DriftCheck>,
}

/// Aggregate drift result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriftReport {
    /// Whether any resource drifted.
    pub has_drift: bool,
    /// Number of drifted resources.
    pub resources_drifted: usize,
    /// Number of resources evaluated.
    pub resources_checked: usize,
    /// Per-resource results in request order.
    pub results: Vec<ResourceDrift>,
}

struct MonitorRun {
    returncode: Option<i32>,
    duration_ms: Option<u64>,
    output: String,
}

impl MonitorRun {
    fn succeeded(&self) -> bool {
        self.returncode == Some(0)
    }
}

/// Application service running monitor operations as deployment gates.
#[derive(Clone)]
pub struct HealthGateService {
    catalog: CatalogService,
    audit: AuditLogService,
    runner: Arc<dyn CommandRunner>,
    monitor_timeout: Duration,
}

impl HealthGateService {
    /// Creates a gate service.
    #[must_use]
    pub fn new(
        catalog: CatalogService,
        audit: AuditLogService,
        runner: Arc<dyn CommandRunner>,
        monitor_timeout: Duration,
    ) -> Self {
        Self {
            catalog,
            audit,
            runner,
            monitor_timeout,
        }
    }

    /// Runs every monitor operation of each resource and aggregates health.
    ///
    /// Each run is recorded in the audit log.
    pub async fn gate_check(&self, resources: &[String]) -> GateReport {
        let catalog = self.catalog.snapshot().await;
        let mut results = Vec::new();

        for resource in distinct(resources) {
            let mut checks = Vec::new();
            for operation in catalog.monitors_for(resource) {
                let run = self.run_monitor(operation).await;
                self.record_gate_run(operation, &run).await;

                let status = match run.returncode {
                    None => CheckStatus::Error,
                    Some(0) => CheckStatus::Pass,
                    Some(_) => CheckStatus::Fail,
                };
                checks.push(GateCheck {
                    name: check_name(operation),
                    status,
                    returncode: run.returncode,
                    output: truncate_chars(&run.output, GATE_OUTPUT_DISPLAY_LIMIT),
                    duration_ms: run.duration_ms,
                    command: operation.command().to_owned(),
                });
            }

            let healthy = (!checks.is_empty())
                .then(|| checks.iter().all(|check| check.status == CheckStatus::Pass));
            results.push(ResourceGate {
                resource: resource.to_owned(),
                healthy,
                checks,
            });
        }

        let resources_checked = results
            .iter()
            .filter(|result| result.healthy.is_some())
            .count();
        let report = GateReport {
            gate_pass: results.iter().all(|result| result.healthy != Some(false)),
            resources_checked,
            resources_skipped: results.len() - resources_checked,
            results,
        };
        info!(
            gate_pass = report.gate_pass,
            resources_checked = report.resources_checked,
            resources_skipped = report.resources_skipped,
            "deployment gate evaluated"
        );
        report
    }

    /// Compares each monitor operation with its last successful run.
    ///
    /// Drift runs are not recorded, so they never move their own baseline.
    pub async fn drift_check(&self, resources: &[String]) -> DriftReport {
        let catalog = self.catalog.snapshot().await;
        let mut results = Vec::new();

        for resource in distinct(resources) {
            let checks = self.drift_checks_for(&catalog, resource).await;
            results.push(ResourceDrift {
                resource: resource.to_owned(),
                drifted: checks.iter().any(|check| check.status.flags_drift()),
                checks,
            });
        }

        let resources_drifted = results.iter().filter(|result| result.drifted).count();
        let report = DriftReport {
            has_drift: resources_drifted > 0,
            resources_drifted,
            resources_checked: results.len(),
            results,
        };
        info!(
            has_drift = report.has_drift,
            resources_drifted = report.resources_drifted,
            "drift check evaluated"
        );
        report
    }

    async fn drift_checks_for(&self, catalog: &OperationCatalog, resource: &str) -> Vec<DriftCheck> {
        let mut checks = Vec::new();
        for operation in catalog.monitors_for(resource) {
            let baseline = match self.audit.last_success(operation.key()).await {
                Ok(entry) => entry.map(|entry| entry.output.unwrap_or_default()),
                Err(read_error) => {
                    warn!(path = %operation.key(), error = %read_error, "failed to read drift baseline");
                    None
                }
            };

            let run = self.run_monitor(operation).await;
            let current = truncate_chars(&run.output, AUDIT_OUTPUT_LIMIT);
            let status = match baseline.as_deref() {
                None => DriftStatus::NoBaseline,
                Some(_) if !run.succeeded() => DriftStatus::Degraded,
                Some(baseline) if baseline.trim() != current.trim() => DriftStatus::Drifted,
                Some(_) => DriftStatus::Ok,
            };

            checks.push(DriftCheck {
                name: check_name(operation),
                status,
                current,
                baseline,
                command: operation.command().to_owned(),
            });
        }
        checks
    }

    async fn run_monitor(&self, operation: &OperationDescriptor) -> MonitorRun {
        match self
            .runner
            .run(operation.command(), self.monitor_timeout)
            .await
        {
            Ok(output) => MonitorRun {
                returncode: Some(output.returncode),
                duration_ms: Some(output.duration_ms),
                output: output.combined_output().to_owned(),
            },
            Err(run_error) => {
                warn!(path = %operation.key(), error = %run_error, "monitor could not be executed");
                MonitorRun {
                    returncode: None,
                    duration_ms: None,
                    output: run_error.to_string(),
                }
            }
        }
    }

    async fn record_gate_run(&self, operation: &OperationDescriptor, run: &MonitorRun) {
        let mode = if run.returncode.is_some() {
            AuditMode::Live
        } else {
            AuditMode::Error
        };
        let record = ExecutionRecord {
            returncode: run.returncode,
            duration_ms: run.duration_ms,
            output: Some(run.output.as_str()),
            ..ExecutionRecord::new(operation, mode)
        };
        if let Err(record_error) = self.audit.record_execution(record).await {
            error!(path = %operation.key(), error = %record_error, "failed to record gate run");
        }
    }
}

fn check_name(operation: &OperationDescriptor) -> String {
    format!("{}/{}", operation.provider(), operation.action())
}

fn distinct(resources: &[String]) -> Vec<&str> {
    let mut seen = BTreeSet::new();
    resources
        .iter()
        .map(String::as_str)
        .filter(|resource| seen.insert(*resource))
        .collect()
}
