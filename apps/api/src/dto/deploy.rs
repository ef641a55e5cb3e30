use std::collections::BTreeMap;

use opsgate_application::{
    DriftCheck, DriftReport, GateCheck, GateReport, LockAttempt, ResourceDrift, ResourceGate,
};
use opsgate_domain::timestamp::to_epoch_seconds;
use opsgate_domain::{AuditEntry, DEFAULT_LOCK_TTL_SECONDS, LockState};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Query string of the history endpoint.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
    pub resource: Option<String>,
    /// Lower bound in epoch seconds.
    pub since: Option<f64>,
}

/// API representation of one audit entry.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/audit-entry-response.ts"
)]
pub struct AuditEntryResponse {
    pub timestamp: f64,
    pub resource: String,
    pub provider: String,
    pub action: String,
    pub command: String,
    pub mode: String,
    pub returncode: Option<i32>,
    #[ts(type = "number | null")]
    pub duration_ms: Option<u64>,
    pub output: Option<String>,
    pub operator: Option<String>,
    pub category: Option<String>,
    pub destructive: bool,
}

impl From<AuditEntry> for AuditEntryResponse {
    fn from(entry: AuditEntry) -> Self {
        Self {
            timestamp: to_epoch_seconds(entry.timestamp),
            resource: entry.resource,
            provider: entry.provider,
            action: entry.action,
            command: entry.command,
            mode: entry.mode.as_str().to_owned(),
            returncode: entry.returncode,
            duration_ms: entry.duration_ms,
            output: entry.output,
            operator: entry.operator,
            category: entry.category.map(|category| category.as_str().to_owned()),
            destructive: entry.destructive,
        }
    }
}

/// History listing, newest first.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/history-response.ts"
)]
pub struct HistoryResponse {
    pub entries: Vec<AuditEntryResponse>,
    pub count: usize,
}

impl From<Vec<AuditEntry>> for HistoryResponse {
    fn from(entries: Vec<AuditEntry>) -> Self {
        let entries: Vec<AuditEntryResponse> = entries.into_iter().map(Into::into).collect();
        Self {
            count: entries.len(),
            entries,
        }
    }
}

/// API representation of the deployment lock.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/lock-state-response.ts"
)]
pub struct LockStateResponse {
    pub locked: bool,
    pub operator: Option<String>,
    pub acquired_at: Option<f64>,
    pub expires_at: Option<f64>,
}

impl From<LockState> for LockStateResponse {
    fn from(state: LockState) -> Self {
        Self {
            locked: state.locked,
            operator: state.operator,
            acquired_at: state.acquired_at.map(to_epoch_seconds),
            expires_at: state.expires_at.map(to_epoch_seconds),
        }
    }
}

/// Result of an acquire or release call.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/lock-attempt-response.ts"
)]
pub struct LockAttemptResponse {
    /// Set on acquire calls.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acquired: Option<bool>,
    /// Set on release calls.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub released: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub state: LockStateResponse,
}

impl LockAttemptResponse {
    /// Builds the response to an acquire call.
    #[must_use]
    pub fn acquire(attempt: LockAttempt) -> Self {
        let message = (!attempt.granted).then(|| {
            format!(
                "Lock held by {}",
                attempt.state.holder().unwrap_or_default()
            )
        });
        Self {
            acquired: Some(attempt.granted),
            released: None,
            message,
            state: attempt.state.into(),
        }
    }

    /// Builds the response to a release call by `operator`.
    #[must_use]
    pub fn release(attempt: LockAttempt, operator: Option<&str>) -> Self {
        let message = (!attempt.granted).then(|| {
            format!(
                "Lock held by {}, not {}",
                attempt.state.holder().unwrap_or_default(),
                operator.unwrap_or_default()
            )
        });
        Self {
            acquired: None,
            released: Some(attempt.granted),
            message,
            state: attempt.state.into(),
        }
    }
}

fn default_ttl_seconds() -> u64 {
    DEFAULT_LOCK_TTL_SECONDS
}

/// Incoming payload for lock acquisition.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/acquire-lock-request.ts"
)]
pub struct AcquireLockRequest {
    pub operator: String,
    #[serde(default = "default_ttl_seconds")]
    #[ts(type = "number")]
    pub ttl_seconds: u64,
}

/// Incoming payload for lock release. An absent operator force-releases.
#[derive(Debug, Default, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/release-lock-request.ts"
)]
pub struct ReleaseLockRequest {
    #[serde(default)]
    pub operator: Option<String>,
}

/// Incoming payload naming the resources to check.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/resources-request.ts"
)]
pub struct ResourcesRequest {
    pub resources: Vec<String>,
}

/// One monitor run of a gate check.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/check-result-response.ts"
)]
pub struct CheckResultResponse {
    /// `pass`, `fail` or `error`.
    pub status: String,
    pub returncode: Option<i32>,
    pub output: String,
    #[ts(type = "number | null")]
    pub duration_ms: Option<u64>,
    pub command: String,
}

impl From<GateCheck> for CheckResultResponse {
    fn from(check: GateCheck) -> Self {
        Self {
            status: check.status.as_str().to_owned(),
            returncode: check.returncode,
            output: check.output,
            duration_ms: check.duration_ms,
            command: check.command,
        }
    }
}

/// Gate result for one resource.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/resource-gate-response.ts"
)]
pub struct ResourceGateResponse {
    pub healthy: Option<bool>,
    /// Keyed by `provider/action`.
    pub checks: BTreeMap<String, CheckResultResponse>,
    pub check_count: usize,
}

impl From<ResourceGate> for ResourceGateResponse {
    fn from(gate: ResourceGate) -> Self {
        let checks: BTreeMap<String, CheckResultResponse> = gate
            .checks
            .into_iter()
            .map(|check| (check.name.clone(), check.into()))
            .collect();
        Self {
            healthy: gate.healthy,
            check_count: checks.len(),
            checks,
        }
    }
}

/// Aggregate gate result.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/gate-report-response.ts"
)]
pub struct GateReportResponse {
    pub gate_pass: bool,
    pub resources_checked: usize,
    pub resources_skipped: usize,
    /// Keyed by resource name.
    pub results: BTreeMap<String, ResourceGateResponse>,
}

impl From<GateReport> for GateReportResponse {
    fn from(report: GateReport) -> Self {
        Self {
            gate_pass: report.gate_pass,
            resources_checked: report.resources_checked,
            resources_skipped: report.resources_skipped,
            results: report
                .results
                .into_iter()
                .map(|gate| (gate.resource.clone(), gate.into()))
                .collect(),
        }
    }
}

/// One monitor comparison of a drift check.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/drift-check-response.ts"
)]
pub struct DriftCheckResponse {
    /// `no_baseline`, `degraded`, `drifted` or `ok`.
    pub drift: String,
    pub current: String,
    pub baseline: Option<String>,
    pub command: String,
}

impl From<DriftCheck> for DriftCheckResponse {
    fn from(check: DriftCheck) -> Self {
        Self {
            drift: check.status.as_str().to_owned(),
            current: check.current,
            baseline: check.baseline,
            command: check.command,
        }
    }
}

/// Drift result for one resource.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/resource-drift-response.ts"
)]
pub struct ResourceDriftResponse {
    pub drifted: bool,
    /// Keyed by `provider/action`.
    pub checks: BTreeMap<String, DriftCheckResponse>,
}

impl From<ResourceDrift> for ResourceDriftResponse {
    fn from(drift: ResourceDrift) -> Self {
        Self {
            drifted: drift.drifted,
            checks: drift
                .checks
                .into_iter()
                .map(|check| (check.name.clone(), check.into()))
                .collect(),
        }
    }
}

/// Aggregate drift result.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/drift-report-response.ts"
)]
pub struct DriftReportResponse {
    pub has_drift: bool,
    pub resources_drifted: usize,
    pub resources_checked: usize,
    /// Keyed by resource name.
    pub results: BTreeMap<String, ResourceDriftResponse>,
}

impl From<DriftReport> for DriftReportResponse {
    fn from(report: DriftReport) -> Self {
        Self {
            has_drift: report.has_drift,
            resources_drifted: report.resources_drifted,
            resources_checked: report.resources_checked,
            results: report
                .results
                .into_iter()
                .map(|drift| (drift.resource.clone(), drift.into()))
                .collect(),
        }
    }
}
