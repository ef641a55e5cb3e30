//! Application services and ports.

#![forbid(unsafe_code)]

mod access_policy;
mod action_dispatch_service;
mod audit_log_service;
mod catalog_service;
mod deploy_lock_service;
mod gateway_ports;
mod health_gate_service;

#[cfg(test)]
mod test_support;

pub use access_policy::{AccessPolicy, AccessRequest};
pub use action_dispatch_service::{
    ActionDispatchService, ActionRequest, ConnectResolution, DispatchOutcome, DispatchTimeouts,
    Dispatched,
};
pub use audit_log_service::{AuditLogService, ExecutionRecord};
pub use catalog_service::CatalogService;
pub use deploy_lock_service::{DeployLockService, LockAttempt};
pub use gateway_ports::{
    AuditLogRepository, CatalogSource, CommandOutput, CommandRunner, DeployLockRepository,
    RemoteDesktopGateway, RemoteSession,
};
pub use health_gate_service::{
    CheckStatus, DriftCheck, DriftReport, DriftStatus, GATE_OUTPUT_DISPLAY_LIMIT, GateCheck,
    GateReport, HealthGateService, ResourceDrift, ResourceGate,
};
