use opsgate_application::{
    AccessPolicy, ActionDispatchService, AuditLogService, CatalogService, DeployLockService,
    HealthGateService,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub access_policy: AccessPolicy,
    pub catalog_service: CatalogService,
    pub dispatch_service: ActionDispatchService,
    pub deploy_lock_service: DeployLockService,
    pub audit_log_service: AuditLogService,
    pub health_gate_service: HealthGateService,
}
