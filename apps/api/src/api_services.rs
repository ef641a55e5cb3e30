use std::sync::Arc;
use std::time::Duration;

use opsgate_application::{
    AccessPolicy, ActionDispatchService, AuditLogService, CatalogService, DeployLockService,
    DispatchTimeouts, HealthGateService, RemoteDesktopGateway,
};
use opsgate_core::{ApiCredential, AppError};
use opsgate_infrastructure::{
    GuacamoleGatewayClient, GuacamoleSettings, JsonFileDeployLockRepository,
    JsonlAuditLogRepository, OpenApiCatalogSource, ShellCommandRunner,
};
use tracing::{info, warn};

use crate::api_config::ApiConfig;
use crate::state::AppState;

const GATEWAY_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

pub fn build_app_state(config: &ApiConfig) -> Result<AppState, AppError> {
    let credential = config.api_token.as_deref().and_then(ApiCredential::new);
    if credential.is_none() {
        warn!("API_TOKEN is not set; all requests run in mock mode and deploy writes are rejected");
    }
    let access_policy = AccessPolicy::new(
        credential,
        config.trusted_subnet,
        config.trusted_proxy_ip,
    );

    let catalog_service =
        CatalogService::new(Arc::new(OpenApiCatalogSource::new(&config.catalog_path)));
    let audit_log_service =
        AuditLogService::new(Arc::new(JsonlAuditLogRepository::new(&config.deploy_log_path)));
    let deploy_lock_service = DeployLockService::new(Arc::new(
        JsonFileDeployLockRepository::new(&config.deploy_lock_path),
    ));
    let runner = Arc::new(ShellCommandRunner::new());

    let dispatch_service = ActionDispatchService::new(
        catalog_service.clone(),
        deploy_lock_service.clone(),
        audit_log_service.clone(),
        runner.clone(),
        build_gateway(config)?,
        DispatchTimeouts {
            default: config.default_timeout,
            admin: config.admin_timeout,
        },
    );
    let health_gate_service = HealthGateService::new(
        catalog_service.clone(),
        audit_log_service.clone(),
        runner,
        config.monitor_timeout,
    );

    Ok(AppState {
        access_policy,
        catalog_service,
        dispatch_service,
        deploy_lock_service,
        audit_log_service,
        health_gate_service,
    })
}

fn build_gateway(config: &ApiConfig) -> Result<Option<Arc<dyn RemoteDesktopGateway>>, AppError> {
    let Some(gateway) = config.gateway.as_ref() else {
        info!("remote desktop gateway disabled");
        return Ok(None);
    };

    let http_client = reqwest::Client::builder()
        .timeout(GATEWAY_HTTP_TIMEOUT)
        .build()
        .map_err(|error| AppError::Internal(format!("failed to build http client: {error}")))?;
    let client = GuacamoleGatewayClient::new(
        http_client,
        GuacamoleSettings {
            base_url: gateway.url.clone(),
            username: gateway.username.clone(),
            password: gateway.password.clone(),
            ssh_key_path: config.ssh_key_path.clone(),
        },
    )?;
    info!(url = %gateway.url, "remote desktop gateway enabled");

    let client: Arc<dyn RemoteDesktopGateway> = Arc::new(client);
    Ok(Some(client))
}
