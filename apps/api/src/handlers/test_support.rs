use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use opsgate_application::{
    AccessPolicy, ActionDispatchService, AuditLogService, CatalogService, CommandOutput,
    CommandRunner, DeployLockService, DispatchTimeouts, HealthGateService,
};
use opsgate_core::{ApiCredential, AppResult};
use opsgate_infrastructure::{
    JsonFileDeployLockRepository, JsonlAuditLogRepository, OpenApiCatalogSource,
};
use serde_json::json;
use tempfile::TempDir;

use crate::state::AppState;

pub(crate) const TOKEN: &str = "secret-token";

#[derive(Default)]
pub(crate) struct RecordingRunner {
    calls: Mutex<Vec<String>>,
}

impl RecordingRunner {
    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(&self, command: &str, _timeout: Duration) -> AppResult<CommandOutput> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(command.to_owned());
        Ok(CommandOutput {
            stdout: format!("ran {command}"),
            stderr: String::new(),
            returncode: 0,
            duration_ms: 2,
        })
    }
}

pub(crate) struct TestApp {
    pub(crate) state: AppState,
    pub(crate) runner: Arc<RecordingRunner>,
    _directory: TempDir,
}

fn catalog_document() -> serde_json::Value {
    json!({
        "openapi": "3.0.3",
        "paths": {
            "/resources/web/http/status": {
                "post": {
                    "tags": ["monitor"],
                    "x-command": "curl -s http://web/health",
                    "x-idempotent": true
                }
            },
            "/resources/web/systemd/restart": {
                "post": {
                    "tags": ["admin"],
                    "x-command": "systemctl restart nginx",
                    "x-destructive": true
                }
            },
            "/resources/web/app/deploy": {
                "post": {
                    "tags": ["info"],
                    "x-command": "deploy web"
                }
            },
            "/resources/web/net/ping": {
                "post": {
                    "tags": ["connect"],
                    "x-command": "ping -c 1 198.51.100.10"
                }
            },
            "/resources/web/shell/ssh": {
                "post": {
                    "tags": ["connect"],
                    "x-command": "ssh admin@198.51.100.10"
                }
            }
        }
    })
}

/// Builds state over temp-file adapters with a loaded catalog and no gateway.
pub(crate) async fn test_app() -> TestApp {
    build_test_app(Some(catalog_document()), Some(TOKEN)).await
}

/// Builds state whose catalog file does not exist.
pub(crate) async fn empty_test_app() -> TestApp {
    build_test_app(None, Some(TOKEN)).await
}

/// Builds state with a loaded catalog and no credential configured.
pub(crate) async fn credential_less_test_app() -> TestApp {
    build_test_app(Some(catalog_document()), None).await
}

async fn build_test_app(document: Option<serde_json::Value>, token: Option<&str>) -> TestApp {
    let directory = tempfile::tempdir().unwrap_or_else(|_| unreachable!());
    let catalog_path = directory.path().join("openapi.json");
    if let Some(document) = document {
        assert!(
            tokio::fs::write(&catalog_path, document.to_string())
                .await
                .is_ok()
        );
    }

    let catalog_service = CatalogService::new(Arc::new(OpenApiCatalogSource::new(catalog_path)));
    catalog_service.load_initial().await;
    let audit_log_service = AuditLogService::new(Arc::new(JsonlAuditLogRepository::new(
        directory.path().join("deploy.jsonl"),
    )));
    let deploy_lock_service = DeployLockService::new(Arc::new(
        JsonFileDeployLockRepository::new(directory.path().join("deploy.lock.json")),
    ));
    let runner = Arc::new(RecordingRunner::default());

    let state = AppState {
        access_policy: AccessPolicy::new(
            token.and_then(ApiCredential::new),
            "10.0.0.0/8".parse().unwrap_or_else(|_| unreachable!()),
            None,
        ),
        dispatch_service: ActionDispatchService::new(
            catalog_service.clone(),
            deploy_lock_service.clone(),
            audit_log_service.clone(),
            runner.clone(),
            None,
            DispatchTimeouts {
                default: Duration::from_secs(30),
                admin: Duration::from_secs(120),
            },
        ),
        health_gate_service: HealthGateService::new(
            catalog_service.clone(),
            audit_log_service.clone(),
            runner.clone(),
            Duration::from_secs(15),
        ),
        catalog_service,
        deploy_lock_service,
        audit_log_service,
    };

    TestApp {
        state,
        runner,
        _directory: directory,
    }
}
