use std::sync::Arc;
use std::time::Duration;

use opsgate_core::{AppError, AppResult};
use opsgate_domain::{
    AuditMode, ConnectParams, ExecutionMode, OperationCategory, OperationDescriptor, RouteKey,
};
use tracing::{error, info, warn};

use crate::audit_log_service::{AuditLogService, ExecutionRecord};
use crate::catalog_service::CatalogService;
use crate::deploy_lock_service::DeployLockService;
use crate::gateway_ports::{CommandOutput, CommandRunner, RemoteDesktopGateway, RemoteSession};

mod connect;

/// Per-category command timeouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchTimeouts {
    /// Timeout for every category except `admin`.
    pub default: Duration,
    /// Timeout for `admin` operations.
    pub admin: Duration,
}

impl DispatchTimeouts {
    fn for_category(self, category: OperationCategory) -> Duration {
        match category {
            OperationCategory::Admin => self.admin,
            _ => self.default,
        }
    }
}

/// One dispatch request after access resolution.
#[derive(Debug, Clone)]
pub struct ActionRequest {
    /// Operation to dispatch.
    pub key: RouteKey,
    /// Resolved execution mode.
    pub mode: ExecutionMode,
    /// Operator identity supplied by the caller.
    pub operator: Option<String>,
    /// Whether the caller confirmed a destructive operation.
    pub confirm_destructive: bool,
}

/// How a connect-category dispatch was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectResolution {
    /// Intent returned without side effects.
    Mock,
    /// Reachability probe executed directly.
    Probe(CommandOutput),
    /// No interactive hand-off exists for the command.
    Unsupported,
    /// No remote desktop gateway is configured.
    GatewayDisabled,
    /// Ephemeral gateway session created.
    Session(RemoteSession),
}

/// Terminal state of a dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Command returned without execution.
    Mock,
    /// Another operator holds the deployment lock.
    Locked {
        /// Current lock holder.
        holder: String,
    },
    /// Destructive operation lacks confirmation.
    ConfirmationRequired,
    /// Command executed.
    Executed(CommandOutput),
    /// Connect-category dispatch.
    Connect {
        /// Parsed connection intent.
        params: ConnectParams,
        /// How the intent was handled.
        resolution: ConnectResolution,
    },
}

/// Dispatch result paired with the operation it concerned.
#[derive(Debug, Clone)]
pub struct Dispatched {
    /// Dispatched operation.
    pub operation: OperationDescriptor,
    /// Terminal state.
    pub outcome: DispatchOutcome,
}

/// Application service deciding how an operation request is handled.
#[derive(Clone)]
pub struct ActionDispatchService {
    catalog: CatalogService,
    locks: DeployLockService,
    audit: AuditLogService,
    runner: Arc<dyn CommandRunner>,
    gateway: Option<Arc<dyn RemoteDesktopGateway>>,
    timeouts: DispatchTimeouts,
}

impl ActionDispatchService {
    /// Creates a dispatch service. `gateway` is `None` when hand-off is disabled.
    #[must_use]
    pub fn new(
        catalog: CatalogService,
        locks: DeployLockService,
        audit: AuditLogService,
        runner: Arc<dyn CommandRunner>,
        gateway: Option<Arc<dyn RemoteDesktopGateway>>,
        timeouts: DispatchTimeouts,
    ) -> Self {
        Self {
            catalog,
            locks,
            audit,
            runner,
            gateway,
            timeouts,
        }
    }

    /// Returns whether a remote desktop gateway is configured.
    #[must_use]
    pub fn gateway_enabled(&self) -> bool {
        self.gateway.is_some()
    }

    /// Dispatches one operation request.
    pub async fn dispatch(&self, request: ActionRequest) -> AppResult<Dispatched> {
        let operation = self
            .catalog
            .lookup(&request.key)
            .await
            .ok_or_else(|| AppError::NotFound(format!("unknown action '{}'", request.key)))?;

        let outcome = if operation.category() == OperationCategory::Connect {
            self.dispatch_connect(&operation, &request).await?
        } else {
            self.dispatch_command(&operation, &request).await?
        };

        Ok(Dispatched { operation, outcome })
    }

    /// Deletes an ephemeral gateway connection.
    pub async fn delete_connection(&self, connection_id: &str) -> AppResult<()> {
        let gateway = self.gateway.as_ref().ok_or_else(|| {
            AppError::NotFound("remote desktop gateway is not configured".to_owned())
        })?;

        gateway.delete_connection(connection_id).await?;
        info!(connection_id, "remote desktop connection deleted");
        Ok(())
    }

    async fn dispatch_command(
        &self,
        operation: &OperationDescriptor,
        request: &ActionRequest,
    ) -> AppResult<DispatchOutcome> {
        let operator = request.operator.as_deref();

        if !request.mode.is_live() {
            self.audit
                .record_execution(ExecutionRecord {
                    operator,
                    ..ExecutionRecord::new(operation, AuditMode::Mock)
                })
                .await?;
            return Ok(DispatchOutcome::Mock);
        }

        if !operation.idempotent() {
            let state = self.locks.status().await?;
            if state.is_held_by_other(operator) {
                let holder = state.holder().unwrap_or_default().to_owned();
                warn!(path = %operation.key(), holder, "dispatch blocked by deployment lock");
                return Ok(DispatchOutcome::Locked { holder });
            }
        }

        if operation.destructive() && !request.confirm_destructive {
            self.audit
                .record_execution(ExecutionRecord {
                    operator,
                    ..ExecutionRecord::new(operation, AuditMode::Blocked)
                })
                .await?;
            warn!(path = %operation.key(), "destructive dispatch without confirmation");
            return Ok(DispatchOutcome::ConfirmationRequired);
        }

        let timeout = self.timeouts.for_category(operation.category());
        let output = self.run_recorded(operation, operator, timeout).await?;
        Ok(DispatchOutcome::Executed(output))
    }

    /// Runs the operation's command and records the result.
    ///
    /// A runner failure is recorded as an `error` entry before it is returned.
    async fn run_recorded(
        &self,
        operation: &OperationDescriptor,
        operator: Option<&str>,
        timeout: Duration,
    ) -> AppResult<CommandOutput> {
        match self.runner.run(operation.command(), timeout).await {
            Ok(output) => {
                info!(
                    path = %operation.key(),
                    returncode = output.returncode,
                    duration_ms = output.duration_ms,
                    "operation executed"
                );
                let record = ExecutionRecord {
                    returncode: Some(output.returncode),
                    duration_ms: Some(output.duration_ms),
                    output: Some(output.combined_output()),
                    operator,
                    ..ExecutionRecord::new(operation, AuditMode::Live)
                };
                if let Err(record_error) = self.audit.record_execution(record).await {
                    error!(path = %operation.key(), error = %record_error, "failed to record execution");
                }
                Ok(output)
            }
            Err(run_error) => {
                error!(path = %operation.key(), error = %run_error, "operation could not be executed");
                let message = run_error.to_string();
                let record = ExecutionRecord {
                    output: Some(message.as_str()),
                    operator,
                    ..ExecutionRecord::new(operation, AuditMode::Error)
                };
                if let Err(record_error) = self.audit.record_execution(record).await {
                    error!(path = %operation.key(), error = %record_error, "failed to record execution error");
                }
                Err(run_error)
            }
        }
    }
}
