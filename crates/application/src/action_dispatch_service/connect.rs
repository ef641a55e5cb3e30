use std::sync::Arc;

use opsgate_core::{AppError, AppResult};
use opsgate_domain::{
    AuditMode, ConnectParams, ConnectProtocol, OperationDescriptor, parse_connect_command,
};
use tracing::{error, info};

use super::{ActionDispatchService, ActionRequest, ConnectResolution, DispatchOutcome};
use crate::audit_log_service::ExecutionRecord;
use crate::gateway_ports::RemoteDesktopGateway;

impl ActionDispatchService {
    /// Handles connect-category operations.
    ///
    /// Bypasses the lock and destructive gates used for command operations.
    pub(super) async fn dispatch_connect(
        &self,
        operation: &OperationDescriptor,
        request: &ActionRequest,
    ) -> AppResult<DispatchOutcome> {
        let params = parse_connect_command(operation.command());
        let operator = request.operator.as_deref();

        let resolution = if !request.mode.is_live() {
            ConnectResolution::Mock
        } else {
            match (params.protocol, self.gateway.as_ref()) {
                (ConnectProtocol::Ping, _) => ConnectResolution::Probe(
                    self.run_recorded(operation, operator, self.timeouts.default)
                        .await?,
                ),
                (ConnectProtocol::Unsupported, _) => ConnectResolution::Unsupported,
                (ConnectProtocol::Ssh | ConnectProtocol::Vnc, None) => {
                    ConnectResolution::GatewayDisabled
                }
                (ConnectProtocol::Ssh | ConnectProtocol::Vnc, Some(gateway)) => {
                    self.open_session(gateway, operation, &params, operator)
                        .await?
                }
            }
        };

        Ok(DispatchOutcome::Connect { params, resolution })
    }

    async fn open_session(
        &self,
        gateway: &Arc<dyn RemoteDesktopGateway>,
        operation: &OperationDescriptor,
        params: &ConnectParams,
        operator: Option<&str>,
    ) -> AppResult<ConnectResolution> {
        match gateway.create_connection(params).await {
            Ok(session) => {
                info!(
                    path = %operation.key(),
                    connection_id = %session.connection_id,
                    protocol = params.gateway_protocol().as_str(),
                    "remote desktop session created"
                );
                let record = ExecutionRecord {
                    output: Some(session.connection_id.as_str()),
                    operator,
                    ..ExecutionRecord::new(operation, AuditMode::Live)
                };
                if let Err(record_error) = self.audit.record_execution(record).await {
                    error!(path = %operation.key(), error = %record_error, "failed to record session");
                }
                Ok(ConnectResolution::Session(session))
            }
            Err(gateway_error) => {
                error!(path = %operation.key(), error = %gateway_error, "remote desktop session failed");
                let message = gateway_error.to_string();
                let record = ExecutionRecord {
                    output: Some(message.as_str()),
                    operator,
                    ..ExecutionRecord::new(operation, AuditMode::Error)
                };
                if let Err(record_error) = self.audit.record_execution(record).await {
                    error!(path = %operation.key(), error = %record_error, "failed to record session error");
                }
                Err(AppError::GatewayUnavailable(
                    "failed to create remote desktop session".to_owned(),
                ))
            }
        }
    }
}
