use opsgate_application::{CommandOutput, ConnectResolution};
use opsgate_domain::{ConnectParams, OperationDescriptor};
use serde::Serialize;
use ts_rs::TS;

/// Result of dispatching a non-connect operation.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/action-response.ts"
)]
pub struct ActionResponse {
    pub dispatch_id: String,
    /// `mock`, `live` or `blocked`.
    pub mode: String,
    pub path: String,
    pub command: String,
    pub provider: String,
    pub category: String,
    pub output: Option<String>,
    pub returncode: Option<i32>,
    #[ts(type = "number | null")]
    pub duration_ms: Option<u64>,
    pub destructive: bool,
    pub idempotent: bool,
}

impl ActionResponse {
    /// Describes an operation without any execution result.
    #[must_use]
    pub fn describe(dispatch_id: String, mode: &str, operation: &OperationDescriptor) -> Self {
        Self {
            dispatch_id,
            mode: mode.to_owned(),
            path: operation.path(),
            command: operation.command().to_owned(),
            provider: operation.provider().to_owned(),
            category: operation.category().as_str().to_owned(),
            output: None,
            returncode: None,
            duration_ms: None,
            destructive: operation.destructive(),
            idempotent: operation.idempotent(),
        }
    }

    /// Attaches an explanatory message as output.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.output = Some(message.into());
        self
    }

    /// Attaches a command result.
    #[must_use]
    pub fn with_output(mut self, output: &CommandOutput) -> Self {
        self.output = Some(output.combined_output().to_owned());
        self.returncode = Some(output.returncode);
        self.duration_ms = Some(output.duration_ms);
        self
    }
}

/// Result of dispatching a connect-category operation.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/connect-response.ts"
)]
pub struct ConnectResponse {
    pub dispatch_id: String,
    /// `mock`, `live` or `connect`.
    pub mode: String,
    pub path: String,
    pub command: String,
    pub provider: String,
    /// `ping`, `ssh`, `vnc` or `unsupported`.
    pub protocol: String,
    pub client_url: Option<String>,
    pub connection_id: Option<String>,
    pub output: Option<String>,
    pub returncode: Option<i32>,
    #[ts(type = "number | null")]
    pub duration_ms: Option<u64>,
}

impl ConnectResponse {
    /// Builds the response for one resolved connect dispatch.
    #[must_use]
    pub fn from_resolution(
        dispatch_id: String,
        operation: &OperationDescriptor,
        params: &ConnectParams,
        resolution: ConnectResolution,
    ) -> Self {
        let mut response = Self {
            dispatch_id,
            mode: "mock".to_owned(),
            path: operation.path(),
            command: operation.command().to_owned(),
            provider: operation.provider().to_owned(),
            protocol: params.protocol.as_str().to_owned(),
            client_url: None,
            connection_id: None,
            output: None,
            returncode: None,
            duration_ms: None,
        };

        match resolution {
            ConnectResolution::Mock => {}
            ConnectResolution::Probe(output) => {
                response.mode = "live".to_owned();
                response.output = Some(output.combined_output().to_owned());
                response.returncode = Some(output.returncode);
                response.duration_ms = Some(output.duration_ms);
            }
            ConnectResolution::Unsupported => {
                response.output = Some(format!(
                    "Interactive protocol not supported: {}",
                    operation.command()
                ));
            }
            ConnectResolution::GatewayDisabled => {
                response.output = Some("Remote desktop gateway not configured".to_owned());
            }
            ConnectResolution::Session(session) => {
                response.mode = "connect".to_owned();
                response.client_url = Some(session.client_url);
                response.connection_id = Some(session.connection_id);
            }
        }

        response
    }
}
