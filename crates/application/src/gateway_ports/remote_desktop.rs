use async_trait::async_trait;
use opsgate_core::AppResult;
use opsgate_domain::ConnectParams;

/// Ephemeral interactive session created on the remote desktop gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSession {
    /// Gateway connection identifier.
    pub connection_id: String,
    /// Browser URL that opens the session.
    pub client_url: String,
}

/// Port for the remote desktop gateway used for SSH and VNC hand-off.
#[async_trait]
pub trait RemoteDesktopGateway: Send + Sync {
    /// Creates an ephemeral connection for the intent.
    async fn create_connection(&self, params: &ConnectParams) -> AppResult<RemoteSession>;

    /// Deletes an ephemeral connection. Unknown identifiers are not an error.
    async fn delete_connection(&self, connection_id: &str) -> AppResult<()>;
}
