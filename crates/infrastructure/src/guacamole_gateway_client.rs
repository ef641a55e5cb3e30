use std::path::PathBuf;

use async_trait::async_trait;
use opsgate_application::{RemoteDesktopGateway, RemoteSession};
use opsgate_core::{AppError, AppResult};
use opsgate_domain::{ConnectParams, ConnectProtocol};
use reqwest::{StatusCode, header};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::{info, warn};
use url::Url;

const CONNECTION_NAME_PREFIX: &str = "opsgate";
const DEFAULT_DATA_SOURCE: &str = "default";

/// Connection settings for an Apache Guacamole server.
#[derive(Debug, Clone)]
pub struct GuacamoleSettings {
    /// Base URL of the Guacamole web application.
    pub base_url: String,
    /// Service account name.
    pub username: String,
    /// Service account password.
    pub password: String,
    /// Private key handed to SSH connections when the file exists.
    pub ssh_key_path: PathBuf,
}

#[derive(Debug, Clone)]
struct GuacamoleSession {
    token: String,
    data_source: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    auth_token: String,
    #[serde(default)]
    available_data_sources: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConnectionRequest {
    name: String,
    parent_identifier: &'static str,
    protocol: &'static str,
    parameters: Map<String, Value>,
    attributes: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct ConnectionResponse {
    identifier: String,
}

/// Remote desktop gateway backed by the Guacamole REST API.
///
/// The auth token is cached and refreshed once when the server rejects it.
pub struct GuacamoleGatewayClient {
    http_client: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
    ssh_key_path: PathBuf,
    session: Mutex<Option<GuacamoleSession>>,
}

impl GuacamoleGatewayClient {
    /// Creates a client, validating the base URL.
    pub fn new(http_client: reqwest::Client, settings: GuacamoleSettings) -> AppResult<Self> {
        let base_url = settings.base_url.trim_end_matches('/').to_owned();
        Url::parse(&base_url).map_err(|error| {
            AppError::Validation(format!("invalid Guacamole URL '{base_url}': {error}"))
        })?;

        Ok(Self {
            http_client,
            base_url,
            username: settings.username,
            password: settings.password,
            ssh_key_path: settings.ssh_key_path,
            session: Mutex::new(None),
        })
    }

    fn endpoint(&self, path: &str, token: Option<&str>) -> AppResult<Url> {
        let mut url = Url::parse(&format!("{}/api/{path}", self.base_url)).map_err(|error| {
            AppError::GatewayUnavailable(format!("invalid Guacamole endpoint '{path}': {error}"))
        })?;
        if let Some(token) = token {
            url.query_pairs_mut().append_pair("token", token);
        }
        Ok(url)
    }

    async fn authenticate(&self) -> AppResult<GuacamoleSession> {
        let form = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("username", &self.username)
            .append_pair("password", &self.password)
            .finish();

        let response = self
            .http_client
            .post(self.endpoint("tokens", None)?)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(form)
            .send()
            .await
            .map_err(transport_error)?;
        let response = require_success(response, "authentication")?;
        let tokens: TokenResponse = response.json().await.map_err(|error| {
            AppError::GatewayUnavailable(format!("invalid Guacamole token response: {error}"))
        })?;

        let session = GuacamoleSession {
            token: tokens.auth_token,
            data_source: tokens
                .available_data_sources
                .into_iter()
                .next()
                .unwrap_or_else(|| DEFAULT_DATA_SOURCE.to_owned()),
        };
        *self.session.lock().await = Some(session.clone());
        info!(data_source = %session.data_source, "authenticated with Guacamole");
        Ok(session)
    }

    async fn current_session(&self) -> AppResult<GuacamoleSession> {
        if let Some(session) = self.session.lock().await.clone() {
            return Ok(session);
        }
        self.authenticate().await
    }

    async fn post_connection(
        &self,
        session: &GuacamoleSession,
        body: &ConnectionRequest,
    ) -> AppResult<reqwest::Response> {
        let url = self.endpoint(
            &format!("session/data/{}/connections", session.data_source),
            Some(&session.token),
        )?;
        self.http_client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(transport_error)
    }

    async fn connection_parameters(&self, params: &ConnectParams) -> Map<String, Value> {
        let mut parameters = Map::new();
        parameters.insert("hostname".to_owned(), Value::from(params.hostname.clone()));
        parameters.insert("port".to_owned(), Value::from(params.port.to_string()));

        if params.gateway_protocol() == ConnectProtocol::Ssh {
            if let Some(username) = &params.username {
                parameters.insert("username".to_owned(), Value::from(username.clone()));
            }
            match tokio::fs::read_to_string(&self.ssh_key_path).await {
                Ok(key) => {
                    parameters.insert("private-key".to_owned(), Value::from(key));
                }
                Err(error) if error.kind() == std::io::ErrorKind::NotFound => {}
                Err(error) => {
                    warn!(
                        path = %self.ssh_key_path.display(),
                        error = %error,
                        "failed to read SSH key for Guacamole connection"
                    );
                }
            }
            if let Some(command) = &params.remote_command {
                parameters.insert("command".to_owned(), Value::from(command.clone()));
            }
        }

        parameters
    }

    fn client_url(&self, connection_id: &str, session: &GuacamoleSession) -> String {
        let client_id = format!("{connection_id}\0c\0{}", session.data_source);
        let encoded_id: String = url::form_urlencoded::byte_serialize(client_id.as_bytes()).collect();
        let encoded_token: String =
            url::form_urlencoded::byte_serialize(session.token.as_bytes()).collect();
        format!("{}/#/client/{encoded_id}?token={encoded_token}", self.base_url)
    }
}

fn transport_error(error: reqwest::Error) -> AppError {
    AppError::GatewayUnavailable(format!("Guacamole request failed: {error}"))
}

fn require_success(response: reqwest::Response, operation: &str) -> AppResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(AppError::GatewayUnavailable(format!(
            "Guacamole {operation} failed with status {status}"
        )))
    }
}

#[async_trait]
impl RemoteDesktopGateway for GuacamoleGatewayClient {
    async fn create_connection(&self, params: &ConnectParams) -> AppResult<RemoteSession> {
        let protocol = params.gateway_protocol();
        let mut attributes = Map::new();
        attributes.insert("max-connections".to_owned(), Value::from("1"));
        attributes.insert("max-connections-per-user".to_owned(), Value::from("1"));
        let body = ConnectionRequest {
            name: format!(
                "{CONNECTION_NAME_PREFIX}-{}-{}",
                params.hostname,
                params.username.as_deref().unwrap_or(protocol.as_str())
            ),
            parent_identifier: "ROOT",
            protocol: protocol.as_str(),
            parameters: self.connection_parameters(params).await,
            attributes,
        };

        let mut session = self.current_session().await?;
        let mut response = self.post_connection(&session, &body).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            warn!("Guacamole token rejected, re-authenticating");
            session = self.authenticate().await?;
            response = self.post_connection(&session, &body).await?;
        }

        let response = require_success(response, "connection create")?;
        let created: ConnectionResponse = response.json().await.map_err(|error| {
            AppError::GatewayUnavailable(format!("invalid Guacamole connection response: {error}"))
        })?;

        info!(
            connection_id = %created.identifier,
            protocol = protocol.as_str(),
            hostname = %params.hostname,
            "created Guacamole connection"
        );
        Ok(RemoteSession {
            client_url: self.client_url(&created.identifier, &session),
            connection_id: created.identifier,
        })
    }

    async fn delete_connection(&self, connection_id: &str) -> AppResult<()> {
        let session = self.current_session().await?;
        let url = self.endpoint(
            &format!(
                "session/data/{}/connections/{connection_id}",
                session.data_source
            ),
            Some(&session.token),
        )?;

        let response = self
            .http_client
            .delete(url)
            .send()
            .await
            .map_err(transport_error)?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        require_success(response, "connection delete")?;

        info!(connection_id, "deleted Guacamole connection");
        Ok(())
    }
}
