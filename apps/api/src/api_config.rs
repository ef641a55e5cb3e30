use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use ipnet::IpNet;
use opsgate_core::AppError;
use tracing_subscriber::EnvFilter;

const DEFAULT_TRUSTED_SUBNET: &str = "198.51.100.0/24";

/// Remote desktop gateway credentials.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub url: String,
    pub username: String,
    pub password: String,
}

/// Runtime configuration read from the environment.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub api_host: String,
    pub api_port: u16,
    pub catalog_path: PathBuf,
    pub catalog_reload_interval: Duration,
    pub api_token: Option<String>,
    pub trusted_subnet: IpNet,
    pub trusted_proxy_ip: Option<IpAddr>,
    pub gateway: Option<GatewayConfig>,
    pub ssh_key_path: PathBuf,
    pub deploy_log_path: PathBuf,
    pub deploy_lock_path: PathBuf,
    pub default_timeout: Duration,
    pub admin_timeout: Duration,
    pub monitor_timeout: Duration,
    pub cors_origins: Vec<String>,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let api_port = parse_env_or("API_PORT", 8080_u16)?;

        let catalog_path = path_env_or("CATALOG_PATH", "/app/catalogue/openapi.json");
        let catalog_reload_interval =
            positive_seconds_env_or("CATALOG_RELOAD_INTERVAL_SECONDS", 30)?;

        let api_token = optional_non_empty_env("API_TOKEN");
        let trusted_subnet = optional_non_empty_env("TRUSTED_SUBNET")
            .unwrap_or_else(|| DEFAULT_TRUSTED_SUBNET.to_owned());
        let trusted_subnet = IpNet::from_str(trusted_subnet.trim()).map_err(|error| {
            AppError::Validation(format!("invalid TRUSTED_SUBNET '{trusted_subnet}': {error}"))
        })?;
        let trusted_proxy_ip = optional_non_empty_env("TRUSTED_PROXY_IP")
            .map(|value| {
                IpAddr::from_str(value.trim()).map_err(|error| {
                    AppError::Validation(format!("invalid TRUSTED_PROXY_IP '{value}': {error}"))
                })
            })
            .transpose()?;

        let gateway = match (
            optional_non_empty_env("GUACAMOLE_URL"),
            optional_non_empty_env("GUACAMOLE_USERNAME"),
        ) {
            (Some(url), Some(username)) => Some(GatewayConfig {
                url,
                username,
                password: env::var("GUACAMOLE_PASSWORD").unwrap_or_default(),
            }),
            _ => None,
        };

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_owned())
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_owned)
            .collect();

        Ok(Self {
            api_host,
            api_port,
            catalog_path,
            catalog_reload_interval,
            api_token,
            trusted_subnet,
            trusted_proxy_ip,
            gateway,
            ssh_key_path: path_env_or("SSH_KEY_PATH", "/app/secrets/id_ed25519"),
            deploy_log_path: path_env_or("DEPLOY_LOG_PATH", "/app/data/deploy.jsonl"),
            deploy_lock_path: path_env_or("DEPLOY_LOCK_PATH", "/app/data/deploy.lock.json"),
            default_timeout: positive_seconds_env_or("DEFAULT_TIMEOUT_SECONDS", 30)?,
            admin_timeout: positive_seconds_env_or("ADMIN_TIMEOUT_SECONDS", 120)?,
            monitor_timeout: positive_seconds_env_or("MONITOR_TIMEOUT_SECONDS", 15)?,
            cors_origins,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn optional_non_empty_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn path_env_or(name: &str, default: &str) -> PathBuf {
    PathBuf::from(optional_non_empty_env(name).unwrap_or_else(|| default.to_owned()))
}

fn parse_env_or<T>(name: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match optional_non_empty_env(name) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|error| AppError::Validation(format!("invalid {name} '{value}': {error}"))),
        None => Ok(default),
    }
}

fn positive_seconds_env_or(name: &str, default: u64) -> Result<Duration, AppError> {
    let seconds = parse_env_or(name, default)?;
    if seconds == 0 {
        return Err(AppError::Validation(format!(
            "{name} must be greater than zero"
        )));
    }

    Ok(Duration::from_secs(seconds))
}
