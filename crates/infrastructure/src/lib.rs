//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod guacamole_gateway_client;
mod json_file_deploy_lock_repository;
mod jsonl_audit_log_repository;
mod openapi_catalog_source;
mod shell_command_runner;

pub use guacamole_gateway_client::{GuacamoleGatewayClient, GuacamoleSettings};
pub use json_file_deploy_lock_repository::JsonFileDeployLockRepository;
pub use jsonl_audit_log_repository::JsonlAuditLogRepository;
pub use openapi_catalog_source::OpenApiCatalogSource;
pub use shell_command_runner::ShellCommandRunner;
