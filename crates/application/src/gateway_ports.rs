mod audit_log;
mod catalog;
mod command_runner;
mod deploy_lock;
mod remote_desktop;

pub use audit_log::AuditLogRepository;
pub use catalog::CatalogSource;
pub use command_runner::{CommandOutput, CommandRunner};
pub use deploy_lock::DeployLockRepository;
pub use remote_desktop::{RemoteDesktopGateway, RemoteSession};
