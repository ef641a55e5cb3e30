//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod audit;
mod connect;
mod deploy_lock;
mod execution;
mod operation;
pub mod timestamp;

pub use audit::{
    AUDIT_OUTPUT_LIMIT, AuditEntry, AuditHistoryQuery, AuditMode, truncate_chars,
    truncate_output,
};
pub use connect::{
    ConnectParams, ConnectProtocol, DEFAULT_SSH_PORT, DEFAULT_VNC_PORT, parse_connect_command,
};
pub use deploy_lock::{DEFAULT_LOCK_TTL_SECONDS, LockState};
pub use execution::ExecutionMode;
pub use operation::{
    OperationCatalog, OperationCategory, OperationDescriptor, OperationDescriptorInput, RouteKey,
};
