mod actions;
mod catalog;
mod deploy;

pub use actions::{ActionResponse, ConnectResponse};
pub use catalog::{CatalogInfoResponse, HealthResponse, ServiceDescriptorResponse};
pub use deploy::{
    AcquireLockRequest, AuditEntryResponse, CheckResultResponse, DriftCheckResponse,
    DriftReportResponse, GateReportResponse, HistoryQuery, HistoryResponse, LockAttemptResponse,
    LockStateResponse, ReleaseLockRequest, ResourceDriftResponse, ResourceGateResponse,
    ResourcesRequest,
};
