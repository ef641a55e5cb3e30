use std::time::Duration;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use opsgate_core::AppError;
use opsgate_domain::AuditHistoryQuery;
use opsgate_domain::timestamp::from_epoch_seconds;

use crate::dto::{
    AcquireLockRequest, DriftReportResponse, GateReportResponse, HistoryQuery, HistoryResponse,
    LockAttemptResponse, LockStateResponse, ReleaseLockRequest, ResourcesRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn history_handler(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Json<HistoryResponse>> {
    let since = query
        .since
        .map(|seconds| {
            from_epoch_seconds(seconds)
                .ok_or_else(|| AppError::Validation(format!("invalid since value {seconds}")))
        })
        .transpose()?;
    let defaults = AuditHistoryQuery::default();

    let entries = state
        .audit_log_service
        .read_history(&AuditHistoryQuery {
            limit: query.limit.unwrap_or(defaults.limit),
            resource: query.resource.filter(|resource| !resource.is_empty()),
            since,
        })
        .await?;

    Ok(Json(HistoryResponse::from(entries)))
}

pub async fn clear_history_handler(State(state): State<AppState>) -> ApiResult<StatusCode> {
    state.audit_log_service.clear().await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn lock_status_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<LockStateResponse>> {
    let lock_state = state.deploy_lock_service.status().await?;
    Ok(Json(LockStateResponse::from(lock_state)))
}

pub async fn acquire_lock_handler(
    State(state): State<AppState>,
    Json(payload): Json<AcquireLockRequest>,
) -> ApiResult<(StatusCode, Json<LockAttemptResponse>)> {
    let attempt = state
        .deploy_lock_service
        .acquire(&payload.operator, Duration::from_secs(payload.ttl_seconds))
        .await?;
    let status = if attempt.granted {
        StatusCode::OK
    } else {
        StatusCode::CONFLICT
    };

    Ok((status, Json(LockAttemptResponse::acquire(attempt))))
}

/// A missing body force-releases the lock.
pub async fn release_lock_handler(
    State(state): State<AppState>,
    payload: Option<Json<ReleaseLockRequest>>,
) -> ApiResult<(StatusCode, Json<LockAttemptResponse>)> {
    let payload = payload.map(|Json(payload)| payload).unwrap_or_default();
    let operator = payload
        .operator
        .as_deref()
        .map(str::trim)
        .filter(|operator| !operator.is_empty());
    let attempt = state.deploy_lock_service.release(operator).await?;
    let status = if attempt.granted {
        StatusCode::OK
    } else {
        StatusCode::FORBIDDEN
    };

    Ok((status, Json(LockAttemptResponse::release(attempt, operator))))
}

pub async fn gate_check_handler(
    State(state): State<AppState>,
    Json(payload): Json<ResourcesRequest>,
) -> Json<GateReportResponse> {
    let report = state
        .health_gate_service
        .gate_check(&payload.resources)
        .await;
    Json(GateReportResponse::from(report))
}

pub async fn drift_check_handler(
    State(state): State<AppState>,
    Json(payload): Json<ResourcesRequest>,
) -> Json<DriftReportResponse> {
    let report = state
        .health_gate_service
        .drift_check(&payload.resources)
        .await;
    Json(DriftReportResponse::from(report))
}

#[cfg(test)]
mod tests;
