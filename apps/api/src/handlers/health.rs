use axum::Json;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use opsgate_domain::ExecutionMode;

use crate::dto::{CatalogInfoResponse, HealthResponse, ServiceDescriptorResponse};
use crate::state::AppState;

pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let catalog = state.catalog_service.snapshot().await;
    Json(HealthResponse::from_catalog("ok", &catalog))
}

/// Ready once at least one operation is loaded.
pub async fn readiness_handler(
    State(state): State<AppState>,
) -> (StatusCode, Json<HealthResponse>) {
    let catalog = state.catalog_service.snapshot().await;
    if catalog.is_empty() {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse::from_catalog("not_ready", &catalog)),
        );
    }

    (
        StatusCode::OK,
        Json(HealthResponse::from_catalog("ok", &catalog)),
    )
}

pub async fn catalog_info_handler(State(state): State<AppState>) -> Json<CatalogInfoResponse> {
    let catalog = state.catalog_service.snapshot().await;
    Json(CatalogInfoResponse::from(catalog.as_ref()))
}

pub async fn service_descriptor_handler(
    State(state): State<AppState>,
    Extension(mode): Extension<ExecutionMode>,
) -> Json<ServiceDescriptorResponse> {
    Json(ServiceDescriptorResponse {
        service: "opsgate",
        version: env!("CARGO_PKG_VERSION"),
        mode: mode.as_str().to_owned(),
        health: "/api/v1/healthz",
        catalog: "/api/v1/spec-info",
        gateway_enabled: state.dispatch_service.gateway_enabled(),
    })
}
