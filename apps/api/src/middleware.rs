use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use opsgate_application::AccessRequest;
use opsgate_core::AppError;
use tracing::debug;

use crate::error::ApiResult;
use crate::state::AppState;

const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// Attaches the request's [`opsgate_domain::ExecutionMode`] as an extension.
///
/// Never rejects: unauthenticated or untrusted callers run in mock mode.
pub async fn resolve_execution_mode(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(address)| address.ip());
    let headers = request.headers();
    let access = AccessRequest {
        peer,
        forwarded_for: header_str(headers, FORWARDED_FOR_HEADER),
        authorization: header_str(headers, AUTHORIZATION.as_str()),
    };

    let mode = state.access_policy.resolve_mode(&access);
    debug!(
        client = ?state.access_policy.client_address(&access),
        mode = mode.as_str(),
        "execution mode resolved"
    );

    request.extensions_mut().insert(mode);
    next.run(request).await
}

/// Rejects state-changing deploy requests without the configured credential.
///
/// Independent of execution mode; fails closed when no credential is configured.
pub async fn require_write_credential(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    let authorization = header_str(request.headers(), AUTHORIZATION.as_str());
    if !state.access_policy.has_valid_credential(authorization) {
        return Err(AppError::Unauthorized("authentication required".to_owned()).into());
    }

    Ok(next.run(request).await)
}

pub(crate) fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}
