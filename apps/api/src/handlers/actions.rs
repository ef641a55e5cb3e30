use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use opsgate_application::{ActionRequest, DispatchOutcome};
use opsgate_core::AppError;
use opsgate_domain::{ExecutionMode, RouteKey};
use tracing::{Instrument, info_span};
use uuid::Uuid;

use crate::dto::{ActionResponse, ConnectResponse};
use crate::error::ApiResult;
use crate::middleware::header_str;
use crate::state::AppState;

const OPERATOR_HEADER: &str = "x-operator";
const CONFIRM_DESTRUCTIVE_HEADER: &str = "x-confirm-destructive";

pub async fn dispatch_action_handler(
    State(state): State<AppState>,
    Extension(mode): Extension<ExecutionMode>,
    Path((resource, provider, action)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    // A malformed segment can never name a catalog entry.
    let path = format!("/resources/{resource}/{provider}/{action}");
    let key = RouteKey::new(resource, provider, action)
        .map_err(|_| AppError::NotFound(format!("unknown action '{path}'")))?;
    let dispatch_id = Uuid::new_v4().to_string();
    let request = ActionRequest {
        key,
        mode,
        operator: header_str(&headers, OPERATOR_HEADER)
            .map(str::trim)
            .filter(|operator| !operator.is_empty())
            .map(str::to_owned),
        confirm_destructive: header_str(&headers, CONFIRM_DESTRUCTIVE_HEADER)
            .is_some_and(|value| value.trim().eq_ignore_ascii_case("yes")),
    };

    let span = info_span!("dispatch", %dispatch_id, path = %request.key, mode = mode.as_str());
    let dispatched = state
        .dispatch_service
        .dispatch(request)
        .instrument(span)
        .await?;
    let operation = &dispatched.operation;

    let response = match dispatched.outcome {
        DispatchOutcome::Mock => {
            Json(ActionResponse::describe(dispatch_id, "mock", operation)).into_response()
        }
        DispatchOutcome::Locked { holder } => (
            StatusCode::LOCKED,
            Json(
                ActionResponse::describe(dispatch_id, "blocked", operation)
                    .with_message(format!("Deploy lock held by {holder}")),
            ),
        )
            .into_response(),
        DispatchOutcome::ConfirmationRequired => (
            StatusCode::FORBIDDEN,
            Json(
                ActionResponse::describe(dispatch_id, "blocked", operation).with_message(
                    "Destructive action requires X-Confirm-Destructive: yes header",
                ),
            ),
        )
            .into_response(),
        DispatchOutcome::Executed(output) => Json(
            ActionResponse::describe(dispatch_id, "live", operation).with_output(&output),
        )
        .into_response(),
        DispatchOutcome::Connect { params, resolution } => Json(
            ConnectResponse::from_resolution(dispatch_id, operation, &params, resolution),
        )
        .into_response(),
    };

    Ok(response)
}

#[cfg(test)]
mod tests;
