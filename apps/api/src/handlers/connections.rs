use axum::extract::{Path, State};
use axum::http::StatusCode;

use crate::error::ApiResult;
use crate::state::AppState;

pub async fn delete_connection_handler(
    State(state): State<AppState>,
    Path(connection_id): Path<String>,
) -> ApiResult<StatusCode> {
    state
        .dispatch_service
        .delete_connection(&connection_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
