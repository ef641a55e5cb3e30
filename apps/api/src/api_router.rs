use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{delete, get, post};
use opsgate_core::AppError;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{handlers, middleware};

mod cors;

use cors::build_cors_layer;

pub fn build_router(app_state: AppState, cors_origins: &[String]) -> Result<Router, AppError> {
    let write_guard = from_fn_with_state(app_state.clone(), middleware::require_write_credential);

    let api_routes = Router::new()
        .route("/healthz", get(handlers::health::health_handler))
        .route("/readyz", get(handlers::health::readiness_handler))
        .route("/spec-info", get(handlers::health::catalog_info_handler))
        .route(
            "/resources/{resource}/{provider}/{action}",
            post(handlers::actions::dispatch_action_handler),
        )
        .route(
            "/deploy/history",
            delete(handlers::deploy::clear_history_handler)
                .route_layer(write_guard.clone())
                .get(handlers::deploy::history_handler),
        )
        .route(
            "/deploy/lock",
            post(handlers::deploy::acquire_lock_handler)
                .delete(handlers::deploy::release_lock_handler)
                .route_layer(write_guard.clone())
                .get(handlers::deploy::lock_status_handler),
        )
        .route(
            "/deploy/gate/check",
            post(handlers::deploy::gate_check_handler).route_layer(write_guard.clone()),
        )
        .route(
            "/deploy/drift/check",
            post(handlers::deploy::drift_check_handler).route_layer(write_guard.clone()),
        )
        .route(
            "/connections/{connection_id}",
            delete(handlers::connections::delete_connection_handler).route_layer(write_guard),
        );

    Ok(Router::new()
        .route("/", get(handlers::health::service_descriptor_handler))
        .nest("/api/v1", api_routes)
        .layer(from_fn_with_state(
            app_state.clone(),
            middleware::resolve_execution_mode,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(cors_origins)?)
        .with_state(app_state))
}
