use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, HeaderValue, Method};
use opsgate_core::AppError;
use tower_http::cors::{AllowOrigin, CorsLayer};

pub(super) fn build_cors_layer(origins: &[String]) -> Result<CorsLayer, AppError> {
    let allow_origin = if origins.iter().any(|origin| origin == "*") {
        AllowOrigin::any()
    } else {
        let origins = origins
            .iter()
            .map(|origin| {
                HeaderValue::from_str(origin).map_err(|error| {
                    AppError::Validation(format!("invalid CORS origin '{origin}': {error}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        AllowOrigin::list(origins)
    };

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            AUTHORIZATION,
            CONTENT_TYPE,
            HeaderName::from_static("x-operator"),
            HeaderName::from_static("x-confirm-destructive"),
        ]))
}
