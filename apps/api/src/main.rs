//! Opsgate API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod api_services;
mod catalog_reload;
mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use std::net::SocketAddr;

use opsgate_core::AppError;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::api_config::{ApiConfig, init_tracing};
use crate::api_router::build_router;
use crate::api_services::build_app_state;
use crate::catalog_reload::spawn_catalog_reload;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::load()?;
    let app_state = build_app_state(&config)?;

    app_state.catalog_service.load_initial().await;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let reload_task = spawn_catalog_reload(
        app_state.catalog_service.clone(),
        config.catalog_reload_interval,
        shutdown_rx,
    );

    let app = build_router(app_state, &config.cors_origins)?;
    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind {address}: {error}")))?;

    info!(%address, "opsgate api listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .map_err(|error| AppError::Internal(format!("server error: {error}")))?;

    let _ = shutdown_tx.send(true);
    if let Err(error) = reload_task.await {
        warn!(error = %error, "catalog reload task ended abnormally");
    }
    info!("opsgate api stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            warn!(error = %error, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                warn!(error = %error, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("shutdown signal received");
}
