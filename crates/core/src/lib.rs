//! Shared primitives for all Rust crates in Opsgate.

#![forbid(unsafe_code)]

/// Bearer credential primitives shared across services.
pub mod credential;

use thiserror::Error;

pub use credential::ApiCredential;

/// Result type used across Opsgate crates.
pub type AppResult<T> = Result<T, AppError>;

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Caller is missing a valid credential.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The remote desktop gateway failed or is unreachable.
    #[error("gateway unavailable: {0}")]
    GatewayUnavailable(String),

    /// The operation catalog could not be read or parsed.
    #[error("catalog load error: {0}")]
    CatalogLoad(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}
