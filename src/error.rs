//! Error types for the order cache service
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Service Error Enum ==
/// Unified error type for the order cache service.
///
/// The cache engine itself never produces errors; every variant here
/// originates from the store gateway, the event stream, or startup
/// configuration.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Order does not exist in the persistent store
    #[error("Order not found: {0}")]
    NotFound(String),

    /// Store or stream momentarily unavailable
    #[error("Temporarily unavailable: {0}")]
    Transient(String),

    /// Undecodable stream event payload
    #[error("Malformed event: {0}")]
    MalformedEvent(String),

    /// Invalid configuration, fatal at startup only
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServiceError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ServiceError::Transient(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
            ServiceError::MalformedEvent(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ServiceError::Config(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            ServiceError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the order cache service.
pub type Result<T> = std::result::Result<T, ServiceError>;
