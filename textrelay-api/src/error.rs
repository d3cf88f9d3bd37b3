//! API error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Errors starting or running the server.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Failed to bind API server to {address}: {source}")]
    BindError {
        address: String,
        source: std::io::Error,
    },

    #[error("API server error: {0}")]
    ServerError(String),
}

/// A plain-text error reply from a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestError {
    pub status: StatusCode,
    pub message: String,
}

impl RequestError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn invalid_body() -> Self {
        Self::bad_request("Invalid request body")
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        (self.status, self.message).into_response()
    }
}
