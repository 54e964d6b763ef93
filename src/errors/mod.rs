//! Error handling module for the article processor.
//!
//! One error type covers the feed client, the store and the HTTP layer. Each
//! variant knows its HTTP status code and renders the JSON error envelope.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Error codes as constants to avoid stringly-typed errors.
pub mod codes {
    pub const FETCH_ERROR: &str = "FETCH_ERROR";
    pub const DECODE_ERROR: &str = "DECODE_ERROR";
    pub const PARSE_ERROR: &str = "PARSE_ERROR";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const STORE_ERROR: &str = "STORE_ERROR";
    pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}

/// Status value carried by every error envelope.
pub const STATUS_ERROR: &str = "error";

/// Application error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Upstream feed could not be reached or answered with a failure status
    #[error("fetch error: {0}")]
    Fetch(String),
    /// Upstream payload is not valid XML
    #[error("decode error: {0}")]
    Decode(String),
    /// A field did not match its expected format
    #[error("parse error: {0}")]
    Parse(String),
    /// Requested article is absent upstream or in the store, or the id is malformed
    #[error("not found: {0}")]
    NotFound(String),
    /// Database operation failed or timed out
    #[error("store error: {0}")]
    Store(String),
    /// Invalid startup configuration
    #[error("config error: {0}")]
    Config(String),
    /// Internal server error
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Fetch(_)
            | AppError::Decode(_)
            | AppError::Parse(_)
            | AppError::Store(_)
            | AppError::Config(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Fetch(_) => codes::FETCH_ERROR,
            AppError::Decode(_) => codes::DECODE_ERROR,
            AppError::Parse(_) => codes::PARSE_ERROR,
            AppError::NotFound(_) => codes::NOT_FOUND,
            AppError::Store(_) => codes::STORE_ERROR,
            AppError::Config(_) => codes::CONFIG_ERROR,
            AppError::Internal(_) => codes::INTERNAL_ERROR,
        }
    }

    /// Get the error message.
    pub fn message(&self) -> String {
        match self {
            AppError::Fetch(msg)
            | AppError::Decode(msg)
            | AppError::Parse(msg)
            | AppError::NotFound(msg)
            | AppError::Store(msg)
            | AppError::Config(msg)
            | AppError::Internal(msg) => msg.clone(),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Database error: {:?}", err);
        AppError::Store(format!("Database error: {}", err))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Fetch(format!("Request failed: {}", err))
    }
}

impl From<roxmltree::Error> for AppError {
    fn from(err: roxmltree::Error) -> Self {
        AppError::Decode(format!("Malformed XML: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(format!("JSON error: {}", err))
    }
}

/// Error details in the response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
}

/// Error response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub error: ErrorDetails,
}

impl ErrorResponse {
    pub fn new(error: &AppError) -> Self {
        Self {
            status: STATUS_ERROR.to_string(),
            error: ErrorDetails {
                code: error.error_code().to_string(),
                message: error.message(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }
        (status, Json(ErrorResponse::new(&self))).into_response()
    }
}
