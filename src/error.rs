//! Error taxonomy shared by every storefront component.
//!
//! Each variant maps onto one HTTP status and a machine-readable code, so
//! handlers can return `Result<_, Error>` and let the `IntoResponse` impl
//! shape the reply. Storage detail is logged and never leaves the process.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// Bad input shape or values; recovered at the boundary as a 400.
    #[error("validation failed: {message}")]
    Validation {
        message: String,
        details: Option<serde_json::Value>,
    },

    /// Missing product, order, customer or cart line.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Insufficient stock at placement; the customer can retry with fresh
    /// quantities.
    #[error("insufficient stock for product {product_id}: requested {requested}, available {available}")]
    OutOfStock {
        product_id: Uuid,
        requested: u32,
        available: u32,
    },

    /// Order-number collision or a state the operation cannot proceed from;
    /// the caller should re-read and retry.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Missing or unknown identity.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but lacking privilege or ownership.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Underlying persistence failure.
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            details: None,
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Validation { .. } => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::OutOfStock { .. } => (StatusCode::BAD_REQUEST, "OUT_OF_STOCK"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
        }
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation {
            message: "request failed field validation".to_string(),
            details: serde_json::to_value(&errors).ok(),
        }
    }
}

/// JSON body returned by every failing endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Persistence detail stays in the logs.
        let message = match &self {
            Self::Storage(err) => {
                tracing::error!(error = %err, "storage failure");
                "unexpected storage failure".to_string()
            }
            other => other.to_string(),
        };

        let details = match self {
            Self::Validation { details, .. } => details,
            _ => None,
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details,
            },
        };
        (status, Json(body)).into_response()
    }
}
