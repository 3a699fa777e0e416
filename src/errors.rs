use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::clients::KlarnaApiError;

/// Error body returned by every HTTP endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// HTTP status category (e.g., "Not Found", "Bad Gateway")
    pub error: String,
    /// Human-readable error description
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// ISO 8601 timestamp when error occurred
    pub timestamp: String,
}

/// How a caller should treat a failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorSeverity {
    /// The checkout can continue without a Klarna session (retry later or hide the option).
    Recoverable,
    /// The merchant setup or the cart is broken; retrying will not help.
    Fatal,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Unknown country: {0}")]
    UnknownCountry(String),

    #[error("Invalid session: {0}")]
    InvalidSession(String),

    #[error("Klarna API error: {0}")]
    ExternalServiceError(#[from] KlarnaApiError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Store error: {0}")]
    StoreError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ServiceError {
    /// Returns the HTTP status code for this error.
    /// This is the single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ConfigurationError(_) | Self::StoreError(_) | Self::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::UnknownCountry(_) | Self::InvalidSession(_) | Self::ValidationError(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::ExternalServiceError(KlarnaApiError::NotFound(_)) | Self::NotFound(_) => {
                StatusCode::NOT_FOUND
            }
            Self::ExternalServiceError(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Returns the error message suitable for HTTP responses.
    /// Internal errors return generic messages to avoid leaking implementation details.
    pub fn response_message(&self) -> String {
        match self {
            Self::ConfigurationError(_) => "Payment method is misconfigured".to_string(),
            Self::StoreError(_) | Self::InternalError(_) => "Internal server error".to_string(),
            Self::ExternalServiceError(KlarnaApiError::Transport(_)) => {
                "Klarna is temporarily unreachable".to_string()
            }
            _ => self.to_string(),
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::ExternalServiceError(_) | Self::NotFound(_) | Self::StoreError(_) => {
                ErrorSeverity::Recoverable
            }
            Self::ConfigurationError(_)
            | Self::UnknownCountry(_)
            | Self::InvalidSession(_)
            | Self::ValidationError(_)
            | Self::InternalError(_) => ErrorSeverity::Fatal,
        }
    }

    pub fn is_recoverable(&self) -> bool {
        self.severity() == ErrorSeverity::Recoverable
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let err = ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message: self.response_message(),
            details: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (status, Json(err)).into_response()
    }
}
