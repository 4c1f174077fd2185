//! Error types for storefront

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// One replica's reason for failing a dispatch attempt.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ReplicaFailure {
    pub endpoint: String,
    pub error: String,
}

#[derive(Error, Debug)]
pub enum Error {
    // === Domain Errors ===
    #[error("{0}")]
    NotFound(String),

    #[error("Out of stock")]
    OutOfStock,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // === Replica Errors ===
    #[error("All replicas failed: {}", format_failures(.0))]
    AllReplicasFailed(Vec<ReplicaFailure>),

    /// A replica answered; its status and message are passed through verbatim.
    #[error("{message}")]
    Upstream { status: u16, message: String },

    // === Network Errors ===
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Operation timeout: {0}")]
    Timeout(String),

    // === Storage Errors ===
    #[error("Persistence failure: {0}")]
    Persistence(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Config Errors ===
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // === Generic ===
    #[error("Internal error: {0}")]
    Internal(String),
}

fn format_failures(failures: &[ReplicaFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{} ({})", f.endpoint, f.error))
        .collect::<Vec<_>>()
        .join(", ")
}

impl Error {
    /// Should the replica set move on to the next candidate?
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Timeout(_) | Error::ConnectionFailed(_) => true,
            Error::Upstream { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Convert to HTTP status code
    pub fn to_http_status(&self) -> StatusCode {
        match self {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::OutOfStock | Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Error::AllReplicasFailed(_) | Error::ConnectionFailed(_) | Error::Timeout(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Error::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Human-readable message for clients. Unexpected faults never leak detail.
    pub fn client_message(&self) -> String {
        match self {
            Error::Io(_) | Error::Json(_) | Error::Internal(_) | Error::InvalidConfig(_) => {
                "Internal server error".to_string()
            }
            Error::AllReplicasFailed(_) => "Service unavailable: all replicas failed".to_string(),
            Error::Persistence(_) => "Error updating backing store".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.to_http_status();
        if status.is_server_error() {
            tracing::error!(status = %status.as_u16(), error = %self, "Request failed");
        }
        let body = match &self {
            Error::AllReplicasFailed(failures) => json!({
                "error": self.client_message(),
                "replicas": failures,
            }),
            _ => json!({ "error": self.client_message() }),
        };
        (status, axum::Json(body)).into_response()
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Error::Timeout(e.to_string())
        } else if e.is_decode() {
            Error::Internal(format!("Malformed upstream body: {}", e))
        } else {
            Error::ConnectionFailed(e.to_string())
        }
    }
}

impl From<config::ConfigError> for Error {
    fn from(e: config::ConfigError) -> Self {
        Error::InvalidConfig(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            Error::NotFound("Book not found".into()).to_http_status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(Error::OutOfStock.to_http_status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            Error::AllReplicasFailed(vec![]).to_http_status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            Error::Upstream {
                status: 409,
                message: "conflict".into()
            }
            .to_http_status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            Error::Persistence("disk full".into()).to_http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_retryable() {
        assert!(Error::ConnectionFailed("refused".into()).is_retryable());
        assert!(Error::Timeout("2s".into()).is_retryable());
        assert!(Error::Upstream {
            status: 502,
            message: "bad gateway".into()
        }
        .is_retryable());
        assert!(!Error::Upstream {
            status: 404,
            message: "Book not found".into()
        }
        .is_retryable());
        assert!(!Error::OutOfStock.is_retryable());
    }

    #[test]
    fn test_internal_detail_is_hidden() {
        let err = Error::Internal("lock poisoned at inventory.rs:42".into());
        assert_eq!(err.client_message(), "Internal server error");

        let err = Error::AllReplicasFailed(vec![ReplicaFailure {
            endpoint: "http://a".into(),
            error: "refused".into(),
        }]);
        assert!(err.to_string().contains("http://a (refused)"));
    }
}
