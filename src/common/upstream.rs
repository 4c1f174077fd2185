//! HTTP calls to replicas.
//!
//! Replicas answer with JSON bodies. A 5xx answer is turned into a retryable
//! [`Error::Upstream`] so the replica set moves on; every other status comes
//! back as an [`UpstreamResponse`] for the caller to interpret or pass through.

use crate::common::{Error, ReplicaSet, Result};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use reqwest::Method;
use serde_json::Value;
use std::time::Duration;

/// A replica's answer, forwarded verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl UpstreamResponse {
    pub fn ok(body: Value) -> Self {
        Self {
            status: StatusCode::OK,
            body,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// The body on 2xx, otherwise the replica's error passed through.
    pub fn into_result(self) -> Result<Value> {
        if self.is_success() {
            Ok(self.body)
        } else {
            Err(Error::Upstream {
                status: self.status.as_u16(),
                message: error_message(&self.body),
            })
        }
    }
}

impl IntoResponse for UpstreamResponse {
    fn into_response(self) -> Response {
        (self.status, axum::Json(self.body)).into_response()
    }
}

/// Extract `{"error": ...}` from a replica body.
pub fn error_message(body: &Value) -> String {
    match body.get("error") {
        Some(Value::String(msg)) => msg.clone(),
        _ => match body {
            Value::String(text) if !text.is_empty() => text.clone(),
            _ => "Upstream error".to_string(),
        },
    }
}

/// Build the HTTP client shared by a service for all outbound calls.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .build()
        .map_err(|e| Error::InvalidConfig(format!("HTTP client: {}", e)))
}

#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
}

impl UpstreamClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
        })
    }

    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// One request against one endpoint.
    pub async fn send(
        &self,
        endpoint: &str,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<UpstreamResponse> {
        let url = format!("{}{}", endpoint.trim_end_matches('/'), path);
        let mut request = self.client.request(method, &url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        if status.is_server_error() {
            return Err(Error::Upstream {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        Ok(UpstreamResponse { status, body })
    }

    /// Select once from `replicas` and send with failover.
    pub async fn forward(
        &self,
        replicas: &ReplicaSet,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<UpstreamResponse> {
        replicas
            .call(|endpoint| {
                let method = method.clone();
                async move { self.send(&endpoint, method, path, body).await }
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_message() {
        assert_eq!(error_message(&json!({"error": "Out of stock"})), "Out of stock");
        assert_eq!(error_message(&json!("plain text")), "plain text");
        assert_eq!(error_message(&Value::Null), "Upstream error");
    }

    #[test]
    fn test_into_result_passes_status_through() {
        let response = UpstreamResponse {
            status: StatusCode::BAD_REQUEST,
            body: json!({"error": "Out of stock"}),
        };
        match response.into_result() {
            Err(Error::Upstream { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "Out of stock");
            }
            other => panic!("unexpected {:?}", other),
        }

        let body = UpstreamResponse::ok(json!({"quantity": 2}))
            .into_result()
            .unwrap();
        assert_eq!(body["quantity"], 2);
    }
}
