//! Failure taxonomy for backend calls.
//!
//! # Design
//! Three transport-level kinds are distinguishable by variant, never by
//! message text: the server answered with a non-success status
//! (`Http`), the request never produced a response (`Network`), or the
//! caller's cancel signal fired first (`Cancelled`). Encoding the request
//! body and decoding a success payload get their own variants because
//! they happen outside the transport round-trip.
//!
//! Status classification on `HttpFailure` is derived from the raw code on
//! every call. Codes are not validated against a closed set, so any status
//! a third-party backend sends stays representable.

use std::error::Error as StdError;

use serde_json::Value;
use thiserror::Error;

use crate::http::HttpResponse;

/// Errors returned by the backend clients and the fetch functions built on
/// top of them.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server responded with a status outside the success set.
    #[error("API Error {}: {}", .0.status, .0.status_text)]
    Http(HttpFailure),

    /// The transport failed before any response was obtained.
    #[error("network request failed: {0}")]
    Network(#[from] NetworkFailure),

    /// The call's cancel signal fired (explicitly or by timeout).
    #[error("request was cancelled")]
    Cancelled,

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// A success payload could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),
}

/// The three transport-level failure kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Network,
    Cancelled,
    Http,
}

impl ApiError {
    /// Transport-level kind, or `None` for body encode/decode errors.
    pub fn kind(&self) -> Option<FailureKind> {
        match self {
            ApiError::Http(_) => Some(FailureKind::Http),
            ApiError::Network(_) => Some(FailureKind::Network),
            ApiError::Cancelled => Some(FailureKind::Cancelled),
            ApiError::SerializationError(_) | ApiError::DeserializationError(_) => None,
        }
    }

    pub fn as_http(&self) -> Option<&HttpFailure> {
        match self {
            ApiError::Http(failure) => Some(failure),
            _ => None,
        }
    }

    /// Status code of an `Http` failure. Other kinds never carry one.
    pub fn status(&self) -> Option<u16> {
        self.as_http().map(|f| f.status)
    }
}

impl From<HttpFailure> for ApiError {
    fn from(failure: HttpFailure) -> Self {
        ApiError::Http(failure)
    }
}

/// Detail of a non-success response.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpFailure {
    pub status: u16,
    pub status_text: String,
    /// Best-effort parsed body: JSON if it parses, the raw text otherwise,
    /// `Null` when the body is empty.
    pub body: Value,
}

impl HttpFailure {
    pub fn new(status: u16, status_text: impl Into<String>, body: Value) -> Self {
        Self {
            status,
            status_text: status_text.into(),
            body,
        }
    }

    /// Build the failure from whatever the server sent back.
    pub fn from_response(response: &HttpResponse) -> Self {
        Self::new(
            response.status,
            response.status_text.clone(),
            parse_error_body(&response.body),
        )
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    pub fn is_forbidden(&self) -> bool {
        self.status == 403
    }

    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }

    pub fn is_server_error(&self) -> bool {
        self.status >= 500
    }

    /// Human-readable message: the body's `message` field when the backend
    /// sent one, a generic status line otherwise.
    pub fn message(&self) -> String {
        match self.body.get("message") {
            Some(Value::String(message)) => message.clone(),
            Some(other) if !other.is_null() => other.to_string(),
            _ => format!("Backend error: {}", self.status),
        }
    }
}

fn parse_error_body(body: &str) -> Value {
    if body.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()))
}

/// The transport failed before a response existed (DNS, refused connection,
/// TLS handshake, ...). Never carries a status code.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct NetworkFailure {
    message: String,
    #[source]
    cause: Option<Box<dyn StdError + Send + Sync>>,
}

impl NetworkFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
        }
    }

    pub fn with_cause(
        message: impl Into<String>,
        cause: impl Into<Box<dyn StdError + Send + Sync>>,
    ) -> Self {
        Self {
            message: message.into(),
            cause: Some(cause.into()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Underlying transport error, kept for diagnostics only.
    pub fn cause(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.cause.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn failure(status: u16) -> HttpFailure {
        HttpFailure::new(status, "", Value::Null)
    }

    #[test]
    fn classification_boundaries() {
        assert!(!failure(499).is_server_error());
        assert!(failure(500).is_server_error());
        assert!(failure(599).is_server_error());

        assert!(!failure(400).is_unauthorized());
        assert!(failure(401).is_unauthorized());
        assert!(!failure(401).is_forbidden());

        assert!(failure(403).is_forbidden());
        assert!(!failure(403).is_not_found());

        assert!(failure(404).is_not_found());
        assert!(!failure(404).is_server_error());
    }

    #[test]
    fn error_body_prefers_json() {
        let response = HttpResponse {
            status: 422,
            status_text: "Unprocessable Entity".to_string(),
            headers: Vec::new(),
            body: r#"{"message":"title is required"}"#.to_string(),
        };
        let failure = HttpFailure::from_response(&response);
        assert_eq!(failure.body, json!({"message": "title is required"}));
        assert_eq!(failure.message(), "title is required");
    }

    #[test]
    fn error_body_falls_back_to_text_then_null() {
        let mut response = HttpResponse {
            status: 502,
            status_text: "Bad Gateway".to_string(),
            headers: Vec::new(),
            body: "upstream timed out".to_string(),
        };
        assert_eq!(
            HttpFailure::from_response(&response).body,
            Value::String("upstream timed out".to_string())
        );

        response.body = String::new();
        let failure = HttpFailure::from_response(&response);
        assert_eq!(failure.body, Value::Null);
        assert_eq!(failure.message(), "Backend error: 502");
    }

    #[test]
    fn kinds_are_distinguishable() {
        assert_eq!(ApiError::from(failure(500)).kind(), Some(FailureKind::Http));
        assert_eq!(
            ApiError::from(NetworkFailure::new("connection refused")).kind(),
            Some(FailureKind::Network)
        );
        assert_eq!(ApiError::Cancelled.kind(), Some(FailureKind::Cancelled));
        assert_eq!(ApiError::DeserializationError("x".into()).kind(), None);
        assert_eq!(ApiError::Cancelled.status(), None);
        assert_eq!(ApiError::from(failure(418)).status(), Some(418));
    }

    #[test]
    fn network_failure_keeps_cause() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = NetworkFailure::with_cause("request failed", io);
        assert_eq!(err.message(), "request failed");
        assert!(err.cause().is_some());
        assert!(err.source().is_some());
    }
}
