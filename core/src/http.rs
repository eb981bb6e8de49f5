//! HTTP request/response types and outcome classification.
//!
//! # Design
//! Requests and responses are plain data. The clients build an
//! `HttpRequest`, hand it to a `Transport`, and classify the returned
//! `HttpResponse` into an `Outcome` without further I/O. Keeping
//! classification pure makes every status-code rule testable without a
//! server.
//!
//! Header lists are `Vec<(String, String)>`. Names compare
//! case-insensitively; `set_header` replaces an existing entry in place.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ApiError, HttpFailure};

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// An outbound request described as plain data. Built fresh per call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        header_value(&self.headers, name)
    }
}

/// A response described as plain data, as returned by a `Transport`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

/// Classified result of one round-trip.
#[derive(Debug)]
pub enum Outcome {
    /// `payload` is `None` for bodyless statuses (204, empty 304).
    Success { status: u16, payload: Option<Value> },
    Failure(ApiError),
}

impl Outcome {
    /// Convert the payload into `T`. A missing payload is presented as JSON
    /// `null`, so `()`, `Option<_>` and `Value` accept bodyless successes.
    pub fn into_result<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        match self {
            Outcome::Success { payload, .. } => {
                serde_json::from_value(payload.unwrap_or(Value::Null))
                    .map_err(|e| ApiError::DeserializationError(e.to_string()))
            }
            Outcome::Failure(err) => Err(err),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }
}

/// `2xx` and `304` count as success.
pub fn is_success_status(status: u16) -> bool {
    (200..=299).contains(&status) || status == 304
}

/// Classify a response.
///
/// Any response object becomes either a success or an `Http` failure; the
/// network kind is reserved for calls that never got this far.
pub fn classify(response: HttpResponse) -> Outcome {
    let status = response.status;
    if !is_success_status(status) {
        return Outcome::Failure(ApiError::Http(HttpFailure::from_response(&response)));
    }

    // 204 never has a payload, whatever bytes arrived.
    if status == 204 || (status == 304 && response.body.trim().is_empty()) {
        return Outcome::Success {
            status,
            payload: None,
        };
    }

    match serde_json::from_str(&response.body) {
        Ok(payload) => Outcome::Success {
            status,
            payload: Some(payload),
        },
        Err(e) => Outcome::Failure(ApiError::DeserializationError(e.to_string())),
    }
}

/// Look up a header value by case-insensitive name.
pub fn header_value<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// Insert or replace a header. A later write wins on name collision.
pub fn set_header(headers: &mut Vec<(String, String)>, name: &str, value: &str) {
    match headers.iter_mut().find(|(key, _)| key.eq_ignore_ascii_case(name)) {
        Some(entry) => *entry = (name.to_string(), value.to_string()),
        None => headers.push((name.to_string(), value.to_string())),
    }
}

/// Layer `overrides` on top of `headers`, entry by entry.
pub fn merge_headers<'a, I>(headers: &mut Vec<(String, String)>, overrides: I)
where
    I: IntoIterator<Item = &'a (String, String)>,
{
    for (name, value) in overrides {
        set_header(headers, name, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use serde_json::json;

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            status_text: String::new(),
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    #[test]
    fn success_range_includes_304_only_outside_2xx() {
        for status in [200, 201, 226, 299, 304] {
            assert!(is_success_status(status), "{status}");
        }
        for status in [100, 199, 300, 301, 303, 305, 400, 404, 500, 599] {
            assert!(!is_success_status(status), "{status}");
        }
    }

    #[test]
    fn no_content_ignores_body_bytes() {
        let outcome = classify(response(204, "this is not json"));
        match outcome {
            Outcome::Success { status, payload } => {
                assert_eq!(status, 204);
                assert!(payload.is_none());
            }
            other => panic!("expected success, got {other:?}"),
        }
        assert!(classify(response(204, "{}")).into_result::<()>().is_ok());
    }

    #[test]
    fn empty_not_modified_has_no_payload() {
        let value: Option<Value> = classify(response(304, "")).into_result().unwrap();
        assert!(value.is_none());
    }

    #[test]
    fn success_parses_json() {
        let value: Value = classify(response(200, r#"{"ok":true}"#)).into_result().unwrap();
        assert_eq!(value, json!({"ok": true}));
    }

    #[test]
    fn success_with_bad_json_is_decode_error() {
        let err = classify(response(200, "not json"))
            .into_result::<Value>()
            .unwrap_err();
        assert!(matches!(err, ApiError::DeserializationError(_)));
    }

    #[test]
    fn non_success_keeps_exact_status() {
        for status in [301, 400, 401, 403, 404, 418, 499, 500, 502, 599] {
            let err = classify(response(status, "")).into_result::<Value>().unwrap_err();
            assert_eq!(err.kind(), Some(FailureKind::Http));
            assert_eq!(err.status(), Some(status));
        }
    }

    #[test]
    fn set_header_is_case_insensitive() {
        let mut headers = vec![("Content-Type".to_string(), "application/json".to_string())];
        set_header(&mut headers, "content-type", "text/plain");
        assert_eq!(headers.len(), 1);
        assert_eq!(header_value(&headers, "CONTENT-TYPE"), Some("text/plain"));
    }

    #[test]
    fn merge_headers_later_wins() {
        let mut headers = vec![
            ("Content-Type".to_string(), "application/json".to_string()),
            ("Authorization".to_string(), "Bearer a".to_string()),
        ];
        let overrides = vec![
            ("authorization".to_string(), "Bearer b".to_string()),
            ("X-Request-Id".to_string(), "42".to_string()),
        ];
        merge_headers(&mut headers, &overrides);
        assert_eq!(headers.len(), 3);
        assert_eq!(header_value(&headers, "Authorization"), Some("Bearer b"));
        assert_eq!(header_value(&headers, "x-request-id"), Some("42"));
    }
}
