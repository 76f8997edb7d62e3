//! Retry policy and error classification for Cloud API calls.
//!
//! Only transport failures where no HTTP response arrived (timeouts and
//! connection failures) are worth another attempt. Every received response,
//! including 5xx, is classified once and returned.

use log::debug;
use reqwest::StatusCode;
use serde_json::Value;

use super::result::{ApiResult, ErrorKind, Payload};

/// Default number of extra attempts for idempotent reads.
pub const MAX_RETRIES: usize = 2;

/// Delay between retry attempts in milliseconds.
pub const RETRY_DELAY_MS: u64 = 1000;

/// Per-attempt timeout in seconds.
pub const TIMEOUT_SECS: u64 = 10;

/// Failure raised before any HTTP response was received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The attempt exceeded its timeout.
    Timeout(String),
    /// Connection could not be established or broke mid-exchange.
    Connect(String),
    /// Anything else, e.g. a malformed URL or request.
    Other(String),
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportError::Timeout(msg) => write!(f, "Request timed out: {}", msg),
            TransportError::Connect(msg) => write!(f, "Connection failed: {}", msg),
            TransportError::Other(msg) => write!(f, "Request error: {}", msg),
        }
    }
}

impl std::error::Error for TransportError {}

impl TransportError {
    /// Timeouts and connection failures may succeed on another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TransportError::Timeout(_) | TransportError::Connect(_))
    }

    /// Terminal classification once no further attempt will be made.
    pub fn into_result(self) -> ApiResult {
        match self {
            TransportError::Timeout(_) => {
                ApiResult::failure(ErrorKind::Timeout, None, "request timeout")
            }
            TransportError::Connect(_) => {
                ApiResult::failure(ErrorKind::Network, None, "cloud API unavailable")
            }
            TransportError::Other(msg) => {
                ApiResult::failure(ErrorKind::Unknown, None, format!("unexpected error: {}", msg))
            }
        }
    }
}

/// Maps a reqwest error onto the transport error taxonomy.
pub fn classify_error(error: &reqwest::Error) -> TransportError {
    let msg = error.to_string();
    if error.is_timeout() {
        TransportError::Timeout(msg)
    } else if error.is_connect() || error.is_request() || error.is_body() {
        TransportError::Connect(msg)
    } else {
        TransportError::Other(msg)
    }
}

/// Classifies a received JSON API response.
pub fn classify_response(status: StatusCode, body: &str) -> ApiResult {
    let code = status.as_u16();

    if status.is_success() {
        if status == StatusCode::NO_CONTENT || body.trim().is_empty() {
            return ApiResult::success(code, None);
        }
        return match serde_json::from_str::<Value>(body) {
            Ok(value) => ApiResult::success(code, Some(Payload::Json(value))),
            Err(e) => {
                debug!("Discarding non-JSON body of HTTP {} response: {}", code, e);
                ApiResult::success(code, None)
            }
        };
    }

    match status {
        StatusCode::UNAUTHORIZED => {
            ApiResult::failure(ErrorKind::Unauthorized, Some(code), "authentication failed")
        }
        StatusCode::NOT_FOUND => {
            ApiResult::failure(ErrorKind::NotFound, Some(code), "resource not found")
        }
        StatusCode::CONFLICT => ApiResult::failure(
            ErrorKind::Conflict,
            Some(code),
            body_detail(body).unwrap_or_else(|| "Conflict error".to_string()),
        ),
        StatusCode::UNPROCESSABLE_ENTITY => ApiResult::failure(
            ErrorKind::Validation,
            Some(code),
            body_detail(body).unwrap_or_else(|| "Validation error".to_string()),
        ),
        _ if code >= 500 => ApiResult::failure(ErrorKind::ServerError, Some(code), "server error"),
        _ => ApiResult::failure(
            ErrorKind::Unknown,
            Some(code),
            format!("unexpected status: {}", code),
        ),
    }
}

/// Classifies a received plain-text download response.
pub fn classify_text_response(status: StatusCode, body: String) -> ApiResult {
    let code = status.as_u16();
    match status {
        StatusCode::OK => ApiResult::success(code, Some(Payload::Text(body))),
        StatusCode::UNAUTHORIZED => {
            ApiResult::failure(ErrorKind::Unauthorized, Some(code), "authentication failed")
        }
        StatusCode::NOT_FOUND => {
            ApiResult::failure(ErrorKind::NotFound, Some(code), "config not found")
        }
        _ => ApiResult::failure(
            ErrorKind::ServerError,
            Some(code),
            format!("failed to download config (HTTP {})", code),
        ),
    }
}

/// Extracts the `detail` field of a JSON error body.
fn body_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn test_success_with_json_body() {
        let result = classify_response(StatusCode::OK, r#"[{"code":"CLI001","name":"Acme"}]"#);
        assert!(result.ok());
        assert_eq!(result.status(), Some(200));
        assert_eq!(result.json(), Some(&json!([{"code": "CLI001", "name": "Acme"}])));
    }

    #[test]
    fn test_success_without_body() {
        let result = classify_response(StatusCode::NO_CONTENT, "");
        assert!(result.ok());
        assert!(result.data().is_none());

        let result = classify_response(StatusCode::CREATED, "  ");
        assert!(result.ok());
        assert!(result.data().is_none());
        assert_eq!(result.status(), Some(201));
    }

    #[test]
    fn test_success_with_unparsable_body() {
        let result = classify_response(StatusCode::OK, "<html>ok</html>");
        assert!(result.ok());
        assert!(result.data().is_none());
    }

    #[test]
    fn test_other_2xx_is_success() {
        let result = classify_response(StatusCode::ACCEPTED, r#"{"queued":true}"#);
        assert!(result.ok());
        assert_eq!(result.json(), Some(&json!({"queued": true})));
    }

    #[test]
    fn test_unauthorized() {
        let result = classify_response(StatusCode::UNAUTHORIZED, r#"{"detail":"bad token"}"#);
        assert_eq!(result.error_type(), Some(ErrorKind::Unauthorized));
        assert_eq!(result.status(), Some(401));
        assert_eq!(result.detail(), Some("authentication failed"));
    }

    #[test]
    fn test_not_found() {
        let result = classify_response(StatusCode::NOT_FOUND, "");
        assert_eq!(result.error_type(), Some(ErrorKind::NotFound));
        assert_eq!(result.detail(), Some("resource not found"));
    }

    #[test]
    fn test_conflict_uses_body_detail() {
        let result = classify_response(StatusCode::CONFLICT, r#"{"detail":"Client already exists"}"#);
        assert!(!result.ok());
        assert_eq!(result.error_type(), Some(ErrorKind::Conflict));
        assert_eq!(result.status(), Some(409));
        assert_eq!(result.detail(), Some("Client already exists"));
    }

    #[test]
    fn test_conflict_fallback_detail() {
        let result = classify_response(StatusCode::CONFLICT, "not json");
        assert_eq!(result.detail(), Some("Conflict error"));

        let result = classify_response(StatusCode::CONFLICT, r#"{"message":"dup"}"#);
        assert_eq!(result.detail(), Some("Conflict error"));
    }

    #[test]
    fn test_validation_detail_list_is_serialized() {
        let body = r#"{"detail":[{"loc":["body","code"],"msg":"field required"}]}"#;
        let result = classify_response(StatusCode::UNPROCESSABLE_ENTITY, body);
        assert_eq!(result.error_type(), Some(ErrorKind::Validation));
        let detail = result.detail().unwrap();
        assert!(detail.contains("field required"));
    }

    #[test]
    fn test_validation_fallback_detail() {
        let result = classify_response(StatusCode::UNPROCESSABLE_ENTITY, "");
        assert_eq!(result.detail(), Some("Validation error"));
    }

    #[test]
    fn test_server_errors() {
        for code in [500u16, 502, 503, 504, 599] {
            let status = StatusCode::from_u16(code).unwrap();
            let result = classify_response(status, "oops");
            assert_eq!(result.error_type(), Some(ErrorKind::ServerError));
            assert_eq!(result.status(), Some(code));
            assert_eq!(result.detail(), Some("server error"));
        }
    }

    #[test]
    fn test_other_status_is_unknown() {
        let result = classify_response(StatusCode::FORBIDDEN, "");
        assert_eq!(result.error_type(), Some(ErrorKind::Unknown));
        assert_eq!(result.status(), Some(403));
        assert!(result.detail().unwrap().contains("403"));

        let result = classify_response(StatusCode::MOVED_PERMANENTLY, "");
        assert_eq!(result.error_type(), Some(ErrorKind::Unknown));
    }

    #[test]
    fn test_text_response_mapping() {
        let result = classify_text_response(StatusCode::OK, "FIELD=F1\n".to_string());
        assert_eq!(result.text(), Some("FIELD=F1\n"));

        let result = classify_text_response(StatusCode::NOT_FOUND, String::new());
        assert_eq!(result.error_type(), Some(ErrorKind::NotFound));

        let result = classify_text_response(StatusCode::UNAUTHORIZED, String::new());
        assert_eq!(result.error_type(), Some(ErrorKind::Unauthorized));

        let result = classify_text_response(StatusCode::CONFLICT, String::new());
        assert_eq!(result.error_type(), Some(ErrorKind::ServerError));
        assert_eq!(result.status(), Some(409));
    }

    #[test]
    fn test_transport_error_terminal_results() {
        let result = TransportError::Timeout("t".into()).into_result();
        assert_eq!(result.error_type(), Some(ErrorKind::Timeout));
        assert_eq!(result.status(), None);

        let result = TransportError::Connect("c".into()).into_result();
        assert_eq!(result.error_type(), Some(ErrorKind::Network));
        assert_eq!(result.status(), None);

        let result = TransportError::Other("boom".into()).into_result();
        assert_eq!(result.error_type(), Some(ErrorKind::Unknown));
        assert_eq!(result.status(), None);
        assert!(result.detail().unwrap().contains("boom"));
    }

    #[test]
    fn test_transport_error_retryable() {
        assert!(TransportError::Timeout(String::new()).is_retryable());
        assert!(TransportError::Connect(String::new()).is_retryable());
        assert!(!TransportError::Other(String::new()).is_retryable());
    }

    #[tokio::test]
    async fn test_classify_error_connection_refused() {
        // Bind then drop to obtain a port nobody listens on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = reqwest::Client::new();
        let err = client
            .get(format!("http://{}/admin/clients", addr))
            .send()
            .await
            .unwrap_err();

        assert!(matches!(classify_error(&err), TransportError::Connect(_)));
    }

    #[tokio::test]
    async fn test_classify_error_timeout() {
        // Accepts connections at the kernel level but never answers
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let client = reqwest::Client::new();
        let err = client
            .get(format!("http://{}/admin/clients", addr))
            .timeout(Duration::from_millis(100))
            .send()
            .await
            .unwrap_err();

        assert!(matches!(classify_error(&err), TransportError::Timeout(_)));
        drop(listener);
    }

    #[tokio::test]
    async fn test_classify_error_invalid_url() {
        let client = reqwest::Client::new();
        let err = client.get("not a url").send().await.unwrap_err();
        assert!(matches!(classify_error(&err), TransportError::Other(_)));
    }
}
