//! Outcome of a single logical Cloud API operation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Closed classification of a failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Unauthorized,
    Timeout,
    Network,
    ServerError,
    NotFound,
    Validation,
    Conflict,
    Unknown,
}

impl ErrorKind {
    /// Caller-facing message category. Timeout and Network share the same
    /// banner since both mean the Cloud API could not be reached.
    pub fn user_message(&self) -> &'static str {
        match self {
            ErrorKind::Unauthorized => "Authentication with the Cloud API failed",
            ErrorKind::Timeout | ErrorKind::Network => "Cloud API unavailable",
            ErrorKind::NotFound => "Not found",
            ErrorKind::Validation => "Invalid input",
            ErrorKind::Conflict => "Conflicting state",
            ErrorKind::ServerError => "Cloud API server error",
            ErrorKind::Unknown => "Unexpected error",
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Network => "network",
            ErrorKind::ServerError => "server_error",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Validation => "validation",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of a successful response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Json(Value),
    Text(String),
}

/// Tagged outcome returned by every client operation.
///
/// `ok` is true exactly when `error_type` is absent. `status` is absent only
/// when no HTTP exchange happened (timeout or connection failure) or the
/// request could not be attempted at all.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResult {
    ok: bool,
    data: Option<Payload>,
    error_type: Option<ErrorKind>,
    status: Option<u16>,
    detail: Option<String>,
}

impl ApiResult {
    pub(crate) fn success(status: u16, data: Option<Payload>) -> Self {
        Self {
            ok: true,
            data,
            error_type: None,
            status: Some(status),
            detail: None,
        }
    }

    pub(crate) fn failure(kind: ErrorKind, status: Option<u16>, detail: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error_type: Some(kind),
            status,
            detail: Some(detail.into()),
        }
    }

    pub fn ok(&self) -> bool {
        self.ok
    }

    pub fn data(&self) -> Option<&Payload> {
        self.data.as_ref()
    }

    pub fn error_type(&self) -> Option<ErrorKind> {
        self.error_type
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    /// JSON body of a successful response, if any.
    pub fn json(&self) -> Option<&Value> {
        match &self.data {
            Some(Payload::Json(value)) => Some(value),
            _ => None,
        }
    }

    /// Raw text body of a successful download, if any.
    pub fn text(&self) -> Option<&str> {
        match &self.data {
            Some(Payload::Text(text)) => Some(text),
            _ => None,
        }
    }
}
