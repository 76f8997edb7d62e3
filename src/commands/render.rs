//! Turns API results into printable reports.

use log::{debug, warn};

use crate::admin::{Collection, ResourceKind};
use crate::http::{ApiResult, Payload};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// Data on success, one banner per error kind on failure.
    #[default]
    Text,
    /// The whole result serialized as JSON.
    Json,
}

/// What a command prints, and whether it succeeded.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub ok: bool,
    pub text: String,
}

impl Report {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            ok: true,
            text: text.into(),
        }
    }

    pub fn failure(text: impl Into<String>) -> Self {
        Self {
            ok: false,
            text: text.into(),
        }
    }

    /// Prints to stdout on success and stderr on failure.
    pub fn print(&self) {
        if self.ok {
            if self.text.ends_with('\n') {
                print!("{}", self.text);
            } else {
                println!("{}", self.text);
            }
        } else {
            eprintln!("{}", self.text);
        }
    }
}

/// Renders the result of a single-resource operation.
pub fn render_item(result: &ApiResult, format: Format) -> Report {
    if format == Format::Json {
        return render_json(result);
    }
    if !result.ok() {
        return Report::failure(banner(result));
    }

    match result.data() {
        Some(Payload::Json(value)) => Report::success(pretty(value)),
        Some(Payload::Text(text)) => Report::success(text.clone()),
        None => Report::success(match result.status() {
            Some(status) => format!("OK (HTTP {})", status),
            None => "OK".to_string(),
        }),
    }
}

/// Renders a listing in its canonical bare-array form.
pub fn render_listing(result: &ApiResult, kind: ResourceKind, format: Format) -> Report {
    if format == Format::Json || !result.ok() {
        return render_item(result, format);
    }

    match Collection::from_result(result, kind) {
        Ok(collection) => {
            for (name, values) in &collection.related {
                debug!("Listing carried {} related '{}' entries", values.len(), name);
            }
            Report::success(pretty(&serde_json::Value::Array(collection.items)))
        }
        Err(e) => {
            warn!("Unexpected listing shape from {}: {}", kind.path(), e);
            Report::failure(format!("Unexpected response from Cloud API: {}", e))
        }
    }
}

fn render_json(result: &ApiResult) -> Report {
    let text = serde_json::to_string_pretty(result)
        .unwrap_or_else(|e| format!(r#"{{"ok": false, "detail": "{}"}}"#, e));
    Report {
        ok: result.ok(),
        text,
    }
}

pub(super) fn banner(result: &ApiResult) -> String {
    let mut text = match result.error_type() {
        Some(kind) => kind.user_message().to_string(),
        None => "Request failed".to_string(),
    };
    if let Some(status) = result.status() {
        text.push_str(&format!(" (HTTP {})", status));
    }
    if let Some(detail) = result.detail() {
        text.push_str(": ");
        text.push_str(detail);
    }
    text
}

fn pretty(value: &serde_json::Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
