//! Request payloads assembled from command-line input.

use anyhow::{Context, Result};
use serde::Serialize;

/// Body for creating or updating a WhatsApp user. Absent values are omitted
/// so updates only touch what was given.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WhatsAppUserPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_ids: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl WhatsAppUserPayload {
    pub fn to_value(&self) -> Result<serde_json::Value> {
        serde_json::to_value(self).context("Failed to serialize WhatsApp user payload")
    }
}

/// Parses a comma-separated list of field ids such as `"1, 2,3"`.
/// Blank entries are skipped.
pub fn parse_field_ids(input: &str) -> Result<Vec<i64>> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .with_context(|| format!("Invalid field id: {:?}", s))
        })
        .collect()
}
