//! Normalization of listing responses.
//!
//! The canonical listing shape is a bare JSON array of resources. Older Cloud
//! API revisions wrap the primary collection in an object next to related
//! collections, e.g. `{"fields": [...], "clients": [...]}`. Both are resolved
//! here into a single [`Collection`].

use anyhow::{Result, anyhow};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::ResourceKind;
use crate::http::{ApiResult, Payload};

/// Wire shape of a listing response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Listing {
    Bare(Vec<Value>),
    Envelope(Map<String, Value>),
}

/// A listing after normalization.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Collection {
    pub items: Vec<Value>,
    pub related: BTreeMap<String, Vec<Value>>,
}

impl Listing {
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value)
            .map_err(|_| anyhow!("Listing response is neither a JSON array nor an object"))
    }

    /// Resolves the listing; `key` names the primary collection inside an envelope.
    pub fn normalize(self, key: &str) -> Result<Collection> {
        match self {
            Listing::Bare(items) => Ok(Collection {
                items,
                related: BTreeMap::new(),
            }),
            Listing::Envelope(mut map) => {
                let items = match map.remove(key) {
                    Some(Value::Array(items)) => items,
                    Some(Value::Null) | None => {
                        debug!("Envelope has no '{}' collection, treating as empty", key);
                        Vec::new()
                    }
                    Some(other) => {
                        return Err(anyhow!(
                            "Expected '{}' to be a list, got {}",
                            key,
                            json_type(&other)
                        ));
                    }
                };

                let mut related = BTreeMap::new();
                for (name, value) in map {
                    match value {
                        Value::Array(values) => {
                            related.insert(name, values);
                        }
                        other => debug!("Ignoring non-list envelope entry '{}' ({})", name, json_type(&other)),
                    }
                }

                Ok(Collection { items, related })
            }
        }
    }
}

impl Collection {
    /// Normalizes the data of a successful listing call. A success without a
    /// body is an empty collection.
    pub fn from_result(result: &ApiResult, kind: ResourceKind) -> Result<Self> {
        if !result.ok() {
            return Err(anyhow!(
                "Cannot read a listing from a failed call ({})",
                result.detail().unwrap_or("no detail")
            ));
        }
        match result.data() {
            None => Ok(Collection::default()),
            Some(Payload::Json(value)) => {
                Listing::from_value(value.clone())?.normalize(kind.collection_key())
            }
            Some(Payload::Text(_)) => Err(anyhow!("Listing response is not JSON")),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
