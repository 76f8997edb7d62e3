//! Response contract check against a live Cloud API.
//!
//! Lists each resource, fetches the first item's detail and reports every key
//! the admin views rely on that is absent. Missing keys are reported; only a
//! failed read fails the check.

use log::{debug, info};
use serde_json::Value;

use super::render::{Report, banner};
use crate::admin::{AdminApi, Collection, ResourceKind};
use crate::http::ApiResult;

const CLIENT_KEYS: &[&str] = &["code", "name"];
const TERMINOLOGY_KEYS: &[&str] = &["unit_terms", "group_terms", "program_terms"];
const FIELD_LIST_KEYS: &[&str] = &["name"];
const FIELD_KEYS: &[&str] = &["code", "name"];
const FIELD_CLIENT_KEYS: &[&str] = &["code", "name"];
const ICC_KEYS: &[&str] = &["host", "port", "dbname", "user"];
const NOMENCLATURE_KEYS: &[&str] = &["aliases", "units_text", "groups_text"];
const USER_KEYS: &[&str] = &["id", "phone_number"];

#[derive(Debug, Default)]
struct Checker {
    lines: Vec<String>,
    failed: bool,
}

impl Checker {
    fn note(&mut self, line: String) {
        self.lines.push(line);
    }

    fn fail(&mut self, line: String) {
        self.failed = true;
        self.lines.push(line);
    }

    /// Reports required keys absent from `value` under the label `scope`.
    fn require(&mut self, scope: &str, value: &Value, keys: &[&str]) {
        for key in keys {
            if value.get(key).is_none() {
                self.note(format!("missing key: {}.{}", scope, key));
            }
        }
    }

    /// Like [`Checker::require`] for a nested object, which must itself exist.
    fn require_nested(&mut self, scope: &str, value: &Value, name: &str, keys: &[&str]) {
        match value.get(name) {
            Some(nested) if nested.is_object() => {
                self.require(&format!("{}.{}", scope, name), nested, keys)
            }
            _ => self.note(format!("missing key: {}.{}", scope, name)),
        }
    }

    /// Returns the first listed item, or None when the listing is empty or unusable.
    fn first_item(&mut self, kind: ResourceKind, result: &ApiResult) -> Option<Value> {
        let path = kind.path();
        if !result.ok() {
            self.fail(format!("GET {}: {}", path, banner(result)));
            return None;
        }
        match Collection::from_result(result, kind) {
            Ok(collection) => {
                self.note(format!("GET {}: {} item(s)", path, collection.len()));
                collection.items.into_iter().next()
            }
            Err(e) => {
                self.fail(format!("GET {}: {}", path, e));
                None
            }
        }
    }

    /// Returns the detail object, recording a failure when it cannot be read.
    fn detail(&mut self, path: &str, result: &ApiResult) -> Option<Value> {
        if !result.ok() {
            self.fail(format!("GET {}: {}", path, banner(result)));
            return None;
        }
        match result.json() {
            Some(value) if value.is_object() => {
                self.note(format!("GET {}: ok", path));
                Some(value.clone())
            }
            _ => {
                self.fail(format!("GET {}: expected a JSON object", path));
                None
            }
        }
    }

    fn into_report(self) -> Report {
        let text = self.lines.join("\n");
        if self.failed {
            Report::failure(text)
        } else {
            Report::success(text)
        }
    }
}

fn as_key(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Walks list then detail for clients, fields and WhatsApp users.
#[tracing::instrument(skip(api))]
pub async fn check<A: AdminApi>(api: &A) -> Report {
    let mut checker = Checker::default();

    let first = checker.first_item(ResourceKind::Client, &api.list_clients().await);
    if let Some(client) = first {
        checker.require("clients[0]", &client, CLIENT_KEYS);
        if let Some(code) = as_key(client.get("code")) {
            let path = format!("{}/{}", ResourceKind::Client.path(), code);
            if let Some(detail) = checker.detail(&path, &api.get_client(&code).await) {
                let scope = format!("client {}", code);
                checker.require(&scope, &detail, CLIENT_KEYS);
                checker.require_nested(&scope, &detail, "terminology", TERMINOLOGY_KEYS);
            }
        }
    }

    let first = checker.first_item(ResourceKind::Field, &api.list_fields().await);
    if let Some(field) = first {
        checker.require("fields[0]", &field, FIELD_LIST_KEYS);
        let client_code = as_key(field.get("client_code"))
            .or_else(|| as_key(field.get("client").and_then(|c| c.get("code"))));
        let field_code = as_key(field.get("field_code")).or_else(|| as_key(field.get("code")));
        match (client_code, field_code) {
            (Some(client_code), Some(field_code)) => {
                let path = format!("{}/{}/{}", ResourceKind::Field.path(), client_code, field_code);
                let result = api.get_field(&client_code, &field_code).await;
                if let Some(detail) = checker.detail(&path, &result) {
                    let scope = format!("field {}/{}", client_code, field_code);
                    checker.require(&scope, &detail, FIELD_KEYS);
                    checker.require_nested(&scope, &detail, "client", FIELD_CLIENT_KEYS);
                    checker.require_nested(&scope, &detail, "icc_credentials", ICC_KEYS);
                    checker.require_nested(&scope, &detail, "nomenclature", NOMENCLATURE_KEYS);
                }
            }
            _ => debug!("First field has no client/field code, skipping detail"),
        }
    }

    let first = checker.first_item(ResourceKind::WhatsAppUser, &api.list_whatsapp_users().await);
    if let Some(user) = first {
        checker.require("users[0]", &user, USER_KEYS);
        if let Some(id) = as_key(user.get("id")) {
            let path = format!("{}/{}", ResourceKind::WhatsAppUser.path(), id);
            if let Some(detail) = checker.detail(&path, &api.get_whatsapp_user(&id).await) {
                checker.require(&format!("user {}", id), &detail, USER_KEYS);
            }
        }
    }

    info!(
        "Contract check finished with {} line(s), failed: {}",
        checker.lines.len(),
        checker.failed
    );
    checker.into_report()
}
