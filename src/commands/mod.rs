//! Command handlers behind the `cloudadmin` CLI.
//!
//! Handlers call the [`AdminApi`] and turn the returned [`ApiResult`] into a
//! [`Report`]. They never branch on `detail`; only `ok` and the error kind
//! decide what is shown.
//!
//! [`ApiResult`]: crate::http::ApiResult

mod check;
mod render;

use anyhow::{Context, Result, anyhow};
use log::debug;
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::admin::{AdminApi, ResourceKind, WhatsAppUserPayload, parse_field_ids};
use crate::runtime::Runtime;

pub use check::check;
pub use render::{Format, Report, render_item, render_listing};

#[derive(clap::Subcommand, Debug)]
pub enum ClientsCommand {
    /// List all clients
    List,
    /// Show one client
    Get {
        #[arg(value_name = "CODE")]
        code: String,
    },
    /// Create a client from a JSON object
    Create {
        /// JSON object, or @path to read it from a file
        #[arg(long, value_name = "JSON")]
        data: String,
    },
    /// Update fields of an existing client
    Update {
        #[arg(value_name = "CODE")]
        code: String,
        /// JSON object, or @path to read it from a file
        #[arg(long, value_name = "JSON")]
        data: String,
    },
    /// Delete a client
    Delete {
        #[arg(value_name = "CODE")]
        code: String,
    },
}

#[derive(clap::Subcommand, Debug)]
pub enum FieldsCommand {
    /// List all fields
    List,
    /// Show one field
    Get {
        #[arg(value_name = "CLIENT")]
        client: String,
        #[arg(value_name = "FIELD")]
        field: String,
    },
    /// Create a field from a JSON object
    Create {
        /// JSON object, or @path to read it from a file
        #[arg(long, value_name = "JSON")]
        data: String,
    },
    /// Update an existing field
    Update {
        #[arg(value_name = "CLIENT")]
        client: String,
        #[arg(value_name = "FIELD")]
        field: String,
        /// JSON object, or @path to read it from a file
        #[arg(long, value_name = "JSON")]
        data: String,
    },
    /// Delete a field
    Delete {
        #[arg(value_name = "CLIENT")]
        client: String,
        #[arg(value_name = "FIELD")]
        field: String,
    },
    /// Download the field agent configuration (.env)
    AgentConfig {
        #[arg(value_name = "CLIENT")]
        client: String,
        #[arg(value_name = "FIELD")]
        field: String,
        /// Write the configuration to this file instead of stdout
        #[arg(long, short = 'o', value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(clap::Subcommand, Debug)]
pub enum WhatsAppUsersCommand {
    /// List all WhatsApp users
    List,
    /// Show one WhatsApp user
    Get {
        #[arg(value_name = "ID")]
        id: String,
    },
    /// Register a WhatsApp user
    Create {
        #[arg(long, value_name = "NUMBER")]
        phone: String,
        #[arg(long, value_name = "NAME")]
        display_name: Option<String>,
        /// Comma-separated field ids, e.g. 1,2,3
        #[arg(long, value_name = "IDS")]
        field_ids: Option<String>,
    },
    /// Update a WhatsApp user
    Update {
        #[arg(value_name = "ID")]
        id: String,
        #[arg(long, value_name = "NUMBER")]
        phone: Option<String>,
        #[arg(long, value_name = "NAME")]
        display_name: Option<String>,
        /// Comma-separated field ids, e.g. 1,2,3
        #[arg(long, value_name = "IDS")]
        field_ids: Option<String>,
        #[arg(long, value_name = "BOOL")]
        active: Option<bool>,
    },
    /// Deactivate a WhatsApp user
    Delete {
        #[arg(value_name = "ID")]
        id: String,
    },
}

#[tracing::instrument(skip(api, runtime))]
pub async fn clients<A: AdminApi, R: Runtime>(
    api: &A,
    runtime: &R,
    command: ClientsCommand,
    format: Format,
) -> Result<Report> {
    let report = match command {
        ClientsCommand::List => {
            render_listing(&api.list_clients().await, ResourceKind::Client, format)
        }
        ClientsCommand::Get { code } => render_item(&api.get_client(&code).await, format),
        ClientsCommand::Create { data } => {
            let data = read_data(runtime, &data)?;
            render_item(&api.create_client(&data).await, format)
        }
        ClientsCommand::Update { code, data } => {
            let data = read_data(runtime, &data)?;
            render_item(&api.update_client(&code, &data).await, format)
        }
        ClientsCommand::Delete { code } => render_item(&api.delete_client(&code).await, format),
    };
    Ok(report)
}

#[tracing::instrument(skip(api, runtime))]
pub async fn fields<A: AdminApi, R: Runtime>(
    api: &A,
    runtime: &R,
    command: FieldsCommand,
    format: Format,
) -> Result<Report> {
    let report = match command {
        FieldsCommand::List => {
            render_listing(&api.list_fields().await, ResourceKind::Field, format)
        }
        FieldsCommand::Get { client, field } => {
            render_item(&api.get_field(&client, &field).await, format)
        }
        FieldsCommand::Create { data } => {
            let data = read_data(runtime, &data)?;
            render_item(&api.create_field(&data).await, format)
        }
        FieldsCommand::Update {
            client,
            field,
            data,
        } => {
            let data = read_data(runtime, &data)?;
            render_item(&api.update_field(&client, &field, &data).await, format)
        }
        FieldsCommand::Delete { client, field } => {
            render_item(&api.delete_field(&client, &field).await, format)
        }
        FieldsCommand::AgentConfig {
            client,
            field,
            output,
        } => {
            let result = api.download_agent_config(&client, &field).await;
            match (result.text(), output) {
                (Some(text), Some(path)) => {
                    save_agent_config(runtime, &path, text)?;
                    Report::success(format!("Saved agent config to {}", path.display()))
                }
                _ => render_item(&result, format),
            }
        }
    };
    Ok(report)
}

#[tracing::instrument(skip(api))]
pub async fn whatsapp_users<A: AdminApi>(
    api: &A,
    command: WhatsAppUsersCommand,
    format: Format,
) -> Result<Report> {
    let report = match command {
        WhatsAppUsersCommand::List => render_listing(
            &api.list_whatsapp_users().await,
            ResourceKind::WhatsAppUser,
            format,
        ),
        WhatsAppUsersCommand::Get { id } => render_item(&api.get_whatsapp_user(&id).await, format),
        WhatsAppUsersCommand::Create {
            phone,
            display_name,
            field_ids,
        } => {
            let payload = WhatsAppUserPayload {
                phone_number: Some(phone),
                display_name,
                field_ids: field_ids.as_deref().map(parse_field_ids).transpose()?,
                is_active: None,
            };
            render_item(&api.create_whatsapp_user(&payload.to_value()?).await, format)
        }
        WhatsAppUsersCommand::Update {
            id,
            phone,
            display_name,
            field_ids,
            active,
        } => {
            let payload = WhatsAppUserPayload {
                phone_number: phone,
                display_name,
                field_ids: field_ids.as_deref().map(parse_field_ids).transpose()?,
                is_active: active,
            };
            if payload == WhatsAppUserPayload::default() {
                return Err(anyhow!("Nothing to update: pass at least one option"));
            }
            render_item(&api.update_whatsapp_user(&id, &payload.to_value()?).await, format)
        }
        WhatsAppUsersCommand::Delete { id } => {
            render_item(&api.delete_whatsapp_user(&id).await, format)
        }
    };
    Ok(report)
}

/// Parses a `--data` argument: inline JSON, or `@path` to read it from a file.
/// Only JSON objects are accepted.
pub fn read_data<R: Runtime>(runtime: &R, raw: &str) -> Result<Value> {
    let text = match raw.strip_prefix('@') {
        Some(path) => {
            debug!("Reading request data from {}", path);
            runtime.read_to_string(Path::new(path))?
        }
        None => raw.to_string(),
    };

    let value: Value = serde_json::from_str(&text).context("Request data is not valid JSON")?;
    if !value.is_object() {
        return Err(anyhow!("Request data must be a JSON object"));
    }
    Ok(value)
}

fn save_agent_config<R: Runtime>(runtime: &R, path: &Path, text: &str) -> Result<()> {
    runtime
        .write(path, text.as_bytes())
        .with_context(|| format!("Failed to save agent config to {}", path.display()))
}
