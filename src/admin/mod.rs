//! Cloud API admin resources: clients, fields and WhatsApp users.
//!
//! Every operation delegates to [`HttpClient`] with a fixed method, path and
//! retry flag. Reads are retryable; writes are attempted exactly once so a
//! lost response can never turn into a duplicated side effect.

mod listing;
mod payload;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::http::{ApiResult, HttpClient, ReqwestTransport, RequestBody, Transport};

pub use listing::{Collection, Listing};
pub use payload::{WhatsAppUserPayload, parse_field_ids};

/// The three resource kinds managed through the admin API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Client,
    Field,
    WhatsAppUser,
}

impl ResourceKind {
    /// Collection endpoint.
    pub fn path(&self) -> &'static str {
        match self {
            ResourceKind::Client => "/admin/clients",
            ResourceKind::Field => "/admin/fields",
            ResourceKind::WhatsAppUser => "/admin/whatsapp-users",
        }
    }

    /// Key holding the primary collection in an enveloped listing.
    pub fn collection_key(&self) -> &'static str {
        match self {
            ResourceKind::Client => "clients",
            ResourceKind::Field => "fields",
            ResourceKind::WhatsAppUser => "users",
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AdminApi: Send + Sync {
    async fn list_clients(&self) -> ApiResult;
    async fn get_client(&self, code: &str) -> ApiResult;
    async fn create_client(&self, data: &Value) -> ApiResult;
    async fn update_client(&self, code: &str, data: &Value) -> ApiResult;
    async fn delete_client(&self, code: &str) -> ApiResult;

    async fn list_fields(&self) -> ApiResult;
    async fn get_field(&self, client_code: &str, field_code: &str) -> ApiResult;
    async fn create_field(&self, data: &Value) -> ApiResult;
    async fn update_field(&self, client_code: &str, field_code: &str, data: &Value) -> ApiResult;
    async fn delete_field(&self, client_code: &str, field_code: &str) -> ApiResult;

    /// Downloads the field agent `.env` configuration as raw text.
    async fn download_agent_config(&self, client_code: &str, field_code: &str) -> ApiResult;

    async fn list_whatsapp_users(&self) -> ApiResult;
    async fn get_whatsapp_user(&self, id: &str) -> ApiResult;
    async fn create_whatsapp_user(&self, data: &Value) -> ApiResult;
    async fn update_whatsapp_user(&self, id: &str, data: &Value) -> ApiResult;
    /// Soft delete; the Cloud API deactivates the user.
    async fn delete_whatsapp_user(&self, id: &str) -> ApiResult;
}

/// Admin API client over the Cloud API.
pub struct CloudApiClient<T: Transport = ReqwestTransport> {
    http: HttpClient<T>,
}

impl CloudApiClient<ReqwestTransport> {
    pub fn new(config: ClientConfig) -> Result<Self> {
        Ok(Self {
            http: HttpClient::new(config)?,
        })
    }
}

impl<T: Transport> CloudApiClient<T> {
    pub fn from_http_client(http: HttpClient<T>) -> Self {
        Self { http }
    }

    async fn read(&self, path: &str) -> ApiResult {
        self.http.execute(Method::GET, path, None, true).await
    }

    async fn write(&self, method: Method, path: &str, data: Option<&Value>) -> ApiResult {
        let body = data.map(|value| RequestBody::Json(value.clone()));
        self.http.execute(method, path, body, false).await
    }
}

fn item_path(kind: ResourceKind, key: &str) -> String {
    format!("{}/{}", kind.path(), urlencoding::encode(key))
}

fn field_path(client_code: &str, field_code: &str) -> String {
    format!(
        "{}/{}/{}",
        ResourceKind::Field.path(),
        urlencoding::encode(client_code),
        urlencoding::encode(field_code)
    )
}

#[async_trait]
impl<T: Transport> AdminApi for CloudApiClient<T> {
    #[tracing::instrument(skip(self))]
    async fn list_clients(&self) -> ApiResult {
        self.read(ResourceKind::Client.path()).await
    }

    #[tracing::instrument(skip(self))]
    async fn get_client(&self, code: &str) -> ApiResult {
        self.read(&item_path(ResourceKind::Client, code)).await
    }

    #[tracing::instrument(skip(self, data))]
    async fn create_client(&self, data: &Value) -> ApiResult {
        self.write(Method::POST, ResourceKind::Client.path(), Some(data))
            .await
    }

    #[tracing::instrument(skip(self, data))]
    async fn update_client(&self, code: &str, data: &Value) -> ApiResult {
        self.write(Method::PATCH, &item_path(ResourceKind::Client, code), Some(data))
            .await
    }

    #[tracing::instrument(skip(self))]
    async fn delete_client(&self, code: &str) -> ApiResult {
        self.write(Method::DELETE, &item_path(ResourceKind::Client, code), None)
            .await
    }

    #[tracing::instrument(skip(self))]
    async fn list_fields(&self) -> ApiResult {
        self.read(ResourceKind::Field.path()).await
    }

    #[tracing::instrument(skip(self))]
    async fn get_field(&self, client_code: &str, field_code: &str) -> ApiResult {
        self.read(&field_path(client_code, field_code)).await
    }

    #[tracing::instrument(skip(self, data))]
    async fn create_field(&self, data: &Value) -> ApiResult {
        self.write(Method::POST, ResourceKind::Field.path(), Some(data))
            .await
    }

    #[tracing::instrument(skip(self, data))]
    async fn update_field(&self, client_code: &str, field_code: &str, data: &Value) -> ApiResult {
        self.write(Method::PATCH, &field_path(client_code, field_code), Some(data))
            .await
    }

    #[tracing::instrument(skip(self))]
    async fn delete_field(&self, client_code: &str, field_code: &str) -> ApiResult {
        self.write(Method::DELETE, &field_path(client_code, field_code), None)
            .await
    }

    #[tracing::instrument(skip(self))]
    async fn download_agent_config(&self, client_code: &str, field_code: &str) -> ApiResult {
        let path = format!("{}/agent-config", field_path(client_code, field_code));
        self.http.fetch_text(&path).await
    }

    #[tracing::instrument(skip(self))]
    async fn list_whatsapp_users(&self) -> ApiResult {
        self.read(ResourceKind::WhatsAppUser.path()).await
    }

    #[tracing::instrument(skip(self))]
    async fn get_whatsapp_user(&self, id: &str) -> ApiResult {
        self.read(&item_path(ResourceKind::WhatsAppUser, id)).await
    }

    #[tracing::instrument(skip(self, data))]
    async fn create_whatsapp_user(&self, data: &Value) -> ApiResult {
        self.write(Method::POST, ResourceKind::WhatsAppUser.path(), Some(data))
            .await
    }

    #[tracing::instrument(skip(self, data))]
    async fn update_whatsapp_user(&self, id: &str, data: &Value) -> ApiResult {
        self.write(Method::PUT, &item_path(ResourceKind::WhatsAppUser, id), Some(data))
            .await
    }

    #[tracing::instrument(skip(self))]
    async fn delete_whatsapp_user(&self, id: &str) -> ApiResult {
        self.write(Method::DELETE, &item_path(ResourceKind::WhatsAppUser, id), None)
            .await
    }
}
