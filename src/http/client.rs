//! Request executor with bounded retries for idempotent reads.

use anyhow::Result;
use log::{debug, warn};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::redirect::Policy;
use reqwest::{Client, Method};

use super::result::ApiResult;
use super::retry::{TransportError, classify_response, classify_text_response};
use super::transport::{ApiRequest, ReqwestTransport, RequestBody, Transport};
use crate::config::ClientConfig;

const USER_AGENT: &str = concat!("cloudadmin/", env!("CLOUDADMIN_VERSION"));

/// Sends Cloud API requests and turns every outcome into an [`ApiResult`].
///
/// Only GET requests flagged as retryable get more than one attempt, and only
/// timeouts and connection failures trigger a retry.
pub struct HttpClient<T: Transport = ReqwestTransport> {
    transport: T,
    config: ClientConfig,
}

impl HttpClient<ReqwestTransport> {
    /// Builds a reqwest-backed client for the given configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(Policy::none())
            .build()?;
        Ok(Self::with_transport(ReqwestTransport::new(client), config))
    }
}

impl<T: Transport> HttpClient<T> {
    pub fn with_transport(transport: T, config: ClientConfig) -> Self {
        Self { transport, config }
    }

    /// Performs one logical JSON operation.
    #[tracing::instrument(skip(self, body))]
    pub async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<RequestBody>,
        retryable: bool,
    ) -> ApiResult {
        let attempts = if retryable && method == Method::GET {
            self.config.max_retries() + 1
        } else {
            1
        };

        let content_type = match &body {
            Some(RequestBody::Form(_)) => None,
            _ => Some(HeaderValue::from_static("application/json")),
        };
        let request = match self.build_request(method, path, body, content_type) {
            Ok(request) => request,
            Err(e) => return e.into_result(),
        };

        let mut attempt = 1;
        loop {
            match self.transport.send(&request).await {
                Ok(response) => {
                    debug!(
                        "{} {} -> {} (attempt {}/{})",
                        request.method, request.url, response.status, attempt, attempts
                    );
                    return classify_response(response.status, &response.body);
                }
                Err(e) if e.is_retryable() && attempt < attempts => {
                    warn!(
                        "{} {}: attempt {}/{} failed ({}), retrying in {}ms...",
                        request.method,
                        request.url,
                        attempt,
                        attempts,
                        e,
                        self.config.retry_delay().as_millis()
                    );
                    tokio::time::sleep(self.config.retry_delay()).await;
                    attempt += 1;
                }
                Err(e) => {
                    warn!(
                        "{} {}: giving up after {} attempt(s): {}",
                        request.method, request.url, attempt, e
                    );
                    return e.into_result();
                }
            }
        }
    }

    /// Downloads a plain-text resource in a single attempt.
    #[tracing::instrument(skip(self))]
    pub async fn fetch_text(&self, path: &str) -> ApiResult {
        let request = match self.build_request(Method::GET, path, None, None) {
            Ok(mut request) => {
                request
                    .headers
                    .insert(ACCEPT, HeaderValue::from_static("text/plain"));
                request
            }
            Err(e) => return e.into_result(),
        };

        match self.transport.send(&request).await {
            Ok(response) => {
                debug!("GET {} -> {}", request.url, response.status);
                classify_text_response(response.status, response.body)
            }
            Err(e) => {
                warn!("GET {} failed: {}", request.url, e);
                e.into_result()
            }
        }
    }

    fn build_request(
        &self,
        method: Method,
        path: &str,
        body: Option<RequestBody>,
        content_type: Option<HeaderValue>,
    ) -> Result<ApiRequest, TransportError> {
        let mut headers = HeaderMap::new();

        let mut auth_value = HeaderValue::from_str(&format!("Bearer {}", self.config.token()))
            .map_err(|e| TransportError::Other(format!("invalid admin token: {}", e)))?;
        auth_value.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_value);

        if let Some(content_type) = content_type {
            headers.insert(CONTENT_TYPE, content_type);
        }

        Ok(ApiRequest {
            method,
            url: self.config.url(path),
            headers,
            body,
            timeout: self.config.timeout(),
        })
    }
}
