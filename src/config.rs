//! Client and application configuration.

use anyhow::{Context, Result, anyhow};
use log::debug;
use std::time::Duration;

use crate::http::{MAX_RETRIES, RETRY_DELAY_MS, TIMEOUT_SECS};
use crate::runtime::Runtime;

pub const ENV_API_URL: &str = "CLOUD_API_URL";
pub const ENV_ADMIN_TOKEN: &str = "CLOUD_API_ADMIN_TOKEN";
pub const ENV_TIMEOUT: &str = "CLOUD_API_TIMEOUT";
pub const ENV_MAX_RETRIES: &str = "CLOUD_API_MAX_RETRIES";

/// Immutable settings for one Cloud API client.
#[derive(Clone, PartialEq)]
pub struct ClientConfig {
    base_url: String,
    token: String,
    timeout: Duration,
    max_retries: usize,
    retry_delay: Duration,
}

impl ClientConfig {
    /// Creates a configuration with the default timeout and retry policy.
    /// Trailing slashes are stripped from `base_url`.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.into(),
            timeout: Duration::from_secs(TIMEOUT_SECS),
            max_retries: MAX_RETRIES,
            retry_delay: Duration::from_millis(RETRY_DELAY_MS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn max_retries(&self) -> usize {
        self.max_retries
    }

    pub fn retry_delay(&self) -> Duration {
        self.retry_delay
    }

    /// Joins a path onto the base URL.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("token", &mask_token(&self.token))
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("retry_delay", &self.retry_delay)
            .finish()
    }
}

/// Shows only the last four characters of a secret.
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() > 8 {
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("*********{}", tail)
    } else {
        "***".to_string()
    }
}

/// Command-line values that take precedence over the environment.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub api_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub max_retries: Option<usize>,
}

/// Application configuration resolved once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub client: ClientConfig,
}

impl Config {
    /// Resolves configuration from CLI overrides with environment fallback.
    /// The admin token is only ever read from the environment.
    pub fn load<R: Runtime>(runtime: &R, overrides: Overrides) -> Result<Self> {
        let api_url = match overrides.api_url {
            Some(url) => url,
            None => runtime
                .env_var(ENV_API_URL)
                .with_context(|| format!("{} is not set and --api-url was not given", ENV_API_URL))?,
        };
        if api_url.trim().is_empty() {
            return Err(anyhow!("Cloud API URL must not be empty"));
        }

        let token = runtime
            .env_var(ENV_ADMIN_TOKEN)
            .with_context(|| format!("{} is not set", ENV_ADMIN_TOKEN))?;

        let timeout_secs = match overrides.timeout_secs {
            Some(0) => return Err(anyhow!("--timeout must be at least 1 second")),
            Some(secs) => secs,
            None => match env_number(runtime, ENV_TIMEOUT)? {
                Some(0) => {
                    return Err(anyhow!("{} must be at least 1 second", ENV_TIMEOUT));
                }
                Some(secs) => secs,
                None => TIMEOUT_SECS,
            },
        };
        let max_retries = match overrides.max_retries {
            Some(n) => n,
            None => env_number(runtime, ENV_MAX_RETRIES)?.unwrap_or(MAX_RETRIES),
        };

        let client = ClientConfig::new(api_url, token)
            .with_timeout(Duration::from_secs(timeout_secs))
            .with_max_retries(max_retries);

        debug!("Loaded configuration: {:?}", client);

        Ok(Self { client })
    }
}

fn env_number<R: Runtime, N: std::str::FromStr>(runtime: &R, key: &str) -> Result<Option<N>>
where
    N::Err: std::error::Error + Send + Sync + 'static,
{
    match runtime.env_var(key) {
        Ok(value) => value
            .trim()
            .parse::<N>()
            .map(Some)
            .with_context(|| format!("Invalid value for {}: {:?}", key, value)),
        Err(_) => Ok(None),
    }
}
