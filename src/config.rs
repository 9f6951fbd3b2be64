use std::env;
use std::time::Duration;

use crate::error::{PixVaultError, Result};

pub const DEFAULT_API_URL: &str = "https://api.pixvault.io/v1";
pub const DEFAULT_IMAGE_URL: &str = "https://img.pixvault.io";
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(180);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_key: Option<String>,
    pub api_url: String,
    pub image_url: String,
    pub poll_timeout: Duration,
    pub poll_interval: Duration,
    pub request_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            api_key: None,
            api_url: DEFAULT_API_URL.to_string(),
            image_url: DEFAULT_IMAGE_URL.to_string(),
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: None,
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `PIXVAULT_API_KEY`, `PIXVAULT_API_URL`, `PIXVAULT_IMAGE_URL` and
    /// `PIXVAULT_POLL_TIMEOUT_SECS`. Unset variables keep their defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let api_key = env::var("PIXVAULT_API_KEY").ok();
        let api_url = env::var("PIXVAULT_API_URL").unwrap_or(defaults.api_url);
        let image_url = env::var("PIXVAULT_IMAGE_URL").unwrap_or(defaults.image_url);
        let poll_timeout = env::var("PIXVAULT_POLL_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.poll_timeout);

        ClientConfig {
            api_key,
            api_url,
            image_url,
            poll_timeout,
            ..defaults
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_image_url(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = image_url.into();
        self
    }

    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Per-request timeout applied to every HTTP call.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        match self.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => {}
            _ => return Err(PixVaultError::ConfigError("API key is required".into())),
        }
        if self.api_url.trim().is_empty() {
            return Err(PixVaultError::ConfigError("API URL is required".into()));
        }
        if self.image_url.trim().is_empty() {
            return Err(PixVaultError::ConfigError("Image URL is required".into()));
        }
        if self.poll_interval.is_zero() {
            return Err(PixVaultError::ConfigError(
                "Poll interval must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}
