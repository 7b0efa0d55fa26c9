/// Client configuration.
///
/// Values come from an optional TOML file; the CLI overlays flags and
/// environment variables on top before calling [`ClientConfig::validate`].
use std::path::Path;
use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;

use crate::error::{DrmError, Result};
use crate::net::{NetOptions, RetryPolicy};

#[derive(Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Base URL of the license and content service.
    pub base_url: String,
    /// Identifier of this device, sent with every license request.
    pub device_id: String,
    /// Bearer token attached to license and content requests.
    pub auth_token: Option<String>,
    pub request_timeout_ms: u64,
    pub connect_timeout_ms: u64,
    pub retry: RetryConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryConfig {
    /// 0 disables retries entirely.
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            device_id: String::new(),
            auth_token: None,
            request_timeout_ms: 30_000,
            connect_timeout_ms: 10_000,
            retry: RetryConfig::default(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            base_delay_ms: 100,
            max_delay_ms: 5_000,
        }
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("device_id", &self.device_id)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[REDACTED]"))
            .field("request_timeout_ms", &self.request_timeout_ms)
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .field("retry", &self.retry)
            .finish()
    }
}

impl ClientConfig {
    /// Load from a TOML file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| DrmError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| DrmError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        self.base_url()?;
        if self.device_id.trim().is_empty() {
            return Err(DrmError::Config("device_id must not be empty".into()));
        }
        if self.request_timeout_ms == 0 || self.connect_timeout_ms == 0 {
            return Err(DrmError::Config("timeouts must be greater than zero".into()));
        }
        if self.retry.base_delay_ms > self.retry.max_delay_ms {
            return Err(DrmError::Config(
                "retry.base_delay_ms must not exceed retry.max_delay_ms".into(),
            ));
        }
        Ok(())
    }

    pub fn base_url(&self) -> Result<Url> {
        let url = Url::parse(&self.base_url)
            .map_err(|e| DrmError::Config(format!("invalid base_url {:?}: {e}", self.base_url)))?;
        if url.cannot_be_a_base() {
            return Err(DrmError::Config(format!(
                "base_url {:?} cannot carry paths",
                self.base_url
            )));
        }
        Ok(url)
    }

    pub fn net_options(&self) -> NetOptions {
        NetOptions {
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            retry_policy: RetryPolicy::new(
                self.retry.max_retries,
                Duration::from_millis(self.retry.base_delay_ms),
                Duration::from_millis(self.retry.max_delay_ms),
            ),
            auth_token: self.auth_token.clone(),
        }
    }
}
