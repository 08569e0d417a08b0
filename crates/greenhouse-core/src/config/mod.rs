//! Runtime configuration for the offline queue and the upload client.

use std::time::Duration;

use crate::error::{Error, Result};
use crate::util::{is_http_url, normalize_text_option};

/// Storage key holding the serialized queue.
///
/// Shared with previously shipped clients; changing it orphans existing data.
pub const DEFAULT_STORAGE_KEY: &str = "@smart_greenhouse_offline_data";

const DEFAULT_WRITE_ATTEMPTS: u32 = 3;
const DEFAULT_RETRY_BACKOFF_MS: u64 = 50;
const DEFAULT_BATCH_PATH: &str = "/data/upload/batch";
const DEFAULT_UPLOAD_TIMEOUT_SECS: u64 = 15;
/// Maximum records per upload request unless configured otherwise.
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Configuration for an [`OfflineQueueStore`](crate::OfflineQueueStore).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueConfig {
    /// Key the record set is persisted under
    pub storage_key: String,
    /// Total write attempts per mutation (at least one)
    pub write_attempts: u32,
    /// Delay between write attempts
    pub retry_backoff: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            write_attempts: DEFAULT_WRITE_ATTEMPTS,
            retry_backoff: Duration::from_millis(DEFAULT_RETRY_BACKOFF_MS),
        }
    }
}

impl QueueConfig {
    #[must_use]
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    /// Set the total number of write attempts. Zero is treated as one.
    #[must_use]
    pub const fn with_write_attempts(mut self, attempts: u32) -> Self {
        self.write_attempts = if attempts == 0 { 1 } else { attempts };
        self
    }

    #[must_use]
    pub const fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    /// Disable write retries (single attempt, no backoff)
    #[must_use]
    pub const fn without_retry(mut self) -> Self {
        self.write_attempts = 1;
        self.retry_backoff = Duration::ZERO;
        self
    }
}

/// Connection settings for the greenhouse backend upload endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadConfig {
    /// API base URL without trailing slash (e.g. `https://api.smartgreenhouse.com`)
    pub base_url: String,
    /// Bearer token sent with each upload
    pub auth_token: Option<String>,
    /// Path of the batch upload endpoint
    pub batch_path: String,
    /// Request timeout
    pub timeout: Duration,
    /// Maximum records per upload request
    pub batch_size: usize,
}

impl std::fmt::Debug for UploadConfig {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("UploadConfig")
            .field("base_url", &self.base_url)
            .field(
                "auth_token",
                &self.auth_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("batch_path", &self.batch_path)
            .field("timeout", &self.timeout)
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

impl UploadConfig {
    /// Create a config for the given base URL.
    ///
    /// The URL must use `http://` or `https://`; a trailing slash is trimmed.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            base_url: normalize_base_url(base_url.into())?,
            auth_token: None,
            batch_path: DEFAULT_BATCH_PATH.to_string(),
            timeout: Duration::from_secs(DEFAULT_UPLOAD_TIMEOUT_SECS),
            batch_size: DEFAULT_BATCH_SIZE,
        })
    }

    /// Build from raw optional values read from the environment.
    ///
    /// Returns `Ok(None)` when no base URL is provided.
    pub fn from_raw(base_url: Option<String>, auth_token: Option<String>) -> Result<Option<Self>> {
        let Some(base_url) = normalize_text_option(base_url) else {
            return Ok(None);
        };
        let mut config = Self::new(base_url)?;
        config.auth_token = normalize_text_option(auth_token);
        Ok(Some(config))
    }

    #[must_use]
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = normalize_text_option(Some(token.into()));
        self
    }

    #[must_use]
    pub fn with_batch_path(mut self, path: impl Into<String>) -> Self {
        let path = path.into();
        let path = path.trim();
        self.batch_path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the batch size. Zero is treated as one.
    #[must_use]
    pub const fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = if batch_size == 0 { 1 } else { batch_size };
        self
    }

    /// Full URL of the batch upload endpoint
    pub fn batch_url(&self) -> String {
        format!("{}{}", self.base_url, self.batch_path)
    }
}

fn normalize_base_url(raw: String) -> Result<String> {
    let value = normalize_text_option(Some(raw))
        .ok_or_else(|| Error::InvalidInput("API base URL is required".to_string()))?;
    if is_http_url(&value) {
        Ok(value.trim_end_matches('/').to_string())
    } else {
        Err(Error::InvalidInput(format!(
            "API base URL must include http:// or https://, got '{value}'"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_config_defaults_to_shared_key() {
        let config = QueueConfig::default();
        assert_eq!(config.storage_key, "@smart_greenhouse_offline_data");
        assert_eq!(config.write_attempts, 3);
    }

    #[test]
    fn queue_config_clamps_zero_attempts() {
        let config = QueueConfig::default().with_write_attempts(0);
        assert_eq!(config.write_attempts, 1);
    }

    #[test]
    fn upload_config_trims_trailing_slash() {
        let config = UploadConfig::new(" https://api.example.com/ ").unwrap();
        assert_eq!(config.base_url, "https://api.example.com");
        assert_eq!(config.batch_url(), "https://api.example.com/data/upload/batch");
        assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);
    }

    #[test]
    fn upload_config_requires_http_scheme() {
        assert!(UploadConfig::new("api.example.com").is_err());
        assert!(UploadConfig::new("   ").is_err());
    }

    #[test]
    fn upload_config_from_raw_skips_missing_url() {
        assert_eq!(UploadConfig::from_raw(None, Some("token".into())).unwrap(), None);
        assert_eq!(UploadConfig::from_raw(Some(" ".into()), None).unwrap(), None);

        let config = UploadConfig::from_raw(
            Some("http://192.168.0.2:8080".into()),
            Some("  ".into()),
        )
        .unwrap()
        .unwrap();
        assert_eq!(config.auth_token, None);
    }

    #[test]
    fn upload_config_batch_path_gets_leading_slash() {
        let config = UploadConfig::new("https://api.example.com")
            .unwrap()
            .with_batch_path("observations/batch");
        assert_eq!(
            config.batch_url(),
            "https://api.example.com/observations/batch"
        );
    }

    #[test]
    fn upload_config_debug_redacts_token() {
        let config = UploadConfig::new("https://api.example.com")
            .unwrap()
            .with_auth_token("secret-token");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("secret-token"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
