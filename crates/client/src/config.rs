//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `HRFB_API_BASE_URL` - Backend base URL (default: `http://localhost:8000`)
//! - `HRFB_REQUEST_TIMEOUT_SECS` - Per-request timeout in seconds (default: 30)
//! - `HRFB_DATA_DIR` - Directory for file-backed storage (default: `.hrfb`)
//! - `HRFB_TEAM_WRITE_POLICY` - `optimistic` or `strict` (default: `optimistic`)
//! - `HRFB_FORM_WRITE_POLICY` - `optimistic` or `strict` (default: `strict`)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::resources::WritePolicy;

const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_DATA_DIR: &str = ".hrfb";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL, without trailing slash
    pub api_base_url: String,
    /// Timeout applied to every backend request
    pub request_timeout: Duration,
    /// Directory holding `local.json` and `session.json` for file storage
    pub data_dir: PathBuf,
    /// Write policy of the team store
    pub team_write_policy: WritePolicy,
    /// Write policy of the form-template store
    pub form_write_policy: WritePolicy,
}

impl ClientConfig {
    /// Configuration pointing at `api_base_url` with defaults for everything else.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the URL is not an absolute http(s) URL.
    pub fn new(api_base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            api_base_url: parse_base_url("api_base_url", api_base_url)?,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            team_write_policy: WritePolicy::Optimistic,
            form_write_policy: WritePolicy::Strict,
        })
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let base_url = get_env_or_default("HRFB_API_BASE_URL", DEFAULT_API_BASE_URL);
        let mut config = Self::new(&base_url)
            .map_err(|e| ConfigError::InvalidEnvVar("HRFB_API_BASE_URL".to_string(), e.to_string()))?;

        config.request_timeout = Duration::from_secs(
            get_env_or_default("HRFB_REQUEST_TIMEOUT_SECS", &DEFAULT_TIMEOUT_SECS.to_string())
                .parse::<u64>()
                .map_err(|e| {
                    ConfigError::InvalidEnvVar("HRFB_REQUEST_TIMEOUT_SECS".to_string(), e.to_string())
                })?,
        );
        if let Some(dir) = get_optional_env("HRFB_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(policy) = get_optional_env("HRFB_TEAM_WRITE_POLICY") {
            config.team_write_policy = parse_policy("HRFB_TEAM_WRITE_POLICY", &policy)?;
        }
        if let Some(policy) = get_optional_env("HRFB_FORM_WRITE_POLICY") {
            config.form_write_policy = parse_policy("HRFB_FORM_WRITE_POLICY", &policy)?;
        }

        Ok(config)
    }

    /// Override the data directory.
    #[must_use]
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    /// Override the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Override both write policies.
    #[must_use]
    pub const fn with_write_policies(mut self, teams: WritePolicy, forms: WritePolicy) -> Self {
        self.team_write_policy = teams;
        self.form_write_policy = forms;
        self
    }

    /// Path of the shared (local) storage file.
    #[must_use]
    pub fn local_storage_path(&self) -> PathBuf {
        self.data_dir.join("local.json")
    }

    /// Path of the tab-scoped (session) storage file.
    #[must_use]
    pub fn tab_storage_path(&self) -> PathBuf {
        self.data_dir.join("session.json")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

fn parse_base_url(key: &str, value: &str) -> Result<String, ConfigError> {
    let url = Url::parse(value.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme {}", url.scheme()),
        ));
    }
    Ok(url.as_str().trim_end_matches('/').to_string())
}

fn parse_policy(key: &str, value: &str) -> Result<WritePolicy, ConfigError> {
    value
        .parse()
        .map_err(|e: String| ConfigError::InvalidEnvVar(key.to_string(), e))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_normalizes_trailing_slash() {
        let config = ClientConfig::new("http://localhost:8000/").unwrap();
        assert_eq!(config.api_base_url, "http://localhost:8000");

        let config = ClientConfig::new("https://hr.example.com/backend/").unwrap();
        assert_eq!(config.api_base_url, "https://hr.example.com/backend");
    }

    #[test]
    fn test_new_rejects_bad_urls() {
        assert!(ClientConfig::new("not a url").is_err());
        assert!(ClientConfig::new("ftp://files.example.com").is_err());
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::new(DEFAULT_API_BASE_URL).unwrap();
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.team_write_policy, WritePolicy::Optimistic);
        assert_eq!(config.form_write_policy, WritePolicy::Strict);
        assert_eq!(
            config.local_storage_path(),
            PathBuf::from(".hrfb").join("local.json")
        );
    }

    #[test]
    fn test_parse_policy() {
        assert_eq!(
            parse_policy("X", "STRICT").unwrap(),
            WritePolicy::Strict
        );
        assert!(matches!(
            parse_policy("X", "eventually"),
            Err(ConfigError::InvalidEnvVar(..))
        ));
    }
}
