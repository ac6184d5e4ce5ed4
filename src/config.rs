//! Client Configuration
//!
//! JSON file with every field defaulted, plus a `WELFARE_API_URL` override.

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Url;
use serde::{Deserialize, Serialize};

/// Environment variable that overrides `api_base_url`
pub const API_URL_ENV: &str = "WELFARE_API_URL";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid api url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// When a new submission may start while another is in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GuardPolicy {
    /// Block only when the new input is invalid *and* a submission is in
    /// flight. Valid input goes through even while another request runs,
    /// and invalid input goes through when nothing else is running.
    #[default]
    Permissive,
    /// Block when the input is invalid or a submission is in flight.
    Strict,
}

impl GuardPolicy {
    pub fn blocks(&self, valid: bool, in_flight: bool) -> bool {
        match self {
            GuardPolicy::Permissive => !valid && in_flight,
            GuardPolicy::Strict => !valid || in_flight,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub toast_duration_ms: u64,
    pub request_timeout_secs: u64,
    pub guard_policy: GuardPolicy,
    pub log_dir: Option<PathBuf>,
    pub app_name: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000/api/".to_string(),
            toast_duration_ms: 5000,
            request_timeout_secs: 30,
            guard_policy: GuardPolicy::default(),
            log_dir: None,
            app_name: "WelfareClient".to_string(),
        }
    }
}

impl ClientConfig {
    /// Read a JSON config file, then apply the environment override
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let mut config: ClientConfig = serde_json::from_str(&text)?;
        config.override_api_url(std::env::var(API_URL_ENV).ok());
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Defaults plus the environment override
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.override_api_url(std::env::var(API_URL_ENV).ok());
        config
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    fn override_api_url(&mut self, value: Option<String>) {
        if let Some(url) = value.filter(|url| !url.trim().is_empty()) {
            self.api_base_url = url.trim().to_string();
        }
    }

    /// API root with a trailing slash, so resource paths join beneath it
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidUrl {
            url: self.api_base_url.clone(),
            reason,
        };

        let mut raw = self.api_base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let url = Url::parse(&raw).map_err(|e| invalid(e.to_string()))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(invalid(format!("unsupported scheme {}", other))),
        }
    }

    pub fn toast_duration(&self) -> Duration {
        Duration::from_millis(self.toast_duration_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.log_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("welfare-client").join("logs"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_policies() {
        assert!(!GuardPolicy::Permissive.blocks(false, false));
        assert!(!GuardPolicy::Permissive.blocks(true, true));
        assert!(GuardPolicy::Permissive.blocks(false, true));

        assert!(GuardPolicy::Strict.blocks(false, false));
        assert!(GuardPolicy::Strict.blocks(true, true));
        assert!(!GuardPolicy::Strict.blocks(true, false));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"guard_policy":"strict","toast_duration_ms":1500}"#).unwrap();

        let mut config: ClientConfig =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        config.override_api_url(None);

        assert_eq!(config.guard_policy, GuardPolicy::Strict);
        assert_eq!(config.toast_duration(), Duration::from_millis(1500));
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.app_name, "WelfareClient");
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = ClientConfig {
            api_base_url: "https://hr.example.com/api/v1/".to_string(),
            ..ClientConfig::default()
        };
        config.save(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let loaded: ClientConfig = serde_json::from_str(&text).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_env_override() {
        let mut config = ClientConfig::default();
        config.override_api_url(Some("  ".to_string()));
        assert_eq!(config.api_base_url, "http://localhost:8000/api/");
        config.override_api_url(Some("https://staging.example.com/api".to_string()));
        assert_eq!(config.api_base_url, "https://staging.example.com/api");
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let config = ClientConfig {
            api_base_url: "https://hr.example.com/api".to_string(),
            ..ClientConfig::default()
        };
        let url = config.base_url().unwrap();
        assert_eq!(url.join("loans").unwrap().as_str(), "https://hr.example.com/api/loans");
    }

    #[test]
    fn test_base_url_rejects_other_schemes() {
        let config = ClientConfig {
            api_base_url: "ftp://hr.example.com/".to_string(),
            ..ClientConfig::default()
        };
        assert!(matches!(config.base_url(), Err(ConfigError::InvalidUrl { .. })));
    }

    #[test]
    fn test_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(ClientConfig::load(&path), Err(ConfigError::Parse(_))));
    }
}
