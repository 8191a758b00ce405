//! Client and application configuration.
//!
//! `ClientConfig` is the transport's base configuration (base URL, timeout,
//! default headers, navigation paths). `AppConfig` is the small persisted
//! file the console keeps between runs.
//!
//! The application config is stored at `~/.config/carehub/config.json`.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};

/// Application name used for config/data directory paths
const APP_NAME: &str = "carehub";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Default API root when nothing else is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Login entry point the host navigates to on forced logout
pub const DEFAULT_LOGIN_PATH: &str = "/login";

/// Path prefix of the separately-privileged superuser area
pub const DEFAULT_SUPERUSER_PREFIX: &str = "/superuser";

const ENV_API_URL: &str = "CAREHUB_API_URL";
const ENV_TIMEOUT_SECS: &str = "CAREHUB_TIMEOUT_SECS";
const ENV_COOKIE_DOMAIN: &str = "CAREHUB_COOKIE_DOMAIN";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub default_headers: HeaderMap,
    pub login_path: String,
    pub superuser_prefix: String,
    /// Host whose cookies belong to this session. Falls back to the host of
    /// `base_url` when unset.
    pub cookie_domain: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            default_headers: HeaderMap::new(),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            superuser_prefix: DEFAULT_SUPERUSER_PREFIX.to_string(),
            cookie_domain: None,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Defaults overlaid with `CAREHUB_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(url) = lookup(ENV_API_URL).filter(|s| !s.is_empty()) {
            config.base_url = url;
        }
        if let Some(secs) = lookup(ENV_TIMEOUT_SECS) {
            let secs: u64 = secs
                .trim()
                .parse()
                .with_context(|| format!("Invalid {}: {:?}", ENV_TIMEOUT_SECS, secs))?;
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(domain) = lookup(ENV_COOKIE_DOMAIN).filter(|s| !s.is_empty()) {
            config.cookie_domain = Some(domain);
        }
        Ok(config)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Host used for cookie teardown: explicit cookie domain, else the API host.
    pub fn cookie_host(&self) -> Option<String> {
        if let Some(ref domain) = self.cookie_domain {
            return Some(domain.trim_start_matches('.').to_ascii_lowercase());
        }
        reqwest::Url::parse(&self.base_url)
            .ok()
            .and_then(|url| url.host_str().map(|h| h.to_ascii_lowercase()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub api_url: Option<String>,
    pub last_email: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Ok(serde_json::from_str(&contents).context("Failed to parse config file")?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory holding the durable session store and log files.
    pub fn data_dir(&self) -> Result<PathBuf> {
        let data_dir = dirs::data_local_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    /// Apply the persisted API URL on top of an environment-derived config.
    /// The environment wins when it sets one explicitly.
    pub fn apply(&self, config: &mut ClientConfig) {
        if config.base_url == DEFAULT_BASE_URL {
            if let Some(ref url) = self.api_url {
                config.base_url = url.clone();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_env() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.login_path, "/login");
        assert_eq!(config.superuser_prefix, "/superuser");
    }

    #[test]
    fn test_env_overrides() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("CAREHUB_API_URL", "https://api.carehub.org"),
            ("CAREHUB_TIMEOUT_SECS", " 5 "),
            ("CAREHUB_COOKIE_DOMAIN", ".carehub.org"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "https://api.carehub.org");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.cookie_host().as_deref(), Some("carehub.org"));
    }

    #[test]
    fn test_invalid_timeout_is_rejected() {
        let err = ClientConfig::from_lookup(lookup(&[("CAREHUB_TIMEOUT_SECS", "soon")]))
            .unwrap_err();
        assert!(err.to_string().contains("CAREHUB_TIMEOUT_SECS"));
    }

    #[test]
    fn test_cookie_host_from_base_url() {
        let config = ClientConfig::new("https://Admin.CareHub.org/api");
        assert_eq!(config.cookie_host().as_deref(), Some("admin.carehub.org"));
    }

    #[test]
    fn test_app_config_applies_only_over_default_url() {
        let app = AppConfig {
            api_url: Some("https://saved.carehub.org".to_string()),
            last_email: None,
        };

        let mut config = ClientConfig::default();
        app.apply(&mut config);
        assert_eq!(config.base_url, "https://saved.carehub.org");

        let mut config = ClientConfig::new("https://env.carehub.org");
        app.apply(&mut config);
        assert_eq!(config.base_url, "https://env.carehub.org");
    }
}
