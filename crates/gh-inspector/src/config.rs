//! Configuration file and environment overrides

use crate::error::{InspectorError, Result};
use crate::formatter::OutputFormat;
use repo_scoring::{ScoringConfig, Weights};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Checked when no `--config` is given
pub const DEFAULT_CONFIG_PATH: &str = "configs/config.yaml";

/// Token shipped in the example config file
const PLACEHOLDER_TOKEN: &str = "ghp_yourtokenhere";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub github_token: String,
    pub output_format: OutputFormat,
    pub cache: CacheConfig,
    pub scoring: ScoringConfig,
    pub server: ServerConfig,
    pub github: GithubConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    /// Seconds
    pub ttl: u64,
    /// Empty means [`ttl_kv_cache::DEFAULT_CACHE_DIR`]
    pub directory: String,
    /// Seconds, 0 disables the background sweep
    pub sweep_interval: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl: 3600,
            directory: String::new(),
            sweep_interval: ttl_kv_cache::DEFAULT_SWEEP_INTERVAL.as_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    /// Seconds allowed for one score request
    pub request_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            request_timeout: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    pub endpoint: String,
    /// Seconds
    pub timeout: u64,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            endpoint: github_client::GithubClient::DEFAULT_ENDPOINT.to_string(),
            timeout: github_client::GithubClient::DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

impl Config {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load `path`, else [`DEFAULT_CONFIG_PATH`] if present, else defaults,
    /// then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|e| {
                    InspectorError::Config(format!("cannot read {}: {}", path.display(), e))
                })?;
                info!(path = %path.display(), "Using config file");
                Self::from_yaml_str(&raw)?
            }
            None if Path::new(DEFAULT_CONFIG_PATH).is_file() => {
                let raw = std::fs::read_to_string(DEFAULT_CONFIG_PATH)?;
                info!(path = DEFAULT_CONFIG_PATH, "Using config file");
                Self::from_yaml_str(&raw)?
            }
            None => {
                info!("Using default config");
                Self::default()
            }
        };

        config.apply_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Apply `GITHUB_TOKEN`, `PORT` and `CACHE_DIR` from `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("GITHUB_TOKEN").filter(|t| !t.is_empty()) {
            self.github_token = token;
        }
        if let Some(port) = lookup("PORT").and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
        if let Some(dir) = lookup("CACHE_DIR").filter(|d| !d.is_empty()) {
            self.cache.directory = dir;
        }
    }

    /// The GitHub token, rejecting an unset or placeholder value
    pub fn token(&self) -> Result<&str> {
        let token = self.github_token.trim();
        if token.is_empty() || token == PLACEHOLDER_TOKEN {
            return Err(InspectorError::Config(
                "GitHub token is not set; set GITHUB_TOKEN or github_token in the config file"
                    .to_string(),
            ));
        }
        Ok(token)
    }

    pub fn weights(&self) -> Weights {
        self.scoring.weights.or_defaults()
    }

    pub fn cache_dir(&self) -> PathBuf {
        if self.cache.directory.is_empty() {
            PathBuf::from(ttl_kv_cache::DEFAULT_CACHE_DIR)
        } else {
            PathBuf::from(&self.cache.directory)
        }
    }

    pub fn cache_options(&self) -> ttl_kv_cache::CacheOptions {
        ttl_kv_cache::CacheOptions {
            directory: self.cache_dir(),
            sweep_interval: Duration::from_secs(self.cache.sweep_interval),
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout)
    }

    pub fn github_timeout(&self) -> Duration {
        Duration::from_secs(self.github.timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const FULL_YAML: &str = r#"
github_token: "ghp_realtoken"
output_format: JSON
cache:
  enabled: false
  ttl: 600
  directory: /tmp/gh-cache
  sweep_interval: 60
scoring:
  weights:
    stars: 0.30
    recent_activity: 0
server:
  port: 9090
  request_timeout: 10
github:
  endpoint: http://localhost:4000/graphql
  timeout: 5
"#;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.cache.enabled);
        assert_eq!(config.cache_ttl(), Duration::from_secs(3600));
        assert_eq!(config.cache_dir(), PathBuf::from(".gh-inspector-cache"));
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.output_format, OutputFormat::Table);
        assert_eq!(config.github.endpoint, "https://api.github.com/graphql");
        assert_eq!(config.weights(), Weights::default());
    }

    #[test]
    fn test_full_yaml() {
        let config = Config::from_yaml_str(FULL_YAML).unwrap();

        assert_eq!(config.token().unwrap(), "ghp_realtoken");
        assert_eq!(config.output_format, OutputFormat::Json);
        assert!(!config.cache.enabled);
        assert_eq!(config.cache_ttl(), Duration::from_secs(600));
        assert_eq!(config.cache_dir(), PathBuf::from("/tmp/gh-cache"));
        assert_eq!(
            config.cache_options().sweep_interval,
            Duration::from_secs(60)
        );
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.github.endpoint, "http://localhost:4000/graphql");
        assert_eq!(config.github_timeout(), Duration::from_secs(5));

        let weights = config.weights();
        assert_eq!(weights.stars, 0.30);
        assert_eq!(weights.recent_activity, Weights::default().recent_activity);
    }

    #[test]
    fn test_partial_and_empty_yaml() {
        let config = Config::from_yaml_str("server:\n  port: 3000\n").unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.request_timeout, 30);
        assert!(config.cache.enabled);

        assert_eq!(Config::from_yaml_str("").unwrap(), Config::default());
    }

    #[test]
    fn test_invalid_yaml_is_error() {
        let err = Config::from_yaml_str("output_format: xml\n").unwrap_err();
        assert!(matches!(err, InspectorError::Yaml(_)));

        let err = Config::from_yaml_str("server: [1, 2").unwrap_err();
        assert!(matches!(err, InspectorError::Yaml(_)));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("GITHUB_TOKEN", "ghp_fromenv"),
            ("PORT", "7000"),
            ("CACHE_DIR", "/var/cache/gh"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::from_yaml_str(FULL_YAML).unwrap();
        config.apply_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.token().unwrap(), "ghp_fromenv");
        assert_eq!(config.server.port, 7000);
        assert_eq!(config.cache_dir(), PathBuf::from("/var/cache/gh"));
    }

    #[test]
    fn test_bad_port_override_is_ignored() {
        let mut config = Config::default();
        config.apply_overrides(|k| (k == "PORT").then(|| "not-a-port".to_string()));
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_missing_or_placeholder_token() {
        let config = Config::default();
        assert!(matches!(config.token(), Err(InspectorError::Config(_))));

        let config = Config {
            github_token: "ghp_yourtokenhere".to_string(),
            ..Config::default()
        };
        assert!(matches!(config.token(), Err(InspectorError::Config(_))));
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "cache:\n  ttl: 42\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.cache_ttl(), Duration::from_secs(42));
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(Some(&dir.path().join("nope.yaml"))).unwrap_err();
        assert!(matches!(err, InspectorError::Config(_)));
    }
}
