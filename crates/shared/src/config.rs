//! Configuration management for the release finder.
//!
//! This module handles loading and parsing configuration from TOML files,
//! with sensible defaults for all settings. Every outbound service is
//! addressed through a base URL here so the pipeline can be pointed at
//! mirrors or local mock servers.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Outbound HTTP settings
    #[serde(default)]
    pub http: HttpConfig,

    /// External service endpoints
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Release aggregation settings
    #[serde(default)]
    pub aggregator: AggregatorConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log directory path
    pub log_dir: String,

    /// Default log level (trace, debug, info, warn, error)
    pub default_level: String,

    /// Enable console output
    pub console: bool,

    /// Enable file output
    pub file: bool,

    /// Enable JSON formatting for file logs
    pub json_format: bool,
}

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Maximum retries for transient failures (network, timeout, 5xx)
    pub max_retries: u32,

    /// Retry delay in milliseconds (exponential backoff base)
    pub retry_delay_ms: u64,

    /// User agent sent with every request
    pub user_agent: String,
}

/// Base URLs of the external services
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    /// find-my-anime cross-mapping service
    pub find_my_anime_url: String,

    /// ani.zip mapping service
    pub ani_zip_url: String,

    /// zenshin community mapping service
    pub zenshin_url: String,

    /// animetosho JSON feed
    pub feed_url: String,

    /// Nyaa search provider
    pub search_url: String,

    /// releases.moe (SeaDex) API
    pub seadex_url: String,

    /// Order in which mapping providers are tried
    pub mapping_order: Vec<String>,
}

/// Release aggregation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatorConfig {
    /// Maximum number of detail pages fetched concurrently
    pub concurrency: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: "logs".to_string(),
            default_level: "info".to_string(),
            console: true,
            file: false,
            json_format: false,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 20,
            max_retries: 1,
            retry_delay_ms: 500,
            user_agent: concat!("release-finder/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            find_my_anime_url: "https://find-my-anime.dtimur.de".to_string(),
            ani_zip_url: "https://api.ani.zip".to_string(),
            zenshin_url: "https://zenshin-supabase-api.onrender.com".to_string(),
            feed_url: "https://feed.animetosho.org".to_string(),
            search_url: "https://nyaa.si".to_string(),
            seadex_url: "https://releases.moe".to_string(),
            // Episode-bearing providers first
            mapping_order: vec![
                "ani_zip".to_string(),
                "zenshin".to_string(),
                "find_my_anime".to_string(),
            ],
        }
    }
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self { concurrency: 4 }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// If the file doesn't exist, returns the default configuration.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::warn!(
                path = %path.display(),
                "Config file not found, using defaults"
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        tracing::info!(
            path = %path.display(),
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = toml::to_string_pretty(self)
            .context("Failed to serialize configuration")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::info!(
            path = %path.display(),
            "Configuration saved successfully"
        );

        Ok(())
    }

    /// Aggregator fan-out width, never below one
    pub fn concurrency(&self) -> usize {
        self.aggregator.concurrency.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.http.timeout_secs, 20);
        assert_eq!(config.providers.feed_url, "https://feed.animetosho.org");
        assert_eq!(config.providers.mapping_order[0], "ani_zip");
        assert_eq!(config.concurrency(), 4);
    }

    #[test]
    fn test_save_and_load_config() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("config.toml");

        let mut original_config = Config::default();
        original_config.providers.search_url = "http://127.0.0.1:9999".to_string();
        original_config.save(&config_path)?;

        assert!(config_path.exists());

        let loaded_config = Config::from_file(&config_path)?;
        assert_eq!(loaded_config.providers.search_url, "http://127.0.0.1:9999");
        assert_eq!(loaded_config.http.max_retries, original_config.http.max_retries);

        Ok(())
    }

    #[test]
    fn test_partial_config_fills_defaults() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("config.toml");
        std::fs::write(&config_path, "[aggregator]\nconcurrency = 0\n")?;

        let config = Config::from_file(&config_path)?;
        assert_eq!(config.concurrency(), 1);
        assert_eq!(config.logging.default_level, "info");

        Ok(())
    }

    #[test]
    fn test_load_nonexistent_config() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        // Should return default config without error
        assert_eq!(config.providers.ani_zip_url, "https://api.ani.zip");
    }
}
