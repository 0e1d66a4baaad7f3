use crate::api::Endpoints;
use crate::errors::{MediaRankError, Result};
use crate::pipeline::ranking::EngagementWeights;
use crate::providers::Provider;
use crate::utils::logger::Logger;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// API Keys configuration for the three providers
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiKeys {
    pub omdb_api_key: Option<String>,
    pub spotify_client_id: Option<String>,
    pub spotify_client_secret: Option<String>,
    pub youtube_api_key: Option<String>,
}

/// HTTP behaviour shared by every provider
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub request_timeout_secs: u64,
    /// Retries for throttling and server errors; 0 disables retrying
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub user_agent: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            max_retries: 2,
            retry_delay_ms: 500,
            user_agent: "MediaRank/0.1".to_string(),
        }
    }
}

/// Proxy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: "127.0.0.1".to_string(),
            port: 1080,
            username: None,
            password: None,
        }
    }
}

/// Where cached results live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    File,
    Memory,
}

/// Result cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    pub directory: PathBuf,
    /// Entry lifetime in seconds; 0 keeps entries until invalidated
    pub ttl_secs: u64,
}

impl CacheConfig {
    pub fn ttl(&self) -> Option<Duration> {
        (self.ttl_secs > 0).then(|| Duration::from_secs(self.ttl_secs))
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::File,
            directory: dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("media-rank"),
            ttl_secs: 7 * 24 * 60 * 60,
        }
    }
}

/// Per-provider limit on concurrent detail lookups
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FanOutLimits {
    pub omdb: usize,
    pub spotify: usize,
    pub youtube: usize,
}

impl Default for FanOutLimits {
    fn default() -> Self {
        Self {
            omdb: 4,
            spotify: 4,
            youtube: 8,
        }
    }
}

impl FanOutLimits {
    pub fn for_provider(&self, provider: Provider) -> usize {
        match provider {
            Provider::Omdb => self.omdb,
            Provider::Spotify => self.spotify,
            Provider::Youtube => self.youtube,
        }
    }

    pub fn set(&mut self, provider: Provider, limit: usize) {
        let limit = limit.max(1);
        match provider {
            Provider::Omdb => self.omdb = limit,
            Provider::Spotify => self.spotify = limit,
            Provider::Youtube => self.youtube = limit,
        }
    }
}

/// Pipeline limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Hard cap on pages fetched by one listing walk
    pub max_pages: u32,
    pub concurrency: FanOutLimits,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_pages: 10_000,
            concurrency: FanOutLimits::default(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_keys: ApiKeys,
    pub network: NetworkConfig,
    pub proxy_config: ProxyConfig,
    pub cache: CacheConfig,
    pub pipeline: PipelineConfig,
    pub scoring: EngagementWeights,
    pub endpoints: Endpoints,
}

impl Config {
    /// Get the configuration directory path
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .ok_or_else(|| MediaRankError::Config("Could not find config directory".to_string()))
            .map(|dir| dir.join("media-rank"))
    }

    /// Get the default settings file path (TOML format)
    pub fn settings_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load from `path`, or the default location. A missing file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::settings_path()?,
        };

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .map_err(|e| MediaRankError::Config(format!("Failed to read settings file: {}", e)))?;
        let config = Self::parse(&path, &content)?;
        Logger::log_config_loaded(&path.display().to_string());
        Ok(config)
    }

    fn parse(path: &Path, content: &str) -> Result<Self> {
        if is_json(path) {
            serde_json::from_str(content).map_err(|e| {
                MediaRankError::Config(format!("Failed to parse JSON settings file: {}", e))
            })
        } else {
            toml::from_str(content)
                .map_err(|e| MediaRankError::Config(format!("Failed to parse settings file: {}", e)))
        }
    }

    /// Save to `path` in the format its extension names (TOML unless `.json`)
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                MediaRankError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = if is_json(path) {
            serde_json::to_string_pretty(self)?
        } else {
            toml::to_string_pretty(self)?
        };
        std::fs::write(path, content)
            .map_err(|e| MediaRankError::Config(format!("Failed to write settings file: {}", e)))?;
        Logger::log_config_saved(&path.display().to_string());
        Ok(())
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [api_keys]
            youtube_api_key = "abc"

            [pipeline.concurrency]
            youtube = 2
            "#,
        )
        .unwrap();

        assert_eq!(config.api_keys.youtube_api_key.as_deref(), Some("abc"));
        assert_eq!(config.pipeline.concurrency.youtube, 2);
        assert_eq!(config.pipeline.concurrency.spotify, 4);
        assert_eq!(config.pipeline.max_pages, 10_000);
        assert_eq!(config.scoring, EngagementWeights::default());
        assert_eq!(config.network.request_timeout_secs, 30);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config.cache.ttl(), Some(Duration::from_secs(604_800)));
    }

    #[test]
    fn test_save_and_load_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.api_keys.omdb_api_key = Some("k".to_string());
        config.cache.ttl_secs = 0;

        for name in ["config.toml", "config.json"] {
            let path = dir.path().join("nested").join(name);
            config.save(&path).unwrap();
            let loaded = Config::load(Some(&path)).unwrap();
            assert_eq!(loaded.api_keys.omdb_api_key.as_deref(), Some("k"));
            assert_eq!(loaded.cache.ttl(), None);
        }

        let json = std::fs::read_to_string(dir.path().join("nested/config.json")).unwrap();
        assert!(json.trim_start().starts_with('{'));
    }

    #[test]
    fn test_concurrency_is_at_least_one() {
        let mut limits = FanOutLimits::default();
        limits.set(Provider::Omdb, 0);
        assert_eq!(limits.for_provider(Provider::Omdb), 1);
    }

    #[test]
    fn test_malformed_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "network = 5").unwrap();
        assert!(matches!(
            Config::load(Some(&path)),
            Err(MediaRankError::Config(_))
        ));
    }
}
