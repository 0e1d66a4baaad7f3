use crate::config::{Config, ProxyConfig};
use std::env;
use std::time::Duration;

/// Base URLs of every upstream endpoint
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub omdb: String,
    pub spotify_api: String,
    pub spotify_token: String,
    pub youtube: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            omdb: "https://www.omdbapi.com/".to_string(),
            spotify_api: "https://api.spotify.com/v1".to_string(),
            spotify_token: "https://accounts.spotify.com/api/token".to_string(),
            youtube: "https://www.googleapis.com/youtube/v3".to_string(),
        }
    }
}

/// API configuration for all providers
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub omdb_api_key: Option<String>,
    pub spotify_client_id: Option<String>,
    pub spotify_client_secret: Option<String>,
    pub youtube_api_key: Option<String>,
    pub user_agent: String,
    pub request_timeout: Duration,
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub proxy_config: Option<ProxyConfig>,
    pub endpoints: Endpoints,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            omdb_api_key: None,
            spotify_client_id: None,
            spotify_client_secret: None,
            youtube_api_key: None,
            user_agent: "MediaRank/0.1".to_string(),
            request_timeout: Duration::from_secs(30),
            max_retries: 2,
            retry_delay: Duration::from_millis(500),
            proxy_config: None,
            endpoints: Endpoints::default(),
        }
    }
}

/// Builds [`ApiConfig`] from the persisted configuration and the environment
pub struct ApiConfigLoader;

impl ApiConfigLoader {
    /// Configuration file values first, then environment overrides
    pub fn load(config: &Config) -> ApiConfig {
        let mut api_config = Self::from_config(config);
        Self::apply_env(&mut api_config, |name| env::var(name).ok());
        api_config
    }

    pub fn from_config(config: &Config) -> ApiConfig {
        ApiConfig {
            omdb_api_key: non_empty(&config.api_keys.omdb_api_key),
            spotify_client_id: non_empty(&config.api_keys.spotify_client_id),
            spotify_client_secret: non_empty(&config.api_keys.spotify_client_secret),
            youtube_api_key: non_empty(&config.api_keys.youtube_api_key),
            user_agent: config.network.user_agent.clone(),
            request_timeout: Duration::from_secs(config.network.request_timeout_secs),
            max_retries: config.network.max_retries,
            retry_delay: Duration::from_millis(config.network.retry_delay_ms),
            proxy_config: Some(config.proxy_config.clone()),
            endpoints: config.endpoints.clone(),
        }
    }

    /// Override from environment variables; `lookup` is injectable for tests
    pub fn apply_env<F>(api_config: &mut ApiConfig, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(key) = lookup("OMDB_API_KEY") {
            api_config.omdb_api_key = Some(key);
        }
        if let Some(id) = lookup("SPOTIFY_CLIENT_ID") {
            api_config.spotify_client_id = Some(id);
        }
        if let Some(secret) = lookup("SPOTIFY_CLIENT_SECRET") {
            api_config.spotify_client_secret = Some(secret);
        }
        if let Some(key) = lookup("YOUTUBE_API_KEY") {
            api_config.youtube_api_key = Some(key);
        }
        if let Some(secs) = lookup("MEDIA_RANK_REQUEST_TIMEOUT").and_then(|s| s.parse().ok()) {
            api_config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(retries) = lookup("MEDIA_RANK_MAX_RETRIES").and_then(|s| s.parse().ok()) {
            api_config.max_retries = retries;
        }
        if let Some(ms) = lookup("MEDIA_RANK_RETRY_DELAY").and_then(|s| s.parse().ok()) {
            api_config.retry_delay = Duration::from_millis(ms);
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.clone().filter(|v| !v.trim().is_empty())
}

/// Example TOML configuration file content
pub const EXAMPLE_CONFIG: &str = r#"
[api_keys]
omdb_api_key = "your_omdb_api_key"
spotify_client_id = "your_spotify_client_id"
spotify_client_secret = "your_spotify_client_secret"
youtube_api_key = "your_youtube_api_key"

[network]
request_timeout_secs = 30
max_retries = 2
retry_delay_ms = 500

[cache]
ttl_secs = 604800
"#;
