use crate::config::Config;
use crate::errors::{MediaRankError, Result};
use crate::providers::Provider;
use std::path::{Path, PathBuf};

/// Longest accepted cache lifetime (100 years)
pub const MAX_CACHE_TTL_SECS: u64 = 100 * 365 * 24 * 60 * 60;

/// Settings management module
/// Loads the configuration from one file and writes every change back to it
#[derive(Debug, Clone)]
pub struct Settings {
    config: Config,
    path: PathBuf,
}

impl Settings {
    /// Load settings from `path`, or from the default location
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => Config::settings_path()?,
        };
        let config = Config::load(Some(&path))?;
        Ok(Self { config, path })
    }

    /// Get a reference to the current configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// File the settings are saved to
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Save the current configuration to file
    pub fn save(&self) -> Result<()> {
        self.config.save(&self.path)
    }

    /// Set OMDb API key
    pub fn set_omdb_api_key(&mut self, api_key: String) -> Result<()> {
        self.config.api_keys.omdb_api_key = Some(required("API key", api_key)?);
        self.save()
    }

    /// Set Spotify API credentials
    pub fn set_spotify_credentials(&mut self, client_id: String, client_secret: String) -> Result<()> {
        self.config.api_keys.spotify_client_id = Some(required("client id", client_id)?);
        self.config.api_keys.spotify_client_secret = Some(required("client secret", client_secret)?);
        self.save()
    }

    /// Set YouTube Data API key
    pub fn set_youtube_api_key(&mut self, api_key: String) -> Result<()> {
        self.config.api_keys.youtube_api_key = Some(required("API key", api_key)?);
        self.save()
    }

    /// Set the cache entry lifetime; `None` keeps entries until removed
    pub fn set_cache_ttl(&mut self, ttl_secs: Option<u64>) -> Result<()> {
        if let Some(secs) = ttl_secs.filter(|secs| *secs > MAX_CACHE_TTL_SECS) {
            return Err(MediaRankError::InvalidInput(format!(
                "Cache TTL of {}s is too long; use at most {}s or 'never'",
                secs, MAX_CACHE_TTL_SECS
            )));
        }
        self.config.cache.ttl_secs = ttl_secs.unwrap_or(0);
        self.save()
    }

    /// Set how many detail lookups may run at once for `provider`
    pub fn set_concurrency(&mut self, provider: Provider, limit: usize) -> Result<()> {
        if limit == 0 {
            return Err(MediaRankError::InvalidInput(
                "Concurrency must be at least 1".to_string(),
            ));
        }
        self.config.pipeline.concurrency.set(provider, limit);
        self.save()
    }

    /// Restore every setting to its default value
    pub fn reset(&mut self) -> Result<()> {
        self.config = Config::default();
        self.save()
    }
}

fn required(name: &str, value: String) -> Result<String> {
    let value = value.trim().to_string();
    if value.is_empty() {
        return Err(MediaRankError::InvalidInput(format!("{} must not be empty", name)));
    }
    Ok(value)
}
