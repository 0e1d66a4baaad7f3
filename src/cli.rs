use crate::api::{ApiClient, ApiConfig, ApiConfigLoader, EXAMPLE_CONFIG};
use crate::cache::store::{CacheStore, FileStore, MemoryStore};
use crate::cache::ResultCache;
use crate::config::{CacheBackend, Config, FanOutLimits};
use crate::errors::Result;
use crate::pipeline::{CacheGate, FanOut, PageWalker, RankingPipeline};
use crate::providers::{
    ArtistRanker, ChannelRanker, OmdbClient, Provider, SeriesRanker, SpotifyClient, YoutubeClient,
};
use crate::render::{self, Summary, TableRow, ViewOptions};
use crate::settings::Settings;
use crate::utils::Utils;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Media Rank - Rank TV seasons, albums and channel videos
#[derive(Parser)]
#[command(name = "media-rank")]
#[command(about = "Rank a series' seasons, an artist's albums or a channel's videos")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (TOML, or JSON with a .json extension)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Rank the seasons of a TV series by median episode rating
    Series {
        /// Series title
        #[arg(required = true)]
        title: Vec<String>,

        #[command(flatten)]
        search: SearchArgs,
    },

    /// Rank an artist's albums by average track popularity
    Artist {
        /// Artist name
        #[arg(required = true)]
        name: Vec<String>,

        #[command(flatten)]
        search: SearchArgs,
    },

    /// Rank a channel's videos by view velocity and engagement
    Channel {
        /// Channel name
        #[arg(required = true)]
        name: Vec<String>,

        #[command(flatten)]
        search: SearchArgs,
    },

    /// Inspect or clear cached results
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },

    /// Configure application settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Args, Clone, Debug)]
pub struct SearchArgs {
    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,

    /// Only keep rows containing this text (case-insensitive)
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Sort by column name instead of rank
    #[arg(short, long)]
    pub sort: Option<String>,

    /// Ascending order
    #[arg(long)]
    pub asc: bool,

    /// Show at most this many rows
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Ignore the cached result for this search
    #[arg(long)]
    pub refresh: bool,
}

impl SearchArgs {
    fn view(&self) -> ViewOptions {
        ViewOptions {
            filter: self.filter.clone(),
            sort: self.sort.clone(),
            ascending: self.asc,
            limit: self.limit,
        }
    }
}

#[derive(Subcommand, Clone)]
pub enum CacheCommands {
    /// List cached keys
    List {
        #[arg(short, long, value_enum)]
        provider: Option<Provider>,
    },

    /// Remove every cached entry, or only one provider's
    Clear {
        #[arg(short, long, value_enum)]
        provider: Option<Provider>,
    },

    /// Remove the cached result of one search
    Remove {
        #[arg(value_enum)]
        provider: Provider,

        /// Search term as originally typed
        #[arg(required = true)]
        term: Vec<String>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Print the configuration file path
    Path,

    /// Print an example configuration file
    Example,

    /// Set OMDb API key
    SetOmdb {
        /// API key
        api_key: String,
    },

    /// Set Spotify API credentials
    SetSpotify {
        /// Client ID
        client_id: String,

        /// Client secret
        client_secret: String,
    },

    /// Set YouTube Data API key
    SetYoutube {
        /// API key
        api_key: String,
    },

    /// Set how long cached results stay valid
    SetCacheTtl {
        /// Seconds, or "never"
        #[arg(value_parser = parse_ttl)]
        ttl: Ttl,
    },

    /// Set how many detail requests run at once for a provider
    SetConcurrency {
        #[arg(value_enum)]
        provider: Provider,

        limit: usize,
    },

    /// Reset to default settings
    Reset,
}

/// Cache lifetime argument; `None` means entries never expire
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ttl(pub Option<u64>);

fn parse_ttl(raw: &str) -> std::result::Result<Ttl, String> {
    match raw.trim().to_lowercase().as_str() {
        "never" | "none" => Ok(Ttl(None)),
        value => value
            .parse::<u64>()
            .map(|secs| Ttl(Some(secs)))
            .map_err(|_| format!("expected seconds or 'never', got '{}'", raw)),
    }
}

/// Everything a search command needs
struct Context {
    config: Config,
    api_config: ApiConfig,
    gate: CacheGate,
}

impl Context {
    /// Worker pool sized for `provider`
    fn fan_out(&self, provider: Provider) -> FanOut {
        FanOut::new(self.config.pipeline.concurrency.for_provider(provider))
    }
}

impl Cli {
    /// Parse command line arguments
    pub fn parse() -> Self {
        <Cli as clap::Parser>::parse()
    }

    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match &self.command {
            Commands::Series { title, search } => {
                let ctx = self.context()?;
                let client = OmdbClient::new(ApiClient::new(&ctx.api_config)?, &ctx.api_config)?;
                let ranker = SeriesRanker::new(
                    client,
                    ctx.gate.cache().clone(),
                    ctx.fan_out(Provider::Omdb),
                );
                self.handle_search(&ctx.gate, &ranker, &title.join(" "), search)
                    .await
            }
            Commands::Artist { name, search } => {
                let ctx = self.context()?;
                let client =
                    SpotifyClient::new(ApiClient::new(&ctx.api_config)?, &ctx.api_config)?;
                let ranker = ArtistRanker::new(
                    client,
                    PageWalker::new(ctx.config.pipeline.max_pages),
                    ctx.fan_out(Provider::Spotify),
                );
                self.handle_search(&ctx.gate, &ranker, &name.join(" "), search)
                    .await
            }
            Commands::Channel { name, search } => {
                let ctx = self.context()?;
                let client =
                    YoutubeClient::new(ApiClient::new(&ctx.api_config)?, &ctx.api_config)?;
                let ranker = ChannelRanker::new(
                    client,
                    ctx.gate.cache().clone(),
                    PageWalker::new(ctx.config.pipeline.max_pages),
                    ctx.fan_out(Provider::Youtube),
                    ctx.config.scoring,
                );
                self.handle_search(&ctx.gate, &ranker, &name.join(" "), search)
                    .await
            }
            Commands::Cache { command } => self.handle_cache(command.clone()),
            Commands::Config { command } => self.handle_config(command.clone()),
        }
    }

    fn settings(&self) -> Result<Settings> {
        Settings::load(self.config.as_deref())
    }

    fn context(&self) -> Result<Context> {
        let config = self.settings()?.config().clone();
        let api_config = ApiConfigLoader::load(&config);
        let gate = CacheGate::new(Arc::new(open_cache(&config)?));
        Ok(Context {
            config,
            api_config,
            gate,
        })
    }

    async fn handle_search<P>(
        &self,
        gate: &CacheGate,
        pipeline: &P,
        term: &str,
        args: &SearchArgs,
    ) -> Result<()>
    where
        P: RankingPipeline,
        P::Parent: Summary,
        P::Item: TableRow,
    {
        if args.refresh && gate.invalidate(pipeline.provider(), term)? {
            debug!("Dropped cached {} result for '{}'", pipeline.provider(), term);
        }

        let result = gate.run(pipeline, term).await?;
        let view = args.view();
        if args.json {
            println!("{}", render::render_json(&result, &view)?);
        } else {
            print!("{}", render::render_table(&result, &view)?);
        }
        Ok(())
    }

    fn handle_cache(&self, command: CacheCommands) -> Result<()> {
        let config = self.settings()?.config().clone();
        let cache = open_cache(&config)?;

        match command {
            CacheCommands::List { provider } => {
                let prefix = provider.map(crate::cache::CacheKey::provider_prefix);
                let keys: Vec<String> = cache
                    .keys()?
                    .into_iter()
                    .filter(|key| match &prefix {
                        Some(prefix) => key.starts_with(prefix.as_str()),
                        None => true,
                    })
                    .collect();

                for key in &keys {
                    println!("{}", key);
                }
                println!("{} cached entries", keys.len());
            }
            CacheCommands::Clear { provider } => {
                let removed = cache.clear(provider)?;
                match provider {
                    Some(provider) => println!("Removed {} cached {} entries", removed, provider),
                    None => println!("Removed {} cached entries", removed),
                }
            }
            CacheCommands::Remove { provider, term } => {
                let gate = CacheGate::new(Arc::new(cache));
                let term = term.join(" ");
                if gate.invalidate(provider, &term)? {
                    println!("Removed cached {} result for '{}'", provider, term);
                } else {
                    println!("No cached {} result for '{}'", provider, term);
                }
            }
        }

        Ok(())
    }

    fn handle_config(&self, command: ConfigCommands) -> Result<()> {
        let mut settings = self.settings()?;

        match command {
            ConfigCommands::Show => {
                let config = settings.config();
                let set = |value: &Option<String>| if value.is_some() { "Set" } else { "Not set" };

                println!("Current configuration ({}):", settings.path().display());
                println!("  OMDb API key: {}", set(&config.api_keys.omdb_api_key));
                println!(
                    "  Spotify credentials: {}",
                    if config.api_keys.spotify_client_id.is_some()
                        && config.api_keys.spotify_client_secret.is_some()
                    {
                        "Set"
                    } else {
                        "Not set"
                    }
                );
                println!("  YouTube API key: {}", set(&config.api_keys.youtube_api_key));
                println!("  Request timeout: {}s", config.network.request_timeout_secs);
                println!(
                    "  Retries: {} ({}ms apart)",
                    config.network.max_retries, config.network.retry_delay_ms
                );
                println!("  Proxy: {}", if config.proxy_config.enabled { "Enabled" } else { "Disabled" });
                println!(
                    "  Cache: {} at {}",
                    match config.cache.backend {
                        CacheBackend::File => "file",
                        CacheBackend::Memory => "memory",
                    },
                    config.cache.directory.display()
                );
                println!(
                    "  Cache TTL: {}",
                    config
                        .cache
                        .ttl()
                        .map(|ttl| Utils::format_ttl(ttl.as_secs()))
                        .unwrap_or_else(|| "never expires".to_string())
                );
                println!("  Max pages: {}", config.pipeline.max_pages);
                println!("  Concurrency: {}", concurrency_summary(&config.pipeline.concurrency));
            }
            ConfigCommands::Path => {
                println!("{}", settings.path().display());
            }
            ConfigCommands::Example => {
                println!("{}", EXAMPLE_CONFIG.trim());
            }
            ConfigCommands::SetOmdb { api_key } => {
                settings.set_omdb_api_key(api_key)?;
                println!("OMDb API key updated");
            }
            ConfigCommands::SetSpotify {
                client_id,
                client_secret,
            } => {
                settings.set_spotify_credentials(client_id, client_secret)?;
                println!("Spotify credentials updated");
            }
            ConfigCommands::SetYoutube { api_key } => {
                settings.set_youtube_api_key(api_key)?;
                println!("YouTube API key updated");
            }
            ConfigCommands::SetCacheTtl { ttl } => {
                settings.set_cache_ttl(ttl.0)?;
                match ttl.0 {
                    Some(secs) => println!("Cache TTL updated to: {}", Utils::format_ttl(secs)),
                    None => println!("Cached results no longer expire"),
                }
            }
            ConfigCommands::SetConcurrency { provider, limit } => {
                settings.set_concurrency(provider, limit)?;
                println!("{} concurrency updated to: {}", provider, limit);
            }
            ConfigCommands::Reset => {
                settings.reset()?;
                println!("Configuration reset to defaults");
            }
        }

        Ok(())
    }
}

fn concurrency_summary(limits: &FanOutLimits) -> String {
    Provider::value_variants()
        .iter()
        .map(|provider| format!("{}={}", provider.namespace(), limits.for_provider(*provider)))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Open the result cache described by `config`
fn open_cache(config: &Config) -> Result<ResultCache> {
    let store: Box<dyn CacheStore> = match config.cache.backend {
        CacheBackend::File => Box::new(FileStore::new(&config.cache.directory)?),
        CacheBackend::Memory => Box::new(MemoryStore::new()),
    };
    Ok(ResultCache::new(store, config.cache.ttl()))
}
