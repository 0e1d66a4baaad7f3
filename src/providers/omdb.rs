use super::{Provider, SeriesApi};
use crate::api::{ApiClient, ApiConfig};
use crate::cache::{CacheKey, ResultCache};
use crate::errors::{MediaRankError, Result};
use crate::pipeline::ranking::{self, median, parse_rating, Ranked};
use crate::pipeline::{FanOut, RankingPipeline, SearchResult};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

/// Title lookup result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleRecord {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Year", default)]
    pub year: String,
    #[serde(rename = "imdbID")]
    pub imdb_id: String,
    #[serde(rename = "Type", default)]
    pub kind: String,
    #[serde(rename = "Poster", default)]
    pub poster: String,
    #[serde(rename = "totalSeasons", default)]
    pub total_seasons: Option<String>,
}

/// One season as listed by the provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonListing {
    #[serde(rename = "Season", default)]
    pub season: Option<String>,
    #[serde(rename = "Episodes", default)]
    pub episodes: Option<Vec<EpisodeRecord>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeRecord {
    #[serde(rename = "Title", default)]
    pub title: String,
    #[serde(rename = "Released", default)]
    pub released: String,
    #[serde(rename = "Episode", default)]
    pub episode: String,
    #[serde(rename = "imdbRating", default)]
    pub imdb_rating: String,
}

/// Series metadata shown above the season table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesInfo {
    pub title: String,
    pub year: String,
    pub imdb_id: String,
    pub poster: String,
    pub total_seasons: u32,
}

/// Season ranked by the median rating of its episodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonScore {
    pub season_number: u32,
    pub median_score: f64,
    pub episode_count: usize,
}

impl Ranked for SeasonScore {
    fn score(&self) -> f64 {
        self.median_score
    }
}

/// OMDb HTTP client
pub struct OmdbClient {
    api: ApiClient,
    api_key: String,
    endpoint: Url,
}

impl OmdbClient {
    pub fn new(api: ApiClient, config: &ApiConfig) -> Result<Self> {
        let api_key = config.omdb_api_key.clone().ok_or_else(|| {
            MediaRankError::Config(
                "OMDb API key not configured. Set OMDB_API_KEY or run 'media-rank config set-omdb'"
                    .to_string(),
            )
        })?;

        Ok(Self {
            api,
            api_key,
            endpoint: Url::parse(&config.endpoints.omdb)?,
        })
    }

    async fn lookup<T: DeserializeOwned>(&self, params: &[(&str, String)]) -> Result<T> {
        let body: serde_json::Value = self
            .api
            .get_json(Provider::Omdb, |client| {
                client
                    .get(self.endpoint.clone())
                    .query(params)
                    .query(&[("apikey", self.api_key.as_str())])
            })
            .await?;
        check_response(body)
    }
}

/// OMDb answers 200 with `Response: "False"` for failed lookups
fn check_response<T: DeserializeOwned>(body: serde_json::Value) -> Result<T> {
    let failed = body
        .get("Response")
        .and_then(|r| r.as_str())
        .is_some_and(|r| r.eq_ignore_ascii_case("false"));

    if failed {
        let message = body
            .get("Error")
            .and_then(|e| e.as_str())
            .unwrap_or("Unknown error")
            .to_string();
        if message.to_lowercase().contains("not found") {
            return Err(MediaRankError::NotFound(message));
        }
        let status = if message.to_lowercase().contains("api key") {
            Some(401)
        } else {
            None
        };
        return Err(MediaRankError::Upstream {
            provider: Provider::Omdb,
            status,
            message,
        });
    }

    Ok(serde_json::from_value(body)?)
}

#[async_trait]
impl SeriesApi for OmdbClient {
    async fn find_title(&self, title: &str) -> Result<TitleRecord> {
        self.lookup(&[("t", title.to_string())]).await
    }

    async fn season(&self, imdb_id: &str, season: u32) -> Result<SeasonListing> {
        self.lookup(&[("i", imdb_id.to_string()), ("Season", season.to_string())])
            .await
    }
}

/// Series title → seasons → median episode rating
pub struct SeriesRanker<A: SeriesApi> {
    api: A,
    cache: Arc<ResultCache>,
    fan_out: FanOut,
}

impl<A: SeriesApi> SeriesRanker<A> {
    pub fn new(api: A, cache: Arc<ResultCache>, fan_out: FanOut) -> Self {
        Self {
            api,
            cache,
            fan_out,
        }
    }
}

#[async_trait]
impl<A: SeriesApi> RankingPipeline for SeriesRanker<A> {
    type Parent = SeriesInfo;
    type Item = SeasonScore;

    fn provider(&self) -> Provider {
        Provider::Omdb
    }

    async fn compute(&self, term: &str) -> Result<SearchResult<SeriesInfo, SeasonScore>> {
        let title = self.api.find_title(term).await?;
        if !title.kind.eq_ignore_ascii_case("series") {
            return Err(MediaRankError::NotFound(format!(
                "'{}' is not a TV series",
                title.title
            )));
        }

        let total_seasons = title
            .total_seasons
            .as_deref()
            .and_then(|n| n.trim().parse::<u32>().ok())
            .unwrap_or(0);
        info!("Found '{}' with {} seasons", title.title, total_seasons);

        let numbers: Vec<u32> = (1..=total_seasons).collect();
        let imdb_id = title.imdb_id.as_str();
        let listings = self
            .fan_out
            .each_cached(
                &numbers,
                &self.cache,
                |n| CacheKey::item(Provider::Omdb, "season", &format!("{}:{}", imdb_id, n)),
                |n| async move { self.api.season(imdb_id, n).await.map(Some) },
            )
            .await?;

        let mut seasons = Vec::with_capacity(numbers.len());
        for number in numbers {
            let Some(episodes) = listings.get(&number).and_then(|l| l.episodes.as_ref()) else {
                debug!("Season {} has no episode list, skipping", number);
                continue;
            };
            let ratings: Vec<f64> = episodes
                .iter()
                .filter_map(|e| parse_rating(&e.imdb_rating))
                .collect();
            seasons.push(SeasonScore {
                season_number: number,
                median_score: median(&ratings),
                episode_count: episodes.len(),
            });
        }
        ranking::rank_descending(&mut seasons);

        Ok(SearchResult {
            parent: SeriesInfo {
                title: title.title,
                year: title.year,
                imdb_id: title.imdb_id,
                poster: title.poster,
                total_seasons,
            },
            items: seasons,
        })
    }
}
