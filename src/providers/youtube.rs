use super::{ChannelApi, Provider};
use crate::api::{ApiClient, ApiConfig};
use crate::cache::{CacheKey, ResultCache};
use crate::errors::{MediaRankError, Result};
use crate::pipeline::ranking::{self, age_in_days, Engagement, EngagementWeights, Ranked};
use crate::pipeline::{FanOut, Page, PageWalker, Paging, RankingPipeline, SearchResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use url::Url;

const PLAYLIST_PAGE_SIZE: u32 = 50;

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct Listing<T> {
    #[serde(default)]
    items: Vec<T>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnail {
    url: String,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    default: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchSnippet {
    channel_id: String,
    #[serde(default)]
    channel_title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    snippet: SearchSnippet,
}

#[derive(Debug, Deserialize)]
struct RelatedPlaylists {
    uploads: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelContentDetails {
    related_playlists: RelatedPlaylists,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelItem {
    content_details: ChannelContentDetails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistSnippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    thumbnails: Thumbnails,
    published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistContentDetails {
    video_id: String,
    video_published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItem {
    snippet: PlaylistSnippet,
    content_details: PlaylistContentDetails,
}

/// Counts arrive as decimal strings and are omitted when hidden
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Statistics {
    view_count: Option<String>,
    like_count: Option<String>,
    comment_count: Option<String>,
    favorite_count: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    #[serde(default)]
    statistics: Statistics,
}

fn parse_count(raw: &Option<String>) -> u64 {
    raw.as_deref()
        .and_then(|count| count.trim().parse().ok())
        .unwrap_or(0)
}

/// Channel shown above the video table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub channel_id: String,
    pub title: String,
    pub description: String,
    pub thumbnail_url: Option<String>,
}

/// One upload as listed in the channel's uploads playlist
#[derive(Debug, Clone, PartialEq)]
pub struct PlaylistVideo {
    pub video_id: String,
    pub title: String,
    pub description: String,
    pub thumbnail_url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

impl From<PlaylistItem> for PlaylistVideo {
    fn from(item: PlaylistItem) -> Self {
        Self {
            video_id: item.content_details.video_id,
            title: item.snippet.title,
            description: item.snippet.description,
            thumbnail_url: item.snippet.thumbnails.default.map(|t| t.url),
            published_at: item
                .content_details
                .video_published_at
                .or(item.snippet.published_at),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VideoStatistics {
    pub views: u64,
    pub likes: u64,
    pub comments: u64,
    pub favorites: u64,
}

impl From<Statistics> for VideoStatistics {
    fn from(stats: Statistics) -> Self {
        Self {
            views: parse_count(&stats.view_count),
            likes: parse_count(&stats.like_count),
            comments: parse_count(&stats.comment_count),
            favorites: parse_count(&stats.favorite_count),
        }
    }
}

/// Video ranked by view velocity plus engagement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedVideo {
    pub video_id: String,
    pub title: String,
    pub days: i64,
    pub views: u64,
    pub likes: u64,
    pub comments: u64,
    pub favorites: u64,
    pub score: f64,
    pub url: String,
    pub thumbnail_url: Option<String>,
    pub description: String,
}

impl Ranked for RankedVideo {
    fn score(&self) -> f64 {
        self.score
    }
}

/// YouTube Data API v3 client
pub struct YoutubeClient {
    api: ApiClient,
    api_key: String,
    base: String,
}

impl YoutubeClient {
    pub fn new(api: ApiClient, config: &ApiConfig) -> Result<Self> {
        let api_key = config.youtube_api_key.clone().ok_or_else(|| {
            MediaRankError::Config(
                "YouTube API key not configured. Set YOUTUBE_API_KEY or run 'media-rank config set-youtube'"
                    .to_string(),
            )
        })?;

        Url::parse(&config.endpoints.youtube)?;
        Ok(Self {
            api,
            api_key,
            base: config.endpoints.youtube.trim_end_matches('/').to_string(),
        })
    }

    async fn get<T: DeserializeOwned>(&self, resource: &str, query: &[(&str, &str)]) -> Result<T> {
        let url = Url::parse(&format!("{}/{}", self.base, resource))?;
        self.api
            .get_json(Provider::Youtube, |client| {
                client
                    .get(url.clone())
                    .query(query)
                    .query(&[("key", self.api_key.as_str())])
            })
            .await
    }
}

#[async_trait]
impl ChannelApi for YoutubeClient {
    async fn search_channel(&self, name: &str) -> Result<ChannelInfo> {
        let response: Listing<SearchItem> = self
            .get(
                "search",
                &[
                    ("part", "snippet"),
                    ("q", name),
                    ("type", "channel"),
                    ("maxResults", "1"),
                ],
            )
            .await?;

        let item = response
            .items
            .into_iter()
            .next()
            .ok_or_else(|| MediaRankError::NotFound("Channel not found".to_string()))?;
        Ok(ChannelInfo {
            channel_id: item.snippet.channel_id,
            title: item.snippet.channel_title,
            description: item.snippet.description,
            thumbnail_url: item.snippet.thumbnails.default.map(|t| t.url),
        })
    }

    async fn uploads_playlist(&self, channel_id: &str) -> Result<String> {
        let response: Listing<ChannelItem> = self
            .get("channels", &[("part", "contentDetails"), ("id", channel_id)])
            .await?;

        response
            .items
            .into_iter()
            .next()
            .and_then(|item| item.content_details.related_playlists.uploads)
            .ok_or_else(|| {
                MediaRankError::NotFound(format!("Channel {} has no uploads playlist", channel_id))
            })
    }

    async fn playlist_items(
        &self,
        playlist_id: &str,
        page_token: Option<&str>,
        page_size: u32,
    ) -> Result<Page<PlaylistVideo>> {
        let page_size = page_size.to_string();
        let mut query = vec![
            ("part", "snippet,contentDetails"),
            ("maxResults", page_size.as_str()),
            ("playlistId", playlist_id),
        ];
        if let Some(token) = page_token {
            query.push(("pageToken", token));
        }

        let response: Listing<PlaylistItem> = self.get("playlistItems", &query).await?;
        Ok(Page::new(
            response.items.into_iter().map(PlaylistVideo::from).collect(),
            response.next_page_token,
        ))
    }

    async fn video_statistics(&self, video_id: &str) -> Result<Option<VideoStatistics>> {
        let response: Listing<VideoItem> = self
            .get("videos", &[("part", "statistics"), ("id", video_id)])
            .await?;
        Ok(response
            .items
            .into_iter()
            .next()
            .map(|item| VideoStatistics::from(item.statistics)))
    }
}

/// Channel → uploads → per-video statistics → engagement score
pub struct ChannelRanker<A: ChannelApi> {
    api: A,
    cache: Arc<ResultCache>,
    walker: PageWalker,
    fan_out: FanOut,
    weights: EngagementWeights,
    clock: fn() -> DateTime<Utc>,
}

impl<A: ChannelApi> ChannelRanker<A> {
    pub fn new(
        api: A,
        cache: Arc<ResultCache>,
        walker: PageWalker,
        fan_out: FanOut,
        weights: EngagementWeights,
    ) -> Self {
        Self {
            api,
            cache,
            walker,
            fan_out,
            weights,
            clock: Utc::now,
        }
    }

    /// Replace the source of "now" used for video ages
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }
}

#[async_trait]
impl<A: ChannelApi> RankingPipeline for ChannelRanker<A> {
    type Parent = ChannelInfo;
    type Item = RankedVideo;

    fn provider(&self) -> Provider {
        Provider::Youtube
    }

    async fn compute(&self, term: &str) -> Result<SearchResult<ChannelInfo, RankedVideo>> {
        let channel = self.api.search_channel(term).await?;
        let playlist_id = self.api.uploads_playlist(&channel.channel_id).await?;
        let playlist = playlist_id.as_str();

        let videos = self
            .walker
            .collect_all(Paging::Cursor { page_size: PLAYLIST_PAGE_SIZE }, |request| async move {
                self.api
                    .playlist_items(playlist, request.cursor(), request.page_size)
                    .await
            })
            .await?;
        info!("Found {} uploads for {}", videos.len(), channel.title);

        let video_ids: Vec<String> = videos.iter().map(|v| v.video_id.clone()).collect();
        let statistics = self
            .fan_out
            .each_cached(
                &video_ids,
                &self.cache,
                |id| CacheKey::item(Provider::Youtube, "video-stats", id),
                |id| async move { self.api.video_statistics(&id).await },
            )
            .await?;

        let now = (self.clock)();
        let mut ranked = Vec::with_capacity(videos.len());
        for video in videos {
            let Some(stats) = statistics.get(&video.video_id) else {
                warn!("No statistics for video {}, skipping", video.video_id);
                continue;
            };
            let days = video
                .published_at
                .map(|published| age_in_days(published, now))
                .unwrap_or(0);
            let score = self.weights.score(
                Engagement {
                    views: stats.views,
                    likes: stats.likes,
                    comments: stats.comments,
                },
                days,
            );

            ranked.push(RankedVideo {
                url: format!("https://www.youtube.com/watch?v={}", video.video_id),
                video_id: video.video_id,
                title: video.title,
                days,
                views: stats.views,
                likes: stats.likes,
                comments: stats.comments,
                favorites: stats.favorites,
                score,
                thumbnail_url: video.thumbnail_url,
                description: video.description,
            });
        }
        ranking::rank_descending(&mut ranked);

        Ok(SearchResult {
            parent: channel,
            items: ranked,
        })
    }
}
