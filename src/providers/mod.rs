pub mod omdb;
pub mod spotify;
pub mod youtube;

use crate::errors::Result;
use crate::pipeline::pagination::Page;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use omdb::{OmdbClient, SeriesRanker};
pub use spotify::{ArtistRanker, SpotifyClient};
pub use youtube::{ChannelRanker, YoutubeClient};

/// Upstream metadata providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Omdb,
    Spotify,
    Youtube,
}

impl Provider {
    /// Stable namespace used in cache keys
    pub fn namespace(&self) -> &'static str {
        match self {
            Provider::Omdb => "omdb",
            Provider::Spotify => "spotify",
            Provider::Youtube => "youtube",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::Omdb => write!(f, "OMDb"),
            Provider::Spotify => write!(f, "Spotify"),
            Provider::Youtube => write!(f, "YouTube"),
        }
    }
}

/// Series title and per-season episode lookups
#[async_trait]
pub trait SeriesApi: Send + Sync {
    /// Look a title up by name
    async fn find_title(&self, title: &str) -> Result<omdb::TitleRecord>;

    /// Fetch one season's episode list
    async fn season(&self, imdb_id: &str, season: u32) -> Result<omdb::SeasonListing>;
}

/// Artist search, album listing and batched album/track lookups
#[async_trait]
pub trait ArtistApi: Send + Sync {
    async fn search_artist(&self, name: &str) -> Result<spotify::ArtistInfo>;

    /// One page of an artist's albums and singles
    async fn artist_albums(
        &self,
        artist_id: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<spotify::AlbumSummary>>;

    /// Track ids for up to 20 albums
    async fn album_tracks(&self, album_ids: &[String]) -> Result<Vec<spotify::AlbumTracks>>;

    /// Details for up to 50 tracks
    async fn tracks(&self, track_ids: &[String]) -> Result<Vec<spotify::TrackDetail>>;
}

/// Channel search, uploads listing and per-video statistics
#[async_trait]
pub trait ChannelApi: Send + Sync {
    async fn search_channel(&self, name: &str) -> Result<youtube::ChannelInfo>;

    /// Id of the playlist holding every upload of the channel
    async fn uploads_playlist(&self, channel_id: &str) -> Result<String>;

    async fn playlist_items(
        &self,
        playlist_id: &str,
        page_token: Option<&str>,
        page_size: u32,
    ) -> Result<Page<youtube::PlaylistVideo>>;

    /// Statistics for one video, `None` when the video is gone or private
    async fn video_statistics(&self, video_id: &str) -> Result<Option<youtube::VideoStatistics>>;
}
