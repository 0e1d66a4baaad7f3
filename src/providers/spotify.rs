use super::{ArtistApi, Provider};
use crate::api::token::{GrantedToken, TokenHolder};
use crate::api::{ApiClient, ApiConfig};
use crate::errors::{MediaRankError, Result};
use crate::pipeline::ranking::{self, mean, Ranked};
use crate::pipeline::{FanOut, Page, PageWalker, Paging, RankingPipeline, SearchResult};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

const ALBUM_PAGE_SIZE: u32 = 50;
const ALBUM_BATCH_SIZE: usize = 20;
const TRACK_BATCH_SIZE: usize = 50;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

#[derive(Debug, Default, Deserialize)]
struct Image {
    url: String,
}

#[derive(Debug, Default, Deserialize)]
struct ExternalUrls {
    #[serde(default)]
    spotify: String,
}

#[derive(Debug, Default, Deserialize)]
struct Followers {
    #[serde(default)]
    total: u64,
}

#[derive(Debug, Deserialize)]
struct SpotifyArtist {
    id: String,
    name: String,
    #[serde(default)]
    genres: Vec<String>,
    #[serde(default)]
    popularity: u32,
    #[serde(default)]
    followers: Followers,
    #[serde(default)]
    images: Vec<Image>,
    #[serde(default)]
    external_urls: ExternalUrls,
}

#[derive(Debug, Deserialize)]
struct ArtistSearchResponse {
    artists: Listing<SpotifyArtist>,
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct Listing<T> {
    #[serde(default)]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct SpotifyAlbum {
    id: String,
    name: String,
    #[serde(default)]
    release_date: String,
    #[serde(default)]
    album_type: String,
    #[serde(default)]
    total_tracks: u32,
    #[serde(default)]
    images: Vec<Image>,
    #[serde(default)]
    external_urls: ExternalUrls,
}

#[derive(Debug, Deserialize)]
struct TrackRef {
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SpotifyAlbumWithTracks {
    id: String,
    tracks: Listing<TrackRef>,
}

#[derive(Debug, Deserialize)]
struct AlbumsResponse {
    #[serde(default)]
    albums: Vec<Option<SpotifyAlbumWithTracks>>,
}

#[derive(Debug, Deserialize)]
struct AlbumRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct SpotifyTrack {
    id: Option<String>,
    name: String,
    #[serde(default)]
    popularity: u32,
    #[serde(default)]
    duration_ms: u64,
    #[serde(default)]
    track_number: u32,
    album: AlbumRef,
}

#[derive(Debug, Deserialize)]
struct TracksResponse {
    #[serde(default)]
    tracks: Vec<Option<SpotifyTrack>>,
}

/// Artist shown above the album table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtistInfo {
    pub id: String,
    pub name: String,
    pub genres: Vec<String>,
    pub popularity: u32,
    pub followers: u64,
    pub image: Option<String>,
    pub spotify_url: String,
}

impl From<SpotifyArtist> for ArtistInfo {
    fn from(artist: SpotifyArtist) -> Self {
        Self {
            id: artist.id,
            name: artist.name,
            genres: artist.genres,
            popularity: artist.popularity,
            followers: artist.followers.total,
            image: artist.images.into_iter().next().map(|i| i.url),
            spotify_url: artist.external_urls.spotify,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlbumSummary {
    pub id: String,
    pub name: String,
    pub release_date: String,
    pub album_type: String,
    pub total_tracks: u32,
    pub image: Option<String>,
    pub spotify_url: String,
}

impl From<SpotifyAlbum> for AlbumSummary {
    fn from(album: SpotifyAlbum) -> Self {
        Self {
            id: album.id,
            name: album.name,
            release_date: album.release_date,
            album_type: album.album_type,
            total_tracks: album.total_tracks,
            image: album.images.into_iter().next().map(|i| i.url),
            spotify_url: album.external_urls.spotify,
        }
    }
}

/// Track ids listed on one album
#[derive(Debug, Clone, PartialEq)]
pub struct AlbumTracks {
    pub id: String,
    pub track_ids: Vec<String>,
}

impl From<SpotifyAlbumWithTracks> for AlbumTracks {
    fn from(album: SpotifyAlbumWithTracks) -> Self {
        Self {
            id: album.id,
            track_ids: album.tracks.items.into_iter().filter_map(|t| t.id).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackDetail {
    pub id: String,
    pub name: String,
    pub popularity: u32,
    pub duration_ms: u64,
    pub track_number: u32,
    pub album_id: String,
}

impl TrackDetail {
    fn from_wire(track: SpotifyTrack) -> Option<Self> {
        Some(Self {
            id: track.id?,
            name: track.name,
            popularity: track.popularity,
            duration_ms: track.duration_ms,
            track_number: track.track_number,
            album_id: track.album.id,
        })
    }
}

/// Album ranked by the mean popularity of its tracks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedAlbum {
    #[serde(flatten)]
    pub album: AlbumSummary,
    pub tracks: Vec<TrackDetail>,
    pub average_popularity: f64,
}

impl Ranked for RankedAlbum {
    fn score(&self) -> f64 {
        self.average_popularity
    }
}

/// Spotify Web API client using the client-credentials flow
pub struct SpotifyClient {
    api: ApiClient,
    client_id: String,
    client_secret: String,
    api_base: String,
    token_url: Url,
    token: TokenHolder,
}

impl SpotifyClient {
    pub fn new(api: ApiClient, config: &ApiConfig) -> Result<Self> {
        let (Some(client_id), Some(client_secret)) = (
            config.spotify_client_id.clone(),
            config.spotify_client_secret.clone(),
        ) else {
            return Err(MediaRankError::Config(
                "Spotify credentials not configured. Set SPOTIFY_CLIENT_ID and SPOTIFY_CLIENT_SECRET or run 'media-rank config set-spotify'"
                    .to_string(),
            ));
        };

        Url::parse(&config.endpoints.spotify_api)?;
        Ok(Self {
            api,
            client_id,
            client_secret,
            api_base: config.endpoints.spotify_api.trim_end_matches('/').to_string(),
            token_url: Url::parse(&config.endpoints.spotify_token)?,
            token: TokenHolder::default(),
        })
    }

    /// Request a fresh access token
    async fn request_token(&self) -> Result<GrantedToken> {
        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];

        let response: TokenResponse = self
            .api
            .get_json(Provider::Spotify, |client| {
                client.post(self.token_url.clone()).form(&params)
            })
            .await
            .map_err(token_failure)?;

        info!("Obtained Spotify access token");
        Ok(GrantedToken {
            access_token: response.access_token,
            expires_in: Duration::from_secs(response.expires_in),
        })
    }

    async fn bearer(&self) -> Result<String> {
        self.token.bearer(|| self.request_token()).await
    }

    /// GET with the current token; a 401 drops the token and retries once
    async fn authorized_get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = Url::parse(&format!("{}/{}", self.api_base, path))?;

        let token = self.bearer().await?;
        match self.send(&url, &token, query).await {
            Err(e) if e.is_unauthorized() => {
                warn!("Spotify rejected the access token, requesting a new one");
                self.token.invalidate(&token).await;
                let token = self.bearer().await?;
                self.send(&url, &token, query).await
            }
            other => other,
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        url: &Url,
        token: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        self.api
            .get_json(Provider::Spotify, |client| {
                client.get(url.clone()).bearer_auth(token).query(query)
            })
            .await
    }
}

/// Any failure to obtain a token is an authentication failure, except a timeout
fn token_failure(error: MediaRankError) -> MediaRankError {
    let message = match error {
        MediaRankError::Timeout { .. } | MediaRankError::Auth { .. } => return error,
        MediaRankError::Upstream { message, .. } => message,
        MediaRankError::Json(e) => format!("unreadable token response: {}", e),
        other => other.to_string(),
    };
    MediaRankError::Auth {
        provider: Provider::Spotify,
        message,
    }
}

#[async_trait]
impl ArtistApi for SpotifyClient {
    async fn search_artist(&self, name: &str) -> Result<ArtistInfo> {
        let response: ArtistSearchResponse = self
            .authorized_get(
                "search",
                &[
                    ("q", name.to_string()),
                    ("type", "artist".to_string()),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;

        response
            .artists
            .items
            .into_iter()
            .next()
            .map(ArtistInfo::from)
            .ok_or_else(|| MediaRankError::NotFound("Artist not found".to_string()))
    }

    async fn artist_albums(
        &self,
        artist_id: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<AlbumSummary>> {
        let response: Listing<SpotifyAlbum> = self
            .authorized_get(
                &format!("artists/{}/albums", artist_id),
                &[
                    ("offset", offset.to_string()),
                    ("limit", limit.to_string()),
                    ("include_groups", "album,single".to_string()),
                ],
            )
            .await?;
        Ok(response.items.into_iter().map(AlbumSummary::from).collect())
    }

    async fn album_tracks(&self, album_ids: &[String]) -> Result<Vec<AlbumTracks>> {
        let response: AlbumsResponse = self
            .authorized_get("albums", &[("ids", album_ids.join(","))])
            .await?;
        Ok(response.albums.into_iter().flatten().map(AlbumTracks::from).collect())
    }

    async fn tracks(&self, track_ids: &[String]) -> Result<Vec<TrackDetail>> {
        let response: TracksResponse = self
            .authorized_get("tracks", &[("ids", track_ids.join(","))])
            .await?;
        Ok(response
            .tracks
            .into_iter()
            .flatten()
            .filter_map(TrackDetail::from_wire)
            .collect())
    }
}

/// Artist → albums → tracks → mean track popularity
pub struct ArtistRanker<A: ArtistApi> {
    api: A,
    walker: PageWalker,
    fan_out: FanOut,
}

impl<A: ArtistApi> ArtistRanker<A> {
    pub fn new(api: A, walker: PageWalker, fan_out: FanOut) -> Self {
        Self {
            api,
            walker,
            fan_out,
        }
    }
}

#[async_trait]
impl<A: ArtistApi> RankingPipeline for ArtistRanker<A> {
    type Parent = ArtistInfo;
    type Item = RankedAlbum;

    fn provider(&self) -> Provider {
        Provider::Spotify
    }

    async fn compute(&self, term: &str) -> Result<SearchResult<ArtistInfo, RankedAlbum>> {
        let artist = self.api.search_artist(term).await?;
        let artist_id = artist.id.as_str();

        let listed = self
            .walker
            .collect_all(Paging::Offset { page_size: ALBUM_PAGE_SIZE }, |request| async move {
                let albums = self
                    .api
                    .artist_albums(artist_id, request.offset(), request.page_size)
                    .await?;
                Ok(Page::new(albums, None))
            })
            .await?;

        // releases can be listed under more than one group
        let mut seen = HashSet::new();
        let albums: Vec<AlbumSummary> = listed
            .into_iter()
            .filter(|album| seen.insert(album.id.clone()))
            .collect();
        info!("Found {} releases for {}", albums.len(), artist.name);

        let album_ids: Vec<String> = albums.iter().map(|a| a.id.clone()).collect();
        let album_tracks = self
            .fan_out
            .batched(
                &album_ids,
                ALBUM_BATCH_SIZE,
                |batch| async move { self.api.album_tracks(&batch).await },
                |listing: &AlbumTracks| listing.id.clone(),
            )
            .await?;

        let mut seen = HashSet::new();
        let track_ids: Vec<String> = album_ids
            .iter()
            .filter_map(|id| album_tracks.get(id))
            .flat_map(|listing| listing.track_ids.iter().cloned())
            .filter(|id| seen.insert(id.clone()))
            .collect();
        let details = self
            .fan_out
            .batched(
                &track_ids,
                TRACK_BATCH_SIZE,
                |batch| async move { self.api.tracks(&batch).await },
                |track: &TrackDetail| track.id.clone(),
            )
            .await?;

        let mut ranked: Vec<RankedAlbum> = albums
            .into_iter()
            .map(|album| {
                let tracks: Vec<TrackDetail> = album_tracks
                    .get(&album.id)
                    .map(|listing| {
                        listing
                            .track_ids
                            .iter()
                            .filter_map(|id| details.get(id))
                            .filter(|track| track.album_id == album.id)
                            .cloned()
                            .collect()
                    })
                    .unwrap_or_default();
                let popularity: Vec<f64> = tracks.iter().map(|t| t.popularity as f64).collect();
                RankedAlbum {
                    average_popularity: mean(&popularity),
                    album,
                    tracks,
                }
            })
            .collect();
        ranking::rank_descending(&mut ranked);

        Ok(SearchResult {
            parent: artist,
            items: ranked,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_server::ScriptedServer;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// album id → (track id, popularity)
    struct FakeSpotify {
        albums: Vec<(String, Vec<(String, u32)>)>,
        album_pages: Mutex<Vec<u32>>,
        album_batches: Mutex<Vec<usize>>,
        track_batches: Mutex<Vec<usize>>,
    }

    impl FakeSpotify {
        fn new(albums: Vec<(&str, Vec<(&str, u32)>)>) -> Self {
            Self {
                albums: albums
                    .into_iter()
                    .map(|(id, tracks)| {
                        (
                            id.to_string(),
                            tracks
                                .into_iter()
                                .map(|(t, p)| (t.to_string(), p))
                                .collect(),
                        )
                    })
                    .collect(),
                album_pages: Mutex::new(Vec::new()),
                album_batches: Mutex::new(Vec::new()),
                track_batches: Mutex::new(Vec::new()),
            }
        }

        fn summary(id: &str) -> AlbumSummary {
            AlbumSummary {
                id: id.to_string(),
                name: format!("Album {}", id),
                release_date: "2020-01-01".to_string(),
                album_type: "album".to_string(),
                total_tracks: 0,
                image: None,
                spotify_url: format!("https://open.spotify.com/album/{}", id),
            }
        }
    }

    #[async_trait]
    impl ArtistApi for FakeSpotify {
        async fn search_artist(&self, name: &str) -> Result<ArtistInfo> {
            if name == "nobody" {
                return Err(MediaRankError::NotFound("Artist not found".to_string()));
            }
            Ok(ArtistInfo {
                id: "artist1".to_string(),
                name: name.to_string(),
                genres: vec!["rock".to_string()],
                popularity: 80,
                followers: 1000,
                image: None,
                spotify_url: String::new(),
            })
        }

        async fn artist_albums(
            &self,
            _artist_id: &str,
            offset: u32,
            limit: u32,
        ) -> Result<Vec<AlbumSummary>> {
            self.album_pages.lock().unwrap().push(offset);
            Ok(self
                .albums
                .iter()
                .skip(offset as usize)
                .take(limit as usize)
                .map(|(id, _)| Self::summary(id))
                .collect())
        }

        async fn album_tracks(&self, album_ids: &[String]) -> Result<Vec<AlbumTracks>> {
            self.album_batches.lock().unwrap().push(album_ids.len());
            // reversed on purpose
            Ok(self
                .albums
                .iter()
                .rev()
                .filter(|(id, _)| album_ids.contains(id))
                .map(|(id, tracks)| AlbumTracks {
                    id: id.clone(),
                    track_ids: tracks.iter().map(|(t, _)| t.clone()).collect(),
                })
                .collect())
        }

        async fn tracks(&self, track_ids: &[String]) -> Result<Vec<TrackDetail>> {
            self.track_batches.lock().unwrap().push(track_ids.len());
            let index: HashMap<&String, (&String, u32)> = self
                .albums
                .iter()
                .flat_map(|(album, tracks)| tracks.iter().map(move |(t, p)| (t, (album, *p))))
                .collect();
            Ok(track_ids
                .iter()
                .filter_map(|id| index.get(id).map(|(album, p)| (id, *album, *p)))
                .map(|(id, album, popularity)| TrackDetail {
                    id: id.clone(),
                    name: format!("Track {}", id),
                    popularity,
                    duration_ms: 180_000,
                    track_number: 1,
                    album_id: album.clone(),
                })
                .collect())
        }
    }

    fn ranker(api: FakeSpotify) -> ArtistRanker<FakeSpotify> {
        ArtistRanker::new(api, PageWalker::new(100), FanOut::new(3))
    }

    #[tokio::test]
    async fn test_albums_ranked_by_mean_popularity() {
        let ranker = ranker(FakeSpotify::new(vec![
            ("a", vec![("a1", 10), ("a2", 20)]),
            ("b", vec![("b1", 90)]),
            ("c", vec![]),
        ]));

        let result = ranker.compute("Band").await.unwrap();
        let order: Vec<(&str, f64)> = result
            .items
            .iter()
            .map(|a| (a.album.id.as_str(), a.average_popularity))
            .collect();

        assert_eq!(order, vec![("b", 90.0), ("a", 15.0), ("c", 0.0)]);
        assert_eq!(result.items[1].tracks.len(), 2);
        assert_eq!(result.parent.name, "Band");
    }

    #[tokio::test]
    async fn test_listing_is_paged_and_batched() {
        let albums: Vec<(String, Vec<(String, u32)>)> = (0..55)
            .map(|i| (format!("al{}", i), vec![(format!("tr{}", i), 50)]))
            .collect();
        let mut fake = FakeSpotify::new(vec![]);
        fake.albums = albums;
        let ranker = ranker(fake);

        let result = ranker.compute("Prolific").await.unwrap();
        assert_eq!(result.items.len(), 55);
        assert_eq!(*ranker.api.album_pages.lock().unwrap(), vec![0, 50]);

        let mut album_batches = ranker.api.album_batches.lock().unwrap().clone();
        album_batches.sort_unstable();
        assert_eq!(album_batches, vec![15, 20, 20]);

        let mut track_batches = ranker.api.track_batches.lock().unwrap().clone();
        track_batches.sort_unstable();
        assert_eq!(track_batches, vec![5, 50]);
    }

    #[tokio::test]
    async fn test_unknown_artist_is_not_found() {
        let ranker = ranker(FakeSpotify::new(vec![]));
        let result = ranker.compute("nobody").await;
        assert!(matches!(result, Err(MediaRankError::NotFound(_))));
    }

    #[test]
    fn test_null_entries_are_ignored() {
        let albums: AlbumsResponse = serde_json::from_value(serde_json::json!({
            "albums": [
                null,
                {"id": "x", "tracks": {"items": [{"id": "t1"}, {"id": null}]}}
            ]
        }))
        .unwrap();
        let listings: Vec<AlbumTracks> =
            albums.albums.into_iter().flatten().map(AlbumTracks::from).collect();
        assert_eq!(
            listings,
            vec![AlbumTracks {
                id: "x".to_string(),
                track_ids: vec!["t1".to_string()],
            }]
        );

        let tracks: TracksResponse = serde_json::from_value(serde_json::json!({
            "tracks": [
                {"id": "t1", "name": "One", "popularity": 42, "duration_ms": 1000,
                 "track_number": 3, "album": {"id": "x", "name": "X"}},
                null
            ]
        }))
        .unwrap();
        let details: Vec<TrackDetail> = tracks
            .tracks
            .into_iter()
            .flatten()
            .filter_map(TrackDetail::from_wire)
            .collect();
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].album_id, "x");
        assert_eq!(details[0].popularity, 42);
    }

    #[test]
    fn test_ranked_album_serializes_flat() {
        let album = RankedAlbum {
            album: FakeSpotify::summary("z"),
            tracks: Vec::new(),
            average_popularity: 0.0,
        };
        let value = serde_json::to_value(&album).unwrap();
        assert_eq!(value["id"], "z");
        assert_eq!(value["average_popularity"], 0.0);
    }

    #[test]
    fn test_listing_without_items_is_empty() {
        let response: ArtistSearchResponse =
            serde_json::from_value(serde_json::json!({"artists": {}})).unwrap();
        assert!(response.artists.items.is_empty());
    }

    const ARTIST_SEARCH: &str = r#"{"artists":{"items":[{"id":"a1","name":"Band","genres":["rock"],
        "popularity":61,"followers":{"total":1200},"images":[],
        "external_urls":{"spotify":"https://open.spotify.com/artist/a1"}}]}}"#;
    const EXPIRED: &str = r#"{"error":{"status":401,"message":"The access token expired"}}"#;

    fn grant(token: &str) -> String {
        format!(
            r#"{{"access_token":"{}","token_type":"Bearer","expires_in":3600}}"#,
            token
        )
    }

    fn scripted_spotify(server: &ScriptedServer) -> SpotifyClient {
        let config = ApiConfig {
            spotify_client_id: Some("id".to_string()),
            spotify_client_secret: Some("secret".to_string()),
            max_retries: 0,
            endpoints: crate::api::Endpoints {
                spotify_api: server.url("/v1"),
                spotify_token: server.url("/api/token"),
                ..Default::default()
            },
            ..Default::default()
        };
        SpotifyClient::new(ApiClient::direct(&config).unwrap(), &config).unwrap()
    }

    #[tokio::test]
    async fn test_rejected_token_is_replaced_once() {
        let first = grant("token-a");
        let second = grant("token-b");
        let server = ScriptedServer::start(vec![
            (200, first.as_str()),
            (401, EXPIRED),
            (200, second.as_str()),
            (200, ARTIST_SEARCH),
        ])
        .await;
        let client = scripted_spotify(&server);

        let artist = client.search_artist("Band").await.unwrap();
        assert_eq!(artist.name, "Band");
        assert_eq!(artist.followers, 1200);

        assert_eq!(
            server.request_lines(),
            vec![
                "POST /api/token",
                "GET /v1/search",
                "POST /api/token",
                "GET /v1/search"
            ]
        );
        let requests = server.requests();
        assert!(requests[0].contains("grant_type=client_credentials"));
        assert!(requests[1].contains("Bearer token-a"));
        assert!(requests[3].contains("Bearer token-b"));
    }

    #[tokio::test]
    async fn test_second_rejection_is_an_upstream_error() {
        let first = grant("token-a");
        let second = grant("token-b");
        let server = ScriptedServer::start(vec![
            (200, first.as_str()),
            (401, EXPIRED),
            (200, second.as_str()),
            (401, EXPIRED),
        ])
        .await;
        let client = scripted_spotify(&server);

        match client.search_artist("Band").await {
            Err(MediaRankError::Upstream { status, .. }) => assert_eq!(status, Some(401)),
            other => panic!("expected upstream 401, got {:?}", other),
        }
        assert_eq!(server.request_lines().len(), 4);
    }

    #[tokio::test]
    async fn test_token_endpoint_failure_is_auth_error() {
        let server = ScriptedServer::start(vec![(
            400,
            r#"{"error":"invalid_client","error_description":"Invalid client secret"}"#,
        )])
        .await;
        let client = scripted_spotify(&server);

        match client.search_artist("Band").await {
            Err(MediaRankError::Auth { provider, message }) => {
                assert_eq!(provider, Provider::Spotify);
                assert_eq!(message, "invalid_client: Invalid client secret");
            }
            other => panic!("expected auth error, got {:?}", other),
        }
        assert_eq!(server.request_lines(), vec!["POST /api/token"]);
    }

    #[tokio::test]
    async fn test_unreadable_token_response_is_auth_error() {
        let server = ScriptedServer::start(vec![(200, r#"{"token_type":"Bearer"}"#)]).await;
        let client = scripted_spotify(&server);

        let result = client.search_artist("Band").await;
        assert!(matches!(result, Err(MediaRankError::Auth { .. })));
    }

    #[test]
    fn test_token_timeout_stays_a_timeout() {
        let timeout = MediaRankError::Timeout {
            provider: Provider::Spotify,
            after: Duration::from_secs(30),
        };
        assert!(matches!(token_failure(timeout), MediaRankError::Timeout { .. }));
        assert!(matches!(
            token_failure(MediaRankError::Config("no network".to_string())),
            MediaRankError::Auth { .. }
        ));
    }
}
