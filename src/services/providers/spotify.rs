/// Spotify Web API source
///
/// Answers free-text search, genre playlist lookups and new-release enumeration.
/// Every call is authenticated with a client-credentials bearer token that is
/// cached until shortly before it expires.
///
/// API Flow:
/// 1. Token: POST {token_url} (basic auth, grant_type=client_credentials)
/// 2. Search: /search?type=track or /search?type=playlist
/// 3. Playlist tracks: /playlists/{id}/tracks
/// 4. New releases: /browse/new-releases → /albums/{id}/tracks → /artists/{id}
use crate::{
    error::{AppError, AppResult},
    models::{
        spotify::{
            AlbumTracksResponse, NewReleasesResponse, PlaylistSearchResponse,
            PlaylistTracksResponse, SpotifyArtist, SpotifyToken, TrackSearchResponse,
        },
        CandidateTrack, Popularity,
    },
    services::providers::{TrackQuery, TrackSource},
};
use chrono::{DateTime, Duration, Utc};
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;

/// Spotify rejects search limits above this
const MAX_PAGE_SIZE: usize = 50;
/// Playlists yielding fewer usable tracks are topped up with a direct search
const MIN_PLAYLIST_TRACKS: usize = 5;
/// Playlists considered per genre search
const PLAYLIST_SEARCH_LIMIT: usize = 5;
/// Refresh the token this long before Spotify says it expires
const TOKEN_EXPIRY_MARGIN_SECS: i64 = 60;

struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

pub struct SpotifyProvider {
    http_client: HttpClient,
    api_url: String,
    token_url: String,
    client_id: String,
    client_secret: String,
    token: Mutex<Option<CachedToken>>,
}

/// Case-insensitive substring match in either direction.
///
/// "jazz" matches artist genres "jazz fusion" and "acid jazz"; "Hip-Hop"
/// matches "hip-hop".
pub fn genre_matches(artist_genres: &[String], genre: &str) -> bool {
    let wanted = genre.to_lowercase();
    artist_genres.iter().any(|g| {
        let g = g.to_lowercase();
        g.contains(&wanted) || wanted.contains(&g)
    })
}

/// Search text for a genre, with the era appended when one applies
fn genre_query(genre: &str, era: Option<&str>) -> String {
    match era {
        Some(era) => format!("{} {}", genre, era),
        None => genre.to_string(),
    }
}

fn page_size(limit: usize) -> String {
    limit.clamp(1, MAX_PAGE_SIZE).to_string()
}

impl SpotifyProvider {
    pub fn new(
        api_url: String,
        token_url: String,
        client_id: String,
        client_secret: String,
    ) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_url,
            token_url,
            client_id,
            client_secret,
            token: Mutex::new(None),
        }
    }

    /// Returns a valid access token, exchanging client credentials when needed
    async fn access_token(&self) -> AppResult<String> {
        let mut cached = self.token.lock().await;

        if let Some(token) = cached.as_ref() {
            if token.expires_at > Utc::now() {
                return Ok(token.access_token.clone());
            }
        }

        if self.client_id.is_empty() || self.client_secret.is_empty() {
            return Err(AppError::UpstreamUnavailable(
                "Spotify API credentials not configured".to_string(),
            ));
        }

        let response = self
            .http_client
            .post(&self.token_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::UpstreamUnavailable(format!(
                "Spotify token endpoint returned status {}: {}",
                status, body
            )));
        }

        let token: SpotifyToken = response.json().await?;
        let lifetime = (token.expires_in - TOKEN_EXPIRY_MARGIN_SECS).max(0);

        tracing::debug!(expires_in = token.expires_in, "Spotify token acquired");

        *cached = Some(CachedToken {
            access_token: token.access_token.clone(),
            expires_at: Utc::now() + Duration::seconds(lifetime),
        });

        Ok(token.access_token)
    }

    /// Authenticated GET returning a parsed JSON body
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> AppResult<T> {
        let token = self.access_token().await?;
        let url = format!("{}{}", self.api_url, path);

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(token)
            .query(query)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::UpstreamUnavailable(format!(
                "Spotify API returned status {} for {}: {}",
                status, path, body
            )));
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            tracing::debug!(path = %path, response = %text, "Unparseable Spotify response");
            AppError::UpstreamUnavailable(format!("Failed to parse Spotify response: {}", e))
        })
    }

    /// Direct track search
    pub async fn search_tracks(&self, query: &str, limit: usize) -> AppResult<Vec<CandidateTrack>> {
        let limit_param = page_size(limit);
        let response: TrackSearchResponse = self
            .get_json(
                "/search",
                &[("q", query), ("type", "track"), ("limit", limit_param.as_str())],
            )
            .await?;

        let tracks: Vec<CandidateTrack> = response
            .tracks
            .unwrap_or_default()
            .items
            .into_iter()
            .filter_map(|t| t.into_candidate())
            .collect();

        tracing::info!(
            query = %query,
            results = tracks.len(),
            provider = "spotify",
            "Track search completed"
        );

        Ok(tracks)
    }

    /// Tracks of the first usable playlist matching the query
    async fn playlist_tracks(&self, query: &str, limit: usize) -> AppResult<Vec<CandidateTrack>> {
        let playlist_limit = PLAYLIST_SEARCH_LIMIT.to_string();
        let response: PlaylistSearchResponse = self
            .get_json(
                "/search",
                &[("q", query), ("type", "playlist"), ("limit", playlist_limit.as_str())],
            )
            .await?;

        let playlist = response
            .playlists
            .unwrap_or_default()
            .items
            .into_iter()
            .flatten()
            .find(|p| p.id.is_some() && p.name.is_some() && p.tracks.is_some());

        let Some(playlist) = playlist else {
            tracing::info!(query = %query, "No usable playlist found");
            return Ok(Vec::new());
        };
        let playlist_id = playlist.id.unwrap_or_default();

        tracing::info!(
            query = %query,
            playlist = playlist.name.as_deref().unwrap_or_default(),
            total = playlist.tracks.and_then(|t| t.total).unwrap_or_default(),
            "Found playlist"
        );

        let limit_param = page_size(limit);
        let response: PlaylistTracksResponse = self
            .get_json(
                &format!("/playlists/{}/tracks", playlist_id),
                &[("limit", limit_param.as_str())],
            )
            .await?;

        Ok(response
            .items
            .into_iter()
            .flatten()
            .filter_map(|item| item.track)
            .filter_map(|t| t.into_candidate())
            .collect())
    }

    /// Genre-targeted search: a curated playlist first, direct search when the
    /// playlist is missing, unusable or too short
    pub async fn search_by_genre(
        &self,
        genre: &str,
        era: Option<&str>,
        limit: usize,
    ) -> AppResult<Vec<CandidateTrack>> {
        let query = genre_query(genre, era);

        match self.playlist_tracks(&query, limit).await {
            Ok(tracks) if tracks.len() >= MIN_PLAYLIST_TRACKS => {
                tracing::info!(query = %query, tracks = tracks.len(), "Using playlist tracks");
                Ok(tracks)
            }
            Ok(mut tracks) => {
                tracing::info!(
                    query = %query,
                    tracks = tracks.len(),
                    "Playlist too short, supplementing with direct search"
                );
                let remaining = limit.saturating_sub(tracks.len()).max(1);
                match self.search_tracks(&query, remaining).await {
                    Ok(extra) => tracks.extend(extra),
                    Err(e) => {
                        tracing::warn!(
                            query = %query,
                            error = %e,
                            kept = tracks.len(),
                            "Supplementary search failed, keeping playlist tracks"
                        );
                    }
                }
                Ok(tracks)
            }
            Err(e) => {
                // Bare genre: broader than the era-qualified text that just failed
                tracing::warn!(query = %query, error = %e, "Playlist lookup failed, searching by genre");
                self.search_tracks(genre, limit).await
            }
        }
    }

    /// First track of each newly released album, filtered by artist genre when given
    pub async fn new_releases(
        &self,
        genre: Option<&str>,
        limit: usize,
    ) -> AppResult<Vec<CandidateTrack>> {
        let limit_param = page_size(limit);
        let response: NewReleasesResponse = self
            .get_json("/browse/new-releases", &[("limit", limit_param.as_str())])
            .await?;

        tracing::info!(albums = response.albums.items.len(), "Fetched new release albums");

        let mut tracks = Vec::new();

        for album in response.albums.items {
            if tracks.len() >= limit {
                break;
            }

            let Some(artist) = album.artists.first() else {
                continue;
            };

            let album_tracks: AlbumTracksResponse = match self
                .get_json(&format!("/albums/{}/tracks", album.id), &[("limit", "1")])
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    tracing::debug!(album = %album.name, error = %e, "Skipping album");
                    continue;
                }
            };

            let Some(first) = album_tracks.items.into_iter().next() else {
                continue;
            };

            if let Some(genre) = genre {
                let Some(artist_id) = artist.id.as_deref() else {
                    continue;
                };
                let details: SpotifyArtist =
                    match self.get_json(&format!("/artists/{}", artist_id), &[]).await {
                        Ok(details) => details,
                        Err(e) => {
                            tracing::debug!(artist = %artist.name, error = %e, "Skipping artist");
                            continue;
                        }
                    };
                if !genre_matches(&details.genres, genre) {
                    continue;
                }
            }

            let popularity = album
                .popularity
                .map(Popularity::Score)
                .unwrap_or_else(|| Popularity::Label("New".to_string()));

            if first.name.trim().is_empty() {
                continue;
            }
            // Album artist, not track artist: album track listings may omit artists.
            tracks.push(
                CandidateTrack::new(first.name, artist.name.clone())
                    .with_popularity(popularity)
                    .with_source_url(first.external_urls.spotify),
            );
        }

        tracing::info!(
            genre = genre.unwrap_or("any"),
            tracks = tracks.len(),
            provider = "spotify",
            "New releases collected"
        );

        Ok(tracks)
    }
}

#[async_trait::async_trait]
impl TrackSource for SpotifyProvider {
    fn supports(&self, query: &TrackQuery) -> bool {
        matches!(
            query,
            TrackQuery::Search { .. } | TrackQuery::Genre { .. } | TrackQuery::NewReleases { .. }
        )
    }

    async fn fetch(&self, query: &TrackQuery, limit: usize) -> Vec<CandidateTrack> {
        let result = match query {
            TrackQuery::Search { query } => self.search_tracks(query, limit).await,
            TrackQuery::Genre { genre, era } => {
                self.search_by_genre(genre, era.as_deref(), limit).await
            }
            TrackQuery::NewReleases { genre } => self.new_releases(genre.as_deref(), limit).await,
            TrackQuery::TagChart { .. } => Ok(Vec::new()),
        };

        match result {
            Ok(tracks) => tracks,
            Err(e) => {
                tracing::warn!(query = %query, error = %e, provider = "spotify", "Spotify fetch failed");
                Vec::new()
            }
        }
    }

    fn name(&self) -> &'static str {
        "spotify"
    }
}
