// ============================================================================
// Spotify Web API Types
// ============================================================================

use serde::Deserialize;

use super::{CandidateTrack, Popularity};

/// Client-credentials token response
#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyToken {
    pub access_token: String,
    #[serde(default = "default_expires_in")]
    pub expires_in: i64,
}

fn default_expires_in() -> i64 {
    3600
}

/// Generic paging wrapper
#[derive(Debug, Clone, Deserialize)]
pub struct Paging<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(default)]
    pub total: Option<u32>,
}

impl<T> Default for Paging<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExternalUrls {
    #[serde(default)]
    pub spotify: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyArtistRef {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyTrack {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub artists: Vec<SpotifyArtistRef>,
    #[serde(default)]
    pub popularity: Option<u64>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
}

impl SpotifyTrack {
    /// Converts to a candidate, or `None` when the title or primary artist is missing.
    ///
    /// A popularity of zero is reported as "Unknown", matching how Spotify
    /// uses it for unrated tracks.
    pub fn into_candidate(self) -> Option<CandidateTrack> {
        let artist = self
            .artists
            .into_iter()
            .next()
            .map(|a| a.name)
            .filter(|name| !name.trim().is_empty())?;
        if self.name.trim().is_empty() {
            return None;
        }

        let popularity = match self.popularity {
            Some(score) if score > 0 => Popularity::Score(score),
            _ => Popularity::unknown(),
        };

        Some(
            CandidateTrack::new(self.name, artist)
                .with_popularity(popularity)
                .with_source_url(self.external_urls.spotify),
        )
    }
}

/// GET /search?type=track
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrackSearchResponse {
    #[serde(default)]
    pub tracks: Option<Paging<SpotifyTrack>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistTracksRef {
    #[serde(default)]
    pub total: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimplePlaylist {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub tracks: Option<PlaylistTracksRef>,
}

/// GET /search?type=playlist. Spotify may return `null` entries in `items`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaylistSearchResponse {
    #[serde(default)]
    pub playlists: Option<Paging<Option<SimplePlaylist>>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistItem {
    #[serde(default)]
    pub track: Option<SpotifyTrack>,
}

/// GET /playlists/{id}/tracks
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaylistTracksResponse {
    #[serde(default)]
    pub items: Vec<Option<PlaylistItem>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyAlbum {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub artists: Vec<SpotifyArtistRef>,
    #[serde(default)]
    pub popularity: Option<u64>,
}

/// GET /browse/new-releases
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewReleasesResponse {
    #[serde(default)]
    pub albums: Paging<SpotifyAlbum>,
}

/// GET /albums/{id}/tracks
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlbumTracksResponse {
    #[serde(default)]
    pub items: Vec<SpotifyTrack>,
}

/// GET /artists/{id}
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpotifyArtist {
    #[serde(default)]
    pub genres: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_with_missing_fields() {
        let json = r#"{ "name": "Nights", "artists": [{ "name": "Frank Ocean" }] }"#;
        let track: SpotifyTrack = serde_json::from_str(json).unwrap();
        let candidate = track.into_candidate().unwrap();

        assert_eq!(candidate.title, "Nights");
        assert_eq!(candidate.artist, "Frank Ocean");
        assert_eq!(candidate.popularity, Popularity::unknown());
        assert_eq!(candidate.source_url, "");
    }

    #[test]
    fn test_track_without_artist_is_dropped() {
        let json = r#"{ "name": "Untitled", "artists": [] }"#;
        let track: SpotifyTrack = serde_json::from_str(json).unwrap();
        assert!(track.into_candidate().is_none());
    }

    #[test]
    fn test_full_track_conversion() {
        let json = r#"{
            "name": "Blinding Lights",
            "artists": [{ "id": "1Xyo4u8uXC1ZmMpatF05PJ", "name": "The Weeknd" }],
            "popularity": 91,
            "external_urls": { "spotify": "https://open.spotify.com/track/0VjIjW4GlUZAMYd2vXMi3b" }
        }"#;
        let track: SpotifyTrack = serde_json::from_str(json).unwrap();
        let candidate = track.into_candidate().unwrap();

        assert_eq!(candidate.popularity, Popularity::Score(91));
        assert_eq!(
            candidate.source_url,
            "https://open.spotify.com/track/0VjIjW4GlUZAMYd2vXMi3b"
        );
    }

    #[test]
    fn test_playlist_search_with_null_items() {
        let json = r#"{ "playlists": { "items": [null, { "id": "abc", "name": "Jazz Classics", "tracks": { "total": 80 } }] } }"#;
        let response: PlaylistSearchResponse = serde_json::from_str(json).unwrap();
        let items = response.playlists.unwrap().items;
        assert_eq!(items.len(), 2);
        assert!(items[0].is_none());
        assert_eq!(items[1].as_ref().unwrap().id.as_deref(), Some("abc"));
    }

    #[test]
    fn test_empty_search_response() {
        let response: TrackSearchResponse = serde_json::from_str("{}").unwrap();
        assert!(response.tracks.is_none());
    }
}
