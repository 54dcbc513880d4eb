// ============================================================================
// Last.fm API Types
// ============================================================================

use serde::Deserialize;

use super::{CandidateTrack, Popularity};

#[derive(Debug, Clone, Deserialize)]
pub struct LastFmArtist {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LastFmTrack {
    #[serde(default)]
    pub name: String,
    pub artist: Option<LastFmArtist>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub listeners: Option<String>,
}

impl LastFmTrack {
    pub fn into_candidate(self) -> Option<CandidateTrack> {
        let artist = self
            .artist
            .map(|a| a.name)
            .filter(|name| !name.trim().is_empty())?;
        if self.name.trim().is_empty() {
            return None;
        }

        Some(
            CandidateTrack::new(self.name, artist)
                .with_popularity(Popularity::parse(self.listeners.as_deref()))
                .with_source_url(self.url),
        )
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LastFmTrackList {
    #[serde(default)]
    pub track: Vec<LastFmTrack>,
}

/// Response of `tag.gettoptracks` and `chart.gettoptracks`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LastFmTracksResponse {
    #[serde(default)]
    pub tracks: Option<LastFmTrackList>,
}

/// Error body Last.fm returns with a 200 status, e.g. for a bad API key
#[derive(Debug, Clone, Deserialize)]
pub struct LastFmErrorResponse {
    pub error: u32,
    #[serde(default)]
    pub message: String,
}
