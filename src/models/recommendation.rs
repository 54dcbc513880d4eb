use serde::{Deserialize, Serialize};

use super::{CandidateTrack, TrackIdentity};

/// One finalized recommendation line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongLine {
    pub title: String,
    pub artist: String,
}

impl SongLine {
    pub fn new(title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
        }
    }

    pub fn identity(&self) -> TrackIdentity {
        TrackIdentity::new(&self.title, &self.artist)
    }

    /// Renders `{n}. "{title}" by {artist}`
    pub fn numbered(&self, position: usize) -> String {
        format!("{}. \"{}\" by {}", position, self.title, self.artist)
    }
}

impl From<&CandidateTrack> for SongLine {
    fn from(track: &CandidateTrack) -> Self {
        Self::new(track.title.clone(), track.artist.clone())
    }
}

/// Outcome of one recommendation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecommendationResult {
    pub items: Vec<SongLine>,
}

impl RecommendationResult {
    pub fn new(items: Vec<SongLine>) -> Self {
        Self { items }
    }

    /// Numbered lines, renumbered 1..n
    pub fn lines(&self) -> Vec<String> {
        self.items
            .iter()
            .enumerate()
            .map(|(index, song)| song.numbered(index + 1))
            .collect()
    }

    /// Newline-joined list returned to the UI
    pub fn content(&self) -> String {
        self.lines().join("\n")
    }
}

/// JSON body of the recommendation endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecommendationResponse {
    Content { content: String },
    Error { error: String },
}

impl From<RecommendationResult> for RecommendationResponse {
    fn from(result: RecommendationResult) -> Self {
        RecommendationResponse::Content {
            content: result.content(),
        }
    }
}
