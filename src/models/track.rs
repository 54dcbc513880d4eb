use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::Display;

/// Identity used for de-duplication and recommendation history.
///
/// The lowercase `title-artist` pair, so "Flowers" by "Miley Cyrus" and
/// "FLOWERS" by "miley cyrus" are the same track.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackIdentity(String);

impl TrackIdentity {
    pub fn new(title: &str, artist: &str) -> Self {
        Self(format!("{}-{}", title.trim(), artist.trim()).to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TrackIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TrackIdentity {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

/// Popularity as reported by the upstream source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Popularity {
    /// Numeric score or listener count
    Score(u64),
    /// Free-text marker such as "New" or "Unknown"
    Label(String),
}

impl Popularity {
    pub fn unknown() -> Self {
        Popularity::Label("Unknown".to_string())
    }

    /// Parses upstream text, falling back to a label when it is not a number
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(text) if !text.is_empty() => text
                .parse::<u64>()
                .map(Popularity::Score)
                .unwrap_or_else(|_| Popularity::Label(text.to_string())),
            _ => Popularity::unknown(),
        }
    }
}

impl Default for Popularity {
    fn default() -> Self {
        Self::unknown()
    }
}

impl Display for Popularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Popularity::Score(score) => write!(f, "{}", score),
            Popularity::Label(label) => write!(f, "{}", label),
        }
    }
}

/// Why a track ended up in the candidate pool
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ProvenanceTag {
    /// Came from the genre-targeted search
    GenreMatch,
    /// Came from a recency-biased source
    RecentRelease,
    /// Came from a query qualified with this era
    Era(String),
}

/// Canonical track record shared by every catalog source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateTrack {
    pub title: String,
    pub artist: String,
    pub popularity: Popularity,
    pub source_url: String,
    #[serde(default)]
    pub provenance_tags: BTreeSet<ProvenanceTag>,
}

impl CandidateTrack {
    pub fn new(title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            popularity: Popularity::unknown(),
            source_url: String::new(),
            provenance_tags: BTreeSet::new(),
        }
    }

    pub fn with_popularity(mut self, popularity: Popularity) -> Self {
        self.popularity = popularity;
        self
    }

    pub fn with_source_url(mut self, url: Option<String>) -> Self {
        self.source_url = url.unwrap_or_default();
        self
    }

    pub fn with_tag(mut self, tag: ProvenanceTag) -> Self {
        self.provenance_tags.insert(tag);
        self
    }

    pub fn identity(&self) -> TrackIdentity {
        TrackIdentity::new(&self.title, &self.artist)
    }

    pub fn has_tag(&self, tag: &ProvenanceTag) -> bool {
        self.provenance_tags.contains(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_is_case_insensitive() {
        let a = CandidateTrack::new("Flowers", "Miley Cyrus");
        let b = CandidateTrack::new("FLOWERS", "miley cyrus ");
        assert_eq!(a.identity(), b.identity());
        assert_eq!(a.identity().as_str(), "flowers-miley cyrus");
    }

    #[test]
    fn test_popularity_parse() {
        assert_eq!(Popularity::parse(Some("87")), Popularity::Score(87));
        assert_eq!(
            Popularity::parse(Some("New")),
            Popularity::Label("New".to_string())
        );
        assert_eq!(Popularity::parse(None), Popularity::unknown());
        assert_eq!(Popularity::parse(Some("  ")), Popularity::unknown());
    }

    #[test]
    fn test_popularity_serde_untagged() {
        let json = serde_json::to_string(&Popularity::Score(42)).unwrap();
        assert_eq!(json, "42");
        let label: Popularity = serde_json::from_str("\"Unknown\"").unwrap();
        assert_eq!(label, Popularity::unknown());
    }

    #[test]
    fn test_tags_and_era() {
        let track = CandidateTrack::new("Creep", "Radiohead")
            .with_tag(ProvenanceTag::GenreMatch)
            .with_tag(ProvenanceTag::Era("1990s".to_string()))
            .with_tag(ProvenanceTag::GenreMatch);

        assert_eq!(track.provenance_tags.len(), 2);
        assert!(track.has_tag(&ProvenanceTag::GenreMatch));
        assert!(!track.has_tag(&ProvenanceTag::RecentRelease));
        assert!(track.has_tag(&ProvenanceTag::Era("1990s".to_string())));
    }

    #[test]
    fn test_missing_url_becomes_empty() {
        let track = CandidateTrack::new("Song", "Artist").with_source_url(None);
        assert_eq!(track.source_url, "");
    }
}
