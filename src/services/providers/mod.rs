/// Music catalog source abstraction
///
/// Each upstream catalog (Spotify, Last.fm) normalizes its responses into
/// [`CandidateTrack`]s. Sources never fail from the caller's point of view: any
/// upstream problem is logged and reported as an empty list.
use std::fmt::Display;
use std::sync::Arc;

use crate::models::CandidateTrack;

pub mod lastfm;
pub mod spotify;

pub use lastfm::LastFmProvider;
pub use spotify::SpotifyProvider;

/// What to ask a catalog source for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackQuery {
    /// Free-text track search
    Search { query: String },
    /// Curated playlist for a genre (optionally era-qualified), falling back to search
    Genre { genre: String, era: Option<String> },
    /// Latest album releases, optionally filtered by the artist's genres
    NewReleases { genre: Option<String> },
    /// Tag-based chart; the global chart when no tag is given
    TagChart { tag: Option<String> },
}

impl TrackQuery {
    pub fn search(query: impl Into<String>) -> Self {
        TrackQuery::Search {
            query: query.into(),
        }
    }
}

impl Display for TrackQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackQuery::Search { query } => write!(f, "search:{}", query),
            TrackQuery::Genre { genre, era } => match era {
                Some(era) => write!(f, "genre:{} {}", genre, era),
                None => write!(f, "genre:{}", genre),
            },
            TrackQuery::NewReleases { genre } => {
                write!(f, "new-releases:{}", genre.as_deref().unwrap_or("any"))
            }
            TrackQuery::TagChart { tag } => {
                write!(f, "tag-chart:{}", tag.as_deref().unwrap_or("global"))
            }
        }
    }
}

/// Trait for music catalog sources
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait TrackSource: Send + Sync {
    /// Whether this source can answer the query
    fn supports(&self, query: &TrackQuery) -> bool;

    /// Fetch up to `limit` tracks. Returns an empty list on any upstream failure.
    async fn fetch(&self, query: &TrackQuery, limit: usize) -> Vec<CandidateTrack>;

    /// Source name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Routes each query to the first registered source that supports it
#[derive(Clone, Default)]
pub struct SourceRouter {
    sources: Vec<Arc<dyn TrackSource>>,
}

impl SourceRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, source: Arc<dyn TrackSource>) -> Self {
        self.sources.push(source);
        self
    }
}

#[async_trait::async_trait]
impl TrackSource for SourceRouter {
    fn supports(&self, query: &TrackQuery) -> bool {
        self.sources.iter().any(|s| s.supports(query))
    }

    async fn fetch(&self, query: &TrackQuery, limit: usize) -> Vec<CandidateTrack> {
        match self.sources.iter().find(|s| s.supports(query)) {
            Some(source) => {
                let tracks = source.fetch(query, limit).await;
                tracing::debug!(
                    source = source.name(),
                    query = %query,
                    tracks = tracks.len(),
                    "Source fetch completed"
                );
                tracks
            }
            None => {
                tracing::warn!(query = %query, "No source registered for query");
                Vec::new()
            }
        }
    }

    fn name(&self) -> &'static str {
        "router"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_display() {
        assert_eq!(TrackQuery::search("jazz").to_string(), "search:jazz");
        assert_eq!(
            TrackQuery::Genre {
                genre: "Rock".to_string(),
                era: Some("1990s".to_string())
            }
            .to_string(),
            "genre:Rock 1990s"
        );
        assert_eq!(
            TrackQuery::TagChart { tag: None }.to_string(),
            "tag-chart:global"
        );
    }

    #[tokio::test]
    async fn test_router_dispatches_to_supporting_source() {
        let mut search_only = MockTrackSource::new();
        search_only
            .expect_supports()
            .returning(|q| matches!(q, TrackQuery::Search { .. }));
        search_only
            .expect_fetch()
            .returning(|_, _| vec![CandidateTrack::new("Song", "Artist")]);
        search_only.expect_name().return_const("search-only");

        let mut charts = MockTrackSource::new();
        charts
            .expect_supports()
            .returning(|q| matches!(q, TrackQuery::TagChart { .. }));
        charts.expect_fetch().never();
        charts.expect_name().return_const("charts");

        let router = SourceRouter::new()
            .with_source(Arc::new(search_only))
            .with_source(Arc::new(charts));

        let tracks = router.fetch(&TrackQuery::search("anything"), 10).await;
        assert_eq!(tracks.len(), 1);
    }

    #[tokio::test]
    async fn test_router_without_supporting_source_returns_empty() {
        let router = SourceRouter::new();
        let query = TrackQuery::NewReleases { genre: None };
        assert!(!router.supports(&query));
        assert!(router.fetch(&query, 10).await.is_empty());
    }
}
