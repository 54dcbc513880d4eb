pub mod filters;
pub mod lastfm;
pub mod options;
pub mod recommendation;
pub mod spotify;
pub mod track;

pub use filters::{FilterSet, HistoryKey, LATEST_RELEASES};
pub use options::FilterOptions;
pub use recommendation::{RecommendationResponse, RecommendationResult, SongLine};
pub use track::{CandidateTrack, Popularity, ProvenanceTag, TrackIdentity};
