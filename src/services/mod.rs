pub mod context;
pub mod history;
pub mod model;
pub mod prompt;
pub mod providers;
pub mod recommendations;
pub mod repair;

pub use context::{CandidatePool, ContextBuilder};
pub use history::{HistoryStore, HistoryTracker, MemoryHistoryStore};
pub use model::{ModelClient, OllamaClient};
pub use recommendations::RecommendationService;
