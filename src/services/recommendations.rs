use std::sync::Arc;

use crate::{
    error::AppResult,
    models::{FilterSet, HistoryKey, RecommendationResult, SongLine, TrackIdentity},
    services::{
        context::ContextBuilder,
        history::HistoryTracker,
        model::ModelClient,
        prompt::{build_prompt, select_tracks, RECOMMENDATION_COUNT},
        repair::repair,
    },
};

/// Shown to the user when the model endpoint cannot be used
pub const MODEL_UNAVAILABLE_MESSAGE: &str =
    "Unable to connect to recommendation service. Is the model server running?";

/// Recommendation pipeline
///
/// Gathers candidates for the filters, drops tracks already shown for the same
/// filter combination, asks the model to pick five of at most twenty shuffled
/// candidates, and repairs the answer into a numbered list. Pools of five or
/// fewer tracks skip the model entirely.
pub struct RecommendationService {
    context: ContextBuilder,
    history: HistoryTracker,
    model: Arc<dyn ModelClient>,
    pool_limit: usize,
}

impl RecommendationService {
    pub fn new(
        context: ContextBuilder,
        history: HistoryTracker,
        model: Arc<dyn ModelClient>,
        pool_limit: usize,
    ) -> Self {
        Self {
            context,
            history,
            model,
            pool_limit,
        }
    }

    pub async fn recommend(
        &self,
        user_prompt: &str,
        filters: &FilterSet,
    ) -> AppResult<RecommendationResult> {
        let pool = self.context.build_context(filters, self.pool_limit).await;
        let key = HistoryKey::from_filters(filters);

        let candidates = self.history.select_candidates(pool.tracks(), &key).await;
        let selected = select_tracks(candidates);

        if selected.len() <= RECOMMENDATION_COUNT {
            tracing::info!(
                key = %key,
                tracks = selected.len(),
                "Small candidate pool, skipping model"
            );
            let items: Vec<SongLine> = selected.iter().map(SongLine::from).collect();
            self.remember(&key, &items).await;
            return Ok(RecommendationResult::new(items));
        }

        let prompt = build_prompt(user_prompt, filters, &selected);
        let raw = self.model.generate(&prompt).await?;

        tracing::debug!(key = %key, response = %raw, "Model response");

        let items = repair(&raw, &selected);
        self.remember(&key, &items).await;

        tracing::info!(key = %key, songs = items.len(), "Recommendation complete");

        Ok(RecommendationResult::new(items))
    }

    /// Forwards a prompt to the model unchanged
    pub async fn raw_prompt(&self, prompt: &str) -> AppResult<String> {
        self.model.generate(prompt).await
    }

    async fn remember(&self, key: &HistoryKey, items: &[SongLine]) {
        let identities: Vec<TrackIdentity> = items.iter().map(SongLine::identity).collect();
        if let Err(e) = self.history.record(&identities, key).await {
            tracing::warn!(key = %key, error = %e, "Failed to record recommendations");
        }
    }
}
