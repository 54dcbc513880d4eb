use std::sync::Arc;

use crate::{
    config::Config,
    db::{create_redis_client, RedisHistoryStore},
    services::{
        context::ContextBuilder,
        history::{HistoryStore, HistoryTracker, MemoryHistoryStore},
        model::OllamaClient,
        providers::{lastfm::LastFmProvider, spotify::SpotifyProvider, SourceRouter},
        recommendations::RecommendationService,
    },
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub recommendations: Arc<RecommendationService>,
}

impl AppState {
    pub fn new(recommendations: RecommendationService) -> Self {
        Self {
            recommendations: Arc::new(recommendations),
        }
    }

    /// Wires the catalog sources, history store and model client from configuration
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let sources = SourceRouter::new()
            .with_source(Arc::new(SpotifyProvider::new(
                config.spotify_api_url.clone(),
                config.spotify_token_url.clone(),
                config.spotify_client_id.clone(),
                config.spotify_client_secret.clone(),
            )))
            .with_source(Arc::new(LastFmProvider::new(
                config.lastfm_api_url.clone(),
                config.lastfm_api_key.clone(),
            )));

        let store: Arc<dyn HistoryStore> = match &config.redis_url {
            Some(redis_url) => {
                tracing::info!("Using Redis recommendation history");
                Arc::new(RedisHistoryStore::new(create_redis_client(redis_url)?))
            }
            None => {
                tracing::info!("Using in-memory recommendation history");
                Arc::new(MemoryHistoryStore::new())
            }
        };

        let model = OllamaClient::new(config.model_api_url.clone(), config.model_name.clone());

        Ok(Self::new(RecommendationService::new(
            ContextBuilder::new(Arc::new(sources)),
            HistoryTracker::new(store),
            Arc::new(model),
            config.candidate_pool_limit,
        )))
    }
}
