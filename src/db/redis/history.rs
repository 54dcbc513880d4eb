use redis::AsyncCommands;
use redis::Client;
use std::collections::HashSet;

use super::cache::CacheKey;
use crate::{
    error::AppResult,
    models::{HistoryKey, TrackIdentity},
    services::history::HistoryStore,
};

/// History store backed by Redis sets, one set per history key
#[derive(Clone)]
pub struct RedisHistoryStore {
    redis_client: Client,
}

impl RedisHistoryStore {
    pub fn new(redis_client: Client) -> Self {
        Self { redis_client }
    }
}

#[async_trait::async_trait]
impl HistoryStore for RedisHistoryStore {
    async fn recorded(&self, key: &HistoryKey) -> AppResult<HashSet<TrackIdentity>> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let members: HashSet<String> = conn
            .smembers(CacheKey::History(key.clone()).to_string())
            .await?;
        Ok(members.into_iter().map(TrackIdentity::from).collect())
    }

    async fn add(&self, key: &HistoryKey, identities: &[TrackIdentity]) -> AppResult<()> {
        if identities.is_empty() {
            return Ok(());
        }
        let members: Vec<&str> = identities.iter().map(TrackIdentity::as_str).collect();
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let _: () = conn
            .sadd(CacheKey::History(key.clone()).to_string(), members)
            .await?;
        Ok(())
    }

    async fn clear(&self, key: &HistoryKey) -> AppResult<()> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let _: () = conn.del(CacheKey::History(key.clone()).to_string()).await?;
        Ok(())
    }
}
