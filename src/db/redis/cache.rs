use redis::Client;
use std::fmt::Display;

use crate::models::HistoryKey;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Set of track identities already recommended for a filter combination
    History(HistoryKey),
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::History(key) => write!(f, "history:{}", key.as_str().to_lowercase()),
        }
    }
}

/// Creates a Redis client for the history store
///
/// Connections are opened per operation through the multiplexed async connection.
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}
