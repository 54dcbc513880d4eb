pub mod cache;
pub mod history;

pub use cache::create_redis_client;
pub use history::RedisHistoryStore;
