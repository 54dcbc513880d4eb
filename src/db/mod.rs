pub mod redis;

pub use redis::create_redis_client;
pub use redis::RedisHistoryStore;
