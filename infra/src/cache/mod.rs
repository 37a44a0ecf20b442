//! Cache module for Redis-backed session state
//!
//! Provides the Redis client with retry logic and the [`RedisSessionStore`]
//! implementation of the core session store interface.

pub mod redis_client;
pub mod session_store;

#[cfg(test)]
mod tests;

pub use redis_client::RedisClient;
pub use session_store::RedisSessionStore;

// Re-export commonly used types
pub use mfa_shared::config::CacheConfig;
