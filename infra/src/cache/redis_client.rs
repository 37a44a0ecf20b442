//! Redis client implementation
//!
//! Connection management with retry logic, plus the hash and script
//! operations the session store is built on.

use redis::{
    aio::MultiplexedConnection, AsyncCommands, Client, FromRedisValue, RedisError, RedisResult,
    Script, ToRedisArgs,
};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::config::CacheConfig;
use crate::InfrastructureError;

type RedisFuture<T> = Pin<Box<dyn Future<Output = RedisResult<T>> + Send>>;

/// Redis client with a shared multiplexed connection and retry logic
#[derive(Clone)]
pub struct RedisClient {
    /// Redis multiplexed connection for async operations
    connection: MultiplexedConnection,
    /// Configuration used to create this client
    config: CacheConfig,
    /// Maximum number of attempts per operation
    max_retries: u32,
    /// Base delay between retries (exponential backoff)
    retry_delay_ms: u64,
}

impl RedisClient {
    /// Create a new Redis client
    ///
    /// # Example
    /// ```no_run
    /// use mfa_infra::config::CacheConfig;
    /// use mfa_infra::cache::RedisClient;
    ///
    /// async fn create_client() -> Result<RedisClient, Box<dyn std::error::Error>> {
    ///     let client = RedisClient::new(CacheConfig::new("redis://localhost:6379")).await?;
    ///     Ok(client)
    /// }
    /// ```
    pub async fn new(config: CacheConfig) -> Result<Self, InfrastructureError> {
        Self::new_with_retry_config(config, 3, 100).await
    }

    /// Create a new Redis client with custom retry configuration
    pub async fn new_with_retry_config(
        config: CacheConfig,
        max_retries: u32,
        retry_delay_ms: u64,
    ) -> Result<Self, InfrastructureError> {
        info!(
            event = "redis_connect",
            url = %mask_url(&config.url),
            pool_size = config.pool_size,
            "Creating Redis client"
        );

        let client = Client::open(config.url.as_str()).map_err(|e| {
            error!("Failed to parse Redis URL: {}", e);
            InfrastructureError::Config(format!("Invalid Redis URL: {}", e))
        })?;

        let connection =
            Self::create_connection_with_retry(client, max_retries, retry_delay_ms).await?;

        info!("Redis client created successfully");

        Ok(Self {
            connection,
            config,
            max_retries,
            retry_delay_ms,
        })
    }

    async fn create_connection_with_retry(
        client: Client,
        max_retries: u32,
        retry_delay_ms: u64,
    ) -> Result<MultiplexedConnection, InfrastructureError> {
        let mut attempts = 0;
        let mut delay = retry_delay_ms;

        loop {
            attempts += 1;
            debug!("Attempting to connect to Redis (attempt {})", attempts);

            match client.get_multiplexed_async_connection().await {
                Ok(connection) => return Ok(connection),
                Err(e) if attempts < max_retries => {
                    warn!(
                        "Failed to connect to Redis (attempt {}/{}): {}. Retrying in {}ms...",
                        attempts, max_retries, e, delay
                    );
                    sleep(Duration::from_millis(delay)).await;
                    // Exponential backoff with cap at 5 seconds
                    delay = (delay * 2).min(5000);
                }
                Err(e) => {
                    error!("Failed to connect to Redis after {} attempts: {}", attempts, e);
                    return Err(InfrastructureError::Cache(e));
                }
            }
        }
    }

    /// Prefix a key with the configured namespace
    pub fn make_key(&self, key: &str) -> String {
        self.config.make_key(key)
    }

    /// Read every field of a hash, empty when the key does not exist
    pub async fn read_hash(&self, key: &str) -> Result<HashMap<String, String>, InfrastructureError> {
        let result = self
            .execute_with_retry(|mut conn| {
                let key = key.to_string();
                Box::pin(async move { conn.hgetall::<_, HashMap<String, String>>(key).await })
            })
            .await;

        result.map_err(|e| {
            error!("Failed to read hash '{}': {}", key, e);
            InfrastructureError::Cache(e)
        })
    }

    /// Replace a hash with exactly `fields` and refresh its expiry
    ///
    /// Runs as one MULTI/EXEC block. An empty field set deletes the key.
    pub async fn replace_hash(
        &self,
        key: &str,
        fields: &[(String, String)],
        expiry_seconds: u64,
    ) -> Result<(), InfrastructureError> {
        debug!("Replacing hash '{}' ({} fields)", key, fields.len());

        let result = self
            .execute_with_retry(|mut conn| {
                let key = key.to_string();
                let fields = fields.to_vec();
                Box::pin(async move {
                    let mut pipe = redis::pipe();
                    pipe.atomic().del(&key).ignore();
                    if !fields.is_empty() {
                        pipe.hset_multiple(&key, fields.as_slice())
                            .ignore()
                            .expire(&key, expiry_seconds as i64)
                            .ignore();
                    }
                    pipe.query_async::<_, ()>(&mut conn).await
                })
            })
            .await;

        result.map_err(|e| {
            error!("Failed to replace hash '{}': {}", key, e);
            InfrastructureError::Cache(e)
        })
    }

    /// Delete a key, returning whether it existed
    pub async fn delete(&self, key: &str) -> Result<bool, InfrastructureError> {
        debug!("Deleting key '{}'", key);

        let result = self
            .execute_with_retry(|mut conn| {
                let key = key.to_string();
                Box::pin(async move { conn.del::<_, u32>(key).await })
            })
            .await;

        match result {
            Ok(deleted_count) => Ok(deleted_count > 0),
            Err(e) => {
                error!("Failed to delete key '{}': {}", key, e);
                Err(InfrastructureError::Cache(e))
            }
        }
    }

    /// Evaluate a Lua script against a single key
    ///
    /// Uses EVALSHA with a transparent EVAL fallback.
    pub async fn run_script<A, T>(
        &self,
        script: &Script,
        key: &str,
        args: &[A],
    ) -> Result<T, InfrastructureError>
    where
        A: ToRedisArgs + Clone + Send + Sync + 'static,
        T: FromRedisValue + Send + 'static,
    {
        let result = self
            .execute_with_retry(|mut conn| {
                let script = script.clone();
                let key = key.to_string();
                let args = args.to_vec();
                Box::pin(async move {
                    let mut invocation = script.key(key);
                    for arg in &args {
                        invocation.arg(arg.clone());
                    }
                    invocation.invoke_async::<_, T>(&mut conn).await
                })
            })
            .await;

        result.map_err(|e| {
            error!("Script on '{}' failed: {}", key, e);
            InfrastructureError::Cache(e)
        })
    }

    /// Execute a Redis operation with automatic retry logic
    async fn execute_with_retry<F, T>(&self, operation: F) -> RedisResult<T>
    where
        F: Fn(MultiplexedConnection) -> RedisFuture<T>,
    {
        let mut attempts = 0;
        let mut delay = self.retry_delay_ms;

        loop {
            attempts += 1;
            let conn = self.connection.clone();

            match operation(conn).await {
                Ok(result) => return Ok(result),
                Err(e) if attempts < self.max_retries && is_retriable_error(&e) => {
                    warn!(
                        "Redis operation failed (attempt {}/{}): {}. Retrying in {}ms...",
                        attempts, self.max_retries, e, delay
                    );
                    sleep(Duration::from_millis(delay)).await;
                    delay = (delay * 2).min(5000);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// PING the server
    pub async fn health_check(&self) -> Result<bool, InfrastructureError> {
        let result = self
            .execute_with_retry(|mut conn| {
                Box::pin(async move { redis::cmd("PING").query_async::<_, String>(&mut conn).await })
            })
            .await;

        match result {
            Ok(response) if response == "PONG" => Ok(true),
            Ok(response) => {
                warn!("Redis health check returned unexpected response: {}", response);
                Ok(false)
            }
            Err(e) => {
                error!("Redis health check failed: {}", e);
                Err(InfrastructureError::Cache(e))
            }
        }
    }
}

/// Whether an error is transient and the operation may be retried
pub(crate) fn is_retriable_error(error: &RedisError) -> bool {
    matches!(
        error.kind(),
        redis::ErrorKind::IoError
            | redis::ErrorKind::ClientError
            | redis::ErrorKind::BusyLoadingError
            | redis::ErrorKind::TryAgain
    )
}

/// Hide credentials in a Redis URL before logging it
pub(crate) fn mask_url(url: &str) -> String {
    if let (Some(at_pos), Some(proto_end)) = (url.rfind('@'), url.find("://")) {
        if at_pos > proto_end {
            return format!("{}****{}", &url[..proto_end + 3], &url[at_pos..]);
        }
    }
    url.to_string()
}
