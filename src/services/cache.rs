use redis::aio::ConnectionManager;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur with cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    RedisError(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Cache miss: {0}")]
    CacheMiss(String),
}

/// Writes the value only while the generation key still holds the
/// generation read before the value was loaded. A missing key counts as 0.
const GUARDED_SETEX: &str = r#"
local current = tonumber(redis.call('GET', KEYS[2]) or '0')
if current == tonumber(ARGV[1]) then
    redis.call('SETEX', KEYS[1], ARGV[2], ARGV[3])
    return 1
end
return 0
"#;

/// Two-tier cache manager
///
/// L1 is an in-process moka cache, L2 is Redis shared across instances.
/// Invalidation only reaches L2 and the local L1, so L1 keeps its own,
/// shorter TTL which bounds how long another instance can serve a
/// stale entry.
pub struct CacheManager {
    redis: Arc<tokio::sync::Mutex<ConnectionManager>>,
    l1_cache: moka::future::Cache<String, Vec<u8>>,
    ttl_secs: u64,
}

impl CacheManager {
    /// Create a new cache manager
    pub async fn new(
        redis_url: &str,
        l1_size: u64,
        l1_ttl_secs: u64,
        ttl_secs: u64,
    ) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url)?;
        let redis = ConnectionManager::new(client).await?;

        let l1_cache = moka::future::CacheBuilder::new(l1_size)
            .time_to_live(Duration::from_secs(l1_ttl_secs.min(ttl_secs)))
            .build();

        Ok(Self {
            redis: Arc::new(tokio::sync::Mutex::new(redis)),
            l1_cache,
            ttl_secs,
        })
    }

    /// Get a value from cache (L1 first, then L2)
    pub async fn get<T>(&self, key: &str) -> Result<T, CacheError>
    where
        T: for<'de> Deserialize<'de>,
    {
        if let Some(bytes) = self.l1_cache.get(key).await {
            tracing::trace!("L1 cache hit: {}", key);
            return Ok(serde_json::from_slice(&bytes)?);
        }

        let mut conn = self.redis.lock().await;
        let value: Option<String> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut *conn)
            .await?;
        drop(conn);

        if let Some(json) = value {
            tracing::trace!("L2 cache hit: {}", key);

            // Populate L1 cache
            self.l1_cache.insert(key.to_string(), json.as_bytes().to_vec()).await;

            return Ok(serde_json::from_str(&json)?);
        }

        tracing::trace!("Cache miss: {}", key);
        Err(CacheError::CacheMiss(key.to_string()))
    }

    /// Current generation of `generation_key`; 0 when never bumped
    pub async fn generation(&self, generation_key: &str) -> Result<u64, CacheError> {
        let mut conn = self.redis.lock().await;
        let value: Option<u64> = redis::cmd("GET")
            .arg(generation_key)
            .query_async(&mut *conn)
            .await?;

        Ok(value.unwrap_or(0))
    }

    /// Advance `generation_key` so values loaded before now are not cached
    pub async fn bump_generation(&self, generation_key: &str) -> Result<u64, CacheError> {
        let mut conn = self.redis.lock().await;
        let value: u64 = redis::cmd("INCR")
            .arg(generation_key)
            .query_async(&mut *conn)
            .await?;

        Ok(value)
    }

    /// Set a value in both tiers unless `generation_key` moved past `generation`
    ///
    /// Returns whether the value was stored.
    pub async fn set_if_generation<T>(
        &self,
        key: &str,
        value: &T,
        generation_key: &str,
        generation: u64,
    ) -> Result<bool, CacheError>
    where
        T: Serialize,
    {
        let json = serde_json::to_string(value)?;

        let mut conn = self.redis.lock().await;
        let stored: i32 = redis::Script::new(GUARDED_SETEX)
            .key(key)
            .key(generation_key)
            .arg(generation)
            .arg(self.ttl_secs)
            .arg(&json)
            .invoke_async(&mut *conn)
            .await?;
        drop(conn);

        if stored == 0 {
            tracing::debug!("Skipped stale cache write: {}", key);
            return Ok(false);
        }

        self.l1_cache.insert(key.to_string(), json.into_bytes()).await;
        Ok(true)
    }

    /// Delete a value from both tiers
    pub async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.l1_cache.invalidate(key).await;
        let mut conn = self.redis.lock().await;
        let _: () = redis::cmd("DEL")
            .arg(key)
            .query_async(&mut *conn)
            .await?;
        Ok(())
    }
}

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    /// Itinerary ids a user has already viewed
    pub fn viewed(user_id: &str) -> String {
        format!("viewed:{}", user_id)
    }

    /// Bumped on every change to a user's viewed list
    pub fn viewed_generation(user_id: &str) -> String {
        format!("viewed-gen:{}", user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore = "Requires Redis"]
    async fn test_cache_set_get() {
        let cache = CacheManager::new("redis://127.0.0.1:6379", 1000, 10, 60)
            .await
            .expect("Failed to create cache");

        let key = CacheKey::viewed("cache-test-user");
        let generation_key = CacheKey::viewed_generation("cache-test-user");
        let value = vec!["it-1".to_string(), "it-2".to_string()];

        let generation = cache.generation(&generation_key).await.unwrap();
        assert!(cache.set_if_generation(&key, &value, &generation_key, generation).await.unwrap());
        let result: Vec<String> = cache.get(&key).await.unwrap();
        assert_eq!(result, value);

        cache.delete(&key).await.unwrap();
        assert!(matches!(
            cache.get::<Vec<String>>(&key).await,
            Err(CacheError::CacheMiss(_))
        ));
    }

    #[tokio::test]
    #[ignore = "Requires Redis"]
    async fn test_stale_write_after_bump_rejected() {
        let cache = CacheManager::new("redis://127.0.0.1:6379", 1000, 10, 60)
            .await
            .expect("Failed to create cache");

        let key = CacheKey::viewed("stale-test-user");
        let generation_key = CacheKey::viewed_generation("stale-test-user");

        // A search loads the list, then a view lands before it writes back
        let loaded_at = cache.generation(&generation_key).await.unwrap();
        cache.bump_generation(&generation_key).await.unwrap();
        cache.delete(&key).await.unwrap();

        let stale = vec!["it-1".to_string()];
        assert!(!cache.set_if_generation(&key, &stale, &generation_key, loaded_at).await.unwrap());
        assert!(cache.get::<Vec<String>>(&key).await.is_err());

        let current = cache.generation(&generation_key).await.unwrap();
        assert!(cache.set_if_generation(&key, &stale, &generation_key, current).await.unwrap());

        cache.delete(&key).await.unwrap();
    }

    #[test]
    fn test_cache_key_builder() {
        assert_eq!(CacheKey::viewed("user123"), "viewed:user123");
        assert_eq!(CacheKey::viewed_generation("user123"), "viewed-gen:user123");
    }
}
