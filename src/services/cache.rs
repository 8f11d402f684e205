use redis::aio::ConnectionManager;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::models::ListingKind;

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

/// Upper bound on L1 lifetime when Redis is shared with other instances
const SHARED_L1_TTL_SECS: u64 = 10;

/// Multi-tier cache manager
///
/// L1 is an in-process moka cache, L2 an optional Redis shared across
/// instances. Without Redis the manager runs on L1 alone. A delete only
/// reaches this instance's L1, so with Redis the L1 lifetime is capped at
/// `SHARED_L1_TTL_SECS` to bound how long peers serve a stale entry.
pub struct CacheManager {
    redis: Option<ConnectionManager>,
    l1_cache: moka::future::Cache<String, Vec<u8>>,
    ttl_secs: u64,
}

impl CacheManager {
    /// Create a cache manager backed by Redis
    pub async fn connect(redis_url: &str, l1_size: u64, ttl_secs: u64) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url)?;
        let redis = ConnectionManager::new(client).await?;

        Ok(Self {
            redis: Some(redis),
            l1_cache: Self::build_l1(l1_size, Self::l1_ttl_secs(true, ttl_secs)),
            ttl_secs,
        })
    }

    /// Create an in-process cache with no shared tier
    pub fn memory_only(l1_size: u64, ttl_secs: u64) -> Self {
        Self {
            redis: None,
            l1_cache: Self::build_l1(l1_size, Self::l1_ttl_secs(false, ttl_secs)),
            ttl_secs,
        }
    }

    fn l1_ttl_secs(shared: bool, ttl_secs: u64) -> u64 {
        if shared {
            ttl_secs.min(SHARED_L1_TTL_SECS)
        } else {
            ttl_secs
        }
    }

    fn build_l1(l1_size: u64, ttl_secs: u64) -> moka::future::Cache<String, Vec<u8>> {
        moka::future::CacheBuilder::new(l1_size)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build()
    }

    /// Name of the active tiers, reported by the health endpoint
    pub fn backend(&self) -> &'static str {
        if self.redis.is_some() {
            "memory+redis"
        } else {
            "memory"
        }
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

        if let Some(redis) = &self.redis {
            // ConnectionManager is a cheap handle onto one multiplexed connection
            let mut conn = redis.clone();
            let value: Option<String> = redis::cmd("GET").arg(key).query_async(&mut conn).await?;

            if let Some(json) = value {
                tracing::trace!("L2 cache hit: {}", key);
                self.l1_cache
                    .insert(key.to_string(), json.as_bytes().to_vec())
                    .await;
                return Ok(serde_json::from_str(&json)?);
            }
        }

        tracing::trace!("Cache miss: {}", key);
        Err(CacheError::CacheMiss(key.to_string()))
    }

    /// Set a value in cache (both tiers)
    pub async fn set<T>(&self, key: &str, value: &T) -> Result<(), CacheError>
    where
        T: Serialize,
    {
        let json = serde_json::to_string(value)?;

        self.l1_cache
            .insert(key.to_string(), json.as_bytes().to_vec())
            .await;

        if let Some(redis) = &self.redis {
            let mut conn = redis.clone();
            let _: () = redis::cmd("SETEX")
                .arg(key)
                .arg(self.ttl_secs)
                .arg(json)
                .query_async(&mut conn)
                .await?;
        }

        tracing::trace!("Cache set: {}", key);
        Ok(())
    }

    /// Delete a value from both cache tiers
    pub async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.l1_cache.invalidate(key).await;

        if let Some(redis) = &self.redis {
            let mut conn = redis.clone();
            let _: () = redis::cmd("DEL").arg(key).query_async(&mut conn).await?;
        }

        tracing::trace!("Cache delete: {}", key);
        Ok(())
    }

    /// Number of entries currently held in L1
    pub fn l1_entries(&self) -> u64 {
        self.l1_cache.entry_count()
    }
}

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    /// Build a cache key for a full listing catalog
    pub fn listings(kind: ListingKind) -> String {
        format!("listings:{}", kind.table())
    }
}
