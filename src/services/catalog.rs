use std::sync::Arc;

use crate::models::{Listing, ListingKind};
use crate::services::cache::{CacheError, CacheKey, CacheManager};
use crate::services::postgres::{PostgresClient, PostgresError};

/// Read-through cache of listing catalogs
///
/// Matching walks the whole scholarship table on every profile update,
/// match request and dashboard load. Catalogs are served from the cache and
/// dropped on every listing write. Cache failures degrade to a database read.
pub struct ListingCatalog {
    postgres: Arc<PostgresClient>,
    cache: Arc<CacheManager>,
}

impl ListingCatalog {
    pub fn new(postgres: Arc<PostgresClient>, cache: Arc<CacheManager>) -> Self {
        Self { postgres, cache }
    }

    pub fn cache(&self) -> &CacheManager {
        &self.cache
    }

    /// All listings of a kind, in id order
    pub async fn listings(&self, kind: ListingKind) -> Result<Vec<Listing>, PostgresError> {
        let key = CacheKey::listings(kind);

        match self.cache.get::<Vec<Listing>>(&key).await {
            Ok(listings) => return Ok(listings),
            Err(CacheError::CacheMiss(_)) => {}
            Err(e) => tracing::warn!("Listing cache read failed for {}: {}", key, e),
        }

        let listings = self.postgres.list_listings(kind).await?;

        if let Err(e) = self.cache.set(&key, &listings).await {
            tracing::warn!("Listing cache write failed for {}: {}", key, e);
        }

        Ok(listings)
    }

    /// Drop the cached catalog after a write
    ///
    /// Clears the shared Redis entry and this instance's L1. Other instances
    /// keep their L1 copy until it expires, which is at most a few seconds
    /// when Redis is configured.
    pub async fn invalidate(&self, kind: ListingKind) {
        let key = CacheKey::listings(kind);
        if let Err(e) = self.cache.delete(&key).await {
            tracing::warn!("Listing cache invalidation failed for {}: {}", key, e);
        }
    }
}
