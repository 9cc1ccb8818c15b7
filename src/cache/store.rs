//! MetadataStore trait and its cache-backed implementation.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{CacheKey, CacheResult, MetadataCache};
use crate::metadata::{DimensionDetailMeta, DimensionMeta, FactMeta, Operator};

/// Persistent storage for one provider's catalog and its metadata version.
///
/// Every `save_*` replaces the whole collection. Loading a collection that was
/// never saved yields an empty list.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// The cached metadata version, `None` if nothing was ever synced.
    async fn get_version(&self) -> CacheResult<Option<i64>>;
    async fn set_version(&self, version: i64) -> CacheResult<()>;

    async fn save_operators(&self, operators: &[Operator]) -> CacheResult<()>;
    async fn load_operators(&self) -> CacheResult<Vec<Operator>>;

    async fn save_dimensions(&self, dimensions: &[DimensionMeta]) -> CacheResult<()>;
    async fn load_dimensions(&self) -> CacheResult<Vec<DimensionMeta>>;

    async fn save_dimension_details(&self, details: &[DimensionDetailMeta]) -> CacheResult<()>;
    async fn load_dimension_details(&self) -> CacheResult<Vec<DimensionDetailMeta>>;

    async fn save_facts(&self, facts: &[FactMeta]) -> CacheResult<()>;
    async fn load_facts(&self) -> CacheResult<Vec<FactMeta>>;
}

/// [`MetadataStore`] over a shared [`MetadataCache`], scoped to one provider.
#[derive(Clone)]
pub struct CachedMetadataStore {
    cache: Arc<Mutex<MetadataCache>>,
    provider: String,
}

impl CachedMetadataStore {
    pub fn new(cache: Arc<Mutex<MetadataCache>>, provider: impl Into<String>) -> Self {
        Self {
            cache,
            provider: provider.into(),
        }
    }

    /// Convenience constructor owning a private cache.
    pub fn with_cache(cache: MetadataCache, provider: impl Into<String>) -> Self {
        Self::new(Arc::new(Mutex::new(cache)), provider)
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    async fn load_list<T: serde::de::DeserializeOwned>(&self, key: String) -> CacheResult<Vec<T>> {
        Ok(self.cache.lock().await.get(&key)?.unwrap_or_default())
    }
}

#[async_trait]
impl MetadataStore for CachedMetadataStore {
    async fn get_version(&self) -> CacheResult<Option<i64>> {
        self.cache.lock().await.get(&CacheKey::version(&self.provider))
    }

    async fn set_version(&self, version: i64) -> CacheResult<()> {
        self.cache
            .lock()
            .await
            .set(&CacheKey::version(&self.provider), &version)
    }

    async fn save_operators(&self, operators: &[Operator]) -> CacheResult<()> {
        self.cache
            .lock()
            .await
            .set(&CacheKey::operators(&self.provider), operators)
    }

    async fn load_operators(&self) -> CacheResult<Vec<Operator>> {
        self.load_list(CacheKey::operators(&self.provider)).await
    }

    async fn save_dimensions(&self, dimensions: &[DimensionMeta]) -> CacheResult<()> {
        self.cache
            .lock()
            .await
            .set(&CacheKey::dimensions(&self.provider), dimensions)
    }

    async fn load_dimensions(&self) -> CacheResult<Vec<DimensionMeta>> {
        self.load_list(CacheKey::dimensions(&self.provider)).await
    }

    async fn save_dimension_details(&self, details: &[DimensionDetailMeta]) -> CacheResult<()> {
        self.cache
            .lock()
            .await
            .set(&CacheKey::dimension_details(&self.provider), details)
    }

    async fn load_dimension_details(&self) -> CacheResult<Vec<DimensionDetailMeta>> {
        self.load_list(CacheKey::dimension_details(&self.provider))
            .await
    }

    async fn save_facts(&self, facts: &[FactMeta]) -> CacheResult<()> {
        self.cache
            .lock()
            .await
            .set(&CacheKey::facts(&self.provider), facts)
    }

    async fn load_facts(&self) -> CacheResult<Vec<FactMeta>> {
        self.load_list(CacheKey::facts(&self.provider)).await
    }
}
