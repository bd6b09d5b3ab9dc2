//! # engine::loader
//!
//! **Data loader** — memoises the filtered production query per
//! [`FilterTuple`].
//!
//! The cache is bounded (`CACHE_MAX_ENTRIES`) and entries expire after
//! `CACHE_TTL_SECS`. Failed queries are never cached; empty results are.

use std::sync::Arc;

use moka::future::Cache;
use tracing::{debug, info};

use crate::{
    config::CacheConfig,
    db::ProductionSource,
    error::AppError,
    models::{FilterTuple, ProductionTable},
};

#[derive(Clone)]
pub struct DataLoader {
    source: Arc<dyn ProductionSource>,
    cache:  Cache<FilterTuple, Arc<ProductionTable>>,
}

impl DataLoader {
    pub fn new(source: Arc<dyn ProductionSource>, config: &CacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_entries)
            .time_to_live(config.ttl)
            .build();

        Self { source, cache }
    }

    /// Rows for `filter`, from cache when still fresh.
    pub async fn load(&self, filter: &FilterTuple) -> Result<Arc<ProductionTable>, AppError> {
        if let Some(table) = self.cache.get(filter).await {
            debug!(%filter, rows = table.len(), "cache hit");
            return Ok(table);
        }

        debug!(%filter, "cache miss — querying database");
        let table = Arc::new(self.source.fetch(filter).await?);
        self.cache.insert(filter.clone(), Arc::clone(&table)).await;

        info!(%filter, rows = table.len(), "production rows loaded");
        Ok(table)
    }

    /// Rows for `filter`, treating an empty result as an error so the
    /// pipeline halts before any model is invoked.
    pub async fn load_non_empty(&self, filter: &FilterTuple) -> Result<Arc<ProductionTable>, AppError> {
        let table = self.load(filter).await?;
        if table.is_empty() {
            return Err(AppError::EmptyResult(filter.clone()));
        }
        Ok(table)
    }

    /// Drop one cached filter tuple.
    pub async fn invalidate(&self, filter: &FilterTuple) {
        self.cache.invalidate(filter).await;
        info!(%filter, "🧹 cache entry invalidated");
    }

    /// Drop everything, e.g. after the source data was refreshed.
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
        info!("🧹 query cache cleared");
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::DataError;
    use crate::models::{ProductionRecord, Species};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Call-counting source returning canned rows (or an error).
    pub(crate) struct SpySource {
        pub calls:   AtomicUsize,
        pub records: Vec<ProductionRecord>,
        pub fail:    bool,
    }

    impl SpySource {
        pub(crate) fn with(records: Vec<ProductionRecord>) -> Arc<Self> {
            Arc::new(Self { calls: AtomicUsize::new(0), records, fail: false })
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ProductionSource for SpySource {
        async fn fetch(&self, filter: &FilterTuple) -> Result<ProductionTable, DataError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(DataError::Timeout(Duration::from_secs(1)));
            }
            let rows = self
                .records
                .iter()
                .filter(|r| r.species == filter.species.as_str() && r.region.contains(&filter.region))
                .cloned()
                .collect();
            Ok(ProductionTable::new(rows, false))
        }
    }

    pub(crate) fn shrimp_rows() -> Vec<ProductionRecord> {
        [("2023-11-30", 10.0), ("2023-12-31", 12.0), ("2024-01-31", 14.0)]
            .iter()
            .map(|(date, y)| ProductionRecord {
                date:        date.parse().unwrap(),
                species:     "Shrimp".into(),
                region:      "Andhra Pradesh".into(),
                yield_value: *y,
                price:       300.0 + y,
                latitude:    None,
                longitude:   None,
            })
            .collect()
    }

    fn config() -> CacheConfig {
        CacheConfig { ttl: Duration::from_secs(60), max_entries: 16 }
    }

    fn shrimp() -> FilterTuple {
        FilterTuple::new(Species::Shrimp, "Andhra Pradesh").unwrap()
    }

    #[tokio::test]
    async fn repeated_load_hits_cache() {
        let spy = SpySource::with(shrimp_rows());
        let loader = DataLoader::new(spy.clone(), &config());

        let first = loader.load(&shrimp()).await.unwrap();
        let second = loader.load(&shrimp()).await.unwrap();

        assert_eq!(spy.calls(), 1);
        assert_eq!(first.len(), 3);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn distinct_tuples_query_separately() {
        let spy = SpySource::with(shrimp_rows());
        let loader = DataLoader::new(spy.clone(), &config());

        loader.load(&shrimp()).await.unwrap();
        loader
            .load(&FilterTuple::new(Species::Rohu, "Andhra Pradesh").unwrap())
            .await
            .unwrap();

        assert_eq!(spy.calls(), 2);
    }

    #[tokio::test]
    async fn invalidation_forces_requery() {
        let spy = SpySource::with(shrimp_rows());
        let loader = DataLoader::new(spy.clone(), &config());

        loader.load(&shrimp()).await.unwrap();
        loader.invalidate(&shrimp()).await;
        loader.load(&shrimp()).await.unwrap();
        loader.invalidate_all();
        loader.load(&shrimp()).await.unwrap();

        assert_eq!(spy.calls(), 3);
    }

    #[tokio::test]
    async fn expired_entries_are_reloaded() {
        let spy = SpySource::with(shrimp_rows());
        let loader = DataLoader::new(
            spy.clone(),
            &CacheConfig { ttl: Duration::from_millis(50), max_entries: 16 },
        );

        loader.load(&shrimp()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(120)).await;
        loader.load(&shrimp()).await.unwrap();

        assert_eq!(spy.calls(), 2);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let spy = Arc::new(SpySource { calls: AtomicUsize::new(0), records: vec![], fail: true });
        let loader = DataLoader::new(spy.clone(), &config());

        assert!(matches!(loader.load(&shrimp()).await, Err(AppError::DataAccess(_))));
        assert!(loader.load(&shrimp()).await.is_err());

        assert_eq!(spy.calls(), 2);
    }

    #[tokio::test]
    async fn empty_result_halts_with_user_error() {
        let spy = SpySource::with(shrimp_rows());
        let loader = DataLoader::new(spy.clone(), &config());
        let catla = FilterTuple::new(Species::Catla, "Andhra Pradesh").unwrap();

        let err = loader.load_non_empty(&catla).await.unwrap_err();

        assert!(matches!(err, AppError::EmptyResult(_)));
        // empty results are cached like any other
        loader.load_non_empty(&catla).await.unwrap_err();
        assert_eq!(spy.calls(), 1);
    }
}
