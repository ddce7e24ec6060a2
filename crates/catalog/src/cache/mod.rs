//! Search result cache with tag-based invalidation.
//!
//! Entries live in a Moka cache bounded by capacity and TTL. Each tag keeps a
//! generation number that is folded into the physical key, so bumping the
//! generation hides every entry stored under the old one immediately,
//! including entries whose computation was still in flight. Old-generation
//! entries are then dropped by a Moka invalidation predicate, or age out.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use moka::future::Cache;
use tracing::{debug, warn};

use crate::search::SearchResult;

/// Tag shared by every cached catalog search.
pub const CATALOG_SEARCH_TAG: &str = "catalog-search";

/// Default entry TTL (5 minutes).
pub const DEFAULT_TTL_SECS: u64 = 300;

/// Default maximum number of cached results.
pub const DEFAULT_MAX_CAPACITY: u64 = 10_000;

/// A cached search result.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub result: SearchResult,

    /// Unix timestamp when computed.
    pub created: i64,

    /// Invalidation tag the entry is stored under.
    pub tag: String,
}

/// Tag-invalidated search cache.
#[derive(Clone)]
pub struct SearchCache {
    inner: Arc<SearchCacheInner>,
}

struct SearchCacheInner {
    entries: Cache<String, Arc<CacheEntry>>,
    /// Current generation per tag. One small counter per tag name.
    generations: DashMap<String, u64>,
}

impl SearchCache {
    pub fn new(ttl: Duration, max_capacity: u64) -> Self {
        let entries = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(ttl)
            .support_invalidation_closures()
            .build();

        Self {
            inner: Arc::new(SearchCacheInner {
                entries,
                generations: DashMap::new(),
            }),
        }
    }

    /// Return the cached entry for `key`, computing it on a miss.
    ///
    /// Concurrent misses for the same key share one computation. Errors are
    /// returned to every waiter and nothing is cached.
    pub async fn get_or_try_insert_with<F, Fut, E>(
        &self,
        tag: &str,
        key: &str,
        compute: F,
    ) -> Result<Arc<CacheEntry>, Arc<E>>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<SearchResult, E>> + Send,
        E: Send + Sync + 'static,
    {
        let physical = physical_key(tag, self.generation(tag), key);

        if let Some(hit) = self.inner.entries.get(&physical).await {
            debug!(key = %physical, "search cache hit");
            return Ok(hit);
        }

        debug!(key = %physical, "search cache miss");
        let owned_tag = tag.to_string();
        self.inner
            .entries
            .try_get_with(physical, async move {
                let result = compute().await?;
                Ok(Arc::new(CacheEntry {
                    result,
                    created: chrono::Utc::now().timestamp(),
                    tag: owned_tag,
                }))
            })
            .await
    }

    /// Invalidate every entry stored under `tag`.
    ///
    /// Subsequent lookups miss as soon as this returns.
    pub async fn invalidate_tag(&self, tag: &str) {
        let generation = {
            let mut generation = self.inner.generations.entry(tag.to_string()).or_insert(0);
            *generation += 1;
            *generation
        };

        let stale_prefix = format!("{tag}@");
        let current_prefix = physical_key(tag, generation, "");
        let queued = self.inner.entries.invalidate_entries_if(move |key, _| {
            key.starts_with(&stale_prefix) && !key.starts_with(&current_prefix)
        });
        if let Err(e) = queued {
            warn!(tag = %tag, error = %e, "could not queue stale cache entries for removal");
        }

        debug!(tag = %tag, generation, "tag invalidated");
    }

    /// Get cache statistics (for monitoring).
    pub async fn stats(&self) -> CacheStats {
        self.inner.entries.run_pending_tasks().await;
        CacheStats {
            entry_count: self.inner.entries.entry_count(),
            weighted_size: self.inner.entries.weighted_size(),
        }
    }

    /// Number of tags with a generation counter.
    pub fn tracked_tags(&self) -> usize {
        self.inner.generations.len()
    }

    fn generation(&self, tag: &str) -> u64 {
        self.inner.generations.get(tag).map(|g| *g).unwrap_or(0)
    }
}

impl Default for SearchCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_TTL_SECS), DEFAULT_MAX_CAPACITY)
    }
}

impl std::fmt::Debug for SearchCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchCache").finish()
    }
}

/// Cache statistics.
#[derive(Debug, Clone)]
pub struct CacheStats {
    /// Number of live entries.
    pub entry_count: u64,

    pub weighted_size: u64,
}

fn physical_key(tag: &str, generation: u64, key: &str) -> String {
    format!("{tag}@{generation}:{key}")
}

#[cfg(test)]
// Tests are allowed to use unwrap/expect freely.
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn result(total: u64) -> SearchResult {
        SearchResult::new(vec![], total, vec![], 1, 24)
    }

    async fn lookup(cache: &SearchCache, key: &str, calls: &AtomicUsize, total: u64) -> u64 {
        let entry = cache
            .get_or_try_insert_with(CATALOG_SEARCH_TAG, key, move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, std::convert::Infallible>(result(total))
            })
            .await
            .unwrap();
        entry.result.total
    }

    #[test]
    fn physical_key_embeds_generation() {
        assert_eq!(physical_key("catalog-search", 3, "k"), "catalog-search@3:k");
    }

    #[tokio::test]
    async fn hit_skips_computation() {
        let cache = SearchCache::default();
        let calls = AtomicUsize::new(0);

        assert_eq!(lookup(&cache, "a", &calls, 7).await, 7);
        assert_eq!(lookup(&cache, "a", &calls, 99).await, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let entry = cache
            .get_or_try_insert_with(CATALOG_SEARCH_TAG, "a", move || async move {
                Ok::<_, std::convert::Infallible>(result(0))
            })
            .await
            .unwrap();
        assert_eq!(entry.tag, CATALOG_SEARCH_TAG);
        assert!(entry.created > 0);
    }

    #[tokio::test]
    async fn invalidate_tag_forces_recompute() {
        let cache = SearchCache::default();
        let calls = AtomicUsize::new(0);

        lookup(&cache, "a", &calls, 1).await;
        lookup(&cache, "b", &calls, 2).await;
        cache.invalidate_tag(CATALOG_SEARCH_TAG).await;

        assert_eq!(lookup(&cache, "a", &calls, 10).await, 10);
        assert_eq!(lookup(&cache, "b", &calls, 20).await, 20);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn other_tags_survive_invalidation() {
        let cache = SearchCache::default();
        let counter = AtomicUsize::new(0);
        let calls = &counter;

        cache
            .get_or_try_insert_with("other", "a", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, std::convert::Infallible>(result(5))
            })
            .await
            .unwrap();
        cache.invalidate_tag(CATALOG_SEARCH_TAG).await;

        let entry = cache
            .get_or_try_insert_with("other", "a", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, std::convert::Infallible>(result(6))
            })
            .await
            .unwrap();
        assert_eq!(entry.result.total, 5);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn errors_are_not_cached() {
        let cache = SearchCache::default();

        let failed = cache
            .get_or_try_insert_with(CATALOG_SEARCH_TAG, "a", move || async move {
                Err::<SearchResult, _>("store down".to_string())
            })
            .await;
        assert_eq!(failed.unwrap_err().as_str(), "store down");

        let recovered = cache
            .get_or_try_insert_with(CATALOG_SEARCH_TAG, "a", move || async move {
                Ok::<_, String>(result(3))
            })
            .await
            .unwrap();
        assert_eq!(recovered.result.total, 3);
    }

    #[tokio::test]
    async fn entries_expire_after_ttl() {
        let cache = SearchCache::new(Duration::from_millis(100), 100);
        let calls = AtomicUsize::new(0);

        lookup(&cache, "a", &calls, 1).await;
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(lookup(&cache, "a", &calls, 2).await, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn computation_finishing_after_invalidation_is_not_served() {
        let cache = SearchCache::default();
        let calls = AtomicUsize::new(0);

        let handle = cache.clone();
        let stale = cache
            .get_or_try_insert_with(CATALOG_SEARCH_TAG, "a", move || async move {
                handle.invalidate_tag(CATALOG_SEARCH_TAG).await;
                Ok::<_, std::convert::Infallible>(result(1))
            })
            .await
            .unwrap();
        assert_eq!(stale.result.total, 1);

        assert_eq!(lookup(&cache, "a", &calls, 2).await, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn concurrent_misses_share_one_computation() {
        let cache = SearchCache::default();
        let calls = AtomicUsize::new(0);

        let (a, b) = tokio::join!(
            lookup(&cache, "same", &calls, 1),
            lookup(&cache, "same", &calls, 2)
        );

        assert_eq!(a, b);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stats_count_entries() {
        let cache = SearchCache::default();
        let calls = AtomicUsize::new(0);
        lookup(&cache, "a", &calls, 1).await;
        lookup(&cache, "b", &calls, 1).await;

        assert_eq!(cache.stats().await.entry_count, 2);

        cache.invalidate_tag(CATALOG_SEARCH_TAG).await;
        assert_eq!(cache.stats().await.entry_count, 0);
    }

    #[tokio::test]
    async fn bookkeeping_stays_bounded_by_capacity() {
        let cache = SearchCache::new(Duration::from_secs(300), 10);
        let calls = AtomicUsize::new(0);

        for i in 0..5000 {
            lookup(&cache, &format!("key-{i}"), &calls, i).await;
        }

        // Drain the write log fully before reading the count.
        for _ in 0..3 {
            cache.stats().await;
        }
        assert!(cache.stats().await.entry_count <= 10);
        assert_eq!(cache.tracked_tags(), 0);

        for _ in 0..50 {
            cache.invalidate_tag(CATALOG_SEARCH_TAG).await;
        }
        assert_eq!(cache.tracked_tags(), 1);
        assert_eq!(cache.stats().await.entry_count, 0);
    }
}
