//! Catalog search service.
//!
//! Drives the pipeline: normalize, compile, resolve sort and page, execute
//! with degradation, assemble, all behind the tag-invalidated cache.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use super::compiler::compile;
use super::executor::DegradingExecutor;
use super::normalizer::normalize;
use super::paginator::{self, DEFAULT_FACET_LIMIT, DEFAULT_PAGE_SIZE, PageWindow, resolve_page};
use super::sort::{SortKey, resolve_sort_key};
use super::types::{FilterState, RawQueryInput, SearchResult};
use crate::cache::{CATALOG_SEARCH_TAG, SearchCache};
use crate::store::{ListingStore, StoreError};

/// Search errors.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The store failed in a way the executor does not recover from.
    #[error("catalog search failed: {0}")]
    Store(Arc<StoreError>),
}

impl SearchError {
    pub fn store_error(&self) -> &StoreError {
        match self {
            SearchError::Store(e) => e,
        }
    }
}

/// Tunables for the search pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchSettings {
    pub page_size: u32,
    pub facet_limit: u32,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            facet_limit: DEFAULT_FACET_LIMIT,
        }
    }
}

/// Search output together with the state it was computed for.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub state: FilterState,
    pub result: SearchResult,
}

/// Catalog search over a listing store.
#[derive(Clone)]
pub struct CatalogSearch {
    executor: DegradingExecutor,
    cache: SearchCache,
    settings: SearchSettings,
}

impl CatalogSearch {
    pub fn new(store: Arc<dyn ListingStore>, cache: SearchCache, settings: SearchSettings) -> Self {
        Self {
            executor: DegradingExecutor::new(store, settings.facet_limit),
            cache,
            settings,
        }
    }

    pub fn settings(&self) -> SearchSettings {
        self.settings
    }

    /// Search from raw query parameters.
    pub async fn search(&self, raw: &RawQueryInput) -> Result<SearchOutcome, SearchError> {
        let state = normalize(raw);
        let result = self.search_state(&state).await?;
        Ok(SearchOutcome { state, result })
    }

    /// Search from an already normalized state.
    pub async fn search_state(&self, state: &FilterState) -> Result<SearchResult, SearchError> {
        let sort = resolve_sort_key(state.sort.as_deref());
        let page = resolve_page(state.page.as_deref());
        let key = cache_key(state, sort, page);

        let entry = self
            .cache
            .get_or_try_insert_with(CATALOG_SEARCH_TAG, &key, || self.run(state, sort, page))
            .await
            .map_err(SearchError::Store)?;

        Ok(entry.result.clone())
    }

    async fn run(
        &self,
        state: &FilterState,
        sort: SortKey,
        page: u32,
    ) -> Result<SearchResult, StoreError> {
        let predicate = compile(state);
        let directives = sort.directives();
        let window = PageWindow::new(page, self.settings.page_size);

        debug!(predicate = %predicate, sort = sort.as_str(), page, "executing catalog search");
        let raw = self.executor.execute(&predicate, &directives, window).await?;
        if raw.degraded {
            debug!(predicate = %raw.predicate, "catalog search served degraded");
        }

        Ok(paginator::assemble(raw, window))
    }
}

#[derive(Serialize)]
struct CacheKeyParts<'a> {
    filters: &'a FilterState,
    sort: &'static str,
    page: u32,
}

/// Canonical cache key: the filters with the resolved sort and page.
///
/// Requests that differ only in how sort or page were spelled (absent vs
/// `newest`, `abc` vs `1`) share a key.
pub fn cache_key(state: &FilterState, sort: SortKey, page: u32) -> String {
    let filters = state.filters_only();
    let parts = CacheKeyParts {
        filters: &filters,
        sort: sort.as_str(),
        page,
    };
    serde_json::to_string(&parts).unwrap_or_else(|_| format!("{filters:?}|{}|{page}", sort.as_str()))
}
