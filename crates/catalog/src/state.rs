//! Application state shared across all handlers.

use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::PgPool;
use tracing::info;

use crate::cache::SearchCache;
use crate::config::Config;
use crate::db;
use crate::listings::ListingService;
use crate::search::{CatalogSearch, SearchSettings};
use crate::store::{ListingStore, ListingWriter, PgListingStore};

/// Shared application state.
///
/// Wrapped in Arc internally so Clone is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// PostgreSQL connection pool. None when running on a non-SQL store.
    db: Option<PgPool>,

    /// Search pipeline behind the result cache.
    search: CatalogSearch,

    /// Listing mutations; invalidates the search cache.
    listings: ListingService,

    /// Shared with `search` and `listings`.
    cache: SearchCache,

    /// Bearer token guarding the admin routes.
    admin_token: Option<String>,
}

impl AppState {
    /// Connect to PostgreSQL and build the catalog services.
    pub async fn new(config: &Config) -> Result<Self> {
        let pool = db::create_pool(config)
            .await
            .context("failed to create database pool")?;

        if config.run_migrations {
            db::run_migrations(&pool)
                .await
                .context("failed to run migrations")?;
            info!("catalog migrations applied");
        }

        let store = Arc::new(PgListingStore::new(pool.clone()));
        let cache = SearchCache::new(config.search_cache_ttl, config.search_cache_max_capacity);

        Ok(Self::assemble(
            Some(pool),
            store,
            cache,
            config.search_settings(),
            config.admin_api_token.clone(),
        ))
    }

    /// Build state over an arbitrary store, without a database pool.
    pub fn with_store<S>(
        store: Arc<S>,
        cache: SearchCache,
        settings: SearchSettings,
        admin_token: Option<String>,
    ) -> Self
    where
        S: ListingStore + ListingWriter + 'static,
    {
        Self::assemble(None, store, cache, settings, admin_token)
    }

    fn assemble<S>(
        db: Option<PgPool>,
        store: Arc<S>,
        cache: SearchCache,
        settings: SearchSettings,
        admin_token: Option<String>,
    ) -> Self
    where
        S: ListingStore + ListingWriter + 'static,
    {
        let reader: Arc<dyn ListingStore> = store.clone();
        let writer: Arc<dyn ListingWriter> = store;

        Self {
            inner: Arc::new(AppStateInner {
                db,
                search: CatalogSearch::new(reader, cache.clone(), settings),
                listings: ListingService::new(writer, cache.clone()),
                cache,
                admin_token,
            }),
        }
    }

    /// Get the database pool, if the state is backed by PostgreSQL.
    pub fn db(&self) -> Option<&PgPool> {
        self.inner.db.as_ref()
    }

    pub fn search(&self) -> &CatalogSearch {
        &self.inner.search
    }

    pub fn listings(&self) -> &ListingService {
        &self.inner.listings
    }

    pub fn cache(&self) -> &SearchCache {
        &self.inner.cache
    }

    /// Get the admin API token, if one is configured.
    pub fn admin_token(&self) -> Option<&str> {
        self.inner.admin_token.as_deref()
    }

    /// Check if PostgreSQL is healthy. None when no pool is configured.
    pub async fn postgres_healthy(&self) -> Option<bool> {
        match &self.inner.db {
            Some(pool) => Some(db::check_health(pool).await),
            None => None,
        }
    }
}
