//! Configuration loaded from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::search::SearchSettings;
use crate::search::paginator::{DEFAULT_FACET_LIMIT, DEFAULT_PAGE_SIZE};

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port (default: 3000).
    pub port: u16,

    /// PostgreSQL connection URL.
    pub database_url: String,

    /// Maximum database connections in pool (default: 10).
    pub database_max_connections: u32,

    /// Per-statement timeout applied to every pooled connection (default: 10s).
    pub database_statement_timeout: Duration,

    /// Listings per search page (default: 24).
    pub search_page_size: u32,

    /// Maximum facet brands per search (default: 50).
    pub search_facet_limit: u32,

    /// Search cache TTL (default: 300s).
    pub search_cache_ttl: Duration,

    /// Maximum cached search results (default: 10000).
    pub search_cache_max_capacity: u64,

    /// CORS allowed origins (comma-separated, default: "*").
    pub cors_allowed_origins: Vec<String>,

    /// Bearer token for the listing admin API. When None, the admin routes
    /// are not mounted.
    pub admin_api_token: Option<String>,

    /// Apply pending migrations at startup (default: true).
    pub run_migrations: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let database_url =
            env::var("DATABASE_URL").context("DATABASE_URL environment variable is required")?;

        let search_page_size: u32 = parse_var("SEARCH_PAGE_SIZE", DEFAULT_PAGE_SIZE)?;
        if search_page_size == 0 {
            anyhow::bail!("SEARCH_PAGE_SIZE must be at least 1");
        }

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let admin_api_token = env::var("ADMIN_API_TOKEN")
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        let run_migrations = env::var("RUN_MIGRATIONS")
            .map(|v| !matches!(v.trim().to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off"))
            .unwrap_or(true);

        Ok(Self {
            port: parse_var("PORT", 3000)?,
            database_url,
            database_max_connections: parse_var("DATABASE_MAX_CONNECTIONS", 10)?,
            database_statement_timeout: Duration::from_secs(parse_var(
                "DATABASE_STATEMENT_TIMEOUT_SECS",
                10,
            )?),
            search_page_size,
            search_facet_limit: parse_var("SEARCH_FACET_LIMIT", DEFAULT_FACET_LIMIT)?,
            search_cache_ttl: Duration::from_secs(parse_var("SEARCH_CACHE_TTL_SECS", 300)?),
            search_cache_max_capacity: parse_var("SEARCH_CACHE_MAX_CAPACITY", 10_000)?,
            cors_allowed_origins,
            admin_api_token,
            run_migrations,
        })
    }

    pub fn search_settings(&self) -> SearchSettings {
        SearchSettings {
            page_size: self.search_page_size,
            facet_limit: self.search_facet_limit,
        }
    }
}

/// Parse an optional variable, falling back to `default` when unset.
fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{name} must be a valid {}", std::any::type_name::<T>())),
        Err(_) => Ok(default),
    }
}
