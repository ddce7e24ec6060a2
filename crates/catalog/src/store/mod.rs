//! Listing storage.
//!
//! The search engine reads through [`ListingStore`]; the mutation layer
//! writes through [`ListingWriter`]. Two adapters exist: Postgres for
//! production and an in-memory store for tests.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{CreateListing, Listing, ListingStatus, UpdateListing};
use crate::search::paginator::PageWindow;
use crate::search::predicate::Predicate;
use crate::search::sort::OrderDirective;

pub use memory::MemoryStore;
pub use postgres::PgListingStore;

/// Postgres SQLSTATE for "undefined column".
const UNDEFINED_COLUMN: &str = "42703";

/// Storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A referenced field does not exist in the current schema.
    #[error("unknown field: {field}")]
    UnknownField { field: String },

    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Whether this is the schema-mismatch class the executor may recover from.
    pub fn is_unknown_field(&self) -> bool {
        matches!(self, StoreError::UnknownField { .. })
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db) = err
            && db.code().as_deref() == Some(UNDEFINED_COLUMN)
        {
            let field = undefined_column_name(db.message())
                .unwrap_or_else(|| db.message().to_string());
            return StoreError::UnknownField { field };
        }
        StoreError::Database(err)
    }
}

/// Pull the column name out of `column "x" does not exist` /
/// `column seller.x does not exist`.
fn undefined_column_name(message: &str) -> Option<String> {
    let name = message
        .strip_prefix("column ")?
        .strip_suffix(" does not exist")?
        .trim_matches('"');
    Some(name.to_string())
}

/// Read side used by the search engine.
#[async_trait]
pub trait ListingStore: Send + Sync {
    /// One page of listings matching `predicate`, ordered by `sort`.
    async fn find_page(
        &self,
        predicate: &Predicate,
        sort: &[OrderDirective],
        window: PageWindow,
    ) -> Result<Vec<Listing>, StoreError>;

    /// Number of listings matching `predicate`.
    async fn count(&self, predicate: &Predicate) -> Result<u64, StoreError>;

    /// Up to `limit` distinct brands among listings matching `predicate`,
    /// ascending.
    async fn facet_brands(&self, predicate: &Predicate, limit: u32)
    -> Result<Vec<String>, StoreError>;
}

/// Write side used by the mutation layer.
#[async_trait]
pub trait ListingWriter: Send + Sync {
    async fn insert(&self, input: CreateListing) -> Result<Listing, StoreError>;

    /// `Ok(None)` when no listing has this id.
    async fn update(&self, id: Uuid, input: UpdateListing) -> Result<Option<Listing>, StoreError>;

    /// `Ok(None)` when no listing has this id.
    async fn set_status(
        &self,
        id: Uuid,
        status: ListingStatus,
    ) -> Result<Option<Listing>, StoreError>;
}
