//! Listing mutation service.
//!
//! Every successful create, update or status change invalidates the
//! catalog-search cache tag before returning.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::cache::{CATALOG_SEARCH_TAG, SearchCache};
use crate::models::{CreateListing, Listing, ListingStatus, UpdateListing};
use crate::store::{ListingWriter, StoreError};

/// Listing mutation errors.
#[derive(Debug, Error)]
pub enum ListingError {
    #[error("listing {0} not found")]
    NotFound(Uuid),

    #[error("invalid listing: {0}")]
    Invalid(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Create, update and transition listings.
#[derive(Clone)]
pub struct ListingService {
    writer: Arc<dyn ListingWriter>,
    cache: SearchCache,
}

impl ListingService {
    pub fn new(writer: Arc<dyn ListingWriter>, cache: SearchCache) -> Self {
        Self { writer, cache }
    }

    pub async fn create(&self, input: CreateListing) -> Result<Listing, ListingError> {
        validate_price(input.price_minor_units)?;
        if input.title.trim().is_empty() || input.brand.trim().is_empty() {
            return Err(ListingError::Invalid(
                "title and brand must not be empty".to_string(),
            ));
        }

        let listing = self.writer.insert(input).await?;
        self.invalidate_search().await;

        info!(listing_id = %listing.id, status = %listing.status, "listing created");
        Ok(listing)
    }

    pub async fn update(&self, id: Uuid, input: UpdateListing) -> Result<Listing, ListingError> {
        if let Some(price) = input.price_minor_units {
            validate_price(price)?;
        }

        let listing = self
            .writer
            .update(id, input)
            .await?
            .ok_or(ListingError::NotFound(id))?;
        self.invalidate_search().await;

        info!(listing_id = %id, "listing updated");
        Ok(listing)
    }

    pub async fn set_status(
        &self,
        id: Uuid,
        status: ListingStatus,
    ) -> Result<Listing, ListingError> {
        let listing = self
            .writer
            .set_status(id, status)
            .await?
            .ok_or(ListingError::NotFound(id))?;
        self.invalidate_search().await;

        info!(listing_id = %id, status = %status, "listing status changed");
        Ok(listing)
    }

    async fn invalidate_search(&self) {
        self.cache.invalidate_tag(CATALOG_SEARCH_TAG).await;
    }
}

fn validate_price(price_minor_units: i64) -> Result<(), ListingError> {
    if price_minor_units < 0 {
        warn!(price_minor_units, "rejecting negative listing price");
        return Err(ListingError::Invalid("price must not be negative".to_string()));
    }
    Ok(())
}
