//! Listing model.
//!
//! Listings are the catalog records the marketplace sells. Seller
//! verification columns are deliberately absent from the row shape: item
//! reads must keep working on databases where the seller-verification
//! migration has not run yet.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Listing record as returned by catalog searches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Listing {
    /// Unique identifier (UUIDv7).
    pub id: Uuid,

    /// Listing headline.
    pub title: String,

    /// Brand as typed by the seller.
    pub brand: String,

    pub model: Option<String>,

    /// Manufacturer reference number.
    pub reference: Option<String>,

    /// Movement type (automatic, manual, quartz, ...).
    pub movement: Option<String>,

    /// Asking price in currency minor units.
    pub price_minor_units: i64,

    /// Production year, when known.
    pub year: Option<i32>,

    /// Condition grade label.
    pub condition: Option<String>,

    /// Free-text location given on the listing.
    pub location: Option<String>,

    /// Target audience label.
    pub gender: Option<String>,

    /// Box/papers completeness text ("Box and papers", "Papers only", ...).
    pub box_papers: Option<String>,

    /// Workflow status (see [`ListingStatus`]).
    pub status: String,

    /// Unix timestamp when created.
    pub created: i64,

    /// Unix timestamp when last changed.
    pub changed: i64,

    pub seller_id: Uuid,

    pub seller_city: Option<String>,

    pub seller_country: Option<String>,
}

/// Listing workflow status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    Draft,
    Pending,
    /// Approved for listing; the only publicly visible status.
    Approved,
    Rejected,
    Sold,
}

impl ListingStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            ListingStatus::Draft => "draft",
            ListingStatus::Pending => "pending",
            ListingStatus::Approved => "approved",
            ListingStatus::Rejected => "rejected",
            ListingStatus::Sold => "sold",
        }
    }
}

impl fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListingStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "draft" => Ok(ListingStatus::Draft),
            "pending" => Ok(ListingStatus::Pending),
            "approved" => Ok(ListingStatus::Approved),
            "rejected" => Ok(ListingStatus::Rejected),
            "sold" => Ok(ListingStatus::Sold),
            other => Err(format!("unknown listing status: {other}")),
        }
    }
}

/// Input for creating a new listing.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateListing {
    pub title: String,
    pub brand: String,
    pub model: Option<String>,
    pub reference: Option<String>,
    pub movement: Option<String>,
    pub price_minor_units: i64,
    pub year: Option<i32>,
    pub condition: Option<String>,
    pub location: Option<String>,
    pub gender: Option<String>,
    pub box_papers: Option<String>,
    pub seller_id: Uuid,
    /// Initial status (default: pending).
    pub status: Option<ListingStatus>,
}

/// Input for updating an existing listing. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateListing {
    pub title: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub reference: Option<String>,
    pub movement: Option<String>,
    pub price_minor_units: Option<i64>,
    pub year: Option<i32>,
    pub condition: Option<String>,
    pub location: Option<String>,
    pub gender: Option<String>,
    pub box_papers: Option<String>,
}

impl UpdateListing {
    /// Apply the changes to a listing in place.
    pub fn apply_to(&self, listing: &mut Listing) {
        if let Some(ref title) = self.title {
            listing.title = title.clone();
        }
        if let Some(ref brand) = self.brand {
            listing.brand = brand.clone();
        }
        if let Some(price) = self.price_minor_units {
            listing.price_minor_units = price;
        }
        if self.year.is_some() {
            listing.year = self.year;
        }
        let optional_text = [
            (&self.model, &mut listing.model),
            (&self.reference, &mut listing.reference),
            (&self.movement, &mut listing.movement),
            (&self.condition, &mut listing.condition),
            (&self.location, &mut listing.location),
            (&self.gender, &mut listing.gender),
            (&self.box_papers, &mut listing.box_papers),
        ];
        for (change, target) in optional_text {
            if change.is_some() {
                target.clone_from(change);
            }
        }
    }
}
