//! Database models.

pub mod listing;
pub mod seller;

pub use listing::{CreateListing, Listing, ListingStatus, UpdateListing};
pub use seller::Seller;
