//! Seller model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Seller account as seen by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seller {
    pub id: Uuid,

    pub display_name: String,

    pub city: Option<String>,

    pub country: Option<String>,

    /// Marketplace verification badge.
    pub is_verified: bool,

    /// Identity-check outcome ("pending", "approved", "rejected").
    pub identity_status: Option<String>,

    /// Unix timestamp when created.
    pub created: i64,
}

impl Seller {
    /// Unverified seller with no identity check on file.
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            display_name: display_name.into(),
            city: None,
            country: None,
            is_verified: false,
            identity_status: None,
            created: chrono::Utc::now().timestamp(),
        }
    }

    pub fn located(mut self, city: &str, country: &str) -> Self {
        self.city = Some(city.to_string());
        self.country = Some(country.to_string());
        self
    }

    pub fn verified(mut self) -> Self {
        self.is_verified = true;
        self
    }

    pub fn identity(mut self, status: &str) -> Self {
        self.identity_status = Some(status.to_string());
        self
    }
}
