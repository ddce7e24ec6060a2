#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Shared fixtures for catalog integration tests.
//!
//! Everything runs against [`MemoryStore`], which evaluates predicates with
//! the same semantics as the Postgres adapter, so no database is needed.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, header};
use axum::response::Response;
use http_body_util::BodyExt;
use tower::ServiceExt;
use uuid::Uuid;

use tickmark_catalog::cache::SearchCache;
use tickmark_catalog::models::{Listing, ListingStatus, Seller};
use tickmark_catalog::routes;
use tickmark_catalog::search::SearchSettings;
use tickmark_catalog::state::AppState;
use tickmark_catalog::store::MemoryStore;

pub const ADMIN_TOKEN: &str = "test-admin-token";

/// Sellers seeded by [`seeded_store`].
pub struct Sellers {
    /// Verified, identity-approved, Geneva.
    pub geneva: Seller,
    /// Unverified, Berlin.
    pub berlin: Seller,
    /// Unverified, identity check pending, no location.
    pub online: Seller,
}

/// Approved listing with only the required fields set.
pub fn watch(seller: &Seller, brand: &str, price_minor_units: i64, created: i64) -> Listing {
    Listing {
        id: Uuid::now_v7(),
        title: format!("{brand} wristwatch"),
        brand: brand.to_string(),
        model: None,
        reference: None,
        movement: None,
        price_minor_units,
        year: None,
        condition: None,
        location: None,
        gender: None,
        box_papers: None,
        status: ListingStatus::Approved.as_str().to_string(),
        created,
        changed: created,
        seller_id: seller.id,
        seller_city: None,
        seller_country: None,
    }
}

/// Store with three sellers and a small mixed catalog.
///
/// | brand          | price   | condition | year | seller | status   |
/// |----------------|---------|-----------|------|--------|----------|
/// | Rolex          | 950000  | Excellent | 2019 | geneva | approved |
/// | Rolex          | 80000   | New       | 2023 | berlin | approved |
/// | Omega          | 450000  | New       | 2021 | berlin | approved |
/// | Omega          | 120000  | Good      | 1998 | online | approved |
/// | Tudor          | 320000  | Excellent |      | geneva | approved |
/// | Omega          | 500000  | New       | 2022 | geneva | pending  |
/// | Patek Philippe | 4500000 | Excellent | 2015 | geneva | sold     |
pub fn seeded_store() -> (Arc<MemoryStore>, Sellers) {
    let store = Arc::new(MemoryStore::new());
    let sellers = Sellers {
        geneva: Seller::new("Geneva Watch Co")
            .located("Geneva", "Switzerland")
            .verified()
            .identity("approved"),
        berlin: Seller::new("Berlin Vintage").located("Berlin", "Germany"),
        online: Seller::new("Online Only").identity("pending"),
    };
    store.add_seller(sellers.geneva.clone());
    store.add_seller(sellers.berlin.clone());
    store.add_seller(sellers.online.clone());

    let rows = [
        (&sellers.geneva, "Rolex", 950_000, Some("Excellent"), Some(2019), ListingStatus::Approved, Some("Box and papers")),
        (&sellers.berlin, "Rolex", 80_000, Some("New"), Some(2023), ListingStatus::Approved, Some("Papers only")),
        (&sellers.berlin, "Omega", 450_000, Some("New"), Some(2021), ListingStatus::Approved, None),
        (&sellers.online, "Omega", 120_000, Some("Good"), Some(1998), ListingStatus::Approved, Some("")),
        (&sellers.geneva, "Tudor", 320_000, Some("Excellent"), None, ListingStatus::Approved, Some("Box only")),
        (&sellers.geneva, "Omega", 500_000, Some("New"), Some(2022), ListingStatus::Pending, None),
        (&sellers.geneva, "Patek Philippe", 4_500_000, Some("Excellent"), Some(2015), ListingStatus::Sold, None),
    ];

    for (created, (seller, brand, price, condition, year, status, box_papers)) in
        rows.into_iter().enumerate()
    {
        let mut listing = watch(seller, brand, price, 1_700_000_000 + created as i64);
        listing.condition = condition.map(str::to_string);
        listing.year = year;
        listing.status = status.as_str().to_string();
        listing.box_papers = box_papers.map(str::to_string);
        store.add_listing(listing);
    }

    (store, sellers)
}

pub fn settings() -> SearchSettings {
    SearchSettings::default()
}

/// Router over `store` with the admin routes enabled.
pub fn app(store: Arc<MemoryStore>) -> Router {
    let state = AppState::with_store(
        store,
        SearchCache::default(),
        settings(),
        Some(ADMIN_TOKEN.to_string()),
    );
    routes::app(state, &["*".to_string()])
}

/// Router over `store` without an admin token.
pub fn public_app(store: Arc<MemoryStore>) -> Router {
    let state = AppState::with_store(store, SearchCache::default(), settings(), None);
    routes::app(state, &["*".to_string()])
}

pub async fn get(app: &Router, uri: &str) -> Response {
    app.clone()
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn send_json(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: serde_json::Value,
) -> Response {
    let mut request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    app.clone()
        .oneshot(request.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
