#![allow(clippy::unwrap_used, clippy::expect_used)]
//! HTTP routes over the in-memory store.

mod common;

use axum::http::{StatusCode, header};
use serde_json::json;
use uuid::Uuid;

use common::{ADMIN_TOKEN, app, body_json, get, public_app, seeded_store, send_json};

#[tokio::test]
async fn search_returns_result_filters_and_chips() {
    let (store, _) = seeded_store();
    let app = app(store);

    let response = get(
        &app,
        "/api/listings/search?brand=Rolex,Omega&min=1000&cond=New,Excellent&sort=price-asc",
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["total"], 2);
    assert_eq!(body["page"], 1);
    assert_eq!(body["totalPages"], 1);
    assert_eq!(body["items"][0]["price_minor_units"], 450_000);
    assert_eq!(body["items"][1]["price_minor_units"], 950_000);
    assert_eq!(body["facetBrands"], json!(["Omega", "Rolex", "Tudor"]));
    assert_eq!(body["filters"]["brand"], json!(["Omega", "Rolex"]));
    assert_eq!(body["filters"]["priceMin"], "1000");

    let chips = body["activeFilters"].as_array().unwrap();
    assert_eq!(chips.len(), 5);
    assert!(chips.iter().any(|c| c["param"] == "min" && c["value"] == "1000"));
}

#[tokio::test]
async fn search_accepts_bracketed_repeated_keys() {
    let (store, _) = seeded_store();
    let app = app(store);

    let response = get(&app, "/api/listings/search?brand%5B%5D=Rolex&brand%5B%5D=Tudor").await;
    let body = body_json(response).await;

    assert_eq!(body["total"], 3);
    assert_eq!(body["filters"]["brand"], json!(["Rolex", "Tudor"]));
}

#[tokio::test]
async fn search_without_filters_has_no_chips() {
    let (store, _) = seeded_store();
    let app = app(store);

    let body = body_json(get(&app, "/api/listings/search").await).await;

    assert_eq!(body["total"], 5);
    assert_eq!(body["activeFilters"], json!([]));
}

#[tokio::test]
async fn search_storage_failure_is_a_500() {
    let (store, _) = seeded_store();
    store.fail_next(tickmark_catalog::store::StoreError::Unavailable(
        "connection refused".to_string(),
    ));
    let app = app(store);

    let response = get(&app, "/api/listings/search").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn health_without_database() {
    let (store, _) = seeded_store();
    let app = public_app(store);

    let response = get(&app, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert!(body.get("postgres").is_none());
}

#[tokio::test]
async fn admin_routes_require_the_token() {
    let (store, sellers) = seeded_store();
    let app = app(store);
    let input = json!({
        "title": "Speedmaster",
        "brand": "Omega",
        "price_minor_units": 550000,
        "seller_id": sellers.berlin.id,
    });

    let missing = send_json(&app, "POST", "/api/listings", None, input.clone()).await;
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(missing.headers()[header::WWW_AUTHENTICATE], "Bearer");

    let wrong = send_json(&app, "POST", "/api/listings", Some("guess"), input).await;
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_routes_absent_without_configured_token() {
    let (store, sellers) = seeded_store();
    let app = public_app(store);
    let input = json!({
        "title": "Speedmaster",
        "brand": "Omega",
        "price_minor_units": 550000,
        "seller_id": sellers.berlin.id,
    });

    let response = send_json(&app, "POST", "/api/listings", Some(ADMIN_TOKEN), input).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn created_listing_becomes_searchable_after_approval() {
    let (store, sellers) = seeded_store();
    let app = app(store);

    // Prime the cache.
    let before = body_json(get(&app, "/api/listings/search?brand=Omega").await).await;
    assert_eq!(before["total"], 2);

    let created = send_json(
        &app,
        "POST",
        "/api/listings",
        Some(ADMIN_TOKEN),
        json!({
            "title": "Speedmaster Professional",
            "brand": "Omega",
            "price_minor_units": 550000,
            "seller_id": sellers.berlin.id,
        }),
    )
    .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let created = body_json(created).await;
    assert_eq!(created["status"], "pending");
    let id = created["id"].as_str().unwrap().to_string();

    let pending = body_json(get(&app, "/api/listings/search?brand=Omega").await).await;
    assert_eq!(pending["total"], 2);

    let approved = send_json(
        &app,
        "POST",
        &format!("/api/listings/{id}/status"),
        Some(ADMIN_TOKEN),
        json!({ "status": "approved" }),
    )
    .await;
    assert_eq!(approved.status(), StatusCode::OK);

    let after = body_json(get(&app, "/api/listings/search?brand=Omega").await).await;
    assert_eq!(after["total"], 3);
}

#[tokio::test]
async fn update_validates_and_reports_missing_listings() {
    let (store, _) = seeded_store();
    let app = app(store);

    let missing = send_json(
        &app,
        "PUT",
        &format!("/api/listings/{}", Uuid::now_v7()),
        Some(ADMIN_TOKEN),
        json!({ "title": "Renamed" }),
    )
    .await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let listed = body_json(get(&app, "/api/listings/search?brand=Tudor").await).await;
    let id = listed["items"][0]["id"].as_str().unwrap().to_string();

    let negative = send_json(
        &app,
        "PUT",
        &format!("/api/listings/{id}"),
        Some(ADMIN_TOKEN),
        json!({ "price_minor_units": -5 }),
    )
    .await;
    assert_eq!(negative.status(), StatusCode::BAD_REQUEST);

    let renamed = send_json(
        &app,
        "PUT",
        &format!("/api/listings/{id}"),
        Some(ADMIN_TOKEN),
        json!({ "title": "Black Bay Fifty-Eight" }),
    )
    .await;
    assert_eq!(renamed.status(), StatusCode::OK);
    assert_eq!(body_json(renamed).await["title"], "Black Bay Fifty-Eight");
}
