//! Listing admin routes.
//!
//! Mounted behind the admin bearer token; see [`crate::middleware::admin_token`].

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{post, put},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{CreateListing, Listing, ListingStatus, UpdateListing};
use crate::state::AppState;

/// Create the listing admin router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/listings", post(create_listing))
        .route("/api/listings/{id}", put(update_listing))
        .route("/api/listings/{id}/status", post(change_status))
}

/// Status transition body.
#[derive(Debug, Deserialize)]
pub struct StatusChange {
    pub status: ListingStatus,
}

async fn create_listing(
    State(state): State<AppState>,
    Json(input): Json<CreateListing>,
) -> AppResult<(StatusCode, Json<Listing>)> {
    let listing = state.listings().create(input).await?;
    Ok((StatusCode::CREATED, Json(listing)))
}

async fn update_listing(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateListing>,
) -> AppResult<Json<Listing>> {
    Ok(Json(state.listings().update(id, input).await?))
}

async fn change_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(change): Json<StatusChange>,
) -> AppResult<Json<Listing>> {
    Ok(Json(state.listings().set_status(id, change.status).await?))
}
