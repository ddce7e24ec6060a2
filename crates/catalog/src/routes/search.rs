//! Catalog search route.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use serde::Serialize;

use crate::error::AppResult;
use crate::search::{FilterChip, FilterState, RawQueryInput, SearchResult, active_filters};
use crate::state::AppState;

/// Create the search router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/listings/search", get(search_listings))
}

/// JSON search response: the result envelope plus the normalized filters.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    #[serde(flatten)]
    pub result: SearchResult,
    pub filters: FilterState,
    pub active_filters: Vec<FilterChip>,
}

/// Search listings.
///
/// Query pairs are passed through untouched, so repeated keys and
/// bracketed aliases (`brand[]=...`) reach the normalizer as sent.
async fn search_listings(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> AppResult<Json<SearchResponse>> {
    let raw = RawQueryInput::from_pairs(pairs);
    let outcome = state.search().search(&raw).await?;

    Ok(Json(SearchResponse {
        active_filters: active_filters(&outcome.state),
        filters: outcome.state,
        result: outcome.result,
    }))
}
