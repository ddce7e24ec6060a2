//! HTTP route handlers.

pub mod health;
pub mod listing;
pub mod search;

use axum::Router;
use axum::http::{HeaderValue, Method, header};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::middleware::require_admin_token;
use crate::state::AppState;

/// Build the full application router.
///
/// Admin listing routes are mounted only when an admin token is configured.
pub fn app(state: AppState, cors_allowed_origins: &[String]) -> Router {
    let mut router = Router::new()
        .merge(health::router())
        .merge(search::router());

    if state.admin_token().is_some() {
        router = router.merge(listing::router().route_layer(
            axum::middleware::from_fn_with_state(state.clone(), require_admin_token),
        ));
    } else {
        info!("ADMIN_API_TOKEN not set, listing admin routes disabled");
    }

    router
        .layer(build_cors_layer(cors_allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Build CORS layer from allowed origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let methods = [Method::GET, Method::POST, Method::PUT, Method::OPTIONS];

    if origins.iter().any(|o| o == "*") {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(methods)
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}
