//! Admin bearer token middleware.
//!
//! Requires `Authorization: Bearer <token>` matching the configured admin
//! token. Anything else is rejected with 401.

use axum::{
    body::Body,
    extract::State,
    http::{Request, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::error::AppError;
use crate::state::AppState;

pub async fn require_admin_token(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let Some(expected) = state.admin_token() else {
        return AppError::Unauthorized.into_response();
    };

    let presented = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    let Some(presented) = presented else {
        debug!("admin request without bearer token");
        return AppError::Unauthorized.into_response();
    };

    if !bool::from(presented.as_bytes().ct_eq(expected.as_bytes())) {
        debug!("admin request with wrong bearer token");
        return AppError::Unauthorized.into_response();
    }

    next.run(request).await
}
