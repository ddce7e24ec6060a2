//! Application error types.

use axum::http::StatusCode;
use axum::http::header::WWW_AUTHENTICATE;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::listings::ListingError;
use crate::search::SearchError;
use crate::store::StoreError;

/// Application errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("not found")]
    NotFound,

    #[error("unauthorized")]
    Unauthorized,

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("storage error")]
    Store(#[from] StoreError),

    #[error("search failed")]
    Search(#[from] SearchError),
}

impl From<ListingError> for AppError {
    fn from(err: ListingError) -> Self {
        match err {
            ListingError::NotFound(_) => AppError::NotFound,
            ListingError::Invalid(reason) => AppError::BadRequest(reason),
            ListingError::Store(e) => AppError::Store(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Internal(_) | AppError::Store(_) | AppError::Search(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
        };

        let body = match &self {
            AppError::Internal(e) => {
                tracing::error!(error = %e, "internal server error");
                "internal server error".to_string()
            }
            AppError::Store(e) => {
                tracing::error!(error = %e, "storage error");
                "internal server error".to_string()
            }
            AppError::Search(e) => {
                tracing::error!(error = %e.store_error(), "search failed");
                "internal server error".to_string()
            }
            AppError::Unauthorized => {
                return (
                    status,
                    [(WWW_AUTHENTICATE, "Bearer")],
                    self.to_string(),
                )
                    .into_response();
            }
            _ => self.to_string(),
        };

        (status, body).into_response()
    }
}

/// Result type alias using AppError.
pub type AppResult<T> = Result<T, AppError>;
