//! Shared API error type for HTTP handlers.

use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use pgrest_ast::TranslateError;
use thiserror::Error;

use crate::state::ErrorResponse;

/// Application error type surfaced by handlers.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Translate(#[from] TranslateError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
