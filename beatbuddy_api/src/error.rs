use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use types::ErrorResponse;

use crate::completion::ProxyError;
use crate::store::PersistenceError;

/// Request-scoped failures. The response body only ever carries the generic
/// message; the cause is logged where the error is created.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Failed to generate response from OpenAI.")]
    Generate(#[source] ProxyError),

    #[error("Failed to fetch top songs")]
    TopSongs(#[source] PersistenceError),

    #[error("Failed to add song preference")]
    AddSong(#[source] PersistenceError),

    #[error("Failed to update genre")]
    UpdateGenre(#[source] PersistenceError),

    #[error("Failed to update song")]
    UpdateSong(#[source] PersistenceError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
