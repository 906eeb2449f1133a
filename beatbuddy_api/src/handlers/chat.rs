use axum::{Json, extract::State};
use tracing::instrument;
use types::{GenerateRequest, GenerateResponse};

use crate::error::ApiError;
use crate::state::AppContext;

/// Relays the user's message and history to the completion proxy.
#[instrument(skip(state, request))]
pub async fn generate(
    State(state): State<AppContext>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let generated = state
        .completion
        .generate(&request.input, request.conversation_history)
        .await
        .map_err(|e| {
            tracing::error!("Error in /generate route: {e}");
            ApiError::Generate(e)
        })?;

    Ok(Json(GenerateResponse {
        output: generated.reply,
        conversation_history: generated.history,
    }))
}
