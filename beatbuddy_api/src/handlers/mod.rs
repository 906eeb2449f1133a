use axum::Json;
use serde_json::{Value, json};
use tracing::instrument;

pub mod chat;
pub mod songs;

#[instrument]
pub async fn health() -> Json<Value> {
    tracing::info!("health check");

    Json(json!({ "status": "UP" }))
}
