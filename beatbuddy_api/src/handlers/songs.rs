use axum::{Json, extract::State};
use tracing::instrument;
use types::{
    AddSongRequest, AddSongResponse, StatusResponse, TopSongsResponse,
    UpdateGenreRequest, UpdateSongRequest,
};

use crate::error::ApiError;
use crate::state::AppContext;

#[instrument(skip(state))]
pub async fn top_songs(
    State(state): State<AppContext>,
) -> Result<Json<TopSongsResponse>, ApiError> {
    let songs = state.store.top_songs().await.map_err(|e| {
        tracing::error!("Error fetching top songs: {e}");
        ApiError::TopSongs(e)
    })?;

    Ok(Json(TopSongsResponse { songs }))
}

#[instrument(skip(state))]
pub async fn add_song(
    State(state): State<AppContext>,
    Json(request): Json<AddSongRequest>,
) -> Result<Json<AddSongResponse>, ApiError> {
    let data = state
        .store
        .add_preference(&request.user_id, &request.song, &request.genre)
        .await
        .map_err(|e| {
            tracing::error!("Error adding song preference: {e}");
            ApiError::AddSong(e)
        })?;

    Ok(Json(AddSongResponse {
        status: "success".to_string(),
        data,
    }))
}

#[instrument(skip(state))]
pub async fn update_genre(
    State(state): State<AppContext>,
    Json(request): Json<UpdateGenreRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    state.store.update_genre(&request.genre).await.map_err(|e| {
        tracing::error!("Error updating genre: {e}");
        ApiError::UpdateGenre(e)
    })?;

    Ok(Json(StatusResponse::success()))
}

#[instrument(skip(state))]
pub async fn update_song(
    State(state): State<AppContext>,
    Json(request): Json<UpdateSongRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    state
        .store
        .update_song(&request.song_title, &request.artist, request.genre_id)
        .await
        .map_err(|e| {
            tracing::error!("Error updating song: {e}");
            ApiError::UpdateSong(e)
        })?;

    Ok(Json(StatusResponse::success()))
}
