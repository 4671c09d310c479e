use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use newsdesk_core::error::AppError;
use newsdesk_core::models::{MediaItem, NewMediaItem};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::state::AppState;

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/api/media", get(list_media).post(create_media))
        .route(
            "/api/media/{id}",
            get(get_media).put(update_media).delete(delete_media),
        )
}

/// `?kind=image` filters by MIME type prefix.
#[derive(Debug, Default, Deserialize)]
struct MediaQuery {
    #[serde(default)]
    kind: Option<String>,
}

async fn list_media(
    State(state): State<AppState>,
    Query(query): Query<MediaQuery>,
) -> ApiResult<Json<Vec<MediaItem>>> {
    Ok(Json(state.db.media.list(query.kind.as_deref()).await?))
}

async fn get_media(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MediaItem>> {
    let item = state
        .db
        .media
        .get(id)
        .await?
        .ok_or_else(|| AppError::not_found("Media item", id))?;
    Ok(Json(item))
}

async fn create_media(
    State(state): State<AppState>,
    Json(payload): Json<NewMediaItem>,
) -> ApiResult<(StatusCode, Json<MediaItem>)> {
    payload.validate()?;
    let item = state.db.media.create(&payload).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

async fn update_media(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<NewMediaItem>,
) -> ApiResult<Json<MediaItem>> {
    payload.validate()?;
    let item = state
        .db
        .media
        .update(id, &payload)
        .await?
        .ok_or_else(|| AppError::not_found("Media item", id))?;
    Ok(Json(item))
}

async fn delete_media(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if !state.db.media.delete(id).await? {
        return Err(AppError::not_found("Media item", id).into());
    }
    Ok(StatusCode::NO_CONTENT)
}
