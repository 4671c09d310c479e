use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use newsdesk_core::error::AppError;
use newsdesk_core::models::{Author, NewAuthor};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::state::AppState;

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/api/authors", get(list_authors).post(create_author))
        .route(
            "/api/authors/{id}",
            get(get_author).put(update_author).delete(delete_author),
        )
}

async fn list_authors(State(state): State<AppState>) -> ApiResult<Json<Vec<Author>>> {
    Ok(Json(state.db.authors.list().await?))
}

async fn get_author(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Author>> {
    let author = state
        .db
        .authors
        .get(id)
        .await?
        .ok_or_else(|| AppError::not_found("Author", id))?;
    Ok(Json(author))
}

async fn create_author(
    State(state): State<AppState>,
    Json(payload): Json<NewAuthor>,
) -> ApiResult<(StatusCode, Json<Author>)> {
    payload.validate()?;
    let author = state.db.authors.create(&payload).await?;
    tracing::info!(author_id = %author.id, "Author created");
    Ok((StatusCode::CREATED, Json(author)))
}

async fn update_author(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<NewAuthor>,
) -> ApiResult<Json<Author>> {
    payload.validate()?;
    let author = state
        .db
        .authors
        .update(id, &payload)
        .await?
        .ok_or_else(|| AppError::not_found("Author", id))?;
    Ok(Json(author))
}

/// Articles by the author keep existing with no author (`ON DELETE SET NULL`).
async fn delete_author(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if !state.db.authors.delete(id).await? {
        return Err(AppError::not_found("Author", id).into());
    }
    Ok(StatusCode::NO_CONTENT)
}
