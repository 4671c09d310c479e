use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use newsdesk_core::error::AppError;
use newsdesk_core::models::{Category, NewCategory, NewTag, Tag};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::state::AppState;

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/api/categories", get(list_categories).post(create_category))
        .route(
            "/api/categories/{id}",
            get(get_category).put(update_category).delete(delete_category),
        )
        .route("/api/tags", get(list_tags).post(create_tag))
        .route(
            "/api/tags/{id}",
            get(get_tag).put(update_tag).delete(delete_tag),
        )
}

async fn list_categories(State(state): State<AppState>) -> ApiResult<Json<Vec<Category>>> {
    Ok(Json(state.db.categories.list().await?))
}

async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Category>> {
    let category = state
        .db
        .categories
        .get(id)
        .await?
        .ok_or_else(|| AppError::not_found("Category", id))?;
    Ok(Json(category))
}

async fn create_category(
    State(state): State<AppState>,
    Json(payload): Json<NewCategory>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    payload.validate()?;
    let category = state.db.categories.create(&payload).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<NewCategory>,
) -> ApiResult<Json<Category>> {
    payload.validate()?;
    let category = state
        .db
        .categories
        .update(id, &payload)
        .await?
        .ok_or_else(|| AppError::not_found("Category", id))?;
    Ok(Json(category))
}

async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if !state.db.categories.delete(id).await? {
        return Err(AppError::not_found("Category", id).into());
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn list_tags(State(state): State<AppState>) -> ApiResult<Json<Vec<Tag>>> {
    Ok(Json(state.db.tags.list().await?))
}

async fn get_tag(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Tag>> {
    let tag = state
        .db
        .tags
        .get(id)
        .await?
        .ok_or_else(|| AppError::not_found("Tag", id))?;
    Ok(Json(tag))
}

async fn create_tag(
    State(state): State<AppState>,
    Json(payload): Json<NewTag>,
) -> ApiResult<(StatusCode, Json<Tag>)> {
    payload.validate()?;
    let tag = state.db.tags.create(&payload).await?;
    Ok((StatusCode::CREATED, Json(tag)))
}

async fn update_tag(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<NewTag>,
) -> ApiResult<Json<Tag>> {
    payload.validate()?;
    let tag = state
        .db
        .tags
        .update(id, &payload)
        .await?
        .ok_or_else(|| AppError::not_found("Tag", id))?;
    Ok(Json(tag))
}

async fn delete_tag(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<StatusCode> {
    if !state.db.tags.delete(id).await? {
        return Err(AppError::not_found("Tag", id).into());
    }
    Ok(StatusCode::NO_CONTENT)
}
