//! Static pages, navigation menus and site settings.

use std::collections::BTreeMap;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use newsdesk_core::error::AppError;
use newsdesk_core::models::{NavigationLink, NewNavigationLink, NewPage, Page};
use serde_json::Value;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::state::AppState;

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/api/pages", get(list_pages).post(create_page))
        .route(
            "/api/pages/{id}",
            get(get_page).put(update_page).delete(delete_page),
        )
        .route("/api/navigation", get(list_links).post(create_link))
        .route(
            "/api/navigation/{id}",
            get(get_link).put(update_link).delete(delete_link),
        )
        .route("/api/settings", get(get_settings).put(put_settings))
}

async fn list_pages(State(state): State<AppState>) -> ApiResult<Json<Vec<Page>>> {
    Ok(Json(state.db.pages.list().await?))
}

async fn get_page(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Page>> {
    let page = state
        .db
        .pages
        .get(id)
        .await?
        .ok_or_else(|| AppError::not_found("Page", id))?;
    Ok(Json(page))
}

async fn create_page(
    State(state): State<AppState>,
    Json(payload): Json<NewPage>,
) -> ApiResult<(StatusCode, Json<Page>)> {
    payload.validate()?;
    let page = state.db.pages.create(&payload).await?;
    Ok((StatusCode::CREATED, Json(page)))
}

async fn update_page(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<NewPage>,
) -> ApiResult<Json<Page>> {
    payload.validate()?;
    let page = state
        .db
        .pages
        .update(id, &payload)
        .await?
        .ok_or_else(|| AppError::not_found("Page", id))?;
    Ok(Json(page))
}

async fn delete_page(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<StatusCode> {
    if !state.db.pages.delete(id).await? {
        return Err(AppError::not_found("Page", id).into());
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn list_links(State(state): State<AppState>) -> ApiResult<Json<Vec<NavigationLink>>> {
    Ok(Json(state.db.navigation.list(None).await?))
}

async fn get_link(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<NavigationLink>> {
    let link = state
        .db
        .navigation
        .get(id)
        .await?
        .ok_or_else(|| AppError::not_found("Navigation link", id))?;
    Ok(Json(link))
}

async fn create_link(
    State(state): State<AppState>,
    Json(payload): Json<NewNavigationLink>,
) -> ApiResult<(StatusCode, Json<NavigationLink>)> {
    payload.validate()?;
    let link = state.db.navigation.create(&payload).await?;
    Ok((StatusCode::CREATED, Json(link)))
}

async fn update_link(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<NewNavigationLink>,
) -> ApiResult<Json<NavigationLink>> {
    payload.validate()?;
    let link = state
        .db
        .navigation
        .update(id, &payload)
        .await?
        .ok_or_else(|| AppError::not_found("Navigation link", id))?;
    Ok(Json(link))
}

async fn delete_link(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<StatusCode> {
    if !state.db.navigation.delete(id).await? {
        return Err(AppError::not_found("Navigation link", id).into());
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn get_settings(State(state): State<AppState>) -> ApiResult<Json<BTreeMap<String, Value>>> {
    Ok(Json(state.db.settings.as_map().await?))
}

/// Merges the submitted keys into the stored settings and returns the full map.
async fn put_settings(
    State(state): State<AppState>,
    Json(values): Json<BTreeMap<String, Value>>,
) -> ApiResult<Json<BTreeMap<String, Value>>> {
    if let Some(key) = values.keys().find(|k| k.trim().is_empty()) {
        return Err(AppError::BadRequest(format!("invalid setting key '{}'", key)).into());
    }
    state.db.settings.upsert_many(&values).await?;
    tracing::info!(keys = values.len(), "Settings updated");
    Ok(Json(state.db.settings.as_map().await?))
}
