//! Article admin CRUD and status changes.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use newsdesk_core::error::AppError;
use newsdesk_core::models::{Article, ArticleFilter, NewArticle, StatusUpdate};
use newsdesk_core::publishing::PublishState;
use newsdesk_core::validation::resolve_slug;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::state::AppState;

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/api/articles", get(list_articles).post(create_article))
        .route(
            "/api/articles/{id}",
            get(get_article).put(update_article).delete(delete_article),
        )
        .route("/api/articles/{id}/status", post(change_status))
}

fn current_state(article: &Article) -> PublishState {
    PublishState {
        status: article.status,
        published_at: article.published_at,
        scheduled_at: article.scheduled_at,
    }
}

async fn list_articles(
    State(state): State<AppState>,
    Query(filter): Query<ArticleFilter>,
) -> ApiResult<Json<Vec<Article>>> {
    Ok(Json(state.db.articles.list(&filter).await?))
}

async fn get_article(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Article>> {
    let article = state
        .db
        .articles
        .get(id)
        .await?
        .ok_or_else(|| AppError::not_found("Article", id))?;
    Ok(Json(article))
}

async fn create_article(
    State(state): State<AppState>,
    Json(payload): Json<NewArticle>,
) -> ApiResult<(StatusCode, Json<Article>)> {
    payload.validate()?;
    let publish =
        PublishState::draft().transition(payload.status, payload.scheduled_at, Utc::now())?;
    let slug = resolve_slug(payload.slug.as_deref(), &payload.title);

    let article = state.db.articles.create(&payload, &slug, publish).await?;
    tracing::info!(
        article_id = %article.id,
        slug = %article.slug,
        status = %article.status,
        "Article created"
    );
    Ok((StatusCode::CREATED, Json(article)))
}

async fn update_article(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<NewArticle>,
) -> ApiResult<Json<Article>> {
    payload.validate()?;
    let existing = state
        .db
        .articles
        .get(id)
        .await?
        .ok_or_else(|| AppError::not_found("Article", id))?;

    let publish =
        current_state(&existing).transition(payload.status, payload.scheduled_at, Utc::now())?;
    let slug = resolve_slug(payload.slug.as_deref(), &payload.title);

    let article = state
        .db
        .articles
        .update(id, &payload, &slug, publish)
        .await?
        .ok_or_else(|| AppError::not_found("Article", id))?;
    tracing::info!(article_id = %id, status = %article.status, "Article updated");
    Ok(Json(article))
}

async fn change_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(update): Json<StatusUpdate>,
) -> ApiResult<Json<Article>> {
    let existing = state
        .db
        .articles
        .get(id)
        .await?
        .ok_or_else(|| AppError::not_found("Article", id))?;

    let publish =
        current_state(&existing).transition(update.status, update.scheduled_at, Utc::now())?;
    let article = state
        .db
        .articles
        .set_state(id, publish)
        .await?
        .ok_or_else(|| AppError::not_found("Article", id))?;

    tracing::info!(
        article_id = %id,
        from = %existing.status,
        to = %article.status,
        "Article status changed"
    );
    Ok(Json(article))
}

async fn delete_article(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if !state.db.articles.delete(id).await? {
        return Err(AppError::not_found("Article", id).into());
    }
    tracing::info!(article_id = %id, "Article deleted");
    Ok(StatusCode::NO_CONTENT)
}
