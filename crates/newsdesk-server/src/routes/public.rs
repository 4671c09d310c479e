//! Read-only endpoints used by the public site. Only live content is served.

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use newsdesk_core::error::AppError;
use newsdesk_core::models::{Article, NavLocation, NavigationLink, Page};
use serde::Deserialize;

use crate::error::ApiResult;
use crate::state::AppState;

/// Longest accepted search term.
const MAX_QUERY_LEN: usize = 200;

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/api/public/articles", get(list_articles))
        .route("/api/public/articles/{slug}", get(view_article))
        .route(
            "/api/public/categories/{slug}/articles",
            get(list_category_articles),
        )
        .route("/api/public/search", get(search))
        .route("/api/public/pages/{slug}", get(view_page))
        .route("/api/public/navigation", get(navigation))
}

#[derive(Debug, Default, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub limit: Option<i64>,
}

impl SearchQuery {
    /// The trimmed search term, or a 400 when it is empty or too long.
    pub fn term(&self) -> Result<&str, AppError> {
        let term = self.q.trim();
        if term.is_empty() {
            return Err(AppError::BadRequest("query parameter 'q' is required".to_string()));
        }
        if term.chars().count() > MAX_QUERY_LEN {
            return Err(AppError::BadRequest(format!(
                "query parameter 'q' must be at most {} characters",
                MAX_QUERY_LEN
            )));
        }
        Ok(term)
    }
}

#[derive(Debug, Default, Deserialize)]
struct NavigationQuery {
    #[serde(default)]
    location: Option<NavLocation>,
}

async fn list_articles(
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> ApiResult<Json<Vec<Article>>> {
    let articles = state
        .db
        .articles
        .list_live(Utc::now(), page.limit, page.offset)
        .await?;
    Ok(Json(articles))
}

/// Counts a view on every successful read.
async fn view_article(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<Article>> {
    let article = state
        .db
        .articles
        .view_live_by_slug(&slug, Utc::now())
        .await?
        .ok_or_else(|| AppError::not_found("Article", &slug))?;
    Ok(Json(article))
}

async fn list_category_articles(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(page): Query<Pagination>,
) -> ApiResult<Json<Vec<Article>>> {
    if state.db.categories.get_by_slug(&slug).await?.is_none() {
        return Err(AppError::not_found("Category", &slug).into());
    }
    let articles = state
        .db
        .articles
        .list_live_by_category(&slug, Utc::now(), page.limit, page.offset)
        .await?;
    Ok(Json(articles))
}

async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<Article>>> {
    let term = query.term()?;
    let articles = state
        .db
        .articles
        .search_live(term, Utc::now(), query.limit)
        .await?;
    tracing::debug!(term, hits = articles.len(), "Article search");
    Ok(Json(articles))
}

async fn view_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<Page>> {
    let page = state
        .db
        .pages
        .get_published_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::not_found("Page", &slug))?;
    Ok(Json(page))
}

async fn navigation(
    State(state): State<AppState>,
    Query(query): Query<NavigationQuery>,
) -> ApiResult<Json<Vec<NavigationLink>>> {
    Ok(Json(state.db.navigation.list(query.location).await?))
}
