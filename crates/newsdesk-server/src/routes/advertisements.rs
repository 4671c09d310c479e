//! Advertisement admin CRUD, slot display and event tracking.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use newsdesk_core::delivery::{select_ad, AdContext, SelectionStats};
use newsdesk_core::error::AppError;
use newsdesk_core::models::{
    AdCounters, AdPosition, Advertisement, DisplayAd, NewAdvertisement, PageType, TrackRequest,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::state::AppState;

/// Admin routes, mounted behind the bearer check.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/api/advertisements", get(list_ads).post(create_ad))
        .route(
            "/api/advertisements/{id}",
            get(get_ad).put(update_ad).delete(delete_ad),
        )
        .route("/api/advertisements/{id}/toggle", post(toggle_ad))
}

/// Routes hit by rendered pages.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/api/advertisements/display", get(display_ad))
        .route("/api/advertisements/{id}/track", post(track_ad))
}

/// Query string of the display endpoint. Kept as strings so unknown values
/// produce a JSON 400 instead of the extractor's plain-text rejection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayQuery {
    pub position: String,
    #[serde(default)]
    pub page_type: Option<String>,
    #[serde(default)]
    pub page_id: Option<String>,
}

impl DisplayQuery {
    pub fn into_context(self) -> Result<AdContext, AppError> {
        let position: AdPosition = self.position.parse()?;
        let page_type = match self.page_type.as_deref() {
            None | Some("") => PageType::default(),
            Some(raw) => raw.parse()?,
        };
        Ok(AdContext::new(position, page_type, self.page_id))
    }
}

async fn list_ads(State(state): State<AppState>) -> ApiResult<Json<Vec<Advertisement>>> {
    Ok(Json(state.db.advertisements.list().await?))
}

async fn get_ad(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Advertisement>> {
    let ad = state
        .db
        .advertisements
        .get(id)
        .await?
        .ok_or_else(|| AppError::not_found("Advertisement", id))?;
    Ok(Json(ad))
}

async fn create_ad(
    State(state): State<AppState>,
    Json(payload): Json<NewAdvertisement>,
) -> ApiResult<(StatusCode, Json<Advertisement>)> {
    payload.validate()?;
    let ad = state.db.advertisements.create(&payload).await?;
    Ok((StatusCode::CREATED, Json(ad)))
}

async fn update_ad(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<NewAdvertisement>,
) -> ApiResult<Json<Advertisement>> {
    payload.validate()?;
    let ad = state
        .db
        .advertisements
        .update(id, &payload)
        .await?
        .ok_or_else(|| AppError::not_found("Advertisement", id))?;
    tracing::info!(ad_id = %id, "Advertisement updated");
    Ok(Json(ad))
}

async fn delete_ad(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<StatusCode> {
    if !state.db.advertisements.delete(id).await? {
        return Err(AppError::not_found("Advertisement", id).into());
    }
    tracing::info!(ad_id = %id, "Advertisement deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn toggle_ad(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Advertisement>> {
    let ad = state
        .db
        .advertisements
        .toggle(id)
        .await?
        .ok_or_else(|| AppError::not_found("Advertisement", id))?;
    tracing::info!(ad_id = %id, is_active = ad.is_active, "Advertisement toggled");
    Ok(Json(ad))
}

/// 200 with the winning ad, or 204 when nothing is eligible for the slot.
async fn display_ad(
    State(state): State<AppState>,
    Query(query): Query<DisplayQuery>,
) -> ApiResult<Response> {
    let ctx = query.into_context()?;
    let now = Utc::now();
    let candidates = state.db.advertisements.candidates(ctx.position, now).await?;

    if tracing::enabled!(tracing::Level::DEBUG) {
        let stats = SelectionStats::collect(&candidates, &ctx, now);
        tracing::debug!(
            position = %ctx.position,
            page_type = %ctx.page_type,
            candidates = stats.total(),
            eligible = stats.eligible,
            untargeted = stats.untargeted,
            out_of_schedule = stats.out_of_schedule,
            "Ad selection"
        );
    }

    match select_ad(&candidates, &ctx, now) {
        Some(ad) => Ok(Json(DisplayAd::from(ad)).into_response()),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

async fn track_ad(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<TrackRequest>,
) -> ApiResult<Json<AdCounters>> {
    let counters = state
        .db
        .advertisements
        .record(id, request.event)
        .await?
        .ok_or_else(|| AppError::not_found("Advertisement", id))?;
    tracing::debug!(ad_id = %id, event = request.event.as_str(), "Ad event recorded");
    Ok(Json(counters))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(position: &str, page_type: Option<&str>, page_id: Option<&str>) -> DisplayQuery {
        DisplayQuery {
            position: position.to_string(),
            page_type: page_type.map(str::to_string),
            page_id: page_id.map(str::to_string),
        }
    }

    #[test]
    fn test_display_query_defaults_to_global() {
        let ctx = query("header", None, None).into_context().unwrap();
        assert_eq!(ctx.position, AdPosition::Header);
        assert_eq!(ctx.page_type, PageType::Global);
        assert_eq!(ctx.page_id, None);
    }

    #[test]
    fn test_display_query_keeps_page_id() {
        let ctx = query("in-article", Some("article"), Some("a-slug"))
            .into_context()
            .unwrap();
        assert_eq!(ctx.page_type, PageType::Article);
        assert_eq!(ctx.page_id.as_deref(), Some("a-slug"));
    }

    #[test]
    fn test_display_query_rejects_unknown_values() {
        assert!(matches!(
            query("banner", None, None).into_context(),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            query("header", Some("landing"), None).into_context(),
            Err(AppError::BadRequest(_))
        ));
    }
}
