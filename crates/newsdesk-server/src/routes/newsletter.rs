//! Newsletter subscriptions: admin list/delete plus public subscribe/unsubscribe.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use newsdesk_core::error::AppError;
use newsdesk_core::models::{SubscribeRequest, Subscriber, UnsubscribeRequest};
use newsdesk_core::newsletter::verify_unsubscribe_token;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::state::AppState;

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/api/newsletter/subscribers", get(list_subscribers))
        .route("/api/newsletter/subscribers/{id}", delete(delete_subscriber))
}

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/api/newsletter/subscribe", post(subscribe))
        .route("/api/newsletter/unsubscribe", post(unsubscribe))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubscriberQuery {
    #[serde(default)]
    active_only: bool,
}

#[derive(Debug, Serialize)]
struct UnsubscribeResponse {
    unsubscribed: bool,
}

async fn list_subscribers(
    State(state): State<AppState>,
    Query(query): Query<SubscriberQuery>,
) -> ApiResult<Json<Vec<Subscriber>>> {
    Ok(Json(state.db.subscribers.list(query.active_only).await?))
}

async fn delete_subscriber(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if !state.db.subscribers.delete(id).await? {
        return Err(AppError::not_found("Subscriber", id).into());
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn subscribe(
    State(state): State<AppState>,
    Json(request): Json<SubscribeRequest>,
) -> ApiResult<Json<Subscriber>> {
    request.validate()?;
    let name = request.name.as_deref().map(str::trim).filter(|n| !n.is_empty());
    let subscriber = state.db.subscribers.subscribe(&request.email, name).await?;
    tracing::info!(subscriber_id = %subscriber.id, "Newsletter subscription");
    Ok(Json(subscriber))
}

/// Unknown addresses answer the same way as known ones.
async fn unsubscribe(
    State(state): State<AppState>,
    Json(request): Json<UnsubscribeRequest>,
) -> ApiResult<Json<UnsubscribeResponse>> {
    if !verify_unsubscribe_token(&request.email, &state.newsletter_secret, &request.token) {
        return Err(AppError::BadRequest("invalid unsubscribe token".to_string()).into());
    }
    let found = state.db.subscribers.unsubscribe(&request.email).await?;
    if found {
        tracing::info!("Newsletter unsubscription");
    }
    Ok(Json(UnsubscribeResponse { unsubscribed: true }))
}
