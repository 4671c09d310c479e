//! Request middleware: admin bearer auth and request ids.

use axum::body::Body;
use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderValue, Request};
use axum::middleware::Next;
use axum::response::Response;
use newsdesk_core::error::AppError;
use newsdesk_core::secret::secure_eq;
use tracing::Instrument;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Rejects admin requests without `Authorization: Bearer <admin token>`.
///
/// With no token configured every request passes.
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(expected) = state.admin_token.as_deref() {
        let provided = request
            .headers()
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim);

        if !provided.is_some_and(|token| secure_eq(token.as_bytes(), expected.as_bytes())) {
            tracing::warn!(path = %request.uri().path(), "Rejected admin request");
            return Err(ApiError(AppError::Unauthorized));
        }
    }

    Ok(next.run(request).await)
}

/// Tags the request span with an id (incoming `x-request-id` or a fresh UUID)
/// and echoes it on the response.
pub async fn request_id(request: Request<Body>, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty() && v.len() <= 128)
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let span = tracing::info_span!(
        "http.request",
        request_id = %request_id,
        method = %request.method(),
        route = %request.uri().path(),
    );

    let mut response = next.run(request).instrument(span).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}
