//! HTTP mapping for [`AppError`].

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use newsdesk_core::error::AppError;
use serde::Serialize;
use std::collections::BTreeMap;

/// Error body returned by every endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeMap<String, String>>,
}

/// [`AppError`] wrapped so axum can render it.
#[derive(Debug)]
pub struct ApiError(pub AppError);

pub type ApiResult<T> = Result<T, ApiError>;

impl<E> From<E> for ApiError
where
    E: Into<AppError>,
{
    fn from(err: E) -> Self {
        ApiError(err.into())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::InvalidTransition { .. } | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::SerializationError(_) => StatusCode::BAD_REQUEST,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match &self.0 {
            AppError::Validation(errors) => ErrorResponse {
                error: "Validation failed".to_string(),
                fields: Some(errors.fields().clone()),
            },
            // Internal details stay in the log.
            err if status.is_server_error() => {
                tracing::error!(error = %err, "Request failed");
                ErrorResponse {
                    error: "Internal server error".to_string(),
                    fields: None,
                }
            }
            err => ErrorResponse {
                error: err.to_string(),
                fields: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use newsdesk_core::models::ArticleStatus;
    use newsdesk_core::validation::ValidationErrors;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = ApiError(err).into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_not_found_maps_to_404() {
        let (status, body) = body_json(AppError::not_found("Article", "abc")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Article not found: abc");
    }

    #[tokio::test]
    async fn test_validation_lists_fields() {
        let mut errors = ValidationErrors::new();
        errors.add("priority", "must be between 1 and 10");
        let (status, body) = body_json(AppError::Validation(errors)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["fields"]["priority"], "must be between 1 and 10");
    }

    #[tokio::test]
    async fn test_database_error_is_masked() {
        let (status, body) = body_json(AppError::DatabaseError(sqlx::Error::PoolTimedOut)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");
        assert!(body.get("fields").is_none());
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError(AppError::Conflict("slug".into())).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError(AppError::Unauthorized).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError(AppError::InvalidTransition {
                from: ArticleStatus::Published,
                to: ArticleStatus::Scheduled,
            })
            .status(),
            StatusCode::BAD_REQUEST
        );
    }
}
