use thiserror::Error;

use crate::models::ArticleStatus;
use crate::validation::ValidationErrors;

/// Postgres SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

/// Postgres SQLSTATE for `foreign_key_violation`.
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Application-wide error types.
///
/// This enum represents every failure the Newsdesk crates can surface. It uses
/// the `thiserror` crate for ergonomic error handling and automatic conversion
/// from underlying library errors.
///
/// # Error Conversion
///
/// Most errors automatically convert from their source types using the `#[from]` attribute:
/// - `sqlx::Error` → `AppError::DatabaseError`
/// - `serde_json::Error` → `AppError::SerializationError`
///
/// Repository writes should prefer [`AppError::from_write`] so that unique and
/// foreign-key violations become [`AppError::Conflict`] instead of opaque
/// database errors.
///
/// # Examples
///
/// ```no_run
/// use newsdesk_core::error::AppError;
///
/// fn example() -> Result<(), AppError> {
///     Err(AppError::Generic("Something went wrong".to_string()))
/// }
/// ```
#[derive(Error, Debug)]
pub enum AppError {
    /// Database operation failed.
    ///
    /// This error wraps all errors from SQLx database operations, including
    /// connection failures and query errors.
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    /// HTTP client request failed.
    #[error("API Client error: {0}")]
    ClientError(String),

    /// JSON serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// URL parsing failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A requested row does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Input failed validation. Carries one message per offending field.
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// A write collided with an existing row (duplicate slug, email, ...)
    /// or referenced a row that does not exist.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The requested article status change is not allowed.
    #[error("Cannot move article from {from} to {to}")]
    InvalidTransition {
        from: ArticleStatus,
        to: ArticleStatus,
    },

    /// Missing or wrong admin credentials.
    #[error("Unauthorized")]
    Unauthorized,

    /// Malformed request that is not a per-field validation problem.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Network or connection error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Request timeout.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// Configuration file could not be read or parsed.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic application error for cases not covered by specific variants.
    ///
    /// Use this sparingly - prefer creating specific error variants
    /// for better error handling and debugging.
    #[error("Error: {0}")]
    Generic(String),
}

impl AppError {
    /// Shorthand for [`AppError::NotFound`].
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        AppError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Classifies a failed INSERT/UPDATE/DELETE.
    ///
    /// Unique and foreign-key violations become [`AppError::Conflict`] with a
    /// message naming `what`; everything else stays a database error.
    pub fn from_write(err: sqlx::Error, what: &str) -> Self {
        let code = err
            .as_database_error()
            .and_then(|db| db.code())
            .map(|c| c.into_owned());

        match code.as_deref() {
            Some(UNIQUE_VIOLATION) => AppError::Conflict(format!("{} already exists", what)),
            Some(FOREIGN_KEY_VIOLATION) => {
                AppError::Conflict(format!("{} references a missing or in-use record", what))
            }
            _ => AppError::DatabaseError(err),
        }
    }

    /// Returns a user-friendly error message suitable for CLI output.
    pub fn user_message(&self) -> String {
        match self {
            AppError::DatabaseError(e) => {
                if e.to_string().contains("connection") {
                    "Cannot connect to database. Is PostgreSQL running?\n   Try: docker-compose up -d".to_string()
                } else {
                    format!("Database error: {}", e)
                }
            }
            AppError::ClientError(msg) => {
                if msg.contains("timeout") || msg.contains("timed out") {
                    "Request timed out. The Newsdesk API may be slow or unreachable.".to_string()
                } else if msg.contains("connect") {
                    format!(
                        "Cannot connect to the Newsdesk API: {}\n   Check NEWSDESK_API_URL.",
                        msg
                    )
                } else {
                    format!("API error: {}", msg)
                }
            }
            AppError::Validation(errors) => {
                let mut out = String::from("Invalid input:");
                for (field, msg) in errors.fields() {
                    out.push_str(&format!("\n   {}: {}", field, msg));
                }
                out
            }
            AppError::Unauthorized => {
                "Admin token missing or invalid.\n   Set NEWSDESK_ADMIN_TOKEN.".to_string()
            }
            AppError::NetworkError(msg) => {
                format!("Network error: {}\n   Check your internet connection.", msg)
            }
            AppError::Timeout(secs) => {
                format!(
                    "Request timed out after {} seconds.\n   The server may be overloaded. Try again later.",
                    secs
                )
            }
            AppError::ConfigError(msg) => {
                format!("Configuration error: {}\n   Check your config.toml.", msg)
            }
            _ => self.to_string(),
        }
    }

    /// Returns true if this error is retryable.
    ///
    /// # Examples
    ///
    /// ```
    /// use newsdesk_core::error::AppError;
    ///
    /// let err = AppError::NetworkError("connection reset".to_string());
    /// assert!(err.is_retryable());
    ///
    /// let err = AppError::not_found("Article", "abc");
    /// assert!(!err.is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::NetworkError(_) | AppError::Timeout(_) | AppError::ClientError(_)
        )
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::Validation(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = AppError::not_found("Advertisement", "test-id");
        assert_eq!(err.to_string(), "Advertisement not found: test-id");
    }

    #[test]
    fn test_generic_error() {
        let err = AppError::Generic("Something went wrong".to_string());
        assert_eq!(err.to_string(), "Error: Something went wrong");
    }

    #[test]
    fn test_invalid_transition_display() {
        let err = AppError::InvalidTransition {
            from: ArticleStatus::Published,
            to: ArticleStatus::Scheduled,
        };
        assert_eq!(
            err.to_string(),
            "Cannot move article from PUBLISHED to SCHEDULED"
        );
    }

    #[test]
    fn test_validation_user_message_lists_fields() {
        let mut errors = ValidationErrors::new();
        errors.add("name", "is required");
        errors.add("priority", "must be between 1 and 10");
        let msg = AppError::from(errors).user_message();
        assert!(msg.contains("name: is required"));
        assert!(msg.contains("priority: must be between 1 and 10"));
    }

    #[test]
    fn test_error_from_serde() {
        let json = "{ invalid json }";
        let result: Result<serde_json::Value, _> = serde_json::from_str(json);
        let serde_err = result.unwrap_err();
        let app_err: AppError = serde_err.into();
        assert!(matches!(app_err, AppError::SerializationError(_)));
    }

    #[test]
    fn test_user_message_database_connection() {
        let err = AppError::DatabaseError(sqlx::Error::PoolTimedOut);
        let msg = err.user_message();
        assert!(msg.contains("Cannot connect to database") || msg.contains("Database error"));
    }

    #[test]
    fn test_from_write_passes_through_non_constraint_errors() {
        let err = AppError::from_write(sqlx::Error::RowNotFound, "Article");
        assert!(matches!(err, AppError::DatabaseError(_)));
    }

    #[test]
    fn test_is_retryable() {
        assert!(AppError::NetworkError("timeout".to_string()).is_retryable());
        assert!(AppError::Timeout(30).is_retryable());
        assert!(!AppError::Unauthorized.is_retryable());
        assert!(!AppError::Conflict("slug".to_string()).is_retryable());
    }

    #[test]
    fn test_timeout_error() {
        let err = AppError::Timeout(30);
        assert_eq!(err.to_string(), "Request timed out after 30 seconds");
    }
}
