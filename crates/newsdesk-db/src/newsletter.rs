//! Newsletter subscribers.

use newsdesk_core::error::AppError;
use newsdesk_core::models::Subscriber;
use newsdesk_core::newsletter::normalize_email;
use sqlx::{PgPool, Pool, Postgres};
use uuid::Uuid;

const SUBSCRIBER_COLUMNS: &str = "id, email, name, is_active, subscribed_at, unsubscribed_at";

#[derive(Clone)]
pub struct SubscriberRepository {
    pool: Pool<Postgres>,
}

impl SubscriberRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, active_only: bool) -> Result<Vec<Subscriber>, AppError> {
        let query = format!(
            "SELECT {} FROM subscribers WHERE (NOT $1 OR is_active) ORDER BY subscribed_at DESC",
            SUBSCRIBER_COLUMNS
        );
        sqlx::query_as::<_, Subscriber>(&query)
            .bind(active_only)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::DatabaseError)
    }

    /// Subscribes `email`, re-activating a previous subscription. Idempotent.
    pub async fn subscribe(&self, email: &str, name: Option<&str>) -> Result<Subscriber, AppError> {
        let query = format!(
            r#"
            INSERT INTO subscribers (id, email, name)
            VALUES ($1, $2, $3)
            ON CONFLICT (email) DO UPDATE SET
                name = COALESCE(EXCLUDED.name, subscribers.name),
                is_active = TRUE,
                subscribed_at = CASE WHEN subscribers.is_active
                                     THEN subscribers.subscribed_at ELSE NOW() END,
                unsubscribed_at = NULL
            RETURNING {}
            "#,
            SUBSCRIBER_COLUMNS
        );
        sqlx::query_as::<_, Subscriber>(&query)
            .bind(Uuid::new_v4())
            .bind(normalize_email(email))
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::from_write(e, "Subscriber"))
    }

    /// Marks the subscription inactive. Returns false for unknown addresses.
    pub async fn unsubscribe(&self, email: &str) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE subscribers
            SET is_active = FALSE, unsubscribed_at = COALESCE(unsubscribed_at, NOW())
            WHERE email = $1
            "#,
        )
        .bind(normalize_email(email))
        .execute(&self.pool)
        .await
        .map_err(AppError::DatabaseError)?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM subscribers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::DatabaseError)?;
        Ok(result.rows_affected() > 0)
    }
}
