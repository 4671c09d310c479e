//! Authors.

use newsdesk_core::error::AppError;
use newsdesk_core::models::{Author, NewAuthor};
use newsdesk_core::newsletter::normalize_email;
use sqlx::{PgPool, Pool, Postgres};
use uuid::Uuid;

const AUTHOR_COLUMNS: &str = "id, name, email, bio, avatar_url, role, created_at";

#[derive(Clone)]
pub struct AuthorRepository {
    pool: Pool<Postgres>,
}

impl AuthorRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<Author>, AppError> {
        let query = format!("SELECT {} FROM authors ORDER BY name", AUTHOR_COLUMNS);
        sqlx::query_as::<_, Author>(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::DatabaseError)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Author>, AppError> {
        let query = format!("SELECT {} FROM authors WHERE id = $1", AUTHOR_COLUMNS);
        sqlx::query_as::<_, Author>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::DatabaseError)
    }

    pub async fn create(&self, new_author: &NewAuthor) -> Result<Author, AppError> {
        let query = format!(
            "INSERT INTO authors (id, name, email, bio, avatar_url, role) VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            AUTHOR_COLUMNS
        );
        sqlx::query_as::<_, Author>(&query)
            .bind(Uuid::new_v4())
            .bind(&new_author.name)
            .bind(normalize_email(&new_author.email))
            .bind(&new_author.bio)
            .bind(&new_author.avatar_url)
            .bind(new_author.role)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::from_write(e, "Author"))
    }

    pub async fn update(
        &self,
        id: Uuid,
        new_author: &NewAuthor,
    ) -> Result<Option<Author>, AppError> {
        let query = format!(
            "UPDATE authors SET name = $2, email = $3, bio = $4, avatar_url = $5, role = $6 WHERE id = $1 RETURNING {}",
            AUTHOR_COLUMNS
        );
        sqlx::query_as::<_, Author>(&query)
            .bind(id)
            .bind(&new_author.name)
            .bind(normalize_email(&new_author.email))
            .bind(&new_author.bio)
            .bind(&new_author.avatar_url)
            .bind(new_author.role)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::from_write(e, "Author"))
    }

    /// Articles by the author keep existing without a byline (`ON DELETE SET NULL`).
    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM authors WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::DatabaseError)?;
        Ok(result.rows_affected() > 0)
    }
}
