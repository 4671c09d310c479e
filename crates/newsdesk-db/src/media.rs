//! Media library metadata.

use newsdesk_core::error::AppError;
use newsdesk_core::models::{MediaItem, NewMediaItem};
use sqlx::{PgPool, Pool, Postgres};
use uuid::Uuid;

const MEDIA_COLUMNS: &str = "id, url, file_name, mime_type, size_bytes, alt_text, created_at";

#[derive(Clone)]
pub struct MediaRepository {
    pool: Pool<Postgres>,
}

impl MediaRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Newest first, optionally only one top-level MIME type (`image`, `video`...).
    pub async fn list(&self, kind: Option<&str>) -> Result<Vec<MediaItem>, AppError> {
        let query = format!(
            "SELECT {} FROM media_items WHERE ($1::text IS NULL OR mime_type LIKE $1 || '/%') ORDER BY created_at DESC",
            MEDIA_COLUMNS
        );
        sqlx::query_as::<_, MediaItem>(&query)
            .bind(kind)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::DatabaseError)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<MediaItem>, AppError> {
        let query = format!("SELECT {} FROM media_items WHERE id = $1", MEDIA_COLUMNS);
        sqlx::query_as::<_, MediaItem>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::DatabaseError)
    }

    pub async fn create(&self, item: &NewMediaItem) -> Result<MediaItem, AppError> {
        let query = format!(
            "INSERT INTO media_items (id, url, file_name, mime_type, size_bytes, alt_text) VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            MEDIA_COLUMNS
        );
        sqlx::query_as::<_, MediaItem>(&query)
            .bind(Uuid::new_v4())
            .bind(&item.url)
            .bind(&item.file_name)
            .bind(&item.mime_type)
            .bind(item.size_bytes)
            .bind(&item.alt_text)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::from_write(e, "Media item"))
    }

    /// Only the alt text and file name are editable once stored.
    pub async fn update(
        &self,
        id: Uuid,
        item: &NewMediaItem,
    ) -> Result<Option<MediaItem>, AppError> {
        let query = format!(
            "UPDATE media_items SET file_name = $2, alt_text = $3 WHERE id = $1 RETURNING {}",
            MEDIA_COLUMNS
        );
        sqlx::query_as::<_, MediaItem>(&query)
            .bind(id)
            .bind(&item.file_name)
            .bind(&item.alt_text)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::DatabaseError)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM media_items WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::DatabaseError)?;
        Ok(result.rows_affected() > 0)
    }
}
