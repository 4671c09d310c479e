//! Categories and tags.

use newsdesk_core::error::AppError;
use newsdesk_core::models::{Category, NewCategory, NewTag, Tag};
use newsdesk_core::validation::resolve_slug;
use sqlx::{PgPool, Pool, Postgres};
use uuid::Uuid;

const CATEGORY_COLUMNS: &str = "id, name, slug, description, parent_id, created_at";

#[derive(Clone)]
pub struct CategoryRepository {
    pool: Pool<Postgres>,
}

impl CategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<Category>, AppError> {
        let query = format!("SELECT {} FROM categories ORDER BY name", CATEGORY_COLUMNS);
        sqlx::query_as::<_, Category>(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::DatabaseError)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Category>, AppError> {
        let query = format!("SELECT {} FROM categories WHERE id = $1", CATEGORY_COLUMNS);
        sqlx::query_as::<_, Category>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::DatabaseError)
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Category>, AppError> {
        let query = format!("SELECT {} FROM categories WHERE slug = $1", CATEGORY_COLUMNS);
        sqlx::query_as::<_, Category>(&query)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::DatabaseError)
    }

    pub async fn create(&self, new_category: &NewCategory) -> Result<Category, AppError> {
        let slug = resolve_slug(new_category.slug.as_deref(), &new_category.name);
        let query = format!(
            "INSERT INTO categories (id, name, slug, description, parent_id) VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            CATEGORY_COLUMNS
        );
        sqlx::query_as::<_, Category>(&query)
            .bind(Uuid::new_v4())
            .bind(&new_category.name)
            .bind(slug)
            .bind(&new_category.description)
            .bind(new_category.parent_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::from_write(e, "Category"))
    }

    pub async fn update(
        &self,
        id: Uuid,
        new_category: &NewCategory,
    ) -> Result<Option<Category>, AppError> {
        if new_category.parent_id == Some(id) {
            return Err(AppError::BadRequest(
                "a category cannot be its own parent".to_string(),
            ));
        }
        let slug = resolve_slug(new_category.slug.as_deref(), &new_category.name);
        let query = format!(
            "UPDATE categories SET name = $2, slug = $3, description = $4, parent_id = $5 WHERE id = $1 RETURNING {}",
            CATEGORY_COLUMNS
        );
        sqlx::query_as::<_, Category>(&query)
            .bind(id)
            .bind(&new_category.name)
            .bind(slug)
            .bind(&new_category.description)
            .bind(new_category.parent_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::from_write(e, "Category"))
    }

    /// Articles in the category keep existing with no category (`ON DELETE SET NULL`).
    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::DatabaseError)?;
        Ok(result.rows_affected() > 0)
    }
}

#[derive(Clone)]
pub struct TagRepository {
    pool: Pool<Postgres>,
}

impl TagRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<Tag>, AppError> {
        sqlx::query_as::<_, Tag>("SELECT id, name, slug FROM tags ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::DatabaseError)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Tag>, AppError> {
        sqlx::query_as::<_, Tag>("SELECT id, name, slug FROM tags WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::DatabaseError)
    }

    pub async fn create(&self, new_tag: &NewTag) -> Result<Tag, AppError> {
        let slug = resolve_slug(new_tag.slug.as_deref(), &new_tag.name);
        sqlx::query_as::<_, Tag>(
            "INSERT INTO tags (id, name, slug) VALUES ($1, $2, $3) RETURNING id, name, slug",
        )
        .bind(Uuid::new_v4())
        .bind(&new_tag.name)
        .bind(slug)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::from_write(e, "Tag"))
    }

    pub async fn update(&self, id: Uuid, new_tag: &NewTag) -> Result<Option<Tag>, AppError> {
        let slug = resolve_slug(new_tag.slug.as_deref(), &new_tag.name);
        sqlx::query_as::<_, Tag>(
            "UPDATE tags SET name = $2, slug = $3 WHERE id = $1 RETURNING id, name, slug",
        )
        .bind(id)
        .bind(&new_tag.name)
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::from_write(e, "Tag"))
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM tags WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::DatabaseError)?;
        Ok(result.rows_affected() > 0)
    }
}
