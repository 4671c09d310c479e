//! Static pages, navigation links and site settings.

use newsdesk_core::error::AppError;
use newsdesk_core::models::{NavLocation, NavigationLink, NewNavigationLink, NewPage, Page, Setting};
use newsdesk_core::validation::resolve_slug;
use sqlx::types::Json;
use sqlx::{PgPool, Pool, Postgres};
use std::collections::BTreeMap;
use uuid::Uuid;

const PAGE_COLUMNS: &str = "id, title, slug, content, is_published, created_at, updated_at";
const NAV_COLUMNS: &str = "id, label, url, location, sort_order, open_in_new_tab, parent_id";

#[derive(Clone)]
pub struct PageRepository {
    pool: Pool<Postgres>,
}

impl PageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<Page>, AppError> {
        let query = format!("SELECT {} FROM pages ORDER BY title", PAGE_COLUMNS);
        sqlx::query_as::<_, Page>(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::DatabaseError)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Page>, AppError> {
        let query = format!("SELECT {} FROM pages WHERE id = $1", PAGE_COLUMNS);
        sqlx::query_as::<_, Page>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::DatabaseError)
    }

    /// Public lookup: unpublished pages are invisible.
    pub async fn get_published_by_slug(&self, slug: &str) -> Result<Option<Page>, AppError> {
        let query = format!(
            "SELECT {} FROM pages WHERE slug = $1 AND is_published",
            PAGE_COLUMNS
        );
        sqlx::query_as::<_, Page>(&query)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::DatabaseError)
    }

    pub async fn create(&self, new_page: &NewPage) -> Result<Page, AppError> {
        let slug = resolve_slug(new_page.slug.as_deref(), &new_page.title);
        let query = format!(
            "INSERT INTO pages (id, title, slug, content, is_published) VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            PAGE_COLUMNS
        );
        sqlx::query_as::<_, Page>(&query)
            .bind(Uuid::new_v4())
            .bind(&new_page.title)
            .bind(slug)
            .bind(&new_page.content)
            .bind(new_page.is_published)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::from_write(e, "Page"))
    }

    pub async fn update(&self, id: Uuid, new_page: &NewPage) -> Result<Option<Page>, AppError> {
        let slug = resolve_slug(new_page.slug.as_deref(), &new_page.title);
        let query = format!(
            "UPDATE pages SET title = $2, slug = $3, content = $4, is_published = $5, updated_at = NOW() WHERE id = $1 RETURNING {}",
            PAGE_COLUMNS
        );
        sqlx::query_as::<_, Page>(&query)
            .bind(id)
            .bind(&new_page.title)
            .bind(slug)
            .bind(&new_page.content)
            .bind(new_page.is_published)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::from_write(e, "Page"))
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM pages WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::DatabaseError)?;
        Ok(result.rows_affected() > 0)
    }
}

#[derive(Clone)]
pub struct NavigationRepository {
    pool: Pool<Postgres>,
}

impl NavigationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Links in menu order, optionally for one location only.
    pub async fn list(
        &self,
        location: Option<NavLocation>,
    ) -> Result<Vec<NavigationLink>, AppError> {
        let query = format!(
            r#"
            SELECT {} FROM navigation_links
            WHERE ($1::nav_location IS NULL OR location = $1)
            ORDER BY location, sort_order, label
            "#,
            NAV_COLUMNS
        );
        sqlx::query_as::<_, NavigationLink>(&query)
            .bind(location)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::DatabaseError)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<NavigationLink>, AppError> {
        let query = format!("SELECT {} FROM navigation_links WHERE id = $1", NAV_COLUMNS);
        sqlx::query_as::<_, NavigationLink>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::DatabaseError)
    }

    pub async fn create(&self, link: &NewNavigationLink) -> Result<NavigationLink, AppError> {
        let query = format!(
            r#"
            INSERT INTO navigation_links (id, label, url, location, sort_order, open_in_new_tab, parent_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            NAV_COLUMNS
        );
        sqlx::query_as::<_, NavigationLink>(&query)
            .bind(Uuid::new_v4())
            .bind(&link.label)
            .bind(&link.url)
            .bind(link.location)
            .bind(link.sort_order)
            .bind(link.open_in_new_tab)
            .bind(link.parent_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::from_write(e, "Navigation link"))
    }

    pub async fn update(
        &self,
        id: Uuid,
        link: &NewNavigationLink,
    ) -> Result<Option<NavigationLink>, AppError> {
        if link.parent_id == Some(id) {
            return Err(AppError::BadRequest(
                "a navigation link cannot be its own parent".to_string(),
            ));
        }
        let query = format!(
            r#"
            UPDATE navigation_links SET
                label = $2, url = $3, location = $4, sort_order = $5,
                open_in_new_tab = $6, parent_id = $7
            WHERE id = $1
            RETURNING {}
            "#,
            NAV_COLUMNS
        );
        sqlx::query_as::<_, NavigationLink>(&query)
            .bind(id)
            .bind(&link.label)
            .bind(&link.url)
            .bind(link.location)
            .bind(link.sort_order)
            .bind(link.open_in_new_tab)
            .bind(link.parent_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::from_write(e, "Navigation link"))
    }

    /// Child links are removed with their parent.
    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM navigation_links WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::DatabaseError)?;
        Ok(result.rows_affected() > 0)
    }
}

/// Key/value site settings (site name, social links, analytics ids...).
#[derive(Clone)]
pub struct SettingsRepository {
    pool: Pool<Postgres>,
}

impl SettingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<Setting>, AppError> {
        sqlx::query_as::<_, Setting>("SELECT key, value, updated_at FROM settings ORDER BY key")
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::DatabaseError)
    }

    /// All settings as a `key -> value` map.
    pub async fn as_map(&self) -> Result<BTreeMap<String, serde_json::Value>, AppError> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .map(|s| (s.key, s.value.0))
            .collect())
    }

    /// Upserts every entry in one transaction. Keys not mentioned are left alone;
    /// a JSON `null` value deletes the key.
    pub async fn upsert_many(
        &self,
        values: &BTreeMap<String, serde_json::Value>,
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::DatabaseError)?;

        for (key, value) in values {
            if value.is_null() {
                sqlx::query("DELETE FROM settings WHERE key = $1")
                    .bind(key)
                    .execute(&mut *tx)
                    .await
                    .map_err(AppError::DatabaseError)?;
                continue;
            }
            sqlx::query(
                r#"
                INSERT INTO settings (key, value, updated_at)
                VALUES ($1, $2, NOW())
                ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()
                "#,
            )
            .bind(key)
            .bind(Json(value))
            .execute(&mut *tx)
            .await
            .map_err(AppError::DatabaseError)?;
        }

        tx.commit().await.map_err(AppError::DatabaseError)?;
        Ok(())
    }
}
