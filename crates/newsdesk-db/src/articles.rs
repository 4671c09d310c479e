//! Article repository: admin CRUD, public (live) listings and the publishing sweep.

use chrono::{DateTime, Utc};
use newsdesk_core::error::AppError;
use newsdesk_core::models::{Article, ArticleFilter, NewArticle, Tag};
use newsdesk_core::publishing::PublishState;
use sqlx::{PgPool, Pool, Postgres, Transaction};
use std::collections::HashMap;
use uuid::Uuid;

const ARTICLE_COLUMNS: &str = "id, title, slug, excerpt, content, cover_image_url, status, published_at, scheduled_at, author_id, category_id, is_featured, views, created_at, updated_at";

/// Same column list, qualified for joins against `categories`.
const ARTICLE_COLUMNS_QUALIFIED: &str = "a.id, a.title, a.slug, a.excerpt, a.content, a.cover_image_url, a.status, a.published_at, a.scheduled_at, a.author_id, a.category_id, a.is_featured, a.views, a.created_at, a.updated_at";

/// SQL predicate for "visible on the public site at $1". Mirrors
/// `newsdesk_core::publishing::is_live`.
const LIVE_PREDICATE: &str =
    "(a.status = 'published' OR (a.status = 'scheduled' AND a.scheduled_at <= $1))";

/// Hard cap on page sizes.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Default page size when the caller does not pass one.
pub const DEFAULT_PAGE_SIZE: i64 = 20;

#[derive(Clone)]
pub struct ArticleRepository {
    pool: Pool<Postgres>,
}

impl ArticleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Admin listing, newest first, optionally filtered by status and category.
    pub async fn list(&self, filter: &ArticleFilter) -> Result<Vec<Article>, AppError> {
        let (limit, offset) = page_bounds(filter.limit, filter.offset);
        let query = format!(
            r#"
            SELECT {} FROM articles
            WHERE ($1::article_status IS NULL OR status = $1)
              AND ($2::uuid IS NULL OR category_id = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
            ARTICLE_COLUMNS
        );
        let articles = sqlx::query_as::<_, Article>(&query)
            .bind(filter.status)
            .bind(filter.category_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::DatabaseError)?;

        self.attach_tags(articles).await
    }

    /// Every article regardless of status, for exports.
    pub async fn list_all(&self, limit: Option<usize>) -> Result<Vec<Article>, AppError> {
        let limit_val = limit.unwrap_or(10000) as i64;
        let query = format!(
            "SELECT {} FROM articles ORDER BY created_at DESC LIMIT $1",
            ARTICLE_COLUMNS
        );
        let articles = sqlx::query_as::<_, Article>(&query)
            .bind(limit_val)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::DatabaseError)?;

        self.attach_tags(articles).await
    }

    /// Retrieves an article by UUID, any status.
    pub async fn get(&self, id: Uuid) -> Result<Option<Article>, AppError> {
        let query = format!("SELECT {} FROM articles WHERE id = $1", ARTICLE_COLUMNS);
        let article = sqlx::query_as::<_, Article>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::DatabaseError)?;

        match article {
            Some(article) => Ok(self.attach_tags(vec![article]).await?.pop()),
            None => Ok(None),
        }
    }

    /// Inserts an article with an already-resolved slug and publishing state.
    pub async fn create(
        &self,
        new_article: &NewArticle,
        slug: &str,
        state: PublishState,
    ) -> Result<Article, AppError> {
        let id = Uuid::new_v4();
        let mut tx = self.pool.begin().await.map_err(AppError::DatabaseError)?;

        let query = format!(
            r#"
            INSERT INTO articles (
                id, title, slug, excerpt, content, cover_image_url, status,
                published_at, scheduled_at, author_id, category_id, is_featured
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {}
            "#,
            ARTICLE_COLUMNS
        );
        let mut article = sqlx::query_as::<_, Article>(&query)
            .bind(id)
            .bind(&new_article.title)
            .bind(slug)
            .bind(&new_article.excerpt)
            .bind(&new_article.content)
            .bind(&new_article.cover_image_url)
            .bind(state.status)
            .bind(state.published_at)
            .bind(state.scheduled_at)
            .bind(new_article.author_id)
            .bind(new_article.category_id)
            .bind(new_article.is_featured)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| AppError::from_write(e, "Article"))?;

        article.tags = replace_tags(&mut tx, id, &new_article.tag_ids).await?;
        tx.commit().await.map_err(AppError::DatabaseError)?;

        Ok(article)
    }

    /// Replaces the editable fields, publishing state and tags. `None` if unknown.
    pub async fn update(
        &self,
        id: Uuid,
        new_article: &NewArticle,
        slug: &str,
        state: PublishState,
    ) -> Result<Option<Article>, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::DatabaseError)?;

        let query = format!(
            r#"
            UPDATE articles SET
                title = $2,
                slug = $3,
                excerpt = $4,
                content = $5,
                cover_image_url = $6,
                status = $7,
                published_at = $8,
                scheduled_at = $9,
                author_id = $10,
                category_id = $11,
                is_featured = $12,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            ARTICLE_COLUMNS
        );
        let article = sqlx::query_as::<_, Article>(&query)
            .bind(id)
            .bind(&new_article.title)
            .bind(slug)
            .bind(&new_article.excerpt)
            .bind(&new_article.content)
            .bind(&new_article.cover_image_url)
            .bind(state.status)
            .bind(state.published_at)
            .bind(state.scheduled_at)
            .bind(new_article.author_id)
            .bind(new_article.category_id)
            .bind(new_article.is_featured)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| AppError::from_write(e, "Article"))?;

        let Some(mut article) = article else {
            return Ok(None);
        };

        article.tags = replace_tags(&mut tx, id, &new_article.tag_ids).await?;
        tx.commit().await.map_err(AppError::DatabaseError)?;

        Ok(Some(article))
    }

    /// Writes only the publishing columns.
    pub async fn set_state(
        &self,
        id: Uuid,
        state: PublishState,
    ) -> Result<Option<Article>, AppError> {
        let query = format!(
            r#"
            UPDATE articles
            SET status = $2, published_at = $3, scheduled_at = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            ARTICLE_COLUMNS
        );
        let article = sqlx::query_as::<_, Article>(&query)
            .bind(id)
            .bind(state.status)
            .bind(state.published_at)
            .bind(state.scheduled_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::DatabaseError)?;

        match article {
            Some(article) => Ok(self.attach_tags(vec![article]).await?.pop()),
            None => Ok(None),
        }
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM articles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::DatabaseError)?;

        Ok(result.rows_affected() > 0)
    }

    /// Live articles, most recently published first.
    pub async fn list_live(
        &self,
        now: DateTime<Utc>,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Article>, AppError> {
        let (limit, offset) = page_bounds(limit, offset);
        let query = format!(
            r#"
            SELECT {} FROM articles a
            WHERE {}
            ORDER BY COALESCE(a.published_at, a.scheduled_at) DESC
            LIMIT $2 OFFSET $3
            "#,
            ARTICLE_COLUMNS_QUALIFIED, LIVE_PREDICATE
        );
        let articles = sqlx::query_as::<_, Article>(&query)
            .bind(now)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::DatabaseError)?;

        self.attach_tags(articles).await
    }

    /// Live articles in the category with `category_slug`.
    pub async fn list_live_by_category(
        &self,
        category_slug: &str,
        now: DateTime<Utc>,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Article>, AppError> {
        let (limit, offset) = page_bounds(limit, offset);
        let query = format!(
            r#"
            SELECT {} FROM articles a
            JOIN categories c ON c.id = a.category_id
            WHERE {} AND c.slug = $2
            ORDER BY COALESCE(a.published_at, a.scheduled_at) DESC
            LIMIT $3 OFFSET $4
            "#,
            ARTICLE_COLUMNS_QUALIFIED, LIVE_PREDICATE
        );
        let articles = sqlx::query_as::<_, Article>(&query)
            .bind(now)
            .bind(category_slug)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::DatabaseError)?;

        self.attach_tags(articles).await
    }

    /// Fetches a live article by slug and counts the view in the same statement.
    pub async fn view_live_by_slug(
        &self,
        slug: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Article>, AppError> {
        let query = format!(
            r#"
            UPDATE articles a SET views = a.views + 1
            WHERE a.slug = $2 AND {}
            RETURNING {}
            "#,
            LIVE_PREDICATE, ARTICLE_COLUMNS_QUALIFIED
        );
        let article = sqlx::query_as::<_, Article>(&query)
            .bind(now)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::DatabaseError)?;

        match article {
            Some(article) => Ok(self.attach_tags(vec![article]).await?.pop()),
            None => Ok(None),
        }
    }

    /// Case-insensitive substring search over title, excerpt and body of live articles.
    pub async fn search_live(
        &self,
        term: &str,
        now: DateTime<Utc>,
        limit: Option<i64>,
    ) -> Result<Vec<Article>, AppError> {
        let (limit, _) = page_bounds(limit, None);
        let query = format!(
            r#"
            SELECT {} FROM articles a
            WHERE {}
              AND (a.title ILIKE $2 OR a.excerpt ILIKE $2 OR a.content ILIKE $2)
            ORDER BY (a.title ILIKE $2) DESC, COALESCE(a.published_at, a.scheduled_at) DESC
            LIMIT $3
            "#,
            ARTICLE_COLUMNS_QUALIFIED, LIVE_PREDICATE
        );
        let articles = sqlx::query_as::<_, Article>(&query)
            .bind(now)
            .bind(like_pattern(term))
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::DatabaseError)?;

        self.attach_tags(articles).await
    }

    /// Flips every due SCHEDULED article to PUBLISHED. Returns the ids flipped.
    ///
    /// `published_at` becomes the scheduled instant unless already set.
    pub async fn publish_due(&self, now: DateTime<Utc>) -> Result<Vec<Uuid>, AppError> {
        let rows: Vec<(Uuid,)> = sqlx::query_as(
            r#"
            UPDATE articles
            SET status = 'published',
                published_at = COALESCE(published_at, scheduled_at),
                updated_at = NOW()
            WHERE status = 'scheduled' AND scheduled_at <= $1
            RETURNING id
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::DatabaseError)?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn attach_tags(&self, mut articles: Vec<Article>) -> Result<Vec<Article>, AppError> {
        if articles.is_empty() {
            return Ok(articles);
        }

        let ids: Vec<Uuid> = articles.iter().map(|a| a.id).collect();
        let rows: Vec<ArticleTagRow> = sqlx::query_as(
            r#"
            SELECT at.article_id, t.id, t.name, t.slug
            FROM article_tags at
            JOIN tags t ON t.id = at.tag_id
            WHERE at.article_id = ANY($1)
            ORDER BY t.name
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::DatabaseError)?;

        let mut by_article: HashMap<Uuid, Vec<Tag>> = HashMap::new();
        for row in rows {
            by_article.entry(row.article_id).or_default().push(Tag {
                id: row.id,
                name: row.name,
                slug: row.slug,
            });
        }
        for article in &mut articles {
            article.tags = by_article.remove(&article.id).unwrap_or_default();
        }

        Ok(articles)
    }
}

/// Helper struct for deserializing the tag join
#[derive(sqlx::FromRow)]
struct ArticleTagRow {
    article_id: Uuid,
    id: Uuid,
    name: String,
    slug: String,
}

async fn replace_tags(
    tx: &mut Transaction<'_, Postgres>,
    article_id: Uuid,
    tag_ids: &[Uuid],
) -> Result<Vec<Tag>, AppError> {
    sqlx::query("DELETE FROM article_tags WHERE article_id = $1")
        .bind(article_id)
        .execute(&mut **tx)
        .await
        .map_err(AppError::DatabaseError)?;

    if tag_ids.is_empty() {
        return Ok(Vec::new());
    }

    sqlx::query(
        r#"
        INSERT INTO article_tags (article_id, tag_id)
        SELECT $1, UNNEST($2::uuid[])
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(article_id)
    .bind(tag_ids)
    .execute(&mut **tx)
    .await
    .map_err(|e| AppError::from_write(e, "Article tag"))?;

    let tags: Vec<Tag> = sqlx::query_as(
        r#"
        SELECT t.id, t.name, t.slug
        FROM article_tags at
        JOIN tags t ON t.id = at.tag_id
        WHERE at.article_id = $1
        ORDER BY t.name
        "#,
    )
    .bind(article_id)
    .fetch_all(&mut **tx)
    .await
    .map_err(AppError::DatabaseError)?;

    Ok(tags)
}

/// Clamps paging parameters to `1..=MAX_PAGE_SIZE` and a non-negative offset.
pub fn page_bounds(limit: Option<i64>, offset: Option<i64>) -> (i64, i64) {
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let offset = offset.unwrap_or(0).max(0);
    (limit, offset)
}

/// Wraps a search term for `ILIKE`, escaping the wildcard characters.
pub fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.trim().chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}
