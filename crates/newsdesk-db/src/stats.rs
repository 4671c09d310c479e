use newsdesk_core::error::AppError;
use newsdesk_core::models::ContentStats;
use sqlx::{PgPool, Pool, Postgres};

#[derive(Clone)]
pub struct StatsRepository {
    pool: Pool<Postgres>,
}

impl StatsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns aggregated content statistics.
    pub async fn content_stats(&self) -> Result<ContentStats, AppError> {
        let row: StatsRow = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM articles) AS total_articles,
                (SELECT COUNT(*) FROM articles WHERE status = 'published') AS published_articles,
                (SELECT COUNT(*) FROM articles WHERE status = 'scheduled') AS scheduled_articles,
                (SELECT COUNT(*) FROM articles WHERE status = 'draft') AS draft_articles,
                (SELECT COUNT(*) FROM advertisements WHERE is_active) AS active_advertisements,
                (SELECT COUNT(*) FROM subscribers WHERE is_active) AS active_subscribers,
                (SELECT SUM(impressions)::BIGINT FROM advertisements) AS total_impressions,
                (SELECT SUM(clicks)::BIGINT FROM advertisements) AS total_clicks
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::DatabaseError)?;

        Ok(ContentStats {
            total_articles: row.total_articles.unwrap_or(0),
            published_articles: row.published_articles.unwrap_or(0),
            scheduled_articles: row.scheduled_articles.unwrap_or(0),
            draft_articles: row.draft_articles.unwrap_or(0),
            active_advertisements: row.active_advertisements.unwrap_or(0),
            active_subscribers: row.active_subscribers.unwrap_or(0),
            total_impressions: row.total_impressions.unwrap_or(0),
            total_clicks: row.total_clicks.unwrap_or(0),
        })
    }
}

/// Helper struct for deserializing stats query results
#[derive(sqlx::FromRow)]
struct StatsRow {
    total_articles: Option<i64>,
    published_articles: Option<i64>,
    scheduled_articles: Option<i64>,
    draft_articles: Option<i64>,
    active_advertisements: Option<i64>,
    active_subscribers: Option<i64>,
    total_impressions: Option<i64>,
    total_clicks: Option<i64>,
}
