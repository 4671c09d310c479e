//! Advertisement repository: admin CRUD, slot candidates and counters.

use chrono::{DateTime, Utc};
use newsdesk_core::error::AppError;
use newsdesk_core::models::{
    AdCounters, AdPerformance, AdPosition, Advertisement, NewAdvertisement, PageTargetRule,
    TrackEvent,
};
use sqlx::{PgPool, Pool, Postgres, Transaction};
use std::collections::HashMap;
use uuid::Uuid;

/// Column list for SELECT queries. Must remain a const literal to ensure SQL safety
/// since format!() bypasses sqlx compile-time validation.
const AD_COLUMNS: &str = "id, name, image_url, link_url, custom_code, width, height, position, is_active, priority, start_date, end_date, impressions, clicks, created_at, updated_at";

/// Repository for advertisements and their page-targeting rules.
///
/// # Examples
///
/// ```no_run
/// use sqlx::postgres::PgPoolOptions;
/// use newsdesk_db::AdvertisementRepository;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = PgPoolOptions::new()
///     .max_connections(5)
///     .connect("postgresql://localhost/newsdesk")
///     .await?;
///
/// let repo = AdvertisementRepository::new(pool);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct AdvertisementRepository {
    pool: Pool<Postgres>,
}

impl AdvertisementRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All advertisements, highest priority first, with their rules.
    pub async fn list(&self) -> Result<Vec<Advertisement>, AppError> {
        let query = format!(
            "SELECT {} FROM advertisements ORDER BY priority DESC, created_at DESC",
            AD_COLUMNS
        );
        let ads = sqlx::query_as::<_, Advertisement>(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::DatabaseError)?;

        self.attach_targets(ads).await
    }

    /// Retrieves an advertisement by UUID.
    pub async fn get(&self, id: Uuid) -> Result<Option<Advertisement>, AppError> {
        let query = format!("SELECT {} FROM advertisements WHERE id = $1", AD_COLUMNS);
        let ad = sqlx::query_as::<_, Advertisement>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::DatabaseError)?;

        match ad {
            Some(ad) => Ok(self.attach_targets(vec![ad]).await?.pop()),
            None => Ok(None),
        }
    }

    /// Inserts an advertisement and its targeting rules in one transaction.
    pub async fn create(&self, new_ad: &NewAdvertisement) -> Result<Advertisement, AppError> {
        let id = Uuid::new_v4();
        let start_date = new_ad.start_date.unwrap_or_else(Utc::now);

        let mut tx = self.pool.begin().await.map_err(AppError::DatabaseError)?;

        let query = format!(
            r#"
            INSERT INTO advertisements (
                id, name, image_url, link_url, custom_code, width, height,
                position, is_active, priority, start_date, end_date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {}
            "#,
            AD_COLUMNS
        );
        let mut ad = sqlx::query_as::<_, Advertisement>(&query)
            .bind(id)
            .bind(&new_ad.name)
            .bind(&new_ad.image_url)
            .bind(&new_ad.link_url)
            .bind(&new_ad.custom_code)
            .bind(new_ad.width)
            .bind(new_ad.height)
            .bind(new_ad.position)
            .bind(new_ad.is_active)
            .bind(new_ad.priority)
            .bind(start_date)
            .bind(new_ad.end_date)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| AppError::from_write(e, "Advertisement"))?;

        ad.targets = insert_targets(&mut tx, id, new_ad).await?;
        tx.commit().await.map_err(AppError::DatabaseError)?;

        tracing::info!(ad_id = %id, position = %ad.position, "Advertisement created");
        Ok(ad)
    }

    /// Replaces every editable field and the full rule set. `None` if the id is unknown.
    pub async fn update(
        &self,
        id: Uuid,
        new_ad: &NewAdvertisement,
    ) -> Result<Option<Advertisement>, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::DatabaseError)?;

        let query = format!(
            r#"
            UPDATE advertisements SET
                name = $2,
                image_url = $3,
                link_url = $4,
                custom_code = $5,
                width = $6,
                height = $7,
                position = $8,
                is_active = $9,
                priority = $10,
                start_date = COALESCE($11, start_date),
                end_date = $12,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            AD_COLUMNS
        );
        let ad = sqlx::query_as::<_, Advertisement>(&query)
            .bind(id)
            .bind(&new_ad.name)
            .bind(&new_ad.image_url)
            .bind(&new_ad.link_url)
            .bind(&new_ad.custom_code)
            .bind(new_ad.width)
            .bind(new_ad.height)
            .bind(new_ad.position)
            .bind(new_ad.is_active)
            .bind(new_ad.priority)
            .bind(new_ad.start_date)
            .bind(new_ad.end_date)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| AppError::from_write(e, "Advertisement"))?;

        let Some(mut ad) = ad else {
            return Ok(None);
        };

        sqlx::query("DELETE FROM ad_page_targets WHERE advertisement_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::DatabaseError)?;
        ad.targets = insert_targets(&mut tx, id, new_ad).await?;

        tx.commit().await.map_err(AppError::DatabaseError)?;
        Ok(Some(ad))
    }

    /// Deletes an advertisement; its rules go with it (`ON DELETE CASCADE`).
    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM advertisements WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::DatabaseError)?;

        Ok(result.rows_affected() > 0)
    }

    /// Flips `is_active`. Returns the updated advertisement.
    pub async fn toggle(&self, id: Uuid) -> Result<Option<Advertisement>, AppError> {
        let query = format!(
            "UPDATE advertisements SET is_active = NOT is_active, updated_at = NOW() WHERE id = $1 RETURNING {}",
            AD_COLUMNS
        );
        let ad = sqlx::query_as::<_, Advertisement>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::DatabaseError)?;

        match ad {
            Some(ad) => Ok(self.attach_targets(vec![ad]).await?.pop()),
            None => Ok(None),
        }
    }

    /// Active ads for `position` whose date window contains `now`, with rules loaded.
    ///
    /// Targeting and ranking happen in `newsdesk_core::delivery::select_ad`.
    pub async fn candidates(
        &self,
        position: AdPosition,
        now: DateTime<Utc>,
    ) -> Result<Vec<Advertisement>, AppError> {
        let query = format!(
            r#"
            SELECT {} FROM advertisements
            WHERE position = $1
              AND is_active
              AND start_date <= $2
              AND (end_date IS NULL OR end_date >= $2)
            ORDER BY priority DESC
            "#,
            AD_COLUMNS
        );
        let ads = sqlx::query_as::<_, Advertisement>(&query)
            .bind(position)
            .bind(now)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::DatabaseError)?;

        self.attach_targets(ads).await
    }

    /// Atomically bumps the counter for `event`. `None` if the id is unknown.
    ///
    /// A single `UPDATE ... SET col = col + 1` so concurrent events never lose updates.
    pub async fn record(
        &self,
        id: Uuid,
        event: TrackEvent,
    ) -> Result<Option<AdCounters>, AppError> {
        let sql = match event {
            TrackEvent::Impression => {
                "UPDATE advertisements SET impressions = impressions + 1 WHERE id = $1 RETURNING id, impressions, clicks"
            }
            TrackEvent::Click => {
                "UPDATE advertisements SET clicks = clicks + 1 WHERE id = $1 RETURNING id, impressions, clicks"
            }
        };

        let counters = sqlx::query_as::<_, AdCounters>(sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::DatabaseError)?;

        Ok(counters)
    }

    /// Impressions and clicks per advertisement, busiest first.
    pub async fn performance(&self) -> Result<Vec<AdPerformance>, AppError> {
        let rows = sqlx::query_as::<_, AdPerformance>(
            r#"
            SELECT id, name, position, is_active, impressions, clicks
            FROM advertisements
            ORDER BY impressions DESC, name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::DatabaseError)?;

        Ok(rows)
    }

    async fn attach_targets(
        &self,
        mut ads: Vec<Advertisement>,
    ) -> Result<Vec<Advertisement>, AppError> {
        if ads.is_empty() {
            return Ok(ads);
        }

        let ids: Vec<Uuid> = ads.iter().map(|ad| ad.id).collect();
        let rules: Vec<PageTargetRule> = sqlx::query_as(
            r#"
            SELECT id, advertisement_id, page_type, page_id
            FROM ad_page_targets
            WHERE advertisement_id = ANY($1)
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::DatabaseError)?;

        let mut by_ad: HashMap<Uuid, Vec<PageTargetRule>> = HashMap::new();
        for rule in rules {
            by_ad.entry(rule.advertisement_id).or_default().push(rule);
        }
        for ad in &mut ads {
            ad.targets = by_ad.remove(&ad.id).unwrap_or_default();
        }

        Ok(ads)
    }
}

async fn insert_targets(
    tx: &mut Transaction<'_, Postgres>,
    ad_id: Uuid,
    new_ad: &NewAdvertisement,
) -> Result<Vec<PageTargetRule>, AppError> {
    let mut targets = Vec::with_capacity(new_ad.targets.len());
    for rule in &new_ad.targets {
        let page_id = rule
            .page_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        let inserted: PageTargetRule = sqlx::query_as(
            r#"
            INSERT INTO ad_page_targets (id, advertisement_id, page_type, page_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, advertisement_id, page_type, page_id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(ad_id)
        .bind(rule.page_type)
        .bind(page_id)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| AppError::from_write(e, "Targeting rule"))?;
        targets.push(inserted);
    }
    Ok(targets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, SubsecRound};
    use newsdesk_core::models::{NewTargetRule, PageType};

    fn new_ad(name: &str) -> NewAdvertisement {
        NewAdvertisement {
            name: name.to_string(),
            image_url: Some("https://cdn.example.com/leaderboard.png".to_string()),
            link_url: Some("https://sponsor.example.com".to_string()),
            custom_code: None,
            width: Some(728),
            height: Some(90),
            position: AdPosition::Header,
            is_active: true,
            priority: 5,
            start_date: None,
            end_date: None,
            targets: vec![],
        }
    }

    #[sqlx::test]
    async fn test_create_then_get_returns_submitted_fields(pool: PgPool) {
        let repo = AdvertisementRepository::new(pool);
        let start = Utc::now().trunc_subsecs(0) - Duration::hours(1);
        let end = start + Duration::days(30);
        let mut submitted = new_ad("Spring sale");
        submitted.position = AdPosition::InArticle;
        submitted.priority = 8;
        submitted.start_date = Some(start);
        submitted.end_date = Some(end);
        submitted.targets = vec![NewTargetRule {
            page_type: PageType::Article,
            page_id: Some("city-budget".to_string()),
        }];

        let created = repo.create(&submitted).await.unwrap();
        let fetched = repo.get(created.id).await.unwrap().unwrap();

        assert_eq!(fetched.name, "Spring sale");
        assert_eq!(fetched.image_url, submitted.image_url);
        assert_eq!(fetched.link_url, submitted.link_url);
        assert_eq!(fetched.width, Some(728));
        assert_eq!(fetched.height, Some(90));
        assert_eq!(fetched.position, AdPosition::InArticle);
        assert!(fetched.is_active);
        assert_eq!(fetched.priority, 8);
        assert_eq!(fetched.start_date, start);
        assert_eq!(fetched.end_date, Some(end));
        assert_eq!((fetched.impressions, fetched.clicks), (0, 0));
        assert_eq!(fetched.targets.len(), 1);
        assert_eq!(fetched.targets[0].page_type, PageType::Article);
        assert_eq!(fetched.targets[0].page_id.as_deref(), Some("city-budget"));
    }

    #[sqlx::test]
    async fn test_candidates_skip_inactive_expired_and_future(pool: PgPool) {
        let repo = AdvertisementRepository::new(pool);
        let now = Utc::now();

        let live = repo.create(&new_ad("Live")).await.unwrap();

        let mut inactive = new_ad("Paused");
        inactive.is_active = false;
        repo.create(&inactive).await.unwrap();

        let mut expired = new_ad("Expired");
        expired.start_date = Some(now - Duration::days(10));
        expired.end_date = Some(now - Duration::days(1));
        repo.create(&expired).await.unwrap();

        let mut upcoming = new_ad("Upcoming");
        upcoming.start_date = Some(now + Duration::days(1));
        repo.create(&upcoming).await.unwrap();

        let mut other_slot = new_ad("Footer");
        other_slot.position = AdPosition::Footer;
        repo.create(&other_slot).await.unwrap();

        let candidates = repo
            .candidates(AdPosition::Header, now + Duration::seconds(1))
            .await
            .unwrap();
        let ids: Vec<Uuid> = candidates.iter().map(|ad| ad.id).collect();
        assert_eq!(ids, vec![live.id]);
    }

    #[sqlx::test]
    async fn test_concurrent_impressions_are_all_counted(pool: PgPool) {
        let repo = AdvertisementRepository::new(pool);
        let id = repo.create(&new_ad("Busy slot")).await.unwrap().id;

        const EVENTS: i64 = 25;
        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..EVENTS {
            let repo = repo.clone();
            tasks.spawn(async move { repo.record(id, TrackEvent::Impression).await });
        }
        while let Some(result) = tasks.join_next().await {
            assert!(result.unwrap().unwrap().is_some());
        }

        let counters = repo.record(id, TrackEvent::Click).await.unwrap().unwrap();
        assert_eq!(counters.impressions, EVENTS);
        assert_eq!(counters.clicks, 1);
    }

    #[sqlx::test]
    async fn test_record_unknown_ad(pool: PgPool) {
        let repo = AdvertisementRepository::new(pool);
        let counters = repo.record(Uuid::new_v4(), TrackEvent::Impression).await.unwrap();
        assert!(counters.is_none());
    }
}
