//! Newsdesk DB - PostgreSQL repositories.
//!
//! One repository per aggregate, each a cheap clone over the shared pool.
//! [`Database`] bundles them for the server and the CLI.

pub mod advertisements;
pub mod articles;
pub mod media;
pub mod newsletter;
pub mod people;
pub mod site;
pub mod stats;
pub mod taxonomy;

pub use advertisements::AdvertisementRepository;
pub use articles::ArticleRepository;
pub use media::MediaRepository;
pub use newsletter::SubscriberRepository;
pub use people::AuthorRepository;
pub use site::{NavigationRepository, PageRepository, SettingsRepository};
pub use stats::StatsRepository;
pub use taxonomy::{CategoryRepository, TagRepository};

use newsdesk_core::config::DbConfig;
use newsdesk_core::error::AppError;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Embedded schema migrations from `crates/newsdesk-db/migrations`.
pub static MIGRATOR: Migrator = sqlx::migrate!();

/// Opens a connection pool sized by `config`.
pub async fn connect(database_url: &str, config: &DbConfig) -> Result<PgPool, AppError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout())
        .connect(database_url)
        .await
        .map_err(AppError::DatabaseError)?;
    Ok(pool)
}

/// Applies pending migrations.
pub async fn migrate(pool: &PgPool) -> Result<(), AppError> {
    MIGRATOR
        .run(pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.into()))?;
    tracing::info!("Database migrations are up to date");
    Ok(())
}

/// Every repository over one pool.
#[derive(Clone)]
pub struct Database {
    pub pool: PgPool,
    pub advertisements: AdvertisementRepository,
    pub articles: ArticleRepository,
    pub categories: CategoryRepository,
    pub tags: TagRepository,
    pub authors: AuthorRepository,
    pub pages: PageRepository,
    pub navigation: NavigationRepository,
    pub subscribers: SubscriberRepository,
    pub media: MediaRepository,
    pub settings: SettingsRepository,
    pub stats: StatsRepository,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self {
            advertisements: AdvertisementRepository::new(pool.clone()),
            articles: ArticleRepository::new(pool.clone()),
            categories: CategoryRepository::new(pool.clone()),
            tags: TagRepository::new(pool.clone()),
            authors: AuthorRepository::new(pool.clone()),
            pages: PageRepository::new(pool.clone()),
            navigation: NavigationRepository::new(pool.clone()),
            subscribers: SubscriberRepository::new(pool.clone()),
            media: MediaRepository::new(pool.clone()),
            settings: SettingsRepository::new(pool.clone()),
            stats: StatsRepository::new(pool.clone()),
            pool,
        }
    }
}
