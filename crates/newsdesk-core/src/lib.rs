//! Newsdesk Core - Domain types, ad delivery and publishing rules, error handling, and configuration.

pub mod config;
pub mod delivery;
pub mod error;
pub mod models;
pub mod newsletter;
pub mod publishing;
pub mod secret;
pub mod validation;

pub use config::{
    default_config_path, load_config, DbConfig, HttpConfig, NewsdeskConfig, NewsletterConfig,
    PublishConfig, ServerConfig,
};
pub use delivery::{select_ad, AdContext, SelectionStats};
pub use error::AppError;
pub use models::{
    AdCounters, AdPerformance, AdPosition, Advertisement, Article, ArticleFilter, ArticleStatus,
    Author, Category, ContentStats, DisplayAd, MediaItem, NavigationLink, NewAdvertisement,
    NewArticle, NewAuthor, NewCategory, NewMediaItem, NewNavigationLink, NewPage, NewTag,
    NewTargetRule, Page, PageTargetRule, PageType, Setting, StatusUpdate, Subscriber, Tag,
    TrackEvent, TrackRequest,
};
pub use publishing::{is_live, PublishState, SweepOutcome};
pub use secret::secure_eq;
pub use validation::{slugify, ValidationErrors};
