use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use sqlx::types::Json;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::AppError;

// =============================================================================
// Advertisement types
// =============================================================================

/// Named placement on a page template where one ad may render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "ad_position", rename_all = "snake_case")]
#[serde(rename_all = "kebab-case")]
pub enum AdPosition {
    Header,
    Footer,
    InArticle,
    BeforeContent,
    AfterContent,
    HomepageFeatured,
    CategoryTop,
}

impl AdPosition {
    pub const ALL: [AdPosition; 7] = [
        AdPosition::Header,
        AdPosition::Footer,
        AdPosition::InArticle,
        AdPosition::BeforeContent,
        AdPosition::AfterContent,
        AdPosition::HomepageFeatured,
        AdPosition::CategoryTop,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AdPosition::Header => "header",
            AdPosition::Footer => "footer",
            AdPosition::InArticle => "in-article",
            AdPosition::BeforeContent => "before-content",
            AdPosition::AfterContent => "after-content",
            AdPosition::HomepageFeatured => "homepage-featured",
            AdPosition::CategoryTop => "category-top",
        }
    }
}

impl fmt::Display for AdPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdPosition {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AdPosition::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| AppError::BadRequest(format!("unknown ad position '{}'", s)))
    }
}

/// Kind of page an ad request originates from.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "page_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PageType {
    #[default]
    Global,
    Homepage,
    Article,
    Category,
    Author,
    Search,
    Tag,
}

impl PageType {
    pub const ALL: [PageType; 7] = [
        PageType::Global,
        PageType::Homepage,
        PageType::Article,
        PageType::Category,
        PageType::Author,
        PageType::Search,
        PageType::Tag,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PageType::Global => "global",
            PageType::Homepage => "homepage",
            PageType::Article => "article",
            PageType::Category => "category",
            PageType::Author => "author",
            PageType::Search => "search",
            PageType::Tag => "tag",
        }
    }
}

impl fmt::Display for PageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PageType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PageType::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| AppError::BadRequest(format!("unknown page type '{}'", s)))
    }
}

/// A `(pageType, pageId?)` pair restricting where an advertisement may appear.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PageTargetRule {
    pub id: Uuid,
    pub advertisement_id: Uuid,
    pub page_type: PageType,
    pub page_id: Option<String>,
}

/// Full row of the `advertisements` table plus its targeting rules.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Advertisement {
    pub id: Uuid,
    pub name: String,
    pub image_url: Option<String>,
    pub link_url: Option<String>,
    pub custom_code: Option<String>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub position: AdPosition,
    pub is_active: bool,
    pub priority: i32,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub impressions: i64,
    pub clicks: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Loaded separately from `ad_page_targets`.
    #[sqlx(skip)]
    #[serde(default)]
    pub targets: Vec<PageTargetRule>,
}

/// Targeting rule as submitted by the admin form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewTargetRule {
    pub page_type: PageType,
    #[serde(default)]
    pub page_id: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_priority() -> i32 {
    5
}

/// Payload used to create or fully replace an advertisement.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAdvertisement {
    pub name: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub link_url: Option<String>,
    #[serde(default)]
    pub custom_code: Option<String>,
    #[serde(default)]
    pub width: Option<i32>,
    #[serde(default)]
    pub height: Option<i32>,
    pub position: AdPosition,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default = "default_priority")]
    pub priority: i32,
    /// Defaults to the moment of creation when omitted.
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub targets: Vec<NewTargetRule>,
}

/// What the display endpoint hands to a page: just enough to render the slot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DisplayAd {
    pub id: Uuid,
    pub name: String,
    pub image_url: Option<String>,
    pub link_url: Option<String>,
    pub custom_code: Option<String>,
    pub width: Option<i32>,
    pub height: Option<i32>,
}

impl From<&Advertisement> for DisplayAd {
    fn from(ad: &Advertisement) -> Self {
        Self {
            id: ad.id,
            name: ad.name.clone(),
            image_url: ad.image_url.clone(),
            link_url: ad.link_url.clone(),
            custom_code: ad.custom_code.clone(),
            width: ad.width,
            height: ad.height,
        }
    }
}

/// Ad interaction recorded by the tracking endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackEvent {
    Impression,
    Click,
}

impl TrackEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackEvent::Impression => "impression",
            TrackEvent::Click => "click",
        }
    }
}

/// Body of `POST /api/advertisements/{id}/track`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackRequest {
    #[serde(rename = "type")]
    pub event: TrackEvent,
}

/// Counter values after a tracking update.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdCounters {
    pub id: Uuid,
    pub impressions: i64,
    pub clicks: i64,
}

// =============================================================================
// Article types
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "article_status", rename_all = "lowercase")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArticleStatus {
    #[default]
    Draft,
    Scheduled,
    Published,
}

impl fmt::Display for ArticleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ArticleStatus::Draft => "DRAFT",
            ArticleStatus::Scheduled => "SCHEDULED",
            ArticleStatus::Published => "PUBLISHED",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub content: String,
    pub cover_image_url: Option<String>,
    pub status: ArticleStatus,
    pub published_at: Option<DateTime<Utc>>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub author_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub is_featured: bool,
    pub views: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Loaded separately from `article_tags`.
    #[sqlx(skip)]
    #[serde(default)]
    pub tags: Vec<Tag>,
}

/// Payload used to create or fully replace an article.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewArticle {
    pub title: String,
    /// Derived from the title when omitted.
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub excerpt: Option<String>,
    pub content: String,
    #[serde(default)]
    pub cover_image_url: Option<String>,
    #[serde(default)]
    pub status: ArticleStatus,
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub author_id: Option<Uuid>,
    #[serde(default)]
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub tag_ids: Vec<Uuid>,
}

/// Body of `POST /api/articles/{id}/status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub status: ArticleStatus,
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
}

/// Admin listing filter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleFilter {
    #[serde(default)]
    pub status: Option<ArticleStatus>,
    #[serde(default)]
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
}

// =============================================================================
// Taxonomy, people and site structure
// =============================================================================

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub parent_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCategory {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTag {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "author_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AuthorRole {
    Admin,
    Editor,
    #[default]
    Author,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub role: AuthorRole,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAuthor {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub role: AuthorRole,
}

/// Static page (about, contact, imprint...).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPage {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    pub content: String,
    #[serde(default)]
    pub is_published: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "nav_location", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NavLocation {
    #[default]
    Header,
    Footer,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NavigationLink {
    pub id: Uuid,
    pub label: String,
    pub url: String,
    pub location: NavLocation,
    pub sort_order: i32,
    pub open_in_new_tab: bool,
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNavigationLink {
    pub label: String,
    pub url: String,
    #[serde(default)]
    pub location: NavLocation,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default)]
    pub open_in_new_tab: bool,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
}

// =============================================================================
// Newsletter, media and settings
// =============================================================================

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Subscriber {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub is_active: bool,
    pub subscribed_at: DateTime<Utc>,
    pub unsubscribed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscribeRequest {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnsubscribeRequest {
    pub email: String,
    pub token: String,
}

/// Metadata for an uploaded asset. The bytes live elsewhere (CDN, bucket).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    pub id: Uuid,
    pub url: String,
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub alt_text: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMediaItem {
    pub url: String,
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: i64,
    #[serde(default)]
    pub alt_text: Option<String>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Setting {
    pub key: String,
    pub value: Json<serde_json::Value>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Reporting
// =============================================================================

/// Aggregated content counts for the dashboard and `newsdesk stats`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContentStats {
    pub total_articles: i64,
    pub published_articles: i64,
    pub scheduled_articles: i64,
    pub draft_articles: i64,
    pub active_advertisements: i64,
    pub active_subscribers: i64,
    pub total_impressions: i64,
    pub total_clicks: i64,
}

/// One line of the advertisement performance report.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdPerformance {
    pub id: Uuid,
    pub name: String,
    pub position: AdPosition,
    pub is_active: bool,
    pub impressions: i64,
    pub clicks: i64,
}

impl AdPerformance {
    /// Click-through rate as a fraction in `0.0..=1.0`. Zero when never shown.
    pub fn click_through_rate(&self) -> f64 {
        if self.impressions <= 0 {
            0.0
        } else {
            self.clicks as f64 / self.impressions as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ad_position_round_trips_through_str() {
        for position in AdPosition::ALL {
            assert_eq!(position.as_str().parse::<AdPosition>().unwrap(), position);
        }
        assert!("sidebar".parse::<AdPosition>().is_err());
    }

    #[test]
    fn test_ad_position_serde_matches_as_str() {
        let value = serde_json::to_value(AdPosition::HomepageFeatured).unwrap();
        assert_eq!(value, json!("homepage-featured"));
    }

    #[test]
    fn test_page_type_defaults_to_global() {
        assert_eq!(PageType::default(), PageType::Global);
        assert_eq!("tag".parse::<PageType>().unwrap(), PageType::Tag);
    }

    #[test]
    fn test_new_advertisement_defaults() {
        let ad: NewAdvertisement = serde_json::from_value(json!({
            "name": "Leaderboard",
            "imageUrl": "https://cdn.example.com/banner.png",
            "position": "header"
        }))
        .unwrap();

        assert!(ad.is_active);
        assert_eq!(ad.priority, 5);
        assert!(ad.start_date.is_none());
        assert!(ad.targets.is_empty());
    }

    #[test]
    fn test_track_request_uses_type_field() {
        let req: TrackRequest = serde_json::from_str(r#"{"type":"click"}"#).unwrap();
        assert_eq!(req.event, TrackEvent::Click);
        assert!(serde_json::from_str::<TrackRequest>(r#"{"type":"hover"}"#).is_err());
    }

    #[test]
    fn test_article_status_wire_format() {
        let status: ArticleStatus = serde_json::from_str(r#""SCHEDULED""#).unwrap();
        assert_eq!(status, ArticleStatus::Scheduled);
        assert_eq!(ArticleStatus::default(), ArticleStatus::Draft);
    }

    #[test]
    fn test_click_through_rate() {
        let mut perf = AdPerformance {
            id: Uuid::new_v4(),
            name: "Sidebar".to_string(),
            position: AdPosition::Footer,
            is_active: true,
            impressions: 0,
            clicks: 0,
        };
        assert_eq!(perf.click_through_rate(), 0.0);

        perf.impressions = 200;
        perf.clicks = 5;
        assert!((perf.click_through_rate() - 0.025).abs() < f64::EPSILON);
    }
}
