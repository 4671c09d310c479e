//! Ad delivery rules.
//!
//! This module holds the pure selection logic for ad slots: which
//! advertisements are eligible for a page context and which one wins. It does
//! no I/O; the repository narrows candidates in SQL and the server feeds them
//! through [`select_ad`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::models::{AdPosition, Advertisement, PageTargetRule, PageType};

/// The slot and page an ad is requested for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdContext {
    pub position: AdPosition,
    #[serde(default)]
    pub page_type: PageType,
    #[serde(default)]
    pub page_id: Option<String>,
}

impl AdContext {
    pub fn new(position: AdPosition, page_type: PageType, page_id: Option<String>) -> Self {
        Self {
            position,
            page_type,
            page_id: page_id.filter(|id| !id.is_empty()),
        }
    }
}

impl PageTargetRule {
    /// Whether this rule admits the given page.
    ///
    /// `global` rules match every page. Otherwise the page type must match, and
    /// a rule with a page id only matches that one page.
    pub fn matches(&self, ctx: &AdContext) -> bool {
        if self.page_type == PageType::Global {
            return true;
        }
        if self.page_type != ctx.page_type {
            return false;
        }
        match &self.page_id {
            None => true,
            Some(id) => ctx.page_id.as_deref() == Some(id.as_str()),
        }
    }
}

/// Whether `now` falls inside `[start_date, end_date]`. An open end date never expires.
pub fn is_within_schedule(ad: &Advertisement, now: DateTime<Utc>) -> bool {
    ad.start_date <= now && ad.end_date.is_none_or(|end| now <= end)
}

/// An ad with no rules runs everywhere; otherwise any matching rule admits it.
pub fn matches_targeting(ad: &Advertisement, ctx: &AdContext) -> bool {
    ad.targets.is_empty() || ad.targets.iter().any(|rule| rule.matches(ctx))
}

/// Full eligibility check for one advertisement.
pub fn is_eligible(ad: &Advertisement, ctx: &AdContext, now: DateTime<Utc>) -> bool {
    ad.is_active
        && ad.position == ctx.position
        && is_within_schedule(ad, now)
        && matches_targeting(ad, ctx)
}

/// Delivery order: higher priority first, then fewer impressions, then the
/// older ad, then id so the order is total.
pub fn delivery_order(a: &Advertisement, b: &Advertisement) -> Ordering {
    b.priority
        .cmp(&a.priority)
        .then_with(|| a.impressions.cmp(&b.impressions))
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

/// Picks the ad to serve for `ctx`, or `None` when nothing is eligible.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use newsdesk_core::delivery::{select_ad, AdContext};
/// use newsdesk_core::models::{AdPosition, PageType};
///
/// let ctx = AdContext::new(AdPosition::Header, PageType::Homepage, None);
/// assert!(select_ad(&[], &ctx, Utc::now()).is_none());
/// ```
pub fn select_ad<'a>(
    candidates: &'a [Advertisement],
    ctx: &AdContext,
    now: DateTime<Utc>,
) -> Option<&'a Advertisement> {
    candidates
        .iter()
        .filter(|ad| is_eligible(ad, ctx, now))
        .min_by(|a, b| delivery_order(a, b))
}

/// Counts of why candidates were dropped, logged at debug level by the server.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SelectionStats {
    pub inactive: usize,
    pub out_of_schedule: usize,
    pub wrong_position: usize,
    pub untargeted: usize,
    pub eligible: usize,
}

impl SelectionStats {
    /// Classifies every candidate against `ctx`.
    pub fn collect(candidates: &[Advertisement], ctx: &AdContext, now: DateTime<Utc>) -> Self {
        let mut stats = Self::default();
        for ad in candidates {
            if !ad.is_active {
                stats.inactive += 1;
            } else if ad.position != ctx.position {
                stats.wrong_position += 1;
            } else if !is_within_schedule(ad, now) {
                stats.out_of_schedule += 1;
            } else if !matches_targeting(ad, ctx) {
                stats.untargeted += 1;
            } else {
                stats.eligible += 1;
            }
        }
        stats
    }

    pub fn total(&self) -> usize {
        self.inactive + self.out_of_schedule + self.wrong_position + self.untargeted + self.eligible
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    fn ad(priority: i32) -> Advertisement {
        let now = Utc::now();
        Advertisement {
            id: Uuid::new_v4(),
            name: format!("ad-{}", priority),
            image_url: Some("https://cdn.example.com/a.png".to_string()),
            link_url: None,
            custom_code: None,
            width: Some(728),
            height: Some(90),
            position: AdPosition::Header,
            is_active: true,
            priority,
            start_date: now - Duration::days(1),
            end_date: None,
            impressions: 0,
            clicks: 0,
            created_at: now - Duration::days(1),
            updated_at: now - Duration::days(1),
            targets: vec![],
        }
    }

    fn rule(ad: &Advertisement, page_type: PageType, page_id: Option<&str>) -> PageTargetRule {
        PageTargetRule {
            id: Uuid::new_v4(),
            advertisement_id: ad.id,
            page_type,
            page_id: page_id.map(str::to_string),
        }
    }

    fn header(page_type: PageType, page_id: Option<&str>) -> AdContext {
        AdContext::new(AdPosition::Header, page_type, page_id.map(str::to_string))
    }

    #[test]
    fn test_inactive_ad_never_selected() {
        let mut inactive = ad(10);
        inactive.is_active = false;
        let ads = vec![inactive];
        assert!(select_ad(&ads, &header(PageType::Global, None), Utc::now()).is_none());
    }

    #[test]
    fn test_expired_ad_never_selected() {
        let now = Utc::now();
        let mut expired = ad(10);
        expired.end_date = Some(now - Duration::minutes(1));
        let ads = vec![expired];
        assert!(select_ad(&ads, &header(PageType::Global, None), now).is_none());
    }

    #[test]
    fn test_future_ad_not_selected() {
        let now = Utc::now();
        let mut upcoming = ad(10);
        upcoming.start_date = now + Duration::hours(1);
        let ads = vec![upcoming];
        assert!(select_ad(&ads, &header(PageType::Global, None), now).is_none());
    }

    #[test]
    fn test_end_date_is_inclusive() {
        let now = Utc::now();
        let mut last_day = ad(3);
        last_day.end_date = Some(now);
        assert!(is_within_schedule(&last_day, now));
    }

    #[test]
    fn test_highest_priority_wins() {
        let low = ad(5);
        let high = ad(8);
        let high_id = high.id;
        let ads = vec![low, high];
        let chosen = select_ad(&ads, &header(PageType::Homepage, None), Utc::now()).unwrap();
        assert_eq!(chosen.id, high_id);
    }

    #[test]
    fn test_priority_tie_prefers_fewer_impressions() {
        let mut busy = ad(7);
        busy.impressions = 500;
        let fresh = ad(7);
        let fresh_id = fresh.id;
        let ads = vec![busy, fresh];
        let chosen = select_ad(&ads, &header(PageType::Global, None), Utc::now()).unwrap();
        assert_eq!(chosen.id, fresh_id);
    }

    #[test]
    fn test_priority_tie_then_older_ad() {
        let now = Utc::now();
        let mut older = ad(7);
        older.created_at = now - Duration::days(30);
        let older_id = older.id;
        let newer = ad(7);
        let ads = vec![newer, older];
        let chosen = select_ad(&ads, &header(PageType::Global, None), now).unwrap();
        assert_eq!(chosen.id, older_id);
    }

    #[test]
    fn test_wrong_position_not_selected() {
        let mut footer = ad(9);
        footer.position = AdPosition::Footer;
        let ads = vec![footer];
        assert!(select_ad(&ads, &header(PageType::Global, None), Utc::now()).is_none());
    }

    #[test]
    fn test_ad_without_rules_runs_everywhere() {
        let ads = vec![ad(1)];
        assert!(select_ad(&ads, &header(PageType::Article, Some("x")), Utc::now()).is_some());
        assert!(select_ad(&ads, &header(PageType::Search, None), Utc::now()).is_some());
    }

    #[test]
    fn test_page_type_rule() {
        let mut article_only = ad(4);
        article_only.targets = vec![rule(&article_only, PageType::Article, None)];

        assert!(matches_targeting(&article_only, &header(PageType::Article, Some("any-slug"))));
        assert!(!matches_targeting(&article_only, &header(PageType::Category, None)));
        assert!(!matches_targeting(&article_only, &header(PageType::Global, None)));
    }

    #[test]
    fn test_specific_page_rule() {
        let mut one_page = ad(4);
        one_page.targets = vec![rule(&one_page, PageType::Category, Some("politics"))];

        assert!(matches_targeting(&one_page, &header(PageType::Category, Some("politics"))));
        assert!(!matches_targeting(&one_page, &header(PageType::Category, Some("sport"))));
        assert!(!matches_targeting(&one_page, &header(PageType::Category, None)));
    }

    #[test]
    fn test_generic_and_specific_rules_union() {
        let mut mixed = ad(4);
        mixed.targets = vec![
            rule(&mixed, PageType::Article, None),
            rule(&mixed, PageType::Category, Some("politics")),
        ];

        assert!(matches_targeting(&mixed, &header(PageType::Article, Some("a"))));
        assert!(matches_targeting(&mixed, &header(PageType::Category, Some("politics"))));
        assert!(!matches_targeting(&mixed, &header(PageType::Category, Some("sport"))));
    }

    #[test]
    fn test_global_rule_matches_everything() {
        let mut global = ad(4);
        global.targets = vec![rule(&global, PageType::Global, None)];
        assert!(matches_targeting(&global, &header(PageType::Tag, Some("rust"))));
    }

    #[test]
    fn test_targeted_ad_beats_lower_priority_untargeted() {
        let untargeted = ad(2);
        let mut targeted = ad(9);
        targeted.targets = vec![rule(&targeted, PageType::Article, Some("big-story"))];
        let targeted_id = targeted.id;
        let untargeted_id = untargeted.id;
        let ads = vec![untargeted, targeted];

        let on_story = select_ad(&ads, &header(PageType::Article, Some("big-story")), Utc::now());
        assert_eq!(on_story.unwrap().id, targeted_id);

        let elsewhere = select_ad(&ads, &header(PageType::Article, Some("other")), Utc::now());
        assert_eq!(elsewhere.unwrap().id, untargeted_id);
    }

    #[test]
    fn test_empty_page_id_is_treated_as_absent() {
        let ctx = AdContext::new(AdPosition::Header, PageType::Article, Some(String::new()));
        assert!(ctx.page_id.is_none());
    }

    #[test]
    fn test_selection_stats() {
        let now = Utc::now();
        let mut inactive = ad(1);
        inactive.is_active = false;
        let mut expired = ad(1);
        expired.end_date = Some(now - Duration::days(1));
        let mut footer = ad(1);
        footer.position = AdPosition::Footer;
        let mut untargeted = ad(1);
        untargeted.targets = vec![rule(&untargeted, PageType::Tag, None)];
        let eligible = ad(1);

        let ads = vec![inactive, expired, footer, untargeted, eligible];
        let stats = SelectionStats::collect(&ads, &header(PageType::Homepage, None), now);

        assert_eq!(stats.inactive, 1);
        assert_eq!(stats.out_of_schedule, 1);
        assert_eq!(stats.wrong_position, 1);
        assert_eq!(stats.untargeted, 1);
        assert_eq!(stats.eligible, 1);
        assert_eq!(stats.total(), 5);
    }
}
