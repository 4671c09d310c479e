//! Article status transitions and public visibility.

use chrono::{DateTime, Utc};

use crate::error::AppError;
use crate::models::ArticleStatus;
use crate::validation::ValidationErrors;

/// The publishing-related columns of an article.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishState {
    pub status: ArticleStatus,
    pub published_at: Option<DateTime<Utc>>,
    pub scheduled_at: Option<DateTime<Utc>>,
}

impl PublishState {
    /// State of an article that has never been saved.
    pub fn draft() -> Self {
        Self {
            status: ArticleStatus::Draft,
            published_at: None,
            scheduled_at: None,
        }
    }

    /// Moves to `requested`, returning the new column values.
    ///
    /// - PUBLISHED cannot go back to SCHEDULED.
    /// - Entering PUBLISHED stamps `published_at` with `now` unless it is already set.
    /// - Entering SCHEDULED needs a `scheduled_at` strictly after `now`, taken from
    ///   `schedule` or the current value.
    /// - Entering DRAFT clears `scheduled_at` and keeps `published_at`.
    pub fn transition(
        &self,
        requested: ArticleStatus,
        schedule: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<PublishState, AppError> {
        match (self.status, requested) {
            (ArticleStatus::Published, ArticleStatus::Scheduled) => {
                Err(AppError::InvalidTransition {
                    from: self.status,
                    to: requested,
                })
            }
            (_, ArticleStatus::Published) => Ok(PublishState {
                status: ArticleStatus::Published,
                published_at: self.published_at.or(Some(now)),
                scheduled_at: self.scheduled_at,
            }),
            (_, ArticleStatus::Scheduled) => {
                let mut errors = ValidationErrors::new();
                let at = schedule.or(self.scheduled_at);
                match at {
                    None => errors.add("scheduledAt", "is required for scheduled articles"),
                    Some(at) if at <= now => errors.add("scheduledAt", "must be in the future"),
                    Some(_) => {}
                }
                errors.into_result()?;

                Ok(PublishState {
                    status: ArticleStatus::Scheduled,
                    published_at: self.published_at,
                    scheduled_at: at,
                })
            }
            (_, ArticleStatus::Draft) => Ok(PublishState {
                status: ArticleStatus::Draft,
                published_at: self.published_at,
                scheduled_at: None,
            }),
        }
    }

    /// Whether the scheduled-publishing sweep should flip this article now.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status == ArticleStatus::Scheduled && self.scheduled_at.is_some_and(|at| at <= now)
    }

    /// Whether public listings include the article at `now`.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        is_live(self.status, self.scheduled_at, now)
    }
}

/// An article is live once PUBLISHED, or once its scheduled time has passed
/// even if the sweep has not flipped it yet.
pub fn is_live(
    status: ArticleStatus,
    scheduled_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> bool {
    match status {
        ArticleStatus::Published => true,
        ArticleStatus::Scheduled => scheduled_at.is_some_and(|at| at <= now),
        ArticleStatus::Draft => false,
    }
}

/// Outcome of one scheduled-publishing sweep.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepOutcome {
    pub published: usize,
}
