//! Scheduled-publishing sweep.

use std::time::Duration;

use chrono::Utc;
use newsdesk_core::error::AppError;
use newsdesk_core::publishing::SweepOutcome;
use newsdesk_db::ArticleRepository;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Publishes every SCHEDULED article whose time has come.
pub async fn run_sweep(articles: &ArticleRepository) -> Result<SweepOutcome, AppError> {
    let published = articles.publish_due(Utc::now()).await?;
    for id in &published {
        tracing::info!(article_id = %id, "Scheduled article published");
    }
    Ok(SweepOutcome {
        published: published.len(),
    })
}

/// Runs [`run_sweep`] every `period` until the handle is aborted.
///
/// Failures are logged and retried on the next tick.
pub fn spawn_sweeper(articles: ArticleRepository, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            match run_sweep(&articles).await {
                Ok(outcome) if outcome.published > 0 => {
                    tracing::info!(published = outcome.published, "Publishing sweep finished");
                }
                Ok(_) => tracing::trace!("Publishing sweep found nothing due"),
                Err(e) => tracing::warn!(error = %e, "Publishing sweep failed"),
            }
        }
    })
}
