use std::sync::Arc;
use std::time::Instant;

use newsdesk_db::Database;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Repositories over the shared pool
    pub db: Database,

    /// Bearer token for the admin API, if any
    pub admin_token: Option<Arc<str>>,

    /// Secret mixed into newsletter unsubscribe tokens
    pub newsletter_secret: Arc<str>,

    /// Server start time
    pub start_time: Instant,
}

impl AppState {
    pub fn new(db: Database, admin_token: Option<String>, newsletter_secret: String) -> Self {
        Self {
            db,
            admin_token: admin_token.filter(|t| !t.is_empty()).map(Arc::from),
            newsletter_secret: Arc::from(newsletter_secret),
            start_time: Instant::now(),
        }
    }
}
