//! HTTP server wiring: layers, background tasks and graceful shutdown.

use std::future::Future;
use std::net::SocketAddr;

use axum::Router;
use newsdesk_core::config::{PublishConfig, ServerConfig};
use newsdesk_core::error::AppError;
use newsdesk_db::Database;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::publisher::spawn_sweeper;
use crate::routes::create_router;
use crate::state::AppState;

/// Main Newsdesk server
pub struct NewsdeskServer {
    config: ServerConfig,
    publishing: PublishConfig,
    state: AppState,
}

impl NewsdeskServer {
    pub fn new(
        db: Database,
        config: ServerConfig,
        publishing: PublishConfig,
        newsletter_secret: String,
    ) -> Self {
        if config.admin_token.as_deref().is_none_or(str::is_empty) {
            tracing::warn!("No admin token configured; the admin API is open");
        }
        let state = AppState::new(db, config.admin_token.clone(), newsletter_secret);
        Self {
            config,
            publishing,
            state,
        }
    }

    /// Get the application state
    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    pub fn bind_address(&self) -> SocketAddr {
        self.config.bind
    }

    /// Build the router with all routes and the configured layers
    pub fn build_router(&self) -> Router {
        let mut router = create_router(self.state.clone());

        if self.config.cors {
            router = router.layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            );
        }

        if self.config.request_logging {
            router = router.layer(TraceLayer::new_for_http());
        }

        router
    }

    /// Serves until `shutdown_signal` resolves, running the publishing sweep
    /// alongside when enabled.
    pub async fn start_with_shutdown(
        &self,
        shutdown_signal: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), AppError> {
        let router = self.build_router();
        let addr = self.config.bind;

        let sweeper = self.publishing.sweep_interval().map(|period| {
            tracing::info!(interval_secs = period.as_secs(), "Publishing sweep enabled");
            spawn_sweeper(self.state.db.articles.clone(), period)
        });

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| AppError::ConfigError(format!("failed to bind {}: {}", addr, e)))?;
        tracing::info!("Newsdesk API listening on http://{}", addr);

        let result = axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal)
            .await;

        if let Some(handle) = sweeper {
            handle.abort();
        }
        result.map_err(|e| AppError::Generic(format!("server error: {}", e)))?;

        tracing::info!("Newsdesk API shutdown complete");
        Ok(())
    }
}
