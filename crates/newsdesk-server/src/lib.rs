//! Newsdesk Server - REST API over axum.
//!
//! Admin CRUD for every content type, public read endpoints for the site,
//! the ad display/tracking endpoints and the scheduled-publishing sweep.

pub mod error;
pub mod middleware;
pub mod publisher;
pub mod routes;
pub mod server;
pub mod state;

pub use error::{ApiError, ApiResult, ErrorResponse};
pub use publisher::{run_sweep, spawn_sweeper};
pub use routes::create_router;
pub use server::NewsdeskServer;
pub use state::AppState;
