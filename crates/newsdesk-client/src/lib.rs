//! Newsdesk Client - HTTP client for the ad delivery API
//!
//! - [`ads`] - typed calls to the display and tracking endpoints
//! - [`slot`] - a fail-soft ad slot for server-side rendering
//!
//! A slot never surfaces errors: when the API is down or returns garbage the
//! page gets a placeholder and the failure is logged.

pub mod ads;
pub mod slot;

pub use ads::NewsdeskClient;
pub use slot::{AdSlot, ClickThrough, ImpressionTracker, SlotContent};
