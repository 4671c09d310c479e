//! Newsdesk CLI - Command-line interface for the Newsdesk CMS
//!
//! This crate provides the `newsdesk` binary that ties together the API
//! server, the database layer and the ad client.

pub mod config;

pub use config::{Command, Config, ExportFormat};
