use clap::{Parser, Subcommand, ValueEnum};
use newsdesk_core::models::{AdPosition, PageType};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::Level;

/// CLI configuration parsed from command line arguments and environment variables
#[derive(Parser, Debug)]
#[command(name = "newsdesk")]
#[command(author, version, about = "News CMS: REST API, ad delivery and scheduled publishing")]
#[command(after_help = "Examples:
  newsdesk serve --migrate
  newsdesk publish-due
  newsdesk preview-ad in-article --page-type article --page-id city-budget
  newsdesk export --format csv > articles.csv
  newsdesk ad-report")]
pub struct Config {
    /// PostgreSQL database connection URL
    #[arg(long, env = "DATABASE_URL", global = true)]
    pub database_url: Option<String>,

    /// Path to config.toml (defaults to <config dir>/newsdesk/config.toml)
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Log level written to stderr
    #[arg(long, default_value = "info", global = true)]
    pub log_level: Level,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the REST API and the scheduled-publishing sweep
    Serve {
        /// Address to bind (overrides [server].bind)
        #[arg(long)]
        bind: Option<SocketAddr>,

        /// Bearer token for the admin API (overrides [server].admin_token)
        #[arg(long, env = "NEWSDESK_ADMIN_TOKEN", hide_env_values = true)]
        admin_token: Option<String>,

        /// Secret for newsletter unsubscribe tokens (overrides [newsletter].secret)
        #[arg(long, env = "NEWSDESK_NEWSLETTER_SECRET", hide_env_values = true)]
        newsletter_secret: Option<String>,

        /// Apply pending migrations before serving
        #[arg(long)]
        migrate: bool,
    },
    /// Apply pending database migrations
    Migrate,
    /// Publish every scheduled article whose time has come, then exit
    PublishDue,
    /// Show content statistics
    Stats,
    /// Impressions, clicks and click-through rate per advertisement
    AdReport,
    /// Export articles to various formats
    #[command(after_help = "Examples:
  newsdesk export --format jsonl > articles.jsonl
  newsdesk export --format json --limit 100")]
    Export {
        /// Output format for exported data
        #[arg(short, long, default_value = "jsonl")]
        format: ExportFormat,
        /// Maximum number of articles to export
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Ask a running API which ad it would serve for a slot
    #[command(after_help = "Example: newsdesk preview-ad header --page-type homepage")]
    PreviewAd {
        /// Slot position (header, footer, in-article, before-content, ...)
        position: AdPosition,
        /// Page type the slot is rendered on
        #[arg(long, default_value = "global")]
        page_type: PageType,
        /// Specific page (article slug, category slug, ...)
        #[arg(long)]
        page_id: Option<String>,
        /// Base URL of the Newsdesk API
        #[arg(long, env = "NEWSDESK_API_URL", default_value = "http://localhost:8080")]
        api_url: String,
    },
    /// Print the unsubscribe token for a subscriber address
    UnsubscribeToken {
        email: String,
        /// Secret for newsletter unsubscribe tokens (overrides [newsletter].secret)
        #[arg(long, env = "NEWSDESK_NEWSLETTER_SECRET", hide_env_values = true)]
        newsletter_secret: Option<String>,
    },
}

/// Supported export formats
#[derive(Debug, Clone, ValueEnum)]
pub enum ExportFormat {
    /// JSON Lines format (one JSON object per line)
    Jsonl,
    /// Standard JSON array format
    Json,
    /// CSV format (comma-separated values)
    Csv,
}
