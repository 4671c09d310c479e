use anyhow::Context;
use clap::Parser;
use dotenvy::dotenv;
use tracing::{info, warn};
use tracing_subscriber::FmtSubscriber;

use newsdesk_cli::{Command, Config, ExportFormat};
use newsdesk_client::NewsdeskClient;
use newsdesk_core::config::{HttpConfig, NewsdeskConfig};
use newsdesk_core::delivery::AdContext;
use newsdesk_core::error::AppError;
use newsdesk_core::models::{AdPerformance, Article};
use newsdesk_core::newsletter::unsubscribe_token;
use newsdesk_db::Database;
use newsdesk_server::{run_sweep, NewsdeskServer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    // Parse command line arguments
    let config = Config::parse();

    // Setup logging (stderr to keep stdout clean for exports)
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install the log subscriber")?;

    if let Err(err) = run(config).await {
        if let Some(app_err) = err.downcast_ref::<AppError>() {
            eprintln!("\n❌ {}\n", app_err.user_message());
        }
        return Err(err);
    }
    Ok(())
}

async fn run(config: Config) -> anyhow::Result<()> {
    let file_config = newsdesk_core::config::load_config(config.config.as_deref())
        .context("Failed to load configuration")?;

    match config.command {
        Command::Serve {
            bind,
            admin_token,
            newsletter_secret,
            migrate,
        } => {
            let db = connect(config.database_url.as_deref(), &file_config).await?;
            if migrate {
                newsdesk_db::migrate(&db.pool)
                    .await
                    .context("Failed to apply migrations")?;
            }
            serve(db, file_config, bind, admin_token, newsletter_secret).await?;
        }
        Command::Migrate => {
            let db = connect(config.database_url.as_deref(), &file_config).await?;
            newsdesk_db::migrate(&db.pool)
                .await
                .context("Failed to apply migrations")?;
            println!("✓ Database schema is up to date");
        }
        Command::PublishDue => {
            let db = connect(config.database_url.as_deref(), &file_config).await?;
            let outcome = run_sweep(&db.articles)
                .await
                .context("Publishing sweep failed")?;
            println!("✓ Published {} scheduled article(s)", outcome.published);
        }
        Command::Stats => {
            let db = connect(config.database_url.as_deref(), &file_config).await?;
            show_stats(&db).await?;
        }
        Command::AdReport => {
            let db = connect(config.database_url.as_deref(), &file_config).await?;
            ad_report(&db).await?;
        }
        Command::Export { format, limit } => {
            let db = connect(config.database_url.as_deref(), &file_config).await?;
            export(&db, format, limit).await?;
        }
        Command::PreviewAd {
            position,
            page_type,
            page_id,
            api_url,
        } => {
            let ctx = AdContext::new(position, page_type, page_id);
            preview_ad(&api_url, &ctx).await?;
        }
        Command::UnsubscribeToken {
            email,
            newsletter_secret,
        } => {
            let secret = newsletter_secret.unwrap_or(file_config.newsletter.secret);
            if secret.is_empty() {
                anyhow::bail!("No newsletter secret configured; set NEWSDESK_NEWSLETTER_SECRET");
            }
            println!("{}", unsubscribe_token(&email, &secret));
        }
    }

    Ok(())
}

/// Opens the pool described by `--database-url` and `[database]`.
async fn connect(
    database_url: Option<&str>,
    file_config: &NewsdeskConfig,
) -> anyhow::Result<Database> {
    let url = database_url.context("DATABASE_URL is not set (use --database-url or .env)")?;

    info!("Connecting to database...");
    let pool = newsdesk_db::connect(url, &file_config.database)
        .await
        .context("Failed to connect to database")?;
    Ok(Database::new(pool))
}

/// Run the API until Ctrl-C
async fn serve(
    db: Database,
    file_config: NewsdeskConfig,
    bind: Option<std::net::SocketAddr>,
    admin_token: Option<String>,
    newsletter_secret: Option<String>,
) -> anyhow::Result<()> {
    let mut server_config = file_config.server;
    if let Some(bind) = bind {
        server_config.bind = bind;
    }
    if admin_token.is_some() {
        server_config.admin_token = admin_token;
    }

    let secret = newsletter_secret.unwrap_or(file_config.newsletter.secret);
    if secret.is_empty() {
        warn!("No newsletter secret configured; unsubscribe tokens are guessable");
    }

    let server = NewsdeskServer::new(db, server_config, file_config.publishing, secret);
    server
        .start_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
            info!("Shutdown signal received");
        })
        .await?;

    Ok(())
}

/// Show content statistics
async fn show_stats(db: &Database) -> anyhow::Result<()> {
    let stats = db.stats.content_stats().await?;

    println!("\n📊 Content Statistics\n");
    println!("  Articles:              {}", stats.total_articles);
    println!("    published:           {}", stats.published_articles);
    println!("    scheduled:           {}", stats.scheduled_articles);
    println!("    drafts:              {}", stats.draft_articles);
    println!("  Active ads:            {}", stats.active_advertisements);
    println!("  Ad impressions:        {}", stats.total_impressions);
    println!("  Ad clicks:             {}", stats.total_clicks);
    println!("  Active subscribers:    {}", stats.active_subscribers);
    println!();

    Ok(())
}

/// Print per-ad delivery numbers
async fn ad_report(db: &Database) -> anyhow::Result<()> {
    let rows = db.advertisements.performance().await?;

    if rows.is_empty() {
        println!("\nNo advertisements yet.\n");
        return Ok(());
    }

    println!(
        "\n{:<32} {:<18} {:>8} {:>12} {:>8} {:>7}",
        "NAME", "POSITION", "ACTIVE", "IMPRESSIONS", "CLICKS", "CTR"
    );
    for row in &rows {
        println!("{}", format_report_row(row));
    }
    println!();

    Ok(())
}

fn format_report_row(row: &AdPerformance) -> String {
    format!(
        "{:<32} {:<18} {:>8} {:>12} {:>8} {:>6.2}%",
        truncate_text(&row.name, 32),
        row.position.as_str(),
        if row.is_active { "yes" } else { "no" },
        row.impressions,
        row.clicks,
        row.click_through_rate() * 100.0
    )
}

/// Ask the running API which ad it would serve
async fn preview_ad(api_url: &str, ctx: &AdContext) -> anyhow::Result<()> {
    let client = NewsdeskClient::new(api_url, &HttpConfig::default())?;
    let page = ctx.page_id.as_deref().unwrap_or("-");

    match client.display_ad(ctx).await? {
        Some(ad) => {
            println!(
                "\n🎯 {} / {} / {} → {} ({})",
                ctx.position, ctx.page_type, page, ad.name, ad.id
            );
            if let Some(link) = &ad.link_url {
                println!("   🔗 {}", link);
            }
            if let Some(image) = &ad.image_url {
                println!("   🖼  {}", image);
            }
            if ad.custom_code.is_some() {
                println!("   🧩 custom code");
            }
            println!();
        }
        None => {
            println!(
                "\nNo eligible ad for {} / {} / {}; the slot shows its placeholder.\n",
                ctx.position, ctx.page_type, page
            );
        }
    }

    Ok(())
}

/// Truncate text to a maximum number of characters, adding ellipsis if needed
fn truncate_text(text: &str, max_len: usize) -> String {
    let cleaned = text.split_whitespace().collect::<Vec<_>>().join(" ");

    if cleaned.chars().count() <= max_len {
        cleaned
    } else {
        let head: String = cleaned.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

/// Export articles to various formats
async fn export(db: &Database, format: ExportFormat, limit: Option<usize>) -> anyhow::Result<()> {
    info!("Exporting articles...");

    let articles = db.articles.list_all(limit).await?;

    if articles.is_empty() {
        eprintln!("No articles found to export.");
        return Ok(());
    }

    info!("Found {} articles to export", articles.len());

    match format {
        ExportFormat::Jsonl => {
            export_jsonl(&articles)?;
        }
        ExportFormat::Json => {
            export_json(&articles)?;
        }
        ExportFormat::Csv => {
            export_csv(&articles)?;
        }
    }

    info!("Export complete: {} articles", articles.len());
    Ok(())
}

/// Export articles in JSON Lines format (one JSON object per line)
fn export_jsonl(articles: &[Article]) -> anyhow::Result<()> {
    for article in articles {
        let json = serde_json::to_string(&create_export_record(article))?;
        println!("{}", json);
    }
    Ok(())
}

/// Export articles as a JSON array
fn export_json(articles: &[Article]) -> anyhow::Result<()> {
    let records: Vec<_> = articles.iter().map(create_export_record).collect();
    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}

/// Export articles in CSV format
fn export_csv(articles: &[Article]) -> anyhow::Result<()> {
    println!("id,slug,title,status,published_at,scheduled_at,views,tags");

    for article in articles {
        let tags = article
            .tags
            .iter()
            .map(|t| t.slug.as_str())
            .collect::<Vec<_>>()
            .join(";");

        println!(
            "{},{},{},{},{},{},{},{}",
            article.id,
            escape_csv(&article.slug),
            escape_csv(&article.title),
            article.status,
            format_timestamp(article.published_at),
            format_timestamp(article.scheduled_at),
            article.views,
            escape_csv(&tags),
        );
    }
    Ok(())
}

fn format_timestamp(ts: Option<chrono::DateTime<chrono::Utc>>) -> String {
    ts.map(|t| t.format("%Y-%m-%dT%H:%M:%SZ").to_string())
        .unwrap_or_default()
}

/// Create an export record without the body (too large for export)
fn create_export_record(article: &Article) -> serde_json::Value {
    serde_json::json!({
        "id": article.id,
        "slug": article.slug,
        "title": article.title,
        "excerpt": article.excerpt,
        "status": article.status,
        "published_at": article.published_at,
        "scheduled_at": article.scheduled_at,
        "author_id": article.author_id,
        "category_id": article.category_id,
        "is_featured": article.is_featured,
        "views": article.views,
        "tags": article.tags.iter().map(|t| &t.slug).collect::<Vec<_>>(),
        "created_at": article.created_at,
        "updated_at": article.updated_at
    })
}

/// Escape a string for CSV output
fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use newsdesk_core::models::AdPosition;
    use uuid::Uuid;

    #[test]
    fn test_escape_csv() {
        assert_eq!(escape_csv("plain"), "plain");
        assert_eq!(escape_csv("a,b"), "\"a,b\"");
        assert_eq!(escape_csv("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_csv("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("a  b\n c", 10), "a b c");
        assert_eq!(truncate_text("abcdefghijkl", 8), "abcde...");
    }

    #[test]
    fn test_format_report_row_shows_ctr() {
        let row = AdPerformance {
            id: Uuid::new_v4(),
            name: "Spring sale".to_string(),
            position: AdPosition::Header,
            is_active: true,
            impressions: 200,
            clicks: 5,
        };
        let line = format_report_row(&row);
        assert!(line.starts_with("Spring sale"));
        assert!(line.contains("header"));
        assert!(line.ends_with("2.50%"));
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(None), "");
        let ts = chrono::DateTime::parse_from_rfc3339("2025-03-01T08:30:00Z")
            .unwrap()
            .with_timezone(&chrono::Utc);
        assert_eq!(format_timestamp(Some(ts)), "2025-03-01T08:30:00Z");
    }
}
