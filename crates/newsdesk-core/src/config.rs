//! Configuration types for Newsdesk components.
//!
//! Values are layered: built-in defaults, then an optional TOML file
//! (`<config dir>/newsdesk/config.toml` or `--config`), then CLI flags and
//! environment variables applied by the binary.
//!
//! ```toml
//! [server]
//! bind = "127.0.0.1:8080"
//! cors = false
//!
//! [database]
//! max_connections = 10
//!
//! [publishing]
//! sweep_interval_secs = 30
//!
//! [newsletter]
//! secret = "change-me"
//! ```

use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::AppError;

/// Database connection pool configuration.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DbConfig {
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            max_connections: 5,
            acquire_timeout_secs: 5,
        }
    }
}

impl DbConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }
}

/// HTTP client configuration for calls against the Newsdesk API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            user_agent: format!("Newsdesk/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub cors: bool,
    pub request_logging: bool,
    /// Bearer token guarding the admin API. `None` leaves it open (development only).
    pub admin_token: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 8080)),
            cors: true,
            request_logging: true,
            admin_token: None,
        }
    }
}

/// Scheduled-publishing sweep configuration.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PublishConfig {
    /// `0` disables the background sweep.
    pub sweep_interval_secs: u64,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: 60,
        }
    }
}

impl PublishConfig {
    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.sweep_interval_secs > 0).then(|| Duration::from_secs(self.sweep_interval_secs))
    }
}

/// Newsletter configuration.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NewsletterConfig {
    /// Secret mixed into unsubscribe tokens.
    pub secret: String,
}

/// Everything read from `config.toml`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NewsdeskConfig {
    pub server: ServerConfig,
    pub database: DbConfig,
    pub publishing: PublishConfig,
    pub newsletter: NewsletterConfig,
}

/// `<config dir>/newsdesk/config.toml`, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("newsdesk").join("config.toml"))
}

/// Loads configuration from `path`, or from [`default_config_path`] when `None`.
///
/// A missing default file yields defaults. A missing explicit file is an error,
/// as is a file that does not parse.
pub fn load_config(path: Option<&Path>) -> Result<NewsdeskConfig, AppError> {
    let (path, explicit) = match path {
        Some(p) => (p.to_path_buf(), true),
        None => match default_config_path() {
            Some(p) => (p, false),
            None => return Ok(NewsdeskConfig::default()),
        },
    };

    if !path.exists() {
        if explicit {
            return Err(AppError::ConfigError(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        tracing::debug!("No config file at {}, using defaults", path.display());
        return Ok(NewsdeskConfig::default());
    }

    let raw = std::fs::read_to_string(&path).map_err(|e| {
        AppError::ConfigError(format!("cannot read {}: {}", path.display(), e))
    })?;
    let config: NewsdeskConfig = toml::from_str(&raw)
        .map_err(|e| AppError::ConfigError(format!("{}: {}", path.display(), e)))?;

    tracing::info!("Loaded configuration from {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_db_config_defaults() {
        let config = DbConfig::default();
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.acquire_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_http_config_defaults() {
        let config = HttpConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert!(config.user_agent.starts_with("Newsdesk/"));
    }

    #[test]
    fn test_server_config_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.bind.port(), 8080);
        assert!(config.cors);
        assert!(config.admin_token.is_none());
    }

    #[test]
    fn test_sweep_interval() {
        assert_eq!(
            PublishConfig::default().sweep_interval(),
            Some(Duration::from_secs(60))
        );
        let disabled = PublishConfig {
            sweep_interval_secs: 0,
        };
        assert!(disabled.sweep_interval().is_none());
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[server]
bind = "127.0.0.1:9000"
admin_token = "s3cret"

[publishing]
sweep_interval_secs = 15
"#
        )
        .unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.server.bind.port(), 9000);
        assert_eq!(config.server.admin_token.as_deref(), Some("s3cret"));
        assert!(config.server.cors);
        assert_eq!(config.publishing.sweep_interval_secs, 15);
        assert_eq!(config.database, DbConfig::default());
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let result = load_config(Some(&missing));
        assert!(matches!(result, Err(AppError::ConfigError(_))));
    }

    #[test]
    fn test_load_invalid_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[server\nbind = ").unwrap();
        assert!(matches!(
            load_config(Some(file.path())),
            Err(AppError::ConfigError(_))
        ));
    }
}
