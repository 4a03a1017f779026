/// Configuration management for the API server
///
/// This module loads configuration from environment variables and provides
/// a type-safe configuration struct.
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8000)
/// - `CORS_ORIGINS`: Comma-separated allowed origins (default: `*`)
/// - `PRODUCTION`: Enables HSTS when `true` (default: false)
/// - `BOT_TOKEN`: Telegram bot token. Optional at startup; without it every
///   authenticated route answers 500
/// - `INIT_DATA_MAX_AGE_SECS`: Accepted init data age, 0 disables (default: 3600)
/// - `STATIC_DIR`: Directory served as static files (default: static)
/// - `STATIC_URL_PREFIX`: URL path the directory is mounted at (default: /static)
/// - `RUST_LOG`: Log level (default: minitask_api=debug,tower_http=debug)
///
/// # Example
///
/// ```no_run
/// use minitask_api::config::Config;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}:{}", config.api.host, config.api.port);
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Telegram configuration
    pub telegram: TelegramConfig,

    /// Static file configuration
    pub static_files: StaticConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins; `*` allows any
    pub cors_origins: Vec<String>,

    /// Production mode (enables HSTS)
    pub production: bool,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// Telegram configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot token used to verify init data and call the Bot API
    pub bot_token: Option<String>,

    /// Maximum age of init data in seconds; 0 accepts any age
    pub init_data_max_age_secs: u64,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &self.bot_token.as_ref().map(|_| "<redacted>"))
            .field("init_data_max_age_secs", &self.init_data_max_age_secs)
            .finish()
    }
}

impl TelegramConfig {
    pub fn init_data_max_age(&self) -> Duration {
        Duration::from_secs(self.init_data_max_age_secs)
    }
}

/// Static file configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticConfig {
    /// Directory on disk
    pub dir: PathBuf,

    /// URL prefix, without trailing slash
    pub url_prefix: String,
}

impl StaticConfig {
    /// Directory where cached avatars are written
    pub fn avatar_dir(&self) -> PathBuf {
        self.dir.join("avatars")
    }

    /// URL prefix under which cached avatars are served
    pub fn avatar_url_prefix(&self) -> String {
        format!("{}/avatars", self.url_prefix)
    }
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `DATABASE_URL` is missing
    /// - A numeric or boolean variable has an invalid value
    ///
    /// # Example
    ///
    /// ```no_run
    /// use minitask_api::config::Config;
    ///
    /// # fn example() -> anyhow::Result<()> {
    /// let config = Config::from_env()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from an arbitrary variable source
    pub fn from_lookup<F>(var: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_host = var("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let api_port = var("API_PORT")
            .unwrap_or_else(|| "8000".to_string())
            .parse::<u16>()
            .map_err(|e| anyhow::anyhow!("API_PORT is invalid: {}", e))?;

        let cors_origins = var("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let production = var("PRODUCTION")
            .unwrap_or_else(|| "false".to_string())
            .parse::<bool>()
            .map_err(|e| anyhow::anyhow!("PRODUCTION is invalid: {}", e))?;

        let database_url = var("DATABASE_URL")
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let max_connections = var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|| "10".to_string())
            .parse::<u32>()
            .map_err(|e| anyhow::anyhow!("DATABASE_MAX_CONNECTIONS is invalid: {}", e))?;

        let bot_token = var("BOT_TOKEN").filter(|token| !token.trim().is_empty());
        if bot_token.is_none() {
            tracing::warn!("BOT_TOKEN is not set; authenticated routes will fail");
        }

        let init_data_max_age_secs = var("INIT_DATA_MAX_AGE_SECS")
            .unwrap_or_else(|| "3600".to_string())
            .parse::<u64>()
            .map_err(|e| anyhow::anyhow!("INIT_DATA_MAX_AGE_SECS is invalid: {}", e))?;

        let static_dir = var("STATIC_DIR").unwrap_or_else(|| "static".to_string());
        let static_url_prefix = var("STATIC_URL_PREFIX").unwrap_or_else(|| "/static".to_string());
        let static_url_prefix = format!("/{}", static_url_prefix.trim_matches('/'));

        Ok(Self {
            api: ApiConfig {
                host: api_host,
                port: api_port,
                cors_origins,
                production,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            telegram: TelegramConfig {
                bot_token,
                init_data_max_age_secs,
            },
            static_files: StaticConfig {
                dir: PathBuf::from(static_dir),
                url_prefix: static_url_prefix,
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}
