/// Configuration for the bot process
///
/// # Environment Variables
///
/// - `BOT_TOKEN`: Telegram bot token (required)
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 5)
/// - `RUST_LOG`: Log level (default: minitask_bot=debug)

use std::env;

/// Bot configuration
#[derive(Clone)]
pub struct BotConfig {
    /// Telegram bot token
    pub bot_token: String,

    /// PostgreSQL connection URL
    pub database_url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

impl std::fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotConfig")
            .field("bot_token", &"<redacted>")
            .field("database_url", &self.database_url)
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

impl BotConfig {
    /// Loads configuration from the environment, reading `.env` if present
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from an arbitrary variable source
    pub fn from_lookup<F>(var: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bot_token = var("BOT_TOKEN")
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("BOT_TOKEN environment variable is required"))?;

        let database_url = var("DATABASE_URL")
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let max_connections = var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|| "5".to_string())
            .parse::<u32>()
            .map_err(|e| anyhow::anyhow!("DATABASE_MAX_CONNECTIONS is invalid: {}", e))?;

        Ok(Self {
            bot_token,
            database_url,
            max_connections,
        })
    }
}
