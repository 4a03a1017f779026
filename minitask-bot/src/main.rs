//! # MiniTask Bot
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgresql://localhost/minitask BOT_TOKEN=123:abc cargo run -p minitask-bot
//! ```

use anyhow::Context;
use minitask_bot::{build_handler, config::BotConfig, BotState};
use minitask_shared::db::{
    migrations::run_migrations,
    pool::{close_pool, create_pool, DatabaseConfig},
};
use std::sync::Arc;
use teloxide::dptree;
use teloxide::prelude::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "minitask_bot=debug,minitask_shared=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("MiniTask Bot v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = BotConfig::from_env()?;

    let pool = create_pool(DatabaseConfig {
        url: config.database_url.clone(),
        max_connections: config.max_connections,
        ..Default::default()
    })
    .await
    .context("failed to connect to database")?;

    run_migrations(&pool)
        .await
        .context("failed to run database migrations")?;

    let bot = Bot::new(&config.bot_token);
    let state = Arc::new(BotState { db: pool.clone() });

    tracing::info!("Polling for updates");

    Dispatcher::builder(bot, build_handler())
        .dependencies(dptree::deps![state])
        .default_handler(|_update| async move {
            tracing::trace!("Ignoring update without a command");
        })
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    close_pool(pool).await;
    tracing::info!("Bot stopped");

    Ok(())
}
