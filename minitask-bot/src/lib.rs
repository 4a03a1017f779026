//! # MiniTask Bot
//!
//! Long-polling Telegram bot that registers users through `/start`. It shares
//! the database with the API server, so a user who pressed `/start` already
//! has a profile row when the mini-app first asks about them.

pub mod commands;
pub mod config;

use sqlx::PgPool;
use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::dptree;
use teloxide::prelude::*;

/// State shared by all handlers
pub struct BotState {
    pub db: PgPool,
}

/// Builds the update handler tree
///
/// Only messages are routed, so polling requests message updates alone.
pub fn build_handler() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync>> {
    let command_handler = Update::filter_message()
        .filter_command::<commands::BotCommand>()
        .endpoint(commands::handle_command);

    dptree::entry().branch(command_handler)
}
