/// Bot commands
///
/// `/start` registers the sender in the task system, or refreshes the stored
/// names of a returning user. `/help` lists the commands.

use crate::BotState;
use minitask_shared::models::telegram_user::{TelegramProfile, TelegramUser};
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::User;
use teloxide::utils::command::BotCommands;

pub type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase", description = "MiniTask bot commands:")]
pub enum BotCommand {
    #[command(description = "register or refresh your profile")]
    Start,
    #[command(description = "show this help")]
    Help,
}

/// Name fields of a message sender
///
/// Telegram always sends a first name, so it is never stored as `NULL` here.
pub fn profile_from_user(user: &User) -> TelegramProfile {
    TelegramProfile {
        id: user.id.0 as i64,
        username: user.username.clone(),
        first_name: Some(user.first_name.clone()),
        last_name: user.last_name.clone(),
    }
}

/// Reply to `/start`; new users are welcomed, returning users acknowledged
pub fn greeting(first_name: &str, created: bool) -> String {
    if created {
        format!(
            "Hi, {}! You are now registered in the task system.\n\
             Open the mini-app to create your first task.",
            first_name
        )
    } else {
        format!(
            "Good to see you again, {}! Your details have been updated.",
            first_name
        )
    }
}

pub async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: BotCommand,
    state: Arc<BotState>,
) -> HandlerResult {
    match cmd {
        BotCommand::Start => {
            // Channel posts have no sender
            let Some(sender) = msg.from.as_ref() else {
                return Ok(());
            };

            let (user, created) =
                TelegramUser::register(&state.db, profile_from_user(sender)).await?;

            tracing::info!(
                user_id = user.id,
                username = ?user.username,
                created,
                "User registered via /start"
            );

            bot.send_message(msg.chat.id, greeting(&sender.first_name, created))
                .await?;
        }
        BotCommand::Help => {
            bot.send_message(msg.chat.id, BotCommand::descriptions().to_string())
                .await?;
        }
    }

    Ok(())
}
