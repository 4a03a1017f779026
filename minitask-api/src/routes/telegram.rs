/// Telegram profile sync endpoint
///
/// ```text
/// GET /tg/info/:identifier
/// X-Telegram-Init-Data: <init data>
/// ```
///
/// `identifier` is a numeric chat ID or a `@username`. The profile is fetched
/// from the Bot API, the avatar (if any) is cached under the static directory,
/// and the `telegram_users` row is upserted.
///
/// # Response
///
/// ```json
/// {
///   "id": 42,
///   "username": "ada",
///   "first_name": "Ada",
///   "last_name": null,
///   "avatar_url": "/static/avatars/42.jpg"
/// }
/// ```
///
/// # Errors
///
/// - `404 Not Found`: Telegram does not know the chat or the bot cannot see it
/// - `500 Internal Server Error`: BOT_TOKEN missing, or the avatar could not be stored

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use minitask_shared::{auth::init_data::InitDataUser, models::telegram_user::TelegramUser};
use serde::{Deserialize, Serialize};

/// Public view of a Telegram user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelegramUserOut {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub avatar_url: Option<String>,
}

impl From<TelegramUser> for TelegramUserOut {
    fn from(user: TelegramUser) -> Self {
        Self {
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            avatar_url: user.avatar_url,
        }
    }
}

pub async fn get_telegram_info(
    State(state): State<AppState>,
    Extension(caller): Extension<InitDataUser>,
    Path(identifier): Path<String>,
) -> ApiResult<Json<TelegramUserOut>> {
    let profiles = state.profiles()?;
    let fetched = profiles.lookup(&identifier).await?;

    let user = TelegramUser::sync_profile(&state.db, fetched.profile, fetched.avatar_url).await?;

    tracing::info!(
        requested_by = caller.id,
        telegram_id = user.id,
        has_avatar = user.avatar_url.is_some(),
        "Telegram profile synced"
    );

    Ok(Json(user.into()))
}
