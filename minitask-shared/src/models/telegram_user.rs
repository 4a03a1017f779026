/// Telegram user model and database operations
///
/// Rows are keyed by the Telegram user (or chat) ID and are written from two
/// places: the bot's `/start` handler and the API's profile sync endpoint.
/// Both go through a single `INSERT ... ON CONFLICT DO UPDATE`, so concurrent
/// writers never fail, and the last one to commit wins.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE telegram_users (
///     id BIGINT PRIMARY KEY,
///     username TEXT,
///     first_name TEXT,
///     last_name TEXT,
///     avatar_url TEXT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use minitask_shared::models::telegram_user::{TelegramUser, TelegramProfile};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let (user, created) = TelegramUser::register(&pool, TelegramProfile {
///     id: 42,
///     username: Some("ada".to_string()),
///     first_name: Some("Ada".to_string()),
///     last_name: None,
/// }).await?;
/// println!("user {} (new: {})", user.id, created);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// A Telegram account known to the backend
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TelegramUser {
    /// Telegram user or chat ID
    pub id: i64,

    pub username: Option<String>,

    pub first_name: Option<String>,

    pub last_name: Option<String>,

    /// Public URL of the locally cached avatar, if one was downloaded
    pub avatar_url: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Name fields reported by Telegram for a user or chat
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelegramProfile {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Upsert result; `xmax = 0` holds only for rows inserted by the statement
#[derive(sqlx::FromRow)]
struct RegisteredRow {
    #[sqlx(flatten)]
    user: TelegramUser,
    inserted: bool,
}

impl TelegramUser {
    /// Upserts the names of a user, leaving any stored avatar untouched
    ///
    /// Used by the bot's `/start` command. Returns the row and whether it was
    /// newly inserted.
    pub async fn register(
        pool: &PgPool,
        profile: TelegramProfile,
    ) -> Result<(Self, bool), sqlx::Error> {
        let row = sqlx::query_as::<_, RegisteredRow>(
            r#"
            INSERT INTO telegram_users (id, username, first_name, last_name, avatar_url)
            VALUES ($1, $2, $3, $4, NULL)
            ON CONFLICT (id) DO UPDATE
            SET username = EXCLUDED.username,
                first_name = EXCLUDED.first_name,
                last_name = EXCLUDED.last_name,
                updated_at = NOW()
            RETURNING id, username, first_name, last_name, avatar_url,
                      created_at, updated_at, (xmax = 0) AS inserted
            "#,
        )
        .bind(profile.id)
        .bind(profile.username)
        .bind(profile.first_name)
        .bind(profile.last_name)
        .fetch_one(pool)
        .await?;

        Ok((row.user, row.inserted))
    }

    /// Upserts names and avatar from a fresh bot API lookup
    ///
    /// `avatar_url` always overwrites the stored value, so a user who removed
    /// their photo ends up with `NULL`.
    pub async fn sync_profile(
        pool: &PgPool,
        profile: TelegramProfile,
        avatar_url: Option<String>,
    ) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, TelegramUser>(
            r#"
            INSERT INTO telegram_users (id, username, first_name, last_name, avatar_url)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE
            SET username = EXCLUDED.username,
                first_name = EXCLUDED.first_name,
                last_name = EXCLUDED.last_name,
                avatar_url = EXCLUDED.avatar_url,
                updated_at = NOW()
            RETURNING id, username, first_name, last_name, avatar_url, created_at, updated_at
            "#,
        )
        .bind(profile.id)
        .bind(profile.username)
        .bind(profile.first_name)
        .bind(profile.last_name)
        .bind(avatar_url)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by Telegram ID
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, TelegramUser>(
            r#"
            SELECT id, username, first_name, last_name, avatar_url, created_at, updated_at
            FROM telegram_users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }
}
