/// Telegram profile lookup
///
/// Resolves an identifier (numeric chat ID or `@username`) through the Bot
/// API, then downloads the largest size of the newest profile photo into a
/// local directory served as static files.
///
/// Only chats the bot can see resolve: users who have talked to the bot,
/// public channels, and groups the bot is a member of.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{Chat, Recipient};
use tracing::{debug, info, warn};

use crate::models::telegram_user::TelegramProfile;

/// Errors from resolving a profile
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    /// Identifier is neither a chat ID nor a username
    #[error("Invalid Telegram identifier: {0}")]
    InvalidIdentifier(String),

    /// Bot API rejected a request (unknown chat, blocked bot, network)
    #[error("Telegram request failed: {0}")]
    Request(#[from] teloxide::RequestError),

    /// Avatar download from Telegram's file server failed
    #[error("Avatar download failed: {0}")]
    Download(#[from] teloxide::DownloadError),

    /// Avatar could not be written locally
    #[error("Avatar storage failed: {0}")]
    Storage(#[from] std::io::Error),
}

impl ProfileError {
    /// True when the failure came from Telegram rather than local storage
    pub fn is_remote(&self) -> bool {
        !matches!(self, ProfileError::Storage(_))
    }
}

/// Result of a successful lookup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedProfile {
    pub profile: TelegramProfile,

    /// Public URL of the cached avatar, `None` if the chat has no photo
    pub avatar_url: Option<String>,
}

/// Source of Telegram profiles
#[async_trait]
pub trait ProfileLookup: Send + Sync {
    /// Resolves `identifier` and caches its avatar
    async fn lookup(&self, identifier: &str) -> Result<FetchedProfile, ProfileError>;
}

/// Parses a path identifier into a Bot API recipient
///
/// Integers (negative for groups and channels) are chat IDs. Anything else is
/// treated as a username, with or without the leading `@`.
pub fn parse_identifier(identifier: &str) -> Result<Recipient, ProfileError> {
    let trimmed = identifier.trim();

    if let Ok(id) = trimmed.parse::<i64>() {
        return Ok(Recipient::Id(ChatId(id)));
    }

    let name = trimmed.strip_prefix('@').unwrap_or(trimmed);
    let valid = !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(ProfileError::InvalidIdentifier(identifier.to_string()));
    }

    Ok(Recipient::ChannelUsername(format!("@{}", name)))
}

fn profile_from_chat(chat: &Chat) -> TelegramProfile {
    TelegramProfile {
        id: chat.id.0,
        username: chat.username().map(str::to_string),
        first_name: chat.first_name().map(str::to_string),
        last_name: chat.last_name().map(str::to_string),
    }
}

/// [`ProfileLookup`] backed by the Bot API through teloxide
#[derive(Clone)]
pub struct TeloxideProfiles {
    bot: Bot,
    avatar_dir: PathBuf,
    avatar_url_prefix: String,
}

impl TeloxideProfiles {
    /// Creates a lookup that stores avatars as `{avatar_dir}/{id}.jpg` and
    /// reports them as `{avatar_url_prefix}/{id}.jpg`
    pub fn new(
        bot_token: impl Into<String>,
        avatar_dir: impl Into<PathBuf>,
        avatar_url_prefix: impl Into<String>,
    ) -> Self {
        Self {
            bot: Bot::new(bot_token),
            avatar_dir: avatar_dir.into(),
            avatar_url_prefix: avatar_url_prefix.into().trim_end_matches('/').to_string(),
        }
    }

    fn avatar_path(&self, chat_id: i64) -> PathBuf {
        self.avatar_dir.join(format!("{}.jpg", chat_id))
    }

    fn avatar_url(&self, chat_id: i64) -> String {
        format!("{}/{}.jpg", self.avatar_url_prefix, chat_id)
    }

    /// Downloads the chat's current photo, returning its public URL
    async fn fetch_avatar(&self, chat: &Chat) -> Result<Option<String>, ProfileError> {
        // Profile photos exist only for users; groups and channels get none
        let Some(user_id) = chat.id.as_user() else {
            return Ok(None);
        };

        let photos = self.bot.get_user_profile_photos(user_id).limit(1).await?;
        let Some(largest) = photos.photos.first().and_then(|sizes| sizes.last()) else {
            debug!(chat_id = chat.id.0, "No profile photo");
            return Ok(None);
        };

        let file = self.bot.get_file(&largest.file.id).await?;

        tokio::fs::create_dir_all(&self.avatar_dir).await?;
        let path = self.avatar_path(chat.id.0);
        let partial = path.with_extension("jpg.part");

        let mut dst = tokio::fs::File::create(&partial).await?;
        let downloaded = self.bot.download_file(&file.path, &mut dst).await;
        finish_download(dst, &partial, &path, downloaded).await?;

        info!(chat_id = chat.id.0, path = %path.display(), "Avatar cached");

        Ok(Some(self.avatar_url(chat.id.0)))
    }

    pub fn avatar_dir(&self) -> &Path {
        &self.avatar_dir
    }
}

/// Moves a finished download from `partial` to `path`
///
/// The partial file is removed if the transfer or the final sync failed.
async fn finish_download<E>(
    dst: tokio::fs::File,
    partial: &Path,
    path: &Path,
    downloaded: Result<(), E>,
) -> Result<(), ProfileError>
where
    ProfileError: From<E>,
{
    let synced = match downloaded {
        Ok(()) => dst.sync_all().await.map_err(<ProfileError as From<std::io::Error>>::from),
        Err(e) => Err(e.into()),
    };
    drop(dst);

    if let Err(e) = synced {
        if let Err(cleanup) = tokio::fs::remove_file(partial).await {
            warn!(path = %partial.display(), error = %cleanup, "Failed to remove partial avatar");
        }
        return Err(e);
    }

    tokio::fs::rename(partial, path).await?;
    Ok(())
}

#[async_trait]
impl ProfileLookup for TeloxideProfiles {
    async fn lookup(&self, identifier: &str) -> Result<FetchedProfile, ProfileError> {
        let recipient = parse_identifier(identifier)?;
        let chat = self.bot.get_chat(recipient).await?;

        let avatar_url = self.fetch_avatar(&chat).await?;

        Ok(FetchedProfile {
            profile: profile_from_chat(&chat),
            avatar_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_identifier_is_chat_id() {
        assert_eq!(parse_identifier("42").unwrap(), Recipient::Id(ChatId(42)));
        assert_eq!(
            parse_identifier("-1001234567890").unwrap(),
            Recipient::Id(ChatId(-1001234567890))
        );
    }

    #[test]
    fn test_username_identifier() {
        assert_eq!(
            parse_identifier("@durov").unwrap(),
            Recipient::ChannelUsername("@durov".to_string())
        );
        assert_eq!(
            parse_identifier("durov").unwrap(),
            Recipient::ChannelUsername("@durov".to_string())
        );
    }

    #[test]
    fn test_invalid_identifiers() {
        for raw in ["", "@", "  ", "a b", "@bad/name"] {
            assert!(
                matches!(parse_identifier(raw), Err(ProfileError::InvalidIdentifier(_))),
                "{:?} should be rejected",
                raw
            );
        }
    }

    #[test]
    fn test_avatar_locations() {
        let profiles = TeloxideProfiles::new("123:abc", "static/avatars", "/static/avatars/");
        assert_eq!(profiles.avatar_path(42), PathBuf::from("static/avatars/42.jpg"));
        assert_eq!(profiles.avatar_url(42), "/static/avatars/42.jpg");
        assert_eq!(profiles.avatar_dir(), Path::new("static/avatars"));
    }

    #[test]
    fn test_storage_error_is_local() {
        let err = ProfileError::Storage(std::io::Error::new(std::io::ErrorKind::Other, "disk full"));
        assert!(!err.is_remote());
        assert!(ProfileError::InvalidIdentifier("x y".to_string()).is_remote());
    }

    fn scratch_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("minitask-avatar-{}-{}", name, std::process::id()))
    }

    #[tokio::test]
    async fn test_finished_download_replaces_partial_file() {
        use tokio::io::AsyncWriteExt;

        let dir = scratch_dir("ok");
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let path = dir.join("7.jpg");
        let partial = path.with_extension("jpg.part");

        let mut dst = tokio::fs::File::create(&partial).await.unwrap();
        dst.write_all(b"jpeg").await.unwrap();
        finish_download(dst, &partial, &path, Ok::<(), std::io::Error>(()))
            .await
            .unwrap();

        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"jpeg");
        assert!(!partial.exists());

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn test_failed_download_removes_partial_file() {
        let dir = scratch_dir("failed");
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let path = dir.join("7.jpg");
        let partial = path.with_extension("jpg.part");

        let dst = tokio::fs::File::create(&partial).await.unwrap();
        let failed: Result<(), std::io::Error> =
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "connection reset"));
        let err = finish_download(dst, &partial, &path, failed).await.unwrap_err();

        assert!(matches!(err, ProfileError::Storage(_)));
        assert!(!partial.exists());
        assert!(!path.exists());

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
