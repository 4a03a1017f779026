/// Telegram Bot API integration
///
/// The API server needs a handful of Bot API calls to resolve a Telegram user
/// or chat and cache its avatar. They sit behind the [`ProfileLookup`] trait so
/// the HTTP layer can be tested without reaching Telegram.
///
/// # Example
///
/// ```no_run
/// use minitask_shared::telegram::{ProfileLookup, TeloxideProfiles};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let profiles = TeloxideProfiles::new("123:abc", "static/avatars", "/static/avatars");
/// let fetched = profiles.lookup("@durov").await?;
/// println!("{:?} avatar={:?}", fetched.profile.username, fetched.avatar_url);
/// # Ok(())
/// # }
/// ```

pub mod profile;

pub use profile::{parse_identifier, FetchedProfile, ProfileError, ProfileLookup, TeloxideProfiles};
