/// Authentication for Telegram mini-app requests
///
/// The web front-end runs inside Telegram's client, which hands it a signed
/// "init data" string. The front-end forwards that string verbatim in the
/// `X-Telegram-Init-Data` header, and the backend trusts the embedded user
/// only after checking the signature against the bot token.
///
/// # Modules
///
/// - [`init_data`]: Parsing and HMAC-SHA256 verification of init data
/// - [`middleware`]: Header extraction used by the API's auth layer
///
/// # Example
///
/// ```no_run
/// use minitask_shared::auth::init_data::{parse, validate};
/// use std::time::Duration;
///
/// # fn example(raw: &str, bot_token: &str) -> Result<(), Box<dyn std::error::Error>> {
/// validate(raw, bot_token, Duration::from_secs(3600))?;
/// let data = parse(raw)?;
/// println!("Hello, {}", data.user.id);
/// # Ok(())
/// # }
/// ```

pub mod init_data;
pub mod middleware;
