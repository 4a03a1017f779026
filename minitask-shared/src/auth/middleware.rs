/// Init data extraction for HTTP requests
///
/// The API server wraps protected routes in a layer that calls
/// [`authenticate`] and stores the resulting [`InitDataUser`] in the request
/// extensions. Handlers then take `Extension<InitDataUser>`.
///
/// # Example
///
/// ```no_run
/// use axum::http::HeaderMap;
/// use minitask_shared::auth::middleware::{authenticate, InitDataSettings};
/// use std::time::Duration;
///
/// # fn example(headers: &HeaderMap) {
/// let settings = InitDataSettings {
///     bot_token: Some("123:abc".to_string()),
///     max_age: Duration::from_secs(3600),
/// };
///
/// match authenticate(headers, &settings) {
///     Ok(user) => println!("Authenticated user {}", user.id),
///     Err(e) => println!("Rejected: {}", e),
/// }
/// # }
/// ```

use axum::http::HeaderMap;
use std::time::Duration;

use super::init_data::{parse, validate, InitDataError, InitDataUser};

/// Header carrying the raw init data string
pub const INIT_DATA_HEADER: &str = "X-Telegram-Init-Data";

/// Default freshness window for init data (one hour)
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(3600);

/// Settings needed to verify init data
#[derive(Debug, Clone)]
pub struct InitDataSettings {
    /// Bot token; `None` means the server is misconfigured
    pub bot_token: Option<String>,

    /// Maximum accepted age of `auth_date`
    pub max_age: Duration,
}

/// Error type for request authentication
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Header absent or empty
    #[error("Telegram initData missing")]
    MissingCredentials,

    /// Bot token is not configured on the server
    #[error("BOT_TOKEN not configured")]
    NotConfigured,

    /// Signature, expiry, or payload check failed
    #[error("Invalid Telegram initData: {0}")]
    InvalidInitData(#[from] InitDataError),
}

/// Verifies the init data header and returns the embedded user
///
/// # Errors
///
/// - [`AuthError::MissingCredentials`] if the header is absent or empty
/// - [`AuthError::NotConfigured`] if no bot token is configured
/// - [`AuthError::InvalidInitData`] if verification or parsing fails
pub fn authenticate(
    headers: &HeaderMap,
    settings: &InitDataSettings,
) -> Result<InitDataUser, AuthError> {
    let raw = headers
        .get(INIT_DATA_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.trim().is_empty())
        .ok_or(AuthError::MissingCredentials)?;

    let bot_token = settings
        .bot_token
        .as_deref()
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::NotConfigured)?;

    validate(raw, bot_token, settings.max_age)?;
    let data = parse(raw)?;

    tracing::debug!(user_id = data.user.id, "Init data verified");
    Ok(data.user)
}
