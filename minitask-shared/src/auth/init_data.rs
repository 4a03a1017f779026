/// Telegram Mini App init data verification
///
/// Init data is a URL-encoded query string such as
/// `query_id=...&user=%7B%22id%22%3A42...%7D&auth_date=1700000000&hash=ab12...`.
///
/// # Verification
///
/// 1. Every field except `hash` becomes a `key=value` line; lines are sorted
///    by key and joined with `\n` (the data-check-string).
/// 2. `secret_key = HMAC_SHA256(key = "WebAppData", msg = bot_token)`
/// 3. The payload is authentic when
///    `hex(HMAC_SHA256(key = secret_key, msg = data_check_string)) == hash`.
/// 4. The payload is fresh when `auth_date + max_age >= now`. A zero
///    `max_age` disables the expiry check.
///
/// Signature comparison is constant-time (`Mac::verify_slice`).

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::time::Duration;
use url::form_urlencoded;

type HmacSha256 = Hmac<Sha256>;

/// Key used to derive the per-bot secret from the bot token
const WEB_APP_DATA_KEY: &[u8] = b"WebAppData";

/// Error type for init data verification
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InitDataError {
    /// Empty payload
    #[error("init data is empty")]
    Missing,

    /// No `hash` field
    #[error("hash is missing")]
    HashMissing,

    /// No `auth_date` field
    #[error("auth_date is missing")]
    AuthDateMissing,

    /// `auth_date` is not a unix timestamp
    #[error("auth_date is invalid")]
    AuthDateInvalid,

    /// Hash does not match the payload
    #[error("signature is invalid")]
    SignatureInvalid,

    /// Payload is older than the allowed age
    #[error("init data has expired")]
    Expired,

    /// No `user` field
    #[error("user data not found in init data")]
    UserMissing,

    /// `user` is not valid JSON
    #[error("user data is invalid: {0}")]
    UserInvalid(String),
}

/// User embedded in init data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitDataUser {
    /// Telegram user ID
    pub id: i64,

    #[serde(default)]
    pub first_name: Option<String>,

    #[serde(default)]
    pub last_name: Option<String>,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub language_code: Option<String>,

    #[serde(default)]
    pub is_premium: Option<bool>,

    #[serde(default)]
    pub photo_url: Option<String>,
}

/// Parsed init data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitData {
    pub user: InitDataUser,
    pub auth_date: DateTime<Utc>,
    pub query_id: Option<String>,
    pub chat_type: Option<String>,
    pub chat_instance: Option<String>,
    pub start_param: Option<String>,
}

fn fields(raw: &str) -> Vec<(String, String)> {
    form_urlencoded::parse(raw.as_bytes()).into_owned().collect()
}

fn secret_key(bot_token: &str) -> Result<Vec<u8>, InitDataError> {
    let mut mac = HmacSha256::new_from_slice(WEB_APP_DATA_KEY)
        .map_err(|_| InitDataError::SignatureInvalid)?;
    mac.update(bot_token.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}

fn data_check_string(mut pairs: Vec<(String, String)>) -> String {
    pairs.sort_by(|a, b| a.0.cmp(&b.0));
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("\n")
}

fn parse_auth_date(value: &str) -> Result<DateTime<Utc>, InitDataError> {
    let secs = value
        .parse::<i64>()
        .map_err(|_| InitDataError::AuthDateInvalid)?;
    DateTime::from_timestamp(secs, 0).ok_or(InitDataError::AuthDateInvalid)
}

/// Verifies signature and freshness against the current time
pub fn validate(raw: &str, bot_token: &str, max_age: Duration) -> Result<(), InitDataError> {
    validate_at(raw, bot_token, max_age, Utc::now())
}

/// Verifies signature and freshness against an explicit clock
pub fn validate_at(
    raw: &str,
    bot_token: &str,
    max_age: Duration,
    now: DateTime<Utc>,
) -> Result<(), InitDataError> {
    if raw.trim().is_empty() {
        return Err(InitDataError::Missing);
    }

    let mut hash = None;
    let mut auth_date = None;
    let mut check = Vec::new();

    for (key, value) in fields(raw) {
        match key.as_str() {
            "hash" => hash = Some(value),
            "auth_date" => {
                auth_date = Some(value.clone());
                check.push((key, value));
            }
            _ => check.push((key, value)),
        }
    }

    let hash = hash.ok_or(InitDataError::HashMissing)?;
    let auth_date = parse_auth_date(&auth_date.ok_or(InitDataError::AuthDateMissing)?)?;

    let expected = hex::decode(&hash).map_err(|_| InitDataError::SignatureInvalid)?;
    let mut mac = HmacSha256::new_from_slice(&secret_key(bot_token)?)
        .map_err(|_| InitDataError::SignatureInvalid)?;
    mac.update(data_check_string(check).as_bytes());
    mac.verify_slice(&expected)
        .map_err(|_| InitDataError::SignatureInvalid)?;

    if !max_age.is_zero() {
        let max_age = chrono::Duration::seconds(max_age.as_secs() as i64);
        let expires_at = auth_date
            .checked_add_signed(max_age)
            .ok_or(InitDataError::AuthDateInvalid)?;
        if expires_at < now {
            return Err(InitDataError::Expired);
        }
    }

    Ok(())
}

/// Extracts the user and metadata without checking the signature
///
/// Call [`validate`] first; this function trusts its input.
pub fn parse(raw: &str) -> Result<InitData, InitDataError> {
    let mut user = None;
    let mut auth_date = None;
    let mut query_id = None;
    let mut chat_type = None;
    let mut chat_instance = None;
    let mut start_param = None;

    for (key, value) in fields(raw) {
        match key.as_str() {
            "user" => user = Some(value),
            "auth_date" => auth_date = Some(value),
            "query_id" => query_id = Some(value),
            "chat_type" => chat_type = Some(value),
            "chat_instance" => chat_instance = Some(value),
            "start_param" => start_param = Some(value),
            _ => {}
        }
    }

    let user = user.ok_or(InitDataError::UserMissing)?;
    let user: InitDataUser =
        serde_json::from_str(&user).map_err(|e| InitDataError::UserInvalid(e.to_string()))?;
    let auth_date = parse_auth_date(&auth_date.ok_or(InitDataError::AuthDateMissing)?)?;

    Ok(InitData {
        user,
        auth_date,
        query_id,
        chat_type,
        chat_instance,
        start_param,
    })
}

/// Builds a signed init data string from raw fields
///
/// Mirrors what Telegram's client produces. Used by tests and by local
/// tooling that needs to call the API without a Telegram client.
pub fn sign(fields: &[(&str, &str)], bot_token: &str) -> Result<String, InitDataError> {
    let pairs = fields
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect::<Vec<_>>();

    let mut mac = HmacSha256::new_from_slice(&secret_key(bot_token)?)
        .map_err(|_| InitDataError::SignatureInvalid)?;
    mac.update(data_check_string(pairs).as_bytes());
    let hash = hex::encode(mac.finalize().into_bytes());

    Ok(form_urlencoded::Serializer::new(String::new())
        .extend_pairs(fields.iter())
        .append_pair("hash", &hash)
        .finish())
}
