use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Tokens expiring within this window are already treated as expired.
const EXPIRY_SKEW_SECS: i64 = 10;

/// OAuth2 access credential as stored in the token file.
///
/// Field names follow the usual OAuth2 token JSON layout
/// (`access_token`, `token_type`, `refresh_token`, `expiry`), so files written
/// by other OAuth2 clients load unchanged. Values are stored as read: an
/// empty `refresh_token` is omitted on save, and the zero time (year 1) that
/// Go-style writers use for "no expiry" is kept and read as no expiry.
///
/// # Example
/// ```
/// use smartthings::auth::Token;
/// use chrono::{Duration, Utc};
///
/// let token = Token {
///     access_token: "access".to_string(),
///     token_type: "bearer".to_string(),
///     refresh_token: "refresh".to_string(),
///     expiry: Some(Utc::now() + Duration::hours(1)),
/// };
/// assert!(token.is_valid());
/// assert_eq!(token.authorization_value(), "Bearer access");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub token_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub refresh_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

impl Token {
    /// A bearer token with no refresh credential and no expiry.
    pub fn bearer(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: "Bearer".to_string(),
            refresh_token: String::new(),
            expiry: None,
        }
    }

    /// Expiry instant, or `None` when the token does not expire.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expiry.filter(|t| t.year() > 1)
    }

    /// True when the access token is present and not (about to be) expired.
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        if self.access_token.is_empty() {
            return false;
        }
        match self.expires_at() {
            Some(expiry) => expiry - Duration::seconds(EXPIRY_SKEW_SECS) > now,
            None => true,
        }
    }

    /// Token type normalized for the `Authorization` header.
    pub fn kind(&self) -> &str {
        let kind = self.token_type.as_str();
        if kind.is_empty() || kind.eq_ignore_ascii_case("bearer") {
            "Bearer"
        } else if kind.eq_ignore_ascii_case("mac") {
            "MAC"
        } else if kind.eq_ignore_ascii_case("basic") {
            "Basic"
        } else {
            kind
        }
    }

    /// Value for the `Authorization` header, e.g. `Bearer abc`.
    pub fn authorization_value(&self) -> String {
        format!("{} {}", self.kind(), self.access_token)
    }
}
