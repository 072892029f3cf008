use std::fmt;

use chrono::{Duration, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use tracing::debug;

use super::error::AuthError;
use super::token::Token;

pub const DEFAULT_AUTH_URL: &str = "https://graph.api.smartthings.com/oauth/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://graph.api.smartthings.com/oauth/token";
const DEFAULT_SCOPE: &str = "app";
const STATE_BYTES: usize = 16;

/// OAuth2 client configuration for the authorization-code flow.
///
/// # Example
/// ```
/// use smartthings::auth::OAuthConfig;
///
/// let config = OAuthConfig::smartthings("client", "secret")
///     .with_redirect_url("http://localhost:4567/OAuthCallback");
/// let url = config.authorize_url("0123abcd").unwrap();
/// assert!(url.contains("state=0123abcd"));
/// ```
#[derive(Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub scopes: Vec<String>,
    pub auth_url: String,
    pub token_url: String,
    pub redirect_url: Option<String>,
}

impl fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"..")
            .field("scopes", &self.scopes)
            .field("auth_url", &self.auth_url)
            .field("token_url", &self.token_url)
            .field("redirect_url", &self.redirect_url)
            .finish()
    }
}

impl OAuthConfig {
    /// Configuration for the SmartThings graph API.
    pub fn smartthings(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            scopes: vec![DEFAULT_SCOPE.to_string()],
            auth_url: DEFAULT_AUTH_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            redirect_url: None,
        }
    }

    pub fn with_auth_url(mut self, url: impl Into<String>) -> Self {
        self.auth_url = url.into();
        self
    }

    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    /// Explicit redirect URI. Without one the provider uses the URI
    /// registered for the client.
    pub fn with_redirect_url(mut self, url: impl Into<String>) -> Self {
        self.redirect_url = Some(url.into());
        self
    }

    pub fn has_credentials(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }

    /// Provider consent URL carrying `state`.
    pub fn authorize_url(&self, state: &str) -> Result<String, AuthError> {
        let mut url = url::Url::parse(&self.auth_url)?;
        {
            let mut params = url.query_pairs_mut();
            params.append_pair("response_type", "code");
            params.append_pair("client_id", &self.client_id);
            if let Some(redirect) = &self.redirect_url {
                params.append_pair("redirect_uri", redirect);
            }
            if !self.scopes.is_empty() {
                params.append_pair("scope", &self.scopes.join(" "));
            }
            params.append_pair("state", state);
        }
        Ok(url.into())
    }
}

/// Random anti-forgery value: 16 bytes from the OS CSPRNG, hex-encoded.
pub fn generate_state() -> Result<String, AuthError> {
    let mut bytes = [0u8; STATE_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| AuthError::Entropy(e.to_string()))?;
    Ok(hex::encode(bytes))
}

/// Exchange an authorization code at the provider's token endpoint.
pub async fn exchange_code(
    http: &reqwest::Client,
    config: &OAuthConfig,
    code: &str,
) -> Result<Token, AuthError> {
    let mut form = vec![
        ("grant_type", "authorization_code"),
        ("code", code),
        ("client_id", config.client_id.as_str()),
        ("client_secret", config.client_secret.as_str()),
    ];
    if let Some(redirect) = &config.redirect_url {
        form.push(("redirect_uri", redirect.as_str()));
    }

    debug!(token_url = %config.token_url, "exchanging authorization code");
    let resp = http
        .post(&config.token_url)
        .header(ACCEPT, "application/json")
        .form(&form)
        .send()
        .await
        .map_err(|e| AuthError::Exchange(format!("token request failed: {e}")))?;
    let status = resp.status();
    let body = resp
        .text()
        .await
        .map_err(|e| AuthError::Exchange(format!("failed to read token response: {e}")))?;
    if !status.is_success() {
        return Err(AuthError::Exchange(format!(
            "token endpoint returned status {status}: {body}"
        )));
    }
    parse_token_response(&body)
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: String,
    #[serde(default)]
    token_type: String,
    #[serde(default)]
    refresh_token: String,
    expires_in: Option<serde_json::Value>,
}

fn parse_token_response(body: &str) -> Result<Token, AuthError> {
    let payload: TokenResponse = serde_json::from_str(body)
        .map_err(|e| AuthError::Exchange(format!("invalid token response: {e}")))?;
    if payload.access_token.is_empty() {
        return Err(AuthError::Exchange(
            "server response missing access_token".to_string(),
        ));
    }
    let expiry = payload
        .expires_in
        .as_ref()
        .and_then(parse_expires_in)
        .filter(|secs| *secs > 0)
        .and_then(Duration::try_seconds)
        .and_then(|lifetime| Utc::now().checked_add_signed(lifetime));
    Ok(Token {
        access_token: payload.access_token,
        token_type: payload.token_type,
        refresh_token: payload.refresh_token,
        expiry,
    })
}

fn parse_expires_in(value: &serde_json::Value) -> Option<i64> {
    if let Some(num) = value.as_i64() {
        return Some(num);
    }
    value.as_str().and_then(|text| text.trim().parse().ok())
}
