//! Per-account endpoint resolution.

use serde::Deserialize;

use super::http::SmartThingsClient;
use crate::error::{Result, SmartThingsError};

/// Fixed provider URL listing the endpoints for the authorized SmartApp.
pub const ENDPOINTS_URL: &str = "https://graph.api.smartthings.com/api/smartapps/endpoints";

/// Resolved API base for one authenticated session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Endpoint {
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub location: Location,
    #[serde(default, rename = "oauthClient")]
    pub oauth_client: OAuthClient,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OAuthClient {
    #[serde(default, rename = "clientId")]
    pub client_id: String,
}

impl Endpoint {
    /// Join a resource path onto the endpoint URI.
    pub fn join(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.uri.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Resolve the endpoint from the SmartThings endpoints URL.
pub async fn resolve(client: &SmartThingsClient) -> Result<Endpoint> {
    resolve_from(client, ENDPOINTS_URL).await
}

/// Resolve the endpoint from an explicit endpoints URL.
///
/// Only the first descriptor in the response is used.
pub async fn resolve_from(client: &SmartThingsClient, url: &str) -> Result<Endpoint> {
    let body = client.get_bytes(url).await?;
    if std::str::from_utf8(&body).map(str::trim) == Ok("[]") {
        return Err(SmartThingsError::EmptyResponse);
    }
    let endpoints: Vec<Endpoint> = serde_json::from_slice(&body)?;
    endpoints
        .into_iter()
        .next()
        .ok_or(SmartThingsError::EmptyResponse)
}
