//! Authenticated HTTP client for the SmartThings API.

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::auth::Token;
use crate::error::{Result, SmartThingsError};

/// HTTP client that sends every request with the token's authorization
/// header. Cheap to clone; each call owns its request/response cycle.
#[derive(Debug, Clone)]
pub struct SmartThingsClient {
    http: reqwest::Client,
    token: Token,
}

impl SmartThingsClient {
    pub fn new(token: Token) -> Self {
        Self {
            http: reqwest::Client::new(),
            token,
        }
    }

    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let auth = HeaderValue::from_str(&self.token.authorization_value()).map_err(|_| {
            SmartThingsError::InvalidArgument(
                "access token is not a valid header value".to_string(),
            )
        })?;
        headers.insert(AUTHORIZATION, auth);
        Ok(headers)
    }

    /// GET `url` and return the raw body of a 2xx response.
    pub async fn get_bytes(&self, url: &str) -> Result<Bytes> {
        debug!(%url, "GET");
        let resp = self.http.get(url).headers(self.headers()?).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SmartThingsError::api(status.as_u16(), body));
        }
        Ok(resp.bytes().await?)
    }

    /// GET `url` and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let body = self.get_bytes(url).await?;
        Ok(serde_json::from_slice(&body)?)
    }
}
