//! Configuration (layered: code > env > `.env` file).

use std::fmt;

use crate::auth::{OAuthConfig, DEFAULT_PORT};
use crate::error::{Result, SmartThingsError};

pub const CLIENT_ID_ENV: &str = "ST_CLIENT_ID";
pub const CLIENT_SECRET_ENV: &str = "ST_CLIENT_SECRET";
pub const TOKEN_FILE_ENV: &str = "ST_TOKEN_FILE";
pub const PORT_ENV: &str = "ST_OAUTH_PORT";

/// Prefix for per-client token files when no explicit file is configured.
const TOKEN_FILE_PREFIX: &str = ".example_st_token";

/// Client credentials, token file and callback port.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SmartThingsConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub token_file: Option<String>,
    pub port: Option<u16>,
}

impl fmt::Debug for SmartThingsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmartThingsConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| ".."))
            .field("token_file", &self.token_file)
            .field("port", &self.port)
            .finish()
    }
}

impl SmartThingsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from `ST_*` environment variables, reading `.env` if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let port = match get(PORT_ENV) {
            Some(raw) => Some(raw.trim().parse::<u16>().map_err(|_| {
                SmartThingsError::Configuration(format!("{PORT_ENV} is not a valid port: {raw}"))
            })?),
            None => None,
        };
        Ok(Self {
            client_id: get(CLIENT_ID_ENV),
            client_secret: get(CLIENT_SECRET_ENV),
            token_file: get(TOKEN_FILE_ENV),
            port,
        })
    }

    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    pub fn with_token_file(mut self, token_file: impl Into<String>) -> Self {
        self.token_file = Some(token_file.into());
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    /// OAuth configuration for the SmartThings provider. Missing credentials
    /// become empty strings and are rejected once a new token is needed.
    pub fn oauth_config(&self) -> OAuthConfig {
        OAuthConfig::smartthings(
            self.client_id.clone().unwrap_or_default(),
            self.client_secret.clone().unwrap_or_default(),
        )
    }

    /// Token file name: the configured one, or one derived from the client id.
    pub fn token_file_name(&self) -> Result<String> {
        if let Some(file) = &self.token_file {
            return Ok(file.clone());
        }
        match &self.client_id {
            Some(client) => Ok(format!("{TOKEN_FILE_PREFIX}_{client}.json")),
            None => Err(SmartThingsError::Configuration(
                "must specify a client id or a token file".to_string(),
            )),
        }
    }
}
