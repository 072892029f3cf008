#![allow(dead_code)]

use std::sync::Mutex;

use smartthings::auth::{AuthError, OAuthConfig, Token, TokenStore};
use wiremock::MockServer;

#[derive(Default)]
pub struct InMemoryTokenStore {
    token: Mutex<Option<Token>>,
    saves: Mutex<usize>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, token: Token) {
        *self.token.lock().expect("store lock poisoned") = Some(token);
    }

    pub fn get(&self) -> Option<Token> {
        self.token.lock().expect("store lock poisoned").clone()
    }

    pub fn save_count(&self) -> usize {
        *self.saves.lock().expect("store lock poisoned")
    }
}

impl TokenStore for InMemoryTokenStore {
    fn load(&self) -> Result<Token, AuthError> {
        self.get()
            .ok_or_else(|| AuthError::NotFound("in-memory".into()))
    }

    fn save(&self, token: &Token) -> Result<(), AuthError> {
        *self.token.lock().expect("store lock poisoned") = Some(token.clone());
        *self.saves.lock().expect("store lock poisoned") += 1;
        Ok(())
    }
}

pub fn token(access_token: &str) -> Token {
    Token {
        access_token: access_token.to_string(),
        token_type: "bearer".to_string(),
        refresh_token: String::new(),
        expiry: None,
    }
}

/// OAuth configuration pointing at a mock provider.
pub fn provider_config(server: &MockServer) -> OAuthConfig {
    OAuthConfig::smartthings("client-id", "client-secret")
        .with_auth_url(format!("{}/oauth/authorize", server.uri()))
        .with_token_url(format!("{}/oauth/token", server.uri()))
}

/// HTTP client that behaves like a browser but does not follow redirects.
pub fn browser() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("browser client")
}
