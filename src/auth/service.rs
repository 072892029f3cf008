use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use super::callback::{AuthSession, DEFAULT_PORT};
use super::error::AuthError;
use super::oauth::OAuthConfig;
use super::store::{FileTokenStore, TokenStore};
use super::token::Token;

type LoginPrompt = Arc<dyn Fn(&str) + Send + Sync>;

/// Load-or-authorize facade over a [`TokenStore`] and the callback flow.
///
/// Printing is left to the caller: register a prompt with
/// [`AuthService::with_login_prompt`] to show the login URL.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use smartthings::auth::{AuthService, FileTokenStore, OAuthConfig};
///
/// # async fn example() -> Result<(), smartthings::auth::AuthError> {
/// let store = Arc::new(FileTokenStore::from_name(".my_token.json")?);
/// let service = AuthService::new(store)
///     .with_login_prompt(|url| println!("Please login by visiting {url}"));
/// let token = service
///     .get_token(&OAuthConfig::smartthings("client", "secret"))
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct AuthService {
    store: Arc<dyn TokenStore>,
    port: u16,
    timeout: Option<Duration>,
    prompt: Option<LoginPrompt>,
}

impl fmt::Debug for AuthService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthService")
            .field("port", &self.port)
            .field("timeout", &self.timeout)
            .field("prompt", &self.prompt.as_ref().map(|_| ".."))
            .finish()
    }
}

impl AuthService {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self {
            store,
            port: DEFAULT_PORT,
            timeout: None,
            prompt: None,
        }
    }

    /// Port for the local callback server (0 picks a free one).
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Give up on the browser callback after `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_login_prompt(mut self, prompt: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.prompt = Some(Arc::new(prompt));
        self
    }

    /// Return the stored token when it is still valid, otherwise run a full
    /// authorization and persist the new token before returning it.
    pub async fn get_token(&self, config: &OAuthConfig) -> Result<Token, AuthError> {
        match self.store.load() {
            Ok(token) if token.is_valid() => return Ok(token),
            Ok(_) => debug!("stored token is expired or empty"),
            Err(err) => debug!(error = %err, "no usable stored token"),
        }
        let token = self.authorize(config).await?;
        self.store.save(&token)?;
        Ok(token)
    }

    /// Run the callback flow unconditionally. The token is not persisted.
    pub async fn authorize(&self, config: &OAuthConfig) -> Result<Token, AuthError> {
        if !config.has_credentials() {
            return Err(AuthError::MissingCredentials);
        }
        let pending = AuthSession::new(self.port, config.clone())?.listen().await?;
        let login_url = pending.login_url();
        info!(url = %login_url, "waiting for browser authorization");
        if let Some(prompt) = &self.prompt {
            prompt(&login_url);
        }
        match self.timeout {
            Some(timeout) => pending.wait_timeout(timeout).await,
            None => pending.wait().await,
        }
    }
}

/// Load the token from `token_file` or authorize on the default port.
///
/// `token_file` is resolved with
/// [`resolve_token_path`](super::store::resolve_token_path).
pub async fn get_token(token_file: &str, config: &OAuthConfig) -> Result<Token, AuthError> {
    let store = Arc::new(FileTokenStore::from_name(token_file)?);
    AuthService::new(store).get_token(config).await
}
