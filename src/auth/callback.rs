//! Local OAuth callback server.
//!
//! Each [`AuthSession`] builds its own router and listener, so repeated or
//! concurrent authorization attempts never share routes. The callback handler
//! and the waiting caller are connected by a one-shot channel whose sender is
//! taken exactly once.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::error::AuthError;
use super::oauth::{exchange_code, generate_state, OAuthConfig};
use super::token::Token;

/// Default port for the local callback server.
pub const DEFAULT_PORT: u16 = 4567;

pub const ROOT_PATH: &str = "/";
pub const DONE_PATH: &str = "/OauthDone";
pub const CALLBACK_PATH: &str = "/OAuthCallback";

const AUTH_DONE_PAGE: &str = "<html><body>Authentication Completed.</body></html>";
const AUTH_ERROR_PAGE: &str =
    "<html><body>Authentication error. Please see terminal output for details.</body></html>";

/// How long the server keeps serving after the result so the browser can
/// follow the redirect to the done page.
const DONE_PAGE_GRACE: Duration = Duration::from_secs(5);

type AuthResult = Result<Token, AuthError>;

/// One authorization attempt: port, client configuration and the random
/// anti-forgery state sent to the provider.
///
/// # Example
/// ```no_run
/// use smartthings::auth::{AuthSession, OAuthConfig};
///
/// # async fn example() -> Result<(), smartthings::auth::AuthError> {
/// let config = OAuthConfig::smartthings("client", "secret");
/// let pending = AuthSession::new(4567, config)?.listen().await?;
/// println!("Please login by visiting {}", pending.login_url());
/// let token = pending.wait().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct AuthSession {
    port: u16,
    config: OAuthConfig,
    state: String,
    http: reqwest::Client,
}

impl AuthSession {
    pub fn new(port: u16, config: OAuthConfig) -> Result<Self, AuthError> {
        Ok(Self {
            port,
            config,
            state: generate_state()?,
            http: reqwest::Client::new(),
        })
    }

    /// Use a specific HTTP client for the code exchange.
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn authorize_url(&self) -> Result<String, AuthError> {
        self.config.authorize_url(&self.state)
    }

    /// Bind the callback server and start serving it on a background task.
    pub async fn listen(self) -> Result<PendingAuthorization, AuthError> {
        let authorize_url = self.authorize_url()?;
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, self.port))
            .await
            .map_err(|e| {
                AuthError::Io(format!(
                    "failed to bind callback server on port {}: {e}",
                    self.port
                ))
            })?;
        let local_addr = listener.local_addr()?;

        let (tx, rx) = oneshot::channel();
        let callback = Arc::new(CallbackState {
            config: self.config,
            state: self.state,
            http: self.http,
            result: Mutex::new(Some(tx)),
        });
        let router = callback_router(authorize_url, callback);

        let shutdown = CancellationToken::new();
        let server_shutdown = shutdown.clone();
        tokio::spawn(async move {
            let server = axum::serve(listener, router)
                .with_graceful_shutdown(async move { server_shutdown.cancelled().await });
            if let Err(err) = server.await {
                warn!(error = %err, "oauth callback server failed");
            }
            debug!(%local_addr, "oauth callback server stopped");
        });
        debug!(%local_addr, "oauth callback server listening");

        Ok(PendingAuthorization {
            local_addr,
            receiver: rx,
            shutdown,
        })
    }

    /// Run the whole flow: listen, then block until the callback delivers.
    pub async fn fetch_token(self) -> AuthResult {
        self.listen().await?.wait().await
    }
}

/// A running callback server waiting for the provider redirect.
#[derive(Debug)]
pub struct PendingAuthorization {
    local_addr: SocketAddr,
    receiver: oneshot::Receiver<AuthResult>,
    shutdown: CancellationToken,
}

impl PendingAuthorization {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// URL the user opens to start the authorization.
    pub fn login_url(&self) -> String {
        format!("http://localhost:{}{}", self.local_addr.port(), ROOT_PATH)
    }

    /// Wait for the callback result. There is no timeout.
    pub async fn wait(self) -> AuthResult {
        let result = self.receiver.await.unwrap_or(Err(AuthError::CallbackClosed));
        stop_after_grace(self.shutdown);
        result
    }

    /// Wait until the callback arrives or `cancel` fires.
    pub async fn wait_with_cancel(self, cancel: CancellationToken) -> AuthResult {
        tokio::select! {
            result = self.receiver => {
                stop_after_grace(self.shutdown);
                result.unwrap_or(Err(AuthError::CallbackClosed))
            }
            _ = cancel.cancelled() => {
                self.shutdown.cancel();
                Err(AuthError::Cancelled)
            }
        }
    }

    /// Wait at most `duration` for the callback.
    pub async fn wait_timeout(self, duration: Duration) -> AuthResult {
        let shutdown = self.shutdown.clone();
        match tokio::time::timeout(duration, self.wait()).await {
            Ok(result) => result,
            Err(_) => {
                shutdown.cancel();
                Err(AuthError::Timeout(timeout_millis(duration)))
            }
        }
    }
}

fn timeout_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn stop_after_grace(shutdown: CancellationToken) {
    tokio::spawn(async move {
        tokio::time::sleep(DONE_PAGE_GRACE).await;
        shutdown.cancel();
    });
}

struct CallbackState {
    config: OAuthConfig,
    state: String,
    http: reqwest::Client,
    result: Mutex<Option<oneshot::Sender<AuthResult>>>,
}

impl CallbackState {
    fn take_sender(&self) -> Option<oneshot::Sender<AuthResult>> {
        self.result.lock().ok().and_then(|mut slot| slot.take())
    }
}

#[derive(Debug, Deserialize)]
struct CallbackParams {
    state: Option<String>,
    code: Option<String>,
    error: Option<String>,
}

fn callback_router(authorize_url: String, callback: Arc<CallbackState>) -> Router {
    Router::new()
        .route(
            ROOT_PATH,
            get(move || {
                let url = authorize_url.clone();
                async move { Redirect::temporary(&url) }
            }),
        )
        .route(DONE_PATH, get(|| async { Html(AUTH_DONE_PAGE) }))
        .route(CALLBACK_PATH, get(handle_callback))
        .with_state(callback)
}

async fn handle_callback(
    State(callback): State<Arc<CallbackState>>,
    Query(params): Query<CallbackParams>,
) -> Response {
    let Some(sender) = callback.take_sender() else {
        debug!("ignoring callback after the result was delivered");
        return (StatusCode::GONE, Html(AUTH_ERROR_PAGE)).into_response();
    };

    let received = params.state.unwrap_or_default();
    if received != callback.state {
        warn!("oauth callback state mismatch");
        let _ = sender.send(Err(AuthError::StateMismatch {
            expected: callback.state.clone(),
            received,
        }));
        return (StatusCode::BAD_REQUEST, Html(AUTH_ERROR_PAGE)).into_response();
    }

    if let Some(error) = params.error {
        warn!(%error, "provider denied authorization");
        let _ = sender.send(Err(AuthError::AccessDenied(error)));
        return (StatusCode::FORBIDDEN, Html(AUTH_ERROR_PAGE)).into_response();
    }

    let code = params.code.unwrap_or_default();
    if code.is_empty() {
        let _ = sender.send(Err(AuthError::Exchange(
            "callback did not contain an authorization code".to_string(),
        )));
        return (StatusCode::BAD_REQUEST, Html(AUTH_ERROR_PAGE)).into_response();
    }

    // The sender lives on the exchange task: a dropped browser connection
    // must not drop it.
    let exchange = tokio::spawn(async move {
        let result = exchange_code(&callback.http, &callback.config, &code).await;
        let succeeded = match &result {
            Ok(_) => {
                info!("oauth authorization completed");
                true
            }
            Err(err) => {
                warn!(error = %err, "oauth code exchange failed");
                false
            }
        };
        let _ = sender.send(result);
        succeeded
    });

    match exchange.await {
        Ok(true) => Redirect::temporary(DONE_PATH).into_response(),
        _ => (StatusCode::BAD_GATEWAY, Html(AUTH_ERROR_PAGE)).into_response(),
    }
}
