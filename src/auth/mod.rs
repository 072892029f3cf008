//! OAuth local-callback flow and token storage.

pub mod callback;
pub mod error;
pub mod oauth;
pub mod service;
pub mod store;
pub mod token;

pub use callback::{AuthSession, PendingAuthorization, DEFAULT_PORT};
pub use error::AuthError;
pub use oauth::OAuthConfig;
pub use service::{get_token, AuthService};
pub use store::{load_token, resolve_token_path, save_token, FileTokenStore, TokenStore};
pub use token::Token;
