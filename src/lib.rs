//! SmartThings API client.
//!
//! Obtains an OAuth2 token through a short-lived local callback server,
//! persists it as a JSON file, resolves the per-account API endpoint and reads
//! devices and capabilities from it.
//!
//! # Quick Start
//!
//! ```no_run
//! use smartthings::prelude::*;
//!
//! # async fn example() -> smartthings::error::Result<()> {
//! let config = OAuthConfig::smartthings("client-id", "client-secret");
//! let token = smartthings::auth::get_token("", &config).await?;
//!
//! let client = SmartThingsClient::new(token);
//! let endpoint = smartthings::api::endpoint::resolve(&client).await?;
//! for device in Devices::new(&client, &endpoint).list_devices().await? {
//!     println!("{} ({})", device.display_name, device.id);
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod prelude;

#[cfg(feature = "cli")]
pub mod cli;
