//! Convenience re-exports for common use.

pub use crate::api::devices::{
    CapabilityReading, DeviceCommand, DeviceDetail, DeviceSummary, Devices,
};
pub use crate::api::endpoint::Endpoint;
pub use crate::api::http::SmartThingsClient;
pub use crate::auth::{AuthError, AuthService, AuthSession, OAuthConfig, Token};
pub use crate::config::SmartThingsConfig;
pub use crate::error::{Result, SmartThingsError};
