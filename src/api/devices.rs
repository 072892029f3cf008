//! Device and capability resources under a resolved endpoint.

use std::collections::BTreeMap;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::endpoint::Endpoint;
use super::http::SmartThingsClient;
use crate::error::{Result, SmartThingsError};

/// Entry of the `/devices` listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSummary {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub display_name: String,
}

/// Device summary plus its current attribute values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceDetail {
    #[serde(flatten)]
    pub summary: DeviceSummary,
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
}

/// A command a device accepts, with its parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceCommand {
    #[serde(alias = "name")]
    pub command: String,
    #[serde(default, alias = "arguments")]
    pub params: BTreeMap<String, Value>,
}

/// One reading from a capability endpoint such as `/temperature`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityReading {
    pub name: String,
    #[serde(default)]
    pub value: Value,
}

// One server revision wrapped the device array in another array.
#[derive(Deserialize)]
#[serde(untagged)]
enum DeviceListBody {
    Flat(Vec<DeviceSummary>),
    Wrapped(Vec<Vec<DeviceSummary>>),
}

impl DeviceListBody {
    fn into_devices(self) -> Vec<DeviceSummary> {
        match self {
            Self::Flat(devices) => devices,
            Self::Wrapped(lists) => lists.into_iter().next().unwrap_or_default(),
        }
    }
}

/// Resource calls against one endpoint.
///
/// # Example
/// ```no_run
/// use smartthings::prelude::*;
///
/// # use smartthings::error::Result;
/// # async fn example(client: SmartThingsClient, endpoint: Endpoint) -> Result<()> {
/// let devices = Devices::new(&client, &endpoint);
/// for summary in devices.list_devices().await? {
///     let detail = devices.get_device(&summary.id).await?;
///     println!("{}: {:?}", summary.display_name, detail.attributes);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Devices<'a> {
    client: &'a SmartThingsClient,
    endpoint: &'a Endpoint,
}

impl<'a> Devices<'a> {
    pub fn new(client: &'a SmartThingsClient, endpoint: &'a Endpoint) -> Self {
        Self { client, endpoint }
    }

    pub async fn list_devices(&self) -> Result<Vec<DeviceSummary>> {
        let body: DeviceListBody = self.client.get_json(&self.endpoint.join("devices")).await?;
        Ok(body.into_devices())
    }

    pub async fn get_device(&self, id: &str) -> Result<DeviceDetail> {
        let url = self.device_url(id, &[])?;
        self.client.get_json(&url).await
    }

    pub async fn get_device_commands(&self, id: &str) -> Result<Vec<DeviceCommand>> {
        let url = self.device_url(id, &["commands"])?;
        self.client.get_json(&url).await
    }

    /// Raw body of a capability endpoint, e.g. `temperature`.
    pub async fn get_capability_raw(&self, capability: &str) -> Result<Bytes> {
        self.client.get_bytes(&self.endpoint.join(capability)).await
    }

    pub async fn get_capability<T: DeserializeOwned>(&self, capability: &str) -> Result<T> {
        self.client.get_json(&self.endpoint.join(capability)).await
    }

    /// Capability readings as `{name, value}` pairs.
    pub async fn get_capability_readings(
        &self,
        capability: &str,
    ) -> Result<Vec<CapabilityReading>> {
        self.get_capability(capability).await
    }

    fn device_url(&self, id: &str, suffix: &[&str]) -> Result<String> {
        if id.is_empty() {
            return Err(SmartThingsError::InvalidArgument(
                "device id must not be empty".to_string(),
            ));
        }
        let mut url = url::Url::parse(&self.endpoint.uri).map_err(|e| {
            SmartThingsError::InvalidArgument(format!("invalid endpoint uri: {e}"))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                SmartThingsError::InvalidArgument("endpoint uri cannot be a base".to_string())
            })?
            .pop_if_empty()
            .push("devices")
            .push(id)
            .extend(suffix);
        Ok(url.into())
    }
}
