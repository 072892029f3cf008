//! SmartThings REST resources: authenticated client, endpoint resolution and
//! device/capability calls.

pub mod devices;
pub mod endpoint;
pub mod http;

pub use devices::{CapabilityReading, DeviceCommand, DeviceDetail, DeviceSummary, Devices};
pub use endpoint::{resolve, resolve_from, Endpoint, ENDPOINTS_URL};
pub use http::SmartThingsClient;
