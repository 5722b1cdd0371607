use std::time::Duration;

use relay_util::http::Uri;
use relay_util::types::{ClientId, PropertyId, Secret, ThingId};

pub const DEFAULT_API_ENDPOINT: &str = "https://api2.arduino.cc";
pub const DEFAULT_AUDIENCE: &str = "https://api2.arduino.cc/iot";

/// Cloud API configuration
#[derive(Clone, Debug)]
pub struct CloudConfig {
    /// Scheme and authority of the API, paths are appended per call
    pub api_endpoint: Uri,

    /// Audience requested in the client credentials grant
    pub audience: String,

    /// Upper bound for each outbound request
    pub timeout: Duration,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            api_endpoint: Uri::from_static(DEFAULT_API_ENDPOINT),
            audience: DEFAULT_AUDIENCE.to_owned(),
            timeout: Duration::from_millis(30_000),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ClientCredentials {
    pub client_id: ClientId,
    pub client_secret: Secret,
}

/// The thing/property pair a measurement is published to
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropertyTarget {
    pub thing_id: ThingId,
    pub property_id: PropertyId,
}
