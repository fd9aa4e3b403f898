//! Cloud device identity and MQTT topic builders.
//!
//! A bridge authenticates as one registered cloud device and talks on that
//! device's channels:
//!
//! ```text
//! /devices/<device_id>/config   (broker -> bridge, point configuration)
//! /devices/<device_id>/events   (bridge -> broker, telemetry)
//! /devices/<device_id>/state    (bridge -> broker, bridge status)
//! ```

use serde::{Deserialize, Serialize};

/// Default cloud region for the device registry.
pub const DEFAULT_REGION: &str = "us-central1";

/// Per-device MQTT channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Config,
    Events,
    State,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Config => "config",
            Channel::Events => "events",
            Channel::State => "state",
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Identity of the registered cloud device this bridge acts as.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceIdentity {
    /// Cloud project; also the token audience.
    pub project_id: String,

    /// Registry region.
    #[serde(default = "default_region")]
    pub region: String,

    /// Device registry.
    pub registry_id: String,

    /// Device id within the registry.
    pub device_id: String,
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

impl DeviceIdentity {
    /// Build the fully qualified MQTT client id.
    ///
    /// # Example
    /// ```
    /// use fieldsight_common::topic::DeviceIdentity;
    ///
    /// let identity = DeviceIdentity {
    ///     project_id: "plant".into(),
    ///     region: "us-central1".into(),
    ///     registry_id: "hvac".into(),
    ///     device_id: "gw-01".into(),
    /// };
    /// assert_eq!(
    ///     identity.client_id(),
    ///     "projects/plant/locations/us-central1/registries/hvac/devices/gw-01"
    /// );
    /// ```
    pub fn client_id(&self) -> String {
        format!(
            "projects/{}/locations/{}/registries/{}/devices/{}",
            self.project_id, self.region, self.registry_id, self.device_id
        )
    }

    /// Build the topic for one of this device's channels.
    ///
    /// # Example
    /// ```
    /// use fieldsight_common::topic::{Channel, DeviceIdentity};
    ///
    /// let identity = DeviceIdentity {
    ///     project_id: "plant".into(),
    ///     region: "us-central1".into(),
    ///     registry_id: "hvac".into(),
    ///     device_id: "gw-01".into(),
    /// };
    /// assert_eq!(identity.topic(Channel::Events), "/devices/gw-01/events");
    /// ```
    pub fn topic(&self, channel: Channel) -> String {
        format!("/devices/{}/{}", self.device_id, channel.as_str())
    }

    pub fn config_topic(&self) -> String {
        self.topic(Channel::Config)
    }

    pub fn events_topic(&self) -> String {
        self.topic(Channel::Events)
    }

    pub fn state_topic(&self) -> String {
        self.topic(Channel::State)
    }

    /// Check that no component is empty or contains a topic separator.
    pub fn validate(&self) -> Result<(), String> {
        for (field, value) in [
            ("project_id", &self.project_id),
            ("region", &self.region),
            ("registry_id", &self.registry_id),
            ("device_id", &self.device_id),
        ] {
            if value.is_empty() {
                return Err(format!("{} cannot be empty", field));
            }
            if value.contains('/') {
                return Err(format!("{} cannot contain '/': '{}'", field, value));
            }
        }
        Ok(())
    }
}
