//! Configuration for the BACnet bridge.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use fieldsight_bridge_framework::{
    AuthConfig, BridgeConfig, BridgeError, BrokerConfig, DeviceIdentity, Format, LoggingConfig,
    Result, validate_common,
};

use crate::bacnet::object::MAX_INSTANCE;

/// Complete bridge configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacnetBridgeConfig {
    /// Cloud broker connection settings
    #[serde(default)]
    pub broker: BrokerConfig,

    /// Cloud device this bridge authenticates as
    pub device: DeviceIdentity,

    /// Token signing settings
    pub auth: AuthConfig,

    /// BACnet-specific settings
    pub bacnet: BacnetConfig,

    /// Telemetry payload encoding
    #[serde(default)]
    pub serialization: Format,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// BACnet protocol configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacnetConfig {
    /// Local UDP endpoint (default: 0.0.0.0:47808)
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,

    /// Seconds between ticks (default: 60)
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Per-request timeout in milliseconds (default: 3000)
    #[serde(default = "default_apdu_timeout_ms")]
    pub apdu_timeout_ms: u64,

    /// Identity of this collector on the BACnet network
    #[serde(default)]
    pub local_device: LocalDeviceConfig,

    /// Where the point set is read from on every tick
    #[serde(default)]
    pub points: PointSourceConfig,
}

impl BacnetConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn apdu_timeout(&self) -> Duration {
        Duration::from_millis(self.apdu_timeout_ms)
    }
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], crate::bacnet::BACNET_PORT))
}

fn default_poll_interval() -> u64 {
    60
}

fn default_apdu_timeout_ms() -> u64 {
    3000
}

/// Name and instance the collector reports in its status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalDeviceConfig {
    #[serde(default = "default_local_name")]
    pub name: String,

    #[serde(default = "default_local_instance")]
    pub instance: u32,
}

impl Default for LocalDeviceConfig {
    fn default() -> Self {
        Self {
            name: default_local_name(),
            instance: default_local_instance(),
        }
    }
}

fn default_local_name() -> String {
    "FieldSightCollector".to_string()
}

fn default_local_instance() -> u32 {
    599
}

/// Point set location.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum PointSourceConfig {
    /// The device configuration topic on the broker.
    #[default]
    Broker,
    /// A local JSON document.
    File { path: PathBuf },
}

impl BridgeConfig for BacnetBridgeConfig {
    fn broker(&self) -> &BrokerConfig {
        &self.broker
    }

    fn device(&self) -> &DeviceIdentity {
        &self.device
    }

    fn auth(&self) -> &AuthConfig {
        &self.auth
    }

    fn logging(&self) -> &LoggingConfig {
        &self.logging
    }

    fn serialization(&self) -> Format {
        self.serialization
    }

    fn validate(&self) -> Result<()> {
        validate_common(self)?;

        let bacnet = &self.bacnet;
        if bacnet.poll_interval_secs == 0 {
            return Err(BridgeError::validation(
                "bacnet.poll_interval_secs must be positive",
            ));
        }
        if bacnet.apdu_timeout_ms == 0 {
            return Err(BridgeError::validation(
                "bacnet.apdu_timeout_ms must be positive",
            ));
        }
        if bacnet.local_device.instance >= MAX_INSTANCE {
            return Err(BridgeError::validation(format!(
                "bacnet.local_device.instance must be below {}",
                MAX_INSTANCE
            )));
        }
        if let PointSourceConfig::File { path } = &bacnet.points {
            if path.as_os_str().is_empty() {
                return Err(BridgeError::validation("bacnet.points.path cannot be empty"));
            }
        }

        Ok(())
    }
}
