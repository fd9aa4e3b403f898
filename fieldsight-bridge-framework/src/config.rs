//! Configuration traits and utilities.

use std::path::Path;

use serde::de::DeserializeOwned;

use crate::credentials::AuthConfig;
use crate::error::{BridgeError, Result};
use crate::{BrokerConfig, DeviceIdentity, Format, LoggingConfig};

/// Trait for bridge configuration types.
///
/// Implement this trait for your bridge's configuration struct to get
/// automatic loading, validation, and access to common config fields.
///
/// # Example
///
/// ```ignore
/// use serde::Deserialize;
/// use fieldsight_bridge_framework::{AuthConfig, BridgeConfig, BrokerConfig, DeviceIdentity, LoggingConfig};
///
/// #[derive(Debug, Deserialize)]
/// pub struct MyBridgeConfig {
///     pub broker: BrokerConfig,
///     pub device: DeviceIdentity,
///     pub auth: AuthConfig,
///     pub logging: LoggingConfig,
///     pub my_protocol: MyProtocolConfig,
/// }
///
/// impl BridgeConfig for MyBridgeConfig {
///     fn broker(&self) -> &BrokerConfig { &self.broker }
///     fn device(&self) -> &DeviceIdentity { &self.device }
///     fn auth(&self) -> &AuthConfig { &self.auth }
///     fn logging(&self) -> &LoggingConfig { &self.logging }
/// }
/// ```
pub trait BridgeConfig: Sized + DeserializeOwned {
    /// Get the broker connection settings.
    fn broker(&self) -> &BrokerConfig;

    /// Get the cloud device this bridge authenticates as.
    fn device(&self) -> &DeviceIdentity;

    /// Get the credential settings.
    fn auth(&self) -> &AuthConfig;

    /// Get the logging configuration.
    fn logging(&self) -> &LoggingConfig;

    /// Get the telemetry serialization format.
    fn serialization(&self) -> Format {
        Format::Json
    }

    /// Validate the configuration.
    ///
    /// Called automatically after loading. Override to add custom validation;
    /// call [`validate_common`] from the override to keep the shared checks.
    fn validate(&self) -> Result<()> {
        validate_common(self)
    }

    /// Load configuration from a file path.
    ///
    /// Supports JSON5 format. Calls [`validate`](Self::validate) after loading.
    fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(BridgeError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse and validate configuration from a JSON5 string.
    fn parse(content: &str) -> Result<Self> {
        let config: Self = json5::from_str(content)?;
        config.validate()?;
        Ok(config)
    }
}

/// Checks shared by every bridge configuration.
pub fn validate_common<C: BridgeConfig>(config: &C) -> Result<()> {
    config.device().validate().map_err(BridgeError::validation)?;

    let broker = config.broker();
    if broker.host.is_empty() {
        return Err(BridgeError::validation("broker.host cannot be empty"));
    }
    if broker.keep_alive_secs < 5 {
        return Err(BridgeError::validation(
            "broker.keep_alive_secs must be at least 5",
        ));
    }
    if broker.operation_timeout_secs == 0 {
        return Err(BridgeError::validation(
            "broker.operation_timeout_secs must be positive",
        ));
    }
    if config.auth().token_ttl_secs == 0 {
        return Err(BridgeError::validation("auth.token_ttl_secs must be positive"));
    }

    Ok(())
}
