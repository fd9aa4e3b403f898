//! FieldSight Bridge Framework
//!
//! Common abstractions for building protocol bridges that publish telemetry to
//! a cloud MQTT broker.
//!
//! # Overview
//!
//! This framework provides:
//! - [`BridgeConfig`] trait for configuration loading and validation
//! - [`BridgeRunner`] for managing bridge lifecycle (startup, shutdown, signal handling)
//! - [`CredentialMinter`] / [`JwtMinter`] for per-operation broker tokens
//! - [`MqttLink`] for short, authenticated publish/receive exchanges
//! - [`TelemetrySink`] / [`Publisher`] for delivering telemetry messages
//! - [`BridgeArgs`] for common CLI argument parsing
//! - [`BridgeStatus`] for standardized status reporting
//!
//! # Example
//!
//! ```ignore
//! use fieldsight_bridge_framework::{BridgeArgs, BridgeConfig, BridgeRunner};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = BridgeArgs::parse_with_default("mybridge.json5");
//!     let config = MyBridgeConfig::load(&args.config)?;
//!
//!     let mut runner = BridgeRunner::new_with_args("mybridge", config, Some(&args))?;
//!
//!     // Spawn protocol-specific workers
//!     runner.spawn(my_worker(runner.publisher(), runner.minter()));
//!
//!     // Run until Ctrl+C
//!     runner.run().await
//! }
//! ```

mod args;
mod config;
mod credentials;
mod error;
mod mqtt;
mod publisher;
mod runner;
mod status;

pub use args::BridgeArgs;
pub use config::{BridgeConfig, validate_common};
pub use credentials::{
    AuthConfig, Credential, CredentialMinter, JwtMinter, TOKEN_USERNAME, TokenAlgorithm,
};
pub use error::{BridgeError, Result};
pub use mqtt::MqttLink;
pub use publisher::{PublishStats, Publisher, TelemetrySink};
pub use runner::BridgeRunner;
pub use status::BridgeStatus;

// Re-export commonly used types from fieldsight-common
pub use fieldsight_common::{
    BrokerConfig, DeviceIdentity, Format, LoggingConfig, TelemetryMessage, TelemetryValue,
};
