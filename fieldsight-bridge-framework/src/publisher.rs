//! Telemetry publisher for the cloud broker.

use async_trait::async_trait;
use serde::Serialize;

use fieldsight_common::{Format, TelemetryMessage, encode};

use crate::credentials::Credential;
use crate::error::{BridgeError, Result};
use crate::mqtt::MqttLink;

/// Destination for telemetry messages.
///
/// One call delivers one message; failures are independent per call.
#[async_trait]
pub trait TelemetrySink: Send + Sync {
    async fn publish(&self, message: &TelemetryMessage, credential: &Credential) -> Result<()>;
}

/// Publisher that delivers each message over its own MQTT exchange.
#[derive(Clone, Debug)]
pub struct Publisher {
    link: MqttLink,
    topic: String,
    format: Format,
}

impl Publisher {
    /// Create a new publisher sending telemetry to `topic`.
    pub fn new(link: MqttLink, topic: impl Into<String>, format: Format) -> Self {
        Self {
            link,
            topic: topic.into(),
            format,
        }
    }

    /// Get the telemetry topic.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Get the serialization format.
    pub fn format(&self) -> Format {
        self.format
    }

    /// Get the underlying broker link.
    pub fn link(&self) -> &MqttLink {
        &self.link
    }

    /// Publish raw bytes to a topic (for status messages, etc.).
    pub async fn publish_raw(
        &self,
        topic: &str,
        payload: Vec<u8>,
        credential: &Credential,
    ) -> Result<()> {
        self.link.publish_once(topic, payload, credential).await
    }

    /// Publish a JSON value to a topic.
    pub async fn publish_json<T: Serialize>(
        &self,
        topic: &str,
        value: &T,
        credential: &Credential,
    ) -> Result<()> {
        let payload = serde_json::to_vec(value)?;
        self.publish_raw(topic, payload, credential).await
    }
}

#[async_trait]
impl TelemetrySink for Publisher {
    async fn publish(&self, message: &TelemetryMessage, credential: &Credential) -> Result<()> {
        let payload =
            encode(message, self.format).map_err(|e| BridgeError::Serialization(e.to_string()))?;

        self.link.publish_once(&self.topic, payload, credential).await?;

        tracing::debug!(
            topic = %self.topic,
            measurement = %message.measurement,
            "Published telemetry"
        );

        Ok(())
    }
}

/// Statistics from publishing a cycle's messages.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PublishStats {
    /// Number of successfully published messages.
    pub success: usize,
    /// Number of failed publishes.
    pub failed: usize,
}

impl PublishStats {
    /// Total number of attempted publishes.
    pub fn total(&self) -> usize {
        self.success + self.failed
    }

    /// Success rate as a percentage.
    pub fn success_rate(&self) -> f64 {
        if self.total() == 0 {
            100.0
        } else {
            (self.success as f64 / self.total() as f64) * 100.0
        }
    }
}
