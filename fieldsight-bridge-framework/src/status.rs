//! Bridge status reporting.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::Result;
use crate::credentials::CredentialMinter;
use crate::publisher::Publisher;

/// Bridge status information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeStatus {
    /// Bridge name (e.g., "bacnet").
    pub bridge: String,
    /// Bridge version.
    pub version: String,
    /// Current status ("running", "offline", "error").
    pub status: String,
    /// Additional metadata (protocol-specific).
    #[serde(flatten)]
    pub metadata: serde_json::Value,
}

impl BridgeStatus {
    /// Create a new status with "running" state.
    pub fn running(bridge: impl Into<String>, version: impl Into<String>) -> Self {
        Self::with_state(bridge, version, "running")
    }

    /// Create a status with "offline" state.
    pub fn offline(bridge: impl Into<String>, version: impl Into<String>) -> Self {
        Self::with_state(bridge, version, "offline")
    }

    /// Create a status with "error" state.
    pub fn error(
        bridge: impl Into<String>,
        version: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self::with_state(bridge, version, "error")
            .with_metadata(serde_json::json!({ "error": error.into() }))
    }

    fn with_state(bridge: impl Into<String>, version: impl Into<String>, status: &str) -> Self {
        Self {
            bridge: bridge.into(),
            version: version.into(),
            status: status.to_string(),
            metadata: serde_json::Value::Null,
        }
    }

    /// Add metadata to the status.
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Publishes bridge status to the device state topic on startup and shutdown.
pub struct StatusPublisher {
    publisher: Publisher,
    minter: Arc<dyn CredentialMinter>,
    topic: String,
    bridge_name: String,
    version: String,
}

impl StatusPublisher {
    /// Create a new status publisher.
    pub fn new(
        publisher: Publisher,
        minter: Arc<dyn CredentialMinter>,
        topic: impl Into<String>,
        bridge_name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            publisher,
            minter,
            topic: topic.into(),
            bridge_name: bridge_name.into(),
            version: version.into(),
        }
    }

    async fn publish(&self, status: &BridgeStatus) -> Result<()> {
        let credential = self.minter.mint()?;
        self.publisher
            .publish_json(&self.topic, status, &credential)
            .await
    }

    /// Publish "running" status with optional metadata.
    pub async fn publish_running(&self, metadata: Option<serde_json::Value>) -> Result<()> {
        let mut status = BridgeStatus::running(&self.bridge_name, &self.version);
        if let Some(meta) = metadata {
            status = status.with_metadata(meta);
        }
        self.publish(&status).await
    }

    /// Publish "offline" status.
    pub async fn publish_offline(&self) -> Result<()> {
        self.publish(&BridgeStatus::offline(&self.bridge_name, &self.version))
            .await
    }

    /// Publish "error" status.
    pub async fn publish_error(&self, error: impl Into<String>) -> Result<()> {
        self.publish(&BridgeStatus::error(&self.bridge_name, &self.version, error))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_running() {
        let status = BridgeStatus::running("bacnet", "0.2.0");
        assert_eq!(status.bridge, "bacnet");
        assert_eq!(status.status, "running");
    }

    #[test]
    fn test_status_error_carries_message() {
        let status = BridgeStatus::error("bacnet", "0.2.0", "bind failed");
        assert_eq!(status.status, "error");
        assert_eq!(status.metadata["error"], "bind failed");
    }

    #[test]
    fn test_status_serialization() {
        let status = BridgeStatus::running("bacnet", "1.0.0").with_metadata(serde_json::json!({
            "poll_interval_secs": 60,
            "point_source": "broker"
        }));

        let json = serde_json::to_string(&status).unwrap();
        assert!(json.contains("\"bridge\":\"bacnet\""));
        assert!(json.contains("\"status\":\"running\""));
        assert!(json.contains("\"poll_interval_secs\":60"));
    }

    #[test]
    fn test_offline_status_has_no_metadata_fields() {
        let json = serde_json::to_value(BridgeStatus::offline("bacnet", "1.0.0")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "bridge": "bacnet", "version": "1.0.0", "status": "offline" })
        );
    }
}
