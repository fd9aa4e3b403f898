//! Where the point set comes from at the start of every tick.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use fieldsight_bridge_framework::{BridgeError, Credential, MqttLink};

use crate::points::{PointError, PointSet};

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("broker: {0}")]
    Broker(#[from] BridgeError),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Document(#[from] PointError),
}

/// Supplies the current point set.
#[async_trait]
pub trait PointSource: Send + Sync {
    async fn fetch(&self, credential: &Credential) -> Result<PointSet, SourceError>;
}

/// Fetches the point document from the device configuration topic.
pub struct BrokerPointSource {
    link: MqttLink,
    topic: String,
}

impl BrokerPointSource {
    pub fn new(link: MqttLink, topic: impl Into<String>) -> Self {
        Self {
            link,
            topic: topic.into(),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

#[async_trait]
impl PointSource for BrokerPointSource {
    async fn fetch(&self, credential: &Credential) -> Result<PointSet, SourceError> {
        let payload = self.link.receive_once(&self.topic, credential).await?;
        debug!(topic = %self.topic, bytes = payload.len(), "Received point document");
        Ok(PointSet::from_document(&payload)?)
    }
}

/// Reads the point document from a local file. The credential is unused.
pub struct FilePointSource {
    path: PathBuf,
}

impl FilePointSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl PointSource for FilePointSource {
    async fn fetch(&self, _credential: &Credential) -> Result<PointSet, SourceError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|source| SourceError::Io {
                path: self.path.display().to_string(),
                source,
            })?;
        Ok(PointSet::from_document(&bytes)?)
    }
}
