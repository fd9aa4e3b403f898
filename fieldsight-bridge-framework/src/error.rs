//! Error types for the bridge framework.

use thiserror::Error;

/// Result type alias using [`BridgeError`].
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Errors that can occur in a bridge.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file not found.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Configuration parse error.
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(String),

    /// Configuration validation error.
    #[error("Configuration validation failed: {0}")]
    ConfigValidation(String),

    /// Credential loading or signing error.
    #[error("Credential error: {0}")]
    Credential(String),

    /// Broker connection or protocol error.
    #[error("Broker error: {0}")]
    Broker(String),

    /// Broker exchange did not complete in time.
    #[error("Broker operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Publishing error.
    #[error("Failed to publish to {topic}: {message}")]
    Publish { topic: String, message: String },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a configuration validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ConfigValidation(msg.into())
    }

    /// Create a credential error.
    pub fn credential(msg: impl Into<String>) -> Self {
        Self::Credential(msg.into())
    }

    /// Create a broker error.
    pub fn broker(msg: impl Into<String>) -> Self {
        Self::Broker(msg.into())
    }
}

impl From<fieldsight_common::Error> for BridgeError {
    fn from(err: fieldsight_common::Error) -> Self {
        match err {
            fieldsight_common::Error::Config(msg) => Self::Config(msg),
            other => Self::Serialization(other.to_string()),
        }
    }
}

impl From<rumqttc::ClientError> for BridgeError {
    fn from(err: rumqttc::ClientError) -> Self {
        Self::Broker(err.to_string())
    }
}

impl From<rumqttc::ConnectionError> for BridgeError {
    fn from(err: rumqttc::ConnectionError) -> Self {
        Self::Broker(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for BridgeError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::Credential(err.to_string())
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<json5::Error> for BridgeError {
    fn from(err: json5::Error) -> Self {
        Self::ConfigParse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_errors_map_to_bridge_errors() {
        let err = BridgeError::from(fieldsight_common::Error::Config("bad level".into()));
        assert!(matches!(err, BridgeError::Config(ref msg) if msg == "bad level"));

        let err = BridgeError::from(fieldsight_common::Error::Cbor("eof".into()));
        assert!(matches!(err, BridgeError::Serialization(_)));
        assert_eq!(
            err.to_string(),
            "Serialization error: CBOR serialization error: eof"
        );
    }

    #[test]
    fn test_parse_errors_are_config_parse() {
        let err = BridgeError::from(json5::from_str::<serde_json::Value>("{").unwrap_err());
        assert!(matches!(err, BridgeError::ConfigParse(_)));
    }
}
