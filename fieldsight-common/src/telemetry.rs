use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// A single telemetry message as delivered to the broker.
///
/// Wire shape: `{"measurement": "<point id>", "value": <value>, "ts": <epoch ms>}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryMessage {
    /// Point identifier the value belongs to.
    pub measurement: String,

    /// The measured value, or a diagnostic text when the read failed.
    pub value: TelemetryValue,

    /// Unix epoch milliseconds when the message was built.
    pub ts: i64,
}

impl TelemetryMessage {
    /// Create a new message stamped with the current time.
    pub fn new(measurement: impl Into<String>, value: TelemetryValue) -> Self {
        Self {
            measurement: measurement.into(),
            value,
            ts: current_timestamp_millis(),
        }
    }

    /// Override the timestamp.
    pub fn with_timestamp(mut self, ts: i64) -> Self {
        self.ts = ts;
        self
    }
}

/// Typed telemetry value.
///
/// Serialized without a tag, so a payload carries the bare scalar. Reading a
/// payload back infers the variant from its shape: octet strings come back
/// as a [`TelemetryValue::List`] of numbers, never as `Binary`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum TelemetryValue {
    /// Explicit absence of a value.
    Null,

    /// Boolean value.
    Boolean(bool),

    /// Unsigned integer (counts, enumerations).
    Unsigned(u64),

    /// Signed integer.
    Signed(i64),

    /// Floating point value.
    Real(f64),

    /// Text value.
    Text(String),

    /// Ordered sequence of values.
    List(Vec<TelemetryValue>),

    /// Binary data. Serialized as an array of octets.
    Binary(Vec<u8>),
}

impl TelemetryValue {
    /// Whether this is a text value.
    pub fn is_text(&self) -> bool {
        matches!(self, TelemetryValue::Text(_))
    }
}

impl From<u64> for TelemetryValue {
    fn from(v: u64) -> Self {
        TelemetryValue::Unsigned(v)
    }
}

impl From<i64> for TelemetryValue {
    fn from(v: i64) -> Self {
        TelemetryValue::Signed(v)
    }
}

impl From<f64> for TelemetryValue {
    fn from(v: f64) -> Self {
        TelemetryValue::Real(v)
    }
}

impl From<String> for TelemetryValue {
    fn from(v: String) -> Self {
        TelemetryValue::Text(v)
    }
}

impl From<&str> for TelemetryValue {
    fn from(v: &str) -> Self {
        TelemetryValue::Text(v.to_string())
    }
}

impl From<bool> for TelemetryValue {
    fn from(v: bool) -> Self {
        TelemetryValue::Boolean(v)
    }
}

impl From<Vec<u8>> for TelemetryValue {
    fn from(v: Vec<u8>) -> Self {
        TelemetryValue::Binary(v)
    }
}

/// Get the current timestamp in milliseconds since Unix epoch.
///
/// Returns 0 if system time is before Unix epoch (should never happen in practice).
pub fn current_timestamp_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
