//! Point definitions and the point-set document.
//!
//! The document maps device names to an address and the points read from
//! that device:
//!
//! ```json
//! {
//!   "protocol": {
//!     "bacnet": {
//!       "ahu-1": {
//!         "address": "192.168.1.20",
//!         "points": [
//!           { "uuid": "supply-temp", "type": "analogInput", "instance": 1, "property": "presentValue" }
//!         ]
//!       }
//!     }
//!   }
//! }
//! ```

use std::collections::VecDeque;

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::bacnet::object::{MAX_INSTANCE, ObjectIdentifier, ObjectType, PropertyIdentifier};

/// Errors raised while interpreting a point-set document.
#[derive(Debug, thiserror::Error)]
pub enum PointError {
    #[error("point document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("point document has no '{0}' section")]
    MissingSection(&'static str),

    #[error("device '{device}': {message}")]
    InvalidDevice { device: String, message: String },

    #[error("device '{device}', point '{point}': {message}")]
    InvalidPoint {
        device: String,
        point: String,
        message: String,
    },
}

/// One readable property on one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Point {
    /// Identifier used as the telemetry measurement name.
    pub id: String,
    /// Name of the device entry the point came from.
    pub device: String,
    pub address: String,
    pub object: ObjectIdentifier,
    pub property: PropertyIdentifier,
    pub array_index: Option<u32>,
}

/// Points keyed by id, in document order.
///
/// Re-inserting an id replaces its definition but keeps its original position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointSet {
    points: IndexMap<String, Point>,
}

impl PointSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a point, returning the definition it replaced.
    pub fn insert(&mut self, point: Point) -> Option<Point> {
        self.points.insert(point.id.clone(), point)
    }

    pub fn get(&self, id: &str) -> Option<&Point> {
        self.points.get(id)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Point> {
        self.points.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.points.keys().map(String::as_str)
    }

    /// Consume the set into a FIFO of pending reads.
    pub fn into_queue(self) -> VecDeque<Point> {
        self.points.into_values().collect()
    }

    /// Parse a point-set document.
    pub fn from_document(bytes: &[u8]) -> Result<Self, PointError> {
        let document: Document = serde_json::from_slice(bytes)?;
        let devices = document
            .protocol
            .ok_or(PointError::MissingSection("protocol"))?
            .bacnet
            .ok_or(PointError::MissingSection("bacnet"))?;

        let mut set = PointSet::new();
        for (device, entry) in devices {
            let entry: DeviceEntry =
                serde_json::from_value(entry).map_err(|e| PointError::InvalidDevice {
                    device: device.clone(),
                    message: e.to_string(),
                })?;

            for raw in entry.points {
                let point = parse_point(raw, &device, &entry.address)?;
                set.insert(point);
            }
        }
        Ok(set)
    }
}

impl FromIterator<Point> for PointSet {
    fn from_iter<I: IntoIterator<Item = Point>>(iter: I) -> Self {
        let mut set = PointSet::new();
        for point in iter {
            set.insert(point);
        }
        set
    }
}

impl IntoIterator for PointSet {
    type Item = Point;
    type IntoIter = indexmap::map::IntoValues<String, Point>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.into_values()
    }
}

#[derive(Deserialize)]
struct Document {
    protocol: Option<ProtocolSection>,
}

#[derive(Deserialize)]
struct ProtocolSection {
    bacnet: Option<Map<String, Value>>,
}

#[derive(Deserialize)]
struct DeviceEntry {
    address: String,
    #[serde(default)]
    points: Vec<Value>,
}

#[derive(Deserialize)]
struct PointEntry {
    uuid: String,
    #[serde(rename = "type")]
    object_type: ObjectType,
    instance: u32,
    property: PropertyIdentifier,
    #[serde(default)]
    index: Option<u32>,
}

fn parse_point(raw: Value, device: &str, address: &str) -> Result<Point, PointError> {
    let label = raw
        .get("uuid")
        .and_then(Value::as_str)
        .unwrap_or("<unnamed>")
        .to_string();
    let invalid = |message: String| PointError::InvalidPoint {
        device: device.to_string(),
        point: label.clone(),
        message,
    };

    let entry: PointEntry = serde_json::from_value(raw).map_err(|e| invalid(e.to_string()))?;

    if entry.uuid.is_empty() {
        return Err(invalid("uuid cannot be empty".into()));
    }
    if address.trim().is_empty() {
        return Err(invalid("device address cannot be empty".into()));
    }
    if entry.instance > MAX_INSTANCE {
        return Err(invalid(format!(
            "instance {} exceeds {}",
            entry.instance, MAX_INSTANCE
        )));
    }

    Ok(Point {
        id: entry.uuid,
        device: device.to_string(),
        address: address.to_string(),
        object: ObjectIdentifier::new(entry.object_type, entry.instance),
        property: entry.property,
        array_index: entry.index,
    })
}
