//! BACnet to cloud MQTT bridge.
//!
//! On every tick this bridge fetches a point set, reads each point from its
//! BACnet/IP device with a confirmed ReadProperty request (one request in
//! flight at a time), and publishes one telemetry message per point to the
//! device events topic.
//!
//! # Topics
//!
//! ```text
//! /devices/<device_id>/config   point set (subscribed once per tick)
//! /devices/<device_id>/events   telemetry
//! /devices/<device_id>/state    bridge status
//! ```
//!
//! # Payload
//!
//! ```json
//! {"measurement":"<point id>","value":89.0,"ts":1522875810604}
//! ```
//!
//! A point whose read failed is published with the diagnostic text as its value.

#[macro_use]
pub mod bacnet;
pub mod config;
pub mod points;
pub mod poller;
pub mod scheduler;
pub mod source;
pub mod transport;
