//! In-memory collaborators for driving the poller.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Notify, Semaphore};

use fieldsight_bridge_framework::{
    BridgeError, Credential, CredentialMinter, TelemetryMessage, TelemetrySink,
};
use mqtt_bridge_bacnet::bacnet::{
    ApplicationValue, ObjectIdentifier, ObjectType, PropertyIdentifier,
};
use mqtt_bridge_bacnet::points::{Point, PointError, PointSet};
use mqtt_bridge_bacnet::poller::Poller;
use mqtt_bridge_bacnet::source::{PointSource, SourceError};
use mqtt_bridge_bacnet::transport::{ReadAck, ReadRequest, Transport, TransportError};

pub fn point(
    id: &str,
    object_type: ObjectType,
    instance: u32,
    property: PropertyIdentifier,
) -> Point {
    Point {
        id: id.to_string(),
        device: "dev".to_string(),
        address: "10.0.0.10".to_string(),
        object: ObjectIdentifier::new(object_type, instance),
        property,
        array_index: None,
    }
}

pub fn present_value(id: &str, object_type: ObjectType, instance: u32) -> Point {
    point(id, object_type, instance, PropertyIdentifier::PresentValue)
}

/// Serves a fixed point set, or fails every fetch.
pub struct StaticSource {
    points: Option<PointSet>,
    fetches: AtomicUsize,
}

impl StaticSource {
    pub fn new(points: impl IntoIterator<Item = Point>) -> Arc<Self> {
        Arc::new(Self {
            points: Some(points.into_iter().collect()),
            fetches: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            points: None,
            fetches: AtomicUsize::new(0),
        })
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PointSource for StaticSource {
    async fn fetch(&self, _credential: &Credential) -> Result<PointSet, SourceError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.points
            .clone()
            .ok_or(SourceError::Document(PointError::MissingSection("protocol")))
    }
}

/// How the scripted device answers one object.
#[derive(Clone)]
pub enum Reply {
    Value(ApplicationValue),
    /// Wait the given time, then report a timeout.
    Timeout(Duration),
    /// Never answer.
    Hang,
    /// Panic the first time, answer with the value afterwards.
    PanicOnce(ApplicationValue),
}

#[derive(Clone)]
struct Script {
    delay: Duration,
    reply: Reply,
}

/// Transport answering from a per-object script and recording what it saw.
#[derive(Default)]
pub struct ScriptedTransport {
    scripts: HashMap<ObjectIdentifier, Script>,
    requests: Mutex<Vec<ObjectIdentifier>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    panicked: AtomicBool,
    /// Signalled when a request arrives.
    pub started: Notify,
    /// When set, each reply waits for a permit.
    gate: Option<Semaphore>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gated() -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::default()
        }
    }

    pub fn reply(mut self, object: ObjectIdentifier, delay: Duration, reply: Reply) -> Self {
        self.scripts.insert(object, Script { delay, reply });
        self
    }

    pub fn open_gate(&self, permits: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(permits);
        }
    }

    pub fn requests(&self) -> Vec<ObjectIdentifier> {
        self.requests.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn read_property(&self, request: &ReadRequest) -> Result<ReadAck, TransportError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _in_flight = InFlight(&self.in_flight);
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.object);
        self.started.notify_one();

        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }

        let script = self
            .scripts
            .get(&request.object)
            .cloned()
            .unwrap_or_else(|| panic!("no script for {}", request.object));

        tokio::time::sleep(script.delay).await;

        let value = match script.reply {
            Reply::Value(value) => value,
            Reply::Timeout(after) => {
                tokio::time::sleep(after).await;
                return Err(TransportError::Timeout(after));
            }
            Reply::Hang => std::future::pending().await,
            Reply::PanicOnce(value) => {
                if !self.panicked.swap(true, Ordering::SeqCst) {
                    panic!("device exploded");
                }
                value
            }
        };

        Ok(ReadAck {
            object: request.object,
            property: request.property,
            array_index: request.array_index,
            values: vec![value],
        })
    }
}

/// Sink that records messages and the token each one was sent with.
#[derive(Default)]
pub struct RecordingSink {
    published: Mutex<Vec<(TelemetryMessage, String)>>,
    reject: Option<String>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Fail every publish for `measurement`.
    pub fn rejecting(measurement: &str) -> Arc<Self> {
        Arc::new(Self {
            reject: Some(measurement.to_string()),
            ..Self::default()
        })
    }

    pub fn messages(&self) -> Vec<TelemetryMessage> {
        self.published
            .lock()
            .unwrap()
            .iter()
            .map(|(m, _)| m.clone())
            .collect()
    }

    pub fn tokens(&self) -> Vec<String> {
        self.published
            .lock()
            .unwrap()
            .iter()
            .map(|(_, t)| t.clone())
            .collect()
    }

    pub fn measurements(&self) -> Vec<String> {
        self.messages().into_iter().map(|m| m.measurement).collect()
    }
}

#[async_trait]
impl TelemetrySink for RecordingSink {
    async fn publish(
        &self,
        message: &TelemetryMessage,
        credential: &Credential,
    ) -> fieldsight_bridge_framework::Result<()> {
        if self.reject.as_deref() == Some(message.measurement.as_str()) {
            return Err(BridgeError::Publish {
                topic: "/devices/test/events".into(),
                message: "not authorized".into(),
            });
        }
        self.published
            .lock()
            .unwrap()
            .push((message.clone(), credential.password.clone()));
        Ok(())
    }
}

/// Minter that hands out numbered tokens.
#[derive(Default)]
pub struct CountingMinter {
    minted: AtomicUsize,
}

impl CountingMinter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn minted(&self) -> usize {
        self.minted.load(Ordering::SeqCst)
    }
}

impl CredentialMinter for CountingMinter {
    fn mint(&self) -> fieldsight_bridge_framework::Result<Credential> {
        let n = self.minted.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Credential {
            username: "unused".into(),
            password: format!("token-{n}"),
            issued_at: 0,
            expires_at: 300,
        })
    }
}

/// Everything a poller test needs to inspect afterwards.
pub struct Harness {
    pub poller: Poller,
    pub source: Arc<StaticSource>,
    pub transport: Arc<ScriptedTransport>,
    pub sink: Arc<RecordingSink>,
    pub minter: Arc<CountingMinter>,
}

impl Harness {
    pub fn new(
        source: Arc<StaticSource>,
        transport: ScriptedTransport,
        sink: Arc<RecordingSink>,
    ) -> Self {
        let transport = Arc::new(transport);
        let minter = CountingMinter::new();
        let poller = Poller::new(
            source.clone(),
            transport.clone(),
            sink.clone(),
            minter.clone(),
        );
        Self {
            poller,
            source,
            transport,
            sink,
            minter,
        }
    }
}
