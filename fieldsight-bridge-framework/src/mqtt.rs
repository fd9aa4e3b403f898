//! Short-lived MQTT exchanges with the cloud broker.
//!
//! Each operation opens its own authenticated connection, performs exactly
//! one exchange and disconnects:
//!
//! - [`MqttLink::publish_once`]: publish at QoS 1 and wait for the PUBACK
//! - [`MqttLink::receive_once`]: subscribe at QoS 1 and wait for the first message
//!
//! Both are bounded by the broker's operation timeout.

use std::sync::Arc;
use std::time::Duration;

use rumqttc::{
    AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS, SubscribeReasonCode,
    TlsConfiguration, Transport,
};

use fieldsight_common::{BrokerConfig, DeviceIdentity};

use crate::credentials::Credential;
use crate::error::{BridgeError, Result};

/// Request channel capacity of each short-lived client.
const CLIENT_CAPACITY: usize = 10;

/// Grace period for flushing the DISCONNECT packet.
const DISCONNECT_GRACE: Duration = Duration::from_millis(500);

/// Connection parameters shared by all exchanges with one broker.
#[derive(Clone, Debug)]
pub struct MqttLink {
    broker: BrokerConfig,
    client_id: String,
    ca: Option<Arc<Vec<u8>>>,
}

impl MqttLink {
    /// Create a link for `identity`, loading the trust anchor if TLS is configured.
    pub fn new(broker: &BrokerConfig, identity: &DeviceIdentity) -> Result<Self> {
        let ca = match &broker.ca_cert {
            Some(path) => {
                let pem = std::fs::read(path).map_err(|e| {
                    BridgeError::config(format!(
                        "Failed to read CA certificate '{}': {}",
                        path.display(),
                        e
                    ))
                })?;
                Some(Arc::new(pem))
            }
            None => None,
        };

        Ok(Self {
            broker: broker.clone(),
            client_id: identity.client_id(),
            ca,
        })
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn uses_tls(&self) -> bool {
        self.ca.is_some()
    }

    /// Build connection options authenticated with `credential`.
    pub fn options(&self, credential: &Credential) -> MqttOptions {
        let mut options =
            MqttOptions::new(&self.client_id, &self.broker.host, self.broker.port);
        options.set_keep_alive(self.broker.keep_alive());
        options.set_clean_session(true);
        options.set_credentials(&credential.username, &credential.password);

        if let Some(ca) = &self.ca {
            options.set_transport(Transport::tls_with_config(TlsConfiguration::Simple {
                ca: ca.as_ref().clone(),
                alpn: None,
                client_auth: None,
            }));
        }

        options
    }

    /// Publish one message at QoS 1 and wait for the broker's acknowledgement.
    pub async fn publish_once(
        &self,
        topic: &str,
        payload: Vec<u8>,
        credential: &Credential,
    ) -> Result<()> {
        let (client, mut eventloop) = AsyncClient::new(self.options(credential), CLIENT_CAPACITY);
        client
            .publish(topic, QoS::AtLeastOnce, false, payload)
            .await
            .map_err(|e| BridgeError::Publish {
                topic: topic.to_string(),
                message: e.to_string(),
            })?;

        let timeout = self.broker.operation_timeout();
        let exchange = async {
            loop {
                match eventloop.poll().await {
                    Ok(Event::Incoming(Packet::PubAck(_))) => return Ok(()),
                    Ok(_) => {}
                    Err(e) => {
                        return Err(BridgeError::Publish {
                            topic: topic.to_string(),
                            message: e.to_string(),
                        });
                    }
                }
            }
        };

        let result = tokio::time::timeout(timeout, exchange)
            .await
            .map_err(|_| BridgeError::Timeout(timeout))
            .and_then(|r| r);

        close(client, eventloop).await;
        result
    }

    /// Subscribe to `topic` and return the payload of the first message delivered on it.
    pub async fn receive_once(&self, topic: &str, credential: &Credential) -> Result<Vec<u8>> {
        let (client, mut eventloop) = AsyncClient::new(self.options(credential), CLIENT_CAPACITY);
        client.subscribe(topic, QoS::AtLeastOnce).await?;

        let timeout = self.broker.operation_timeout();
        let exchange = async {
            loop {
                match eventloop.poll().await? {
                    Event::Incoming(Packet::SubAck(ack)) => {
                        if ack
                            .return_codes
                            .iter()
                            .any(|code| matches!(code, SubscribeReasonCode::Failure))
                        {
                            return Err(BridgeError::broker(format!(
                                "Subscription to '{}' rejected",
                                topic
                            )));
                        }
                    }
                    Event::Incoming(Packet::Publish(publish)) if publish.topic == topic => {
                        return Ok(publish.payload.to_vec());
                    }
                    _ => {}
                }
            }
        };

        let result = tokio::time::timeout(timeout, exchange)
            .await
            .map_err(|_| BridgeError::Timeout(timeout))
            .and_then(|r| r);

        close(client, eventloop).await;
        result
    }
}

/// Send DISCONNECT and give the event loop a moment to flush it.
async fn close(client: AsyncClient, mut eventloop: EventLoop) {
    if client.disconnect().await.is_err() {
        return;
    }
    let _ = tokio::time::timeout(DISCONNECT_GRACE, async {
        while let Ok(event) = eventloop.poll().await {
            if matches!(event, Event::Outgoing(rumqttc::Outgoing::Disconnect)) {
                break;
            }
        }
    })
    .await;
}
