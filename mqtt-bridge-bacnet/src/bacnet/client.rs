//! BACnet/IP client over UDP.

use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::UdpSocket;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, trace};

use super::codec::{self, Apdu};
use crate::transport::{ReadAck, ReadRequest, Transport, TransportError};

/// Default BACnet/IP UDP port (0xBAC0).
pub const BACNET_PORT: u16 = 47808;

/// Largest BACnet/IP datagram.
const MAX_FRAME: usize = 1500;

/// Parse `ip` or `ip:port`; a bare IP uses [`BACNET_PORT`].
pub fn parse_device_address(address: &str) -> Result<SocketAddr, TransportError> {
    let address = address.trim();
    address
        .parse::<SocketAddr>()
        .or_else(|_| {
            address
                .parse::<IpAddr>()
                .map(|ip| SocketAddr::new(ip, BACNET_PORT))
        })
        .map_err(|_| TransportError::Address(address.to_string()))
}

/// Confirmed-request client bound to one local UDP endpoint.
///
/// Exchanges are serialized: a request is sent only after the previous one
/// resolved, and responses are matched on source address and invoke id.
pub struct BacnetClient {
    socket: UdpSocket,
    timeout: Duration,
    invoke_id: AtomicU8,
    exchange: Mutex<()>,
}

impl BacnetClient {
    /// Bind the local endpoint. `timeout` bounds each request.
    pub async fn bind(local: SocketAddr, timeout: Duration) -> std::io::Result<Self> {
        let socket = UdpSocket::bind(local).await?;
        socket.set_broadcast(true)?;
        debug!(local = %socket.local_addr()?, "BACnet client bound");
        Ok(Self {
            socket,
            timeout,
            invoke_id: AtomicU8::new(0),
            exchange: Mutex::new(()),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn next_invoke_id(&self) -> u8 {
        self.invoke_id.fetch_add(1, Ordering::Relaxed)
    }

    async fn await_response(
        &self,
        target: SocketAddr,
        invoke_id: u8,
    ) -> Result<ReadAck, TransportError> {
        let deadline = Instant::now() + self.timeout;
        let mut buf = vec![0u8; MAX_FRAME];

        loop {
            let (len, from) =
                match tokio::time::timeout_at(deadline, self.socket.recv_from(&mut buf)).await {
                    Ok(received) => received?,
                    Err(_) => return Err(TransportError::Timeout(self.timeout)),
                };

            if from.ip() != target.ip() {
                trace!(%from, "Ignoring datagram from another host");
                continue;
            }

            let apdu = match codec::decode_frame(&buf[..len]) {
                Ok(Some(apdu)) => apdu,
                Ok(None) => continue,
                Err(e) => {
                    debug!(%from, error = %e, "Discarding undecodable datagram");
                    continue;
                }
            };

            if apdu.invoke_id() != Some(invoke_id) {
                trace!(%from, ?apdu, "Ignoring unrelated APDU");
                continue;
            }

            return match apdu {
                Apdu::ReadPropertyAck { ack, .. } => Ok(ack),
                Apdu::Error { class, code, .. } => Err(TransportError::Protocol { class, code }),
                Apdu::Reject { reason, .. } => Err(TransportError::Reject(reason)),
                Apdu::Abort { reason, .. } => Err(TransportError::Abort(reason)),
                Apdu::Segmented { .. } => Err(TransportError::Segmented),
                Apdu::Malformed { error, .. } => Err(TransportError::Decode(error)),
                Apdu::SimpleAck { .. } | Apdu::ComplexAck { .. } | Apdu::Unsolicited { .. } => {
                    Err(TransportError::Decode(codec::CodecError::Malformed(
                        "unexpected acknowledgement type".into(),
                    )))
                }
            };
        }
    }
}

#[async_trait]
impl Transport for BacnetClient {
    async fn read_property(&self, request: &ReadRequest) -> Result<ReadAck, TransportError> {
        let target = parse_device_address(&request.address)?;

        let _exchange = self.exchange.lock().await;
        let invoke_id = self.next_invoke_id();
        let frame =
            codec::encode_read_property(invoke_id, request).map_err(TransportError::Encode)?;

        trace!(
            %target,
            invoke_id,
            object = %request.object,
            property = %request.property,
            "Sending ReadProperty"
        );
        self.socket.send_to(&frame, target).await?;

        self.await_response(target, invoke_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bacnet::object::{ObjectIdentifier, ObjectType, PropertyIdentifier};
    use crate::bacnet::value::ApplicationValue;
    use crate::transport::{ErrorClass, ErrorCode};

    fn request(address: SocketAddr) -> ReadRequest {
        ReadRequest {
            address: address.to_string(),
            object: ObjectIdentifier::new(ObjectType::AnalogValue, 1),
            property: PropertyIdentifier::PresentValue,
            array_index: None,
        }
    }

    fn frame(apdu: &[u8]) -> Vec<u8> {
        let len = (apdu.len() + 6) as u16;
        let mut out = vec![0x81, 0x0A];
        out.extend_from_slice(&len.to_be_bytes());
        out.extend_from_slice(&[0x01, 0x00]);
        out.extend_from_slice(apdu);
        out
    }

    fn real_ack(invoke_id: u8) -> Vec<u8> {
        frame(&[
            0x30, invoke_id, 0x0C, 0x0C, 0x00, 0x80, 0x00, 0x01, 0x19, 0x55, 0x3E, 0x44, 0x42,
            0xB2, 0x00, 0x00, 0x3F,
        ])
    }

    async fn client(timeout: Duration) -> BacnetClient {
        BacnetClient::bind("127.0.0.1:0".parse().unwrap(), timeout)
            .await
            .unwrap()
    }

    #[test]
    fn test_parse_device_address() {
        assert_eq!(
            parse_device_address("192.168.1.20").unwrap(),
            "192.168.1.20:47808".parse().unwrap()
        );
        assert_eq!(
            parse_device_address("192.168.1.20:47809").unwrap(),
            "192.168.1.20:47809".parse().unwrap()
        );
        assert!(matches!(
            parse_device_address("not-an-address"),
            Err(TransportError::Address(_))
        ));
    }

    #[tokio::test]
    async fn test_read_property_round_trip() {
        let device = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let client = client(Duration::from_secs(2)).await;
        let request = request(device.local_addr().unwrap());

        let responder = tokio::spawn(async move {
            let mut buf = [0u8; 1500];
            let (len, from) = device.recv_from(&mut buf).await.unwrap();
            let invoke_id = buf[8];
            assert_eq!(buf[9], 0x0C, "service should be ReadProperty");
            assert_eq!(len, 17);

            // Stale answer first; must be ignored.
            device.send_to(&real_ack(invoke_id.wrapping_add(1)), from).await.unwrap();
            device.send_to(&real_ack(invoke_id), from).await.unwrap();
        });

        let ack = client.read_property(&request).await.unwrap();
        assert_eq!(ack.values, vec![ApplicationValue::Real(89.0)]);
        responder.await.unwrap();
    }

    #[tokio::test]
    async fn test_error_pdu() {
        let device = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let client = client(Duration::from_secs(2)).await;
        let request = request(device.local_addr().unwrap());

        tokio::spawn(async move {
            let mut buf = [0u8; 1500];
            let (_, from) = device.recv_from(&mut buf).await.unwrap();
            let error = frame(&[0x50, buf[8], 0x0C, 0x91, 0x01, 0x91, 0x1F]);
            device.send_to(&error, from).await.unwrap();
        });

        let err = client.read_property(&request).await.unwrap_err();
        assert!(matches!(
            err,
            TransportError::Protocol {
                class: ErrorClass::Object,
                code: ErrorCode::UnknownObject,
            }
        ));
    }

    #[tokio::test]
    async fn test_undecodable_answer_fails_without_waiting() {
        let device = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let client = client(Duration::from_secs(30)).await;
        let request = request(device.local_addr().unwrap());

        tokio::spawn(async move {
            let mut buf = [0u8; 1500];
            let (_, from) = device.recv_from(&mut buf).await.unwrap();
            // Context-tagged constructed value instead of an application value.
            let ack = frame(&[
                0x30, buf[8], 0x0C, 0x0C, 0x00, 0x80, 0x00, 0x01, 0x19, 0x55, 0x3E, 0x0E, 0x1F,
                0x3F,
            ]);
            device.send_to(&ack, from).await.unwrap();
        });

        let started = std::time::Instant::now();
        let err = client.read_property(&request).await.unwrap_err();
        assert!(matches!(err, TransportError::Decode(_)), "got {err:?}");
        assert!(err.to_string().starts_with("malformed response"));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_silent_device_times_out() {
        let device = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let client = client(Duration::from_millis(50)).await;

        let err = client
            .read_property(&request(device.local_addr().unwrap()))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_invoke_ids_advance() {
        let client = client(Duration::from_millis(10)).await;
        let first = client.next_invoke_id();
        let second = client.next_invoke_id();
        assert_eq!(second, first.wrapping_add(1));
    }
}
