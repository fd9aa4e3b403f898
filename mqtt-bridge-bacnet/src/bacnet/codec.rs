//! BACnet/IP framing (BVLL + NPDU) and the ReadProperty APDUs.

use super::datatype::Primitive;
use super::object::{ObjectIdentifier, PropertyIdentifier};
use super::value::{ApplicationValue, Date, Time};
use crate::transport::{AbortReason, ErrorClass, ErrorCode, ReadAck, ReadRequest, RejectReason};

const BVLC_TYPE: u8 = 0x81;
const BVLC_FORWARDED_NPDU: u8 = 0x04;
const BVLC_ORIGINAL_UNICAST: u8 = 0x0A;
const BVLC_ORIGINAL_BROADCAST: u8 = 0x0B;
const NPDU_VERSION: u8 = 0x01;
/// NPDU control: a reply is expected.
const NPDU_EXPECTING_REPLY: u8 = 0x04;

const PDU_CONFIRMED_REQUEST: u8 = 0x0;
const PDU_SIMPLE_ACK: u8 = 0x2;
const PDU_COMPLEX_ACK: u8 = 0x3;
const PDU_ERROR: u8 = 0x5;
const PDU_REJECT: u8 = 0x6;
const PDU_ABORT: u8 = 0x7;

const SERVICE_READ_PROPERTY: u8 = 12;
/// Max segments unspecified, max APDU 1476 octets.
const MAX_APDU_1476: u8 = 0x05;

/// Why a frame could not be encoded or decoded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("frame truncated")]
    Truncated,

    #[error("malformed frame: {0}")]
    Malformed(String),

    #[error("unsupported character set {0}")]
    UnsupportedCharset(u8),

    #[error("object identifier {0} out of range")]
    ObjectOutOfRange(ObjectIdentifier),
}

/// A decoded application-layer PDU.
#[derive(Debug, Clone, PartialEq)]
pub enum Apdu {
    ReadPropertyAck { invoke_id: u8, ack: ReadAck },
    SimpleAck { invoke_id: u8, service: u8 },
    /// Complex acknowledgement for some other service.
    ComplexAck { invoke_id: u8, service: u8 },
    /// First segment of a segmented acknowledgement.
    Segmented { invoke_id: u8 },
    Error { invoke_id: u8, class: ErrorClass, code: ErrorCode },
    Reject { invoke_id: u8, reason: RejectReason },
    Abort { invoke_id: u8, server: bool, reason: AbortReason },
    /// Response whose body could not be decoded.
    Malformed { invoke_id: u8, error: CodecError },
    /// Requests and other traffic a client does not answer.
    Unsolicited { pdu_type: u8 },
}

impl Apdu {
    /// Invoke id of a response PDU.
    pub fn invoke_id(&self) -> Option<u8> {
        match self {
            Self::ReadPropertyAck { invoke_id, .. }
            | Self::SimpleAck { invoke_id, .. }
            | Self::ComplexAck { invoke_id, .. }
            | Self::Segmented { invoke_id }
            | Self::Error { invoke_id, .. }
            | Self::Reject { invoke_id, .. }
            | Self::Abort { invoke_id, .. }
            | Self::Malformed { invoke_id, .. } => Some(*invoke_id),
            Self::Unsolicited { .. } => None,
        }
    }
}

/// Encode a complete BACnet/IP frame carrying a ReadProperty request.
pub fn encode_read_property(invoke_id: u8, request: &ReadRequest) -> Result<Vec<u8>, CodecError> {
    let object = request
        .object
        .encode()
        .ok_or(CodecError::ObjectOutOfRange(request.object))?;

    let mut apdu = vec![
        PDU_CONFIRMED_REQUEST << 4,
        MAX_APDU_1476,
        invoke_id,
        SERVICE_READ_PROPERTY,
    ];
    apdu.push(0x0C);
    apdu.extend_from_slice(&object.to_be_bytes());
    encode_context_unsigned(&mut apdu, 1, request.property.code());
    if let Some(index) = request.array_index {
        encode_context_unsigned(&mut apdu, 2, index);
    }

    let length = 4 + 2 + apdu.len();
    let length = u16::try_from(length)
        .map_err(|_| CodecError::Malformed(format!("frame of {length} octets")))?;

    let mut frame = Vec::with_capacity(usize::from(length));
    frame.extend_from_slice(&[BVLC_TYPE, BVLC_ORIGINAL_UNICAST]);
    frame.extend_from_slice(&length.to_be_bytes());
    frame.extend_from_slice(&[NPDU_VERSION, NPDU_EXPECTING_REPLY]);
    frame.extend_from_slice(&apdu);
    Ok(frame)
}

fn encode_context_unsigned(buf: &mut Vec<u8>, tag: u8, value: u32) {
    let bytes = value.to_be_bytes();
    let skip = bytes.iter().take(3).take_while(|b| **b == 0).count();
    let len = 4 - skip;
    // `len` is 1..=4, so it fits the three length bits.
    buf.push((tag << 4) | 0x08 | len as u8);
    buf.extend_from_slice(&bytes[skip..]);
}

/// Decode a BACnet/IP frame.
///
/// Returns `Ok(None)` for traffic that carries no APDU (BVLL control
/// messages and network-layer messages).
pub fn decode_frame(data: &[u8]) -> Result<Option<Apdu>, CodecError> {
    let mut r = Reader::new(data);

    if r.u8()? != BVLC_TYPE {
        return Err(CodecError::Malformed("not a BACnet/IP frame".into()));
    }
    let function = r.u8()?;
    let length = usize::from(r.u16()?);
    if length != data.len() {
        return Err(CodecError::Malformed(format!(
            "length field {length} but frame has {} octets",
            data.len()
        )));
    }
    match function {
        BVLC_ORIGINAL_UNICAST | BVLC_ORIGINAL_BROADCAST => {}
        // Original source address (4 octets IP + 2 octets port)
        BVLC_FORWARDED_NPDU => r.skip(6)?,
        _ => return Ok(None),
    }

    if r.u8()? != NPDU_VERSION {
        return Err(CodecError::Malformed("unknown NPDU version".into()));
    }
    let control = r.u8()?;
    let has_destination = control & 0x20 != 0;
    if has_destination {
        r.skip(2)?;
        let len = r.u8()?;
        r.skip(usize::from(len))?;
    }
    if control & 0x08 != 0 {
        r.skip(2)?;
        let len = r.u8()?;
        r.skip(usize::from(len))?;
    }
    if has_destination {
        // hop count
        r.skip(1)?;
    }
    if control & 0x80 != 0 {
        return Ok(None);
    }

    decode_apdu(r.rest()).map(Some)
}

/// Decode an application-layer PDU.
///
/// Once the PDU type and invoke id of a response are read, a damaged body
/// yields [`Apdu::Malformed`] so the waiting request can be answered.
pub fn decode_apdu(data: &[u8]) -> Result<Apdu, CodecError> {
    let mut r = Reader::new(data);
    let header = r.u8()?;
    let pdu_type = header >> 4;

    let invoke_id = match pdu_type {
        PDU_SIMPLE_ACK | PDU_COMPLEX_ACK | PDU_ERROR | PDU_REJECT | PDU_ABORT => r.u8()?,
        other => return Ok(Apdu::Unsolicited { pdu_type: other }),
    };

    Ok(decode_response(header, invoke_id, &mut r)
        .unwrap_or_else(|error| Apdu::Malformed { invoke_id, error }))
}

fn decode_response(header: u8, invoke_id: u8, r: &mut Reader<'_>) -> Result<Apdu, CodecError> {
    match header >> 4 {
        PDU_SIMPLE_ACK => Ok(Apdu::SimpleAck {
            invoke_id,
            service: r.u8()?,
        }),
        PDU_COMPLEX_ACK => {
            if header & 0x08 != 0 {
                return Ok(Apdu::Segmented { invoke_id });
            }
            let service = r.u8()?;
            if service != SERVICE_READ_PROPERTY {
                return Ok(Apdu::ComplexAck { invoke_id, service });
            }
            let ack = decode_read_property_ack(r)?;
            Ok(Apdu::ReadPropertyAck { invoke_id, ack })
        }
        PDU_ERROR => {
            let _service = r.u8()?;
            let class = expect_enumerated(r)?;
            let code = expect_enumerated(r)?;
            Ok(Apdu::Error {
                invoke_id,
                class: ErrorClass::from_code(class),
                code: ErrorCode::from_code(code),
            })
        }
        PDU_REJECT => Ok(Apdu::Reject {
            invoke_id,
            reason: RejectReason::from_code(r.u8()?),
        }),
        PDU_ABORT => Ok(Apdu::Abort {
            invoke_id,
            server: header & 0x01 != 0,
            reason: AbortReason::from_code(r.u8()?),
        }),
        other => Ok(Apdu::Unsolicited { pdu_type: other }),
    }
}

fn decode_read_property_ack(r: &mut Reader<'_>) -> Result<ReadAck, CodecError> {
    let tag = r.tag()?;
    if !tag.is_context(0) || tag.length() != Some(4) {
        return Err(CodecError::Malformed("expected object identifier".into()));
    }
    let object = ObjectIdentifier::decode(r.u32()?);

    let tag = r.tag()?;
    let Some(len) = tag.length().filter(|_| tag.is_context(1)) else {
        return Err(CodecError::Malformed("expected property identifier".into()));
    };
    let property = u32::try_from(r.unsigned(len)?)
        .map(PropertyIdentifier::from_code)
        .map_err(|_| CodecError::Malformed("property identifier too large".into()))?;

    let mut tag = r.tag()?;
    let mut array_index = None;
    if let Some(len) = tag.length().filter(|_| tag.is_context(2)) {
        let index = u32::try_from(r.unsigned(len)?)
            .map_err(|_| CodecError::Malformed("array index too large".into()))?;
        array_index = Some(index);
        tag = r.tag()?;
    }

    if tag != (Tag::Opening(3)) {
        return Err(CodecError::Malformed("expected property value".into()));
    }

    let mut values = Vec::new();
    loop {
        let tag = r.tag()?;
        match tag {
            Tag::Closing(3) => break,
            Tag::Application { number, lvt } => values.push(decode_application(r, number, lvt)?),
            _ => {
                return Err(CodecError::Malformed(
                    "constructed property values are not supported".into(),
                ));
            }
        }
    }

    Ok(ReadAck {
        object,
        property,
        array_index,
        values,
    })
}

fn expect_enumerated(r: &mut Reader<'_>) -> Result<u32, CodecError> {
    match r.tag()? {
        Tag::Application { number: 9, lvt } => {
            let value = r.unsigned(lvt)?;
            u32::try_from(value).map_err(|_| CodecError::Malformed("enumeration too large".into()))
        }
        _ => Err(CodecError::Malformed("expected enumerated value".into())),
    }
}

fn decode_application(
    r: &mut Reader<'_>,
    number: u8,
    lvt: u32,
) -> Result<ApplicationValue, CodecError> {
    let primitive = Primitive::from_tag(number)
        .ok_or_else(|| CodecError::Malformed(format!("reserved application tag {number}")))?;

    let value = match primitive {
        Primitive::Null => ApplicationValue::Null,
        // The value lives in the length field.
        Primitive::Boolean => ApplicationValue::Boolean(lvt != 0),
        Primitive::Unsigned => ApplicationValue::Unsigned(r.unsigned(lvt)?),
        Primitive::Signed => ApplicationValue::Signed(r.signed(lvt)?),
        Primitive::Real => {
            expect_len(lvt, 4)?;
            ApplicationValue::Real(f32::from_be_bytes(r.array()?))
        }
        Primitive::Double => {
            expect_len(lvt, 8)?;
            ApplicationValue::Double(f64::from_be_bytes(r.array()?))
        }
        Primitive::OctetString => ApplicationValue::OctetString(r.bytes(lvt)?.to_vec()),
        Primitive::CharacterString => {
            ApplicationValue::CharacterString(decode_character_string(r.bytes(lvt)?)?)
        }
        Primitive::BitString => ApplicationValue::BitString(decode_bit_string(r.bytes(lvt)?)?),
        Primitive::Enumerated => {
            let value = r.unsigned(lvt)?;
            ApplicationValue::Enumerated(
                u32::try_from(value)
                    .map_err(|_| CodecError::Malformed("enumeration too large".into()))?,
            )
        }
        Primitive::Date => {
            expect_len(lvt, 4)?;
            ApplicationValue::Date(Date::from_octets(r.array()?))
        }
        Primitive::Time => {
            expect_len(lvt, 4)?;
            ApplicationValue::Time(Time::from_octets(r.array()?))
        }
        Primitive::ObjectIdentifier => {
            expect_len(lvt, 4)?;
            ApplicationValue::ObjectIdentifier(ObjectIdentifier::decode(r.u32()?))
        }
    };
    Ok(value)
}

fn expect_len(lvt: u32, expected: u32) -> Result<(), CodecError> {
    if lvt == expected {
        Ok(())
    } else {
        Err(CodecError::Malformed(format!(
            "expected {expected} content octets, got {lvt}"
        )))
    }
}

fn decode_character_string(data: &[u8]) -> Result<String, CodecError> {
    let (&charset, content) = data.split_first().ok_or(CodecError::Truncated)?;
    match charset {
        // UTF-8 (formerly ANSI X3.4)
        0 => String::from_utf8(content.to_vec())
            .map_err(|_| CodecError::Malformed("invalid UTF-8 string".into())),
        // UCS-2, big endian
        4 => {
            if content.len() % 2 != 0 {
                return Err(CodecError::Malformed("odd-length UCS-2 string".into()));
            }
            let units: Vec<u16> = content
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16(&units)
                .map_err(|_| CodecError::Malformed("invalid UCS-2 string".into()))
        }
        // ISO 8859-1
        5 => Ok(content.iter().map(|&b| char::from(b)).collect()),
        other => Err(CodecError::UnsupportedCharset(other)),
    }
}

fn decode_bit_string(data: &[u8]) -> Result<Vec<bool>, CodecError> {
    let (&unused, content) = data.split_first().ok_or(CodecError::Truncated)?;
    let total = content.len() * 8;
    let unused = usize::from(unused);
    if unused > 7 || unused > total {
        return Err(CodecError::Malformed("bad unused bit count".into()));
    }
    Ok((0..total - unused)
        .map(|i| content[i / 8] & (0x80 >> (i % 8)) != 0)
        .collect())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Application { number: u8, lvt: u32 },
    Context { number: u8, len: u32 },
    Opening(u8),
    Closing(u8),
}

impl Tag {
    fn is_context(&self, expected: u8) -> bool {
        matches!(self, Tag::Context { number, .. } if *number == expected)
    }

    fn length(&self) -> Option<u32> {
        match self {
            Tag::Context { len, .. } => Some(*len),
            _ => None,
        }
    }
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn bytes(&mut self, len: impl TryInto<usize>) -> Result<&'a [u8], CodecError> {
        let len = len.try_into().map_err(|_| CodecError::Truncated)?;
        let end = self.pos.checked_add(len).ok_or(CodecError::Truncated)?;
        let slice = self.data.get(self.pos..end).ok_or(CodecError::Truncated)?;
        self.pos = end;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.bytes(N)?);
        Ok(out)
    }

    fn skip(&mut self, len: usize) -> Result<(), CodecError> {
        self.bytes(len).map(|_| ())
    }

    fn rest(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    fn u8(&mut self) -> Result<u8, CodecError> {
        self.array::<1>().map(|[b]| b)
    }

    fn u16(&mut self) -> Result<u16, CodecError> {
        self.array().map(u16::from_be_bytes)
    }

    fn u32(&mut self) -> Result<u32, CodecError> {
        self.array().map(u32::from_be_bytes)
    }

    fn unsigned(&mut self, len: u32) -> Result<u64, CodecError> {
        if !(1..=8).contains(&len) {
            return Err(CodecError::Malformed(format!("integer of {len} octets")));
        }
        Ok(self
            .bytes(len)?
            .iter()
            .fold(0u64, |acc, &b| (acc << 8) | u64::from(b)))
    }

    fn signed(&mut self, len: u32) -> Result<i64, CodecError> {
        let raw = self.unsigned(len)?;
        let shift = 64 - 8 * len;
        // Sign-extend from the top content bit.
        Ok(((raw << shift) as i64) >> shift)
    }

    fn tag(&mut self) -> Result<Tag, CodecError> {
        let first = self.u8()?;
        let mut number = first >> 4;
        if number == 0x0F {
            number = self.u8()?;
        }
        let context = first & 0x08 != 0;
        let lvt = first & 0x07;

        if context {
            match lvt {
                6 => return Ok(Tag::Opening(number)),
                7 => return Ok(Tag::Closing(number)),
                _ => {}
            }
        }

        let len = match lvt {
            5 => match self.u8()? {
                254 => u32::from(self.u16()?),
                255 => self.u32()?,
                n => u32::from(n),
            },
            6 | 7 => {
                return Err(CodecError::Malformed(format!("bad length {lvt} on tag {number}")));
            }
            n => u32::from(n),
        };

        Ok(if context {
            Tag::Context { number, len }
        } else {
            Tag::Application { number, lvt: len }
        })
    }
}
