//! Application-tagged values as they appear in a ReadProperty acknowledgement.

use std::fmt;

use fieldsight_common::TelemetryValue;

use super::datatype::Primitive;
use super::object::ObjectIdentifier;

/// A calendar date; `None` fields were sent as "unspecified" (255).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Date {
    pub year: Option<u16>,
    pub month: Option<u8>,
    pub day: Option<u8>,
    pub weekday: Option<u8>,
}

impl Date {
    pub fn from_octets(octets: [u8; 4]) -> Self {
        let field = |v: u8| (v != 0xFF).then_some(v);
        Self {
            year: field(octets[0]).map(|y| 1900 + u16::from(y)),
            month: field(octets[1]),
            day: field(octets[2]),
            weekday: field(octets[3]),
        }
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.year {
            Some(y) => write!(f, "{y:04}")?,
            None => f.write_str("*")?,
        }
        for part in [self.month, self.day] {
            match part {
                Some(v) => write!(f, "-{v:02}")?,
                None => f.write_str("-*")?,
            }
        }
        Ok(())
    }
}

/// A time of day; `None` fields were sent as "unspecified" (255).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Time {
    pub hour: Option<u8>,
    pub minute: Option<u8>,
    pub second: Option<u8>,
    pub hundredths: Option<u8>,
}

impl Time {
    pub fn from_octets(octets: [u8; 4]) -> Self {
        let field = |v: u8| (v != 0xFF).then_some(v);
        Self {
            hour: field(octets[0]),
            minute: field(octets[1]),
            second: field(octets[2]),
            hundredths: field(octets[3]),
        }
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let part = |v: Option<u8>| v.map_or_else(|| "*".to_string(), |v| format!("{v:02}"));
        write!(
            f,
            "{}:{}:{}.{}",
            part(self.hour),
            part(self.minute),
            part(self.second),
            part(self.hundredths)
        )
    }
}

/// A primitive value carrying its application tag.
#[derive(Debug, Clone, PartialEq)]
pub enum ApplicationValue {
    Null,
    Boolean(bool),
    Unsigned(u64),
    Signed(i64),
    Real(f32),
    Double(f64),
    OctetString(Vec<u8>),
    CharacterString(String),
    BitString(Vec<bool>),
    Enumerated(u32),
    Date(Date),
    Time(Time),
    ObjectIdentifier(ObjectIdentifier),
}

impl ApplicationValue {
    pub fn primitive(&self) -> Primitive {
        match self {
            Self::Null => Primitive::Null,
            Self::Boolean(_) => Primitive::Boolean,
            Self::Unsigned(_) => Primitive::Unsigned,
            Self::Signed(_) => Primitive::Signed,
            Self::Real(_) => Primitive::Real,
            Self::Double(_) => Primitive::Double,
            Self::OctetString(_) => Primitive::OctetString,
            Self::CharacterString(_) => Primitive::CharacterString,
            Self::BitString(_) => Primitive::BitString,
            Self::Enumerated(_) => Primitive::Enumerated,
            Self::Date(_) => Primitive::Date,
            Self::Time(_) => Primitive::Time,
            Self::ObjectIdentifier(_) => Primitive::ObjectIdentifier,
        }
    }
}

impl From<ApplicationValue> for TelemetryValue {
    fn from(value: ApplicationValue) -> Self {
        match value {
            ApplicationValue::Null => TelemetryValue::Null,
            ApplicationValue::Boolean(b) => TelemetryValue::Boolean(b),
            ApplicationValue::Unsigned(u) => TelemetryValue::Unsigned(u),
            ApplicationValue::Signed(i) => TelemetryValue::Signed(i),
            ApplicationValue::Real(r) => TelemetryValue::Real(f64::from(r)),
            ApplicationValue::Double(d) => TelemetryValue::Real(d),
            ApplicationValue::OctetString(bytes) => TelemetryValue::Binary(bytes),
            ApplicationValue::CharacterString(s) => TelemetryValue::Text(s),
            ApplicationValue::BitString(bits) => {
                TelemetryValue::List(bits.into_iter().map(TelemetryValue::Boolean).collect())
            }
            ApplicationValue::Enumerated(e) => TelemetryValue::Unsigned(u64::from(e)),
            ApplicationValue::Date(d) => TelemetryValue::Text(d.to_string()),
            ApplicationValue::Time(t) => TelemetryValue::Text(t.to_string()),
            ApplicationValue::ObjectIdentifier(id) => TelemetryValue::Text(id.to_string()),
        }
    }
}
