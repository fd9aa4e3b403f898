//! Expected property datatypes and conversion of acknowledged values into
//! telemetry.

use std::fmt;

use fieldsight_common::TelemetryValue;

use super::enumeration::Enumeration;
use super::object::{ObjectType, PropertyIdentifier};
use super::value::ApplicationValue;
use crate::transport::ReadAck;

/// Application tag of a primitive value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Null,
    Boolean,
    Unsigned,
    Signed,
    Real,
    Double,
    OctetString,
    CharacterString,
    BitString,
    Enumerated,
    Date,
    Time,
    ObjectIdentifier,
}

impl Primitive {
    /// Map an application tag number.
    pub fn from_tag(tag: u8) -> Option<Self> {
        Some(match tag {
            0 => Self::Null,
            1 => Self::Boolean,
            2 => Self::Unsigned,
            3 => Self::Signed,
            4 => Self::Real,
            5 => Self::Double,
            6 => Self::OctetString,
            7 => Self::CharacterString,
            8 => Self::BitString,
            9 => Self::Enumerated,
            10 => Self::Date,
            11 => Self::Time,
            12 => Self::ObjectIdentifier,
            _ => return None,
        })
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::Unsigned => "unsigned",
            Self::Signed => "signed",
            Self::Real => "real",
            Self::Double => "double",
            Self::OctetString => "octet-string",
            Self::CharacterString => "character-string",
            Self::BitString => "bit-string",
            Self::Enumerated => "enumerated",
            Self::Date => "date",
            Self::Time => "time",
            Self::ObjectIdentifier => "object-identifier",
        };
        f.write_str(name)
    }
}

/// Declared type of one property value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Primitive(Primitive),
    /// Enumerated value published by name where the code has one.
    Named(Enumeration),
}

impl Kind {
    /// Application tag the value must carry.
    pub fn primitive(self) -> Primitive {
        match self {
            Self::Primitive(primitive) => primitive,
            Self::Named(_) => Primitive::Enumerated,
        }
    }
}

/// Declared shape of a property value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Datatype {
    Scalar(Kind),
    /// Array of elements; index 0 addresses the element count.
    Array(Kind),
}

const fn scalar(primitive: Primitive) -> Datatype {
    Datatype::Scalar(Kind::Primitive(primitive))
}

const fn array(primitive: Primitive) -> Datatype {
    Datatype::Array(Kind::Primitive(primitive))
}

const fn named(enumeration: Enumeration) -> Datatype {
    Datatype::Scalar(Kind::Named(enumeration))
}

/// Why an acknowledged value could not be turned into telemetry.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeError {
    #[error("no datatype known for {property} of {object_type}")]
    UnknownDatatype {
        object_type: ObjectType,
        property: PropertyIdentifier,
    },

    #[error("expected {expected} value, got {found}")]
    TypeMismatch {
        expected: Primitive,
        found: Primitive,
    },

    #[error("expected a single value, got {0}")]
    ValueCount(usize),
}

/// Look up the declared datatype of `property` on objects of `object_type`.
pub fn datatype_of(object_type: ObjectType, property: PropertyIdentifier) -> Option<Datatype> {
    use Enumeration as E;
    use ObjectType as O;
    use Primitive as P;
    use PropertyIdentifier as Id;

    // Properties every object carries.
    let common = match property {
        Id::ObjectIdentifier => Some(scalar(P::ObjectIdentifier)),
        Id::ObjectName | Id::Description => Some(scalar(P::CharacterString)),
        Id::ObjectType => Some(named(E::ObjectType)),
        Id::EventState => Some(named(E::EventState)),
        Id::Reliability => Some(named(E::Reliability)),
        Id::StatusFlags => Some(scalar(P::BitString)),
        Id::OutOfService => Some(scalar(P::Boolean)),
        Id::PropertyList => Some(Datatype::Array(Kind::Named(E::PropertyIdentifier))),
        _ => None,
    };
    if common.is_some() {
        return common;
    }

    match object_type {
        O::AnalogInput | O::AnalogOutput | O::AnalogValue => match property {
            Id::PresentValue
            | Id::CovIncrement
            | Id::MinPresValue
            | Id::MaxPresValue
            | Id::Resolution
            | Id::HighLimit
            | Id::LowLimit
            | Id::Deadband => Some(scalar(P::Real)),
            Id::RelinquishDefault if object_type != O::AnalogInput => Some(scalar(P::Real)),
            Id::Units => Some(named(E::EngineeringUnits)),
            _ => None,
        },
        O::BinaryInput | O::BinaryOutput | O::BinaryValue => match property {
            Id::PresentValue => Some(named(E::BinaryPv)),
            Id::Polarity => Some(named(E::Polarity)),
            Id::RelinquishDefault if object_type != O::BinaryInput => Some(named(E::BinaryPv)),
            Id::ActiveText | Id::InactiveText => Some(scalar(P::CharacterString)),
            _ => None,
        },
        O::MultiStateInput | O::MultiStateOutput | O::MultiStateValue => match property {
            Id::PresentValue | Id::NumberOfStates => Some(scalar(P::Unsigned)),
            Id::RelinquishDefault if object_type != O::MultiStateInput => {
                Some(scalar(P::Unsigned))
            }
            Id::StateText => Some(array(P::CharacterString)),
            _ => None,
        },
        O::CharacterStringValue => match property {
            Id::PresentValue | Id::RelinquishDefault => Some(scalar(P::CharacterString)),
            _ => None,
        },
        O::IntegerValue => match property {
            Id::PresentValue | Id::RelinquishDefault => Some(scalar(P::Signed)),
            Id::CovIncrement => Some(scalar(P::Unsigned)),
            Id::Units => Some(named(E::EngineeringUnits)),
            _ => None,
        },
        O::PositiveIntegerValue => match property {
            Id::PresentValue | Id::RelinquishDefault | Id::CovIncrement => {
                Some(scalar(P::Unsigned))
            }
            Id::Units => Some(named(E::EngineeringUnits)),
            _ => None,
        },
        O::LargeAnalogValue => match property {
            Id::PresentValue | Id::RelinquishDefault | Id::CovIncrement => {
                Some(scalar(P::Double))
            }
            Id::Units => Some(named(E::EngineeringUnits)),
            _ => None,
        },
        O::Accumulator => match property {
            Id::PresentValue | Id::MaxPresValue => Some(scalar(P::Unsigned)),
            Id::Units => Some(named(E::EngineeringUnits)),
            _ => None,
        },
        O::Device => match property {
            Id::SystemStatus => Some(named(E::DeviceStatus)),
            Id::SegmentationSupported => Some(named(E::Segmentation)),
            Id::VendorName
            | Id::ModelName
            | Id::FirmwareRevision
            | Id::ApplicationSoftwareVersion
            | Id::Location => Some(scalar(P::CharacterString)),
            Id::VendorIdentifier
            | Id::ProtocolVersion
            | Id::ProtocolRevision
            | Id::MaxApduLengthAccepted
            | Id::ApduTimeout
            | Id::NumberOfApduRetries
            | Id::DatabaseRevision => Some(scalar(P::Unsigned)),
            Id::ObjectList => Some(array(P::ObjectIdentifier)),
            Id::LocalDate => Some(scalar(P::Date)),
            Id::LocalTime => Some(scalar(P::Time)),
            Id::UtcOffset => Some(scalar(P::Signed)),
            Id::DaylightSavingsStatus => Some(scalar(P::Boolean)),
            _ => None,
        },
        _ => None,
    }
}

/// Convert an acknowledgement into a telemetry value using the declared
/// datatype of the property that was read.
///
/// - scalar: exactly one value of the declared primitive
/// - array, index 0: the element count, as unsigned
/// - array, other index: one element of the declared primitive
/// - array, no index: every element, as a list
///
/// Named enumerations are published as their standard name, or as the bare
/// code when it has none.
pub fn resolve(ack: ReadAck) -> Result<TelemetryValue, DecodeError> {
    let object_type = ack.object.object_type;
    let datatype =
        datatype_of(object_type, ack.property).ok_or(DecodeError::UnknownDatatype {
            object_type,
            property: ack.property,
        })?;

    match (datatype, ack.array_index) {
        (Datatype::Scalar(kind), _) => single(ack.values, kind),
        (Datatype::Array(_), Some(0)) => single(ack.values, Kind::Primitive(Primitive::Unsigned)),
        (Datatype::Array(kind), Some(_)) => single(ack.values, kind),
        (Datatype::Array(kind), None) => ack
            .values
            .into_iter()
            .map(|value| checked(value, kind))
            .collect::<Result<Vec<_>, _>>()
            .map(TelemetryValue::List),
    }
}

fn single(values: Vec<ApplicationValue>, expected: Kind) -> Result<TelemetryValue, DecodeError> {
    let count = values.len();
    let mut values = values.into_iter();
    match (values.next(), count) {
        (Some(value), 1) => checked(value, expected),
        _ => Err(DecodeError::ValueCount(count)),
    }
}

fn checked(value: ApplicationValue, expected: Kind) -> Result<TelemetryValue, DecodeError> {
    let found = value.primitive();
    if found != expected.primitive() {
        return Err(DecodeError::TypeMismatch {
            expected: expected.primitive(),
            found,
        });
    }
    match (expected, value) {
        (Kind::Named(enumeration), ApplicationValue::Enumerated(code)) => {
            Ok(enumeration.name(code).map_or_else(
                || TelemetryValue::Unsigned(u64::from(code)),
                |name| TelemetryValue::Text(name.to_string()),
            ))
        }
        (_, value) => Ok(value.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bacnet::object::ObjectIdentifier;

    fn ack(
        object_type: ObjectType,
        property: PropertyIdentifier,
        array_index: Option<u32>,
        values: Vec<ApplicationValue>,
    ) -> ReadAck {
        ReadAck {
            object: ObjectIdentifier::new(object_type, 1),
            property,
            array_index,
            values,
        }
    }

    #[test]
    fn test_lookup() {
        assert_eq!(
            datatype_of(ObjectType::AnalogValue, PropertyIdentifier::PresentValue),
            Some(scalar(Primitive::Real))
        );
        assert_eq!(
            datatype_of(ObjectType::BinaryInput, PropertyIdentifier::PresentValue),
            Some(named(Enumeration::BinaryPv))
        );
        assert_eq!(
            datatype_of(ObjectType::Device, PropertyIdentifier::ObjectName),
            Some(scalar(Primitive::CharacterString))
        );
        assert_eq!(
            datatype_of(ObjectType::Device, PropertyIdentifier::ObjectList),
            Some(array(Primitive::ObjectIdentifier))
        );
        assert_eq!(datatype_of(ObjectType::Device, PropertyIdentifier::PresentValue), None);
        assert_eq!(
            datatype_of(ObjectType::AnalogInput, PropertyIdentifier::RelinquishDefault),
            None
        );
    }

    #[test]
    fn test_resolve_scalar() {
        let value = resolve(ack(
            ObjectType::AnalogValue,
            PropertyIdentifier::PresentValue,
            None,
            vec![ApplicationValue::Real(89.0)],
        ));
        assert_eq!(value, Ok(TelemetryValue::Real(89.0)));
    }

    #[test]
    fn test_resolve_named_enumerations() {
        let active = resolve(ack(
            ObjectType::BinaryInput,
            PropertyIdentifier::PresentValue,
            None,
            vec![ApplicationValue::Enumerated(1)],
        ));
        assert_eq!(active, Ok(TelemetryValue::Text("active".into())));

        let units = resolve(ack(
            ObjectType::AnalogInput,
            PropertyIdentifier::Units,
            None,
            vec![ApplicationValue::Enumerated(64)],
        ));
        assert_eq!(units, Ok(TelemetryValue::Text("degreesFahrenheit".into())));

        let proprietary = resolve(ack(
            ObjectType::AnalogInput,
            PropertyIdentifier::Units,
            None,
            vec![ApplicationValue::Enumerated(60_000)],
        ));
        assert_eq!(proprietary, Ok(TelemetryValue::Unsigned(60_000)));

        let properties = resolve(ack(
            ObjectType::AnalogInput,
            PropertyIdentifier::PropertyList,
            None,
            vec![ApplicationValue::Enumerated(85), ApplicationValue::Enumerated(117)],
        ));
        assert_eq!(
            properties,
            Ok(TelemetryValue::List(vec![
                TelemetryValue::Text("presentValue".into()),
                TelemetryValue::Text("units".into()),
            ]))
        );

        let err = resolve(ack(
            ObjectType::BinaryValue,
            PropertyIdentifier::PresentValue,
            None,
            vec![ApplicationValue::Boolean(true)],
        ))
        .unwrap_err();
        assert_eq!(err.to_string(), "expected enumerated value, got boolean");
    }

    #[test]
    fn test_resolve_type_mismatch() {
        let err = resolve(ack(
            ObjectType::AnalogValue,
            PropertyIdentifier::PresentValue,
            None,
            vec![ApplicationValue::Unsigned(89)],
        ))
        .unwrap_err();
        assert_eq!(err.to_string(), "expected real value, got unsigned");
    }

    #[test]
    fn test_resolve_unknown_datatype() {
        let err = resolve(ack(
            ObjectType::Device,
            PropertyIdentifier::PresentValue,
            None,
            vec![ApplicationValue::Real(1.0)],
        ))
        .unwrap_err();
        assert_eq!(err.to_string(), "no datatype known for presentValue of device");
    }

    #[test]
    fn test_resolve_array_forms() {
        let names = || {
            vec![
                ApplicationValue::CharacterString("off".into()),
                ApplicationValue::CharacterString("on".into()),
            ]
        };

        let count = resolve(ack(
            ObjectType::MultiStateValue,
            PropertyIdentifier::StateText,
            Some(0),
            vec![ApplicationValue::Unsigned(2)],
        ));
        assert_eq!(count, Ok(TelemetryValue::Unsigned(2)));

        let element = resolve(ack(
            ObjectType::MultiStateValue,
            PropertyIdentifier::StateText,
            Some(2),
            vec![ApplicationValue::CharacterString("on".into())],
        ));
        assert_eq!(element, Ok(TelemetryValue::Text("on".into())));

        let all = resolve(ack(
            ObjectType::MultiStateValue,
            PropertyIdentifier::StateText,
            None,
            names(),
        ));
        assert_eq!(
            all,
            Ok(TelemetryValue::List(vec![
                TelemetryValue::Text("off".into()),
                TelemetryValue::Text("on".into())
            ]))
        );
    }

    #[test]
    fn test_resolve_scalar_needs_one_value() {
        let err = resolve(ack(
            ObjectType::AnalogInput,
            PropertyIdentifier::PresentValue,
            None,
            vec![],
        ))
        .unwrap_err();
        assert_eq!(err, DecodeError::ValueCount(0));
    }
}
