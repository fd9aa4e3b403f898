//! BACnet/IP building blocks: identifiers, application values, datatype
//! resolution, the ReadProperty codec and the UDP client.

use serde::Deserialize;

/// A standard name or a raw numeric code, as written in configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NameOrCode {
    Code(u32),
    Name(String),
}

/// A name that matches no known enumeration member.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{name}'")]
pub struct UnknownName {
    pub kind: &'static str,
    pub name: String,
}

/// Define a BACnet enumeration with standard names and an escape variant
/// for codes without a name.
macro_rules! coded_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident: $repr:ty, other = $other:ident {
            $($variant:ident = $code:literal => $text:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Deserialize)]
        #[serde(try_from = "crate::bacnet::NameOrCode")]
        pub enum $name {
            $($variant,)+
            /// Code without a standard name (proprietary or newer protocol revisions).
            $other($repr),
        }

        impl $name {
            /// Numeric protocol code.
            pub fn code(self) -> $repr {
                match self {
                    $(Self::$variant => $code,)+
                    Self::$other(code) => code,
                }
            }

            /// Map a numeric code, falling back to the escape variant.
            pub fn from_code(code: $repr) -> Self {
                match code {
                    $($code => Self::$variant,)+
                    other => Self::$other(other),
                }
            }

            /// Standard name, if the code has one.
            pub fn name(self) -> Option<&'static str> {
                match self {
                    $(Self::$variant => Some($text),)+
                    Self::$other(_) => None,
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = crate::bacnet::UnknownName;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => other.parse::<$repr>().map(Self::from_code).map_err(|_| {
                        crate::bacnet::UnknownName {
                            kind: stringify!($name),
                            name: other.to_string(),
                        }
                    }),
                }
            }
        }

        impl TryFrom<crate::bacnet::NameOrCode> for $name {
            type Error = crate::bacnet::UnknownName;

            fn try_from(value: crate::bacnet::NameOrCode) -> Result<Self, Self::Error> {
                match value {
                    crate::bacnet::NameOrCode::Name(name) => name.parse(),
                    crate::bacnet::NameOrCode::Code(code) => <$repr>::try_from(code)
                        .map(Self::from_code)
                        .map_err(|_| crate::bacnet::UnknownName {
                            kind: stringify!($name),
                            name: code.to_string(),
                        }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self.name() {
                    Some(name) => f.write_str(name),
                    None => write!(f, "{}", self.code()),
                }
            }
        }
    };
}

pub mod client;
pub mod codec;
pub mod datatype;
pub mod enumeration;
pub mod object;
pub mod value;

pub use client::{BACNET_PORT, BacnetClient, parse_device_address};
pub use datatype::{Datatype, DecodeError, Kind, Primitive, datatype_of, resolve};
pub use enumeration::Enumeration;
pub use object::{ObjectIdentifier, ObjectType, PropertyIdentifier};
pub use value::{ApplicationValue, Date, Time};
