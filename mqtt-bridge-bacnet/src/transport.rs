//! The request/response seam between the poller and the BACnet network.

use std::time::Duration;

use async_trait::async_trait;

use crate::bacnet::codec::CodecError;
use crate::bacnet::object::{ObjectIdentifier, PropertyIdentifier};
use crate::bacnet::value::ApplicationValue;
use crate::points::Point;

coded_enum! {
    /// Error class carried by an Error PDU.
    pub enum ErrorClass: u32, other = Other {
        Device = 0 => "device",
        Object = 1 => "object",
        Property = 2 => "property",
        Resources = 3 => "resources",
        Security = 4 => "security",
        Services = 5 => "services",
        Vt = 6 => "vt",
        Communication = 7 => "communication",
    }
}

coded_enum! {
    /// Error code carried by an Error PDU.
    pub enum ErrorCode: u32, other = Unlisted {
        Other = 0 => "other",
        ConfigurationInProgress = 2 => "configurationInProgress",
        DeviceBusy = 3 => "deviceBusy",
        InconsistentParameters = 7 => "inconsistentParameters",
        InvalidDataType = 9 => "invalidDataType",
        ReadAccessDenied = 27 => "readAccessDenied",
        ServiceRequestDenied = 29 => "serviceRequestDenied",
        Timeout = 30 => "timeout",
        UnknownObject = 31 => "unknownObject",
        UnknownProperty = 32 => "unknownProperty",
        InvalidArrayIndex = 42 => "invalidArrayIndex",
        PropertyIsNotAnArray = 50 => "propertyIsNotAnArray",
        OptionalFunctionalityNotSupported = 45 => "optionalFunctionalityNotSupported",
    }
}

coded_enum! {
    /// Reason given in a Reject PDU.
    pub enum RejectReason: u8, other = Unlisted {
        Other = 0 => "other",
        BufferOverflow = 1 => "bufferOverflow",
        InconsistentParameters = 2 => "inconsistentParameters",
        InvalidParameterDataType = 3 => "invalidParameterDataType",
        InvalidTag = 4 => "invalidTag",
        MissingRequiredParameter = 5 => "missingRequiredParameter",
        ParameterOutOfRange = 6 => "parameterOutOfRange",
        TooManyArguments = 7 => "tooManyArguments",
        UndefinedEnumeration = 8 => "undefinedEnumeration",
        UnrecognizedService = 9 => "unrecognizedService",
    }
}

coded_enum! {
    /// Reason given in an Abort PDU.
    pub enum AbortReason: u8, other = Unlisted {
        Other = 0 => "other",
        BufferOverflow = 1 => "bufferOverflow",
        InvalidApduInThisState = 2 => "invalidApduInThisState",
        PreemptedByHigherPriorityTask = 3 => "preemptedByHigherPriorityTask",
        SegmentationNotSupported = 4 => "segmentationNotSupported",
        SecurityError = 5 => "securityError",
        InsufficientSecurity = 6 => "insufficientSecurity",
        WindowSizeOutOfRange = 7 => "windowSizeOutOfRange",
        ApplicationExceededReplyTime = 8 => "applicationExceededReplyTime",
        OutOfResources = 9 => "outOfResources",
        TsmTimeout = 10 => "tsmTimeout",
        ApduTooLong = 11 => "apduTooLong",
    }
}

/// One confirmed ReadProperty request addressed to a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadRequest {
    /// Device address, `ip` or `ip:port`.
    pub address: String,
    pub object: ObjectIdentifier,
    pub property: PropertyIdentifier,
    pub array_index: Option<u32>,
}

impl ReadRequest {
    pub fn for_point(point: &Point) -> Self {
        Self {
            address: point.address.clone(),
            object: point.object,
            property: point.property,
            array_index: point.array_index,
        }
    }
}

/// Decoded ReadProperty acknowledgement.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadAck {
    pub object: ObjectIdentifier,
    pub property: PropertyIdentifier,
    pub array_index: Option<u32>,
    pub values: Vec<ApplicationValue>,
}

/// Why a request produced no acknowledgement.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("invalid device address '{0}'")]
    Address(String),

    #[error("request could not be encoded: {0}")]
    Encode(#[source] CodecError),

    #[error("malformed response: {0}")]
    Decode(#[source] CodecError),

    #[error("device returned error {class}: {code}")]
    Protocol { class: ErrorClass, code: ErrorCode },

    #[error("request rejected: {0}")]
    Reject(RejectReason),

    #[error("request aborted: {0}")]
    Abort(AbortReason),

    #[error("segmented responses are not supported")]
    Segmented,

    #[error("no response within {0:?}")]
    Timeout(Duration),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Performs one ReadProperty exchange at a time.
///
/// Implementations resolve every request with either an acknowledgement or an
/// error, including when the device never answers.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn read_property(&self, request: &ReadRequest) -> Result<ReadAck, TransportError>;
}
