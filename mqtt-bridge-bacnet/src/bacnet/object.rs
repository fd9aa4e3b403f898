//! Object types, property identifiers and object identifiers.

use std::fmt;

/// Largest object instance number (22 bits).
pub const MAX_INSTANCE: u32 = 0x3F_FFFF;

/// Largest object type code (10 bits).
pub const MAX_OBJECT_TYPE: u16 = 0x3FF;

coded_enum! {
    /// BACnet object type.
    pub enum ObjectType: u16, other = Other {
        AnalogInput = 0 => "analogInput",
        AnalogOutput = 1 => "analogOutput",
        AnalogValue = 2 => "analogValue",
        BinaryInput = 3 => "binaryInput",
        BinaryOutput = 4 => "binaryOutput",
        BinaryValue = 5 => "binaryValue",
        Calendar = 6 => "calendar",
        Device = 8 => "device",
        Loop = 12 => "loop",
        MultiStateInput = 13 => "multiStateInput",
        MultiStateOutput = 14 => "multiStateOutput",
        NotificationClass = 15 => "notificationClass",
        Schedule = 17 => "schedule",
        MultiStateValue = 19 => "multiStateValue",
        TrendLog = 20 => "trendLog",
        Accumulator = 23 => "accumulator",
        CharacterStringValue = 40 => "characterstringValue",
        IntegerValue = 45 => "integerValue",
        LargeAnalogValue = 46 => "largeAnalogValue",
        PositiveIntegerValue = 48 => "positiveIntegerValue",
    }
}

coded_enum! {
    /// BACnet property identifier.
    pub enum PropertyIdentifier: u32, other = Other {
        ActiveText = 4 => "activeText",
        ApduTimeout = 11 => "apduTimeout",
        ApplicationSoftwareVersion = 12 => "applicationSoftwareVersion",
        CovIncrement = 22 => "covIncrement",
        DaylightSavingsStatus = 24 => "daylightSavingsStatus",
        Deadband = 25 => "deadband",
        Description = 28 => "description",
        EventState = 36 => "eventState",
        FirmwareRevision = 44 => "firmwareRevision",
        HighLimit = 45 => "highLimit",
        InactiveText = 46 => "inactiveText",
        LocalDate = 56 => "localDate",
        LocalTime = 57 => "localTime",
        Location = 58 => "location",
        LowLimit = 59 => "lowLimit",
        MaxApduLengthAccepted = 62 => "maxApduLengthAccepted",
        MaxPresValue = 65 => "maxPresValue",
        MinPresValue = 69 => "minPresValue",
        ModelName = 70 => "modelName",
        NumberOfApduRetries = 73 => "numberOfApduRetries",
        NumberOfStates = 74 => "numberOfStates",
        ObjectIdentifier = 75 => "objectIdentifier",
        ObjectList = 76 => "objectList",
        ObjectName = 77 => "objectName",
        ObjectType = 79 => "objectType",
        OutOfService = 81 => "outOfService",
        Polarity = 84 => "polarity",
        PresentValue = 85 => "presentValue",
        ProtocolVersion = 98 => "protocolVersion",
        Reliability = 103 => "reliability",
        RelinquishDefault = 104 => "relinquishDefault",
        Resolution = 106 => "resolution",
        SegmentationSupported = 107 => "segmentationSupported",
        StateText = 110 => "stateText",
        StatusFlags = 111 => "statusFlags",
        SystemStatus = 112 => "systemStatus",
        Units = 117 => "units",
        UtcOffset = 119 => "utcOffset",
        VendorIdentifier = 120 => "vendorIdentifier",
        VendorName = 121 => "vendorName",
        ProtocolRevision = 139 => "protocolRevision",
        DatabaseRevision = 155 => "databaseRevision",
        PropertyList = 371 => "propertyList",
    }
}

/// Object type plus instance number, packed into 32 bits on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectIdentifier {
    pub object_type: ObjectType,
    pub instance: u32,
}

impl ObjectIdentifier {
    pub fn new(object_type: ObjectType, instance: u32) -> Self {
        Self {
            object_type,
            instance,
        }
    }

    /// Packed wire form, or `None` when a field does not fit its bit width.
    pub fn encode(&self) -> Option<u32> {
        let object_type = self.object_type.code();
        if object_type > MAX_OBJECT_TYPE || self.instance > MAX_INSTANCE {
            return None;
        }
        Some((u32::from(object_type) << 22) | self.instance)
    }

    pub fn decode(raw: u32) -> Self {
        // The shifted value has at most 10 significant bits.
        let object_type = (raw >> 22) as u16;
        Self {
            object_type: ObjectType::from_code(object_type),
            instance: raw & MAX_INSTANCE,
        }
    }
}

impl fmt::Display for ObjectIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.object_type, self.instance)
    }
}
