//! Named enumerations carried by enumerated property values.

use super::object::{ObjectType, PropertyIdentifier};

coded_enum! {
    pub enum BinaryPv: u32, other = Other {
        Inactive = 0 => "inactive",
        Active = 1 => "active",
    }
}

coded_enum! {
    pub enum Polarity: u32, other = Other {
        Normal = 0 => "normal",
        Reverse = 1 => "reverse",
    }
}

coded_enum! {
    pub enum EventState: u32, other = Other {
        Normal = 0 => "normal",
        Fault = 1 => "fault",
        Offnormal = 2 => "offnormal",
        HighLimit = 3 => "highLimit",
        LowLimit = 4 => "lowLimit",
        LifeSafetyAlarm = 5 => "lifeSafetyAlarm",
    }
}

coded_enum! {
    pub enum Reliability: u32, other = Other {
        NoFaultDetected = 0 => "noFaultDetected",
        NoSensor = 1 => "noSensor",
        OverRange = 2 => "overRange",
        UnderRange = 3 => "underRange",
        OpenLoop = 4 => "openLoop",
        ShortedLoop = 5 => "shortedLoop",
        NoOutput = 6 => "noOutput",
        UnreliableOther = 7 => "unreliableOther",
        ProcessError = 8 => "processError",
        MultiStateFault = 9 => "multiStateFault",
        ConfigurationError = 10 => "configurationError",
        CommunicationFailure = 12 => "communicationFailure",
        MemberFault = 13 => "memberFault",
    }
}

coded_enum! {
    pub enum DeviceStatus: u32, other = Other {
        Operational = 0 => "operational",
        OperationalReadOnly = 1 => "operationalReadOnly",
        DownloadRequired = 2 => "downloadRequired",
        DownloadInProgress = 3 => "downloadInProgress",
        NonOperational = 4 => "nonOperational",
        BackupInProgress = 5 => "backupInProgress",
    }
}

coded_enum! {
    pub enum Segmentation: u32, other = Other {
        SegmentedBoth = 0 => "segmentedBoth",
        SegmentedTransmit = 1 => "segmentedTransmit",
        SegmentedReceive = 2 => "segmentedReceive",
        NoSegmentation = 3 => "noSegmentation",
    }
}

coded_enum! {
    /// Engineering units.
    pub enum EngineeringUnits: u32, other = Other {
        SquareMeters = 0 => "squareMeters",
        SquareFeet = 1 => "squareFeet",
        Milliamperes = 2 => "milliamperes",
        Amperes = 3 => "amperes",
        Ohms = 4 => "ohms",
        Volts = 5 => "volts",
        Kilovolts = 6 => "kilovolts",
        Megavolts = 7 => "megavolts",
        VoltAmperes = 8 => "voltAmperes",
        KilovoltAmperes = 9 => "kilovoltAmperes",
        MegavoltAmperes = 10 => "megavoltAmperes",
        VoltAmperesReactive = 11 => "voltAmperesReactive",
        KilovoltAmperesReactive = 12 => "kilovoltAmperesReactive",
        MegavoltAmperesReactive = 13 => "megavoltAmperesReactive",
        DegreesPhase = 14 => "degreesPhase",
        PowerFactor = 15 => "powerFactor",
        Joules = 16 => "joules",
        Kilojoules = 17 => "kilojoules",
        WattHours = 18 => "wattHours",
        KilowattHours = 19 => "kilowattHours",
        Btus = 20 => "btus",
        Therms = 21 => "therms",
        TonHours = 22 => "tonHours",
        JoulesPerKilogramDryAir = 23 => "joulesPerKilogramDryAir",
        BtusPerPoundDryAir = 24 => "btusPerPoundDryAir",
        CyclesPerHour = 25 => "cyclesPerHour",
        CyclesPerMinute = 26 => "cyclesPerMinute",
        Hertz = 27 => "hertz",
        GramsOfWaterPerKilogramDryAir = 28 => "gramsOfWaterPerKilogramDryAir",
        PercentRelativeHumidity = 29 => "percentRelativeHumidity",
        Millimeters = 30 => "millimeters",
        Meters = 31 => "meters",
        Inches = 32 => "inches",
        Feet = 33 => "feet",
        WattsPerSquareFoot = 34 => "wattsPerSquareFoot",
        WattsPerSquareMeter = 35 => "wattsPerSquareMeter",
        Lumens = 36 => "lumens",
        Luxes = 37 => "luxes",
        FootCandles = 38 => "footCandles",
        Kilograms = 39 => "kilograms",
        PoundsMass = 40 => "poundsMass",
        Tons = 41 => "tons",
        KilogramsPerSecond = 42 => "kilogramsPerSecond",
        KilogramsPerMinute = 43 => "kilogramsPerMinute",
        KilogramsPerHour = 44 => "kilogramsPerHour",
        PoundsMassPerMinute = 45 => "poundsMassPerMinute",
        PoundsMassPerHour = 46 => "poundsMassPerHour",
        Watts = 47 => "watts",
        Kilowatts = 48 => "kilowatts",
        Megawatts = 49 => "megawatts",
        BtusPerHour = 50 => "btusPerHour",
        Horsepower = 51 => "horsepower",
        TonsRefrigeration = 52 => "tonsRefrigeration",
        Pascals = 53 => "pascals",
        Kilopascals = 54 => "kilopascals",
        Bars = 55 => "bars",
        PoundsForcePerSquareInch = 56 => "poundsForcePerSquareInch",
        CentimetersOfWater = 57 => "centimetersOfWater",
        InchesOfWater = 58 => "inchesOfWater",
        MillimetersOfMercury = 59 => "millimetersOfMercury",
        CentimetersOfMercury = 60 => "centimetersOfMercury",
        InchesOfMercury = 61 => "inchesOfMercury",
        DegreesCelsius = 62 => "degreesCelsius",
        DegreesKelvin = 63 => "degreesKelvin",
        DegreesFahrenheit = 64 => "degreesFahrenheit",
        DegreeDaysCelsius = 65 => "degreeDaysCelsius",
        DegreeDaysFahrenheit = 66 => "degreeDaysFahrenheit",
        Years = 67 => "years",
        Months = 68 => "months",
        Weeks = 69 => "weeks",
        Days = 70 => "days",
        Hours = 71 => "hours",
        Minutes = 72 => "minutes",
        Seconds = 73 => "seconds",
        MetersPerSecond = 74 => "metersPerSecond",
        KilometersPerHour = 75 => "kilometersPerHour",
        FeetPerSecond = 76 => "feetPerSecond",
        FeetPerMinute = 77 => "feetPerMinute",
        MilesPerHour = 78 => "milesPerHour",
        CubicFeet = 79 => "cubicFeet",
        CubicMeters = 80 => "cubicMeters",
        ImperialGallons = 81 => "imperialGallons",
        Liters = 82 => "liters",
        UsGallons = 83 => "usGallons",
        CubicFeetPerMinute = 84 => "cubicFeetPerMinute",
        CubicMetersPerSecond = 85 => "cubicMetersPerSecond",
        ImperialGallonsPerMinute = 86 => "imperialGallonsPerMinute",
        LitersPerSecond = 87 => "litersPerSecond",
        LitersPerMinute = 88 => "litersPerMinute",
        UsGallonsPerMinute = 89 => "usGallonsPerMinute",
        DegreesAngular = 90 => "degreesAngular",
        DegreesCelsiusPerHour = 91 => "degreesCelsiusPerHour",
        DegreesCelsiusPerMinute = 92 => "degreesCelsiusPerMinute",
        DegreesFahrenheitPerHour = 93 => "degreesFahrenheitPerHour",
        DegreesFahrenheitPerMinute = 94 => "degreesFahrenheitPerMinute",
        NoUnits = 95 => "noUnits",
        PartsPerMillion = 96 => "partsPerMillion",
        PartsPerBillion = 97 => "partsPerBillion",
        Percent = 98 => "percent",
        PercentPerSecond = 99 => "percentPerSecond",
        PerMinute = 100 => "perMinute",
        PerSecond = 101 => "perSecond",
        PsiPerDegreeFahrenheit = 102 => "psiPerDegreeFahrenheit",
        Radians = 103 => "radians",
        RevolutionsPerMinute = 104 => "revolutionsPerMinute",
    }
}

/// Which name table an enumerated property value is read against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Enumeration {
    BinaryPv,
    Polarity,
    EventState,
    Reliability,
    DeviceStatus,
    Segmentation,
    EngineeringUnits,
    ObjectType,
    PropertyIdentifier,
}

impl Enumeration {
    /// Standard name of `code`, if it has one.
    pub fn name(self, code: u32) -> Option<&'static str> {
        match self {
            Self::BinaryPv => BinaryPv::from_code(code).name(),
            Self::Polarity => Polarity::from_code(code).name(),
            Self::EventState => EventState::from_code(code).name(),
            Self::Reliability => Reliability::from_code(code).name(),
            Self::DeviceStatus => DeviceStatus::from_code(code).name(),
            Self::Segmentation => Segmentation::from_code(code).name(),
            Self::EngineeringUnits => EngineeringUnits::from_code(code).name(),
            Self::ObjectType => u16::try_from(code)
                .ok()
                .and_then(|code| ObjectType::from_code(code).name()),
            Self::PropertyIdentifier => PropertyIdentifier::from_code(code).name(),
        }
    }
}
