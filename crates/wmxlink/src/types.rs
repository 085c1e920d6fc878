//! Value types shared by the session API.

use std::fmt;

/// Which interface a session is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Device {
    /// No specific device; receives notifications for every interface.
    Any,
    /// Interface name, e.g. `wmx0`.
    Name(String),
    /// Interface index.
    Index(u32),
}

impl Device {
    /// Parse a device argument: `#<ifindex>` selects by index, anything
    /// else is taken as an interface name.
    pub fn parse(s: &str) -> Self {
        match s.strip_prefix('#').and_then(|n| n.parse().ok()) {
            Some(index) => Self::Index(index),
            None => Self::Name(s.to_string()),
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("any"),
            Self::Name(name) => f.write_str(name),
            Self::Index(index) => write!(f, "#{}", index),
        }
    }
}

/// Generic netlink interface version; on the wire `major * 10 + minor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ProtocolVersion {
    pub major: u8,
    pub minor: u8,
}

impl ProtocolVersion {
    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }

    /// Decode the version byte advertised by the control family.
    pub const fn from_wire(value: u8) -> Self {
        Self {
            major: value / 10,
            minor: value % 10,
        }
    }

    pub const fn to_wire(self) -> u8 {
        self.major * 10 + self.minor
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Operational state of a WiMAX device.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum DeviceState {
    Null = 0,
    Down = 1,
    Quiescing = 2,
    Uninitialized = 3,
    RadioOff = 4,
    Ready = 5,
    Scanning = 6,
    Connecting = 7,
    Connected = 8,
    Invalid = 9,
}

impl DeviceState {
    /// Decode a wire value; out-of-range values map to `Invalid`.
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Null,
            1 => Self::Down,
            2 => Self::Quiescing,
            3 => Self::Uninitialized,
            4 => Self::RadioOff,
            5 => Self::Ready,
            6 => Self::Scanning,
            7 => Self::Connecting,
            8 => Self::Connected,
            _ => Self::Invalid,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Down => "down",
            Self::Quiescing => "quiescing",
            Self::Uninitialized => "uninitialized",
            Self::RadioOff => "radio-off",
            Self::Ready => "ready",
            Self::Scanning => "scanning",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Invalid => "invalid",
        }
    }
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Requested radio-kill operation.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RfKillState {
    /// Turn the software switch off (radio killed).
    Off = 0,
    /// Turn the software switch on (radio allowed).
    On = 1,
    /// Only report the switch status.
    Query = 2,
}

/// Raw radio-kill status: bit 0 is the hardware switch, bit 1 the software
/// switch. A set bit means the radio is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RfKillStatus(pub u8);

impl RfKillStatus {
    pub const HW: u8 = 1 << 0;
    pub const SW: u8 = 1 << 1;

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn hardware_on(self) -> bool {
        self.0 & Self::HW != 0
    }

    pub fn software_on(self) -> bool {
        self.0 & Self::SW != 0
    }

    /// Whether the software switch reflects `requested`. Queries always match.
    pub fn matches(self, requested: RfKillState) -> bool {
        match requested {
            RfKillState::On => self.software_on(),
            RfKillState::Off => !self.software_on(),
            RfKillState::Query => true,
        }
    }
}

/// Filter applied by blocking message reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipeFilter<'a> {
    /// Only messages tagged with exactly this pipe name.
    Named(&'a str),
    /// Only untagged messages (the default pipe).
    Default,
    /// Every message, tagged or not.
    Any,
}

impl PipeFilter<'_> {
    pub fn matches(&self, pipe: Option<&str>) -> bool {
        match (self, pipe) {
            (Self::Any, _) => true,
            (Self::Default, None) => true,
            (Self::Named(want), Some(got)) => *want == got,
            _ => false,
        }
    }
}

/// Handle for an entry of the session's channel registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId(pub usize);

impl ChannelId {
    /// The reserved default channel (`"msg"`).
    pub const DEFAULT: ChannelId = ChannelId(0);
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A resolved network interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interface {
    pub name: String,
    pub index: u32,
}
