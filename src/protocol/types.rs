//! Control Chain command vocabulary and wire enums

use std::fmt;

/// Control Chain commands
///
/// Command ids are positional; both ends of one deployment must agree on
/// the ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Command {
    /// Master poll / device keep-alive
    ChainSync = 0x00,
    /// Address negotiation (device hello and master reply share the id)
    Handshake = 0x01,
    /// Device descriptor request/response
    DevDescriptor = 0x02,
    /// Bind an actuator to a parameter
    Assignment = 0x03,
    /// Queued value changes, device to master
    DataUpdate = 0x04,
    /// Drop an assignment
    Unassignment = 0x05,
    /// Enable/disable the device
    DevControl = 0x06,
}

impl Command {
    /// Convert from byte
    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(Self::ChainSync),
            0x01 => Some(Self::Handshake),
            0x02 => Some(Self::DevDescriptor),
            0x03 => Some(Self::Assignment),
            0x04 => Some(Self::DataUpdate),
            0x05 => Some(Self::Unassignment),
            0x06 => Some(Self::DevControl),
            _ => None,
        }
    }

    /// Convert to byte
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ChainSync => "ChainSync",
            Self::Handshake => "Handshake",
            Self::DevDescriptor => "DevDescriptor",
            Self::Assignment => "Assignment",
            Self::DataUpdate => "DataUpdate",
            Self::Unassignment => "Unassignment",
            Self::DevControl => "DevControl",
        };
        write!(f, "{name}")
    }
}

/// Cycle marker carried by a `ChainSync` message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum SyncCycle {
    /// Master (re)starting the chain; devices reset to the syncing state
    Setup = 0x00,
    /// Regular poll cycle, arms the device's reply window
    Regular = 0x01,
    /// Master is accepting handshakes from unaddressed devices
    Handshake = 0x02,
}

impl SyncCycle {
    /// Convert from byte
    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(Self::Setup),
            0x01 => Some(Self::Regular),
            0x02 => Some(Self::Handshake),
            _ => None,
        }
    }

    /// Convert to byte
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Status byte of the master's handshake reply
///
/// Unknown values are preserved so the application can log exactly what the
/// master said.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HandshakeStatus {
    /// Device accepted
    Ok,
    /// Device accepted but its firmware must be updated
    OutdatedFirmware,
    /// Master refused the device
    Refused,
    /// Status byte this implementation does not know
    Other(u8),
}

impl HandshakeStatus {
    /// Convert from byte
    #[must_use]
    pub const fn from_u8(value: u8) -> Self {
        match value {
            0x00 => Self::Ok,
            0x01 => Self::OutdatedFirmware,
            0x02 => Self::Refused,
            other => Self::Other(other),
        }
    }

    /// Convert to byte
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::Ok => 0x00,
            Self::OutdatedFirmware => 0x01,
            Self::Refused => 0x02,
            Self::Other(byte) => byte,
        }
    }

    /// Whether the master accepted the device
    #[must_use]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

/// Assignment mode bitmask
///
/// The mask travels as a u32; bits unknown to this implementation are kept
/// verbatim so newer masters keep working.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Mode(u32);

impl Mode {
    /// Press flips the value between 0 and 1
    pub const TOGGLE: u32 = 1 << 0;
    /// Press forces the value to 1
    pub const TRIGGER: u32 = 1 << 1;
    /// Value walks an enumeration list
    pub const OPTIONS: u32 = 1 << 2;
    /// Value is a tempo tapped on the actuator
    pub const TAP_TEMPO: u32 = 1 << 3;
    /// Value is 1 only while the actuator is held
    pub const MOMENTARY: u32 = 1 << 4;
    /// Master drives an indicator colour for this assignment
    pub const COLOURED: u32 = 1 << 5;
    /// Assignment belongs to a parameter group
    pub const GROUP: u32 = 1 << 6;
    /// Actuator direction is inverted
    pub const REVERSE: u32 = 1 << 7;

    /// Create empty mode mask
    #[must_use]
    pub const fn new() -> Self {
        Self(0)
    }

    /// Create from raw wire bits
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Raw wire bits
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Set a mode bit
    #[must_use]
    pub const fn with(mut self, mode: u32) -> Self {
        self.0 |= mode;
        self
    }

    /// Check if a mode bit is set
    #[must_use]
    pub const fn has(self, mode: u32) -> bool {
        (self.0 & mode) != 0
    }

    /// Check if the toggle bit is set
    #[must_use]
    pub const fn is_toggle(self) -> bool {
        self.has(Self::TOGGLE)
    }

    /// Check if the trigger bit is set
    #[must_use]
    pub const fn is_trigger(self) -> bool {
        self.has(Self::TRIGGER)
    }

    /// Check if the momentary bit is set
    #[must_use]
    pub const fn is_momentary(self) -> bool {
        self.has(Self::MOMENTARY)
    }

    /// Whether the edge-triggered press behavior applies
    #[must_use]
    pub const fn is_edge_triggered(self) -> bool {
        self.is_toggle() || self.is_trigger()
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(u32, &str); 8] = [
            (Mode::TOGGLE, "TOGGLE"),
            (Mode::TRIGGER, "TRIGGER"),
            (Mode::OPTIONS, "OPTIONS"),
            (Mode::TAP_TEMPO, "TAP_TEMPO"),
            (Mode::MOMENTARY, "MOMENTARY"),
            (Mode::COLOURED, "COLOURED"),
            (Mode::GROUP, "GROUP"),
            (Mode::REVERSE, "REVERSE"),
        ];

        let mut first = true;
        for (bit, name) in NAMES {
            if self.has(bit) {
                if !first {
                    write!(f, " | ")?;
                }
                write!(f, "{name}")?;
                first = false;
            }
        }
        if first {
            write!(f, "NONE")?;
        }
        Ok(())
    }
}

/// Protocol or firmware version triple
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Version {
    /// Major version
    pub major: u8,
    /// Minor version
    pub minor: u8,
    /// Micro version
    pub micro: u8,
}

impl Version {
    /// Create a new version triple
    #[must_use]
    pub const fn new(major: u8, minor: u8, micro: u8) -> Self {
        Self {
            major,
            minor,
            micro,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.micro)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_roundtrip() {
        for byte in 0x00..=0x06 {
            let command = Command::from_u8(byte).unwrap();
            assert_eq!(command.as_u8(), byte);
        }
        assert!(Command::from_u8(0x07).is_none());
        assert!(Command::from_u8(0xFF).is_none());
    }

    #[test]
    fn test_sync_cycle_roundtrip() {
        assert_eq!(SyncCycle::from_u8(0x00), Some(SyncCycle::Setup));
        assert_eq!(SyncCycle::from_u8(0x01), Some(SyncCycle::Regular));
        assert_eq!(SyncCycle::from_u8(0x02), Some(SyncCycle::Handshake));
        assert!(SyncCycle::from_u8(0x03).is_none());
    }

    #[test]
    fn test_handshake_status_preserves_unknown() {
        assert_eq!(HandshakeStatus::from_u8(0x00), HandshakeStatus::Ok);
        assert!(HandshakeStatus::from_u8(0x00).is_ok());
        assert_eq!(HandshakeStatus::from_u8(0x7F).as_u8(), 0x7F);
        assert!(!HandshakeStatus::from_u8(0x01).is_ok());
    }

    #[test]
    fn test_mode_bits() {
        let mode = Mode::new().with(Mode::TOGGLE).with(Mode::COLOURED);

        assert!(mode.is_toggle());
        assert!(!mode.is_trigger());
        assert!(mode.is_edge_triggered());
        assert!(mode.has(Mode::COLOURED));
        assert_eq!(mode.bits(), Mode::TOGGLE | Mode::COLOURED);
    }

    #[test]
    fn test_mode_keeps_unknown_bits() {
        let mode = Mode::from_bits(0x8000_0001);
        assert!(mode.is_toggle());
        assert_eq!(mode.bits(), 0x8000_0001);
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(Mode::new().to_string(), "NONE");
        let mode = Mode::new().with(Mode::TRIGGER).with(Mode::REVERSE);
        assert_eq!(mode.to_string(), "TRIGGER | REVERSE");
    }
}
