//! Control Chain error types

use thiserror::Error;

use super::types::Command;

/// Control Chain protocol errors
#[derive(Error, Debug)]
pub enum Error {
    /// Unknown command byte
    #[error("unknown command byte: {byte:#04x}")]
    UnknownCommand {
        /// Offending byte
        byte: u8,
    },

    /// Unknown sync cycle marker
    #[error("unknown sync cycle: {byte:#04x}")]
    UnknownSyncCycle {
        /// Offending byte
        byte: u8,
    },

    /// Command is valid but never travels in this direction
    #[error("unexpected command for this direction: {command}")]
    UnexpectedCommand {
        /// Decoded command
        command: Command,
    },

    /// Payload declared more data than it carries
    #[error("payload too short: need {needed} more bytes, {remaining} left")]
    ShortPayload {
        /// Bytes the decoder still needed
        needed: usize,
        /// Bytes left in the buffer
        remaining: usize,
    },

    /// Payload carries bytes past the end of its layout
    #[error("trailing bytes after payload: {remaining}")]
    TrailingBytes {
        /// Leftover byte count
        remaining: usize,
    },

    /// Payload length exceeds the accepted bound
    #[error("payload too large: {size} bytes (max {max})")]
    PayloadTooLarge {
        /// Declared size
        size: usize,
        /// Maximum allowed
        max: usize,
    },

    /// String field longer than the 16-byte cap
    #[error("string exceeds 16 bytes: {len}")]
    StringTooLong {
        /// Declared length
        len: usize,
    },

    /// Frame checksum mismatch
    #[error("checksum mismatch: expected {expected:#04x}, got {found:#04x}")]
    ChecksumMismatch {
        /// Checksum computed locally
        expected: u8,
        /// Checksum found on the wire
        found: u8,
    },

    /// Buffer does not hold a complete frame
    #[error("frame truncated: need {needed} bytes, got {got}")]
    FrameTruncated {
        /// Minimum bytes needed
        needed: usize,
        /// Actual size
        got: usize,
    },

    /// Frame does not start with the sync byte
    #[error("missing sync byte: got {found:#04x}")]
    MissingSync {
        /// First byte found
        found: u8,
    },

    /// Assignment registry has no free slot
    #[error("assignment registry full: {capacity} slots")]
    RegistryFull {
        /// Registry capacity
        capacity: usize,
    },

    /// Actuator registry has no free slot
    #[error("actuator registry full: {capacity} slots")]
    ActuatorLimit {
        /// Registry capacity
        capacity: usize,
    },

    /// Referenced actuator was never registered
    #[error("no such actuator: {id}")]
    UnknownActuator {
        /// Actuator id
        id: u8,
    },

    /// Referenced assignment is not active
    #[error("no such assignment: {id}")]
    UnknownAssignment {
        /// Assignment id
        id: u8,
    },

    /// IO error from the embedding transport
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
