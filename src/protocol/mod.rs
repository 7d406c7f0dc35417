//! Control Chain wire protocol
//!
//! This module owns the wire format: framing constants, command vocabulary,
//! byte-level utilities, the per-command message codec and the streaming
//! frame parser.

mod codec;
mod error;
mod message;
mod parser;
mod types;
mod wire;

pub use codec::{Frame, decode_frame, encode_frame};
pub use error::{Error, Result};
pub use message::{
    ActuatorDescriptor, Assignment, DeviceDescriptor, Handshake, HandshakeReply, Message, Update,
};
pub use parser::FrameParser;
pub use types::{Command, HandshakeStatus, Mode, SyncCycle, Version};
pub use wire::{Crc8, STR16_MAX, Str16, crc8};

/// Frame delimiter, first byte of every message on the bus
pub const SYNC_BYTE: u8 = 0xA7;

/// Address 0 doubles as the broadcast address and the unassigned address
pub const BROADCAST_ADDRESS: u8 = 0;

/// CRC-covered frame header: address, command, payload length (u16 LE)
pub const FRAME_HEADER_SIZE: usize = 4;

/// Sync byte + header + CRC, everything around the payload
pub const FRAME_OVERHEAD: usize = FRAME_HEADER_SIZE + 2;

/// Upper bound accepted for a payload length; the wire field is u16 but no
/// Control Chain message comes anywhere near it, so longer claims are
/// treated as line noise and the frame is dropped
pub const MAX_PAYLOAD_SIZE: usize = 1024;

/// Protocol version advertised during the handshake
pub const PROTOCOL_VERSION: Version = Version {
    major: 0,
    minor: 6,
    micro: 0,
};
