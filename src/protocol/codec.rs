//! Frame codec (encode/decode)
//!
//! A frame is the wire unit around one message:
//!
//! ```text
//! [SYNC (1)] [ADDRESS (1)] [COMMAND (1)] [LENGTH (2, LE)] [PAYLOAD] [CRC8 (1)]
//! ```
//!
//! The CRC covers address through end-of-payload; the sync byte is outside
//! the checksum. [`encode_frame`] builds the full wire image in one
//! contiguous buffer; [`decode_frame`] validates a complete buffer, which
//! is what a master-side tool or test uses. Byte-at-a-time reception goes
//! through [`FrameParser`](super::FrameParser) instead.

use bytes::Bytes;

use super::wire::crc8;
use super::{
    BROADCAST_ADDRESS, Command, Error, FRAME_HEADER_SIZE, FRAME_OVERHEAD, MAX_PAYLOAD_SIZE,
    Message, Result, SYNC_BYTE,
};

/// One fully-received frame: addressing plus raw payload
///
/// The payload stays undecoded so frame handling and message decoding can
/// fail independently; decode it with
/// [`Message::decode_from_master`] or [`Message::decode_from_device`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Destination address on the wire (0 = broadcast)
    pub address: u8,
    /// Command id
    pub command: Command,
    /// Raw payload bytes
    pub payload: Bytes,
}

impl Frame {
    /// Decode the payload as a slave receiving from the master
    pub fn message_from_master(&self) -> Result<Message> {
        Message::decode_from_master(self.command, &self.payload)
    }

    /// Decode the payload as a master receiving from a device
    pub fn message_from_device(&self) -> Result<Message> {
        Message::decode_from_device(self.command, &self.payload)
    }

    /// Whether the frame was sent to the broadcast address
    #[must_use]
    pub const fn is_broadcast(&self) -> bool {
        self.address == BROADCAST_ADDRESS
    }
}

/// Encode a message into a complete wire frame
#[must_use]
pub fn encode_frame(address: u8, message: &Message) -> Vec<u8> {
    let payload_len = message.payload_len();
    let mut bytes = Vec::with_capacity(FRAME_OVERHEAD + payload_len);

    bytes.push(SYNC_BYTE);
    bytes.push(address);
    bytes.push(message.command().as_u8());
    bytes.extend_from_slice(&(payload_len as u16).to_le_bytes());
    message.encode_payload(&mut bytes);

    // CRC covers address..payload, not the sync byte
    bytes.push(crc8(&bytes[1..]));

    bytes
}

/// Decode a complete wire frame
///
/// # Errors
///
/// Returns an error if:
/// - Buffer is shorter than the frame overhead or the declared length
/// - First byte is not the sync byte
/// - Command byte is unknown
/// - Declared payload length exceeds the accepted bound
/// - Checksum doesn't match
pub fn decode_frame(bytes: &[u8]) -> Result<Frame> {
    if bytes.len() < FRAME_OVERHEAD {
        return Err(Error::FrameTruncated {
            needed: FRAME_OVERHEAD,
            got: bytes.len(),
        });
    }

    if bytes[0] != SYNC_BYTE {
        return Err(Error::MissingSync { found: bytes[0] });
    }

    let address = bytes[1];
    let command_byte = bytes[2];
    let payload_len = u16::from_le_bytes([bytes[3], bytes[4]]) as usize;

    if payload_len > MAX_PAYLOAD_SIZE {
        return Err(Error::PayloadTooLarge {
            size: payload_len,
            max: MAX_PAYLOAD_SIZE,
        });
    }

    let total = FRAME_OVERHEAD + payload_len;
    if bytes.len() < total {
        return Err(Error::FrameTruncated {
            needed: total,
            got: bytes.len(),
        });
    }

    let command = Command::from_u8(command_byte).ok_or(Error::UnknownCommand {
        byte: command_byte,
    })?;

    let crc_offset = 1 + FRAME_HEADER_SIZE + payload_len;
    let expected = crc8(&bytes[1..crc_offset]);
    let found = bytes[crc_offset];
    if expected != found {
        return Err(Error::ChecksumMismatch { expected, found });
    }

    Ok(Frame {
        address,
        command,
        payload: Bytes::copy_from_slice(&bytes[1 + FRAME_HEADER_SIZE..crc_offset]),
    })
}
