//! Byte-level wire utilities
//!
//! CRC-8 checksum, the length-prefixed `str16` string and bounds-checked
//! primitive readers shared by the codec and the frame parser.

use std::fmt;

use bytes::{Buf, BufMut};

use super::{Error, Result};

/// CRC-8 polynomial x^8+x^6+x^3+x^2+1 (0x14D), truncated to 8 bits.
/// Chosen based on Koopman's embedded-network polynomial survey; this exact
/// polynomial, MSB-first with initial value 0, is the wire contract.
const CRC8_POLY: u8 = 0x4D;

/// Incremental CRC-8 accumulator
///
/// Bit-by-bit, no table. Use [`crc8`] for a contiguous buffer; the
/// accumulator form covers senders that stream a frame in pieces.
#[derive(Debug, Clone, Copy, Default)]
pub struct Crc8(u8);

impl Crc8 {
    /// Create a fresh accumulator (initial value 0)
    #[must_use]
    pub const fn new() -> Self {
        Self(0)
    }

    /// Feed bytes into the checksum
    pub fn update(&mut self, data: &[u8]) {
        let mut crc = self.0;
        for &byte in data {
            crc ^= byte;
            for _ in 0..8 {
                crc = if crc & 0x80 != 0 {
                    (crc << 1) ^ CRC8_POLY
                } else {
                    crc << 1
                };
            }
        }
        self.0 = crc;
    }

    /// Final checksum value
    #[must_use]
    pub const fn finish(self) -> u8 {
        self.0
    }
}

/// CRC-8 of a complete buffer
#[must_use]
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc = Crc8::new();
    crc.update(data);
    crc.finish()
}

/// Maximum content length of a [`Str16`]
pub const STR16_MAX: usize = 16;

/// Length-prefixed string capped at 16 bytes
///
/// Labels and units travel in this form: one length byte followed by up to
/// 16 content bytes. Stored inline, so copying an assignment never
/// allocates.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Str16 {
    len: u8,
    bytes: [u8; STR16_MAX],
}

impl Str16 {
    /// Create from a string slice, failing when it exceeds the cap
    pub fn new(text: &str) -> Result<Self> {
        Self::from_bytes(text.as_bytes())
    }

    /// Create from raw bytes, failing when they exceed the cap
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() > STR16_MAX {
            return Err(Error::StringTooLong { len: data.len() });
        }

        let mut bytes = [0u8; STR16_MAX];
        bytes[..data.len()].copy_from_slice(data);
        Ok(Self {
            len: data.len() as u8,
            bytes,
        })
    }

    /// Content bytes
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }

    /// Content as UTF-8, `None` when the wire bytes are not valid UTF-8
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(self.as_bytes()).ok()
    }

    /// Content length in bytes
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len as usize
    }

    /// Check for the empty string
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Encoded size on the wire: length byte + content
    #[must_use]
    pub const fn wire_len(&self) -> usize {
        1 + self.len as usize
    }

    /// Serialize as `len | bytes`
    pub fn encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.len);
        buf.put_slice(self.as_bytes());
    }

    /// Deserialize, validating the declared length against both the cap and
    /// the remaining buffer
    pub fn decode(buf: &mut impl Buf) -> Result<Self> {
        let len = get_u8(buf)? as usize;
        if len > STR16_MAX {
            return Err(Error::StringTooLong { len });
        }
        if buf.remaining() < len {
            return Err(Error::ShortPayload {
                needed: len,
                remaining: buf.remaining(),
            });
        }

        let mut bytes = [0u8; STR16_MAX];
        buf.copy_to_slice(&mut bytes[..len]);
        Ok(Self {
            len: len as u8,
            bytes,
        })
    }
}

impl fmt::Debug for Str16 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Str16({})", String::from_utf8_lossy(self.as_bytes()))
    }
}

impl fmt::Display for Str16 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(self.as_bytes()))
    }
}

fn short(needed: usize, buf: &impl Buf) -> Error {
    Error::ShortPayload {
        needed,
        remaining: buf.remaining(),
    }
}

/// Read one byte, failing instead of reading out of bounds
pub fn get_u8(buf: &mut impl Buf) -> Result<u8> {
    if buf.remaining() < 1 {
        return Err(short(1, buf));
    }
    Ok(buf.get_u8())
}

/// Read a u16, little-endian
pub fn get_u16(buf: &mut impl Buf) -> Result<u16> {
    if buf.remaining() < 2 {
        return Err(short(2, buf));
    }
    Ok(buf.get_u16_le())
}

/// Read a u32, little-endian
pub fn get_u32(buf: &mut impl Buf) -> Result<u32> {
    if buf.remaining() < 4 {
        return Err(short(4, buf));
    }
    Ok(buf.get_u32_le())
}

/// Read an f32: 4 bytes little-endian, bit pattern transferred verbatim
pub fn get_f32(buf: &mut impl Buf) -> Result<f32> {
    Ok(f32::from_bits(get_u32(buf)?))
}

/// Write an f32: 4 bytes little-endian, bit pattern transferred verbatim
pub fn put_f32(buf: &mut impl BufMut, value: f32) {
    buf.put_u32_le(value.to_bits());
}

/// Reject payloads with bytes past the end of their layout
pub fn ensure_consumed(buf: &impl Buf) -> Result<()> {
    if buf.has_remaining() {
        return Err(Error::TrailingBytes {
            remaining: buf.remaining(),
        });
    }
    Ok(())
}
