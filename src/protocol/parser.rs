//! Byte-wise frame reassembly
//!
//! [`FrameParser`] consumes a serial byte stream one byte at a time and
//! yields complete, CRC-checked frames. The cursor survives arbitrary chunk
//! boundaries, so the transport can hand over bytes however its FIFO slices
//! them.
//!
//! Rejected input (foreign address, oversized length claim, bad CRC) is
//! dropped silently: unaddressed traffic for other devices is routine on a
//! shared bus. On a rejection the parser re-scans the buffered bytes for
//! the next sync candidate instead of discarding them wholesale, so one
//! corrupted byte never costs the valid frame right behind it. The re-scan
//! is iterative and bounded by the frame buffer, never recursive.

use std::collections::VecDeque;

use bytes::Bytes;
use tracing::trace;

use super::{
    BROADCAST_ADDRESS, Command, FRAME_OVERHEAD, Frame, MAX_PAYLOAD_SIZE, SYNC_BYTE, crc8,
};

/// Streaming parser for Control Chain frames
///
/// Address filtering happens here: frames are accepted when sent to the
/// broadcast address, to the parser's own address, or unconditionally while
/// the device still has no address (the pre-handshake state).
#[derive(Debug, Default)]
pub struct FrameParser {
    local_address: u8,
    /// Bytes of the current frame candidate, sync byte included
    buffer: Vec<u8>,
    /// Bytes queued for re-scanning after a rejected candidate
    replay: VecDeque<u8>,
    /// Completed frames awaiting pickup
    ready: VecDeque<Frame>,
}

/// Outcome of ingesting one byte into the current candidate
enum Ingest {
    /// Byte consumed, frame still incomplete
    Incomplete,
    /// Candidate rejected; the buffer must be re-scanned
    Rejected,
}

impl FrameParser {
    /// Create a parser for a device that has no address yet
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Address used for frame filtering
    #[must_use]
    pub const fn local_address(&self) -> u8 {
        self.local_address
    }

    /// Adopt the master-assigned address
    ///
    /// Until this is called (address 0), the filter passes all traffic.
    pub fn set_local_address(&mut self, address: u8) {
        self.local_address = address;
    }

    /// Feed one received byte
    ///
    /// Completed frames become available via [`next_frame`](Self::next_frame).
    pub fn push(&mut self, byte: u8) {
        self.replay.push_back(byte);

        while let Some(next) = self.replay.pop_front() {
            match self.ingest(next) {
                Ingest::Incomplete => {}
                Ingest::Rejected => {
                    // drop the false sync byte, re-scan the rest
                    let buffered = std::mem::take(&mut self.buffer);
                    for &held in buffered[1..].iter().rev() {
                        self.replay.push_front(held);
                    }
                }
            }
        }
    }

    /// Feed a received chunk
    pub fn extend(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.push(byte);
        }
    }

    /// Take the next completed frame, in arrival order
    pub fn next_frame(&mut self) -> Option<Frame> {
        self.ready.pop_front()
    }

    /// Drop any partial frame state (not the address)
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.replay.clear();
        self.ready.clear();
    }

    fn ingest(&mut self, byte: u8) -> Ingest {
        // scanning for a frame start; anything else is inter-frame noise
        if self.buffer.is_empty() {
            if byte == SYNC_BYTE {
                self.buffer.push(byte);
            }
            return Ingest::Incomplete;
        }

        self.buffer.push(byte);

        match self.buffer.len() {
            // address filter
            2 => {
                if byte == BROADCAST_ADDRESS
                    || byte == self.local_address
                    || self.local_address == BROADCAST_ADDRESS
                {
                    Ingest::Incomplete
                } else {
                    Ingest::Rejected
                }
            }
            // payload length complete
            5 => {
                if self.declared_len() > MAX_PAYLOAD_SIZE {
                    trace!(size = self.declared_len(), "oversized length claim, dropping");
                    Ingest::Rejected
                } else {
                    Ingest::Incomplete
                }
            }
            len if len >= FRAME_OVERHEAD && len == FRAME_OVERHEAD + self.declared_len() => {
                self.finish(byte)
            }
            _ => Ingest::Incomplete,
        }
    }

    /// All bytes up to the CRC are in; check it and emit
    fn finish(&mut self, crc_byte: u8) -> Ingest {
        let end = self.buffer.len() - 1;
        let expected = crc8(&self.buffer[1..end]);
        if expected != crc_byte {
            trace!(expected, found = crc_byte, "checksum mismatch, dropping frame");
            return Ingest::Rejected;
        }

        // well-formed frame; an unknown command is consumed and ignored so
        // the stream stays aligned with newer masters
        match Command::from_u8(self.buffer[2]) {
            Some(command) => {
                self.ready.push_back(Frame {
                    address: self.buffer[1],
                    command,
                    payload: Bytes::copy_from_slice(&self.buffer[5..end]),
                });
            }
            None => {
                trace!(byte = self.buffer[2], "unknown command, ignoring frame");
            }
        }

        self.buffer.clear();
        Ingest::Incomplete
    }

    fn declared_len(&self) -> usize {
        u16::from_le_bytes([self.buffer[3], self.buffer[4]]) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Message, SyncCycle, encode_frame};

    fn sync_frame(address: u8, cycle: SyncCycle) -> Vec<u8> {
        encode_frame(address, &Message::ChainSync { cycle })
    }

    fn collect(parser: &mut FrameParser, bytes: &[u8]) -> Vec<Frame> {
        parser.extend(bytes);
        let mut frames = Vec::new();
        while let Some(frame) = parser.next_frame() {
            frames.push(frame);
        }
        frames
    }

    #[test]
    fn test_single_frame() {
        let mut parser = FrameParser::new();
        let frames = collect(&mut parser, &sync_frame(0, SyncCycle::Regular));

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].command, Command::ChainSync);
        assert!(frames[0].is_broadcast());
    }

    #[test]
    fn test_split_points_are_invisible() {
        let wire = sync_frame(0, SyncCycle::Handshake);
        let whole = {
            let mut parser = FrameParser::new();
            collect(&mut parser, &wire)
        };

        for split in 1..wire.len() {
            let mut parser = FrameParser::new();
            parser.extend(&wire[..split]);
            assert!(parser.next_frame().is_none(), "frame completed early");
            let frames = collect(&mut parser, &wire[split..]);
            assert_eq!(frames, whole, "split at {split} changed the result");
        }
    }

    #[test]
    fn test_interframe_noise_skipped() {
        let mut parser = FrameParser::new();
        let mut stream = vec![0x00, 0x13, 0x9C];
        stream.extend_from_slice(&sync_frame(0, SyncCycle::Regular));

        assert_eq!(collect(&mut parser, &stream).len(), 1);
    }

    #[test]
    fn test_foreign_address_filtered() {
        let mut parser = FrameParser::new();
        parser.set_local_address(5);

        let mut stream = sync_frame(9, SyncCycle::Regular); // someone else's
        stream.extend_from_slice(&sync_frame(5, SyncCycle::Regular));
        stream.extend_from_slice(&sync_frame(0, SyncCycle::Regular)); // broadcast

        let frames = collect(&mut parser, &stream);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].address, 5);
        assert_eq!(frames[1].address, 0);
    }

    #[test]
    fn test_unassigned_device_accepts_all_addresses() {
        let mut parser = FrameParser::new();
        let frames = collect(&mut parser, &sync_frame(42, SyncCycle::Regular));
        assert_eq!(frames.len(), 1);
    }

    #[test]
    fn test_corruption_anywhere_drops_only_that_frame() {
        let good = sync_frame(0, SyncCycle::Regular);

        for corrupt_at in 0..good.len() {
            let mut stream = good.clone();
            stream[corrupt_at] ^= 0x10;
            // follow-up traffic; an enlarged length claim swallows bytes
            // until the bogus candidate completes, then re-scan recovers
            for _ in 0..3 {
                stream.extend_from_slice(&good);
            }

            let mut parser = FrameParser::new();
            let frames = collect(&mut parser, &stream);

            let intact = frames
                .iter()
                .filter(|frame| {
                    frame.message_from_master().is_ok_and(|m| {
                        m == Message::ChainSync {
                            cycle: SyncCycle::Regular,
                        }
                    })
                })
                .count();
            assert!(
                intact >= 1,
                "corruption at {corrupt_at} lost all following frames"
            );
        }
    }

    #[test]
    fn test_oversized_length_claim_recovers() {
        let mut stream = vec![SYNC_BYTE, 0x00, 0x00, 0xFF, 0xFF];
        stream.extend_from_slice(&sync_frame(0, SyncCycle::Setup));

        let mut parser = FrameParser::new();
        let frames = collect(&mut parser, &stream);
        assert_eq!(frames.len(), 1);
    }

    #[test]
    fn test_unknown_command_consumed_silently() {
        // hand-built frame with command byte 0x50 and a valid CRC
        let mut wire = vec![SYNC_BYTE, 0x00, 0x50, 0x00, 0x00];
        wire.push(crc8(&wire[1..]));
        wire.extend_from_slice(&sync_frame(0, SyncCycle::Regular));

        let mut parser = FrameParser::new();
        let frames = collect(&mut parser, &wire);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].command, Command::ChainSync);
    }

    #[test]
    fn test_frame_embedded_in_garbage_tail() {
        // a rejected candidate whose tail holds a real frame: the re-scan
        // must find it
        let good = sync_frame(0, SyncCycle::Regular);
        let mut stream = vec![SYNC_BYTE, 0x00, 0x01, 0x02, 0x00]; // bogus header
        stream.extend_from_slice(&good);
        // bogus candidate consumes the two "payload" bytes from the good
        // frame's start, then fails CRC and re-scans
        let mut parser = FrameParser::new();
        let frames = collect(&mut parser, &stream);
        assert_eq!(frames.len(), 1, "re-scan failed to recover embedded frame");
    }
}
