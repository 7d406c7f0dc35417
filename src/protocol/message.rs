//! Control Chain message payloads (encode/decode)
//!
//! One typed struct per payload, plus the [`Message`] enum covering every
//! command in both directions. Decoding treats the input length as
//! authoritative: a truncated or oversized payload is rejected with a typed
//! error, never read past.

use bytes::BufMut;

use super::wire::{ensure_consumed, get_f32, get_u8, get_u16, get_u32, put_f32};
use super::{Command, Error, HandshakeStatus, Mode, Result, Str16, SyncCycle, Version};

/// Handshake hello, device to master
///
/// Broadcast while the device has no address; `random_id` is the nonce the
/// master echoes to pick this device out of the chain.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Handshake {
    /// Device URI, e.g. `urn:mod:footex`
    pub uri: Str16,
    /// Nonce for bus arbitration
    pub random_id: u16,
    /// Protocol version (major/minor travel on the wire)
    pub protocol: Version,
    /// Firmware version
    pub firmware: Version,
}

/// Handshake reply, master to device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HandshakeReply {
    /// Echo of the device nonce
    pub random_id: u16,
    /// Acceptance status
    pub status: HandshakeStatus,
    /// Address assigned to the device
    pub device_id: u8,
    /// Communication channel
    pub channel: u8,
}

/// Actuator summary inside the device descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActuatorDescriptor {
    /// Actuator name shown by the master
    pub name: Str16,
    /// Modes the actuator supports
    pub supported_modes: Mode,
    /// How many assignments it accepts
    pub max_assignments: u8,
}

/// Device descriptor, device to master
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceDescriptor {
    /// Device label
    pub label: Str16,
    /// Actuators in registration order; the index is the actuator id
    pub actuators: Vec<ActuatorDescriptor>,
}

/// Actuator-to-parameter binding requested by the master
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Assignment {
    /// Master-assigned id, unique while active
    pub id: u8,
    /// Target actuator
    pub actuator_id: u8,
    /// Parameter label
    pub label: Str16,
    /// Current value
    pub value: f32,
    /// Range minimum
    pub min: f32,
    /// Range maximum
    pub max: f32,
    /// Default value
    pub def: f32,
    /// Mode bitmask
    pub mode: Mode,
    /// Step count for discrete parameters
    pub steps: u16,
    /// Unit label, e.g. `bpm`, `ms`
    pub unit: Str16,
}

/// Pending value-change notification
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Update {
    /// Assignment whose value changed
    pub assignment_id: u8,
    /// New value
    pub value: f32,
}

/// A Control Chain message: command plus typed payload
///
/// Variants cover both bus directions; the direction-specific decoders
/// resolve the commands whose request and reply share an id.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Master poll or device keep-alive
    ChainSync {
        /// Cycle marker
        cycle: SyncCycle,
    },
    /// Device hello (broadcast, device to master)
    Handshake(Handshake),
    /// Master's handshake reply
    HandshakeReply(HandshakeReply),
    /// Master asks for the descriptor (empty payload)
    DevDescriptorRequest,
    /// Device descriptor response
    DevDescriptor(DeviceDescriptor),
    /// Master creates an assignment
    Assignment(Assignment),
    /// Device acknowledges an assignment (empty payload)
    AssignmentAck,
    /// Queued value changes, device to master
    DataUpdate(Vec<Update>),
    /// Master removes an assignment
    Unassignment {
        /// Assignment to drop; `0xFF` drops them all
        assignment_id: u8,
    },
    /// Device acknowledges an unassignment (empty payload)
    UnassignmentAck,
    /// Master enables or disables the device
    DevControl {
        /// `false` halts all protocol activity
        enable: bool,
    },
}

impl Message {
    /// Command id this message travels under
    #[must_use]
    pub const fn command(&self) -> Command {
        match self {
            Self::ChainSync { .. } => Command::ChainSync,
            Self::Handshake(_) | Self::HandshakeReply(_) => Command::Handshake,
            Self::DevDescriptorRequest | Self::DevDescriptor(_) => Command::DevDescriptor,
            Self::Assignment(_) | Self::AssignmentAck => Command::Assignment,
            Self::DataUpdate(_) => Command::DataUpdate,
            Self::Unassignment { .. } | Self::UnassignmentAck => Command::Unassignment,
            Self::DevControl { .. } => Command::DevControl,
        }
    }

    /// Encoded payload size in bytes
    #[must_use]
    pub fn payload_len(&self) -> usize {
        match self {
            Self::ChainSync { .. } | Self::Unassignment { .. } | Self::DevControl { .. } => 1,
            Self::Handshake(hs) => hs.uri.wire_len() + 7,
            Self::HandshakeReply(_) => 5,
            Self::DevDescriptorRequest | Self::AssignmentAck | Self::UnassignmentAck => 0,
            Self::DevDescriptor(desc) => {
                desc.label.wire_len()
                    + 1
                    + desc
                        .actuators
                        .iter()
                        .map(|a| a.name.wire_len() + 5)
                        .sum::<usize>()
            }
            Self::Assignment(a) => 2 + a.label.wire_len() + 16 + 4 + 2 + a.unit.wire_len(),
            Self::DataUpdate(updates) => 1 + updates.len() * 5,
        }
    }

    /// Serialize the payload
    ///
    /// Writes exactly [`payload_len`](Self::payload_len) bytes.
    pub fn encode_payload(&self, buf: &mut Vec<u8>) {
        buf.reserve(self.payload_len());

        match self {
            Self::ChainSync { cycle } => buf.put_u8(cycle.as_u8()),
            Self::Handshake(hs) => {
                hs.uri.encode(buf);
                buf.put_u16_le(hs.random_id);
                buf.put_u8(hs.protocol.major);
                buf.put_u8(hs.protocol.minor);
                buf.put_u8(hs.firmware.major);
                buf.put_u8(hs.firmware.minor);
                buf.put_u8(hs.firmware.micro);
            }
            Self::HandshakeReply(reply) => {
                buf.put_u16_le(reply.random_id);
                buf.put_u8(reply.status.as_u8());
                buf.put_u8(reply.device_id);
                buf.put_u8(reply.channel);
            }
            Self::DevDescriptorRequest | Self::AssignmentAck | Self::UnassignmentAck => {}
            Self::DevDescriptor(desc) => {
                desc.label.encode(buf);
                buf.put_u8(desc.actuators.len() as u8);
                for actuator in &desc.actuators {
                    actuator.name.encode(buf);
                    buf.put_u32_le(actuator.supported_modes.bits());
                    buf.put_u8(actuator.max_assignments);
                }
            }
            Self::Assignment(a) => {
                buf.put_u8(a.id);
                buf.put_u8(a.actuator_id);
                a.label.encode(buf);
                put_f32(buf, a.value);
                put_f32(buf, a.min);
                put_f32(buf, a.max);
                put_f32(buf, a.def);
                buf.put_u32_le(a.mode.bits());
                buf.put_u16_le(a.steps);
                a.unit.encode(buf);
            }
            Self::DataUpdate(updates) => {
                buf.put_u8(updates.len() as u8);
                for update in updates {
                    buf.put_u8(update.assignment_id);
                    put_f32(buf, update.value);
                }
            }
            Self::Unassignment { assignment_id } => buf.put_u8(*assignment_id),
            Self::DevControl { enable } => buf.put_u8(u8::from(*enable)),
        }
    }

    /// Decode a payload travelling master-to-device
    ///
    /// This is the direction a slave parses. `Handshake` resolves to the
    /// reply layout, `DevDescriptor` to the (empty) request.
    pub fn decode_from_master(command: Command, mut payload: &[u8]) -> Result<Self> {
        let buf = &mut payload;

        let message = match command {
            Command::ChainSync => {
                let byte = get_u8(buf)?;
                let cycle = SyncCycle::from_u8(byte).ok_or(Error::UnknownSyncCycle { byte })?;
                Self::ChainSync { cycle }
            }
            Command::Handshake => Self::HandshakeReply(HandshakeReply {
                random_id: get_u16(buf)?,
                status: HandshakeStatus::from_u8(get_u8(buf)?),
                device_id: get_u8(buf)?,
                channel: get_u8(buf)?,
            }),
            Command::DevDescriptor => Self::DevDescriptorRequest,
            Command::Assignment => Self::Assignment(Assignment {
                id: get_u8(buf)?,
                actuator_id: get_u8(buf)?,
                label: Str16::decode(buf)?,
                value: get_f32(buf)?,
                min: get_f32(buf)?,
                max: get_f32(buf)?,
                def: get_f32(buf)?,
                mode: Mode::from_bits(get_u32(buf)?),
                steps: get_u16(buf)?,
                unit: Str16::decode(buf)?,
            }),
            Command::Unassignment => Self::Unassignment {
                assignment_id: get_u8(buf)?,
            },
            Command::DevControl => Self::DevControl {
                enable: get_u8(buf)? != 0,
            },
            Command::DataUpdate => return Err(Error::UnexpectedCommand { command }),
        };

        ensure_consumed(buf)?;
        Ok(message)
    }

    /// Decode a payload travelling device-to-master
    ///
    /// The direction a master (or a test acting as one) parses.
    pub fn decode_from_device(command: Command, mut payload: &[u8]) -> Result<Self> {
        let buf = &mut payload;

        let message = match command {
            Command::ChainSync => {
                let byte = get_u8(buf)?;
                let cycle = SyncCycle::from_u8(byte).ok_or(Error::UnknownSyncCycle { byte })?;
                Self::ChainSync { cycle }
            }
            Command::Handshake => {
                let uri = Str16::decode(buf)?;
                let random_id = get_u16(buf)?;
                let protocol = Version::new(get_u8(buf)?, get_u8(buf)?, 0);
                let firmware = Version::new(get_u8(buf)?, get_u8(buf)?, get_u8(buf)?);
                Self::Handshake(Handshake {
                    uri,
                    random_id,
                    protocol,
                    firmware,
                })
            }
            Command::DevDescriptor => {
                let label = Str16::decode(buf)?;
                let count = get_u8(buf)? as usize;
                let mut actuators = Vec::with_capacity(count);
                for _ in 0..count {
                    actuators.push(ActuatorDescriptor {
                        name: Str16::decode(buf)?,
                        supported_modes: Mode::from_bits(get_u32(buf)?),
                        max_assignments: get_u8(buf)?,
                    });
                }
                Self::DevDescriptor(DeviceDescriptor { label, actuators })
            }
            Command::Assignment => Self::AssignmentAck,
            Command::Unassignment => Self::UnassignmentAck,
            Command::DataUpdate => {
                let count = get_u8(buf)? as usize;
                let mut updates = Vec::with_capacity(count);
                for _ in 0..count {
                    updates.push(Update {
                        assignment_id: get_u8(buf)?,
                        value: get_f32(buf)?,
                    });
                }
                Self::DataUpdate(updates)
            }
            Command::DevControl => return Err(Error::UnexpectedCommand { command }),
        };

        ensure_consumed(buf)?;
        Ok(message)
    }
}
