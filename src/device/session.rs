//! Protocol session state machine
//!
//! One [`Session`] per device. It owns the frame parser, the registries and
//! the update queue, consumes raw bytes from the transport and produces
//! outbound frames and typed [`Event`]s, all synchronously: the reply to a
//! completed frame is handed to the transport before the next byte is
//! parsed, which preserves request/reply ordering on the half-duplex bus.

use tracing::{debug, trace, warn};
use uuid::Uuid;

use super::actuator::{ActuatorConfig, ActuatorRegistry};
use super::assignment::{AssignmentRegistry, WILDCARD_ASSIGNMENT_ID};
use super::update::UpdateQueue;
use crate::protocol::{
    Assignment, DeviceDescriptor, Error, FrameParser, Handshake, HandshakeReply, HandshakeStatus,
    Message, PROTOCOL_VERSION, Result, Str16, SyncCycle, Update, Version, encode_frame,
};

/// Idle ticks before the device sends an unsolicited keep-alive sync
pub const I_AM_ALIVE_PERIOD: u32 = 50;

/// Outbound byte sink, implemented by the embedding transport
pub trait Transport {
    /// Hand one complete wire frame to the transport
    fn send(&mut self, bytes: &[u8]) -> Result<()>;
}

/// Receiver for session events
///
/// Delivery is synchronous, from inside the `feed`/`process` call that
/// produced the event. Any `FnMut(Event)` closure qualifies.
pub trait EventSink {
    /// Handle one event
    fn event(&mut self, event: Event);
}

impl<F: FnMut(Event)> EventSink for F {
    fn event(&mut self, event: Event) {
        self(event);
    }
}

/// Application-visible happenings, delivered synchronously
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Master answered the handshake with a non-OK status
    HandshakeFailed {
        /// Status the master reported
        status: HandshakeStatus,
    },
    /// Master created an assignment (already stored and acked)
    AssignmentCreated(Assignment),
    /// Master removed an assignment
    AssignmentRemoved {
        /// Actuator that was freed
        actuator_id: u8,
    },
    /// An assignment's value changed during the actuator pass
    ValueUpdated(Assignment),
    /// Master disabled the device; the session is now terminal
    DeviceDisabled,
    /// Master restarted the chain; registries and queue were cleared
    MasterReset,
    /// Regular sync received; the reply window for this address is open
    SyncWindow {
        /// Own device address
        address: u8,
    },
}

/// Communication state of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommState {
    /// Waiting for the master to open a handshake cycle
    WaitingSync,
    /// Handshake sent, waiting for the master's reply
    WaitingHandshake,
    /// Address adopted, waiting for the descriptor request
    WaitingDescriptor,
    /// Fully enumerated, serving requests
    Listening,
    /// Disabled by the master; terminal
    Disabled,
}

/// Static device identity handed to [`Session::new`]
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Device label shown by the master
    pub label: Str16,
    /// Device URI, e.g. `urn:mod:footex`
    pub uri: Str16,
    /// Firmware version advertised in the handshake
    pub firmware: Version,
    /// Nonce generator seed; `None` draws one from boot entropy
    pub seed: Option<u64>,
}

impl SessionConfig {
    /// Create a config, validating the label and URI lengths
    pub fn new(label: &str, uri: &str, firmware: Version) -> Result<Self> {
        Ok(Self {
            label: Str16::new(label)?,
            uri: Str16::new(uri)?,
            firmware,
            seed: None,
        })
    }

    /// Pin the nonce generator seed (deterministic tests)
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Nonce stream for handshake arbitration
#[derive(Debug)]
struct Lcg(u64);

impl Lcg {
    const A: u64 = 6_364_136_223_846_793_005;
    const C: u64 = 1_442_695_040_888_963_407;

    fn next_nonce(&mut self) -> u16 {
        self.0 = self.0.wrapping_mul(Self::A).wrapping_add(Self::C);
        (self.0 >> 48) as u16
    }
}

/// One Control Chain device session
///
/// Owns every piece of mutable protocol state, so independent instances
/// coexist and tests stay deterministic; there are no process-wide
/// singletons anywhere in the crate.
#[derive(Debug)]
pub struct Session {
    label: Str16,
    uri: Str16,
    firmware: Version,
    state: CommState,
    address: u8,
    nonce: u16,
    rng: Lcg,
    parser: FrameParser,
    actuators: ActuatorRegistry,
    assignments: AssignmentRegistry,
    updates: UpdateQueue,
    idle_ticks: u32,
}

impl Session {
    /// Create a session in the initial (unaddressed, syncing) state
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        let seed = config.seed.unwrap_or_else(boot_seed);

        Self {
            label: config.label,
            uri: config.uri,
            firmware: config.firmware,
            state: CommState::WaitingSync,
            address: 0,
            nonce: 0,
            rng: Lcg(seed),
            parser: FrameParser::new(),
            actuators: ActuatorRegistry::new(),
            assignments: AssignmentRegistry::new(),
            updates: UpdateQueue::new(),
            idle_ticks: 0,
        }
    }

    /// Current communication state
    #[must_use]
    pub const fn state(&self) -> CommState {
        self.state
    }

    /// Master-assigned address (0 until the handshake completes)
    #[must_use]
    pub const fn address(&self) -> u8 {
        self.address
    }

    /// Register an actuator; call at boot, before the master enumerates
    pub fn register_actuator(&mut self, config: ActuatorConfig) -> Result<u8> {
        self.actuators.register(config)
    }

    /// Write an actuator's live sample; the next [`process`](Self::process)
    /// pass picks it up
    pub fn set_actuator_value(&mut self, id: u8, value: f32) -> Result<()> {
        self.actuators.set_value(id, value)
    }

    /// Active assignments, in slot order
    pub fn assignments(&self) -> impl Iterator<Item = &Assignment> {
        self.assignments.iter()
    }

    /// Drive a pass-through-mode assignment from the application
    ///
    /// Stores the value and queues an update for the next flush. The core
    /// only computes values for the edge-triggered modes; everything else
    /// (options, tap tempo, momentary) is the application's business and
    /// enters the protocol here.
    pub fn set_assignment_value(&mut self, assignment_id: u8, value: f32) -> Result<()> {
        let assignment = self
            .assignments
            .get_mut(assignment_id)
            .ok_or(Error::UnknownAssignment { id: assignment_id })?;
        assignment.value = value;
        self.updates.push(Update {
            assignment_id,
            value,
        });
        Ok(())
    }

    /// Feed received bytes
    ///
    /// Frames are handled the moment their last byte arrives, so replies
    /// go out before later bytes are looked at. Corrupt or foreign frames
    /// are dropped silently; registry failures (a master exceeding the
    /// advertised limits) are returned after the remaining bytes have been
    /// parsed.
    pub fn feed<T: Transport, E: EventSink>(
        &mut self,
        bytes: &[u8],
        transport: &mut T,
        events: &mut E,
    ) -> Result<()> {
        if self.state == CommState::Disabled {
            return Ok(());
        }

        let mut result = Ok(());
        for &byte in bytes {
            self.parser.push(byte);
            while let Some(frame) = self.parser.next_frame() {
                let message = match frame.message_from_master() {
                    Ok(message) => message,
                    Err(err) => {
                        trace!(command = %frame.command, error = %err, "undecodable payload, dropping");
                        continue;
                    }
                };
                if let Err(err) = self.handle(message, transport, events) {
                    result = Err(err);
                }
            }
        }
        result
    }

    /// Run the per-loop actuator pass
    ///
    /// Changed values are queued for the next [`tick`](Self::tick) flush
    /// and surfaced as [`Event::ValueUpdated`].
    pub fn process<E: EventSink>(&mut self, events: &mut E) {
        if self.state == CommState::Disabled {
            return;
        }

        let updates = &mut self.updates;
        self.actuators.process(&mut self.assignments, |assignment| {
            updates.push(Update {
                assignment_id: assignment.id,
                value: assignment.value,
            });
            events.event(Event::ValueUpdated(assignment.clone()));
        });
    }

    /// Periodic callback, driven by the embedding timer
    ///
    /// Flushes queued updates as one `DataUpdate`, or sends an unsolicited
    /// sync after [`I_AM_ALIVE_PERIOD`] consecutive idle ticks so the
    /// master does not time the device out.
    pub fn tick<T: Transport>(&mut self, transport: &mut T) -> Result<()> {
        if self.state != CommState::Listening {
            return Ok(());
        }

        if self.updates.is_empty() {
            self.idle_ticks += 1;
            if self.idle_ticks >= I_AM_ALIVE_PERIOD {
                self.send(
                    transport,
                    &Message::ChainSync {
                        cycle: SyncCycle::Regular,
                    },
                )?;
            }
            return Ok(());
        }

        let mut queued = Vec::with_capacity(self.updates.len());
        while let Some(update) = self.updates.pop() {
            queued.push(update);
        }
        self.send(transport, &Message::DataUpdate(queued))
    }

    fn handle<T: Transport, E: EventSink>(
        &mut self,
        message: Message,
        transport: &mut T,
        events: &mut E,
    ) -> Result<()> {
        // a setup cycle resets the chain no matter what state we are in;
        // it must be checked before the per-state dispatch
        if let Message::ChainSync {
            cycle: SyncCycle::Setup,
        } = message
        {
            self.master_reset(events);
            return Ok(());
        }

        match self.state {
            CommState::WaitingSync => {
                if let Message::ChainSync {
                    cycle: SyncCycle::Handshake,
                } = message
                {
                    self.start_handshake(transport)?;
                }
            }
            CommState::WaitingHandshake => {
                if let Message::HandshakeReply(reply) = message {
                    self.finish_handshake(&reply, events);
                }
            }
            CommState::WaitingDescriptor => {
                if let Message::DevDescriptorRequest = message {
                    self.send_descriptor(transport)?;
                }
            }
            CommState::Listening => return self.serve(message, transport, events),
            // feed() drops everything first
            CommState::Disabled => {}
        }
        Ok(())
    }

    /// Handshake cycle open: broadcast our hello and wait for the reply
    fn start_handshake<T: Transport>(&mut self, transport: &mut T) -> Result<()> {
        self.nonce = self.rng.next_nonce();
        debug!(nonce = self.nonce, "handshake cycle, sending hello");

        let hello = Message::Handshake(Handshake {
            uri: self.uri,
            random_id: self.nonce,
            protocol: PROTOCOL_VERSION,
            firmware: self.firmware,
        });
        self.send(transport, &hello)?;
        self.state = CommState::WaitingHandshake;
        Ok(())
    }

    fn finish_handshake<E: EventSink>(&mut self, reply: &HandshakeReply, events: &mut E) {
        if reply.random_id != self.nonce {
            // another device's handshake cycle; keep waiting for ours
            trace!(nonce = reply.random_id, "handshake reply for another device");
            return;
        }

        // the address is adopted even on a non-OK status: the master may
        // need the link up to push a firmware update, and it owns retries
        self.address = reply.device_id;
        self.parser.set_local_address(reply.device_id);
        self.state = CommState::WaitingDescriptor;
        debug!(address = self.address, status = ?reply.status, "address adopted");

        if !reply.status.is_ok() {
            warn!(status = ?reply.status, "master reported handshake failure");
            events.event(Event::HandshakeFailed {
                status: reply.status,
            });
        }
    }

    fn send_descriptor<T: Transport>(&mut self, transport: &mut T) -> Result<()> {
        let descriptor = Message::DevDescriptor(DeviceDescriptor {
            label: self.label,
            actuators: self.actuators.descriptors(),
        });
        self.send(transport, &descriptor)?;

        // the master does not confirm reception; assume delivery
        self.state = CommState::Listening;
        debug!("descriptor sent, listening for requests");
        Ok(())
    }

    /// Request dispatch for the listening state
    fn serve<T: Transport, E: EventSink>(
        &mut self,
        message: Message,
        transport: &mut T,
        events: &mut E,
    ) -> Result<()> {
        match message {
            Message::ChainSync {
                cycle: SyncCycle::Regular,
            } => {
                events.event(Event::SyncWindow {
                    address: self.address,
                });
            }
            // other devices joining the chain
            Message::ChainSync { .. } => {}
            Message::Assignment(assignment) => {
                return self.create_assignment(assignment, transport, events);
            }
            Message::Unassignment { assignment_id } => {
                return self.remove_assignment(assignment_id, transport, events);
            }
            Message::DevControl { enable } => {
                if !enable {
                    self.state = CommState::Disabled;
                    warn!("device disabled by master");
                    events.event(Event::DeviceDisabled);
                }
            }
            other => {
                trace!(command = %other.command(), "unexpected request while listening");
            }
        }
        Ok(())
    }

    fn create_assignment<T: Transport, E: EventSink>(
        &mut self,
        assignment: Assignment,
        transport: &mut T,
        events: &mut E,
    ) -> Result<()> {
        // no ack on failure: acking an assignment we did not store would
        // desynchronize the master's bookkeeping
        if self.actuators.get(assignment.actuator_id).is_none() {
            return Err(Error::UnknownActuator {
                id: assignment.actuator_id,
            });
        }
        self.assignments.add(assignment.clone())?;
        self.actuators.bind(assignment.actuator_id, assignment.id)?;

        self.send(transport, &Message::AssignmentAck)?;
        events.event(Event::AssignmentCreated(assignment));
        Ok(())
    }

    fn remove_assignment<T: Transport, E: EventSink>(
        &mut self,
        assignment_id: u8,
        transport: &mut T,
        events: &mut E,
    ) -> Result<()> {
        if assignment_id == WILDCARD_ASSIGNMENT_ID {
            let freed: Vec<u8> = self.assignments.iter().map(|a| a.actuator_id).collect();
            self.assignments.clear();
            for actuator_id in freed {
                self.actuators.unbind(actuator_id);
                events.event(Event::AssignmentRemoved { actuator_id });
            }
        } else if let Some(actuator_id) = self.assignments.remove(assignment_id) {
            self.actuators.unbind(actuator_id);
            events.event(Event::AssignmentRemoved { actuator_id });
        }
        // an unknown id is still acked: the master is dropping state we
        // already lost, and the bus must keep moving
        self.send(transport, &Message::UnassignmentAck)
    }

    fn master_reset<E: EventSink>(&mut self, events: &mut E) {
        debug!("master reset, returning to sync state");
        self.updates.clear();
        self.assignments.clear();
        self.actuators.unbind_all();
        self.idle_ticks = 0;
        self.state = CommState::WaitingSync;
        events.event(Event::MasterReset);
    }

    fn send<T: Transport>(&mut self, transport: &mut T, message: &Message) -> Result<()> {
        trace!(command = %message.command(), address = self.address, "sending frame");
        let frame = encode_frame(self.address, message);
        transport.send(&frame)?;
        self.idle_ticks = 0;
        Ok(())
    }
}

/// Boot-time seed for the nonce generator, drawn from a v4 UUID
fn boot_seed() -> u64 {
    let uuid = Uuid::new_v4();
    let bytes = uuid.as_bytes();
    u64::from_le_bytes([
        bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
    ])
}
