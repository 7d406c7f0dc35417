//! Control Chain slave device engine
//!
//! This library implements the slave side of the Control Chain protocol: a
//! polled, master-driven, addressed serial bus connecting small hardware
//! controllers (footswitch boards, expression pedals) to a central master.
//! It provides the byte-level framer/parser, the per-command message codec
//! and the session state machine driving the handshake/descriptor/
//! assignment/update lifecycle, plus the bounded registries behind it.
//!
//! # Quick Start
//!
//! ```rust
//! use ccslave::{ActuatorConfig, Event, Session, SessionConfig, Version};
//!
//! let config = SessionConfig::new("FootEx", "urn:mod:footex", Version::new(1, 0, 0))?;
//! let mut session = Session::new(config);
//! let foot = session.register_actuator(ActuatorConfig::footswitch("Foot #1")?)?;
//!
//! // transport glue: collect outbound frames
//! struct Uart(Vec<Vec<u8>>);
//! impl ccslave::Transport for Uart {
//!     fn send(&mut self, bytes: &[u8]) -> ccslave::Result<()> {
//!         self.0.push(bytes.to_vec());
//!         Ok(())
//!     }
//! }
//! let mut uart = Uart(Vec::new());
//! let mut on_event = |event: Event| println!("{event:?}");
//!
//! // main loop: pump received bytes, sample inputs, run the tick
//! session.feed(&[], &mut uart, &mut on_event)?;
//! session.set_actuator_value(foot, 1.0)?;
//! session.process(&mut on_event);
//! session.tick(&mut uart)?;
//! # Ok::<(), ccslave::Error>(())
//! ```
//!
//! # Design
//!
//! - **No process-wide state** — a [`Session`] owns its registries, so
//!   several devices can share one binary and tests stay deterministic.
//! - **Bounded everything** — registries and the update queue have small
//!   compile-time capacities and constant-time operations, safe to drive
//!   from interrupt-style contexts.
//! - **Length-authoritative decoding** — every decode path takes a bounded
//!   slice and returns a typed [`Error`] on short or trailing input;
//!   nothing received over the wire can panic the core.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod device;
pub mod protocol;
pub mod text;

pub use device::{
    Actuator, ActuatorConfig, ActuatorKind, CommState, Event, EventSink, Session, SessionConfig,
    Transport,
};
pub use protocol::{
    Assignment, Command, Error, Frame, FrameParser, HandshakeStatus, Message, Mode,
    PROTOCOL_VERSION, Result, Str16, SyncCycle, Update, Version,
};
