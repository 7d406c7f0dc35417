//! Control Chain device runtime
//!
//! The registries, the update queue and the session state machine: the
//! mutable half of the crate. Everything here is owned by a [`Session`];
//! there are no process-wide singletons.

mod actuator;
mod assignment;
mod session;
mod update;

pub use actuator::{Actuator, ActuatorConfig, ActuatorKind, ActuatorRegistry, MAX_ACTUATORS};
pub use assignment::{AssignmentRegistry, MAX_ASSIGNMENTS, WILDCARD_ASSIGNMENT_ID};
pub use session::{
    CommState, Event, EventSink, I_AM_ALIVE_PERIOD, Session, SessionConfig, Transport,
};
pub use update::{MAX_UPDATES, UpdateQueue};
