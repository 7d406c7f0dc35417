//! Active assignment registry
//!
//! A fixed-capacity slot arena: slot occupancy is the `Option`, so freeing
//! a slot drops every field of the old assignment and nothing stale can
//! leak into the next occupant.

use tracing::debug;

use crate::protocol::{Assignment, Error, Result};

/// Assignment slots per device
pub const MAX_ASSIGNMENTS: usize = 4;

/// Unassignment id that clears the whole table
pub const WILDCARD_ASSIGNMENT_ID: u8 = 0xFF;

/// Bounded pool of active assignments
#[derive(Debug)]
pub struct AssignmentRegistry {
    slots: [Option<Assignment>; MAX_ASSIGNMENTS],
}

impl AssignmentRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
        }
    }

    /// Store an assignment in the first free slot
    ///
    /// The master should stay within the advertised limits; this defends
    /// against one that does not.
    pub fn add(&mut self, assignment: Assignment) -> Result<()> {
        let Some(slot) = self.slots.iter_mut().find(|slot| slot.is_none()) else {
            return Err(Error::RegistryFull {
                capacity: MAX_ASSIGNMENTS,
            });
        };

        debug!(
            id = assignment.id,
            actuator_id = assignment.actuator_id,
            mode = %assignment.mode,
            "assignment stored"
        );
        *slot = Some(assignment);
        Ok(())
    }

    /// Free the slot holding `id`, returning the actuator it was bound to
    pub fn remove(&mut self, id: u8) -> Option<u8> {
        for slot in &mut self.slots {
            if slot.as_ref().is_some_and(|a| a.id == id) {
                let assignment = slot.take();
                let actuator_id = assignment.map(|a| a.actuator_id);
                debug!(id, actuator_id, "assignment removed");
                return actuator_id;
            }
        }
        None
    }

    /// Free every slot (master reset or wildcard unassignment)
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
    }

    /// Look up by assignment id
    #[must_use]
    pub fn get(&self, id: u8) -> Option<&Assignment> {
        self.iter().find(|a| a.id == id)
    }

    /// Mutable lookup by assignment id
    pub fn get_mut(&mut self, id: u8) -> Option<&mut Assignment> {
        self.slots
            .iter_mut()
            .filter_map(Option::as_mut)
            .find(|a| a.id == id)
    }

    /// Look up the assignment bound to an actuator
    #[must_use]
    pub fn find_by_actuator(&self, actuator_id: u8) -> Option<&Assignment> {
        self.iter().find(|a| a.actuator_id == actuator_id)
    }

    /// Iterate over active assignments
    pub fn iter(&self) -> impl Iterator<Item = &Assignment> {
        self.slots.iter().filter_map(Option::as_ref)
    }

    /// Number of active assignments
    #[must_use]
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Check for an empty registry
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total slots
    #[must_use]
    pub const fn capacity(&self) -> usize {
        MAX_ASSIGNMENTS
    }
}

impl Default for AssignmentRegistry {
    fn default() -> Self {
        Self::new()
    }
}
