//! Physical actuator registry
//!
//! Actuators are registered once at boot, in order; the registration index
//! is the id the master uses. The application owns the live sample (it
//! writes through [`ActuatorRegistry::set_value`]); the per-loop
//! [`process`](ActuatorRegistry::process) pass turns samples into
//! assignment-value changes.

use tracing::debug;

use super::assignment::AssignmentRegistry;
use crate::protocol::{ActuatorDescriptor, Assignment, Error, Mode, Result, Str16};

/// Actuators per device
pub const MAX_ACTUATORS: usize = 4;

/// Kind of physical control point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActuatorKind {
    /// Continuous input, e.g. an expression pedal
    Continuous,
    /// Stepped input, e.g. a detented encoder
    Discrete,
    /// Latching switch
    Switch,
    /// Momentary switch, e.g. a footswitch
    Momentary,
}

/// Static configuration of one actuator
#[derive(Debug, Clone)]
pub struct ActuatorConfig {
    /// Name shown by the master
    pub name: Str16,
    /// Physical kind
    pub kind: ActuatorKind,
    /// Sample range minimum
    pub min: f32,
    /// Sample range maximum
    pub max: f32,
    /// Modes the actuator supports
    pub supported_modes: Mode,
    /// Assignments it accepts (this firmware always advertises 1)
    pub max_assignments: u8,
}

impl ActuatorConfig {
    /// Convenience configuration for a momentary footswitch
    pub fn footswitch(name: &str) -> Result<Self> {
        Ok(Self {
            name: Str16::new(name)?,
            kind: ActuatorKind::Momentary,
            min: 0.0,
            max: 1.0,
            supported_modes: Mode::new().with(Mode::TOGGLE).with(Mode::TRIGGER),
            max_assignments: 1,
        })
    }
}

/// One registered actuator and its runtime state
#[derive(Debug)]
pub struct Actuator {
    id: u8,
    config: ActuatorConfig,
    value: f32,
    locked: bool,
    assignment: Option<u8>,
}

impl Actuator {
    /// Actuator id (registration index)
    #[must_use]
    pub const fn id(&self) -> u8 {
        self.id
    }

    /// Actuator name
    #[must_use]
    pub const fn name(&self) -> &Str16 {
        &self.config.name
    }

    /// Physical kind
    #[must_use]
    pub const fn kind(&self) -> ActuatorKind {
        self.config.kind
    }

    /// Latest sample written by the application
    #[must_use]
    pub const fn value(&self) -> f32 {
        self.value
    }

    /// Id of the bound assignment, if any
    #[must_use]
    pub const fn assignment(&self) -> Option<u8> {
        self.assignment
    }

    /// Wire descriptor for this actuator
    #[must_use]
    pub fn descriptor(&self) -> ActuatorDescriptor {
        ActuatorDescriptor {
            name: self.config.name,
            supported_modes: self.config.supported_modes,
            max_assignments: self.config.max_assignments,
        }
    }
}

/// Per-mode transformation from actuator sample to assignment value
///
/// Selected in exactly one place so a new mode touches only this enum, not
/// every call site.
#[derive(Debug, Clone, Copy)]
enum ModeBehavior {
    /// Press edge flips (toggle) or fires (trigger); release is silent
    Edge,
    /// Core leaves the value alone; the application drives it through
    /// [`Session::set_assignment_value`](super::Session::set_assignment_value)
    PassThrough,
}

impl ModeBehavior {
    fn for_mode(mode: Mode) -> Self {
        if mode.is_edge_triggered() {
            Self::Edge
        } else {
            Self::PassThrough
        }
    }

    /// Apply one sample; returns whether the assignment value changed
    fn apply(self, sample: f32, locked: &mut bool, assignment: &mut Assignment) -> bool {
        match self {
            Self::Edge => {
                if sample > 0.0 {
                    if !*locked {
                        *locked = true;
                        if assignment.mode.is_toggle() {
                            assignment.value = 1.0 - assignment.value;
                        } else {
                            assignment.value = 1.0;
                        }
                        return true;
                    }
                } else {
                    // release edge: unlock only, intentionally no traffic
                    *locked = false;
                }
                false
            }
            Self::PassThrough => false,
        }
    }
}

/// Bounded table of registered actuators
#[derive(Debug, Default)]
pub struct ActuatorRegistry {
    actuators: Vec<Actuator>,
}

impl ActuatorRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            actuators: Vec::with_capacity(MAX_ACTUATORS),
        }
    }

    /// Register an actuator; id is the registration index
    pub fn register(&mut self, config: ActuatorConfig) -> Result<u8> {
        if self.actuators.len() >= MAX_ACTUATORS {
            return Err(Error::ActuatorLimit {
                capacity: MAX_ACTUATORS,
            });
        }

        let id = self.actuators.len() as u8;
        debug!(id, name = %config.name, "actuator registered");
        self.actuators.push(Actuator {
            id,
            config,
            value: 0.0,
            locked: false,
            assignment: None,
        });
        Ok(id)
    }

    /// Look up an actuator
    #[must_use]
    pub fn get(&self, id: u8) -> Option<&Actuator> {
        self.actuators.iter().find(|a| a.id == id)
    }

    /// Write the live sample for an actuator
    pub fn set_value(&mut self, id: u8, value: f32) -> Result<()> {
        let actuator = self.get_mut(id)?;
        actuator.value = value;
        Ok(())
    }

    /// Point an actuator at an assignment
    pub fn bind(&mut self, id: u8, assignment_id: u8) -> Result<()> {
        let actuator = self.get_mut(id)?;
        actuator.assignment = Some(assignment_id);
        actuator.locked = false;
        Ok(())
    }

    /// Clear an actuator's assignment back-reference
    pub fn unbind(&mut self, id: u8) {
        if let Some(actuator) = self.actuators.iter_mut().find(|a| a.id == id) {
            actuator.assignment = None;
            actuator.locked = false;
        }
    }

    /// Clear every back-reference (master reset)
    pub fn unbind_all(&mut self) {
        for actuator in &mut self.actuators {
            actuator.assignment = None;
            actuator.locked = false;
        }
    }

    /// Wire descriptors in registration order
    #[must_use]
    pub fn descriptors(&self) -> Vec<ActuatorDescriptor> {
        self.actuators.iter().map(Actuator::descriptor).collect()
    }

    /// Number of registered actuators
    #[must_use]
    pub fn len(&self) -> usize {
        self.actuators.len()
    }

    /// Check for an empty registry
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actuators.is_empty()
    }

    /// Run the per-loop transformation pass
    ///
    /// For every actuator with a bound assignment, applies the mode
    /// behavior and invokes `on_change` with the assignment whose value
    /// changed. This is the hot path; one call per main-loop iteration.
    pub fn process(
        &mut self,
        assignments: &mut AssignmentRegistry,
        mut on_change: impl FnMut(&Assignment),
    ) {
        for actuator in &mut self.actuators {
            let Some(assignment_id) = actuator.assignment else {
                continue;
            };
            let Some(assignment) = assignments.get_mut(assignment_id) else {
                continue;
            };

            let behavior = ModeBehavior::for_mode(assignment.mode);
            if behavior.apply(actuator.value, &mut actuator.locked, assignment) {
                on_change(assignment);
            }
        }
    }

    fn get_mut(&mut self, id: u8) -> Result<&mut Actuator> {
        self.actuators
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(Error::UnknownActuator { id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Assignment;

    fn toggle_assignment(id: u8, actuator_id: u8) -> Assignment {
        Assignment {
            id,
            actuator_id,
            label: Str16::new("Bypass").unwrap(),
            value: 0.0,
            min: 0.0,
            max: 1.0,
            def: 0.0,
            mode: Mode::new().with(Mode::TOGGLE),
            steps: 2,
            unit: Str16::default(),
        }
    }

    fn bound_pair() -> (ActuatorRegistry, AssignmentRegistry) {
        let mut actuators = ActuatorRegistry::new();
        let id = actuators
            .register(ActuatorConfig::footswitch("Foot #1").unwrap())
            .unwrap();

        let mut assignments = AssignmentRegistry::new();
        assignments.add(toggle_assignment(1, id)).unwrap();
        actuators.bind(id, 1).unwrap();

        (actuators, assignments)
    }

    #[test]
    fn test_register_assigns_sequential_ids() {
        let mut registry = ActuatorRegistry::new();
        for expected in 0..MAX_ACTUATORS as u8 {
            let id = registry
                .register(ActuatorConfig::footswitch("Foot").unwrap())
                .unwrap();
            assert_eq!(id, expected);
        }

        let overflow = registry.register(ActuatorConfig::footswitch("Foot").unwrap());
        assert!(matches!(overflow, Err(Error::ActuatorLimit { capacity: 4 })));
    }

    #[test]
    fn test_toggle_edge_sequence() {
        // rising edges at indices 1 and 4 are the only reports
        let (mut actuators, mut assignments) = bound_pair();

        let samples = [0.0, 1.0, 1.0, 0.0, 1.0];
        let mut reports = Vec::new();

        for (index, sample) in samples.into_iter().enumerate() {
            actuators.set_value(0, sample).unwrap();
            actuators.process(&mut assignments, |a| reports.push((index, a.value)));
        }

        assert_eq!(reports, vec![(1, 1.0), (4, 0.0)]);
    }

    #[test]
    fn test_trigger_mode_rearms_only_after_release() {
        let (mut actuators, mut assignments) = bound_pair();
        assignments.get_mut(1).unwrap().mode = Mode::new().with(Mode::TRIGGER);

        let mut count = 0;
        for sample in [1.0, 1.0, 0.0, 1.0] {
            actuators.set_value(0, sample).unwrap();
            actuators.process(&mut assignments, |a| {
                assert_eq!(a.value, 1.0);
                count += 1;
            });
        }
        assert_eq!(count, 2);
    }

    #[test]
    fn release_edge_is_silent() {
        // releasing the switch unlocks but never generates traffic
        let (mut actuators, mut assignments) = bound_pair();

        actuators.set_value(0, 1.0).unwrap();
        let mut presses = 0;
        actuators.process(&mut assignments, |_| presses += 1);
        assert_eq!(presses, 1);

        actuators.set_value(0, 0.0).unwrap();
        actuators.process(&mut assignments, |_| panic!("release must be silent"));
        assert_eq!(assignments.get(1).unwrap().value, 1.0);
    }

    #[test]
    fn test_pass_through_mode_generates_nothing() {
        let (mut actuators, mut assignments) = bound_pair();
        assignments.get_mut(1).unwrap().mode = Mode::new().with(Mode::OPTIONS);

        actuators.set_value(0, 1.0).unwrap();
        actuators.process(&mut assignments, |_| panic!("pass-through must not report"));
    }

    #[test]
    fn test_unbound_actuator_skipped() {
        let mut actuators = ActuatorRegistry::new();
        actuators
            .register(ActuatorConfig::footswitch("Foot #1").unwrap())
            .unwrap();
        let mut assignments = AssignmentRegistry::new();

        actuators.set_value(0, 1.0).unwrap();
        actuators.process(&mut assignments, |_| panic!("nothing is bound"));
    }

    #[test]
    fn test_unbind_unlocks() {
        let (mut actuators, mut assignments) = bound_pair();

        actuators.set_value(0, 1.0).unwrap();
        actuators.process(&mut assignments, |_| {});

        actuators.unbind(0);
        actuators.bind(0, 1).unwrap();

        // rebinding reset the lock, so the still-held press reads as a
        // fresh edge and toggles back to 0
        actuators.process(&mut assignments, |a| assert_eq!(a.value, 0.0));
    }
}
