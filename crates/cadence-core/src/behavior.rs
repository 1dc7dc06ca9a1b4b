use crate::config::Config;
use crate::step::{SetpointRef, Step, StepPredicate};
use crate::types::{ElevatorSetpoint, SubsystemGroup};

/// A named, claimable unit of work: a step graph plus the subsystem groups
/// it owns while running. Behaviors registered with the binding table are
/// templates; activation clones the template so the same binding can run
/// again later from a fresh pending state.
#[derive(Debug, Clone)]
pub struct Behavior {
    pub name: String,
    groups: Vec<SubsystemGroup>,
    pub interruptible: bool,
    pub root: Step,
}

impl Behavior {
    pub fn new(name: impl Into<String>, groups: &[SubsystemGroup], root: Step) -> Self {
        Self {
            name: name.into(),
            groups: groups.to_vec(),
            interruptible: true,
            root,
        }
    }

    /// A running instance refuses to be preempted; incoming requests for
    /// its groups are rejected instead.
    pub fn non_interruptible(mut self) -> Self {
        self.interruptible = false;
        self
    }

    pub fn groups(&self) -> &[SubsystemGroup] {
        &self.groups
    }

    pub fn claims(&self, group: SubsystemGroup) -> bool {
        self.groups.contains(&group)
    }

    pub fn conflicts_with(&self, other: &Behavior) -> bool {
        self.groups.iter().any(|g| other.claims(*g))
    }
}

// ---------------------------------------------------------------------------
// Composite builders
// ---------------------------------------------------------------------------

/// Hold the elevator at load height and run the ejector inward until a game
/// piece trips the sensor.
pub fn load_game_piece(cfg: &Config) -> Step {
    Step::parallel(vec![
        Step::elevator_to(SetpointRef::Fixed(ElevatorSetpoint::Load)),
        Step::ejector_run(cfg.ejector.intake_speed),
    ])
    .until(StepPredicate::HasGamePiece)
}

/// Back a mis-seated piece out while holding load height. Runs until
/// cancelled or wrapped in a timeout.
pub fn reverse_at_load_height(cfg: &Config) -> Step {
    Step::parallel(vec![
        Step::elevator_to(SetpointRef::Fixed(ElevatorSetpoint::Load)),
        Step::ejector_run(-cfg.ejector.intake_speed),
    ])
}

/// Raise to the setpoint, then eject for the configured duration while the
/// elevator holds.
pub fn score_game_piece(cfg: &Config, setpoint: SetpointRef) -> Step {
    Step::sequence(vec![
        Step::elevator_to(setpoint).until(StepPredicate::ElevatorAt(setpoint)),
        Step::deadline(
            Step::ejector_run(cfg.ejector.eject_speed).with_timeout(cfg.ejector.eject_duration_s),
            vec![Step::elevator_to(setpoint)],
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_claims() {
        let b = Behavior::new(
            "score",
            &[SubsystemGroup::Elevator, SubsystemGroup::Ejector],
            Step::brake(),
        );
        assert!(b.claims(SubsystemGroup::Elevator));
        assert!(!b.claims(SubsystemGroup::Drive));
        assert!(b.interruptible);

        let locked = b.clone().non_interruptible();
        assert!(!locked.interruptible);
        assert!(locked.conflicts_with(&b));
    }

    #[test]
    fn disjoint_groups_do_not_conflict() {
        let drive = Behavior::new("drive", &[SubsystemGroup::Drive], Step::brake());
        let lift = Behavior::new("lift", &[SubsystemGroup::Elevator], Step::brake());
        assert!(!drive.conflicts_with(&lift));
    }
}
