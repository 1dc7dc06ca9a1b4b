use crate::geometry::Pose;
use crate::io_frames::{ActuatorFrame, DriveCommand, Observations};
use crate::types::ElevatorSetpoint;

// ---------------------------------------------------------------------------
// Target references
// ---------------------------------------------------------------------------

/// Pose target for a drive-to-pose step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PoseTarget {
    /// Resolved once, at routine construction. `None` means the resolver
    /// could not produce a pose; the step fails closed (immediately
    /// complete, no motion).
    Fixed(Option<Pose>),
    /// Re-read from the operator-board selection every tick (teleop assist).
    Selected,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SetpointRef {
    Fixed(ElevatorSetpoint),
    /// Operator-board elevator selection, re-read every tick.
    Selected,
}

impl SetpointRef {
    fn resolve(self, obs: &Observations) -> ElevatorSetpoint {
        match self {
            SetpointRef::Fixed(sp) => sp,
            SetpointRef::Selected => obs.selected_setpoint,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HeadingRef {
    Fixed(f64),
    /// Host-maintained heading hold (drive straight).
    Correction,
    /// Face the alliance reef center from the current pose.
    TowardReef,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TranslationSource {
    Fixed { vx: f64, vy: f64 },
    Operator,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RotationSource {
    Heading(HeadingRef),
    Operator,
}

// ---------------------------------------------------------------------------
// StepPredicate
// ---------------------------------------------------------------------------

/// External completion conditions, evaluated strictly after the wrapped
/// step's update on the same tick.
#[derive(Debug, Clone, PartialEq)]
pub enum StepPredicate {
    HasGamePiece,
    ElevatorAt(SetpointRef),
    AtPose,
    Condition(String),
}

impl StepPredicate {
    pub fn evaluate(&self, obs: &Observations) -> bool {
        match self {
            StepPredicate::HasGamePiece => obs.has_game_piece,
            StepPredicate::ElevatorAt(sp) => obs.elevator_at(sp.resolve(obs)),
            StepPredicate::AtPose => obs.conditions.get(crate::condition::keys::AT_POSE),
            StepPredicate::Condition(name) => obs.conditions.get(name),
        }
    }
}

// ---------------------------------------------------------------------------
// Step
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
enum StepState {
    Pending,
    Active { since: f64 },
    Complete,
}

/// One unit of sequenced work: a start, a per-tick update, and a completion
/// check, composed through a closed set of combinators. Primitives that
/// hold an actuator (drive, elevator, ejector) never complete on their own;
/// they end through `Until`, `Timeout`, `Deadline`, or arbitration.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    kind: StepKind,
    state: StepState,
}

#[derive(Debug, Clone, PartialEq)]
enum StepKind {
    Wait { seconds: f64 },
    ResetPose { pose: Pose },
    Drive { translation: TranslationSource, rotation: RotationSource },
    DriveToPose { target: PoseTarget, timeout_s: f64 },
    Brake,
    StopDrive,
    ElevatorTo { setpoint: SetpointRef },
    EjectorRun { speed: f64 },
    StopEjector,
    Sequence { children: Vec<Step>, index: usize },
    Parallel { children: Vec<Step> },
    Deadline { primary: Box<Step>, riders: Vec<Step> },
    Timeout { inner: Box<Step>, seconds: f64 },
    Until { inner: Box<Step>, predicate: StepPredicate },
}

impl Step {
    fn new(kind: StepKind) -> Self {
        Self {
            kind,
            state: StepState::Pending,
        }
    }

    // -- constructors -------------------------------------------------------

    pub fn wait(seconds: f64) -> Self {
        Self::new(StepKind::Wait { seconds })
    }

    pub fn reset_pose(pose: Pose) -> Self {
        Self::new(StepKind::ResetPose { pose })
    }

    pub fn drive(translation: TranslationSource, rotation: RotationSource) -> Self {
        Self::new(StepKind::Drive { translation, rotation })
    }

    pub fn drive_to_pose(target: PoseTarget, timeout_s: f64) -> Self {
        Self::new(StepKind::DriveToPose { target, timeout_s })
    }

    pub fn brake() -> Self {
        Self::new(StepKind::Brake)
    }

    pub fn stop_drive() -> Self {
        Self::new(StepKind::StopDrive)
    }

    pub fn elevator_to(setpoint: SetpointRef) -> Self {
        Self::new(StepKind::ElevatorTo { setpoint })
    }

    pub fn ejector_run(speed: f64) -> Self {
        Self::new(StepKind::EjectorRun { speed })
    }

    pub fn stop_ejector() -> Self {
        Self::new(StepKind::StopEjector)
    }

    pub fn sequence(children: Vec<Step>) -> Self {
        Self::new(StepKind::Sequence { children, index: 0 })
    }

    pub fn parallel(children: Vec<Step>) -> Self {
        Self::new(StepKind::Parallel { children })
    }

    pub fn deadline(primary: Step, riders: Vec<Step>) -> Self {
        Self::new(StepKind::Deadline {
            primary: Box::new(primary),
            riders,
        })
    }

    pub fn with_timeout(self, seconds: f64) -> Self {
        Self::new(StepKind::Timeout {
            inner: Box::new(self),
            seconds,
        })
    }

    pub fn until(self, predicate: StepPredicate) -> Self {
        Self::new(StepKind::Until {
            inner: Box::new(self),
            predicate,
        })
    }

    // -- lifecycle ----------------------------------------------------------

    pub fn start(&mut self, now: f64) {
        if self.state != StepState::Pending {
            return;
        }
        self.state = StepState::Active { since: now };
        match &mut self.kind {
            StepKind::Sequence { children, index } => {
                *index = 0;
                match children.first_mut() {
                    Some(child) => child.start(now),
                    None => self.state = StepState::Complete,
                }
            }
            StepKind::Parallel { children } => {
                if children.is_empty() {
                    self.state = StepState::Complete;
                } else {
                    for child in children {
                        child.start(now);
                    }
                }
            }
            StepKind::Deadline { primary, riders } => {
                primary.start(now);
                for rider in riders {
                    rider.start(now);
                }
            }
            StepKind::Timeout { inner, .. } => inner.start(now),
            StepKind::Until { inner, .. } => inner.start(now),
            _ => {}
        }
    }

    /// Run the side-effecting update, then the completion check, in that
    /// order on the same tick.
    pub fn update(&mut self, obs: &Observations, out: &mut ActuatorFrame) {
        let since = match self.state {
            StepState::Active { since } => since,
            _ => return,
        };
        let mut complete = false;
        match &mut self.kind {
            StepKind::Wait { seconds } => {
                complete = obs.now - since >= *seconds;
            }
            StepKind::ResetPose { pose } => {
                out.pose_reset = Some(*pose);
                complete = true;
            }
            StepKind::Drive { translation, rotation } => {
                let (vx, vy) = match translation {
                    TranslationSource::Fixed { vx, vy } => (*vx, *vy),
                    TranslationSource::Operator => (obs.driver.vx, obs.driver.vy),
                };
                out.drive = Some(match rotation {
                    RotationSource::Operator => DriveCommand::FieldVelocity {
                        vx,
                        vy,
                        omega: obs.driver.omega,
                    },
                    RotationSource::Heading(href) => {
                        let heading = match href {
                            HeadingRef::Fixed(h) => *h,
                            HeadingRef::Correction => obs.heading_correction,
                            HeadingRef::TowardReef => {
                                obs.reef_heading.unwrap_or(obs.heading_correction)
                            }
                        };
                        DriveCommand::FacingHeading { vx, vy, heading }
                    }
                });
            }
            StepKind::DriveToPose { target, timeout_s } => {
                let resolved = match target {
                    PoseTarget::Fixed(p) => *p,
                    PoseTarget::Selected => obs.selected_waypoint,
                };
                match resolved {
                    None => {
                        // Fail closed: no target means no motion and no
                        // hanging routine.
                        if matches!(target, PoseTarget::Fixed(None)) {
                            complete = true;
                        }
                    }
                    Some(pose) => {
                        out.drive = Some(DriveCommand::ToPose(pose));
                        complete = obs.pose_within(pose);
                    }
                }
                if obs.now - since >= *timeout_s {
                    complete = true;
                }
            }
            StepKind::Brake => {
                out.drive = Some(DriveCommand::Brake);
            }
            StepKind::StopDrive => {
                out.drive = Some(DriveCommand::Stop);
            }
            StepKind::ElevatorTo { setpoint } => {
                let sp = setpoint.resolve(obs);
                out.elevator_height_target = Some(obs.heights.height_for(sp));
            }
            StepKind::EjectorRun { speed } => {
                out.ejector_speed = Some(*speed);
            }
            StepKind::StopEjector => {
                out.ejector_speed = Some(0.0);
            }
            StepKind::Sequence { children, index } => {
                if let Some(child) = children.get_mut(*index) {
                    child.update(obs, out);
                    if child.is_complete() {
                        *index += 1;
                        match children.get_mut(*index) {
                            // The next child starts now; its first update
                            // runs next tick.
                            Some(next) => next.start(obs.now),
                            None => complete = true,
                        }
                    }
                } else {
                    complete = true;
                }
            }
            StepKind::Parallel { children } => {
                for child in children.iter_mut() {
                    child.update(obs, out);
                }
                complete = children.iter().all(|c| c.is_complete());
            }
            StepKind::Deadline { primary, riders } => {
                primary.update(obs, out);
                if primary.is_complete() {
                    // Riders are force-ended on the same tick the primary
                    // completes, whatever their own predicates say.
                    for rider in riders.iter_mut() {
                        rider.end();
                    }
                    complete = true;
                } else {
                    for rider in riders.iter_mut() {
                        rider.update(obs, out);
                    }
                }
            }
            StepKind::Timeout { inner, seconds } => {
                // The timeout is the outermost guard: it overrides the
                // wrapped completion logic entirely.
                if obs.now - since >= *seconds {
                    inner.end();
                    complete = true;
                } else {
                    inner.update(obs, out);
                    complete = inner.is_complete();
                }
            }
            StepKind::Until { inner, predicate } => {
                inner.update(obs, out);
                if inner.is_complete() || predicate.evaluate(obs) {
                    inner.end();
                    complete = true;
                }
            }
        }
        if complete {
            self.state = StepState::Complete;
        }
    }

    pub fn is_complete(&self) -> bool {
        self.state == StepState::Complete
    }

    /// Replace every `Selected` reference in the graph with the selection
    /// in force right now. Called once at behavior activation, so a running
    /// instance keeps its target even if the operator changes the board
    /// mid-run.
    pub fn bind_selection(&mut self, setpoint: ElevatorSetpoint, waypoint: Option<Pose>) {
        match &mut self.kind {
            StepKind::ElevatorTo { setpoint: sp } => {
                if *sp == SetpointRef::Selected {
                    *sp = SetpointRef::Fixed(setpoint);
                }
            }
            StepKind::DriveToPose { target, .. } => {
                if *target == PoseTarget::Selected {
                    *target = PoseTarget::Fixed(waypoint);
                }
            }
            StepKind::Sequence { children, .. } | StepKind::Parallel { children } => {
                for child in children {
                    child.bind_selection(setpoint, waypoint);
                }
            }
            StepKind::Deadline { primary, riders } => {
                primary.bind_selection(setpoint, waypoint);
                for rider in riders {
                    rider.bind_selection(setpoint, waypoint);
                }
            }
            StepKind::Timeout { inner, .. } => inner.bind_selection(setpoint, waypoint),
            StepKind::Until { inner, predicate } => {
                inner.bind_selection(setpoint, waypoint);
                if let StepPredicate::ElevatorAt(r) = predicate {
                    if *r == SetpointRef::Selected {
                        *predicate = StepPredicate::ElevatorAt(SetpointRef::Fixed(setpoint));
                    }
                }
            }
            _ => {}
        }
    }

    /// Cancel, idempotently, from any state. Children are ended first so a
    /// whole graph reports ended on the tick it is cancelled.
    pub fn end(&mut self) {
        match &mut self.kind {
            StepKind::Sequence { children, .. } | StepKind::Parallel { children } => {
                for child in children {
                    child.end();
                }
            }
            StepKind::Deadline { primary, riders } => {
                primary.end();
                for rider in riders {
                    rider.end();
                }
            }
            StepKind::Timeout { inner, .. } | StepKind::Until { inner, .. } => inner.end(),
            _ => {}
        }
        self.state = StepState::Complete;
    }

    // -- telemetry ----------------------------------------------------------

    fn name(&self) -> &'static str {
        match &self.kind {
            StepKind::Wait { .. } => "wait",
            StepKind::ResetPose { .. } => "reset_pose",
            StepKind::Drive { .. } => "drive",
            StepKind::DriveToPose { .. } => "drive_to_pose",
            StepKind::Brake => "brake",
            StepKind::StopDrive => "stop_drive",
            StepKind::ElevatorTo { .. } => "elevator_to",
            StepKind::EjectorRun { .. } => "ejector_run",
            StepKind::StopEjector => "stop_ejector",
            StepKind::Sequence { .. } => "sequence",
            StepKind::Parallel { .. } => "parallel",
            StepKind::Deadline { .. } => "deadline",
            StepKind::Timeout { .. } => "timeout",
            StepKind::Until { .. } => "until",
        }
    }

    /// Identifier of the currently active step chain, for telemetry.
    pub fn active_path(&self) -> Option<String> {
        if !matches!(self.state, StepState::Active { .. }) {
            return None;
        }
        let path = match &self.kind {
            StepKind::Sequence { children, index } => match children.get(*index) {
                Some(child) => match child.active_path() {
                    Some(p) => format!("sequence[{index}]/{p}"),
                    None => format!("sequence[{index}]"),
                },
                None => "sequence".to_string(),
            },
            StepKind::Deadline { primary, .. } => match primary.active_path() {
                Some(p) => format!("deadline/{p}"),
                None => "deadline".to_string(),
            },
            StepKind::Timeout { inner, .. } => match inner.active_path() {
                Some(p) => format!("timeout/{p}"),
                None => "timeout".to_string(),
            },
            StepKind::Until { inner, .. } => match inner.active_path() {
                Some(p) => format!("until/{p}"),
                None => "until".to_string(),
            },
            _ => self.name().to_string(),
        };
        Some(path)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::ConditionSet;
    use crate::config::ElevatorHeights;
    use crate::io_frames::DriverAxes;

    fn obs(conds: &ConditionSet, now: f64) -> Observations<'_> {
        Observations {
            now,
            has_game_piece: false,
            elevator_height: Some(0.0),
            pose: Some(Pose::new(0.0, 0.0, 0.0)),
            driver: DriverAxes::default(),
            heading_correction: 0.0,
            reef_heading: None,
            selected_waypoint: None,
            selected_setpoint: ElevatorSetpoint::Stow,
            heights: ElevatorHeights::default(),
            elevator_tolerance: 0.05,
            pose_xy_tolerance: 0.03,
            pose_heading_tolerance: 0.05,
            conditions: conds,
        }
    }

    fn run_ticks(step: &mut Step, conds: &ConditionSet, from: f64, ticks: usize) -> f64 {
        let mut now = from;
        for _ in 0..ticks {
            let mut out = ActuatorFrame::default();
            step.update(&obs(conds, now), &mut out);
            if step.is_complete() {
                return now;
            }
            now += 0.02;
        }
        now
    }

    #[test]
    fn wait_completes_after_duration() {
        let conds = ConditionSet::new();
        let mut step = Step::wait(0.1);
        step.start(0.0);
        let done_at = run_ticks(&mut step, &conds, 0.0, 100);
        assert!(step.is_complete());
        assert!((done_at - 0.1).abs() < 0.021);
    }

    #[test]
    fn timeout_dominates_inner_completion() {
        let conds = ConditionSet::new();
        // Brake never completes on its own.
        let mut step = Step::brake().with_timeout(0.1);
        step.start(0.0);
        let done_at = run_ticks(&mut step, &conds, 0.0, 100);
        assert!(step.is_complete());
        assert!(done_at <= 0.1 + 1e-9);
    }

    #[test]
    fn sequence_advances_on_completion() {
        let conds = ConditionSet::new();
        let mut step = Step::sequence(vec![Step::wait(0.04), Step::wait(0.04)]);
        step.start(0.0);
        assert_eq!(step.active_path().unwrap(), "sequence[0]/wait");
        run_ticks(&mut step, &conds, 0.0, 3);
        assert!(!step.is_complete());
        run_ticks(&mut step, &conds, 0.06, 100);
        assert!(step.is_complete());
    }

    #[test]
    fn empty_sequence_completes_on_start() {
        let mut step = Step::sequence(vec![]);
        step.start(0.0);
        assert!(step.is_complete());
    }

    #[test]
    fn parallel_joins_all() {
        let conds = ConditionSet::new();
        let mut step = Step::parallel(vec![Step::wait(0.02), Step::wait(0.08)]);
        step.start(0.0);
        run_ticks(&mut step, &conds, 0.0, 2);
        assert!(!step.is_complete());
        run_ticks(&mut step, &conds, 0.04, 100);
        assert!(step.is_complete());
    }

    #[test]
    fn deadline_ends_riders_on_primary_completion() {
        let conds = ConditionSet::new();
        let mut step = Step::deadline(Step::wait(0.04), vec![Step::brake(), Step::wait(10.0)]);
        step.start(0.0);
        // Tick 1 at t=0.0, tick 2 at t=0.02, tick 3 at t=0.04: primary done.
        run_ticks(&mut step, &conds, 0.0, 100);
        assert!(step.is_complete());
        // Riders were force-ended on the same tick.
        match &step.kind {
            StepKind::Deadline { riders, .. } => {
                assert!(riders.iter().all(|r| r.is_complete()));
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn unresolved_pose_target_fails_closed() {
        let conds = ConditionSet::new();
        let mut step = Step::drive_to_pose(PoseTarget::Fixed(None), 4.0);
        step.start(0.0);
        let mut out = ActuatorFrame::default();
        step.update(&obs(&conds, 0.0), &mut out);
        assert!(step.is_complete());
        assert_eq!(out.drive, None);
    }

    #[test]
    fn drive_to_pose_completes_within_tolerance() {
        let conds = ConditionSet::new();
        let target = Pose::new(0.01, 0.0, 0.0);
        let mut step = Step::drive_to_pose(PoseTarget::Fixed(Some(target)), 4.0);
        step.start(0.0);
        let mut out = ActuatorFrame::default();
        step.update(&obs(&conds, 0.0), &mut out);
        // Pose (0,0,0) is within the 3 cm / 0.05 rad tolerance.
        assert!(step.is_complete());
        assert_eq!(out.drive, Some(DriveCommand::ToPose(target)));
    }

    #[test]
    fn drive_to_pose_times_out() {
        let conds = ConditionSet::new();
        let target = Pose::new(5.0, 5.0, 1.0);
        let mut step = Step::drive_to_pose(PoseTarget::Fixed(Some(target)), 0.1);
        step.start(0.0);
        let done_at = run_ticks(&mut step, &conds, 0.0, 100);
        assert!(step.is_complete());
        assert!(done_at <= 0.12);
    }

    #[test]
    fn until_checks_after_update() {
        let mut conds = ConditionSet::new();
        let mut step = Step::ejector_run(0.35).until(StepPredicate::HasGamePiece);
        step.start(0.0);

        let mut out = ActuatorFrame::default();
        step.update(&obs(&conds, 0.0), &mut out);
        assert!(!step.is_complete());
        assert_eq!(out.ejector_speed, Some(0.35));

        conds.set("x", true); // unrelated
        let mut o = obs(&conds, 0.02);
        o.has_game_piece = true;
        let mut out = ActuatorFrame::default();
        step.update(&o, &mut out);
        // The update still ran this tick before the predicate ended it.
        assert_eq!(out.ejector_speed, Some(0.35));
        assert!(step.is_complete());
    }

    #[test]
    fn bind_selection_freezes_selected_references() {
        let conds = ConditionSet::new();
        let mut step = Step::sequence(vec![
            Step::elevator_to(SetpointRef::Selected)
                .until(StepPredicate::ElevatorAt(SetpointRef::Selected)),
            Step::drive_to_pose(PoseTarget::Selected, 4.0),
        ]);
        let pose = Pose::new(3.0, 3.0, 0.0);
        step.bind_selection(ElevatorSetpoint::L2, Some(pose));
        step.start(0.0);

        // A later board change to L4 in the observations has no effect:
        // the bound graph commands the L2 height.
        let mut o = obs(&conds, 0.0);
        o.selected_setpoint = ElevatorSetpoint::L4;
        let mut out = ActuatorFrame::default();
        step.update(&o, &mut out);
        assert_eq!(
            out.elevator_height_target,
            Some(o.heights.height_for(ElevatorSetpoint::L2))
        );
    }

    #[test]
    fn end_is_idempotent_from_any_state() {
        let mut step = Step::sequence(vec![Step::wait(1.0), Step::brake()]);
        step.end();
        assert!(step.is_complete());
        step.end();
        assert!(step.is_complete());

        let mut started = Step::wait(1.0);
        started.start(0.0);
        started.end();
        started.end();
        assert!(started.is_complete());
    }

    #[test]
    fn update_before_start_is_noop() {
        let conds = ConditionSet::new();
        let mut step = Step::ejector_run(0.5);
        let mut out = ActuatorFrame::default();
        step.update(&obs(&conds, 0.0), &mut out);
        assert_eq!(out.ejector_speed, None);
        assert!(!step.is_complete());
    }
}
