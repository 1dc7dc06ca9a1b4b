use cadence_core::auto::RoutineId;
use cadence_core::config::Config;
use cadence_core::geometry::{wrap_angle, Pose, ReefFace};
use cadence_core::io_frames::{ActuatorFrame, DriveCommand, InputFrame};
use cadence_core::scheduler::Scheduler;
use cadence_core::types::{Alliance, BranchSide, RobotMode, SubsystemGroup};

const DT: f64 = 0.02;

/// First-order stand-in for the drivetrain, elevator, and ejector. Good
/// enough to close the loop: velocities integrate, the elevator slews, and
/// an eject-speed command with a piece aboard expels it.
struct Plant {
    pose: Pose,
    elevator: f64,
    piece_mm: f64,
    ejected: bool,
}

impl Plant {
    fn new() -> Self {
        Self {
            pose: Pose::new(0.0, 0.0, 0.0),
            elevator: 0.0,
            piece_mm: 10.0,
            ejected: false,
        }
    }

    fn turn_toward(&mut self, heading: f64) {
        let err = wrap_angle(heading - self.pose.heading);
        let step = err.abs().min(4.0 * DT);
        self.pose.heading = wrap_angle(self.pose.heading + step.copysign(err));
    }

    fn apply(&mut self, out: &ActuatorFrame) {
        if let Some(p) = out.pose_reset {
            self.pose = p;
        }
        match out.drive {
            Some(DriveCommand::FieldVelocity { vx, vy, omega }) => {
                self.pose.x += vx * DT;
                self.pose.y += vy * DT;
                self.pose.heading = wrap_angle(self.pose.heading + omega * DT);
            }
            Some(DriveCommand::FacingHeading { vx, vy, heading }) => {
                self.pose.x += vx * DT;
                self.pose.y += vy * DT;
                self.turn_toward(heading);
            }
            Some(DriveCommand::ToPose(target)) => {
                let dx = target.x - self.pose.x;
                let dy = target.y - self.pose.y;
                let dist = (dx * dx + dy * dy).sqrt();
                if dist > 1e-9 {
                    let step = dist.min(2.0 * DT);
                    self.pose.x += dx / dist * step;
                    self.pose.y += dy / dist * step;
                }
                self.turn_toward(target.heading);
            }
            Some(DriveCommand::Brake) | Some(DriveCommand::Stop) | None => {}
        }
        if let Some(target) = out.elevator_height_target {
            let err = target - self.elevator;
            let step = err.abs().min(1.5 * DT);
            self.elevator += step.copysign(err);
        }
        if let Some(speed) = out.ejector_speed {
            if speed >= 0.45 && self.piece_mm < 50.0 {
                self.ejected = true;
                self.piece_mm = 300.0;
            }
            if speed > 0.0 && speed < 0.45 && self.piece_mm > 50.0 {
                // Intake pulls a piece in after a short dwell.
                self.piece_mm -= 400.0 * DT;
            }
        }
    }

    fn frame(&self, now: f64, mode: RobotMode) -> InputFrame {
        InputFrame {
            now,
            mode,
            alliance: Some(Alliance::Blue),
            pose: Some(self.pose),
            piece_distance_mm: Some(self.piece_mm),
            elevator_height: Some(self.elevator),
            ..InputFrame::default()
        }
    }
}

#[test]
fn center_routine_scores_on_the_far_face() {
    let cfg = Config::default();
    let mut sched = Scheduler::new(cfg).unwrap();
    sched.arm_routine(RoutineId::Center);

    let mut plant = Plant::new();
    let mut out = ActuatorFrame::default();
    let mut now = 0.0;
    let mut routine_done_at = None;
    for _ in 0..1500 {
        let frame = plant.frame(now, RobotMode::Autonomous);
        sched.tick(&frame, &mut out);
        plant.apply(&out);
        now += DT;
        if routine_done_at.is_none()
            && sched.group_owner(SubsystemGroup::Drive) != Some("auto_center")
        {
            routine_done_at = Some(now);
        }
    }

    assert!(plant.ejected, "routine never ejected the game piece");
    let target = sched
        .field_map()
        .resolve(ReefFace::Far, BranchSide::Left, Alliance::Blue)
        .unwrap();
    assert!(
        plant.pose.translation_distance_to(target) < 0.1,
        "finished at {:?}, expected near {:?}",
        plant.pose,
        target
    );
    let done = routine_done_at.expect("routine never completed");
    assert!(done < 25.0);
}

#[test]
fn left_routine_reaches_far_left_on_red() {
    let cfg = Config::default();
    let mut sched = Scheduler::new(cfg).unwrap();
    sched.arm_routine(RoutineId::Left);

    let mut plant = Plant::new();
    let mut out = ActuatorFrame::default();
    let mut now = 0.0;
    for _ in 0..1500 {
        let mut frame = plant.frame(now, RobotMode::Autonomous);
        frame.alliance = Some(Alliance::Red);
        sched.tick(&frame, &mut out);
        plant.apply(&out);
        now += DT;
    }

    assert_eq!(sched.alliance(), Some(Alliance::Red));
    assert!(plant.ejected);
    let target = sched
        .field_map()
        .resolve(ReefFace::FarLeft, BranchSide::Left, Alliance::Red)
        .unwrap();
    assert!(plant.pose.translation_distance_to(target) < 0.1);
    // Red waypoints live on the far half of the field.
    assert!(target.x > sched.field_map().field_length() / 2.0);
}

#[test]
fn teleop_load_runs_until_piece_arrives_then_releases() {
    let cfg = Config::default();
    let mut sched = Scheduler::new(cfg).unwrap();

    let mut plant = Plant::new();
    plant.piece_mm = 300.0; // empty
    let mut out = ActuatorFrame::default();
    let mut now = 0.0;

    // Hold go + load-left until the intake reports a piece.
    let mut loaded_at = None;
    for _ in 0..500 {
        let mut frame = plant.frame(now, RobotMode::Teleop);
        frame.board = frame.board.with_left(13, true).with_right(7, true);
        sched.tick(&frame, &mut out);
        plant.apply(&out);
        now += DT;
        if plant.piece_mm < 50.0 {
            loaded_at = Some(now);
            break;
        }
    }
    assert!(loaded_at.is_some(), "intake never produced a piece");
    assert_eq!(sched.group_owner(SubsystemGroup::Ejector), Some("load"));

    // Releasing the switches hands the groups back to their defaults.
    let frame = plant.frame(now, RobotMode::Teleop);
    sched.tick(&frame, &mut out);
    assert_eq!(sched.group_owner(SubsystemGroup::Ejector), Some("ejector_hold"));
    assert_eq!(
        sched.group_owner(SubsystemGroup::Elevator),
        Some("elevator_stow")
    );
}

#[test]
fn disable_mid_routine_stops_commands() {
    let cfg = Config::default();
    let mut sched = Scheduler::new(cfg).unwrap();
    sched.arm_routine(RoutineId::Center);

    let mut plant = Plant::new();
    let mut out = ActuatorFrame::default();
    let mut now = 0.0;
    for _ in 0..100 {
        let frame = plant.frame(now, RobotMode::Autonomous);
        sched.tick(&frame, &mut out);
        plant.apply(&out);
        now += DT;
    }
    assert_eq!(sched.group_owner(SubsystemGroup::Drive), Some("auto_center"));

    let frame = plant.frame(now, RobotMode::Disabled);
    sched.tick(&frame, &mut out);
    assert!(sched.active_behaviors().is_empty());
    assert_eq!(out.drive, None);
    assert_eq!(out.elevator_height_target, None);
    assert_eq!(out.ejector_speed, None);
}
