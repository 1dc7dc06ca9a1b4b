use cadence_core::geometry::{wrap_angle, Pose};
use cadence_core::io_frames::{ActuatorFrame, DriveCommand, InputFrame};
use cadence_core::types::{Alliance, RobotMode};

const MAX_SPEED: f64 = 2.0;
const MAX_TURN_RATE: f64 = 4.0;
const ELEVATOR_RATE: f64 = 1.5;
const INTAKE_FILL_RATE: f64 = 400.0;

/// First-order kinematic plant: velocities integrate directly, the
/// drive-to-pose controller moves in a straight line at capped speed, and
/// the elevator slews at a fixed rate. Enough to close the loop on the
/// arbitration core without pretending to be a physics engine.
pub struct Plant {
    pub pose: Pose,
    pub elevator: f64,
    pub piece_mm: f64,
    pub ejected: bool,
    pub piece_sensor_ok: bool,
}

impl Plant {
    /// Starts with a game piece aboard, as a match would.
    pub fn new() -> Self {
        Self {
            pose: Pose::new(0.0, 0.0, 0.0),
            elevator: 0.0,
            piece_mm: 10.0,
            ejected: false,
            piece_sensor_ok: true,
        }
    }

    pub fn has_piece(&self) -> bool {
        self.piece_mm < 50.0
    }

    fn turn_toward(&mut self, heading: f64, dt: f64) {
        let err = wrap_angle(heading - self.pose.heading);
        let step = err.abs().min(MAX_TURN_RATE * dt);
        self.pose.heading = wrap_angle(self.pose.heading + step.copysign(err));
    }

    pub fn apply(&mut self, out: &ActuatorFrame, dt: f64) {
        if let Some(p) = out.pose_reset {
            self.pose = p;
        }
        match out.drive {
            Some(DriveCommand::FieldVelocity { vx, vy, omega }) => {
                self.pose.x += vx * dt;
                self.pose.y += vy * dt;
                self.pose.heading = wrap_angle(self.pose.heading + omega * dt);
            }
            Some(DriveCommand::FacingHeading { vx, vy, heading }) => {
                self.pose.x += vx * dt;
                self.pose.y += vy * dt;
                self.turn_toward(heading, dt);
            }
            Some(DriveCommand::ToPose(target)) => {
                let dx = target.x - self.pose.x;
                let dy = target.y - self.pose.y;
                let dist = (dx * dx + dy * dy).sqrt();
                if dist > 1e-9 {
                    let step = dist.min(MAX_SPEED * dt);
                    self.pose.x += dx / dist * step;
                    self.pose.y += dy / dist * step;
                }
                self.turn_toward(target.heading, dt);
            }
            Some(DriveCommand::Brake) | Some(DriveCommand::Stop) | None => {}
        }
        if let Some(target) = out.elevator_height_target {
            let err = target - self.elevator;
            let step = err.abs().min(ELEVATOR_RATE * dt);
            self.elevator += step.copysign(err);
        }
        if let Some(speed) = out.ejector_speed {
            if speed >= 0.45 && self.has_piece() {
                self.ejected = true;
                self.piece_mm = 300.0;
            } else if speed > 0.0 && speed < 0.45 && !self.has_piece() {
                self.piece_mm -= INTAKE_FILL_RATE * dt;
            }
        }
    }

    pub fn frame(&self, now: f64, mode: RobotMode, alliance: Option<Alliance>) -> InputFrame {
        InputFrame {
            now,
            mode,
            alliance,
            pose: Some(self.pose),
            piece_distance_mm: self.piece_sensor_ok.then_some(self.piece_mm),
            elevator_height: Some(self.elevator),
            ..InputFrame::default()
        }
    }
}

impl Default for Plant {
    fn default() -> Self {
        Self::new()
    }
}
