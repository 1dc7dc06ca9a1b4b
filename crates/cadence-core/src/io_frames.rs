use crate::board::ButtonFrame;
use crate::condition::ConditionSet;
use crate::config::ElevatorHeights;
use crate::geometry::Pose;
use crate::types::{Alliance, ElevatorSetpoint, RobotMode};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Input shaping
// ---------------------------------------------------------------------------

/// Zero out inputs inside the deadband, preserving range.
pub fn apply_deadband(value: f64, deadband: f64) -> f64 {
    if value.abs() < deadband {
        0.0
    } else {
        value
    }
}

/// Square an input, preserving sign. Gives the driver fine control near
/// zero without giving up top speed.
pub fn square_input(input: f64) -> f64 {
    input.abs() * input
}

// ---------------------------------------------------------------------------
// DriverFrame
// ---------------------------------------------------------------------------

/// Raw driver controller sample for one tick. Stick axes are in [-1, 1],
/// WPILib convention (left Y forward is negative, hence the inversions).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DriverFrame {
    pub left_x: f64,
    pub left_y: f64,
    pub right_x: f64,
    pub left_trigger: bool,
    pub right_trigger: bool,
    pub right_bumper: bool,
}

impl DriverFrame {
    pub fn velocity_x(&self, deadband: f64) -> f64 {
        square_input(apply_deadband(-self.left_y, deadband))
    }

    pub fn velocity_y(&self, deadband: f64) -> f64 {
        square_input(apply_deadband(-self.left_x, deadband))
    }

    pub fn velocity_rotation(&self, deadband: f64) -> f64 {
        square_input(apply_deadband(-self.right_x, deadband))
    }
}

// ---------------------------------------------------------------------------
// InputFrame
// ---------------------------------------------------------------------------

/// Everything the host samples for one tick. `Option` channels are fallible
/// sources: `None` means the source produced no value this tick and is
/// treated as a missing-input fault, never a crash.
#[derive(Debug, Clone)]
pub struct InputFrame {
    /// Tick clock, seconds. Monotonic, supplied by the host scheduler.
    pub now: f64,
    pub mode: RobotMode,
    /// Alliance color as reported by the host; may be absent until match
    /// start. The scheduler latches the first value it sees.
    pub alliance: Option<Alliance>,
    /// Current odometry estimate.
    pub pose: Option<Pose>,
    /// Heading the drive holds when the driver is not rotating.
    pub heading_correction: f64,
    /// Game-piece distance sensor, millimeters. `None` = sensor fault.
    pub piece_distance_mm: Option<f64>,
    pub elevator_height: Option<f64>,
    /// Drive collaborator's own at-target report.
    pub at_pose: Option<bool>,
    pub driver: DriverFrame,
    pub board: ButtonFrame,
    /// Host-defined extra condition samples, refreshed alongside the
    /// built-in ones.
    pub extra_conditions: Vec<(String, Option<bool>)>,
}

impl Default for InputFrame {
    fn default() -> Self {
        Self {
            now: 0.0,
            mode: RobotMode::Disabled,
            alliance: None,
            pose: None,
            heading_correction: 0.0,
            piece_distance_mm: None,
            elevator_height: None,
            at_pose: None,
            driver: DriverFrame::default(),
            board: ButtonFrame::default(),
            extra_conditions: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Observations
// ---------------------------------------------------------------------------

/// Shaped driver axes after deadband and squaring.
#[derive(Debug, Clone, Copy, Default)]
pub struct DriverAxes {
    pub vx: f64,
    pub vy: f64,
    pub omega: f64,
}

/// The per-tick view steps and completion predicates read. Built by the
/// scheduler after the condition refresh, so a step never sees a stale
/// condition mixed with a fresh one.
pub struct Observations<'a> {
    pub now: f64,
    pub has_game_piece: bool,
    pub elevator_height: Option<f64>,
    pub pose: Option<Pose>,
    pub driver: DriverAxes,
    pub heading_correction: f64,
    /// Field heading from the current pose toward the alliance reef center.
    pub reef_heading: Option<f64>,
    /// Operator-board waypoint selection, resolved against the field map.
    pub selected_waypoint: Option<Pose>,
    pub selected_setpoint: ElevatorSetpoint,
    pub heights: ElevatorHeights,
    pub elevator_tolerance: f64,
    pub pose_xy_tolerance: f64,
    pub pose_heading_tolerance: f64,
    pub conditions: &'a ConditionSet,
}

impl Observations<'_> {
    pub fn elevator_at(&self, sp: ElevatorSetpoint) -> bool {
        match self.elevator_height {
            Some(h) => (h - self.heights.height_for(sp)).abs() < self.elevator_tolerance,
            None => false,
        }
    }

    pub fn pose_within(&self, target: Pose) -> bool {
        match self.pose {
            Some(p) => {
                p.translation_distance_to(target) < self.pose_xy_tolerance
                    && p.heading_error_to(target) < self.pose_heading_tolerance
            }
            None => false,
        }
    }
}

// ---------------------------------------------------------------------------
// ActuatorFrame
// ---------------------------------------------------------------------------

/// Fire-and-forget drive command for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DriveCommand {
    /// Field-relative velocities with direct rotation control.
    FieldVelocity { vx: f64, vy: f64, omega: f64 },
    /// Field-relative translation while a heading controller holds
    /// `heading`.
    FacingHeading { vx: f64, vy: f64, heading: f64 },
    /// Closed-loop drive toward a pose.
    ToPose(Pose),
    Brake,
    Stop,
}

/// Commands emitted by this tick's active behaviors. At most one writer per
/// group per tick; that is guaranteed by arbitration, not by this struct.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ActuatorFrame {
    pub drive: Option<DriveCommand>,
    pub elevator_height_target: Option<f64>,
    pub ejector_speed: Option<f64>,
    pub pose_reset: Option<Pose>,
}

impl ActuatorFrame {
    pub fn clear(&mut self) {
        *self = ActuatorFrame::default();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
