use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::alert::{AlertLevel, AlertRegistry};
use crate::behavior::{score_game_piece, Behavior};
use crate::config::Config;
use crate::geometry::{wrap_angle, FieldMap, ReefFace, StartPosition};
use crate::step::{HeadingRef, PoseTarget, RotationSource, SetpointRef, Step, TranslationSource};
use crate::types::{Alliance, BranchSide, ElevatorSetpoint, SubsystemGroup};

// ---------------------------------------------------------------------------
// RoutineId
// ---------------------------------------------------------------------------

/// The three starting slots along the alliance wall. Each routine drives
/// off the line, approaches its reef face, and scores one game piece on L4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutineId {
    Center,
    Left,
    Right,
}

impl RoutineId {
    pub fn all() -> &'static [RoutineId] {
        &[RoutineId::Center, RoutineId::Left, RoutineId::Right]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RoutineId::Center => "center",
            RoutineId::Left => "left",
            RoutineId::Right => "right",
        }
    }

    fn start(self) -> StartPosition {
        match self {
            RoutineId::Center => StartPosition::Center,
            RoutineId::Left => StartPosition::Left,
            RoutineId::Right => StartPosition::Right,
        }
    }

    fn target_face(self) -> ReefFace {
        match self {
            RoutineId::Center => ReefFace::Far,
            RoutineId::Left => ReefFace::FarLeft,
            RoutineId::Right => ReefFace::FarRight,
        }
    }
}

impl fmt::Display for RoutineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoutineId {
    type Err = crate::error::CadenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "center" => Ok(RoutineId::Center),
            "left" => Ok(RoutineId::Left),
            "right" => Ok(RoutineId::Right),
            other => Err(crate::error::CadenceError::UnknownRoutine(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Routine construction
// ---------------------------------------------------------------------------

/// Waypoints and leg headings are authored in the blue frame; for red the
/// x velocity negates and fixed headings rotate by pi, matching the pose
/// mirror.
fn leg_vx(cfg: &Config, alliance: Alliance) -> f64 {
    if alliance.is_red() {
        -cfg.auto.pushback_vx
    } else {
        cfg.auto.pushback_vx
    }
}

fn leg_heading(blue_heading: f64, alliance: Alliance) -> f64 {
    if alliance.is_red() {
        wrap_angle(blue_heading + std::f64::consts::PI)
    } else {
        blue_heading
    }
}

/// Build a ready-to-start routine behavior. An unknown alliance resolves to
/// blue and raises a latched alert rather than blocking the start.
pub fn build(
    id: RoutineId,
    alliance: Option<Alliance>,
    map: &FieldMap,
    cfg: &Config,
    alerts: &mut AlertRegistry,
) -> Behavior {
    let alliance = match alliance {
        Some(a) => a,
        None => {
            alerts.set(
                "alliance-assumed-blue",
                AlertLevel::Warning,
                "alliance unknown at routine build; assuming blue",
            );
            Alliance::Blue
        }
    };

    let start_pose = id.start().pose(alliance, map.field_length());
    let face = id.target_face();
    let waypoint = map.resolve(face, BranchSide::Left, alliance);
    if waypoint.is_none() {
        alerts.set(
            "unresolved-waypoint",
            AlertLevel::Error,
            format!("no pose for reef face {} on {}", face, alliance),
        );
    }

    let drive_off = TranslationSource::Fixed {
        vx: leg_vx(cfg, alliance),
        vy: 0.0,
    };

    let mut steps = vec![
        Step::wait(cfg.auto.start_wait_s),
        Step::reset_pose(start_pose),
    ];
    match id {
        RoutineId::Center => {
            steps.push(
                Step::drive(
                    drive_off,
                    RotationSource::Heading(HeadingRef::Fixed(leg_heading(
                        std::f64::consts::PI,
                        alliance,
                    ))),
                )
                .with_timeout(cfg.auto.center_leg_s),
            );
        }
        RoutineId::Left | RoutineId::Right => {
            // Side slots push straight back first, then swing toward the
            // far-left or far-right face while still translating.
            let approach = wrap_angle(face.blue_outward_angle() + std::f64::consts::PI);
            steps.push(
                Step::drive(
                    drive_off,
                    RotationSource::Heading(HeadingRef::Fixed(leg_heading(
                        std::f64::consts::PI,
                        alliance,
                    ))),
                )
                .with_timeout(cfg.auto.side_leg_s),
            );
            steps.push(
                Step::drive(
                    drive_off,
                    RotationSource::Heading(HeadingRef::Fixed(leg_heading(approach, alliance))),
                )
                .with_timeout(cfg.auto.angle_leg_s),
            );
        }
    }
    steps.push(Step::stop_drive().with_timeout(cfg.auto.settle_stop_s));
    steps.push(Step::drive_to_pose(
        PoseTarget::Fixed(waypoint),
        cfg.drive.to_pose_timeout_s,
    ));
    steps.push(Step::deadline(
        score_game_piece(cfg, SetpointRef::Fixed(ElevatorSetpoint::L4)),
        vec![Step::brake()],
    ));

    Behavior::new(
        format!("auto_{id}"),
        SubsystemGroup::all(),
        Step::sequence(steps),
    )
    .non_interruptible()
}
