use crate::config::FieldConfig;
use crate::types::{Alliance, BranchSide};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::f64::consts::PI;
use std::fmt;

// ---------------------------------------------------------------------------
// Angle helpers
// ---------------------------------------------------------------------------

/// Wrap an angle to (-PI, PI].
pub fn wrap_angle(a: f64) -> f64 {
    let mut a = a % (2.0 * PI);
    if a <= -PI {
        a += 2.0 * PI;
    } else if a > PI {
        a -= 2.0 * PI;
    }
    a
}

// ---------------------------------------------------------------------------
// Pose
// ---------------------------------------------------------------------------

/// 2D field pose: position in meters, heading in radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    pub heading: f64,
}

impl Pose {
    pub fn new(x: f64, y: f64, heading: f64) -> Self {
        Self { x, y, heading }
    }

    /// Mirror about the field midline: X reflected, Y unchanged, heading
    /// rotated by 180 degrees. Applying this twice is the identity (up to
    /// angle wrapping).
    pub fn mirror(self, field_length: f64) -> Self {
        Self {
            x: field_length - self.x,
            y: self.y,
            heading: wrap_angle(self.heading + PI),
        }
    }

    pub fn translation_distance_to(self, other: Pose) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn heading_error_to(self, other: Pose) -> f64 {
        wrap_angle(other.heading - self.heading).abs()
    }
}

// ---------------------------------------------------------------------------
// ReefFace
// ---------------------------------------------------------------------------

/// Logical reef face, alliance-independent. "Near" is the face toward the
/// alliance's own driver station wall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReefFace {
    Near,
    NearLeft,
    FarLeft,
    Far,
    FarRight,
    NearRight,
}

impl ReefFace {
    pub fn all() -> &'static [ReefFace] {
        &[
            ReefFace::Near,
            ReefFace::NearLeft,
            ReefFace::FarLeft,
            ReefFace::Far,
            ReefFace::FarRight,
            ReefFace::NearRight,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReefFace::Near => "near",
            ReefFace::NearLeft => "near_left",
            ReefFace::FarLeft => "far_left",
            ReefFace::Far => "far",
            ReefFace::FarRight => "far_right",
            ReefFace::NearRight => "near_right",
        }
    }

    /// AprilTag id of this face for a given alliance (2025 field layout).
    pub fn apriltag(self, alliance: Alliance) -> u8 {
        match (self, alliance) {
            (ReefFace::Near, Alliance::Blue) => 18,
            (ReefFace::NearLeft, Alliance::Blue) => 19,
            (ReefFace::FarLeft, Alliance::Blue) => 20,
            (ReefFace::Far, Alliance::Blue) => 21,
            (ReefFace::FarRight, Alliance::Blue) => 22,
            (ReefFace::NearRight, Alliance::Blue) => 17,
            (ReefFace::Near, Alliance::Red) => 7,
            (ReefFace::NearLeft, Alliance::Red) => 6,
            (ReefFace::FarLeft, Alliance::Red) => 11,
            (ReefFace::Far, Alliance::Red) => 10,
            (ReefFace::FarRight, Alliance::Red) => 9,
            (ReefFace::NearRight, Alliance::Red) => 8,
        }
    }

    pub fn from_apriltag(tag: u8) -> Option<(ReefFace, Alliance)> {
        for face in ReefFace::all() {
            if face.apriltag(Alliance::Blue) == tag {
                return Some((*face, Alliance::Blue));
            }
            if face.apriltag(Alliance::Red) == tag {
                return Some((*face, Alliance::Red));
            }
        }
        None
    }

    /// Direction from the blue reef center out through this face, radians.
    /// Near points at the blue driver station wall (-X).
    pub(crate) fn blue_outward_angle(self) -> f64 {
        match self {
            ReefFace::Near => PI,
            ReefFace::NearLeft => 2.0 * PI / 3.0,
            ReefFace::FarLeft => PI / 3.0,
            ReefFace::Far => 0.0,
            ReefFace::FarRight => -PI / 3.0,
            ReefFace::NearRight => -2.0 * PI / 3.0,
        }
    }
}

impl fmt::Display for ReefFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// StartPosition
// ---------------------------------------------------------------------------

/// Autonomous starting slot along the alliance wall. Left/Right are from the
/// driver's point of view, so the labels swap sides under mirroring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartPosition {
    Center,
    Left,
    Right,
}

impl StartPosition {
    fn blue_pose(self) -> Pose {
        match self {
            StartPosition::Center => Pose::new(7.2, 4.0, PI),
            StartPosition::Left => Pose::new(7.2, 5.5, PI),
            StartPosition::Right => Pose::new(7.2, 2.5, PI),
        }
    }

    fn driver_mirror(self) -> StartPosition {
        match self {
            StartPosition::Center => StartPosition::Center,
            StartPosition::Left => StartPosition::Right,
            StartPosition::Right => StartPosition::Left,
        }
    }

    pub fn pose(self, alliance: Alliance, field_length: f64) -> Pose {
        match alliance {
            Alliance::Blue => self.blue_pose(),
            Alliance::Red => self.driver_mirror().blue_pose().mirror(field_length),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StartPosition::Center => "center",
            StartPosition::Left => "left",
            StartPosition::Right => "right",
        }
    }
}

impl fmt::Display for StartPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// FieldMap
// ---------------------------------------------------------------------------

/// Precomputed scoring waypoints, built once at startup. Blue waypoints are
/// authored from the reef geometry; red waypoints are derived by mirroring,
/// so the mirror round-trip invariant holds by construction.
#[derive(Debug, Clone)]
pub struct FieldMap {
    length: f64,
    reef_center_blue: (f64, f64),
    waypoints: HashMap<(ReefFace, BranchSide, Alliance), Pose>,
}

impl FieldMap {
    pub fn new(cfg: &FieldConfig) -> Self {
        let mut waypoints = HashMap::new();
        for face in ReefFace::all() {
            let out = face.blue_outward_angle();
            let facing = wrap_angle(out + PI);
            // Standing off the face, left is +90 degrees from the facing
            // direction.
            let left = wrap_angle(facing + PI / 2.0);
            for side in [BranchSide::Left, BranchSide::Right] {
                let offset = match side {
                    BranchSide::Left => cfg.branch_offset_m,
                    BranchSide::Right => -cfg.branch_offset_m,
                };
                let blue = Pose::new(
                    cfg.reef_center_x_m + out.cos() * cfg.reef_standoff_m + left.cos() * offset,
                    cfg.reef_center_y_m + out.sin() * cfg.reef_standoff_m + left.sin() * offset,
                    facing,
                );
                waypoints.insert((*face, side, Alliance::Blue), blue);
                waypoints.insert((*face, side, Alliance::Red), blue.mirror(cfg.length_m));
            }
        }
        Self {
            length: cfg.length_m,
            reef_center_blue: (cfg.reef_center_x_m, cfg.reef_center_y_m),
            waypoints,
        }
    }

    pub fn field_length(&self) -> f64 {
        self.length
    }

    /// Resolve a scoring waypoint. Returns `None` only if the landmark was
    /// never built; callers must fail closed on `None`.
    pub fn resolve(&self, face: ReefFace, side: BranchSide, alliance: Alliance) -> Option<Pose> {
        self.waypoints.get(&(face, side, alliance)).copied()
    }

    /// Resolve by raw AprilTag id. Unknown ids return `None`.
    pub fn resolve_tag(&self, tag: u8, side: BranchSide) -> Option<Pose> {
        let (face, alliance) = ReefFace::from_apriltag(tag)?;
        self.resolve(face, side, alliance)
    }

    /// Reef center for an alliance, used for distance and facing checks.
    pub fn reef_center(&self, alliance: Alliance) -> (f64, f64) {
        match alliance {
            Alliance::Blue => self.reef_center_blue,
            Alliance::Red => (self.length - self.reef_center_blue.0, self.reef_center_blue.1),
        }
    }

    /// Field heading that points from `pose` at the alliance's reef center.
    pub fn heading_toward_reef(&self, pose: Pose, alliance: Alliance) -> f64 {
        let (cx, cy) = self.reef_center(alliance);
        (cy - pose.y).atan2(cx - pose.x)
    }

    pub fn distance_from_reef(&self, pose: Pose, alliance: Alliance) -> f64 {
        let (cx, cy) = self.reef_center(alliance);
        ((pose.x - cx).powi(2) + (pose.y - cy).powi(2)).sqrt()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn map() -> FieldMap {
        FieldMap::new(&FieldConfig::default())
    }

    #[test]
    fn wrap_angle_range() {
        assert!((wrap_angle(3.0 * PI) - PI).abs() < 1e-9);
        assert!((wrap_angle(-3.0 * PI) - PI).abs() < 1e-9);
        assert!((wrap_angle(0.1) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn mirror_round_trip() {
        let cfg = FieldConfig::default();
        let m = map();
        for face in ReefFace::all() {
            for side in [BranchSide::Left, BranchSide::Right] {
                let blue = m.resolve(*face, side, Alliance::Blue).unwrap();
                let red = m.resolve(*face, side, Alliance::Red).unwrap();
                // X mirrored about the midline, Y unchanged, heading
                // flipped by exactly 180 degrees.
                assert!((blue.x + red.x - cfg.length_m).abs() < 1e-9);
                assert!((blue.y - red.y).abs() < 1e-9);
                assert!((wrap_angle(blue.heading + PI - red.heading)).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn mirror_is_involution() {
        let p = Pose::new(2.0, 3.0, 1.0);
        let twice = p.mirror(17.548).mirror(17.548);
        assert!((twice.x - p.x).abs() < 1e-9);
        assert!((twice.y - p.y).abs() < 1e-9);
        assert!((wrap_angle(twice.heading - p.heading)).abs() < 1e-9);
    }

    #[test]
    fn unknown_tag_unresolved() {
        let m = map();
        assert!(m.resolve_tag(99, BranchSide::Left).is_none());
        assert!(m.resolve_tag(0, BranchSide::Right).is_none());
    }

    #[test]
    fn known_tags_resolve() {
        let m = map();
        // Blue far face is tag 21, red far face is tag 10.
        let blue = m.resolve_tag(21, BranchSide::Left).unwrap();
        let red = m.resolve_tag(10, BranchSide::Left).unwrap();
        assert!((blue.x + red.x - m.field_length()).abs() < 1e-9);
    }

    #[test]
    fn start_pose_labels_swap_for_red() {
        let len = FieldConfig::default().length_m;
        let blue_left = StartPosition::Left.pose(Alliance::Blue, len);
        let red_left = StartPosition::Left.pose(Alliance::Red, len);
        // Left is the driver's left: red left sits on the opposite Y side.
        assert!((blue_left.y - 5.5).abs() < 1e-9);
        assert!((red_left.y - 2.5).abs() < 1e-9);
        assert!(red_left.x > len / 2.0);
    }

    #[test]
    fn apriltag_pairs() {
        for face in ReefFace::all() {
            let blue = face.apriltag(Alliance::Blue);
            let red = face.apriltag(Alliance::Red);
            assert_eq!(ReefFace::from_apriltag(blue), Some((*face, Alliance::Blue)));
            assert_eq!(ReefFace::from_apriltag(red), Some((*face, Alliance::Red)));
        }
    }
}
