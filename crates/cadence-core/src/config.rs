use crate::error::Result;
use crate::types::ElevatorSetpoint;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// FieldConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldConfig {
    #[serde(default = "default_field_length")]
    pub length_m: f64,
    #[serde(default = "default_field_width")]
    pub width_m: f64,
    #[serde(default = "default_reef_center_x")]
    pub reef_center_x_m: f64,
    #[serde(default = "default_reef_center_y")]
    pub reef_center_y_m: f64,
    /// Distance from the reef center to the robot center when lined up on a
    /// face.
    #[serde(default = "default_reef_standoff")]
    pub reef_standoff_m: f64,
    /// Lateral offset from a face center to either scoring branch.
    #[serde(default = "default_branch_offset")]
    pub branch_offset_m: f64,
}

fn default_field_length() -> f64 {
    17.548
}

fn default_field_width() -> f64 {
    8.052
}

fn default_reef_center_x() -> f64 {
    4.489
}

fn default_reef_center_y() -> f64 {
    4.026
}

fn default_reef_standoff() -> f64 {
    1.3
}

fn default_branch_offset() -> f64 {
    0.164
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            length_m: default_field_length(),
            width_m: default_field_width(),
            reef_center_x_m: default_reef_center_x(),
            reef_center_y_m: default_reef_center_y(),
            reef_standoff_m: default_reef_standoff(),
            branch_offset_m: default_branch_offset(),
        }
    }
}

// ---------------------------------------------------------------------------
// DriveConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriveConfig {
    #[serde(default = "default_xy_tol")]
    pub pose_xy_tolerance_m: f64,
    #[serde(default = "default_heading_tol")]
    pub pose_heading_tolerance_rad: f64,
    /// Hard cap on any drive-to-pose step; the step completes at this bound
    /// even if the pose is never reached.
    #[serde(default = "default_to_pose_timeout")]
    pub to_pose_timeout_s: f64,
    /// Radius around the reef inside which the face-the-reef assist engages.
    #[serde(default = "default_near_reef")]
    pub near_reef_m: f64,
    #[serde(default = "default_left_station_heading")]
    pub left_station_heading_rad: f64,
    #[serde(default = "default_right_station_heading")]
    pub right_station_heading_rad: f64,
    #[serde(default = "default_deadband")]
    pub joystick_deadband: f64,
}

fn default_xy_tol() -> f64 {
    0.03
}

fn default_heading_tol() -> f64 {
    0.05
}

fn default_to_pose_timeout() -> f64 {
    4.0
}

fn default_near_reef() -> f64 {
    3.048
}

fn default_left_station_heading() -> f64 {
    2.199
}

fn default_right_station_heading() -> f64 {
    -2.199
}

fn default_deadband() -> f64 {
    0.1
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            pose_xy_tolerance_m: default_xy_tol(),
            pose_heading_tolerance_rad: default_heading_tol(),
            to_pose_timeout_s: default_to_pose_timeout(),
            near_reef_m: default_near_reef(),
            left_station_heading_rad: default_left_station_heading(),
            right_station_heading_rad: default_right_station_heading(),
            joystick_deadband: default_deadband(),
        }
    }
}

// ---------------------------------------------------------------------------
// ElevatorConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ElevatorHeights {
    #[serde(default)]
    pub stow_m: f64,
    #[serde(default = "default_load_height")]
    pub load_m: f64,
    #[serde(default = "default_l1")]
    pub l1_m: f64,
    #[serde(default = "default_l2")]
    pub l2_m: f64,
    #[serde(default = "default_l3")]
    pub l3_m: f64,
    #[serde(default = "default_l4")]
    pub l4_m: f64,
}

fn default_load_height() -> f64 {
    0.23
}

fn default_l1() -> f64 {
    0.46
}

fn default_l2() -> f64 {
    0.81
}

fn default_l3() -> f64 {
    1.21
}

fn default_l4() -> f64 {
    1.83
}

impl Default for ElevatorHeights {
    fn default() -> Self {
        Self {
            stow_m: 0.0,
            load_m: default_load_height(),
            l1_m: default_l1(),
            l2_m: default_l2(),
            l3_m: default_l3(),
            l4_m: default_l4(),
        }
    }
}

impl ElevatorHeights {
    pub fn height_for(&self, sp: ElevatorSetpoint) -> f64 {
        match sp {
            ElevatorSetpoint::Stow => self.stow_m,
            ElevatorSetpoint::Load => self.load_m,
            ElevatorSetpoint::L1 => self.l1_m,
            ElevatorSetpoint::L2 => self.l2_m,
            ElevatorSetpoint::L3 => self.l3_m,
            ElevatorSetpoint::L4 => self.l4_m,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElevatorConfig {
    #[serde(default)]
    pub heights: ElevatorHeights,
    #[serde(default = "default_elevator_tol")]
    pub tolerance_m: f64,
}

fn default_elevator_tol() -> f64 {
    0.05
}

impl Default for ElevatorConfig {
    fn default() -> Self {
        Self {
            heights: ElevatorHeights::default(),
            tolerance_m: default_elevator_tol(),
        }
    }
}

// ---------------------------------------------------------------------------
// EjectorConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EjectorConfig {
    #[serde(default = "default_intake_speed")]
    pub intake_speed: f64,
    #[serde(default = "default_eject_speed")]
    pub eject_speed: f64,
    /// Distance sensor reading below this means a game piece is held.
    #[serde(default = "default_piece_threshold")]
    pub piece_threshold_mm: f64,
    /// How long the ejection leg of a scoring sequence runs.
    #[serde(default = "default_eject_duration")]
    pub eject_duration_s: f64,
}

fn default_intake_speed() -> f64 {
    0.35
}

fn default_eject_speed() -> f64 {
    0.5
}

fn default_piece_threshold() -> f64 {
    50.8
}

fn default_eject_duration() -> f64 {
    1.0
}

impl Default for EjectorConfig {
    fn default() -> Self {
        Self {
            intake_speed: default_intake_speed(),
            eject_speed: default_eject_speed(),
            piece_threshold_mm: default_piece_threshold(),
            eject_duration_s: default_eject_duration(),
        }
    }
}

// ---------------------------------------------------------------------------
// AutoConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoConfig {
    #[serde(default = "default_start_wait")]
    pub start_wait_s: f64,
    /// Open-loop reverse speed during the pushback leg (field-relative X).
    #[serde(default = "default_pushback_vx")]
    pub pushback_vx: f64,
    #[serde(default = "default_center_leg")]
    pub center_leg_s: f64,
    #[serde(default = "default_side_leg")]
    pub side_leg_s: f64,
    #[serde(default = "default_angle_leg")]
    pub angle_leg_s: f64,
    #[serde(default = "default_settle_stop")]
    pub settle_stop_s: f64,
}

fn default_start_wait() -> f64 {
    0.5
}

fn default_pushback_vx() -> f64 {
    -0.2
}

fn default_center_leg() -> f64 {
    1.0
}

fn default_side_leg() -> f64 {
    2.25
}

fn default_angle_leg() -> f64 {
    1.0
}

fn default_settle_stop() -> f64 {
    0.75
}

impl Default for AutoConfig {
    fn default() -> Self {
        Self {
            start_wait_s: default_start_wait(),
            pushback_vx: default_pushback_vx(),
            center_leg_s: default_center_leg(),
            side_leg_s: default_side_leg(),
            angle_leg_s: default_angle_leg(),
            settle_stop_s: default_settle_stop(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default = "default_tick_period")]
    pub tick_period_s: f64,
    #[serde(default)]
    pub field: FieldConfig,
    #[serde(default)]
    pub drive: DriveConfig,
    #[serde(default)]
    pub elevator: ElevatorConfig,
    #[serde(default)]
    pub ejector: EjectorConfig,
    #[serde(default)]
    pub auto: AutoConfig,
}

fn default_version() -> u32 {
    1
}

fn default_tick_period() -> f64 {
    0.02
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            tick_period_s: default_tick_period(),
            field: FieldConfig::default(),
            drive: DriveConfig::default(),
            elevator: ElevatorConfig::default(),
            ejector: EjectorConfig::default(),
            auto: AutoConfig::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(path, data.as_bytes())
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if !(0.005..=0.1).contains(&self.tick_period_s) {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "tick_period_s={} is outside the usual 5-100 ms range",
                    self.tick_period_s
                ),
            });
        }

        for (name, v) in [
            ("drive.pose_xy_tolerance_m", self.drive.pose_xy_tolerance_m),
            (
                "drive.pose_heading_tolerance_rad",
                self.drive.pose_heading_tolerance_rad,
            ),
            ("drive.to_pose_timeout_s", self.drive.to_pose_timeout_s),
            ("elevator.tolerance_m", self.elevator.tolerance_m),
            ("ejector.eject_duration_s", self.ejector.eject_duration_s),
        ] {
            if v <= 0.0 {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!("{name} must be positive (got {v})"),
                });
            }
        }

        let h = &self.elevator.heights;
        if !(h.l1_m < h.l2_m && h.l2_m < h.l3_m && h.l3_m < h.l4_m) {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "elevator heights l1..l4 are not strictly increasing".to_string(),
            });
        }

        if self.field.reef_center_x_m * 2.0 > self.field.length_m {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "blue reef center is past the field midline".to_string(),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let yaml = serde_yaml::to_string(&cfg).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.version, 1);
        assert!((parsed.tick_period_s - 0.02).abs() < 1e-12);
        assert!((parsed.elevator.heights.l4_m - 1.83).abs() < 1e-12);
    }

    #[test]
    fn sparse_yaml_fills_defaults() {
        let yaml = "version: 1\ndrive:\n  to_pose_timeout_s: 2.5\n";
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert!((cfg.drive.to_pose_timeout_s - 2.5).abs() < 1e-12);
        assert!((cfg.drive.pose_xy_tolerance_m - 0.03).abs() < 1e-12);
        assert!((cfg.field.length_m - 17.548).abs() < 1e-12);
    }

    #[test]
    fn save_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cadence.yaml");
        let mut cfg = Config::default();
        cfg.ejector.intake_speed = 0.4;
        cfg.save(&path).unwrap();
        let loaded = Config::load(&path).unwrap();
        assert!((loaded.ejector.intake_speed - 0.4).abs() < 1e-12);
    }

    #[test]
    fn validate_default_no_warnings() {
        assert!(Config::default().validate().is_empty());
    }

    #[test]
    fn validate_bad_tolerance_is_error() {
        let mut cfg = Config::default();
        cfg.drive.pose_xy_tolerance_m = 0.0;
        let warnings = cfg.validate();
        assert!(warnings
            .iter()
            .any(|w| w.level == WarnLevel::Error && w.message.contains("pose_xy_tolerance_m")));
    }

    #[test]
    fn validate_height_ordering() {
        let mut cfg = Config::default();
        cfg.elevator.heights.l3_m = 0.1;
        let warnings = cfg.validate();
        assert!(warnings
            .iter()
            .any(|w| w.message.contains("strictly increasing")));
    }
}
