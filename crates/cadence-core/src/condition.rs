use crate::alert::{AlertLevel, AlertRegistry};
use std::collections::BTreeMap;

/// Well-known condition names used by the standard wiring.
pub mod keys {
    pub const HAS_GAME_PIECE: &str = "has_game_piece";
    pub const AT_POSE: &str = "at_pose";
    pub const NEAR_REEF: &str = "near_reef";
    pub const TELEOP: &str = "teleop";
    pub const MANUAL_ROTATE: &str = "manual_rotate";
    pub const DRIVER_LEFT_TRIGGER: &str = "driver_left_trigger";
    pub const DRIVER_RIGHT_TRIGGER: &str = "driver_right_trigger";
    pub const DRIVER_RIGHT_BUMPER: &str = "driver_right_bumper";
    pub const BOARD_GO: &str = "board_go";
    pub const BOARD_LOAD_LEFT: &str = "board_load_left";
    pub const BOARD_LOAD_RIGHT: &str = "board_load_right";
    pub const BOARD_ELEVATOR_BRAKE: &str = "board_elevator_brake";
    pub const WAYPOINT_SELECTED: &str = "waypoint_selected";
}

// ---------------------------------------------------------------------------
// ConditionSet
// ---------------------------------------------------------------------------

/// Named boolean conditions, re-sampled fresh every tick. Conditions keep no
/// history; edge state lives in `TriggerSet`.
///
/// A source that cannot produce a value this tick samples `None`: the
/// condition reads false and a persistent missing-input alert is raised
/// (cleared again once the source recovers).
#[derive(Debug, Clone, Default)]
pub struct ConditionSet {
    values: BTreeMap<String, bool>,
}

impl ConditionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sample a condition from a fallible source.
    pub fn sample(&mut self, key: &str, value: Option<bool>, alerts: &mut AlertRegistry) {
        let alert_key = format!("missing-input:{key}");
        match value {
            Some(v) => {
                self.values.insert(key.to_string(), v);
                alerts.clear(&alert_key);
            }
            None => {
                self.values.insert(key.to_string(), false);
                alerts.set(
                    &alert_key,
                    AlertLevel::Error,
                    format!("condition source '{key}' produced no value"),
                );
            }
        }
    }

    /// Set a condition that is computed rather than sensed (never missing).
    pub fn set(&mut self, key: &str, value: bool) {
        self.values.insert(key.to_string(), value);
    }

    /// Current value. A name that was never sampled reads false.
    pub fn get(&self, key: &str) -> bool {
        self.values.get(key).copied().unwrap_or(false)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
