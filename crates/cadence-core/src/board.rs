use crate::geometry::ReefFace;
use crate::types::{BranchSide, ElevatorSetpoint};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ButtonFrame
// ---------------------------------------------------------------------------

/// Raw operator-board sample: two button banks, 1-indexed like the HID
/// driver reports them (index 0 is unused).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ButtonFrame {
    pub left: [bool; 16],
    pub right: [bool; 16],
}

impl Default for ButtonFrame {
    fn default() -> Self {
        Self {
            left: [false; 16],
            right: [false; 16],
        }
    }
}

impl ButtonFrame {
    pub fn with_left(mut self, button: usize, pressed: bool) -> Self {
        self.left[button] = pressed;
        self
    }

    pub fn with_right(mut self, button: usize, pressed: bool) -> Self {
        self.right[button] = pressed;
        self
    }
}

// ---------------------------------------------------------------------------
// BoardState
// ---------------------------------------------------------------------------

/// Decoded operator-board state for one tick. Pure function of the button
/// frame; alliance-specific waypoint ids collapse into the logical
/// face + side, resolved later against the field map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoardState {
    pub waypoint: Option<(ReefFace, BranchSide)>,
    pub setpoint: ElevatorSetpoint,
    pub load_left: bool,
    pub load_right: bool,
    pub go: bool,
    pub elevator_brake: bool,
}

/// Left-bank scoring buttons in priority order: first pressed wins.
const WAYPOINT_BUTTONS: [(usize, ReefFace, BranchSide); 12] = [
    (1, ReefFace::Far, BranchSide::Right),
    (2, ReefFace::Far, BranchSide::Left),
    (3, ReefFace::FarRight, BranchSide::Right),
    (4, ReefFace::FarRight, BranchSide::Left),
    (5, ReefFace::NearRight, BranchSide::Right),
    (6, ReefFace::NearRight, BranchSide::Left),
    (7, ReefFace::Near, BranchSide::Right),
    (8, ReefFace::Near, BranchSide::Left),
    (9, ReefFace::NearLeft, BranchSide::Right),
    (10, ReefFace::NearLeft, BranchSide::Left),
    (11, ReefFace::FarLeft, BranchSide::Right),
    (12, ReefFace::FarLeft, BranchSide::Left),
];

/// Right-bank elevator buttons in priority order; no press means stow.
const SETPOINT_BUTTONS: [(usize, ElevatorSetpoint); 5] = [
    (5, ElevatorSetpoint::Stow),
    (1, ElevatorSetpoint::L4),
    (2, ElevatorSetpoint::L3),
    (3, ElevatorSetpoint::L2),
    (4, ElevatorSetpoint::L1),
];

pub fn decode(frame: &ButtonFrame) -> BoardState {
    let waypoint = WAYPOINT_BUTTONS
        .iter()
        .find(|(b, _, _)| frame.left[*b])
        .map(|(_, face, side)| (*face, *side));

    let setpoint = SETPOINT_BUTTONS
        .iter()
        .find(|(b, _)| frame.right[*b])
        .map(|(_, sp)| *sp)
        .unwrap_or(ElevatorSetpoint::Stow);

    BoardState {
        waypoint,
        setpoint,
        load_left: frame.left[13],
        load_right: frame.left[14],
        go: frame.right[7],
        elevator_brake: frame.right[6],
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_press_decodes_idle() {
        let state = decode(&ButtonFrame::default());
        assert_eq!(state.waypoint, None);
        assert_eq!(state.setpoint, ElevatorSetpoint::Stow);
        assert!(!state.go);
    }

    #[test]
    fn first_waypoint_button_wins() {
        let frame = ButtonFrame::default()
            .with_left(2, true)
            .with_left(11, true);
        let state = decode(&frame);
        assert_eq!(state.waypoint, Some((ReefFace::Far, BranchSide::Left)));
    }

    #[test]
    fn stow_button_overrides_levels() {
        let frame = ButtonFrame::default()
            .with_right(5, true)
            .with_right(1, true);
        assert_eq!(decode(&frame).setpoint, ElevatorSetpoint::Stow);
    }

    #[test]
    fn level_buttons_map() {
        for (b, sp) in [
            (1, ElevatorSetpoint::L4),
            (2, ElevatorSetpoint::L3),
            (3, ElevatorSetpoint::L2),
            (4, ElevatorSetpoint::L1),
        ] {
            let frame = ButtonFrame::default().with_right(b, true);
            assert_eq!(decode(&frame).setpoint, sp);
        }
    }

    #[test]
    fn load_and_go_flags() {
        let frame = ButtonFrame::default()
            .with_left(13, true)
            .with_left(14, true)
            .with_right(7, true)
            .with_right(6, true);
        let state = decode(&frame);
        assert!(state.load_left && state.load_right);
        assert!(state.go && state.elevator_brake);
    }
}
