use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// SubsystemGroup
// ---------------------------------------------------------------------------

/// One mutually-exclusive actuator group. At most one behavior may claim a
/// group on any tick; the binding table is the sole arbiter of claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubsystemGroup {
    Drive,
    Elevator,
    Ejector,
}

impl SubsystemGroup {
    pub fn all() -> &'static [SubsystemGroup] {
        &[
            SubsystemGroup::Drive,
            SubsystemGroup::Elevator,
            SubsystemGroup::Ejector,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SubsystemGroup::Drive => "drive",
            SubsystemGroup::Elevator => "elevator",
            SubsystemGroup::Ejector => "ejector",
        }
    }
}

impl fmt::Display for SubsystemGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SubsystemGroup {
    type Err = crate::error::CadenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "drive" => Ok(SubsystemGroup::Drive),
            "elevator" => Ok(SubsystemGroup::Elevator),
            "ejector" => Ok(SubsystemGroup::Ejector),
            _ => Err(crate::error::CadenceError::InvalidGroup(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Alliance
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alliance {
    Blue,
    Red,
}

impl Alliance {
    pub fn is_red(self) -> bool {
        matches!(self, Alliance::Red)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Alliance::Blue => "blue",
            Alliance::Red => "red",
        }
    }
}

impl fmt::Display for Alliance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Alliance {
    type Err = crate::error::CadenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "blue" => Ok(Alliance::Blue),
            "red" => Ok(Alliance::Red),
            _ => Err(crate::error::CadenceError::InvalidAlliance(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// ElevatorSetpoint
// ---------------------------------------------------------------------------

/// Named elevator height. The physical height in meters comes from
/// `ElevatorConfig::height_for`, so tuning never touches arbitration code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElevatorSetpoint {
    Stow,
    Load,
    L1,
    L2,
    L3,
    L4,
}

impl ElevatorSetpoint {
    pub fn all() -> &'static [ElevatorSetpoint] {
        &[
            ElevatorSetpoint::Stow,
            ElevatorSetpoint::Load,
            ElevatorSetpoint::L1,
            ElevatorSetpoint::L2,
            ElevatorSetpoint::L3,
            ElevatorSetpoint::L4,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ElevatorSetpoint::Stow => "stow",
            ElevatorSetpoint::Load => "load",
            ElevatorSetpoint::L1 => "l1",
            ElevatorSetpoint::L2 => "l2",
            ElevatorSetpoint::L3 => "l3",
            ElevatorSetpoint::L4 => "l4",
        }
    }
}

impl fmt::Display for ElevatorSetpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ElevatorSetpoint {
    type Err = crate::error::CadenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stow" => Ok(ElevatorSetpoint::Stow),
            "load" => Ok(ElevatorSetpoint::Load),
            "l1" => Ok(ElevatorSetpoint::L1),
            "l2" => Ok(ElevatorSetpoint::L2),
            "l3" => Ok(ElevatorSetpoint::L3),
            "l4" => Ok(ElevatorSetpoint::L4),
            _ => Err(crate::error::CadenceError::InvalidSetpoint(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// BranchSide
// ---------------------------------------------------------------------------

/// Which scoring branch of a reef face, seen from a robot facing the face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BranchSide {
    Left,
    Right,
}

impl BranchSide {
    pub fn as_str(self) -> &'static str {
        match self {
            BranchSide::Left => "left",
            BranchSide::Right => "right",
        }
    }
}

impl fmt::Display for BranchSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BranchSide {
    type Err = crate::error::CadenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(BranchSide::Left),
            "right" => Ok(BranchSide::Right),
            _ => Err(crate::error::CadenceError::InvalidBranchSide(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// ActivationMode / InterruptPolicy
// ---------------------------------------------------------------------------

/// How a trigger maps onto behavior activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationMode {
    /// Activate once when the trigger rises.
    OnRise,
    /// Requested for every tick the trigger is true; force-ended on the
    /// tick the trigger reads false, unless already superseded.
    WhileTrue,
}

/// What happens when a later binding contests a group this behavior holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterruptPolicy {
    /// The running behavior wins: the incoming activation is refused until
    /// this behavior ends on its own or its trigger falls.
    CancelIncoming,
    /// The running behavior is forcibly ended and the incoming one starts
    /// on the same tick.
    CancelRunning,
}

// ---------------------------------------------------------------------------
// RobotMode
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RobotMode {
    Disabled,
    Autonomous,
    Teleop,
}

impl RobotMode {
    pub fn as_str(self) -> &'static str {
        match self {
            RobotMode::Disabled => "disabled",
            RobotMode::Autonomous => "autonomous",
            RobotMode::Teleop => "teleop",
        }
    }
}

impl fmt::Display for RobotMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
