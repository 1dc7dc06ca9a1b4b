use serde::Serialize;

use crate::alert::AlertLevel;
use crate::auto::RoutineId;
use crate::types::{Alliance, RobotMode, SubsystemGroup};

/// One-tick snapshot of the arbitration state, shaped for JSON output.
#[derive(Debug, Clone, Serialize)]
pub struct TickStatus {
    pub tick: u64,
    pub mode: RobotMode,
    pub alliance: Option<Alliance>,
    pub armed_routine: Option<RoutineId>,
    pub active: Vec<ActiveStatus>,
    pub triggers: Vec<TriggerStatus>,
    pub alerts: Vec<AlertStatus>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TriggerStatus {
    pub expr: String,
    pub value: bool,
    pub rose: bool,
    pub fell: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActiveStatus {
    pub name: String,
    /// Path of the running step inside the behavior, when one is active.
    pub path: Option<String>,
    pub groups: Vec<SubsystemGroup>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AlertStatus {
    pub key: String,
    pub level: AlertLevel,
    pub message: String,
}
