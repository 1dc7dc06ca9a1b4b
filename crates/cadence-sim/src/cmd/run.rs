use std::path::Path;

use anyhow::{bail, Context};
use serde::Serialize;

use cadence_core::auto::RoutineId;
use cadence_core::geometry::Pose;
use cadence_core::io_frames::ActuatorFrame;
use cadence_core::scheduler::Scheduler;
use cadence_core::types::{Alliance, RobotMode, SubsystemGroup};

use crate::output::print_json;
use crate::plant::Plant;

#[derive(Serialize)]
struct RunSummary {
    routine: RoutineId,
    alliance: Option<Alliance>,
    ticks: u64,
    duration_s: f64,
    scored: bool,
    routine_completed: bool,
    final_pose: Pose,
    alerts: Vec<String>,
}

pub fn run(
    config: &Path,
    routine: &str,
    alliance: Option<&str>,
    max_s: f64,
    drop_piece_sensor: bool,
    json: bool,
) -> anyhow::Result<()> {
    let cfg = super::load_config(config)?;
    let routine: RoutineId = routine.parse().context("parsing --routine")?;
    let alliance: Option<Alliance> = alliance
        .map(|a| a.parse())
        .transpose()
        .context("parsing --alliance")?;
    if max_s <= 0.0 {
        bail!("--max-s must be positive");
    }

    let dt = cfg.tick_period_s;
    let mut sched = Scheduler::new(cfg)?;
    sched.arm_routine(routine);

    let mut plant = Plant::new();
    plant.piece_sensor_ok = !drop_piece_sensor;
    let mut out = ActuatorFrame::default();
    let mut now = 0.0;
    let mut completed = false;

    while now < max_s {
        let frame = plant.frame(now, RobotMode::Autonomous, alliance);
        sched.tick(&frame, &mut out);
        plant.apply(&out, dt);
        now += dt;
        if sched.group_owner(SubsystemGroup::Drive) != Some(routine_name(routine).as_str()) {
            completed = true;
            break;
        }
    }

    let summary = RunSummary {
        routine,
        alliance: sched.alliance(),
        ticks: sched.ticks(),
        duration_s: now,
        scored: plant.ejected,
        routine_completed: completed,
        final_pose: plant.pose,
        alerts: sched
            .alerts()
            .active()
            .map(|(k, a)| format!("{k}: {}", a.message))
            .collect(),
    };

    if json {
        return print_json(&summary);
    }
    println!(
        "routine {} on {} finished in {:.2}s ({} ticks)",
        summary.routine,
        summary
            .alliance
            .map(|a| a.to_string())
            .unwrap_or_else(|| "assumed blue".to_string()),
        summary.duration_s,
        summary.ticks
    );
    println!(
        "  scored: {}  completed: {}  final pose: ({:.2}, {:.2}, {:.2} rad)",
        summary.scored,
        summary.routine_completed,
        summary.final_pose.x,
        summary.final_pose.y,
        summary.final_pose.heading
    );
    for alert in &summary.alerts {
        println!("  alert: {alert}");
    }
    Ok(())
}

fn routine_name(id: RoutineId) -> String {
    format!("auto_{id}")
}
