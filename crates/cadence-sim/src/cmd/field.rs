use std::path::Path;

use anyhow::Context;
use serde::Serialize;

use cadence_core::geometry::{FieldMap, Pose, ReefFace, StartPosition};
use cadence_core::types::{Alliance, BranchSide};

use crate::output::{print_json, print_table};

#[derive(Serialize)]
struct FieldReport {
    alliance: Alliance,
    starts: Vec<StartRow>,
    waypoints: Vec<WaypointRow>,
}

#[derive(Serialize)]
struct StartRow {
    position: StartPosition,
    pose: Pose,
}

#[derive(Serialize)]
struct WaypointRow {
    face: ReefFace,
    side: BranchSide,
    apriltag: u8,
    pose: Pose,
}

pub fn run(config: &Path, alliance: &str, json: bool) -> anyhow::Result<()> {
    let cfg = super::load_config(config)?;
    let alliance: Alliance = alliance.parse().context("parsing --alliance")?;
    let map = FieldMap::new(&cfg.field);

    let starts = [StartPosition::Center, StartPosition::Left, StartPosition::Right]
        .into_iter()
        .map(|position| StartRow {
            position,
            pose: position.pose(alliance, map.field_length()),
        })
        .collect();

    let mut waypoints = Vec::new();
    for &face in ReefFace::all() {
        for side in [BranchSide::Left, BranchSide::Right] {
            if let Some(pose) = map.resolve(face, side, alliance) {
                waypoints.push(WaypointRow {
                    face,
                    side,
                    apriltag: face.apriltag(alliance),
                    pose,
                });
            }
        }
    }

    let report = FieldReport {
        alliance,
        starts,
        waypoints,
    };
    if json {
        return print_json(&report);
    }

    print_table(
        &["START", "X", "Y", "HEADING"],
        report
            .starts
            .iter()
            .map(|s| {
                vec![
                    s.position.to_string(),
                    format!("{:.3}", s.pose.x),
                    format!("{:.3}", s.pose.y),
                    format!("{:.3}", s.pose.heading),
                ]
            })
            .collect(),
    );
    println!();
    print_table(
        &["FACE", "SIDE", "TAG", "X", "Y", "HEADING"],
        report
            .waypoints
            .iter()
            .map(|w| {
                vec![
                    w.face.to_string(),
                    w.side.to_string(),
                    w.apriltag.to_string(),
                    format!("{:.3}", w.pose.x),
                    format!("{:.3}", w.pose.y),
                    format!("{:.3}", w.pose.heading),
                ]
            })
            .collect(),
    );
    Ok(())
}
