use serde::Serialize;

use cadence_core::auto::RoutineId;

use crate::output::{print_json, print_table};

#[derive(Serialize)]
struct RoutineRow {
    id: RoutineId,
    description: &'static str,
}

fn describe(id: RoutineId) -> &'static str {
    match id {
        RoutineId::Center => "center slot, score one piece on the far face",
        RoutineId::Left => "left slot, score one piece on the far-left face",
        RoutineId::Right => "right slot, score one piece on the far-right face",
    }
}

pub fn run(json: bool) -> anyhow::Result<()> {
    let rows: Vec<RoutineRow> = RoutineId::all()
        .iter()
        .map(|&id| RoutineRow {
            id,
            description: describe(id),
        })
        .collect();

    if json {
        return print_json(&rows);
    }
    print_table(
        &["ROUTINE", "DESCRIPTION"],
        rows.iter()
            .map(|r| vec![r.id.to_string(), r.description.to_string()])
            .collect(),
    );
    Ok(())
}
