use std::path::Path;

use serde::Serialize;

use cadence_core::binding::BindingTable;
use cadence_core::teleop::standard_bindings;
use cadence_core::trigger::TriggerSet;
use cadence_core::types::{ActivationMode, InterruptPolicy, SubsystemGroup};

use crate::output::{print_json, print_table};

#[derive(Serialize)]
struct BindingRow {
    behavior: String,
    trigger: String,
    mode: ActivationMode,
    policy: InterruptPolicy,
    interruptible: bool,
    groups: Vec<SubsystemGroup>,
}

#[derive(Serialize)]
struct TableReport {
    bindings: Vec<BindingRow>,
    defaults: Vec<(SubsystemGroup, String)>,
}

fn mode_str(mode: ActivationMode) -> &'static str {
    match mode {
        ActivationMode::OnRise => "on_rise",
        ActivationMode::WhileTrue => "while_true",
    }
}

fn policy_str(policy: InterruptPolicy) -> &'static str {
    match policy {
        InterruptPolicy::CancelIncoming => "cancel_incoming",
        InterruptPolicy::CancelRunning => "cancel_running",
    }
}

pub fn run(config: &Path, json: bool) -> anyhow::Result<()> {
    let cfg = super::load_config(config)?;
    let mut triggers = TriggerSet::new();
    let mut table = BindingTable::new();
    standard_bindings(&mut triggers, &mut table, &cfg)?;

    let report = TableReport {
        bindings: table
            .bindings()
            .iter()
            .map(|b| BindingRow {
                behavior: b.template.name.clone(),
                trigger: triggers.describe(b.trigger),
                mode: b.mode,
                policy: b.policy,
                interruptible: b.template.interruptible,
                groups: b.template.groups().to_vec(),
            })
            .collect(),
        defaults: SubsystemGroup::all()
            .iter()
            .filter_map(|&g| table.default_for(g).map(|d| (g, d.name.clone())))
            .collect(),
    };

    if json {
        return print_json(&report);
    }
    print_table(
        &["BEHAVIOR", "TRIGGER", "MODE", "POLICY", "GROUPS"],
        report
            .bindings
            .iter()
            .map(|b| {
                vec![
                    b.behavior.clone(),
                    b.trigger.clone(),
                    mode_str(b.mode).to_string(),
                    policy_str(b.policy).to_string(),
                    b.groups
                        .iter()
                        .map(|g| g.to_string())
                        .collect::<Vec<_>>()
                        .join("+"),
                ]
            })
            .collect(),
    );
    println!();
    print_table(
        &["GROUP", "DEFAULT"],
        report
            .defaults
            .iter()
            .map(|(g, d)| vec![g.to_string(), d.clone()])
            .collect(),
    );
    Ok(())
}
