use std::collections::BTreeMap;

use crate::behavior::Behavior;
use crate::error::{CadenceError, Result};
use crate::trigger::{TriggerId, TriggerSet};
use crate::types::{ActivationMode, InterruptPolicy, SubsystemGroup};

/// One registered trigger-to-behavior association.
#[derive(Debug, Clone)]
pub struct Binding {
    pub trigger: TriggerId,
    pub mode: ActivationMode,
    pub policy: InterruptPolicy,
    pub template: Behavior,
}

/// The behavior binding table. Bindings and group defaults are registered
/// during setup, then the table freezes on the first tick; registration
/// order is dispatch order, so a later binding wins a same-tick conflict
/// with an earlier one.
#[derive(Debug, Default)]
pub struct BindingTable {
    bindings: Vec<Binding>,
    defaults: BTreeMap<SubsystemGroup, Behavior>,
    frozen: bool,
}

impl BindingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        trigger: TriggerId,
        mode: ActivationMode,
        policy: InterruptPolicy,
        template: Behavior,
    ) -> Result<usize> {
        if self.frozen {
            return Err(CadenceError::TableFrozen);
        }
        self.bindings.push(Binding {
            trigger,
            mode,
            policy,
            template,
        });
        Ok(self.bindings.len() - 1)
    }

    /// The default must claim exactly the group it backs, so filling an
    /// idle group can never steal another one.
    pub fn set_default(&mut self, group: SubsystemGroup, template: Behavior) -> Result<()> {
        if self.frozen {
            return Err(CadenceError::TableFrozen);
        }
        if template.groups() != [group] {
            return Err(CadenceError::InvalidGroup(format!(
                "default for {group} must claim exactly that group"
            )));
        }
        self.defaults.insert(group, template);
        Ok(())
    }

    /// Close the table for registration. Every subsystem group needs a
    /// default so nothing is ever left uncommanded.
    pub fn freeze(&mut self) -> Result<()> {
        for group in SubsystemGroup::all() {
            if !self.defaults.contains_key(group) {
                return Err(CadenceError::MissingDefault(group.to_string()));
            }
        }
        self.frozen = true;
        Ok(())
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn binding(&self, index: usize) -> &Binding {
        &self.bindings[index]
    }

    pub fn default_for(&self, group: SubsystemGroup) -> Option<&Behavior> {
        self.defaults.get(&group)
    }

    /// Indices of bindings requesting activation this tick, in registration
    /// order. On-rise bindings fire on the trigger's rising edge only;
    /// while-true bindings request on every tick the trigger holds.
    pub fn fired(&self, triggers: &TriggerSet) -> Vec<usize> {
        self.bindings
            .iter()
            .enumerate()
            .filter(|(_, b)| match b.mode {
                ActivationMode::OnRise => triggers.rose(b.trigger),
                ActivationMode::WhileTrue => triggers.value(b.trigger),
            })
            .map(|(i, _)| i)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::ConditionSet;
    use crate::step::Step;

    fn drive_behavior(name: &str) -> Behavior {
        Behavior::new(name, &[SubsystemGroup::Drive], Step::brake())
    }

    fn table_with_defaults() -> BindingTable {
        let mut table = BindingTable::new();
        table
            .set_default(SubsystemGroup::Drive, drive_behavior("drive_default"))
            .unwrap();
        table
            .set_default(
                SubsystemGroup::Elevator,
                Behavior::new("stow", &[SubsystemGroup::Elevator], Step::brake()),
            )
            .unwrap();
        table
            .set_default(
                SubsystemGroup::Ejector,
                Behavior::new("hold", &[SubsystemGroup::Ejector], Step::stop_ejector()),
            )
            .unwrap();
        table
    }

    #[test]
    fn register_after_freeze_fails() {
        let mut table = table_with_defaults();
        let mut triggers = TriggerSet::new();
        let t = triggers.condition("go");
        table.freeze().unwrap();
        let err = table
            .register(
                t,
                ActivationMode::OnRise,
                InterruptPolicy::CancelRunning,
                drive_behavior("late"),
            )
            .unwrap_err();
        assert!(matches!(err, CadenceError::TableFrozen));
    }

    #[test]
    fn freeze_requires_all_defaults() {
        let mut table = BindingTable::new();
        table
            .set_default(SubsystemGroup::Drive, drive_behavior("only_drive"))
            .unwrap();
        let err = table.freeze().unwrap_err();
        assert!(matches!(err, CadenceError::MissingDefault(_)));
        assert!(!table.is_frozen());
    }

    #[test]
    fn default_must_match_group() {
        let mut table = BindingTable::new();
        let wide = Behavior::new(
            "wide",
            &[SubsystemGroup::Drive, SubsystemGroup::Elevator],
            Step::brake(),
        );
        let err = table.set_default(SubsystemGroup::Drive, wide).unwrap_err();
        assert!(matches!(err, CadenceError::InvalidGroup(_)));
    }

    #[test]
    fn fired_respects_activation_mode() {
        let mut table = table_with_defaults();
        let mut triggers = TriggerSet::new();
        let go = triggers.condition("go");
        let hold = triggers.condition("hold");
        table
            .register(
                go,
                ActivationMode::OnRise,
                InterruptPolicy::CancelRunning,
                drive_behavior("pulse"),
            )
            .unwrap();
        table
            .register(
                hold,
                ActivationMode::WhileTrue,
                InterruptPolicy::CancelRunning,
                drive_behavior("held"),
            )
            .unwrap();
        table.freeze().unwrap();

        let mut conds = ConditionSet::new();
        conds.set("go", true);
        conds.set("hold", true);
        triggers.refresh(&conds);
        assert_eq!(table.fired(&triggers), vec![0, 1]);

        // Second tick: the pulse binding drops out, the held one stays.
        triggers.refresh(&conds);
        assert_eq!(table.fired(&triggers), vec![1]);
    }
}
