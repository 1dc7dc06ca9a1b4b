use crate::condition::ConditionSet;
use serde::Serialize;
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// TriggerId / TriggerExpr
// ---------------------------------------------------------------------------

/// Handle into a `TriggerSet` arena. Combinators compose by id, never by
/// copying, so every node is evaluated exactly once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TriggerId(usize);

#[derive(Debug, Clone)]
enum TriggerExpr {
    Condition(String),
    And(TriggerId, TriggerId),
    Or(TriggerId, TriggerId),
    Not(TriggerId),
}

#[derive(Debug, Clone)]
struct TriggerNode {
    expr: TriggerExpr,
    /// Value as of the last completed refresh; the one bit of history.
    value: bool,
    rose: bool,
    fell: bool,
}

// ---------------------------------------------------------------------------
// TriggerSet
// ---------------------------------------------------------------------------

/// Edge-aware triggers over a `ConditionSet`.
///
/// Operands always have smaller ids than the nodes built from them, so one
/// in-order pass through the arena recomputes every value from fresh
/// operand values. A combinator's edge comes from its own combined value:
/// `a.and(b)` rises on the first tick both are true, regardless of which
/// operand changed.
#[derive(Debug, Clone, Default)]
pub struct TriggerSet {
    nodes: Vec<TriggerNode>,
    by_condition: HashMap<String, TriggerId>,
}

impl TriggerSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, expr: TriggerExpr) -> TriggerId {
        self.nodes.push(TriggerNode {
            expr,
            value: false,
            rose: false,
            fell: false,
        });
        TriggerId(self.nodes.len() - 1)
    }

    /// Trigger on a named condition. Repeated calls for the same name share
    /// one node.
    pub fn condition(&mut self, name: &str) -> TriggerId {
        if let Some(id) = self.by_condition.get(name) {
            return *id;
        }
        let id = self.push(TriggerExpr::Condition(name.to_string()));
        self.by_condition.insert(name.to_string(), id);
        id
    }

    pub fn and(&mut self, a: TriggerId, b: TriggerId) -> TriggerId {
        self.push(TriggerExpr::And(a, b))
    }

    pub fn or(&mut self, a: TriggerId, b: TriggerId) -> TriggerId {
        self.push(TriggerExpr::Or(a, b))
    }

    pub fn negate(&mut self, a: TriggerId) -> TriggerId {
        self.push(TriggerExpr::Not(a))
    }

    /// Recompute every node once, in arena order, then derive edges from
    /// the one bit of history each node keeps. Must run after the condition
    /// refresh and before binding dispatch on the same tick.
    pub fn refresh(&mut self, conditions: &ConditionSet) {
        for i in 0..self.nodes.len() {
            let value = match &self.nodes[i].expr {
                TriggerExpr::Condition(name) => conditions.get(name),
                TriggerExpr::And(a, b) => self.nodes[a.0].value && self.nodes[b.0].value,
                TriggerExpr::Or(a, b) => self.nodes[a.0].value || self.nodes[b.0].value,
                TriggerExpr::Not(a) => !self.nodes[a.0].value,
            };
            let node = &mut self.nodes[i];
            node.rose = value && !node.value;
            node.fell = !value && node.value;
            node.value = value;
        }
    }

    pub fn value(&self, id: TriggerId) -> bool {
        self.nodes[id.0].value
    }

    pub fn rose(&self, id: TriggerId) -> bool {
        self.nodes[id.0].rose
    }

    pub fn fell(&self, id: TriggerId) -> bool {
        self.nodes[id.0].fell
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Human-readable expression for telemetry.
    pub fn describe(&self, id: TriggerId) -> String {
        match &self.nodes[id.0].expr {
            TriggerExpr::Condition(name) => name.clone(),
            TriggerExpr::And(a, b) => format!("({} & {})", self.describe(*a), self.describe(*b)),
            TriggerExpr::Or(a, b) => format!("({} | {})", self.describe(*a), self.describe(*b)),
            TriggerExpr::Not(a) => format!("!{}", self.describe(*a)),
        }
    }

    pub fn ids(&self) -> impl Iterator<Item = TriggerId> {
        (0..self.nodes.len()).map(TriggerId)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::AlertRegistry;

    fn tick(set: &mut TriggerSet, conds: &mut ConditionSet, values: &[(&str, bool)]) {
        for (k, v) in values {
            conds.set(k, *v);
        }
        set.refresh(conds);
    }

    #[test]
    fn and_or_truth_tables() {
        let mut set = TriggerSet::new();
        let mut conds = ConditionSet::new();
        let a = set.condition("a");
        let b = set.condition("b");
        let and = set.and(a, b);
        let or = set.or(a, b);

        for (va, vb) in [(false, false), (false, true), (true, false), (true, true)] {
            tick(&mut set, &mut conds, &[("a", va), ("b", vb)]);
            assert_eq!(set.value(and), va && vb);
            assert_eq!(set.value(or), va || vb);
        }
    }

    #[test]
    fn double_negation_is_identity() {
        let mut set = TriggerSet::new();
        let mut conds = ConditionSet::new();
        let a = set.condition("a");
        let not = set.negate(a);
        let not_not = set.negate(not);

        for v in [false, true, true, false] {
            tick(&mut set, &mut conds, &[("a", v)]);
            assert_eq!(set.value(not_not), set.value(a));
        }
    }

    #[test]
    fn single_tick_pulse_edges() {
        let mut set = TriggerSet::new();
        let mut conds = ConditionSet::new();
        let a = set.condition("a");

        tick(&mut set, &mut conds, &[("a", false)]);
        assert!(!set.rose(a) && !set.fell(a));

        tick(&mut set, &mut conds, &[("a", true)]);
        assert!(set.rose(a));
        assert!(!set.fell(a));

        tick(&mut set, &mut conds, &[("a", false)]);
        assert!(!set.rose(a));
        assert!(set.fell(a));

        tick(&mut set, &mut conds, &[("a", false)]);
        assert!(!set.rose(a) && !set.fell(a));
    }

    #[test]
    fn combined_edge_from_combined_value() {
        let mut set = TriggerSet::new();
        let mut conds = ConditionSet::new();
        let a = set.condition("a");
        let b = set.condition("b");
        let and = set.and(a, b);

        // a rises first; the AND must not rise until b joins it.
        tick(&mut set, &mut conds, &[("a", true), ("b", false)]);
        assert!(set.rose(a));
        assert!(!set.rose(and));

        tick(&mut set, &mut conds, &[("a", true), ("b", true)]);
        assert!(!set.rose(a));
        assert!(set.rose(and));

        tick(&mut set, &mut conds, &[("a", false), ("b", true)]);
        assert!(set.fell(and));
    }

    #[test]
    fn condition_nodes_dedupe() {
        let mut set = TriggerSet::new();
        let a1 = set.condition("a");
        let a2 = set.condition("a");
        assert_eq!(a1, a2);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn true_at_startup_rises_on_first_refresh() {
        let mut set = TriggerSet::new();
        let mut conds = ConditionSet::new();
        let mut alerts = AlertRegistry::new();
        let a = set.condition("a");
        conds.sample("a", Some(true), &mut alerts);
        set.refresh(&conds);
        assert!(set.rose(a));
    }

    #[test]
    fn describe_nests() {
        let mut set = TriggerSet::new();
        let a = set.condition("go");
        let b = set.condition("left");
        let c = set.condition("right");
        let or = set.or(b, c);
        let and = set.and(a, or);
        assert_eq!(set.describe(and), "(go & (left | right))");
    }
}
