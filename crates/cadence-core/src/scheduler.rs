use crate::alert::{AlertLevel, AlertRegistry};
use crate::auto::{self, RoutineId};
use crate::behavior::Behavior;
use crate::binding::BindingTable;
use crate::board::{self, BoardState};
use crate::condition::{keys, ConditionSet};
use crate::config::Config;
use crate::error::Result;
use crate::geometry::FieldMap;
use crate::io_frames::{ActuatorFrame, DriverAxes, InputFrame, Observations};
use crate::trigger::TriggerSet;
use crate::types::{ActivationMode, Alliance, InterruptPolicy, RobotMode, SubsystemGroup};

// ---------------------------------------------------------------------------
// Active behaviors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
enum ActivationSource {
    Binding(usize),
    Default(SubsystemGroup),
    Auto,
}

#[derive(Debug)]
struct ActiveBehavior {
    behavior: Behavior,
    policy: InterruptPolicy,
    source: ActivationSource,
}

impl ActiveBehavior {
    fn protected(&self) -> bool {
        !self.behavior.interruptible || self.policy == InterruptPolicy::CancelIncoming
    }

    fn is_default(&self) -> bool {
        matches!(self.source, ActivationSource::Default(_))
    }
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Per-tick arbitration core. One `tick` call runs the fixed pipeline:
/// condition sampling, trigger refresh, binding dispatch, active step
/// updates, completion sweep, default refill. Subsystem group claims are
/// exclusive at every point in between.
#[derive(Debug)]
pub struct Scheduler {
    cfg: Config,
    map: FieldMap,
    conditions: ConditionSet,
    triggers: TriggerSet,
    table: BindingTable,
    actives: Vec<ActiveBehavior>,
    alerts: AlertRegistry,
    alliance: Option<Alliance>,
    armed: Option<RoutineId>,
    last_mode: RobotMode,
    ticks: u64,
}

impl Scheduler {
    /// Scheduler with the standard driver and operator-board wiring.
    pub fn new(cfg: Config) -> Result<Self> {
        Self::with_wiring(cfg, crate::teleop::standard_bindings)
    }

    /// Scheduler with caller-supplied wiring. The wiring function must
    /// leave the table frozen.
    pub fn with_wiring(
        cfg: Config,
        wire: impl FnOnce(&mut TriggerSet, &mut BindingTable, &Config) -> Result<()>,
    ) -> Result<Self> {
        let map = FieldMap::new(&cfg.field);
        let mut triggers = TriggerSet::new();
        let mut table = BindingTable::new();
        wire(&mut triggers, &mut table, &cfg)?;
        Ok(Self {
            cfg,
            map,
            conditions: ConditionSet::new(),
            triggers,
            table,
            actives: Vec::new(),
            alerts: AlertRegistry::new(),
            alliance: None,
            armed: None,
            last_mode: RobotMode::Disabled,
            ticks: 0,
        })
    }

    // -- accessors ----------------------------------------------------------

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn field_map(&self) -> &FieldMap {
        &self.map
    }

    pub fn alerts(&self) -> &AlertRegistry {
        &self.alerts
    }

    pub fn alliance(&self) -> Option<Alliance> {
        self.alliance
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn armed_routine(&self) -> Option<RoutineId> {
        self.armed
    }

    /// Names and active step paths of the currently running behaviors, in
    /// activation order.
    pub fn active_behaviors(&self) -> Vec<(String, Option<String>)> {
        self.actives
            .iter()
            .map(|a| (a.behavior.name.clone(), a.behavior.root.active_path()))
            .collect()
    }

    pub fn status(&self) -> crate::telemetry::TickStatus {
        crate::telemetry::TickStatus {
            tick: self.ticks,
            mode: self.last_mode,
            alliance: self.alliance,
            armed_routine: self.armed,
            active: self
                .actives
                .iter()
                .map(|a| crate::telemetry::ActiveStatus {
                    name: a.behavior.name.clone(),
                    path: a.behavior.root.active_path(),
                    groups: a.behavior.groups().to_vec(),
                })
                .collect(),
            triggers: self
                .triggers
                .ids()
                .map(|id| crate::telemetry::TriggerStatus {
                    expr: self.triggers.describe(id),
                    value: self.triggers.value(id),
                    rose: self.triggers.rose(id),
                    fell: self.triggers.fell(id),
                })
                .collect(),
            alerts: self
                .alerts
                .active()
                .map(|(key, alert)| crate::telemetry::AlertStatus {
                    key: key.to_string(),
                    level: alert.level,
                    message: alert.message.clone(),
                })
                .collect(),
        }
    }

    pub fn group_owner(&self, group: SubsystemGroup) -> Option<&str> {
        self.actives
            .iter()
            .find(|a| a.behavior.claims(group))
            .map(|a| a.behavior.name.as_str())
    }

    // -- routine arming -----------------------------------------------------

    pub fn arm_routine(&mut self, id: RoutineId) {
        tracing::info!(routine = %id, "routine armed");
        self.armed = Some(id);
    }

    pub fn disarm_routine(&mut self) {
        self.armed = None;
    }

    // -- tick ---------------------------------------------------------------

    pub fn tick(&mut self, input: &InputFrame, out: &mut ActuatorFrame) {
        out.clear();
        self.ticks += 1;

        if self.alliance.is_none() {
            if let Some(a) = input.alliance {
                tracing::info!(alliance = %a, "alliance latched");
                self.alliance = Some(a);
                self.alerts.clear("alliance-assumed-blue");
            }
        }

        let board = board::decode(&input.board);
        self.sample_conditions(input, &board);
        self.triggers.refresh(&self.conditions);

        let mode = input.mode;
        let changed = mode != self.last_mode;
        self.last_mode = mode;

        if mode == RobotMode::Disabled {
            if !self.actives.is_empty() {
                tracing::debug!("disabled: ending all active behaviors");
                for a in &mut self.actives {
                    a.behavior.root.end();
                }
                self.actives.clear();
            }
            return;
        }

        if changed {
            match mode {
                RobotMode::Autonomous => self.start_armed_routine(input.now),
                RobotMode::Teleop => self.end_auto(),
                RobotMode::Disabled => unreachable!(),
            }
        }

        if mode == RobotMode::Teleop {
            self.dispatch(input.now, &board);
        }
        self.fill_defaults(input.now);

        // Update phase: every active runs its side effects, then its
        // completion check, against one consistent snapshot.
        let alliance = self.alliance.unwrap_or(Alliance::Blue);
        let db = self.cfg.drive.joystick_deadband;
        let obs = Observations {
            now: input.now,
            has_game_piece: self.conditions.get(keys::HAS_GAME_PIECE),
            elevator_height: input.elevator_height,
            pose: input.pose,
            driver: DriverAxes {
                vx: input.driver.velocity_x(db),
                vy: input.driver.velocity_y(db),
                omega: input.driver.velocity_rotation(db),
            },
            heading_correction: input.heading_correction,
            reef_heading: input.pose.map(|p| self.map.heading_toward_reef(p, alliance)),
            selected_waypoint: board
                .waypoint
                .and_then(|(face, side)| self.map.resolve(face, side, alliance)),
            selected_setpoint: board.setpoint,
            heights: self.cfg.elevator.heights,
            elevator_tolerance: self.cfg.elevator.tolerance_m,
            pose_xy_tolerance: self.cfg.drive.pose_xy_tolerance_m,
            pose_heading_tolerance: self.cfg.drive.pose_heading_tolerance_rad,
            conditions: &self.conditions,
        };
        for active in &mut self.actives {
            active.behavior.root.update(&obs, out);
        }

        // Completion sweep. Groups released here pick their defaults back
        // up now and take their first update next tick.
        self.actives.retain(|a| {
            let done = a.behavior.root.is_complete();
            if done {
                tracing::debug!(behavior = %a.behavior.name, "behavior complete");
            }
            !done
        });
        self.fill_defaults(input.now);
    }

    // -- internals ----------------------------------------------------------

    fn sample_conditions(&mut self, input: &InputFrame, board: &BoardState) {
        let c = &mut self.conditions;
        let alerts = &mut self.alerts;
        let alliance = self.alliance.unwrap_or(Alliance::Blue);

        c.sample(
            keys::HAS_GAME_PIECE,
            input
                .piece_distance_mm
                .map(|d| d < self.cfg.ejector.piece_threshold_mm),
            alerts,
        );
        c.sample(
            keys::NEAR_REEF,
            input
                .pose
                .map(|p| self.map.distance_from_reef(p, alliance) < self.cfg.drive.near_reef_m),
            alerts,
        );
        if input.elevator_height.is_none() {
            alerts.set(
                "missing-input:elevator_height",
                AlertLevel::Warning,
                "elevator height unavailable",
            );
        } else {
            alerts.clear("missing-input:elevator_height");
        }

        c.set(keys::AT_POSE, input.at_pose.unwrap_or(false));
        c.set(keys::TELEOP, input.mode == RobotMode::Teleop);

        let db = self.cfg.drive.joystick_deadband;
        c.set(
            keys::MANUAL_ROTATE,
            input.driver.velocity_rotation(db) != 0.0,
        );
        c.set(keys::DRIVER_LEFT_TRIGGER, input.driver.left_trigger);
        c.set(keys::DRIVER_RIGHT_TRIGGER, input.driver.right_trigger);
        c.set(keys::DRIVER_RIGHT_BUMPER, input.driver.right_bumper);

        c.set(keys::BOARD_GO, board.go);
        c.set(keys::BOARD_LOAD_LEFT, board.load_left);
        c.set(keys::BOARD_LOAD_RIGHT, board.load_right);
        c.set(keys::BOARD_ELEVATOR_BRAKE, board.elevator_brake);
        c.set(keys::WAYPOINT_SELECTED, board.waypoint.is_some());

        for (key, value) in &input.extra_conditions {
            c.sample(key, *value, alerts);
        }
    }

    fn start_armed_routine(&mut self, now: f64) {
        let Some(id) = self.armed else {
            tracing::warn!("autonomous entered with no routine armed");
            self.alerts.set(
                "no-routine-armed",
                AlertLevel::Warning,
                "autonomous started without an armed routine",
            );
            return;
        };
        self.alerts.clear("no-routine-armed");
        for a in &mut self.actives {
            a.behavior.root.end();
        }
        self.actives.clear();

        let mut behavior = auto::build(id, self.alliance, &self.map, &self.cfg, &mut self.alerts);
        tracing::info!(routine = %id, behavior = %behavior.name, "starting routine");
        behavior.root.start(now);
        self.actives.push(ActiveBehavior {
            behavior,
            policy: InterruptPolicy::CancelIncoming,
            source: ActivationSource::Auto,
        });
    }

    fn end_auto(&mut self) {
        self.actives.retain_mut(|a| {
            if a.source == ActivationSource::Auto {
                tracing::debug!(behavior = %a.behavior.name, "routine ended on teleop entry");
                a.behavior.root.end();
                false
            } else {
                true
            }
        });
    }

    fn dispatch(&mut self, now: f64, board: &BoardState) {
        let alliance = self.alliance.unwrap_or(Alliance::Blue);
        let selected_waypoint = board
            .waypoint
            .and_then(|(face, side)| self.map.resolve(face, side, alliance));
        // Retire while-true activations whose trigger dropped.
        self.actives.retain_mut(|a| {
            if let ActivationSource::Binding(idx) = a.source {
                let b = self.table.binding(idx);
                if b.mode == ActivationMode::WhileTrue && !self.triggers.value(b.trigger) {
                    a.behavior.root.end();
                    return false;
                }
            }
            true
        });

        let fired = self.table.fired(&self.triggers);
        for (pos, &idx) in fired.iter().enumerate() {
            // Among simultaneously requested bindings with overlapping
            // claims only the last registered one is a candidate, so the
            // winner keeps running across ticks instead of trading starts
            // with a shadowed earlier binding.
            let shadowed = fired[pos + 1..].iter().any(|&later| {
                self.table
                    .binding(later)
                    .template
                    .conflicts_with(&self.table.binding(idx).template)
            });
            if shadowed {
                continue;
            }
            let already_running = self
                .actives
                .iter()
                .any(|a| a.source == ActivationSource::Binding(idx));
            if already_running {
                continue;
            }
            let binding = self.table.binding(idx).clone();

            let owners: Vec<usize> = self
                .actives
                .iter()
                .enumerate()
                .filter(|(_, a)| a.behavior.conflicts_with(&binding.template))
                .map(|(i, _)| i)
                .collect();
            // Defaults always yield; any other protected owner rejects the
            // incoming activation outright.
            let blocked = owners
                .iter()
                .any(|&i| !self.actives[i].is_default() && self.actives[i].protected());
            if blocked {
                tracing::debug!(behavior = %binding.template.name, "activation rejected");
                continue;
            }
            for &i in owners.iter().rev() {
                self.actives[i].behavior.root.end();
                self.actives.remove(i);
            }
            let mut instance = binding.template.clone();
            // Board selections are captured at activation; a running
            // instance never retargets mid-run.
            instance.root.bind_selection(board.setpoint, selected_waypoint);
            tracing::debug!(behavior = %instance.name, "behavior activated");
            instance.root.start(now);
            self.actives.push(ActiveBehavior {
                behavior: instance,
                policy: binding.policy,
                source: ActivationSource::Binding(idx),
            });
        }
    }

    fn fill_defaults(&mut self, now: f64) {
        for group in SubsystemGroup::all() {
            let owned = self.actives.iter().any(|a| a.behavior.claims(*group));
            if owned {
                continue;
            }
            if let Some(template) = self.table.default_for(*group) {
                let mut instance = template.clone();
                instance.root.start(now);
                self.actives.push(ActiveBehavior {
                    behavior: instance,
                    policy: InterruptPolicy::CancelRunning,
                    source: ActivationSource::Default(*group),
                });
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
