use crate::behavior::{load_game_piece, reverse_at_load_height, score_game_piece, Behavior};
use crate::binding::BindingTable;
use crate::condition::keys;
use crate::config::Config;
use crate::error::Result;
use crate::step::{HeadingRef, PoseTarget, RotationSource, SetpointRef, Step, TranslationSource};
use crate::trigger::TriggerSet;
use crate::types::{ActivationMode, ElevatorSetpoint, InterruptPolicy, SubsystemGroup};

const UNJAM_TIMEOUT_S: f64 = 1.0;

/// Wire the standard driver and operator-board bindings. Registration order
/// is dispatch order, so later entries here preempt earlier ones on a
/// same-tick conflict.
pub fn standard_bindings(
    triggers: &mut TriggerSet,
    table: &mut BindingTable,
    cfg: &Config,
) -> Result<()> {
    // -- defaults -----------------------------------------------------------

    table.set_default(
        SubsystemGroup::Drive,
        Behavior::new(
            "operator_drive",
            &[SubsystemGroup::Drive],
            Step::drive(
                TranslationSource::Operator,
                RotationSource::Heading(HeadingRef::Correction),
            ),
        ),
    )?;
    table.set_default(
        SubsystemGroup::Elevator,
        Behavior::new(
            "elevator_stow",
            &[SubsystemGroup::Elevator],
            Step::elevator_to(SetpointRef::Fixed(ElevatorSetpoint::Stow)),
        ),
    )?;
    table.set_default(
        SubsystemGroup::Ejector,
        Behavior::new(
            "ejector_hold",
            &[SubsystemGroup::Ejector],
            Step::stop_ejector(),
        ),
    )?;

    // -- driver -------------------------------------------------------------

    let manual_rotate = triggers.condition(keys::MANUAL_ROTATE);
    table.register(
        manual_rotate,
        ActivationMode::WhileTrue,
        InterruptPolicy::CancelIncoming,
        Behavior::new(
            "manual_drive",
            &[SubsystemGroup::Drive],
            Step::drive(TranslationSource::Operator, RotationSource::Operator),
        ),
    )?;

    let has_piece = triggers.condition(keys::HAS_GAME_PIECE);
    let near_reef = triggers.condition(keys::NEAR_REEF);
    let teleop = triggers.condition(keys::TELEOP);
    let carrying_near_reef = triggers.and(has_piece, near_reef);
    let face_reef = triggers.and(carrying_near_reef, teleop);
    table.register(
        face_reef,
        ActivationMode::WhileTrue,
        InterruptPolicy::CancelRunning,
        Behavior::new(
            "face_reef_drive",
            &[SubsystemGroup::Drive],
            Step::drive(
                TranslationSource::Operator,
                RotationSource::Heading(HeadingRef::TowardReef),
            ),
        ),
    )?;

    let left_trigger = triggers.condition(keys::DRIVER_LEFT_TRIGGER);
    table.register(
        left_trigger,
        ActivationMode::WhileTrue,
        InterruptPolicy::CancelRunning,
        Behavior::new(
            "face_left_station",
            &[SubsystemGroup::Drive],
            Step::drive(
                TranslationSource::Operator,
                RotationSource::Heading(HeadingRef::Fixed(cfg.drive.left_station_heading_rad)),
            ),
        ),
    )?;
    let right_trigger = triggers.condition(keys::DRIVER_RIGHT_TRIGGER);
    table.register(
        right_trigger,
        ActivationMode::WhileTrue,
        InterruptPolicy::CancelRunning,
        Behavior::new(
            "face_right_station",
            &[SubsystemGroup::Drive],
            Step::drive(
                TranslationSource::Operator,
                RotationSource::Heading(HeadingRef::Fixed(cfg.drive.right_station_heading_rad)),
            ),
        ),
    )?;

    let right_bumper = triggers.condition(keys::DRIVER_RIGHT_BUMPER);
    let waypoint_selected = triggers.condition(keys::WAYPOINT_SELECTED);
    let assist = triggers.and(right_bumper, waypoint_selected);
    table.register(
        assist,
        ActivationMode::WhileTrue,
        InterruptPolicy::CancelRunning,
        Behavior::new(
            "assist_to_waypoint",
            &[SubsystemGroup::Drive],
            Step::sequence(vec![
                Step::drive_to_pose(PoseTarget::Selected, cfg.drive.to_pose_timeout_s),
                Step::brake(),
            ]),
        ),
    )?;

    // -- operator board -----------------------------------------------------

    let go = triggers.condition(keys::BOARD_GO);
    let load_left = triggers.condition(keys::BOARD_LOAD_LEFT);
    let load_right = triggers.condition(keys::BOARD_LOAD_RIGHT);
    let any_load = triggers.or(load_left, load_right);
    let load_requested = triggers.and(go, any_load);
    table.register(
        load_requested,
        ActivationMode::WhileTrue,
        InterruptPolicy::CancelRunning,
        Behavior::new(
            "load",
            &[SubsystemGroup::Elevator, SubsystemGroup::Ejector],
            load_game_piece(cfg),
        ),
    )?;

    // Both load switches at once back the piece out first, then re-intake.
    // Registered after the plain load binding so it wins while both are held.
    let both_loads = triggers.and(load_left, load_right);
    let unjam_requested = triggers.and(go, both_loads);
    table.register(
        unjam_requested,
        ActivationMode::WhileTrue,
        InterruptPolicy::CancelRunning,
        Behavior::new(
            "unjam_then_load",
            &[SubsystemGroup::Elevator, SubsystemGroup::Ejector],
            Step::sequence(vec![
                reverse_at_load_height(cfg).with_timeout(UNJAM_TIMEOUT_S),
                load_game_piece(cfg),
            ]),
        ),
    )?;

    let score_requested = triggers.and(go, waypoint_selected);
    table.register(
        score_requested,
        ActivationMode::OnRise,
        InterruptPolicy::CancelIncoming,
        Behavior::new(
            "score",
            &[SubsystemGroup::Elevator, SubsystemGroup::Ejector],
            score_game_piece(cfg, SetpointRef::Selected),
        )
        .non_interruptible(),
    )?;

    let elevator_brake = triggers.condition(keys::BOARD_ELEVATOR_BRAKE);
    table.register(
        elevator_brake,
        ActivationMode::WhileTrue,
        InterruptPolicy::CancelIncoming,
        Behavior::new(
            "elevator_brake",
            &[SubsystemGroup::Elevator],
            // Claims the elevator and commands nothing, so the mechanism
            // holds at its last position.
            Step::wait(f64::INFINITY),
        ),
    )?;

    table.freeze()?;
    Ok(())
}
