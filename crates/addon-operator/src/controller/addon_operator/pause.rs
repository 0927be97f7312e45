//! Global pause state machine
//!
//! The `Paused` condition on the AddonOperator is the only state. It is set
//! after the global pause option was enabled and removed after it was disabled,
//! so the option's side effect runs at most once per transition no matter how
//! often the resource is reconciled.

use tracing::info;

use addon_common::crd::{
    find_condition, remove_condition, set_condition, Condition, ConditionStatus,
    CONDITION_PAUSED, REASON_GLOBAL_PAUSE,
};
use addon_common::runtime_options::RuntimeOption;
use addon_common::Error;

/// What a pass must do to bring the pause option in line with `spec.paused`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PauseAction {
    /// Enable the option, then record `Paused=True`
    Enable,
    /// Disable the option, then remove `Paused`
    Disable,
    /// Drop a `Paused` condition that is not True without touching the option
    ClearStale,
    /// Already converged
    None,
}

/// Decide the pause transition from the desired state and the current condition
pub fn determine_pause_action(desired_paused: bool, paused: Option<&Condition>) -> PauseAction {
    let is_paused = paused.is_some_and(Condition::is_true);
    match (desired_paused, is_paused, paused.is_some()) {
        (true, false, _) => PauseAction::Enable,
        (true, true, _) => PauseAction::None,
        (false, true, _) => PauseAction::Disable,
        (false, false, true) => PauseAction::ClearStale,
        (false, false, false) => PauseAction::None,
    }
}

/// Whether a previous pass left the global pause enabled
///
/// Used at startup to restore the in-process option, which otherwise starts
/// out disabled while the persisted condition still says `Paused=True`.
pub fn persisted_pause(conditions: &[Condition]) -> bool {
    find_condition(conditions, CONDITION_PAUSED).is_some_and(Condition::is_true)
}

/// Converge the global pause option with `desired_paused`
///
/// `conditions` is only modified after the option call succeeded. Returns the
/// action taken.
pub async fn handle_global_pause(
    option: &dyn RuntimeOption,
    desired_paused: bool,
    conditions: &mut Vec<Condition>,
) -> Result<PauseAction, Error> {
    let action = determine_pause_action(
        desired_paused,
        find_condition(conditions, CONDITION_PAUSED),
    );

    match action {
        PauseAction::Enable => {
            option.enable().await?;
            set_condition(
                conditions,
                Condition::new(
                    CONDITION_PAUSED,
                    ConditionStatus::True,
                    REASON_GLOBAL_PAUSE,
                    "Addon reconciliation is paused",
                ),
            );
            info!("Global pause enabled");
        }
        PauseAction::Disable => {
            option.disable().await?;
            remove_condition(conditions, CONDITION_PAUSED);
            info!("Global pause disabled");
        }
        PauseAction::ClearStale => {
            remove_condition(conditions, CONDITION_PAUSED);
            info!("Removed stale Paused condition");
        }
        PauseAction::None => {}
    }

    Ok(action)
}
