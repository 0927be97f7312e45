//! Custom Resource Definitions for the addon operator

mod addon;
mod addon_operator;
mod types;

pub use addon::{Addon, AddonPhase, AddonSpec, AddonStatus, AddonStatusCondition, OcmAddonStatus};
pub use addon_operator::{
    AddonOperator, AddonOperatorPhase, AddonOperatorSpec, AddonOperatorStatus,
    ClusterSecretReference, OcmConfig,
};
pub use types::{
    find_condition, remove_condition, set_condition, Condition, ConditionStatus,
    CONDITION_AVAILABLE, CONDITION_PAUSED, CONDITION_UPGRADE_STARTED,
    REASON_ADDON_OPERATOR_READY, REASON_ADDON_PAUSED,
    REASON_FULLY_RECONCILED, REASON_GLOBAL_PAUSE, REASON_OCM_CLIENT_ERROR, REASON_UNREADY_CSV,
    REASON_UPGRADE_STARTED,
};
