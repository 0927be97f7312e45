//! Shared types used across addon operator CRDs

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Condition type reported while an Addon is fully available
pub const CONDITION_AVAILABLE: &str = "Available";
/// Condition type reported while an Addon upgrade is in progress
pub const CONDITION_UPGRADE_STARTED: &str = "UpgradeStarted";
/// Condition type reported while reconciliation is paused
pub const CONDITION_PAUSED: &str = "Paused";

/// The Addon has been fully reconciled
pub const REASON_FULLY_RECONCILED: &str = "FullyReconciled";
/// The Addon's ClusterServiceVersion is not ready yet
pub const REASON_UNREADY_CSV: &str = "UnreadyCSV";
/// An upgrade of the Addon has started
pub const REASON_UPGRADE_STARTED: &str = "AddonUpgradeStarted";
/// The Addon is paused, either by itself or globally
pub const REASON_ADDON_PAUSED: &str = "AddonPaused";
/// The AddonOperator enabled the global pause
pub const REASON_GLOBAL_PAUSE: &str = "GlobalPause";
/// The AddonOperator is up and serving
pub const REASON_ADDON_OPERATOR_READY: &str = "AddonOperatorReady";
/// The OCM client could not be configured from the AddonOperator
pub const REASON_OCM_CLIENT_ERROR: &str = "OCMClientError";

/// Condition status following Kubernetes conventions
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq, Hash)]
pub enum ConditionStatus {
    /// Condition is true
    True,
    /// Condition is false
    False,
    /// Condition status is unknown
    #[default]
    Unknown,
}

impl std::fmt::Display for ConditionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::True => write!(f, "True"),
            Self::False => write!(f, "False"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Kubernetes-style condition for status reporting
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct Condition {
    /// Type of condition (e.g., Available, Paused)
    #[serde(rename = "type")]
    pub type_: String,

    /// Status of the condition (True, False, Unknown)
    pub status: ConditionStatus,

    /// Machine-readable reason for the condition
    pub reason: String,

    /// Human-readable message
    #[serde(default)]
    pub message: String,

    /// Last time the condition transitioned
    #[serde(rename = "lastTransitionTime")]
    pub last_transition_time: DateTime<Utc>,
}

impl Condition {
    /// Create a new condition with the current timestamp
    pub fn new(
        type_: impl Into<String>,
        status: ConditionStatus,
        reason: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            type_: type_.into(),
            status,
            reason: reason.into(),
            message: message.into(),
            last_transition_time: Utc::now(),
        }
    }

    /// Whether this condition has status True
    pub fn is_true(&self) -> bool {
        self.status == ConditionStatus::True
    }
}

/// Find the condition with the given type
pub fn find_condition<'a>(conditions: &'a [Condition], type_: &str) -> Option<&'a Condition> {
    conditions.iter().find(|c| c.type_ == type_)
}

/// Insert or replace the condition with the same type
///
/// The previous `last_transition_time` is kept when the status did not change,
/// so re-asserting a condition on every reconcile does not churn the status.
pub fn set_condition(conditions: &mut Vec<Condition>, mut condition: Condition) {
    match conditions.iter_mut().find(|c| c.type_ == condition.type_) {
        Some(existing) => {
            if existing.status == condition.status {
                condition.last_transition_time = existing.last_transition_time;
            }
            *existing = condition;
        }
        None => conditions.push(condition),
    }
}

/// Remove the condition with the given type, returning whether one was present
pub fn remove_condition(conditions: &mut Vec<Condition>, type_: &str) -> bool {
    let before = conditions.len();
    conditions.retain(|c| c.type_ != type_);
    conditions.len() != before
}
