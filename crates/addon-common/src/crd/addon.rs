//! Addon CRD
//!
//! An Addon is a managed piece of software installed onto the cluster. Its
//! conditions are mirrored to the OCM addon status service, and the last
//! status OCM confirmed is cached in `status.reportedStatus`.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::types::{Condition, ConditionStatus};

/// Addon specification
///
/// Example:
/// ```yaml
/// apiVersion: addons.managed.openshift.io/v1alpha1
/// kind: Addon
/// metadata:
///   name: reference-addon
/// spec:
///   correlationID: "c0f5e9d2"
///   paused: false
/// ```
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "addons.managed.openshift.io",
    version = "v1alpha1",
    kind = "Addon",
    status = "AddonStatus",
    derive = "PartialEq",
    printcolumn = r#"{"name":"Phase","type":"string","jsonPath":".status.phase"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct AddonSpec {
    /// Identifier correlating this installation with the OCM request that created it
    #[serde(rename = "correlationID", default)]
    pub correlation_id: String,

    /// Pause reconciliation of this Addon only
    #[serde(default)]
    pub paused: bool,
}

/// Addon lifecycle phase
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum AddonPhase {
    /// Addon has not been reconciled yet
    #[default]
    Pending,
    /// Addon is reconciled and available
    Ready,
    /// Reconciliation is paused
    Paused,
}

/// Addon status
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AddonStatus {
    /// Generation last processed by the controller
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,

    /// Current phase
    #[serde(default)]
    pub phase: AddonPhase,

    /// Conditions representing the Addon state
    #[serde(default)]
    pub conditions: Vec<Condition>,

    /// Status most recently confirmed by the OCM addon status service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reported_status: Option<OcmAddonStatus>,
}

/// Snapshot of an Addon's status as held by OCM
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OcmAddonStatus {
    /// Addon identifier (the Addon's name)
    #[serde(rename = "addonID")]
    pub addon_id: String,

    /// Correlation ID the conditions were reported under
    #[serde(rename = "correlationID")]
    pub correlation_id: String,

    /// Reported conditions
    #[serde(default)]
    pub status_conditions: Vec<AddonStatusCondition>,
}

/// A condition in the shape OCM stores it: no timestamps, no message
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct AddonStatusCondition {
    /// Condition type
    pub status_type: String,
    /// Condition status
    pub status_value: ConditionStatus,
    /// Machine-readable reason
    pub reason: String,
}

impl AddonStatusCondition {
    /// Create a new status condition
    pub fn new(
        status_type: impl Into<String>,
        status_value: ConditionStatus,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            status_type: status_type.into(),
            status_value,
            reason: reason.into(),
        }
    }
}

impl From<&Condition> for AddonStatusCondition {
    fn from(c: &Condition) -> Self {
        Self {
            status_type: c.type_.clone(),
            status_value: c.status.clone(),
            reason: c.reason.clone(),
        }
    }
}

impl Addon {
    /// Live conditions, empty when the Addon has no status yet
    pub fn conditions(&self) -> &[Condition] {
        self.status
            .as_ref()
            .map(|s| s.conditions.as_slice())
            .unwrap_or_default()
    }

    /// Status last confirmed by OCM, if any
    pub fn reported_status(&self) -> Option<&OcmAddonStatus> {
        self.status.as_ref().and_then(|s| s.reported_status.as_ref())
    }
}
