//! AddonOperator CRD
//!
//! Singleton resource configuring the operator itself: the global pause switch
//! and the connection to the OCM addon status service.

use chrono::{DateTime, Utc};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::types::Condition;

/// AddonOperator specification
///
/// Example:
/// ```yaml
/// apiVersion: addons.managed.openshift.io/v1alpha1
/// kind: AddonOperator
/// metadata:
///   name: addon-operator
/// spec:
///   paused: false
///   ocm:
///     endpoint: https://api.openshift.com
///     secret:
///       name: ocm-token
///       namespace: addon-operator
/// ```
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "addons.managed.openshift.io",
    version = "v1alpha1",
    kind = "AddonOperator",
    status = "AddonOperatorStatus",
    printcolumn = r#"{"name":"Phase","type":"string","jsonPath":".status.phase"}"#,
    printcolumn = r#"{"name":"Paused","type":"boolean","jsonPath":".spec.paused"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct AddonOperatorSpec {
    /// Pause reconciliation of all Addons
    #[serde(default)]
    pub paused: bool,

    /// OCM API connection, status reporting stays idle while unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocm: Option<OcmConfig>,
}

/// OCM API connection settings
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OcmConfig {
    /// Base URL of the OCM API
    pub endpoint: String,

    /// Secret holding the OCM access token under the `token` key
    pub secret: ClusterSecretReference,
}

/// Reference to a Secret in a specific namespace
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct ClusterSecretReference {
    /// Secret name
    pub name: String,
    /// Secret namespace
    pub namespace: String,
}

/// AddonOperator phase
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum AddonOperatorPhase {
    /// Not reconciled yet
    #[default]
    Pending,
    /// Operator is serving
    Ready,
    /// Operator failed to reconcile itself
    Error,
}

/// AddonOperator status
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AddonOperatorStatus {
    /// Generation last processed by the controller
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,

    /// Current phase
    #[serde(default)]
    pub phase: AddonOperatorPhase,

    /// Conditions, including `Paused` while the global pause is active
    #[serde(default)]
    pub conditions: Vec<Condition>,

    /// Last time the operator reconciled itself
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_heartbeat_time: Option<DateTime<Utc>>,
}

impl AddonOperator {
    /// Live conditions, empty when the resource has no status yet
    pub fn conditions(&self) -> &[Condition] {
        self.status
            .as_ref()
            .map(|s| s.conditions.as_slice())
            .unwrap_or_default()
    }
}
