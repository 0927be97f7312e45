//! AddonOperator controller
//!
//! Reconciles the AddonOperator singleton. Each pass converges the global
//! pause, installs or clears the OCM client, and writes a heartbeat.

mod ocm;
mod pause;

pub use ocm::{
    ensure_ocm_client, http_client_factory, ClientFactory, OcmBootstrap, OCM_TOKEN_SECRET_KEY,
};
pub use pause::{determine_pause_action, handle_global_pause, persisted_pause, PauseAction};

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use kube::runtime::controller::Action;
use kube::ResourceExt;
use tracing::{debug, error, instrument, warn};

use addon_common::crd::{
    set_condition, AddonOperator, AddonOperatorPhase, Condition, ConditionStatus,
    CONDITION_AVAILABLE, REASON_ADDON_OPERATOR_READY, REASON_OCM_CLIENT_ERROR,
};
use addon_common::metrics::record_reconcile;
use addon_common::runtime_options::RuntimeOption;
use addon_common::Error;
use addon_ocm::OcmClientSlot;

use crate::kube_client::KubeClient;

/// Interval between heartbeats
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Age after which a heartbeat is rewritten even if nothing else changed
///
/// Below [`HEARTBEAT_INTERVAL`] so the periodic requeue always refreshes it,
/// while the watch event caused by our own status write does not.
const HEARTBEAT_STALE_AFTER_SECS: i64 = 25;

/// Requeue delay after a failed pass
const ERROR_REQUEUE_DELAY: Duration = Duration::from_secs(5);

const CONTROLLER_NAME: &str = "addon_operator";

/// Controller context for AddonOperator reconciliation
pub struct Context {
    /// Kubernetes client for status updates and secret reads
    pub kube: Arc<dyn KubeClient>,
    /// Name of the singleton, other AddonOperators are ignored
    pub name: String,
    /// Global pause option shared with the Addon controller
    pub global_pause: Arc<dyn RuntimeOption>,
    /// OCM client slot shared with the Addon controller
    pub ocm: Arc<OcmClientSlot>,
    /// Builds OCM clients
    pub ocm_factory: Arc<ClientFactory>,
    /// Cluster ID for OCM requests
    pub ocm_cluster_id: Option<String>,
    /// Per-request timeout for OCM requests
    pub ocm_request_timeout: Duration,
}

/// Reconcile the AddonOperator singleton
#[instrument(skip(operator, ctx), fields(addon_operator = %operator.name_any()))]
pub async fn reconcile(operator: Arc<AddonOperator>, ctx: Arc<Context>) -> Result<Action, Error> {
    let start = Instant::now();
    let result = reconcile_operator(&operator, &ctx).await;
    record_reconcile(CONTROLLER_NAME, result.is_ok(), start.elapsed().as_secs_f64());
    result
}

async fn reconcile_operator(operator: &AddonOperator, ctx: &Context) -> Result<Action, Error> {
    let name = operator.name_any();
    if name != ctx.name {
        debug!(expected = %ctx.name, "Ignoring AddonOperator that is not the singleton");
        return Ok(Action::await_change());
    }

    let original = operator.status.clone().unwrap_or_default();
    let mut status = original.clone();
    status.observed_generation = operator.metadata.generation;

    let action = handle_global_pause(
        ctx.global_pause.as_ref(),
        operator.spec.paused,
        &mut status.conditions,
    )
    .await?;
    debug!(?action, "Global pause converged");

    let bootstrap = OcmBootstrap {
        cluster_id: ctx.ocm_cluster_id.as_deref(),
        request_timeout: ctx.ocm_request_timeout,
    };
    let ocm_result = ensure_ocm_client(
        ctx.kube.as_ref(),
        &ctx.ocm,
        ctx.ocm_factory.as_ref(),
        operator.spec.ocm.as_ref(),
        &bootstrap,
    )
    .await;

    let available = match &ocm_result {
        Ok(()) => {
            status.phase = AddonOperatorPhase::Ready;
            Condition::new(
                CONDITION_AVAILABLE,
                ConditionStatus::True,
                REASON_ADDON_OPERATOR_READY,
                "Addon operator is ready",
            )
        }
        Err(e) => {
            warn!(error = %e, "Failed to configure OCM client");
            status.phase = AddonOperatorPhase::Error;
            Condition::new(
                CONDITION_AVAILABLE,
                ConditionStatus::False,
                REASON_OCM_CLIENT_ERROR,
                e.to_string(),
            )
        }
    };
    set_condition(&mut status.conditions, available);

    let now = Utc::now();
    let heartbeat_due = original
        .last_heartbeat_time
        .map_or(true, |t| (now - t).num_seconds() >= HEARTBEAT_STALE_AFTER_SECS);
    if heartbeat_due || status != original {
        status.last_heartbeat_time = Some(now);
        ctx.kube.patch_addon_operator_status(&name, &status).await?;
    }

    ocm_result?;
    Ok(Action::requeue(HEARTBEAT_INTERVAL))
}

/// Error policy for the AddonOperator controller
pub fn error_policy(operator: Arc<AddonOperator>, error: &Error, _ctx: Arc<Context>) -> Action {
    error!(
        ?error,
        kind = error.kind(),
        addon_operator = %operator.name_any(),
        "reconciliation failed"
    );
    Action::requeue(ERROR_REQUEUE_DELAY)
}
