//! Addon controller
//!
//! Each pass first checks whether the Addon is paused, either globally through
//! the AddonOperator or through its own `spec.paused`. A paused Addon only gets
//! its `Paused` condition written. An unpaused Addon has its phase derived from
//! the `Available` condition and its conditions mirrored to OCM.

mod status_reporting;

pub use status_reporting::{map_addon_status_conditions, StatusReporter};

use std::sync::Arc;
use std::time::{Duration, Instant};

use kube::runtime::controller::Action;
use kube::ResourceExt;
use tracing::{debug, error, info, instrument, warn};

use addon_common::crd::{
    find_condition, remove_condition, set_condition, Addon, AddonPhase, AddonStatus, Condition,
    ConditionStatus, CONDITION_AVAILABLE, CONDITION_PAUSED, REASON_ADDON_PAUSED,
    REASON_GLOBAL_PAUSE,
};
use addon_common::metrics::record_reconcile;
use addon_common::runtime_options::RuntimeOption;
use addon_common::Error;

use crate::kube_client::KubeClient;

/// Requeue interval for an unpaused Addon so OCM drift gets corrected
const REQUEUE_INTERVAL: Duration = Duration::from_secs(60);

/// Requeue delay after a failed pass
const ERROR_REQUEUE_DELAY: Duration = Duration::from_secs(5);

const CONTROLLER_NAME: &str = "addon";

/// Controller context for Addon reconciliation
pub struct Context {
    /// Kubernetes client for status updates
    pub kube: Arc<dyn KubeClient>,
    /// Global pause, driven by the AddonOperator controller
    pub global_pause: Arc<dyn RuntimeOption>,
    /// OCM status synchronization
    pub status_reporter: StatusReporter,
}

impl Context {
    /// Create a new controller context
    pub fn new(
        kube: Arc<dyn KubeClient>,
        global_pause: Arc<dyn RuntimeOption>,
        status_reporter: StatusReporter,
    ) -> Self {
        Self {
            kube,
            global_pause,
            status_reporter,
        }
    }
}

/// Why an Addon is paused, if it is
fn pause_reason(
    addon: &Addon,
    global_pause: &dyn RuntimeOption,
) -> Option<(&'static str, &'static str)> {
    if global_pause.enabled() {
        Some((REASON_GLOBAL_PAUSE, "Addon reconciliation is paused globally"))
    } else if addon.spec.paused {
        Some((REASON_ADDON_PAUSED, "Addon reconciliation is paused"))
    } else {
        None
    }
}

fn phase_from_conditions(conditions: &[Condition]) -> AddonPhase {
    match find_condition(conditions, CONDITION_AVAILABLE) {
        Some(c) if c.is_true() => AddonPhase::Ready,
        _ => AddonPhase::Pending,
    }
}

/// Reconcile an Addon
#[instrument(skip(addon, ctx), fields(addon = %addon.name_any()))]
pub async fn reconcile(addon: Arc<Addon>, ctx: Arc<Context>) -> Result<Action, Error> {
    let start = Instant::now();
    let result = reconcile_addon(&addon, &ctx).await;
    record_reconcile(CONTROLLER_NAME, result.is_ok(), start.elapsed().as_secs_f64());
    result
}

async fn reconcile_addon(addon: &Addon, ctx: &Context) -> Result<Action, Error> {
    let name = addon.name_any();
    let original = addon.status.clone().unwrap_or_default();

    let mut working = addon.clone();
    let status = working.status.get_or_insert_with(AddonStatus::default);
    status.observed_generation = addon.metadata.generation;

    if let Some((reason, message)) = pause_reason(addon, ctx.global_pause.as_ref()) {
        set_condition(
            &mut status.conditions,
            Condition::new(CONDITION_PAUSED, ConditionStatus::True, reason, message),
        );
        status.phase = AddonPhase::Paused;

        if *status != original {
            info!(reason, "Addon paused");
            ctx.kube.patch_addon_status(&name, status).await?;
        }
        return Ok(Action::await_change());
    }

    if remove_condition(&mut status.conditions, CONDITION_PAUSED) {
        info!("Addon resumed");
    }
    status.phase = phase_from_conditions(&status.conditions);

    let report = ctx.status_reporter.synchronize(&mut working).await;
    if let Err(e) = &report {
        warn!(error = %e, "Failed to report status to OCM");
    }

    // Written even when reporting failed so local condition changes are not lost
    if let Some(status) = working.status.as_ref().filter(|s| **s != original) {
        debug!(phase = ?status.phase, "Updating Addon status");
        ctx.kube.patch_addon_status(&name, status).await?;
    }

    report?;
    Ok(Action::requeue(REQUEUE_INTERVAL))
}

/// Error policy for the Addon controller
pub fn error_policy(addon: Arc<Addon>, error: &Error, _ctx: Arc<Context>) -> Action {
    error!(
        ?error,
        kind = error.kind(),
        addon = %addon.name_any(),
        "reconciliation failed"
    );
    Action::requeue(ERROR_REQUEUE_DELAY)
}
