//! Controller runner - builds controller futures for Addons and the AddonOperator
//!
//! Each `build_*` function returns a boxed future that the binary composes.
//! Contexts are built by the caller so the shared global pause option and OCM
//! client slot are the same instances in both controllers.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use futures::StreamExt;
use kube::runtime::watcher::Config as WatcherConfig;
use kube::runtime::Controller;
use kube::{Api, Client};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::controller::{addon, addon_operator};
use crate::crd::{Addon, AddonOperator};

/// Watcher timeout (seconds) - must be less than client read_timeout (30s)
/// This forces the API server to close the watch before the client times out,
/// preventing "body read timed out" errors on idle watches.
const WATCH_TIMEOUT_SECS: u32 = 25;

/// A controller future ready to be driven to completion
pub type ControllerFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Build the Addon controller
///
/// Every change of the global pause (`pause_changes`) requeues all Addons so
/// pausing and resuming take effect without waiting for an Addon event.
pub fn build_addon_controller(
    client: Client,
    ctx: Arc<addon::Context>,
    pause_changes: watch::Receiver<bool>,
) -> ControllerFuture {
    let addons: Api<Addon> = Api::all(client);

    tracing::info!("- Addon controller");

    Box::pin(
        Controller::new(addons, WatcherConfig::default().timeout(WATCH_TIMEOUT_SECS))
            .reconcile_all_on(WatchStream::from_changes(pause_changes).map(|_| ()))
            .shutdown_on_signal()
            .run(addon::reconcile, addon::error_policy, ctx)
            .for_each(log_reconcile_result("Addon")),
    )
}

/// Build the AddonOperator controller
pub fn build_addon_operator_controller(
    client: Client,
    ctx: Arc<addon_operator::Context>,
) -> ControllerFuture {
    let operators: Api<AddonOperator> = Api::all(client);

    tracing::info!("- AddonOperator controller");

    Box::pin(
        Controller::new(
            operators,
            WatcherConfig::default().timeout(WATCH_TIMEOUT_SECS),
        )
        .shutdown_on_signal()
        .run(addon_operator::reconcile, addon_operator::error_policy, ctx)
        .for_each(log_reconcile_result("AddonOperator")),
    )
}

fn log_reconcile_result<T: std::fmt::Debug, E: std::fmt::Debug>(
    controller_name: &'static str,
) -> impl Fn(Result<T, E>) -> std::future::Ready<()> {
    move |result| {
        match result {
            Ok(action) => tracing::debug!(?action, "{} reconciliation completed", controller_name),
            Err(e) => tracing::error!(error = ?e, "{} reconciliation error", controller_name),
        }
        std::future::ready(())
    }
}
