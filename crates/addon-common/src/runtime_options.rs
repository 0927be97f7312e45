//! Runtime options: switches that can be flipped while the operator runs
//!
//! The global pause and the OCM status reporting toggle are both runtime
//! options. Controllers only see the [`RuntimeOption`] trait so that tests can
//! substitute doubles and count enable/disable calls.

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::info;

#[cfg(test)]
use mockall::automock;

use crate::Error;

/// Name of the option pausing all Addon reconciliation
pub const GLOBAL_PAUSE_OPTION: &str = "global-pause";

/// Name of the option gating OCM status reporting
pub const STATUS_REPORTING_OPTION: &str = "status-reporting";

/// A switch that can be queried and toggled at runtime
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RuntimeOption: Send + Sync {
    /// Whether the option is currently enabled
    fn enabled(&self) -> bool;

    /// Enable the option
    async fn enable(&self) -> Result<(), Error>;

    /// Disable the option
    async fn disable(&self) -> Result<(), Error>;
}

/// In-process runtime option backed by a watch channel
///
/// Subscribers are notified on every actual state change, which lets the
/// controller runner requeue all Addons when the global pause flips.
pub struct WatchOption {
    name: &'static str,
    state: watch::Sender<bool>,
}

impl WatchOption {
    /// Create an option with the given initial state
    pub fn new(name: &'static str, enabled: bool) -> Self {
        let (state, _) = watch::channel(enabled);
        Self { name, state }
    }

    /// Name of this option
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Subscribe to state changes
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.state.subscribe()
    }

    fn set(&self, enabled: bool) {
        let changed = self.state.send_if_modified(|current| {
            if *current == enabled {
                false
            } else {
                *current = enabled;
                true
            }
        });
        if changed {
            info!(option = self.name, enabled, "Runtime option changed");
        }
    }
}

#[async_trait]
impl RuntimeOption for WatchOption {
    fn enabled(&self) -> bool {
        *self.state.borrow()
    }

    async fn enable(&self) -> Result<(), Error> {
        self.set(true);
        Ok(())
    }

    async fn disable(&self) -> Result<(), Error> {
        self.set(false);
        Ok(())
    }
}
