//! Shared, replaceable OCM client handle

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{OcmClient, OcmClientConfig};

struct Installed {
    config: Option<OcmClientConfig>,
    client: Arc<dyn OcmClient>,
}

/// Holder for the OCM client shared between controllers
///
/// Empty until the AddonOperator resource provides OCM connection settings.
/// Readers clone the inner `Arc`, so replacing the client never interrupts a
/// call already in flight.
#[derive(Default)]
pub struct OcmClientSlot {
    inner: RwLock<Option<Installed>>,
}

impl OcmClientSlot {
    /// Create an empty slot
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a slot holding a fixed client
    pub fn with_client(client: Arc<dyn OcmClient>) -> Self {
        Self {
            inner: RwLock::new(Some(Installed {
                config: None,
                client,
            })),
        }
    }

    /// Current client, if one is installed
    pub async fn get(&self) -> Option<Arc<dyn OcmClient>> {
        self.inner.read().await.as_ref().map(|i| Arc::clone(&i.client))
    }

    /// Whether the installed client was built from `config`
    pub async fn is_current(&self, config: &OcmClientConfig) -> bool {
        matches!(
            self.inner.read().await.as_ref(),
            Some(Installed { config: Some(c), .. }) if c == config
        )
    }

    /// Install a client built from `config`, replacing any previous one
    pub async fn install(&self, config: OcmClientConfig, client: Arc<dyn OcmClient>) {
        *self.inner.write().await = Some(Installed {
            config: Some(config),
            client,
        });
    }

    /// Remove the installed client, returning whether one was present
    pub async fn clear(&self) -> bool {
        self.inner.write().await.take().is_some()
    }
}
