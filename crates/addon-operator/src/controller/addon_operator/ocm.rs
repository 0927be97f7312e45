//! OCM client bootstrap
//!
//! Builds the OCM client from `AddonOperator.spec.ocm` and the token secret it
//! references, and installs it into the slot the Addon controller reads.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use addon_common::crd::OcmConfig;
use addon_common::Error;
use addon_ocm::{HttpOcmClient, OcmClient, OcmClientConfig, OcmClientSlot};

use crate::kube_client::KubeClient;

/// Key of the OCM access token in the referenced secret
pub const OCM_TOKEN_SECRET_KEY: &str = "token";

/// Builds a client from a resolved configuration
pub type ClientFactory =
    dyn Fn(OcmClientConfig) -> Result<Arc<dyn OcmClient>, Error> + Send + Sync;

/// Factory producing [`HttpOcmClient`]s
pub fn http_client_factory() -> Arc<ClientFactory> {
    Arc::new(|config: OcmClientConfig| -> Result<Arc<dyn OcmClient>, Error> {
        let client = HttpOcmClient::new(config)
            .map_err(|e| Error::config("ocm", format!("failed to build OCM client: {e}")))?;
        Ok(Arc::new(client))
    })
}

/// Settings for [`ensure_ocm_client`] that come from the command line
pub struct OcmBootstrap<'a> {
    /// Cluster ID used in OCM request paths
    pub cluster_id: Option<&'a str>,
    /// Per-request timeout
    pub request_timeout: Duration,
}

/// Make the slot reflect `ocm`
///
/// Clears the slot when `ocm` is None. Otherwise reads the token secret and
/// installs a new client unless the current one was built from the same
/// settings.
pub async fn ensure_ocm_client(
    kube: &dyn KubeClient,
    slot: &OcmClientSlot,
    factory: &ClientFactory,
    ocm: Option<&OcmConfig>,
    bootstrap: &OcmBootstrap<'_>,
) -> Result<(), Error> {
    let Some(ocm) = ocm else {
        if slot.clear().await {
            info!("OCM configuration removed, status reporting idle");
        }
        return Ok(());
    };

    let cluster_id = bootstrap
        .cluster_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| Error::config("ocm", "OCM cluster ID is not configured"))?;

    let secret = &ocm.secret;
    let token = kube
        .get_secret_value(&secret.name, &secret.namespace, OCM_TOKEN_SECRET_KEY)
        .await?
        .ok_or_else(|| {
            Error::config(
                format!("{}/{}", secret.namespace, secret.name),
                format!("secret has no {OCM_TOKEN_SECRET_KEY} key"),
            )
        })?;

    let config = OcmClientConfig {
        endpoint: ocm.endpoint.clone(),
        cluster_id: cluster_id.to_string(),
        token: token.trim().to_string(),
        timeout: bootstrap.request_timeout,
    };

    if slot.is_current(&config).await {
        debug!("OCM client up to date");
        return Ok(());
    }

    let client = factory(config.clone())?;
    slot.install(config, client).await;
    info!(endpoint = %ocm.endpoint, cluster_id, "Installed OCM client");
    Ok(())
}
