//! Kubernetes API access used by the controllers
//!
//! Controllers only depend on the [`KubeClient`] trait so reconciliation can be
//! tested against mocks.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::api::{Api, Patch, PatchParams};
use kube::Client;
use tracing::debug;

#[cfg(test)]
use mockall::automock;

use addon_common::crd::{Addon, AddonOperator, AddonOperatorStatus, AddonStatus};
use addon_common::{Error, FIELD_MANAGER};

/// Trait abstracting Kubernetes client operations for the addon operator
#[cfg_attr(test, automock)]
#[async_trait]
pub trait KubeClient: Send + Sync {
    /// Patch the status of an Addon
    async fn patch_addon_status(&self, name: &str, status: &AddonStatus) -> Result<(), Error>;

    /// Patch the status of an AddonOperator
    async fn patch_addon_operator_status(
        &self,
        name: &str,
        status: &AddonOperatorStatus,
    ) -> Result<(), Error>;

    /// Read one key of a Secret as UTF-8
    ///
    /// Returns None if the Secret or the key doesn't exist.
    async fn get_secret_value(
        &self,
        name: &str,
        namespace: &str,
        key: &str,
    ) -> Result<Option<String>, Error>;
}

/// Real Kubernetes client implementation
pub struct KubeClientImpl {
    client: Client,
}

impl KubeClientImpl {
    /// Create a new KubeClientImpl wrapping the given kube Client
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl KubeClient for KubeClientImpl {
    async fn patch_addon_status(&self, name: &str, status: &AddonStatus) -> Result<(), Error> {
        let api: Api<Addon> = Api::all(self.client.clone());
        let patch = serde_json::json!({ "status": status });

        api.patch_status(name, &PatchParams::apply(FIELD_MANAGER), &Patch::Merge(&patch))
            .await?;

        debug!(addon = %name, "Patched Addon status");
        Ok(())
    }

    async fn patch_addon_operator_status(
        &self,
        name: &str,
        status: &AddonOperatorStatus,
    ) -> Result<(), Error> {
        let api: Api<AddonOperator> = Api::all(self.client.clone());
        let patch = serde_json::json!({ "status": status });

        api.patch_status(name, &PatchParams::apply(FIELD_MANAGER), &Patch::Merge(&patch))
            .await?;

        debug!(addon_operator = %name, "Patched AddonOperator status");
        Ok(())
    }

    async fn get_secret_value(
        &self,
        name: &str,
        namespace: &str,
        key: &str,
    ) -> Result<Option<String>, Error> {
        let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        let Some(secret) = api.get_opt(name).await? else {
            return Ok(None);
        };

        let Some(value) = secret.data.as_ref().and_then(|d| d.get(key)) else {
            return Ok(None);
        };

        String::from_utf8(value.0.clone()).map(Some).map_err(|_| {
            Error::config(
                format!("{namespace}/{name}"),
                format!("key {key} is not valid UTF-8"),
            )
        })
    }
}
