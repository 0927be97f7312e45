//! OCM addon status API client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[cfg(test)]
use mockall::automock;

use addon_common::crd::{AddonStatusCondition, ConditionStatus, OcmAddonStatus};

use crate::OcmError;

/// Request timeout used when none is configured
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Body of a status creation request
#[derive(Clone, Debug, PartialEq)]
pub struct AddonStatusPostRequest {
    /// Addon identifier
    pub addon_id: String,
    /// Correlation ID the conditions belong to
    pub correlation_id: String,
    /// Conditions to report
    pub status_conditions: Vec<AddonStatusCondition>,
}

/// Body of a status update request
#[derive(Clone, Debug, PartialEq)]
pub struct AddonStatusPatchRequest {
    /// Correlation ID the conditions belong to
    pub correlation_id: String,
    /// Conditions to report
    pub status_conditions: Vec<AddonStatusCondition>,
}

/// Operations against the OCM addon status service
///
/// Implementations return [`OcmError`] with a 404 status code when no status
/// exists for the addon, so callers can take the creation path. Writes only
/// report whether OCM accepted them; any 2xx answer counts, with or without a
/// body.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait OcmClient: Send + Sync {
    /// Fetch the status OCM holds for an addon
    async fn get_addon_status(&self, addon_id: &str) -> Result<OcmAddonStatus, OcmError>;

    /// Create the status record for an addon
    async fn post_addon_status(&self, request: AddonStatusPostRequest) -> Result<(), OcmError>;

    /// Update the status record of an addon
    async fn patch_addon_status(
        &self,
        addon_id: &str,
        request: AddonStatusPatchRequest,
    ) -> Result<(), OcmError>;
}

/// Connection settings for [`HttpOcmClient`]
#[derive(Clone, PartialEq)]
pub struct OcmClientConfig {
    /// Base URL of the OCM API
    pub endpoint: String,
    /// ID of the cluster this operator runs on
    pub cluster_id: String,
    /// Bearer token
    pub token: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl std::fmt::Debug for OcmClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OcmClientConfig")
            .field("endpoint", &self.endpoint)
            .field("cluster_id", &self.cluster_id)
            .field("token", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Status condition as the OCM API serializes it
#[derive(Debug, Serialize, Deserialize)]
struct WireCondition {
    status_type: String,
    status_value: ConditionStatus,
    #[serde(default)]
    reason: String,
}

impl From<&AddonStatusCondition> for WireCondition {
    fn from(c: &AddonStatusCondition) -> Self {
        Self {
            status_type: c.status_type.clone(),
            status_value: c.status_value.clone(),
            reason: c.reason.clone(),
        }
    }
}

impl From<WireCondition> for AddonStatusCondition {
    fn from(c: WireCondition) -> Self {
        Self {
            status_type: c.status_type,
            status_value: c.status_value,
            reason: c.reason,
        }
    }
}

#[derive(Debug, Serialize)]
struct WireStatusRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    addon_id: Option<&'a str>,
    correlation_id: &'a str,
    status_conditions: Vec<WireCondition>,
}

#[derive(Debug, Deserialize)]
struct WireStatusResponse {
    #[serde(default)]
    addon_id: String,
    #[serde(default)]
    correlation_id: String,
    #[serde(default)]
    status_conditions: Vec<WireCondition>,
}

impl From<WireStatusResponse> for OcmAddonStatus {
    fn from(r: WireStatusResponse) -> Self {
        Self {
            addon_id: r.addon_id,
            correlation_id: r.correlation_id,
            status_conditions: r.status_conditions.into_iter().map(Into::into).collect(),
        }
    }
}

/// [`OcmClient`] speaking JSON over HTTPS
pub struct HttpOcmClient {
    config: OcmClientConfig,
    http: Client,
}

impl HttpOcmClient {
    /// Build a client for the given configuration
    pub fn new(config: OcmClientConfig) -> Result<Self, OcmError> {
        if config.endpoint.is_empty() {
            return Err(OcmError::Config("endpoint must not be empty".to_string()));
        }
        if config.cluster_id.is_empty() {
            return Err(OcmError::Config("cluster ID must not be empty".to_string()));
        }

        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| OcmError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { config, http })
    }

    fn status_collection_url(&self) -> String {
        format!(
            "{}/api/addons_mgmt/v1/clusters/{}/status",
            self.config.endpoint.trim_end_matches('/'),
            self.config.cluster_id
        )
    }

    fn status_url(&self, addon_id: &str) -> String {
        format!("{}/{}", self.status_collection_url(), addon_id)
    }

    /// Send a request, mapping non-2xx answers to [`OcmError::Status`]
    async fn send(&self, request: RequestBuilder) -> Result<Response, OcmError> {
        let response = request.bearer_auth(&self.config.token).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OcmError::Status {
                status_code: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl OcmClient for HttpOcmClient {
    async fn get_addon_status(&self, addon_id: &str) -> Result<OcmAddonStatus, OcmError> {
        let url = self.status_url(addon_id);
        debug!(%url, "GET addon status");
        let response = self.send(self.http.get(url)).await?;

        let bytes = response.bytes().await?;
        let decoded: WireStatusResponse =
            serde_json::from_slice(&bytes).map_err(|e| OcmError::Decode(e.to_string()))?;
        Ok(decoded.into())
    }

    async fn post_addon_status(&self, request: AddonStatusPostRequest) -> Result<(), OcmError> {
        let url = self.status_collection_url();
        debug!(%url, addon = %request.addon_id, "POST addon status");
        let body = WireStatusRequest {
            addon_id: Some(&request.addon_id),
            correlation_id: &request.correlation_id,
            status_conditions: request.status_conditions.iter().map(Into::into).collect(),
        };
        self.send(self.http.post(url).json(&body)).await?;
        Ok(())
    }

    async fn patch_addon_status(
        &self,
        addon_id: &str,
        request: AddonStatusPatchRequest,
    ) -> Result<(), OcmError> {
        let url = self.status_url(addon_id);
        debug!(%url, "PATCH addon status");
        let body = WireStatusRequest {
            addon_id: None,
            correlation_id: &request.correlation_id,
            status_conditions: request.status_conditions.iter().map(Into::into).collect(),
        };
        self.send(self.http.patch(url).json(&body)).await?;
        Ok(())
    }
}
