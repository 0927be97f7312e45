//! Test doubles for collaborators defined in other crates
//!
//! The mockall mocks generated by `automock` are only compiled inside their own
//! crate's tests, so the ones needed here are declared locally.

use async_trait::async_trait;
use mockall::mock;

use addon_common::crd::OcmAddonStatus;
use addon_common::metrics::MetricsRecorder;
use addon_common::runtime_options::RuntimeOption;
use addon_common::Error;
use addon_ocm::{AddonStatusPatchRequest, AddonStatusPostRequest, OcmClient, OcmError};

mock! {
    pub RuntimeOption {}

    #[async_trait]
    impl RuntimeOption for RuntimeOption {
        fn enabled(&self) -> bool;
        async fn enable(&self) -> Result<(), Error>;
        async fn disable(&self) -> Result<(), Error>;
    }
}

mock! {
    pub OcmClient {}

    #[async_trait]
    impl OcmClient for OcmClient {
        async fn get_addon_status(&self, addon_id: &str) -> Result<OcmAddonStatus, OcmError>;
        async fn post_addon_status(&self, request: AddonStatusPostRequest) -> Result<(), OcmError>;
        async fn patch_addon_status(
            &self,
            addon_id: &str,
            request: AddonStatusPatchRequest,
        ) -> Result<(), OcmError>;
    }
}

mock! {
    pub MetricsRecorder {}

    impl MetricsRecorder for MetricsRecorder {
        fn observe_request_duration(&self, seconds: f64);
    }
}

/// Runtime option double that always reports the given state
pub fn option_with_state(enabled: bool) -> MockRuntimeOption {
    let mut option = MockRuntimeOption::new();
    option.expect_enabled().return_const(enabled);
    option
}
