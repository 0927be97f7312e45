//! Addon status reporting to OCM
//!
//! Each pass runs a fetch-compare-decide-write cycle against the OCM addon
//! status service. `status.reportedStatus` caches the status OCM last
//! confirmed and is only committed after the call that confirms it returned
//! successfully. When the cache already matches the live conditions no remote
//! call is made at all.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use kube::ResourceExt;
use tracing::{debug, info, instrument};

use addon_common::conditions::conditions_equal;
use addon_common::crd::{Addon, AddonStatusCondition, Condition, OcmAddonStatus};
use addon_common::metrics::MetricsRecorder;
use addon_common::runtime_options::RuntimeOption;
use addon_common::Error;
use addon_ocm::{
    AddonStatusPatchRequest, AddonStatusPostRequest, OcmClient, OcmClientSlot, OcmError,
};

/// Project live conditions into the shape OCM stores
pub fn map_addon_status_conditions(conditions: &[Condition]) -> Vec<AddonStatusCondition> {
    conditions.iter().map(AddonStatusCondition::from).collect()
}

fn same_status(
    snapshot: &OcmAddonStatus,
    correlation_id: &str,
    conditions: &[AddonStatusCondition],
) -> bool {
    snapshot.correlation_id == correlation_id
        && conditions_equal(&snapshot.status_conditions, conditions)
}

fn ocm_error(operation: &str, addon: &str, err: OcmError) -> Error {
    Error::ocm(operation, addon, err.status_code(), err)
}

/// Synchronizes Addon conditions with the OCM addon status service
pub struct StatusReporter {
    option: Arc<dyn RuntimeOption>,
    ocm: Arc<OcmClientSlot>,
    metrics: Option<Arc<dyn MetricsRecorder>>,
}

impl StatusReporter {
    /// Create a reporter gated by `option`, using whatever client `ocm` holds
    pub fn new(
        option: Arc<dyn RuntimeOption>,
        ocm: Arc<OcmClientSlot>,
        metrics: Option<Arc<dyn MetricsRecorder>>,
    ) -> Self {
        Self {
            option,
            ocm,
            metrics,
        }
    }

    /// Bring OCM in line with the Addon's live conditions
    ///
    /// On success `status.reportedStatus` holds the status OCM confirmed. On
    /// error it is left exactly as it was.
    #[instrument(skip_all, fields(addon = %addon.name_any()))]
    pub async fn synchronize(&self, addon: &mut Addon) -> Result<(), Error> {
        if !self.option.enabled() {
            debug!("Status reporting disabled");
            return Ok(());
        }

        let Some(client) = self.ocm.get().await else {
            debug!("OCM client not configured, skipping status reporting");
            return Ok(());
        };

        let candidate = OcmAddonStatus {
            addon_id: addon.name_any(),
            correlation_id: addon.spec.correlation_id.clone(),
            status_conditions: map_addon_status_conditions(addon.conditions()),
        };

        if let Some(reported) = addon.reported_status() {
            if same_status(
                reported,
                &candidate.correlation_id,
                &candidate.status_conditions,
            ) {
                debug!("Reported status is up to date");
                return Ok(());
            }
        }

        let confirmed = self.converge(client.as_ref(), candidate).await?;
        addon.status.get_or_insert_with(Default::default).reported_status = Some(confirmed);
        Ok(())
    }

    /// Run the remote half of the cycle, returning the status OCM now holds
    async fn converge(
        &self,
        client: &dyn OcmClient,
        candidate: OcmAddonStatus,
    ) -> Result<OcmAddonStatus, Error> {
        let addon_id = candidate.addon_id.as_str();

        let remote = match self.timed(client.get_addon_status(addon_id)).await {
            Ok(remote) => remote,
            Err(e) if e.is_not_found() => {
                info!("No status in OCM yet, creating it");
                let request = AddonStatusPostRequest {
                    addon_id: candidate.addon_id.clone(),
                    correlation_id: candidate.correlation_id.clone(),
                    status_conditions: candidate.status_conditions.clone(),
                };
                self.timed(client.post_addon_status(request))
                    .await
                    .map_err(|e| ocm_error("post", addon_id, e))?;
                return Ok(candidate);
            }
            Err(e) => return Err(ocm_error("get", addon_id, e)),
        };

        if same_status(
            &remote,
            &candidate.correlation_id,
            &candidate.status_conditions,
        ) {
            debug!("OCM status already current, refreshing reported status");
            return Ok(remote);
        }

        info!(
            correlation_id = %candidate.correlation_id,
            conditions = candidate.status_conditions.len(),
            "Updating status in OCM"
        );
        let request = AddonStatusPatchRequest {
            correlation_id: candidate.correlation_id.clone(),
            status_conditions: candidate.status_conditions.clone(),
        };
        self.timed(client.patch_addon_status(addon_id, request))
            .await
            .map_err(|e| ocm_error("patch", addon_id, e))?;
        Ok(candidate)
    }

    async fn timed<T>(
        &self,
        call: impl Future<Output = Result<T, OcmError>>,
    ) -> Result<T, OcmError> {
        let start = Instant::now();
        let result = call.await;
        if let Some(metrics) = &self.metrics {
            metrics.observe_request_duration(start.elapsed().as_secs_f64());
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{option_with_state, MockMetricsRecorder, MockOcmClient};
    use addon_common::crd::{
        AddonSpec, AddonStatus, ConditionStatus, CONDITION_AVAILABLE, CONDITION_UPGRADE_STARTED,
        REASON_FULLY_RECONCILED, REASON_UNREADY_CSV, REASON_UPGRADE_STARTED,
    };

    fn available() -> Condition {
        Condition::new(
            CONDITION_AVAILABLE,
            ConditionStatus::True,
            REASON_FULLY_RECONCILED,
            "",
        )
    }

    fn upgrade_started() -> Condition {
        Condition::new(
            CONDITION_UPGRADE_STARTED,
            ConditionStatus::True,
            REASON_UPGRADE_STARTED,
            "",
        )
    }

    fn unready() -> AddonStatusCondition {
        AddonStatusCondition::new(
            CONDITION_AVAILABLE,
            ConditionStatus::False,
            REASON_UNREADY_CSV,
        )
    }

    fn snapshot(correlation_id: &str, conditions: Vec<AddonStatusCondition>) -> OcmAddonStatus {
        OcmAddonStatus {
            addon_id: "addon-1".to_string(),
            correlation_id: correlation_id.to_string(),
            status_conditions: conditions,
        }
    }

    fn sample_addon(
        correlation_id: &str,
        conditions: Vec<Condition>,
        reported: Option<OcmAddonStatus>,
    ) -> Addon {
        let mut addon = Addon::new(
            "addon-1",
            AddonSpec {
                correlation_id: correlation_id.to_string(),
                paused: false,
            },
        );
        addon.status = Some(AddonStatus {
            conditions,
            reported_status: reported,
            ..Default::default()
        });
        addon
    }

    fn reporter(
        client: Option<MockOcmClient>,
        metrics: Option<MockMetricsRecorder>,
    ) -> StatusReporter {
        let slot = match client {
            Some(c) => OcmClientSlot::with_client(Arc::new(c)),
            None => OcmClientSlot::new(),
        };
        StatusReporter::new(
            Arc::new(option_with_state(true)),
            Arc::new(slot),
            metrics.map(|m| Arc::new(m) as Arc<dyn MetricsRecorder>),
        )
    }

    fn metrics_expecting(calls: usize) -> MockMetricsRecorder {
        let mut metrics = MockMetricsRecorder::new();
        metrics
            .expect_observe_request_duration()
            .withf(|s| *s >= 0.0)
            .times(calls)
            .return_const(());
        metrics
    }

    /// A client that fails the test on any call
    fn untouchable_client() -> MockOcmClient {
        let mut client = MockOcmClient::new();
        client.expect_get_addon_status().never();
        client.expect_post_addon_status().never();
        client.expect_patch_addon_status().never();
        client
    }

    mod short_circuits {
        use super::*;

        #[tokio::test]
        async fn noop_when_status_reporting_disabled() {
            let reporter = StatusReporter::new(
                Arc::new(option_with_state(false)),
                Arc::new(OcmClientSlot::with_client(Arc::new(untouchable_client()))),
                Some(Arc::new(metrics_expecting(0))),
            );
            let mut addon = sample_addon("123", vec![available()], None);

            reporter.synchronize(&mut addon).await.unwrap();

            assert!(addon.reported_status().is_none());
        }

        #[tokio::test]
        async fn noop_when_ocm_client_not_configured() {
            let reporter = reporter(None, Some(metrics_expecting(0)));
            let mut addon = sample_addon("123", vec![available()], None);

            reporter.synchronize(&mut addon).await.unwrap();

            assert!(addon.reported_status().is_none());
        }

        #[tokio::test]
        async fn noop_when_reported_status_matches_live_status() {
            let reported = snapshot("123", map_addon_status_conditions(&[available()]));
            let mut addon = sample_addon("123", vec![available()], Some(reported.clone()));
            let before = addon.clone();
            let reporter = reporter(Some(untouchable_client()), Some(metrics_expecting(0)));

            reporter.synchronize(&mut addon).await.unwrap();

            assert_eq!(addon, before);
            assert_eq!(addon.reported_status(), Some(&reported));
        }

        #[tokio::test]
        async fn condition_order_does_not_trigger_remote_calls() {
            let reported = snapshot(
                "123",
                map_addon_status_conditions(&[upgrade_started(), available()]),
            );
            let mut addon = sample_addon(
                "123",
                vec![available(), upgrade_started()],
                Some(reported),
            );
            let reporter = reporter(Some(untouchable_client()), None);

            reporter.synchronize(&mut addon).await.unwrap();
        }
    }

    mod first_report {
        use super::*;

        #[tokio::test]
        async fn posts_current_status_when_ocm_has_none() {
            let mut client = MockOcmClient::new();
            client
                .expect_get_addon_status()
                .withf(|id| id == "addon-1")
                .times(1)
                .returning(|_| Err(OcmError::status(404)));
            client
                .expect_post_addon_status()
                .withf(|req| {
                    req.addon_id == "addon-1"
                        && req.correlation_id == "123"
                        && req.status_conditions == map_addon_status_conditions(&[available()])
                })
                .times(1)
                .returning(|_| Ok(()));
            client.expect_patch_addon_status().never();

            let reporter = reporter(Some(client), Some(metrics_expecting(2)));
            let mut addon = sample_addon("123", vec![available()], None);

            reporter.synchronize(&mut addon).await.unwrap();

            let reported = addon.reported_status().expect("reported status should be set");
            assert_eq!(reported.addon_id, "addon-1");
            assert_eq!(reported.correlation_id, "123");
            assert_eq!(
                reported.status_conditions,
                vec![AddonStatusCondition::new(
                    CONDITION_AVAILABLE,
                    ConditionStatus::True,
                    REASON_FULLY_RECONCILED
                )]
            );
        }

        #[tokio::test]
        async fn post_failure_leaves_reported_status_unset() {
            let mut client = MockOcmClient::new();
            client
                .expect_get_addon_status()
                .times(1)
                .returning(|_| Err(OcmError::status(404)));
            client
                .expect_post_addon_status()
                .times(1)
                .returning(|_| Err(OcmError::status(400)));
            client.expect_patch_addon_status().never();

            let reporter = reporter(Some(client), Some(metrics_expecting(2)));
            let mut addon = sample_addon("123", vec![available()], None);

            let err = reporter.synchronize(&mut addon).await.unwrap_err();

            assert_eq!(err.status_code(), Some(400));
            assert!(err.to_string().contains("post"));
            assert!(addon.reported_status().is_none());
        }

        #[tokio::test]
        async fn creates_status_for_addon_without_status_block() {
            let mut client = MockOcmClient::new();
            client
                .expect_get_addon_status()
                .returning(|_| Err(OcmError::status(404)));
            client
                .expect_post_addon_status()
                .withf(|req| req.status_conditions.is_empty())
                .times(1)
                .returning(|_| Ok(()));

            let reporter = reporter(Some(client), None);
            let mut addon = Addon::new(
                "addon-1",
                AddonSpec {
                    correlation_id: "123".to_string(),
                    paused: false,
                },
            );

            reporter.synchronize(&mut addon).await.unwrap();

            let reported = addon.reported_status().expect("reported status should be set");
            assert!(reported.status_conditions.is_empty());
        }
    }

    mod existing_status {
        use super::*;

        #[tokio::test]
        async fn heals_outdated_reported_status_without_writing() {
            let mut client = MockOcmClient::new();
            client.expect_get_addon_status().times(1).returning(|_| {
                Ok(snapshot(
                    "1234",
                    map_addon_status_conditions(&[available(), upgrade_started()]),
                ))
            });
            client.expect_post_addon_status().never();
            client.expect_patch_addon_status().never();

            let reporter = reporter(Some(client), Some(metrics_expecting(1)));
            let mut addon = sample_addon(
                "1234",
                vec![available(), upgrade_started()],
                Some(snapshot("123", map_addon_status_conditions(&[available()]))),
            );

            reporter.synchronize(&mut addon).await.unwrap();

            let reported = addon.reported_status().expect("reported status should be set");
            assert_eq!(reported.addon_id, "addon-1");
            assert_eq!(reported.correlation_id, "1234");
            assert_eq!(
                reported.status_conditions,
                map_addon_status_conditions(addon.conditions())
            );
        }

        #[tokio::test]
        async fn healing_commits_the_fetched_snapshot() {
            // OCM keeps conditions in its own order; the fetched list is what gets cached
            let remote = snapshot(
                "1234",
                map_addon_status_conditions(&[upgrade_started(), available()]),
            );
            let fetched = remote.clone();
            let mut client = MockOcmClient::new();
            client
                .expect_get_addon_status()
                .times(1)
                .returning(move |_| Ok(fetched.clone()));
            client.expect_post_addon_status().never();
            client.expect_patch_addon_status().never();

            let reporter = reporter(Some(client), None);
            let mut addon = sample_addon("1234", vec![available(), upgrade_started()], None);

            reporter.synchronize(&mut addon).await.unwrap();

            assert_eq!(addon.reported_status(), Some(&remote));
        }

        #[tokio::test]
        async fn patches_ocm_when_status_drifted() {
            let mut client = MockOcmClient::new();
            client
                .expect_get_addon_status()
                .times(1)
                .returning(|_| Ok(snapshot("123", vec![unready()])));
            client
                .expect_patch_addon_status()
                .withf(|id, req| {
                    id == "addon-1"
                        && req.correlation_id == "1234"
                        && req.status_conditions
                            == map_addon_status_conditions(&[available(), upgrade_started()])
                })
                .times(1)
                .returning(|_, _| Ok(()));
            client.expect_post_addon_status().never();

            let reporter = reporter(Some(client), Some(metrics_expecting(2)));
            let mut addon = sample_addon(
                "1234",
                vec![available(), upgrade_started()],
                Some(snapshot("123", vec![unready()])),
            );

            reporter.synchronize(&mut addon).await.unwrap();

            let reported = addon.reported_status().expect("reported status should be set");
            assert_eq!(reported.addon_id, "addon-1");
            assert_eq!(reported.correlation_id, "1234");
            assert_eq!(
                reported.status_conditions,
                map_addon_status_conditions(addon.conditions())
            );
        }

        #[tokio::test]
        async fn correlation_id_change_alone_triggers_patch() {
            let mut client = MockOcmClient::new();
            client.expect_get_addon_status().times(1).returning(|_| {
                Ok(snapshot("123", map_addon_status_conditions(&[available()])))
            });
            client
                .expect_patch_addon_status()
                .withf(|_, req| req.correlation_id == "456")
                .times(1)
                .returning(|_, _| Ok(()));
            client.expect_post_addon_status().never();

            let reporter = reporter(Some(client), None);
            let mut addon = sample_addon(
                "456",
                vec![available()],
                Some(snapshot("123", map_addon_status_conditions(&[available()]))),
            );

            reporter.synchronize(&mut addon).await.unwrap();

            assert_eq!(addon.reported_status().unwrap().correlation_id, "456");
        }
    }

    mod failures {
        use super::*;

        #[tokio::test]
        async fn patch_failure_leaves_reported_status_untouched() {
            let mut client = MockOcmClient::new();
            client
                .expect_get_addon_status()
                .times(1)
                .returning(|_| Ok(snapshot("123", vec![unready()])));
            client
                .expect_patch_addon_status()
                .times(1)
                .returning(|_, _| Err(OcmError::status(504)));
            client.expect_post_addon_status().never();

            let reporter = reporter(Some(client), Some(metrics_expecting(2)));
            let original = snapshot("123", vec![unready()]);
            let mut addon = sample_addon(
                "1234",
                vec![available(), upgrade_started()],
                Some(original.clone()),
            );

            let err = reporter.synchronize(&mut addon).await.unwrap_err();

            assert_eq!(err.status_code(), Some(504));
            assert_eq!(addon.reported_status(), Some(&original));
        }

        #[tokio::test]
        async fn fetch_failure_other_than_not_found_is_surfaced() {
            let mut client = MockOcmClient::new();
            client
                .expect_get_addon_status()
                .times(1)
                .returning(|_| Err(OcmError::status(503)));
            client.expect_post_addon_status().never();
            client.expect_patch_addon_status().never();

            let reporter = reporter(Some(client), Some(metrics_expecting(1)));
            let original = snapshot("123", vec![unready()]);
            let mut addon = sample_addon("1234", vec![available()], Some(original.clone()));

            let err = reporter.synchronize(&mut addon).await.unwrap_err();

            assert!(matches!(err, Error::Ocm { ref operation, .. } if operation == "get"));
            assert_eq!(addon.reported_status(), Some(&original));
        }

        #[tokio::test]
        async fn transport_style_failure_without_status_code_is_surfaced() {
            let mut client = MockOcmClient::new();
            client
                .expect_get_addon_status()
                .times(1)
                .returning(|_| Err(OcmError::Decode("unexpected end of input".to_string())));

            let reporter = reporter(Some(client), None);
            let mut addon = sample_addon("1234", vec![available()], None);

            let err = reporter.synchronize(&mut addon).await.unwrap_err();

            assert_eq!(err.status_code(), None);
            assert!(addon.reported_status().is_none());
        }

        #[tokio::test]
        async fn rerun_after_failure_converges() {
            let mut client = MockOcmClient::new();
            client
                .expect_get_addon_status()
                .times(2)
                .returning(|_| Ok(snapshot("123", vec![unready()])));
            let mut attempts = 0;
            client
                .expect_patch_addon_status()
                .times(2)
                .returning(move |_, _| {
                    attempts += 1;
                    if attempts == 1 {
                        Err(OcmError::status(504))
                    } else {
                        Ok(())
                    }
                });

            let reporter = reporter(Some(client), None);
            let mut addon = sample_addon("123", vec![available()], None);

            assert!(reporter.synchronize(&mut addon).await.is_err());
            assert!(addon.reported_status().is_none());

            reporter.synchronize(&mut addon).await.unwrap();
            assert_eq!(
                addon.reported_status().unwrap().status_conditions,
                map_addon_status_conditions(&[available()])
            );
        }

        /// Answers GET with a drifted status and never finishes a PATCH
        struct StalledPatchClient;

        #[async_trait::async_trait]
        impl OcmClient for StalledPatchClient {
            async fn get_addon_status(&self, _: &str) -> Result<OcmAddonStatus, OcmError> {
                Ok(snapshot("123", vec![unready()]))
            }

            async fn post_addon_status(&self, _: AddonStatusPostRequest) -> Result<(), OcmError> {
                Err(OcmError::status(500))
            }

            async fn patch_addon_status(
                &self,
                _: &str,
                _: AddonStatusPatchRequest,
            ) -> Result<(), OcmError> {
                std::future::pending().await
            }
        }

        #[tokio::test]
        async fn cancelled_patch_does_not_commit_reported_status() {
            let reporter = StatusReporter::new(
                Arc::new(option_with_state(true)),
                Arc::new(OcmClientSlot::with_client(Arc::new(StalledPatchClient))),
                None,
            );
            let original = snapshot("123", vec![unready()]);
            let mut addon = sample_addon("123", vec![available()], Some(original.clone()));

            let outcome = tokio::time::timeout(
                std::time::Duration::from_millis(50),
                reporter.synchronize(&mut addon),
            )
            .await;

            assert!(outcome.is_err(), "patch should still be pending");
            assert_eq!(addon.reported_status(), Some(&original));
        }
    }
}
