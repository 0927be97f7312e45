//! Addon Operator - reconciles Addons, the global pause and OCM status reporting

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use clap::{Parser, ValueEnum};
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::api::{Patch, PatchParams};
use kube::{Api, Client, CustomResourceExt};

use addon_common::metrics::{MetricsRecorder, OtelMetricsRecorder};
use addon_common::runtime_options::{
    RuntimeOption, WatchOption, GLOBAL_PAUSE_OPTION, STATUS_REPORTING_OPTION,
};
use addon_common::telemetry::{init_telemetry, TelemetryConfig};
use addon_common::{API_GROUP, DEFAULT_ADDON_OPERATOR_NAME, FIELD_MANAGER};
use addon_ocm::{OcmClientSlot, DEFAULT_REQUEST_TIMEOUT};
use addon_operator::controller::addon;
use addon_operator::controller::addon_operator as operator_controller;
use addon_operator::controller_runner::{build_addon_controller, build_addon_operator_controller};
use addon_operator::crd::{Addon, AddonOperator};
use addon_operator::kube_client::{KubeClient, KubeClientImpl};

/// Log output format
#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormat {
    /// JSON lines
    Json,
    /// Human-readable text
    Text,
}

/// Addon Operator - installs and reports on managed addons
#[derive(Parser, Debug)]
#[command(name = "addon-operator", version, about, long_about = None)]
struct Cli {
    /// Generate CRD manifests and exit
    #[arg(long)]
    crd: bool,

    /// Report Addon status to the OCM addon status service
    #[arg(long, env = "ADDON_OPERATOR_ENABLE_STATUS_REPORTING")]
    enable_status_reporting: bool,

    /// Cluster ID used in OCM API paths
    #[arg(long, env = "ADDON_OPERATOR_OCM_CLUSTER_ID")]
    ocm_cluster_id: Option<String>,

    /// Timeout for each OCM API request, in seconds
    #[arg(
        long,
        env = "ADDON_OPERATOR_OCM_REQUEST_TIMEOUT_SECS",
        default_value_t = DEFAULT_REQUEST_TIMEOUT.as_secs()
    )]
    ocm_request_timeout_secs: u64,

    /// Name of the singleton AddonOperator resource
    #[arg(long, env = "ADDON_OPERATOR_NAME", default_value = DEFAULT_ADDON_OPERATOR_NAME)]
    addon_operator_name: String,

    /// Log output format
    #[arg(long, env = "ADDON_OPERATOR_LOG_FORMAT", value_enum, default_value_t = LogFormat::Json)]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = rustls::crypto::aws_lc_rs::default_provider().install_default() {
        eprintln!("CRITICAL: Failed to install crypto provider: {:?}", e);
        std::process::exit(1);
    }

    let cli = Cli::parse();

    if cli.crd {
        let addon_crd = serde_yaml::to_string(&Addon::crd())
            .map_err(|e| anyhow::anyhow!("Failed to serialize Addon CRD: {}", e))?;
        let operator_crd = serde_yaml::to_string(&AddonOperator::crd())
            .map_err(|e| anyhow::anyhow!("Failed to serialize AddonOperator CRD: {}", e))?;
        println!("{addon_crd}---\n{operator_crd}");
        return Ok(());
    }

    init_telemetry(TelemetryConfig {
        json: matches!(cli.log_format, LogFormat::Json),
        ..Default::default()
    })?;

    run_controllers(cli).await
}

/// Install the operator's CRDs by server-side apply
///
/// Keeps the installed CRD versions in step with the running binary.
async fn ensure_crds_installed(client: &Client) -> anyhow::Result<()> {
    let crds: Api<CustomResourceDefinition> = Api::all(client.clone());
    let params = PatchParams::apply(FIELD_MANAGER).force();

    tracing::info!("Installing Addon CRD...");
    crds.patch(
        &format!("addons.{API_GROUP}"),
        &params,
        &Patch::Apply(&Addon::crd()),
    )
    .await
    .map_err(|e| anyhow::anyhow!("Failed to install Addon CRD: {}", e))?;

    tracing::info!("Installing AddonOperator CRD...");
    crds.patch(
        &format!("addonoperators.{API_GROUP}"),
        &params,
        &Patch::Apply(&AddonOperator::crd()),
    )
    .await
    .map_err(|e| anyhow::anyhow!("Failed to install AddonOperator CRD: {}", e))?;

    Ok(())
}

/// Global pause state a previous run left behind
///
/// The pause option lives in memory, so it is restored from the AddonOperator's
/// `Paused` condition before any Addon is reconciled.
async fn load_persisted_pause(client: &Client, name: &str) -> anyhow::Result<bool> {
    let operators: Api<AddonOperator> = Api::all(client.clone());
    let operator = operators
        .get_opt(name)
        .await
        .with_context(|| format!("failed to read AddonOperator {name}"))?;
    Ok(operator.is_some_and(|o| operator_controller::persisted_pause(o.conditions())))
}

async fn run_controllers(cli: Cli) -> anyhow::Result<()> {
    let client = Client::try_default()
        .await
        .context("failed to create Kubernetes client")?;

    ensure_crds_installed(&client).await?;

    let paused = load_persisted_pause(&client, &cli.addon_operator_name).await?;
    if paused {
        tracing::info!("Restoring global pause from AddonOperator status");
    }

    let global_pause = Arc::new(WatchOption::new(GLOBAL_PAUSE_OPTION, paused));
    let status_reporting = Arc::new(WatchOption::new(
        STATUS_REPORTING_OPTION,
        cli.enable_status_reporting,
    ));
    let ocm_slot = Arc::new(OcmClientSlot::new());
    let kube: Arc<dyn KubeClient> = Arc::new(KubeClientImpl::new(client.clone()));
    let metrics: Arc<dyn MetricsRecorder> = Arc::new(OtelMetricsRecorder);

    tracing::info!(
        status_reporting = cli.enable_status_reporting,
        addon_operator = %cli.addon_operator_name,
        "Starting controllers"
    );

    let addon_ctx = Arc::new(addon::Context::new(
        kube.clone(),
        global_pause.clone() as Arc<dyn RuntimeOption>,
        addon::StatusReporter::new(status_reporting, ocm_slot.clone(), Some(metrics)),
    ));
    let operator_ctx = Arc::new(operator_controller::Context {
        kube,
        name: cli.addon_operator_name,
        global_pause: global_pause.clone(),
        ocm: ocm_slot,
        ocm_factory: operator_controller::http_client_factory(),
        ocm_cluster_id: cli.ocm_cluster_id,
        ocm_request_timeout: Duration::from_secs(cli.ocm_request_timeout_secs),
    });

    let controllers = vec![
        build_addon_operator_controller(client.clone(), operator_ctx),
        build_addon_controller(client, addon_ctx, global_pause.subscribe()),
    ];
    futures::future::join_all(controllers).await;

    tracing::info!("Addon operator shutting down");
    Ok(())
}
