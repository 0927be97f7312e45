//! Common types for the addon operator: CRDs, conditions, runtime options,
//! errors and observability

#![deny(missing_docs)]

pub mod conditions;
pub mod crd;
pub mod error;
pub mod metrics;
pub mod runtime_options;
pub mod telemetry;

pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// API group of all addon operator CRDs
pub const API_GROUP: &str = "addons.managed.openshift.io";

/// Conventional name of the singleton AddonOperator resource
pub const DEFAULT_ADDON_OPERATOR_NAME: &str = "addon-operator";

/// Field manager used for server-side apply and status patches
pub const FIELD_MANAGER: &str = "addon-operator";
