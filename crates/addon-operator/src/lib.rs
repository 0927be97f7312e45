//! Addon operator: reconciles Addons and the AddonOperator singleton
//!
//! - The AddonOperator controller drives the global pause and installs the
//!   OCM client from the resource's OCM configuration.
//! - The Addon controller gates on pause and mirrors Addon conditions to the
//!   OCM addon status service.

#![deny(missing_docs)]

pub mod controller;
pub mod controller_runner;
pub mod kube_client;

#[cfg(test)]
pub(crate) mod test_support;

pub use addon_common::crd;
pub use addon_common::{Error, Result};
