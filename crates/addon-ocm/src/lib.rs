//! OCM addon status service client
//!
//! The [`OcmClient`] trait is what controllers depend on. [`HttpOcmClient`]
//! talks to the real service; [`OcmClientSlot`] lets the AddonOperator
//! controller install or replace the client while Addon reconcilers read it.

#![deny(missing_docs)]

mod client;
mod error;
mod slot;

pub use client::{
    AddonStatusPatchRequest, AddonStatusPostRequest, HttpOcmClient, OcmClient, OcmClientConfig,
    DEFAULT_REQUEST_TIMEOUT,
};
#[cfg(test)]
pub use client::MockOcmClient;
pub use error::OcmError;
pub use slot::OcmClientSlot;
