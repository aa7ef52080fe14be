//! Asset purge service
//!
//! Removes retired image assets from an S3 bucket and evicts their cached copies
//! from a CloudFront distribution. Each logical identifier resolves to a primary
//! object (and optionally a secondary one, e.g. a thumbnail); every target is
//! deleted from the store and, when it is still served by the edge, invalidated.
//!
//! Per-target problems never abort a run. They are recorded as outcomes and
//! surface in the final [`models::RunSummary`].

pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod report;
pub mod services;
pub mod source;

pub use crate::config::PurgeConfig;
pub use error::{ProviderError, PurgeError, Result};
pub use models::{Operation, PurgeOutcome, PurgeStatus, PurgeTarget, RunSummary, TargetRole};
pub use services::coordinator::execute;
