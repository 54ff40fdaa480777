//! Domain layer: pure types, comparison, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod config;
pub mod error;
pub mod manifest;
pub mod readiness;
pub mod resource;
pub mod snapshot;

pub use config::{Overrides, Settings, ToolConfig};
pub use error::ProvisionError;
pub use manifest::Manifest;
pub use readiness::{Readiness, RetryPolicy};
pub use resource::{Desired, Drift, Outcome, Plan, ResourceKind, ResourceState};
pub use snapshot::ProjectHandle;
