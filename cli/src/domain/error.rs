//! Typed domain error enum.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! `ProvisionError` implements `thiserror::Error` and converts to
//! `anyhow::Error` via the `?` operator.

use thiserror::Error;

/// Every fatal condition the provisioner can report.
///
/// A resource that is merely not ready yet is not an error: the readiness
/// loop retries it and never builds one of these.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("PLATFORM_TOKEN is not set. Export an API token before running demoprov.")]
    MissingToken,

    #[error("platform CLI '{program}' not found on PATH. Install it or pass --platform-bin.")]
    MissingBinary { program: String },

    #[error("platform CLI version {found} does not satisfy {required}")]
    VersionMismatch { found: String, required: String },

    #[error("invalid manifest:\n{0}")]
    InvalidManifest(String),

    #[error("{resource} entered error status '{status}'")]
    Provisioning { resource: String, status: String },

    #[error("could not find field '{field}' in output of '{command}'")]
    ParseMismatch { command: String, field: String },

    #[error("'{command}' failed with exit code {code}: {stderr}")]
    CommandFailed {
        command: String,
        code: i32,
        stderr: String,
    },

    #[error("project not ready after {attempts} attempts")]
    ReadinessExhausted { attempts: u32 },
}

impl ProvisionError {
    /// `true` for failures detected before (or instead of) touching remote state.
    ///
    /// Parse mismatches count as preconditions: proceeding on a half-read
    /// snapshot would mutate resources based on empty state.
    #[must_use]
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::MissingToken
                | Self::MissingBinary { .. }
                | Self::VersionMismatch { .. }
                | Self::InvalidManifest(_)
                | Self::ParseMismatch { .. }
        )
    }

    /// Stable machine-readable code used by `--json` error output.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingToken => "missing_token",
            Self::MissingBinary { .. } => "missing_binary",
            Self::VersionMismatch { .. } => "version_mismatch",
            Self::InvalidManifest(_) => "invalid_manifest",
            Self::Provisioning { .. } => "provisioning_error",
            Self::ParseMismatch { .. } => "parse_mismatch",
            Self::CommandFailed { .. } => "command_failed",
            Self::ReadinessExhausted { .. } => "readiness_exhausted",
        }
    }
}
