//! Application service: checks that must pass before any remote change.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use anyhow::Result;

use crate::application::ports::PlatformInspector;
use crate::domain::{Manifest, ProvisionError, Settings};

/// Verify the token, the manifest, and the platform CLI version, in that
/// order.
///
/// The token check runs first and touches nothing external. Returns the
/// detected CLI version.
///
/// # Errors
///
/// Returns `MissingToken`, `InvalidManifest`, `VersionMismatch`, or
/// `MissingBinary` (via the inspector).
pub async fn preflight(
    settings: &Settings,
    manifest: Option<&Manifest>,
    platform: &impl PlatformInspector,
) -> Result<semver::Version> {
    settings.token()?;

    if let Some(manifest) = manifest {
        manifest.validate()?;
    }

    let version = platform.cli_version().await?;
    if !settings.platform_version.matches(&version) {
        return Err(ProvisionError::VersionMismatch {
            found: version.to_string(),
            required: settings.platform_version.to_string(),
        }
        .into());
    }
    tracing::debug!(%version, "platform CLI version accepted");
    Ok(version)
}
