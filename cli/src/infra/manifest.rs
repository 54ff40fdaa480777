//! Loading deployment manifests from disk.

use std::path::Path;

use anyhow::{Context, Result};

use crate::domain::Manifest;

/// Read and deserialize a manifest. Validation is left to preflight so that
/// every rule violation is reported together.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a valid manifest
/// document.
pub fn load_manifest(path: &Path) -> Result<Manifest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read manifest {}", path.display()))?;
    serde_yaml::from_str(&content)
        .with_context(|| format!("cannot parse manifest {}", path.display()))
}
