//! `demoprov check`: run preflight checks without touching anything.

use std::path::Path;

use anyhow::Result;

use crate::app::AppContext;
use crate::application::services::preflight::preflight;
use crate::infra::manifest::load_manifest;

/// Run the check command.
///
/// # Errors
///
/// Returns the first failed precondition.
pub async fn run(app: &AppContext, manifest_path: &Path) -> Result<()> {
    let manifest = load_manifest(manifest_path)?;
    let version = preflight(&app.settings, Some(&manifest), &app.platform).await?;
    app.renderer()
        .render_check(&app.settings.platform_bin, &version)
}
