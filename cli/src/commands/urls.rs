//! `demoprov urls`: print the URLs a deployment exposes.

use std::path::Path;

use anyhow::Result;

use crate::app::AppContext;
use crate::application::ports::PlatformInspector;
use crate::application::services::endpoints::collect_endpoints;
use crate::application::services::preflight::preflight;
use crate::domain::ProjectHandle;
use crate::infra::manifest::load_manifest;

/// Run the urls command. Read-only; a project that does not exist yet has
/// no endpoints.
///
/// # Errors
///
/// Returns an error if preflight fails or a platform query fails.
pub async fn run(app: &AppContext, manifest_path: &Path) -> Result<()> {
    let manifest = load_manifest(manifest_path)?;
    preflight(&app.settings, Some(&manifest), &app.platform).await?;

    let endpoints = match app.platform.project(&manifest.project.name).await? {
        Some(snapshot) => {
            let handle = ProjectHandle::from_snapshot(&snapshot);
            collect_endpoints(&app.platform, &handle, &manifest).await?
        }
        None => Vec::new(),
    };
    app.renderer().render_endpoints(&endpoints)
}
