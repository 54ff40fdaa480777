//! `demoprov wait`: block until a project reports ready.

use std::path::Path;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::readiness::wait_until_ready;
use crate::infra::manifest::load_manifest;

/// Arguments for the wait command.
#[derive(Args)]
pub struct WaitArgs {
    /// Project name or UUID (default: the manifest's project)
    #[arg(long)]
    pub project: Option<String>,
}

/// Run the wait command.
///
/// # Errors
///
/// Returns an error if no token is set, the project enters an error status,
/// or the attempt limit is reached.
pub async fn run(app: &AppContext, args: &WaitArgs, manifest_path: &Path) -> Result<()> {
    app.settings.token()?;
    let project = match &args.project {
        Some(project) => project.clone(),
        None => load_manifest(manifest_path)?.project.name,
    };

    let reporter = app.reporter();
    let attempts = wait_until_ready(
        &app.platform,
        &app.sleeper,
        &reporter,
        &project,
        app.settings.retry,
    )
    .await?;
    app.renderer().render_ready(&project, attempts)
}
