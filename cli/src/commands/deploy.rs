//! `demoprov deploy`: converge the platform to the manifest.

use std::path::Path;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::deploy::deploy;
use crate::infra::manifest::load_manifest;

/// Arguments for the deploy command.
#[derive(Args)]
pub struct DeployArgs {
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Run the deploy command.
///
/// # Errors
///
/// Returns an error if the manifest cannot be loaded, preflight fails, or
/// any platform call fails.
pub async fn run(app: &AppContext, manifest_path: &Path) -> Result<()> {
    let manifest = load_manifest(manifest_path)?;
    // Fail on a missing token before prompting.
    app.settings.token()?;

    if !app.settings.dry_run
        && !app.confirm(
            &format!("Deploy project '{}'?", manifest.project.name),
            true,
        )?
    {
        app.output.info("Aborted.");
        return Ok(());
    }

    let reporter = app.reporter();
    let report = deploy(
        &app.platform,
        &app.sleeper,
        &reporter,
        &app.settings,
        &manifest,
    )
    .await?;
    app.renderer().render_report(&report)
}
