//! Human-readable terminal renderer.

use owo_colors::OwoColorize as _;

use crate::application::services::deploy::DeployReport;
use crate::application::services::endpoints::Endpoint;
use crate::domain::Outcome;
use crate::output::OutputContext;

/// Renders results as human-readable terminal output using `OutputContext`.
pub struct HumanRenderer<'a> {
    ctx: &'a OutputContext,
}

impl<'a> HumanRenderer<'a> {
    /// Create a new `HumanRenderer` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }

    /// Render a deployment: one line per resource, totals, then endpoints.
    pub fn render_report(&self, report: &DeployReport) {
        if self.ctx.quiet {
            return;
        }
        println!();
        let title = if report.dry_run {
            format!("Dry run for project {}", report.project.name)
        } else {
            format!("Project {}", report.project.name)
        };
        self.ctx.header(&title);

        let width = report
            .changes
            .iter()
            .map(|c| c.kind.to_string().len())
            .max()
            .unwrap_or(0);
        for change in &report.changes {
            let outcome = change.outcome.to_string();
            let styled = match change.outcome {
                Outcome::Created => outcome.style(self.ctx.styles.success).to_string(),
                Outcome::Updated => outcome.style(self.ctx.styles.warning).to_string(),
                Outcome::Unchanged => outcome.style(self.ctx.styles.dim).to_string(),
            };
            println!(
                "  {:<width$}  {:<10} {}",
                change.kind.to_string(),
                styled,
                change.name
            );
        }

        println!();
        self.ctx.info(&summary_line(report));
        if !report.endpoints.is_empty() {
            println!();
            self.render_endpoints(&report.endpoints);
        }
    }

    /// Render endpoint URLs.
    pub fn render_endpoints(&self, endpoints: &[Endpoint]) {
        if self.ctx.quiet {
            return;
        }
        if endpoints.is_empty() {
            self.ctx.info("No endpoints exposed yet.");
            return;
        }
        self.ctx.header("Endpoints:");
        for endpoint in endpoints {
            self.ctx.kv(&format!("{:<20}", endpoint.name), &endpoint.url);
        }
    }

    /// Render preflight results.
    pub fn render_check(&self, platform_bin: &str, version: &semver::Version) {
        self.ctx.success("Token present");
        self.ctx.success("Manifest valid");
        self.ctx
            .success(&format!("{platform_bin} {version} satisfies version requirement"));
    }

    /// Render a successful readiness wait.
    pub fn render_ready(&self, project: &str, attempts: u32) {
        let polls = if attempts == 1 { "poll" } else { "polls" };
        self.ctx
            .success(&format!("Project {project} ready after {attempts} {polls}"));
    }
}

/// `"2 created, 1 updated, 5 unchanged"`.
#[must_use]
pub fn summary_line(report: &DeployReport) -> String {
    format!(
        "{} created, {} updated, {} unchanged",
        report.count(Outcome::Created),
        report.count(Outcome::Updated),
        report.count(Outcome::Unchanged)
    )
}
