//! Application service: the full provisioning pipeline.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//! All I/O is routed through injected port traits.

use anyhow::Result;
use serde::Serialize;

use crate::application::ports::{Platform, ProgressReporter, Sleeper};
use crate::application::services::endpoints::{Endpoint, collect_endpoints};
use crate::application::services::ensure;
use crate::application::services::preflight::preflight;
use crate::application::services::readiness::wait_until_ready;
use crate::domain::{Manifest, Outcome, ProjectHandle, ResourceKind, Settings};

/// One resource touched (or checked) by a deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Change {
    pub kind: ResourceKind,
    pub name: String,
    pub outcome: Outcome,
}

/// Everything a deployment did, plus where to reach the result.
#[derive(Debug, Clone, Serialize)]
pub struct DeployReport {
    pub project: ProjectHandle,
    pub dry_run: bool,
    pub changes: Vec<Change>,
    pub endpoints: Vec<Endpoint>,
}

impl DeployReport {
    /// Number of changes with the given outcome.
    #[must_use]
    pub fn count(&self, outcome: Outcome) -> usize {
        self.changes.iter().filter(|c| c.outcome == outcome).count()
    }
}

/// Converge the platform to `manifest`.
///
/// Order: preflight, project, readiness wait, groups, nodes, services (each
/// followed by its env vars), rules, load balancers, endpoints. The
/// readiness wait is skipped in a dry run. The first error aborts the run.
///
/// # Errors
///
/// Returns the first precondition, provisioning, parse, or command error.
pub async fn deploy(
    platform: &impl Platform,
    sleeper: &impl Sleeper,
    reporter: &impl ProgressReporter,
    settings: &Settings,
    manifest: &Manifest,
) -> Result<DeployReport> {
    preflight(settings, Some(manifest), platform).await?;

    let mut changes = Vec::new();
    let mut record = |kind: ResourceKind, name: &str, outcome: Outcome| {
        changes.push(Change {
            kind,
            name: name.to_string(),
            outcome,
        });
    };

    let (outcome, project) = ensure::ensure_project(platform, reporter, &manifest.project).await?;
    record(ResourceKind::Project, &manifest.project.name, outcome);

    if settings.dry_run {
        reporter.step("dry-run: skipping readiness wait");
    } else {
        wait_until_ready(
            platform,
            sleeper,
            reporter,
            &project.name,
            settings.retry,
        )
        .await?;
    }

    for group in &manifest.groups {
        let outcome = ensure::ensure_group(platform, reporter, &project, group).await?;
        record(ResourceKind::Group, &group.name, outcome);
    }

    for node in &manifest.nodes {
        let outcome = ensure::ensure_node(platform, reporter, &project, node).await?;
        record(ResourceKind::Node, &node.name, outcome);
    }

    for service in &manifest.services {
        let outcome = ensure::ensure_service(platform, reporter, &project, service).await?;
        record(ResourceKind::Service, &service.name, outcome);

        for var in service.env_vars() {
            let outcome =
                ensure::ensure_env_var(platform, reporter, &project, &service.name, &var).await?;
            record(
                ResourceKind::EnvVar,
                &format!("{}/{}", service.name, var.key),
                outcome,
            );
        }
    }

    for rule in &manifest.rules {
        let outcome = ensure::ensure_rule(platform, reporter, &project, rule).await?;
        record(ResourceKind::Rule, &rule.name, outcome);
    }

    for lb in &manifest.load_balancers {
        let outcome = ensure::ensure_load_balancer(platform, reporter, &project, lb).await?;
        record(ResourceKind::LoadBalancer, &lb.name, outcome);
    }

    let endpoints = collect_endpoints(platform, &project, manifest).await?;

    Ok(DeployReport {
        project,
        dry_run: settings.dry_run,
        changes,
        endpoints,
    })
}
