//! Application service: idempotent `ensure` for every resource kind.
//!
//! Each function reads current state, plans against the desired descriptor,
//! and issues at most one mutating call. Imports only from `crate::domain`
//! and `crate::application::ports`.

use std::future::Future;

use anyhow::{Context, Result};

use crate::application::ports::{Mutation, Platform, ProgressReporter, ServiceUpdate};
use crate::domain::readiness::is_error_status;
use crate::domain::resource::{
    self, Desired, Drift, EnvVar, GroupSpec, LoadBalancerSpec, NodeSpec, Outcome, Plan,
    ProjectSpec, RuleSpec, ServiceSpec,
};
use crate::domain::{ProjectHandle, ProvisionError};

/// Ensure the project exists and return its handle.
///
/// After a real create the project is read back to learn its UUID. In a dry
/// run the returned handle has no UUID.
///
/// # Errors
///
/// Returns an error if a platform call fails or the created project cannot
/// be read back.
pub async fn ensure_project(
    platform: &impl Platform,
    reporter: &impl ProgressReporter,
    spec: &ProjectSpec,
) -> Result<(Outcome, ProjectHandle)> {
    if let Some(existing) = platform.project(&spec.name).await? {
        log_outcome(spec, Outcome::Unchanged);
        return Ok((Outcome::Unchanged, ProjectHandle::from_snapshot(&existing)));
    }

    reporter.step(&format!("creating project {}...", spec.name));
    let mutation = platform
        .create_project(spec)
        .await
        .with_context(|| format!("creating project {}", spec.name))?;

    let handle = match mutation {
        Mutation::Echoed(cmd) => {
            report_echo(reporter, &cmd);
            ProjectHandle {
                name: spec.name.clone(),
                uuid: None,
            }
        }
        Mutation::Applied => {
            let created = platform.project(&spec.name).await?.ok_or_else(|| {
                ProvisionError::ParseMismatch {
                    command: format!("project get {}", spec.name),
                    field: "uuid".to_string(),
                }
            })?;
            reporter.success(&format!("project {} created", spec.name));
            ProjectHandle::from_snapshot(&created)
        }
    };
    log_outcome(spec, Outcome::Created);
    Ok((Outcome::Created, handle))
}

/// Ensure a service exists with the desired memory and CPU.
///
/// # Errors
///
/// Returns `ProvisionError::Provisioning` if the service reports an error
/// status, or an error if a platform call fails.
pub async fn ensure_service(
    platform: &impl Platform,
    reporter: &impl ProgressReporter,
    project: &ProjectHandle,
    spec: &ServiceSpec,
) -> Result<Outcome> {
    let observed = platform.service(project, &spec.name).await?;
    if let Some(service) = observed.as_ref().filter(|s| is_error_status(&s.status)) {
        return Err(ProvisionError::Provisioning {
            resource: format!("service {}", spec.name),
            status: service.status.clone(),
        }
        .into());
    }

    let outcome = match resource::plan(spec, observed.as_ref()) {
        Plan::Create => {
            reporter.step(&format!("creating service {}...", spec.name));
            let mutation = platform
                .create_service(project, spec)
                .await
                .with_context(|| format!("creating service {}", spec.name))?;
            report_mutation(reporter, mutation, &format!("service {} created", spec.name));
            Outcome::Created
        }
        Plan::Converged { ignored } => {
            warn_ignored(reporter, spec, &ignored);
            Outcome::Unchanged
        }
        Plan::Update { changes, ignored } => {
            warn_ignored(reporter, spec, &ignored);
            let update = ServiceUpdate {
                memory: desired_value(&changes, "memory"),
                cpu: desired_value(&changes, "cpu"),
            };
            reporter.step(&format!(
                "updating service {} ({})...",
                spec.name,
                describe(&changes)
            ));
            let mutation = platform
                .update_service(project, &spec.name, &update)
                .await
                .with_context(|| format!("updating service {}", spec.name))?;
            report_mutation(reporter, mutation, &format!("service {} updated", spec.name));
            Outcome::Updated
        }
    };
    log_outcome(spec, outcome);
    Ok(outcome)
}

/// Ensure one environment variable of a service has the desired value.
///
/// # Errors
///
/// Returns an error if a platform call fails.
pub async fn ensure_env_var(
    platform: &impl Platform,
    reporter: &impl ProgressReporter,
    project: &ProjectHandle,
    service: &str,
    var: &EnvVar,
) -> Result<Outcome> {
    let current = platform.env_vars(project, service).await?;
    let outcome = match resource::plan(var, current.get(&var.key)) {
        Plan::Converged { .. } => Outcome::Unchanged,
        plan => {
            let outcome = if plan == Plan::Create {
                Outcome::Created
            } else {
                Outcome::Updated
            };
            let mutation = platform
                .set_env(project, service, var)
                .await
                .with_context(|| format!("setting {} on service {service}", var.key))?;
            report_mutation(
                reporter,
                mutation,
                &format!("{} set on service {service}", var.key),
            );
            outcome
        }
    };
    log_outcome(var, outcome);
    Ok(outcome)
}

/// Ensure a scheduling group exists.
///
/// # Errors
///
/// Returns an error if a platform call fails.
pub async fn ensure_group(
    platform: &impl Platform,
    reporter: &impl ProgressReporter,
    project: &ProjectHandle,
    spec: &GroupSpec,
) -> Result<Outcome> {
    let groups = platform.groups(project).await?;
    let observed = groups.iter().find(|g| g.name == spec.name);
    ensure_create_only(reporter, spec, observed, platform.create_group(project, spec)).await
}

/// Ensure an external node is attached.
///
/// # Errors
///
/// Returns an error if a platform call fails.
pub async fn ensure_node(
    platform: &impl Platform,
    reporter: &impl ProgressReporter,
    project: &ProjectHandle,
    spec: &NodeSpec,
) -> Result<Outcome> {
    let nodes = platform.nodes(project).await?;
    let observed = nodes.iter().find(|n| n.name == spec.name);
    ensure_create_only(reporter, spec, observed, platform.add_node(project, spec)).await
}

/// Ensure a network rule exists.
///
/// # Errors
///
/// Returns an error if a platform call fails.
pub async fn ensure_rule(
    platform: &impl Platform,
    reporter: &impl ProgressReporter,
    project: &ProjectHandle,
    spec: &RuleSpec,
) -> Result<Outcome> {
    let rules = platform.rules(project).await?;
    let observed = rules.iter().find(|r| r.name == spec.name);
    ensure_create_only(reporter, spec, observed, platform.create_rule(project, spec)).await
}

/// Ensure a load balancer exists.
///
/// # Errors
///
/// Returns an error if a platform call fails.
pub async fn ensure_load_balancer(
    platform: &impl Platform,
    reporter: &impl ProgressReporter,
    project: &ProjectHandle,
    spec: &LoadBalancerSpec,
) -> Result<Outcome> {
    let lbs = platform.load_balancers(project).await?;
    let observed = lbs.iter().find(|l| l.name == spec.name);
    ensure_create_only(
        reporter,
        spec,
        observed,
        platform.create_load_balancer(project, spec),
    )
    .await
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Shared path for kinds with no in-place updates.
///
/// `create` is only awaited when the resource is absent.
async fn ensure_create_only<D: Desired>(
    reporter: &impl ProgressReporter,
    desired: &D,
    observed: Option<&D::Observed>,
    create: impl Future<Output = Result<Mutation>>,
) -> Result<Outcome> {
    let outcome = match resource::plan(desired, observed) {
        Plan::Create => {
            reporter.step(&format!("creating {} {}...", D::KIND, desired.name()));
            let mutation = create
                .await
                .with_context(|| format!("creating {} {}", D::KIND, desired.name()))?;
            report_mutation(
                reporter,
                mutation,
                &format!("{} {} created", D::KIND, desired.name()),
            );
            Outcome::Created
        }
        Plan::Converged { ignored } => {
            warn_ignored(reporter, desired, &ignored);
            Outcome::Unchanged
        }
        Plan::Update {
            mut changes,
            ignored,
        } => {
            changes.extend(ignored);
            warn_ignored(reporter, desired, &changes);
            Outcome::Unchanged
        }
    };
    log_outcome(desired, outcome);
    Ok(outcome)
}

fn report_mutation(reporter: &impl ProgressReporter, mutation: Mutation, done: &str) {
    match mutation {
        Mutation::Applied => reporter.success(done),
        Mutation::Echoed(cmd) => report_echo(reporter, &cmd),
    }
}

fn report_echo(reporter: &impl ProgressReporter, cmd: &str) {
    reporter.step(&format!("dry-run: {cmd}"));
}

fn warn_ignored<D: Desired>(reporter: &impl ProgressReporter, desired: &D, ignored: &[Drift]) {
    for drift in ignored {
        tracing::warn!(
            kind = %D::KIND,
            name = desired.name(),
            field = drift.field,
            observed = %drift.observed,
            desired = %drift.desired,
            "create-only attribute drifted"
        );
        reporter.warn(&format!(
            "{} {}: {drift} cannot be changed in place; recreate it to apply",
            D::KIND,
            desired.name()
        ));
    }
}

fn log_outcome<D: Desired>(desired: &D, outcome: Outcome) {
    tracing::info!(kind = %D::KIND, name = desired.name(), %outcome, "ensured");
}

fn desired_value(changes: &[Drift], field: &str) -> Option<String> {
    changes
        .iter()
        .find(|d| d.field == field)
        .map(|d| d.desired.clone())
}

fn describe(changes: &[Drift]) -> String {
    changes
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
