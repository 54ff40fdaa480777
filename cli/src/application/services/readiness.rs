//! Application service: wait until a project can take scheduled work.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use anyhow::Result;

use crate::application::ports::{PlatformInspector, ProgressReporter, Sleeper};
use crate::domain::readiness::{self, Readiness, RetryPolicy};
use crate::domain::ProvisionError;

/// Poll the project until it reports a ready status with capacity.
///
/// Sleeps `policy.interval` between polls, never after the last one. With
/// no `max_attempts` this loops until the project is ready or fails.
///
/// Returns the number of polls made.
///
/// # Errors
///
/// Returns `ProvisionError::Provisioning` as soon as an error status is
/// observed, `ProvisionError::ReadinessExhausted` when the policy runs out,
/// or any error from the platform query itself.
pub async fn wait_until_ready(
    platform: &impl PlatformInspector,
    sleeper: &impl Sleeper,
    reporter: &impl ProgressReporter,
    project: &str,
    policy: RetryPolicy,
) -> Result<u32> {
    let mut attempts: u32 = 0;
    let mut last_reason = String::new();

    loop {
        attempts = attempts.saturating_add(1);
        let snapshot = platform.project(project).await?;

        match readiness::classify(snapshot.as_ref()) {
            Readiness::Ready => {
                tracing::info!(project, attempts, "project ready");
                reporter.success(&format!("project {project} is ready"));
                return Ok(attempts);
            }
            Readiness::Failed { status } => {
                tracing::error!(project, %status, "project entered error status");
                return Err(ProvisionError::Provisioning {
                    resource: format!("project {project}"),
                    status,
                }
                .into());
            }
            Readiness::Pending { reason } => {
                tracing::debug!(project, attempts, %reason, "project not ready");
                if reason != last_reason {
                    reporter.step(&format!("waiting for project {project} ({reason})..."));
                    last_reason = reason;
                }
            }
        }

        if policy.exhausted(attempts) {
            return Err(ProvisionError::ReadinessExhausted { attempts }.into());
        }
        sleeper.sleep(policy.interval).await;
    }
}
