//! Project readiness classification and the polling policy.

use std::time::Duration;

use crate::domain::snapshot::ProjectSnapshot;

/// Statuses that mean the project can accept scheduled work.
pub const READY_STATUSES: &[&str] = &["ok", "ready"];

/// Statuses that mean provisioning failed and will not recover on its own.
pub const ERROR_STATUSES: &[&str] = &["error", "failed"];

/// `true` for any status in `ERROR_STATUSES`, case-insensitively.
#[must_use]
pub fn is_error_status(status: &str) -> bool {
    ERROR_STATUSES
        .iter()
        .any(|s| s.eq_ignore_ascii_case(status.trim()))
}

/// How often to poll and whether to give up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub interval: Duration,
    /// `None` polls forever.
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_attempts: None,
        }
    }
}

impl RetryPolicy {
    /// `true` once `attempts` polls have been made and the policy says stop.
    #[must_use]
    pub fn exhausted(&self, attempts: u32) -> bool {
        self.max_attempts.is_some_and(|max| attempts >= max)
    }
}

/// Result of inspecting one project snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    Ready,
    Pending { reason: String },
    Failed { status: String },
}

/// Classify a project snapshot. A project not visible yet is pending.
#[must_use]
pub fn classify(snapshot: Option<&ProjectSnapshot>) -> Readiness {
    let Some(project) = snapshot else {
        return Readiness::Pending {
            reason: "project not visible yet".to_string(),
        };
    };
    if is_error_status(&project.status) {
        return Readiness::Failed {
            status: project.status.clone(),
        };
    }
    let status = project.status.trim().to_ascii_lowercase();
    if !READY_STATUSES.contains(&status.as_str()) {
        return Readiness::Pending {
            reason: format!("status {}", project.status),
        };
    }
    if project.available == 0 {
        return Readiness::Pending {
            reason: "no capacity available".to_string(),
        };
    }
    Readiness::Ready
}
