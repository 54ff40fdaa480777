//! Observed state as reported by the platform, already decoded from text.
//!
//! Snapshots are read-only values rebuilt before every comparison.

use serde::Serialize;

/// A project as returned by `project get`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSnapshot {
    pub name: String,
    pub uuid: String,
    pub status: String,
    /// Number of nodes currently able to take scheduled work.
    pub available: u32,
}

/// A service as returned by `service get`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ServiceSnapshot {
    pub name: String,
    pub image: String,
    pub memory: String,
    pub cpu: String,
    pub groups: Vec<String>,
    pub status: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSnapshot {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSnapshot {
    pub name: String,
    pub address: String,
    pub group: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSnapshot {
    pub name: String,
    pub protocol: String,
    pub port: String,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadBalancerSnapshot {
    pub name: String,
    pub service: String,
    pub port: String,
    pub url: Option<String>,
}

/// Identifies the target project once it exists.
///
/// `uuid` is `None` only during a dry run whose project has not been
/// created yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectHandle {
    pub name: String,
    pub uuid: Option<String>,
}

impl ProjectHandle {
    #[must_use]
    pub fn from_snapshot(snapshot: &ProjectSnapshot) -> Self {
        Self {
            name: snapshot.name.clone(),
            uuid: Some(snapshot.uuid.clone()),
        }
    }

    /// Value passed to `--project`: the UUID when known, else the name.
    #[must_use]
    pub fn selector(&self) -> &str {
        self.uuid.as_deref().unwrap_or(&self.name)
    }
}
