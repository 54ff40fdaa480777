//! The deployment manifest and its validation rules.
//!
//! Pure functions only: no I/O, no async, no filesystem access.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::error::ProvisionError;
use crate::domain::resource::{
    GroupSpec, LoadBalancerSpec, NodeSpec, ProjectSpec, RuleSpec, ServiceSpec,
};

/// Project names the platform accepts: 3–40 chars, lowercase, starts with a
/// letter, no trailing hyphen.
pub static PROJECT_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    // Safety: this is a compile-time constant pattern and cannot fail.
    #[allow(clippy::expect_used)]
    Regex::new(r"^[a-z][a-z0-9-]{1,38}[a-z0-9]$").expect("valid regex")
});

pub const VALID_PROVIDERS: &[&str] = &["aws", "gcp", "azure", "digitalocean"];
pub const VALID_MONITORING: &[&str] = &["none", "basic", "full"];

/// Everything one deployment should converge to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    pub project: ProjectSpec,
    #[serde(default)]
    pub groups: Vec<GroupSpec>,
    #[serde(default)]
    pub nodes: Vec<NodeSpec>,
    #[serde(default)]
    pub services: Vec<ServiceSpec>,
    #[serde(default)]
    pub rules: Vec<RuleSpec>,
    #[serde(default)]
    pub load_balancers: Vec<LoadBalancerSpec>,
}

impl Manifest {
    /// Check the manifest against every rule and report all violations at once.
    ///
    /// # Errors
    ///
    /// Returns `ProvisionError::InvalidManifest` listing each problem found.
    pub fn validate(&self) -> Result<(), ProvisionError> {
        let mut errors: Vec<String> = Vec::new();

        if !PROJECT_NAME_RE.is_match(&self.project.name) {
            errors.push(format!(
                "project name '{}' must be 3-40 lowercase letters, digits or hyphens and start with a letter",
                self.project.name
            ));
        }
        if !VALID_PROVIDERS.contains(&self.project.provider.as_str()) {
            errors.push(format!(
                "unsupported provider '{}' (valid: {})",
                self.project.provider,
                VALID_PROVIDERS.join(", ")
            ));
        }
        if !VALID_MONITORING.contains(&self.project.monitoring.as_str()) {
            errors.push(format!(
                "unsupported monitoring '{}' (valid: {})",
                self.project.monitoring,
                VALID_MONITORING.join(", ")
            ));
        }
        if self.project.region.trim().is_empty() {
            errors.push("project region must not be empty".to_string());
        }

        duplicates("group", self.groups.iter().map(|g| g.name.as_str()), &mut errors);
        duplicates("node", self.nodes.iter().map(|n| n.name.as_str()), &mut errors);
        duplicates("service", self.services.iter().map(|s| s.name.as_str()), &mut errors);
        duplicates("rule", self.rules.iter().map(|r| r.name.as_str()), &mut errors);
        duplicates(
            "load balancer",
            self.load_balancers.iter().map(|l| l.name.as_str()),
            &mut errors,
        );

        let groups: HashSet<&str> = self.groups.iter().map(|g| g.name.as_str()).collect();
        for node in &self.nodes {
            if !groups.contains(node.group.as_str()) {
                errors.push(format!(
                    "node '{}' references undeclared group '{}'",
                    node.name, node.group
                ));
            }
        }
        for service in &self.services {
            for group in &service.groups {
                if !groups.contains(group.as_str()) {
                    errors.push(format!(
                        "service '{}' references undeclared group '{group}'",
                        service.name
                    ));
                }
            }
            if service.memory == 0 {
                errors.push(format!("service '{}' memory must be positive", service.name));
            }
        }

        let services: HashSet<&str> = self.services.iter().map(|s| s.name.as_str()).collect();
        for lb in &self.load_balancers {
            if !services.contains(lb.service.as_str()) {
                errors.push(format!(
                    "load balancer '{}' references undeclared service '{}'",
                    lb.name, lb.service
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ProvisionError::InvalidManifest(
                errors
                    .iter()
                    .map(|e| format!("  - {e}"))
                    .collect::<Vec<_>>()
                    .join("\n"),
            ))
        }
    }
}

fn duplicates<'a>(kind: &str, names: impl Iterator<Item = &'a str>, errors: &mut Vec<String>) {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            errors.push(format!("duplicate {kind} name '{name}'"));
        }
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
