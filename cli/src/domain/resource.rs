//! Desired resource descriptors and the comparison that drives `ensure`.
//!
//! Comparison is exact field equality between what the manifest asks for and
//! what the platform reports. Attributes are either mutable in place or
//! create-only; drift on a create-only attribute is surfaced but never acted
//! on.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::snapshot::{
    GroupSnapshot, LoadBalancerSnapshot, NodeSnapshot, ProjectSnapshot, RuleSnapshot,
    ServiceSnapshot,
};

// ── Kinds and outcomes ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Project,
    Service,
    EnvVar,
    Group,
    Node,
    Rule,
    LoadBalancer,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Project => "project",
            Self::Service => "service",
            Self::EnvVar => "env var",
            Self::Group => "scheduling group",
            Self::Node => "external node",
            Self::Rule => "network rule",
            Self::LoadBalancer => "load balancer",
        })
    }
}

/// What `ensure` did to a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Unchanged,
    Created,
    Updated,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unchanged => "unchanged",
            Self::Created => "created",
            Self::Updated => "updated",
        })
    }
}

// ── Drift and planning ───────────────────────────────────────────────────────

/// One attribute whose observed value differs from the desired one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Drift {
    pub field: &'static str,
    pub desired: String,
    pub observed: String,
    /// Whether the platform can change this attribute without recreating.
    pub mutable: bool,
}

impl fmt::Display for Drift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: '{}' -> '{}'",
            self.field, self.observed, self.desired
        )
    }
}

/// Observed state of a single resource relative to its desired state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceState {
    Absent,
    Matching,
    Mismatched(Vec<Drift>),
}

/// The action `ensure` should take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    Create,
    /// Nothing to mutate. `ignored` lists create-only drift, if any.
    Converged { ignored: Vec<Drift> },
    Update {
        changes: Vec<Drift>,
        ignored: Vec<Drift>,
    },
}

/// A desired resource that can be compared with its observed counterpart.
pub trait Desired {
    type Observed;
    const KIND: ResourceKind;

    fn name(&self) -> &str;

    /// Every differing attribute, mutable or not.
    fn drift(&self, observed: &Self::Observed) -> Vec<Drift>;
}

/// Classify a resource from its (possibly missing) observed state.
pub fn state<D: Desired>(desired: &D, observed: Option<&D::Observed>) -> ResourceState {
    match observed {
        None => ResourceState::Absent,
        Some(o) => {
            let drift = desired.drift(o);
            if drift.is_empty() {
                ResourceState::Matching
            } else {
                ResourceState::Mismatched(drift)
            }
        }
    }
}

/// Decide what to do about a resource.
pub fn plan<D: Desired>(desired: &D, observed: Option<&D::Observed>) -> Plan {
    match state(desired, observed) {
        ResourceState::Absent => Plan::Create,
        ResourceState::Matching => Plan::Converged {
            ignored: Vec::new(),
        },
        ResourceState::Mismatched(drift) => {
            let (changes, ignored): (Vec<_>, Vec<_>) = drift.into_iter().partition(|d| d.mutable);
            if changes.is_empty() {
                Plan::Converged { ignored }
            } else {
                Plan::Update { changes, ignored }
            }
        }
    }
}

fn compare(out: &mut Vec<Drift>, field: &'static str, desired: &str, observed: &str, mutable: bool) {
    if desired != observed {
        out.push(Drift {
            field,
            desired: desired.to_string(),
            observed: observed.to_string(),
            mutable,
        });
    }
}

// ── Descriptors ──────────────────────────────────────────────────────────────

fn default_monitoring() -> String {
    "none".to_string()
}

fn default_protocol() -> String {
    "tcp".to_string()
}

fn default_source() -> String {
    "0.0.0.0/0".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectSpec {
    pub name: String,
    pub provider: String,
    pub region: String,
    #[serde(default = "default_monitoring")]
    pub monitoring: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceSpec {
    pub name: String,
    pub image: String,
    /// Memory limit in MiB.
    pub memory: u32,
    /// CPU share as the platform spells it, e.g. `"0.5"`.
    pub cpu: String,
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

impl ServiceSpec {
    #[must_use]
    pub fn env_vars(&self) -> Vec<EnvVar> {
        self.env
            .iter()
            .map(|(key, value)| EnvVar {
                key: key.clone(),
                value: value.clone(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvVar {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupSpec {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeSpec {
    pub name: String,
    pub address: String,
    pub group: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleSpec {
    pub name: String,
    #[serde(default = "default_protocol")]
    pub protocol: String,
    pub port: u16,
    #[serde(default = "default_source")]
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoadBalancerSpec {
    pub name: String,
    pub service: String,
    pub port: u16,
}

// ── Comparisons ──────────────────────────────────────────────────────────────

impl Desired for ProjectSpec {
    type Observed = ProjectSnapshot;
    const KIND: ResourceKind = ResourceKind::Project;

    fn name(&self) -> &str {
        &self.name
    }

    /// `project get` reports no creation attributes, so existence is the
    /// only thing compared.
    fn drift(&self, _observed: &ProjectSnapshot) -> Vec<Drift> {
        Vec::new()
    }
}

impl Desired for ServiceSpec {
    type Observed = ServiceSnapshot;
    const KIND: ResourceKind = ResourceKind::Service;

    fn name(&self) -> &str {
        &self.name
    }

    fn drift(&self, observed: &ServiceSnapshot) -> Vec<Drift> {
        let mut out = Vec::new();
        compare(&mut out, "image", &self.image, &observed.image, false);
        compare(
            &mut out,
            "memory",
            &self.memory.to_string(),
            &observed.memory,
            true,
        );
        compare(&mut out, "cpu", &self.cpu, &observed.cpu, true);

        let mut desired_groups = self.groups.clone();
        desired_groups.sort();
        let mut observed_groups = observed.groups.clone();
        observed_groups.sort();
        compare(
            &mut out,
            "groups",
            &desired_groups.join(","),
            &observed_groups.join(","),
            false,
        );
        out
    }
}

impl Desired for EnvVar {
    type Observed = String;
    const KIND: ResourceKind = ResourceKind::EnvVar;

    fn name(&self) -> &str {
        &self.key
    }

    fn drift(&self, observed: &String) -> Vec<Drift> {
        let mut out = Vec::new();
        compare(&mut out, "value", &self.value, observed, true);
        out
    }
}

impl Desired for GroupSpec {
    type Observed = GroupSnapshot;
    const KIND: ResourceKind = ResourceKind::Group;

    fn name(&self) -> &str {
        &self.name
    }

    fn drift(&self, _observed: &GroupSnapshot) -> Vec<Drift> {
        Vec::new()
    }
}

impl Desired for NodeSpec {
    type Observed = NodeSnapshot;
    const KIND: ResourceKind = ResourceKind::Node;

    fn name(&self) -> &str {
        &self.name
    }

    fn drift(&self, observed: &NodeSnapshot) -> Vec<Drift> {
        let mut out = Vec::new();
        compare(&mut out, "address", &self.address, &observed.address, false);
        compare(&mut out, "group", &self.group, &observed.group, false);
        out
    }
}

impl Desired for RuleSpec {
    type Observed = RuleSnapshot;
    const KIND: ResourceKind = ResourceKind::Rule;

    fn name(&self) -> &str {
        &self.name
    }

    fn drift(&self, observed: &RuleSnapshot) -> Vec<Drift> {
        let mut out = Vec::new();
        compare(&mut out, "protocol", &self.protocol, &observed.protocol, false);
        compare(&mut out, "port", &self.port.to_string(), &observed.port, false);
        compare(&mut out, "source", &self.source, &observed.source, false);
        out
    }
}

impl Desired for LoadBalancerSpec {
    type Observed = LoadBalancerSnapshot;
    const KIND: ResourceKind = ResourceKind::LoadBalancer;

    fn name(&self) -> &str {
        &self.name
    }

    fn drift(&self, observed: &LoadBalancerSnapshot) -> Vec<Drift> {
        let mut out = Vec::new();
        compare(&mut out, "service", &self.service, &observed.service, false);
        compare(&mut out, "port", &self.port.to_string(), &observed.port, false);
        out
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
