//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain`, never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::collections::BTreeMap;
use std::process::Output;
use std::time::Duration;

use anyhow::Result;

use crate::domain::{ProjectHandle, ToolConfig};
use crate::domain::resource::{
    EnvVar, GroupSpec, LoadBalancerSpec, NodeSpec, ProjectSpec, RuleSpec, ServiceSpec,
};
use crate::domain::snapshot::{
    GroupSnapshot, LoadBalancerSnapshot, NodeSnapshot, ProjectSnapshot, RuleSnapshot,
    ServiceSnapshot,
};

// ── Value Types ───────────────────────────────────────────────────────────────

/// Result of a mutating platform call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// The command ran and exited zero.
    Applied,
    /// Dry run: the command was not run. Carries its shell-quoted form.
    Echoed(String),
}

/// In-place changes to a service. `None` leaves the attribute alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceUpdate {
    pub memory: Option<String>,
    pub cpu: Option<String>,
}

// ── Platform Port Traits ──────────────────────────────────────────────────────

/// Read-only platform queries.
///
/// A resource the platform cannot find is `Ok(None)` (or an empty
/// collection), never an error. Output the adapter cannot decode is an error.
#[allow(async_fn_in_trait)]
pub trait PlatformInspector {
    /// Version of the installed platform CLI.
    async fn cli_version(&self) -> Result<semver::Version>;
    async fn project(&self, name: &str) -> Result<Option<ProjectSnapshot>>;
    async fn service(&self, project: &ProjectHandle, name: &str)
    -> Result<Option<ServiceSnapshot>>;
    async fn env_vars(
        &self,
        project: &ProjectHandle,
        service: &str,
    ) -> Result<BTreeMap<String, String>>;
    async fn groups(&self, project: &ProjectHandle) -> Result<Vec<GroupSnapshot>>;
    async fn nodes(&self, project: &ProjectHandle) -> Result<Vec<NodeSnapshot>>;
    async fn rules(&self, project: &ProjectHandle) -> Result<Vec<RuleSnapshot>>;
    async fn load_balancers(&self, project: &ProjectHandle) -> Result<Vec<LoadBalancerSnapshot>>;
}

/// Mutating platform calls. A non-zero exit is an error.
#[allow(async_fn_in_trait)]
pub trait PlatformMutator {
    async fn create_project(&self, spec: &ProjectSpec) -> Result<Mutation>;
    async fn create_service(&self, project: &ProjectHandle, spec: &ServiceSpec)
    -> Result<Mutation>;
    async fn update_service(
        &self,
        project: &ProjectHandle,
        name: &str,
        update: &ServiceUpdate,
    ) -> Result<Mutation>;
    async fn set_env(&self, project: &ProjectHandle, service: &str, var: &EnvVar)
    -> Result<Mutation>;
    async fn create_group(&self, project: &ProjectHandle, spec: &GroupSpec) -> Result<Mutation>;
    async fn add_node(&self, project: &ProjectHandle, spec: &NodeSpec) -> Result<Mutation>;
    async fn create_rule(&self, project: &ProjectHandle, spec: &RuleSpec) -> Result<Mutation>;
    async fn create_load_balancer(
        &self,
        project: &ProjectHandle,
        spec: &LoadBalancerSpec,
    ) -> Result<Mutation>;
}

/// Composite trait: any type implementing both sub-traits is a `Platform`.
pub trait Platform: PlatformInspector + PlatformMutator {}

/// Blanket implementation: any type implementing both sub-traits is a `Platform`.
impl<T> Platform for T where T: PlatformInspector + PlatformMutator {}

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program and capture its output.
    ///
    /// Implementations should delegate to `run_with_timeout` using the
    /// instance's configured default timeout.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;
    /// Run a program with a custom timeout override.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output>;
}

/// Lets an adapter borrow a runner the caller keeps inspecting.
impl<T: CommandRunner> CommandRunner for &T {
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output> {
        (**self).run(program, args).await
    }

    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output> {
        (**self).run_with_timeout(program, args, timeout).await
    }
}

// ── Clock Port ────────────────────────────────────────────────────────────────

/// Abstracts waiting so polling loops can run on a fake clock in tests.
#[allow(async_fn_in_trait)]
pub trait Sleeper {
    async fn sleep(&self, duration: Duration);
}

// ── Config Port ───────────────────────────────────────────────────────────────

/// Abstracts where tool defaults are stored.
pub trait ConfigStore {
    /// Load the config, returning defaults when no file exists.
    fn load(&self) -> Result<ToolConfig>;
    /// Location of the config file.
    fn path(&self) -> Result<std::path::PathBuf>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait, no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}
