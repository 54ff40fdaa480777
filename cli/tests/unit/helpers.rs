//! Shared test helpers: output constructors, recording fakes, and an
//! in-memory platform.

#![allow(dead_code, clippy::expect_used)]

use std::collections::{BTreeMap, VecDeque};
use std::process::{ExitStatus, Output};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use demoprov_cli::application::ports::{
    CommandRunner, Mutation, PlatformInspector, PlatformMutator, ProgressReporter, ServiceUpdate,
    Sleeper,
};
use demoprov_cli::domain::resource::{
    EnvVar, GroupSpec, LoadBalancerSpec, NodeSpec, ProjectSpec, RuleSpec, ServiceSpec,
};
use demoprov_cli::domain::snapshot::{
    GroupSnapshot, LoadBalancerSnapshot, NodeSnapshot, ProjectSnapshot, RuleSnapshot,
    ServiceSnapshot,
};
use demoprov_cli::domain::{Manifest, Overrides, ProjectHandle, Settings, ToolConfig};

// ── Cross-platform ExitStatus construction ───────────────────────────────────

/// Build an `ExitStatus` from a logical exit code (0 = success, non-zero = failure).
///
/// On Unix the raw wait-status encodes the exit code in bits 8–15, so we shift.
#[cfg(unix)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;
    ExitStatus::from_raw(code << 8)
}

#[cfg(windows)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;
    #[allow(clippy::cast_sign_loss)]
    ExitStatus::from_raw(code as u32)
}

// ── Output constructors ──────────────────────────────────────────────────────

pub fn ok_output(stdout: &[u8]) -> Output {
    Output {
        status: exit_status(0),
        stdout: stdout.to_vec(),
        stderr: Vec::new(),
    }
}

pub fn err_output(code: i32, stderr: &[u8]) -> Output {
    Output {
        status: exit_status(code),
        stdout: Vec::new(),
        stderr: stderr.to_vec(),
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────────────

pub const MANIFEST: &str = r#"
project:
  name: shop-demo
  provider: aws
  region: us-east-1
groups:
  - name: web
nodes:
  - name: edge-1
    address: 203.0.113.10
    group: web
services:
  - name: frontend
    image: registry.example.com/shop/frontend:1.2
    memory: 512
    cpu: "0.5"
    groups: [web]
    env:
      API_URL: http://api:8080
      LOG_LEVEL: info
rules:
  - name: https-in
    port: 443
load_balancers:
  - name: public
    service: frontend
    port: 80
"#;

pub fn manifest() -> Manifest {
    serde_yaml::from_str(MANIFEST).expect("valid manifest")
}

pub fn settings(dry_run: bool) -> Settings {
    Settings::resolve(
        &ToolConfig::default(),
        Overrides {
            token: Some("tok-123".to_string()),
            dry_run,
            ..Overrides::default()
        },
    )
    .expect("default settings resolve")
}

pub fn handle() -> ProjectHandle {
    ProjectHandle {
        name: "shop-demo".to_string(),
        uuid: Some("uuid-shop-demo".to_string()),
    }
}

pub fn project(status: &str, available: u32) -> ProjectSnapshot {
    ProjectSnapshot {
        name: "shop-demo".to_string(),
        uuid: "uuid-shop-demo".to_string(),
        status: status.to_string(),
        available,
    }
}

// ── Reporters and clocks ─────────────────────────────────────────────────────

pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn step(&self, _: &str) {}
    fn success(&self, _: &str) {}
    fn warn(&self, _: &str) {}
}

/// Records every message with a `step:`/`success:`/`warn:` prefix.
#[derive(Default)]
pub struct RecordingReporter {
    pub messages: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().expect("lock").clone()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter_map(|m| m.strip_prefix("warn: ").map(str::to_string))
            .collect()
    }
}

impl ProgressReporter for RecordingReporter {
    fn step(&self, message: &str) {
        self.messages.lock().expect("lock").push(format!("step: {message}"));
    }
    fn success(&self, message: &str) {
        self.messages
            .lock()
            .expect("lock")
            .push(format!("success: {message}"));
    }
    fn warn(&self, message: &str) {
        self.messages.lock().expect("lock").push(format!("warn: {message}"));
    }
}

/// Returns immediately and records each requested duration.
#[derive(Default)]
pub struct RecordingSleeper {
    pub sleeps: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().expect("lock").clone()
    }
}

impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().expect("lock").push(duration);
    }
}

// ── Mock command runner ──────────────────────────────────────────────────────

type Responder = Box<dyn Fn(&[&str]) -> Output + Send + Sync>;

/// Records every invocation and answers with a caller-supplied closure.
pub struct MockCommandRunner {
    pub calls: Mutex<Vec<(String, Vec<String>)>>,
    respond: Responder,
}

impl MockCommandRunner {
    pub fn new(respond: impl Fn(&[&str]) -> Output + Send + Sync + 'static) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            respond: Box::new(respond),
        }
    }

    /// Answers every call with the same output.
    pub fn always(output: Output) -> Self {
        Self::new(move |_| output.clone())
    }

    pub fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.calls.lock().expect("lock").clone()
    }

    /// Calls whose second argument is a mutating verb.
    pub fn mutating_calls(&self) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .map(|(_, args)| args)
            .filter(|args| {
                args.get(1)
                    .is_some_and(|verb| matches!(verb.as_str(), "create" | "update" | "set" | "add"))
            })
            .collect()
    }
}

impl CommandRunner for MockCommandRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output> {
        self.run_with_timeout(program, args, Duration::from_secs(1)).await
    }

    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        _timeout: Duration,
    ) -> Result<Output> {
        self.calls.lock().expect("lock").push((
            program.to_string(),
            args.iter().map(ToString::to_string).collect(),
        ));
        Ok((self.respond)(args))
    }
}

// ── In-memory platform ───────────────────────────────────────────────────────

/// A platform that keeps state in memory and applies every mutation.
///
/// `project_script` lets a test dictate successive `project` reads; once it
/// is drained, reads fall back to the stored project. Reads only see a
/// project under its own name, and project-scoped reads come back empty
/// unless the handle selects the stored project by UUID or name.
pub struct FakePlatform {
    pub version: semver::Version,
    pub project: Mutex<Option<ProjectSnapshot>>,
    pub project_script: Mutex<VecDeque<Option<ProjectSnapshot>>>,
    pub project_reads: Mutex<u32>,
    pub services: Mutex<BTreeMap<String, ServiceSnapshot>>,
    pub env: Mutex<BTreeMap<String, BTreeMap<String, String>>>,
    pub groups: Mutex<Vec<GroupSnapshot>>,
    pub nodes: Mutex<Vec<NodeSnapshot>>,
    pub rules: Mutex<Vec<RuleSnapshot>>,
    pub lbs: Mutex<Vec<LoadBalancerSnapshot>>,
    pub mutations: Mutex<Vec<String>>,
}

impl Default for FakePlatform {
    fn default() -> Self {
        Self {
            version: semver::Version::new(1, 6, 2),
            project: Mutex::new(None),
            project_script: Mutex::new(VecDeque::new()),
            project_reads: Mutex::new(0),
            services: Mutex::new(BTreeMap::new()),
            env: Mutex::new(BTreeMap::new()),
            groups: Mutex::new(Vec::new()),
            nodes: Mutex::new(Vec::new()),
            rules: Mutex::new(Vec::new()),
            lbs: Mutex::new(Vec::new()),
            mutations: Mutex::new(Vec::new()),
        }
    }
}

impl FakePlatform {
    pub fn with_version(version: semver::Version) -> Self {
        Self {
            version,
            ..Self::default()
        }
    }

    pub fn with_project(snapshot: ProjectSnapshot) -> Self {
        let fake = Self::default();
        *fake.project.lock().expect("lock") = Some(snapshot);
        fake
    }

    pub fn with_project_reads(reads: Vec<Option<ProjectSnapshot>>) -> Self {
        let fake = Self::default();
        *fake.project_script.lock().expect("lock") = reads.into();
        fake
    }

    pub fn mutations(&self) -> Vec<String> {
        self.mutations.lock().expect("lock").clone()
    }

    pub fn project_reads(&self) -> u32 {
        *self.project_reads.lock().expect("lock")
    }

    pub fn insert_service(&self, snapshot: ServiceSnapshot) {
        self.services
            .lock()
            .expect("lock")
            .insert(snapshot.name.clone(), snapshot);
    }

    /// Whether `handle` selects the stored project.
    fn in_scope(&self, handle: &ProjectHandle) -> bool {
        let selector = handle.selector();
        self.project
            .lock()
            .expect("lock")
            .as_ref()
            .is_some_and(|p| p.uuid == selector || p.name == selector)
    }

    fn scoped<T: Clone>(&self, handle: &ProjectHandle, items: &Mutex<Vec<T>>) -> Vec<T> {
        if self.in_scope(handle) {
            items.lock().expect("lock").clone()
        } else {
            Vec::new()
        }
    }

    fn record(&self, what: String) {
        self.mutations.lock().expect("lock").push(what);
    }
}

impl PlatformInspector for FakePlatform {
    async fn cli_version(&self) -> Result<semver::Version> {
        Ok(self.version.clone())
    }

    async fn project(&self, name: &str) -> Result<Option<ProjectSnapshot>> {
        *self.project_reads.lock().expect("lock") += 1;
        let named = |p: Option<ProjectSnapshot>| p.filter(|p| p.name == name);
        if let Some(next) = self.project_script.lock().expect("lock").pop_front() {
            return Ok(named(next));
        }
        Ok(named(self.project.lock().expect("lock").clone()))
    }

    async fn service(&self, project: &ProjectHandle, name: &str) -> Result<Option<ServiceSnapshot>> {
        if !self.in_scope(project) {
            return Ok(None);
        }
        Ok(self.services.lock().expect("lock").get(name).cloned())
    }

    async fn env_vars(
        &self,
        project: &ProjectHandle,
        service: &str,
    ) -> Result<BTreeMap<String, String>> {
        if !self.in_scope(project) {
            return Ok(BTreeMap::new());
        }
        Ok(self
            .env
            .lock()
            .expect("lock")
            .get(service)
            .cloned()
            .unwrap_or_default())
    }

    async fn groups(&self, project: &ProjectHandle) -> Result<Vec<GroupSnapshot>> {
        Ok(self.scoped(project, &self.groups))
    }

    async fn nodes(&self, project: &ProjectHandle) -> Result<Vec<NodeSnapshot>> {
        Ok(self.scoped(project, &self.nodes))
    }

    async fn rules(&self, project: &ProjectHandle) -> Result<Vec<RuleSnapshot>> {
        Ok(self.scoped(project, &self.rules))
    }

    async fn load_balancers(&self, project: &ProjectHandle) -> Result<Vec<LoadBalancerSnapshot>> {
        Ok(self.scoped(project, &self.lbs))
    }
}

impl PlatformMutator for FakePlatform {
    async fn create_project(&self, spec: &ProjectSpec) -> Result<Mutation> {
        self.record(format!("create project {}", spec.name));
        *self.project.lock().expect("lock") = Some(ProjectSnapshot {
            name: spec.name.clone(),
            uuid: format!("uuid-{}", spec.name),
            status: "ok".to_string(),
            available: 1,
        });
        Ok(Mutation::Applied)
    }

    async fn create_service(&self, _: &ProjectHandle, spec: &ServiceSpec) -> Result<Mutation> {
        self.record(format!("create service {}", spec.name));
        self.insert_service(ServiceSnapshot {
            name: spec.name.clone(),
            image: spec.image.clone(),
            memory: spec.memory.to_string(),
            cpu: spec.cpu.clone(),
            groups: spec.groups.clone(),
            status: "running".to_string(),
            url: Some(format!("https://{}.demo.example", spec.name)),
        });
        Ok(Mutation::Applied)
    }

    async fn update_service(
        &self,
        _: &ProjectHandle,
        name: &str,
        update: &ServiceUpdate,
    ) -> Result<Mutation> {
        self.record(format!(
            "update service {name} memory={:?} cpu={:?}",
            update.memory, update.cpu
        ));
        if let Some(service) = self.services.lock().expect("lock").get_mut(name) {
            if let Some(memory) = &update.memory {
                service.memory.clone_from(memory);
            }
            if let Some(cpu) = &update.cpu {
                service.cpu.clone_from(cpu);
            }
        }
        Ok(Mutation::Applied)
    }

    async fn set_env(&self, _: &ProjectHandle, service: &str, var: &EnvVar) -> Result<Mutation> {
        self.record(format!("set env {service} {}={}", var.key, var.value));
        self.env
            .lock()
            .expect("lock")
            .entry(service.to_string())
            .or_default()
            .insert(var.key.clone(), var.value.clone());
        Ok(Mutation::Applied)
    }

    async fn create_group(&self, _: &ProjectHandle, spec: &GroupSpec) -> Result<Mutation> {
        self.record(format!("create group {}", spec.name));
        self.groups.lock().expect("lock").push(GroupSnapshot {
            name: spec.name.clone(),
        });
        Ok(Mutation::Applied)
    }

    async fn add_node(&self, _: &ProjectHandle, spec: &NodeSpec) -> Result<Mutation> {
        self.record(format!("add node {}", spec.name));
        self.nodes.lock().expect("lock").push(NodeSnapshot {
            name: spec.name.clone(),
            address: spec.address.clone(),
            group: spec.group.clone(),
        });
        Ok(Mutation::Applied)
    }

    async fn create_rule(&self, _: &ProjectHandle, spec: &RuleSpec) -> Result<Mutation> {
        self.record(format!("create rule {}", spec.name));
        self.rules.lock().expect("lock").push(RuleSnapshot {
            name: spec.name.clone(),
            protocol: spec.protocol.clone(),
            port: spec.port.to_string(),
            source: spec.source.clone(),
        });
        Ok(Mutation::Applied)
    }

    async fn create_load_balancer(
        &self,
        _: &ProjectHandle,
        spec: &LoadBalancerSpec,
    ) -> Result<Mutation> {
        self.record(format!("create lb {}", spec.name));
        self.lbs.lock().expect("lock").push(LoadBalancerSnapshot {
            name: spec.name.clone(),
            service: spec.service.clone(),
            port: spec.port.to_string(),
            url: Some(format!("http://{}.lb.example", spec.name)),
        });
        Ok(Mutation::Applied)
    }
}
