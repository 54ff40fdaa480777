//! Infrastructure implementation of the platform port traits.
//!
//! `PlatformCli<R>` routes every platform CLI call through a `CommandRunner`
//! and hands the captured text to `infra::decode`. Reads run even in a dry
//! run; mutations are replaced by their shell-quoted echo.

use std::borrow::Cow;
use std::collections::BTreeMap;

use anyhow::{Context, Result};

use crate::application::ports::{
    CommandRunner, Mutation, PlatformInspector, PlatformMutator, ServiceUpdate,
};
use crate::domain::resource::{
    EnvVar, GroupSpec, LoadBalancerSpec, NodeSpec, ProjectSpec, RuleSpec, ServiceSpec,
};
use crate::domain::snapshot::{
    GroupSnapshot, LoadBalancerSnapshot, NodeSnapshot, ProjectSnapshot, RuleSnapshot,
    ServiceSnapshot,
};
use crate::domain::{ProjectHandle, ProvisionError};
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::decode;

/// Infrastructure adapter that routes all platform CLI calls through a `CommandRunner`.
///
/// Generic over `R: CommandRunner` so that tests can inject a mock runner
/// without spawning real processes.
pub struct PlatformCli<R: CommandRunner> {
    runner: R,
    program: String,
    dry_run: bool,
}

impl<R: CommandRunner> PlatformCli<R> {
    pub fn new(runner: R, program: impl Into<String>, dry_run: bool) -> Self {
        Self {
            runner,
            program: program.into(),
            dry_run,
        }
    }

    /// Run a read-only command. A non-zero exit means "not found" and
    /// yields `None`; failing to run the program at all is an error.
    async fn query(&self, args: &[&str]) -> Result<Option<(String, String)>> {
        let rendered = render_command(&self.program, args);
        let output = self
            .runner
            .run(&self.program, args)
            .await
            .with_context(|| format!("running {rendered}"))?;
        if !output.status.success() {
            tracing::debug!(
                command = %rendered,
                code = output.status.code(),
                "read returned non-zero, treating as absent"
            );
            return Ok(None);
        }
        Ok(Some((
            rendered,
            String::from_utf8_lossy(&output.stdout).into_owned(),
        )))
    }

    async fn mutate(&self, args: &[&str]) -> Result<Mutation> {
        let rendered = render_command(&self.program, args);
        if self.dry_run {
            tracing::info!(command = %rendered, "dry run, not executing");
            return Ok(Mutation::Echoed(rendered));
        }
        tracing::info!(command = %rendered, "executing");
        let output = self
            .runner
            .run(&self.program, args)
            .await
            .with_context(|| format!("running {rendered}"))?;
        if !output.status.success() {
            return Err(ProvisionError::CommandFailed {
                command: rendered,
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
            .into());
        }
        Ok(Mutation::Applied)
    }
}

impl PlatformCli<TokioCommandRunner> {
    /// Convenience constructor for production use.
    #[must_use]
    pub fn from_settings(settings: &crate::domain::Settings) -> Self {
        let runner =
            TokioCommandRunner::new(settings.command_timeout).with_envs(settings.child_env());
        Self::new(runner, settings.platform_bin.clone(), settings.dry_run)
    }
}

impl<R: CommandRunner> PlatformInspector for PlatformCli<R> {
    async fn cli_version(&self) -> Result<semver::Version> {
        let args = ["version"];
        let rendered = render_command(&self.program, &args);
        let output = self
            .runner
            .run(&self.program, &args)
            .await
            .with_context(|| format!("running {rendered}"))?;
        if !output.status.success() {
            return Err(ProvisionError::CommandFailed {
                command: rendered,
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
            .into());
        }
        // Some builds print the version on stderr.
        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push('\n');
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(decode::decode_version(&rendered, &text)?)
    }

    async fn project(&self, name: &str) -> Result<Option<ProjectSnapshot>> {
        let Some((cmd, text)) = self.query(&["project", "get", name]).await? else {
            return Ok(None);
        };
        Ok(Some(decode::decode_project(&cmd, &text)?))
    }

    async fn service(
        &self,
        project: &ProjectHandle,
        name: &str,
    ) -> Result<Option<ServiceSnapshot>> {
        let Some((cmd, text)) = self
            .query(&["service", "get", name, "--project", project.selector()])
            .await?
        else {
            return Ok(None);
        };
        Ok(Some(decode::decode_service(&cmd, &text)?))
    }

    async fn env_vars(
        &self,
        project: &ProjectHandle,
        service: &str,
    ) -> Result<BTreeMap<String, String>> {
        let Some((cmd, text)) = self
            .query(&[
                "env",
                "list",
                "--project",
                project.selector(),
                "--service",
                service,
            ])
            .await?
        else {
            return Ok(BTreeMap::new());
        };
        Ok(decode::decode_env(&cmd, &text)?)
    }

    async fn groups(&self, project: &ProjectHandle) -> Result<Vec<GroupSnapshot>> {
        let Some((cmd, text)) = self
            .query(&["group", "list", "--project", project.selector()])
            .await?
        else {
            return Ok(Vec::new());
        };
        Ok(decode::decode_groups(&cmd, &text)?)
    }

    async fn nodes(&self, project: &ProjectHandle) -> Result<Vec<NodeSnapshot>> {
        let Some((cmd, text)) = self
            .query(&["node", "list", "--project", project.selector()])
            .await?
        else {
            return Ok(Vec::new());
        };
        Ok(decode::decode_nodes(&cmd, &text)?)
    }

    async fn rules(&self, project: &ProjectHandle) -> Result<Vec<RuleSnapshot>> {
        let Some((cmd, text)) = self
            .query(&["rule", "list", "--project", project.selector()])
            .await?
        else {
            return Ok(Vec::new());
        };
        Ok(decode::decode_rules(&cmd, &text)?)
    }

    async fn load_balancers(&self, project: &ProjectHandle) -> Result<Vec<LoadBalancerSnapshot>> {
        let Some((cmd, text)) = self
            .query(&["lb", "list", "--project", project.selector()])
            .await?
        else {
            return Ok(Vec::new());
        };
        Ok(decode::decode_load_balancers(&cmd, &text)?)
    }
}

impl<R: CommandRunner> PlatformMutator for PlatformCli<R> {
    async fn create_project(&self, spec: &ProjectSpec) -> Result<Mutation> {
        self.mutate(&[
            "project",
            "create",
            spec.name.as_str(),
            "--provider",
            spec.provider.as_str(),
            "--region",
            spec.region.as_str(),
            "--monitoring",
            spec.monitoring.as_str(),
        ])
        .await
    }

    async fn create_service(
        &self,
        project: &ProjectHandle,
        spec: &ServiceSpec,
    ) -> Result<Mutation> {
        let memory = spec.memory.to_string();
        let mut args = vec![
            "service",
            "create",
            spec.name.as_str(),
            "--project",
            project.selector(),
            "--image",
            spec.image.as_str(),
            "--memory",
            memory.as_str(),
            "--cpu",
            spec.cpu.as_str(),
        ];
        for group in &spec.groups {
            args.push("--group");
            args.push(group);
        }
        self.mutate(&args).await
    }

    async fn update_service(
        &self,
        project: &ProjectHandle,
        name: &str,
        update: &ServiceUpdate,
    ) -> Result<Mutation> {
        let mut args = vec!["service", "update", name, "--project", project.selector()];
        if let Some(memory) = &update.memory {
            args.push("--memory");
            args.push(memory);
        }
        if let Some(cpu) = &update.cpu {
            args.push("--cpu");
            args.push(cpu);
        }
        self.mutate(&args).await
    }

    async fn set_env(
        &self,
        project: &ProjectHandle,
        service: &str,
        var: &EnvVar,
    ) -> Result<Mutation> {
        let assignment = format!("{}={}", var.key, var.value);
        self.mutate(&[
            "env",
            "set",
            assignment.as_str(),
            "--project",
            project.selector(),
            "--service",
            service,
        ])
        .await
    }

    async fn create_group(&self, project: &ProjectHandle, spec: &GroupSpec) -> Result<Mutation> {
        self.mutate(&["group", "create", spec.name.as_str(), "--project", project.selector()])
            .await
    }

    async fn add_node(&self, project: &ProjectHandle, spec: &NodeSpec) -> Result<Mutation> {
        self.mutate(&[
            "node",
            "add",
            spec.name.as_str(),
            "--project",
            project.selector(),
            "--address",
            spec.address.as_str(),
            "--group",
            spec.group.as_str(),
        ])
        .await
    }

    async fn create_rule(&self, project: &ProjectHandle, spec: &RuleSpec) -> Result<Mutation> {
        let port = spec.port.to_string();
        self.mutate(&[
            "rule",
            "create",
            spec.name.as_str(),
            "--project",
            project.selector(),
            "--protocol",
            spec.protocol.as_str(),
            "--port",
            port.as_str(),
            "--source",
            spec.source.as_str(),
        ])
        .await
    }

    async fn create_load_balancer(
        &self,
        project: &ProjectHandle,
        spec: &LoadBalancerSpec,
    ) -> Result<Mutation> {
        let port = spec.port.to_string();
        self.mutate(&[
            "lb",
            "create",
            spec.name.as_str(),
            "--project",
            project.selector(),
            "--service",
            spec.service.as_str(),
            "--port",
            port.as_str(),
        ])
        .await
    }
}

// ── Command rendering ─────────────────────────────────────────────────────────

/// Quote `arg` for a POSIX shell, leaving plain words untouched.
#[must_use]
pub fn shell_quote(arg: &str) -> Cow<'_, str> {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=,@%+".contains(c));
    if plain {
        Cow::Borrowed(arg)
    } else {
        Cow::Owned(format!("'{}'", arg.replace('\'', r"'\''")))
    }
}

/// Program and arguments as one copy-pasteable shell line.
#[must_use]
pub fn render_command(program: &str, args: &[&str]) -> String {
    std::iter::once(program)
        .chain(args.iter().copied())
        .map(shell_quote)
        .collect::<Vec<_>>()
        .join(" ")
}
