//! Application context: unified state passed to every command handler.
//!
//! Built once from the parsed flags, the environment, and the config file.
//! Commands receive `&AppContext` and never read flags or env vars directly.

use anyhow::Result;

use crate::application::ports::ConfigStore;
use crate::domain::config::{ENDPOINT_ENV, TOKEN_ENV};
use crate::domain::{Overrides, Settings};
use crate::infra::clock::TokioSleeper;
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::config::YamlConfigStore;
use crate::infra::platform::PlatformCli;
use crate::output::{HumanRenderer, JsonRenderer, OutputContext, Renderer, TerminalReporter};

/// Output rendering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable terminal output (default).
    Human,
    /// Machine-readable JSON output.
    Json,
}

/// Output rendering flags.
pub struct OutputFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
    /// Enable JSON output mode.
    pub json: bool,
}

/// Behaviour flags.
pub struct BehaviourFlags {
    /// Skip interactive prompts (also set by `CI` / `DEMOPROV_YES` env vars).
    pub yes: bool,
}

/// Flags that shape how the platform CLI is driven.
pub struct PlatformFlags {
    pub dry_run: bool,
    pub platform_bin: Option<String>,
    pub poll_interval_secs: Option<u64>,
    pub max_attempts: Option<u32>,
}

/// Flags passed from the top-level CLI to `AppContext::new`.
pub struct AppFlags {
    /// Output rendering options.
    pub output: OutputFlags,
    /// Behaviour options.
    pub behaviour: BehaviourFlags,
    /// Platform options.
    pub platform: PlatformFlags,
}

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    /// Output rendering mode (human vs JSON).
    pub mode: OutputMode,
    /// Resolved run settings.
    pub settings: Settings,
    /// Platform CLI adapter.
    pub platform: PlatformCli<TokioCommandRunner>,
    /// Wall-clock sleeper for readiness polling.
    pub sleeper: TokioSleeper,
    /// When `true`, skip interactive prompts and use defaults.
    ///
    /// Set when `--yes` is passed, or when the `CI` or `DEMOPROV_YES`
    /// environment variables are present.
    pub non_interactive: bool,
}

impl AppContext {
    /// Construct an `AppContext` from top-level CLI flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or holds an
    /// invalid version requirement.
    pub fn new(flags: AppFlags) -> Result<Self> {
        let ci_env = std::env::var("CI").is_ok() || std::env::var("DEMOPROV_YES").is_ok();
        let non_interactive = flags.behaviour.yes || ci_env;

        let mode = if flags.output.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        };

        let file = YamlConfigStore.load()?;
        let settings = Settings::resolve(
            &file,
            Overrides {
                token: std::env::var(TOKEN_ENV).ok(),
                endpoint: std::env::var(ENDPOINT_ENV).ok(),
                platform_bin: flags.platform.platform_bin,
                poll_interval_secs: flags.platform.poll_interval_secs,
                max_attempts: flags.platform.max_attempts,
                dry_run: flags.platform.dry_run,
            },
        )?;
        tracing::debug!(?settings, "resolved settings");

        Ok(Self {
            output: OutputContext::new(flags.output.no_color, flags.output.quiet),
            mode,
            platform: PlatformCli::from_settings(&settings),
            sleeper: TokioSleeper,
            settings,
            non_interactive,
        })
    }

    /// Returns `true` when JSON output mode is active.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.mode == OutputMode::Json
    }

    /// Returns the appropriate `Renderer` variant for the current output mode.
    #[must_use]
    pub fn renderer(&self) -> Renderer<'_> {
        match self.mode {
            OutputMode::Human => Renderer::Human(HumanRenderer::new(&self.output)),
            OutputMode::Json => Renderer::Json(JsonRenderer),
        }
    }

    /// Progress reporter; writes to stderr in JSON mode.
    #[must_use]
    pub fn reporter(&self) -> TerminalReporter<'_> {
        if self.is_json() {
            TerminalReporter::stderr(&self.output)
        } else {
            TerminalReporter::new(&self.output)
        }
    }

    /// Ask the user for confirmation.
    ///
    /// When `non_interactive` is `true` (CI, `--yes` flag, or `DEMOPROV_YES` env),
    /// returns `default` immediately without prompting.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal prompt fails (e.g. no TTY available).
    pub fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        if self.non_interactive {
            return Ok(default);
        }
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(default)
            .interact()?;
        Ok(confirmed)
    }
}
