//! Run settings and the optional tool config file schema.
//!
//! Pure functions only: no I/O, no async, no filesystem access.

use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result};
use semver::VersionReq;
use serde::{Deserialize, Serialize};

use crate::domain::error::ProvisionError;
use crate::domain::readiness::RetryPolicy;

// ── Constants ────────────────────────────────────────────────────────────────

pub const TOKEN_ENV: &str = "PLATFORM_TOKEN";
pub const ENDPOINT_ENV: &str = "PLATFORM_ENDPOINT";

pub const DEFAULT_PLATFORM_BIN: &str = "platform";
pub const DEFAULT_PLATFORM_VERSION: &str = ">=1.4.0";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 120;

// ── Config file schema ───────────────────────────────────────────────────────

/// Optional defaults stored in `~/.demoprov/config.yaml`.
///
/// Every field is optional; flags and environment variables win over it.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ToolConfig {
    pub platform_bin: Option<String>,
    pub poll_interval_secs: Option<u64>,
    pub max_attempts: Option<u32>,
    /// Semver requirement for the platform CLI, e.g. `">=1.4.0"`.
    pub platform_version: Option<String>,
    pub command_timeout_secs: Option<u64>,
}

/// Values taken from flags and environment for one invocation.
#[derive(Default)]
pub struct Overrides {
    pub token: Option<String>,
    pub endpoint: Option<String>,
    pub platform_bin: Option<String>,
    pub poll_interval_secs: Option<u64>,
    pub max_attempts: Option<u32>,
    pub dry_run: bool,
}

// ── Settings ─────────────────────────────────────────────────────────────────

/// Everything an operation needs to know about the current run.
///
/// Built once in `AppContext::new` and passed by reference to every
/// service; nothing reads the process environment after that.
#[derive(Clone)]
pub struct Settings {
    pub token: Option<String>,
    pub endpoint: Option<String>,
    pub platform_bin: String,
    pub dry_run: bool,
    pub retry: RetryPolicy,
    pub platform_version: VersionReq,
    pub command_timeout: Duration,
}

impl Settings {
    /// Merge flag/env overrides over the config file over built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured platform version requirement is not
    /// valid semver.
    pub fn resolve(file: &ToolConfig, overrides: Overrides) -> Result<Self> {
        let version_str = file
            .platform_version
            .as_deref()
            .unwrap_or(DEFAULT_PLATFORM_VERSION);
        let platform_version = VersionReq::parse(version_str)
            .with_context(|| format!("invalid platform_version requirement '{version_str}'"))?;

        let interval = overrides
            .poll_interval_secs
            .or(file.poll_interval_secs)
            .unwrap_or(DEFAULT_POLL_INTERVAL_SECS);

        Ok(Self {
            token: overrides.token,
            endpoint: overrides.endpoint.filter(|e| !e.trim().is_empty()),
            platform_bin: overrides
                .platform_bin
                .or_else(|| file.platform_bin.clone())
                .unwrap_or_else(|| DEFAULT_PLATFORM_BIN.to_string()),
            dry_run: overrides.dry_run,
            retry: RetryPolicy {
                interval: Duration::from_secs(interval),
                max_attempts: overrides.max_attempts.or(file.max_attempts),
            },
            platform_version,
            command_timeout: Duration::from_secs(
                file.command_timeout_secs
                    .unwrap_or(DEFAULT_COMMAND_TIMEOUT_SECS),
            ),
        })
    }

    /// The API token, or `MissingToken` when unset or blank.
    ///
    /// # Errors
    ///
    /// Returns `ProvisionError::MissingToken` if no usable token is configured.
    pub fn token(&self) -> Result<&str, ProvisionError> {
        self.token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or(ProvisionError::MissingToken)
    }

    /// Environment forwarded to every platform CLI child process.
    #[must_use]
    pub fn child_env(&self) -> Vec<(String, String)> {
        let mut env = Vec::with_capacity(2);
        if let Some(token) = &self.token {
            env.push((TOKEN_ENV.to_string(), token.clone()));
        }
        if let Some(endpoint) = &self.endpoint {
            env.push((ENDPOINT_ENV.to_string(), endpoint.clone()));
        }
        env
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("endpoint", &self.endpoint)
            .field("platform_bin", &self.platform_bin)
            .field("dry_run", &self.dry_run)
            .field("retry", &self.retry)
            .field("platform_version", &self.platform_version)
            .field("command_timeout", &self.command_timeout)
            .finish()
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
