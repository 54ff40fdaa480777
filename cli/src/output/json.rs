//! JSON output helpers.
//!
//! Every `--json` code path prints exactly one pretty-printed document on
//! stdout: the command result on success, or the error object on failure.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::application::services::deploy::DeployReport;
use crate::application::services::endpoints::Endpoint;

/// Format a JSON error object.
///
/// Output (pretty-printed):
/// ```json
/// {
///   "error": true,
///   "message": "...",
///   "code": "..."
/// }
/// ```
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_error(message: &str, code: &str) -> Result<String> {
    let obj = serde_json::json!({
        "error": true,
        "message": message,
        "code": code,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}

/// Renders results as pretty-printed JSON on stdout.
pub struct JsonRenderer;

#[derive(Serialize)]
struct Counts {
    created: usize,
    updated: usize,
    unchanged: usize,
}

#[derive(Serialize)]
struct ReportDocument<'a> {
    #[serde(flatten)]
    report: &'a DeployReport,
    summary: Counts,
}

impl JsonRenderer {
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_report(&self, report: &DeployReport) -> Result<()> {
        use crate::domain::Outcome;
        let doc = ReportDocument {
            report,
            summary: Counts {
                created: report.count(Outcome::Created),
                updated: report.count(Outcome::Updated),
                unchanged: report.count(Outcome::Unchanged),
            },
        };
        print_pretty(&doc)
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_endpoints(&self, endpoints: &[Endpoint]) -> Result<()> {
        print_pretty(&serde_json::json!({ "endpoints": endpoints }))
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_check(&self, platform_bin: &str, version: &semver::Version) -> Result<()> {
        print_pretty(&serde_json::json!({
            "ok": true,
            "platform_bin": platform_bin,
            "platform_version": version.to_string(),
        }))
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_ready(&self, project: &str, attempts: u32) -> Result<()> {
        print_pretty(&serde_json::json!({
            "project": project,
            "ready": true,
            "attempts": attempts,
        }))
    }
}

fn print_pretty<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("JSON serialization failed")?;
    println!("{text}");
    Ok(())
}
