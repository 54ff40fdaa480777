//! `TerminalReporter`: Presentation-layer implementation of `ProgressReporter`.
//!
//! Wraps `&OutputContext` and implements the `application::ports::ProgressReporter`
//! trait so application services can emit progress events without depending on
//! any presentation type directly.

use owo_colors::OwoColorize as _;

use crate::application::ports::ProgressReporter;
use crate::output::OutputContext;

/// Terminal progress reporter that wraps an `OutputContext`.
///
/// - `step()` prints `"  → {message}"`
/// - `success()` prints `"  ✓ {message}"`
/// - `warn()` prints `"  ! {message}"`
///
/// `step` and `success` are suppressed when `ctx.quiet`; warnings always
/// print. In JSON mode every line goes to stderr so stdout stays parseable.
pub struct TerminalReporter<'a> {
    ctx: &'a OutputContext,
    to_stderr: bool,
}

impl<'a> TerminalReporter<'a> {
    /// Create a reporter that writes to stdout.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self {
            ctx,
            to_stderr: false,
        }
    }

    /// Create a reporter that writes to stderr.
    #[must_use]
    pub fn stderr(ctx: &'a OutputContext) -> Self {
        Self {
            ctx,
            to_stderr: true,
        }
    }

    fn emit(&self, line: &str) {
        if self.to_stderr {
            eprintln!("{line}");
        } else {
            println!("{line}");
        }
    }
}

impl ProgressReporter for TerminalReporter<'_> {
    fn step(&self, message: &str) {
        if !self.ctx.quiet {
            self.emit(&format!("  {} {message}", "→".style(self.ctx.styles.step)));
        }
    }

    fn success(&self, message: &str) {
        if !self.ctx.quiet {
            self.emit(&format!("  {} {message}", "✓".style(self.ctx.styles.success)));
        }
    }

    fn warn(&self, message: &str) {
        self.emit(&format!("  {} {message}", "!".style(self.ctx.styles.warning)));
    }
}
