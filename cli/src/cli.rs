//! CLI argument parsing with clap derive

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::{AppContext, AppFlags, BehaviourFlags, OutputFlags, PlatformFlags};
use crate::commands;

/// Idempotently provision a demo deployment on a hosting platform
#[derive(Parser)]
#[command(
    name = "demoprov",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Verbose logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print mutating platform commands instead of running them
    #[arg(long, global = true, env = "DEMOPROV_DRY_RUN")]
    pub dry_run: bool,

    /// Deployment manifest
    #[arg(
        short = 'f',
        long = "file",
        global = true,
        env = "DEMOPROV_MANIFEST",
        default_value = "demo.yaml"
    )]
    pub manifest: PathBuf,

    /// Platform CLI executable
    #[arg(long, global = true, env = "DEMOPROV_PLATFORM_BIN")]
    pub platform_bin: Option<String>,

    /// Seconds between readiness polls
    #[arg(long, global = true, value_name = "SECS")]
    pub poll_interval: Option<u64>,

    /// Give up waiting after N polls (default: wait forever)
    #[arg(long, global = true, value_name = "N")]
    pub max_attempts: Option<u32>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Converge the platform to the manifest
    Deploy(commands::deploy::DeployArgs),

    /// Wait until a project is ready
    Wait(commands::wait::WaitArgs),

    /// Show service and load balancer URLs
    Urls,

    /// Verify token, manifest, and platform CLI version
    Check,

    /// Show version
    Version,
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn run(self) -> Result<()> {
        let Cli {
            json,
            quiet,
            no_color,
            verbose: _,
            dry_run,
            manifest,
            platform_bin,
            poll_interval,
            max_attempts,
            command,
        } = self;

        if let Command::Version = command {
            commands::version::run(json);
            return Ok(());
        }

        let yes = matches!(&command, Command::Deploy(args) if args.yes);
        let app = AppContext::new(AppFlags {
            output: OutputFlags {
                no_color,
                quiet,
                json,
            },
            behaviour: BehaviourFlags { yes },
            platform: PlatformFlags {
                dry_run,
                platform_bin,
                poll_interval_secs: poll_interval,
                max_attempts,
            },
        })?;

        match command {
            Command::Deploy(_) => commands::deploy::run(&app, &manifest).await,
            Command::Wait(args) => commands::wait::run(&app, &args, &manifest).await,
            Command::Urls => commands::urls::run(&app, &manifest).await,
            Command::Check => commands::check::run(&app, &manifest).await,
            Command::Version => Ok(()),
        }
    }
}
