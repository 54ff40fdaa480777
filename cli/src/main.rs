//! demoprov - idempotent demo deployment provisioner

use clap::Parser;
use tracing_subscriber::EnvFilter;

use demoprov_cli::cli::Cli;
use demoprov_cli::domain::ProvisionError;
use demoprov_cli::output::json::format_error;

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("DEMOPROV_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn provision_error(err: &anyhow::Error) -> Option<&ProvisionError> {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<ProvisionError>())
}

/// Stable error code for JSON output: the first `ProvisionError` in the chain.
fn error_code(err: &anyhow::Error) -> &'static str {
    provision_error(err).map_or("error", ProvisionError::code)
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let json = cli.json;

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to start runtime: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(cli.run()) {
        tracing::debug!(error = ?e, "command failed");
        let message = format!("{e:#}");
        match json.then(|| format_error(&message, error_code(&e))) {
            Some(Ok(doc)) => println!("{doc}"),
            _ => {
                eprintln!("Error: {message}");
                if provision_error(&e).is_some_and(ProvisionError::is_precondition) {
                    eprintln!("Fix the problem above and re-run; deploy is safe to repeat.");
                }
            }
        }
        std::process::exit(1);
    }
}
