use anyhow::Context;
use clap::Parser;
use std::io::{self, Write};
use std::process;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use xt_classify::cli::{commands, Cli};
use xt_classify::ClassifyError;

fn init_logging(verbose: bool) -> anyhow::Result<()> {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }

    info!("Starting xt-classify v{}", env!("CARGO_PKG_VERSION"));

    let Some(command) = cli.command else {
        eprintln!("No command specified. Use --help for usage information.");
        process::exit(1);
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let result = commands::handle_command(command, &mut out)
        .and_then(|()| out.flush().map_err(ClassifyError::from));

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(e.exit_status().code());
    }
}
