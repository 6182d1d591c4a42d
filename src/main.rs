use std::io::IsTerminal;

use clap::Parser;
use daylist::cli::commands::Cli;
use daylist::cli::handlers;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `DAYLIST_LOG=debug`
const LOG_ENV: &str = "DAYLIST_LOG";

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    if let Err(e) = handlers::dispatch(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
