mod cli;
mod commands;
mod error;

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

use cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.quiet);
    info!("Starting toolpipe");

    match commands::dispatch(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "toolpipe failed");
            eprintln!("error: {}", err.user_message());
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(quiet: bool) {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let filter = if quiet {
            EnvFilter::new("warn")
        } else {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
        };
        fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_level(true)
            .with_writer(std::io::stderr)
            .init();
    });
}
