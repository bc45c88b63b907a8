mod cli;

use std::process::ExitCode;

use clap::Parser;
use mstack::commands::output::format_error;
use tracing_subscriber::EnvFilter;

use cli::{dispatch, Cli};

/// Log filter variable; `RUST_LOG` is consulted when it is unset.
const LOG_ENV: &str = "M_LOG";

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    match dispatch(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", format_error(&err));
            ExitCode::FAILURE
        }
    }
}
