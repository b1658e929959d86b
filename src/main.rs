//! StaleSweep — remove files older than an age threshold.
//!
//! Thin binary entry point. All logic lives in the `stalesweep-core`
//! and `stalesweep-cli` crates.

use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = stalesweep_cli::Cli::parse_args();

    // Logs go to stderr so stdout stays clean for --json.
    tracing_subscriber::fmt()
        .with_max_level(cli.log_level())
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("StaleSweep starting");

    match stalesweep_cli::run(&cli) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(stalesweep_cli::exit_code_for(&err))
        }
    }
}
