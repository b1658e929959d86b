/// StaleSweep CLI — argument parsing, progress rendering and exit codes.
///
/// The binary crate is a thin wrapper around [`run`]. Everything here is
/// exercised by the tests through [`execute`], which takes the cancel token
/// and output stream explicitly instead of installing a Ctrl+C handler and
/// writing to stdout.
pub mod args;
pub mod render;

pub use args::{Cli, TimestampArg};

use anyhow::{Context, Result};
use stalesweep_core::{start_sweep, CancelToken, RunOutcome, Sweep, SweepError};
use std::io::Write;
use tracing::debug;

/// Every expired file was handled (or nothing matched).
pub const EXIT_SUCCESS: u8 = 0;
/// At least one deletion failed.
pub const EXIT_FAILURE: u8 = 1;
/// Bad threshold, bad options, or unusable directory.
pub const EXIT_USAGE: u8 = 2;
/// Interrupted by Ctrl+C.
pub const EXIT_CANCELLED: u8 = 130;

/// Run a sweep for `cli`, writing to stdout and honouring Ctrl+C.
pub fn run(cli: &Cli) -> Result<u8> {
    let cancel = CancelToken::new();
    let on_interrupt = cancel.clone();
    ctrlc::set_handler(move || on_interrupt.cancel())
        .context("Failed to set Ctrl+C handler")?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    execute(cli, cancel, &mut out)
}

/// Run a sweep and return the process exit code.
///
/// Errors are returned only for problems that stop the sweep from starting;
/// map them with [`exit_code_for`]. Per-file failures show up in the exit
/// code instead.
pub fn execute<W: Write>(cli: &Cli, cancel: CancelToken, out: &mut W) -> Result<u8> {
    let criterion = cli.criterion().context("Invalid threshold")?;
    let options = cli.sweep_options().context("Invalid options")?;
    debug!("Criterion: {criterion}, options: {options:?}");

    let sweep = Sweep::new(&cli.directory, criterion, options).cancel_token(cancel);
    let handle = start_sweep(sweep).context("Failed to start sweep")?;

    let per_file = cli.verbose > 0 && !cli.json;
    for event in handle.progress_rx.iter() {
        if !per_file {
            continue;
        }
        if let Some(line) = render::progress_line(&event) {
            writeln!(out, "{line}").context("Failed to write output")?;
        }
    }

    let summary = handle
        .wait()
        .with_context(|| format!("Cannot sweep {}", cli.directory.display()))?;

    if cli.json {
        render::write_json(out, &summary).context("Failed to write JSON summary")?;
    } else {
        render::write_summary(out, &summary).context("Failed to write summary")?;
    }

    Ok(match summary.outcome() {
        RunOutcome::NothingMatched | RunOutcome::Succeeded => EXIT_SUCCESS,
        RunOutcome::Partial | RunOutcome::AllFailed => EXIT_FAILURE,
        RunOutcome::Cancelled => EXIT_CANCELLED,
    })
}

/// Exit code for an error returned by [`run`] or [`execute`].
pub fn exit_code_for(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<SweepError>() {
        Some(e) if e.is_configuration() || e.is_path() => EXIT_USAGE,
        _ => EXIT_FAILURE,
    }
}
