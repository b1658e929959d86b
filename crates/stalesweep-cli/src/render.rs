/// Terminal output: per-file progress lines and the final summary.
use chrono::Local;
use stalesweep_core::model::size::{format_count, format_size};
use stalesweep_core::{RunOutcome, RunSummary, SweepProgress};
use std::io::{self, Write};

/// One line for a per-file event, or `None` for lifecycle events.
pub fn progress_line(event: &SweepProgress) -> Option<String> {
    match event {
        SweepProgress::Deleted { path, size } => {
            Some(format!("deleted       {} ({})", path.display(), format_size(*size)))
        }
        SweepProgress::DryRun { path, size } => {
            Some(format!("would delete  {} ({})", path.display(), format_size(*size)))
        }
        SweepProgress::Failed { path, reason } => {
            Some(format!("failed        {}: {reason}", path.display()))
        }
        SweepProgress::ScanError { path, message } => {
            Some(format!("skipped       {}: {message}", path.display()))
        }
        SweepProgress::Started { .. }
        | SweepProgress::Complete { .. }
        | SweepProgress::Cancelled { .. } => None,
    }
}

pub fn write_summary<W: Write>(out: &mut W, summary: &RunSummary) -> io::Result<()> {
    let cutoff = summary.cutoff.with_timezone(&Local);
    writeln!(
        out,
        "Swept {} (cutoff {}){}",
        summary.root.display(),
        cutoff.format("%Y-%m-%d %H:%M:%S"),
        if summary.dry_run { " [dry run]" } else { "" }
    )?;
    writeln!(out, "  scanned   {}", format_count(summary.scanned))?;
    writeln!(out, "  expired   {}", format_count(summary.expired))?;
    if summary.dry_run {
        writeln!(
            out,
            "  would delete {} ({})",
            format_count(summary.dry_run_skipped),
            format_size(summary.bytes_affected)
        )?;
    } else {
        writeln!(
            out,
            "  deleted   {} ({})",
            format_count(summary.deleted),
            format_size(summary.bytes_affected)
        )?;
    }
    if summary.failed > 0 {
        writeln!(out, "  failed    {}", format_count(summary.failed))?;
        for failure in &summary.failures {
            writeln!(out, "    {}: {}", failure.path.display(), failure.reason)?;
        }
    }
    if !summary.scan_issues.is_empty() {
        writeln!(
            out,
            "  unreadable {}",
            format_count(summary.scan_issues.len() as u64)
        )?;
    }

    match summary.outcome() {
        RunOutcome::NothingMatched => writeln!(out, "Nothing to remove."),
        RunOutcome::Cancelled => writeln!(
            out,
            "Cancelled; {} expired file(s) not attempted.",
            format_count(summary.not_attempted)
        ),
        _ => Ok(()),
    }
}

pub fn write_json<W: Write>(out: &mut W, summary: &RunSummary) -> serde_json::Result<()> {
    serde_json::to_writer_pretty(&mut *out, summary)?;
    writeln!(out).map_err(serde_json::Error::io)
}
