/// Sweep progress reporting — messages sent from the sweep thread to
/// whoever is watching (CLI renderer, service log, test).
use crate::deletion::{DeletionReport, DeletionStatus, FailureReason};
use crate::report::RunSummary;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum SweepProgress {
    /// Options and criterion were valid and the root is readable.
    Started {
        root: PathBuf,
        cutoff: DateTime<Utc>,
        dry_run: bool,
    },
    Deleted {
        path: PathBuf,
        size: u64,
    },
    /// An expired file that dry-run left in place.
    DryRun {
        path: PathBuf,
        size: u64,
    },
    Failed {
        path: PathBuf,
        reason: FailureReason,
    },
    /// A non-fatal problem while walking (unreadable subdirectory etc.).
    ScanError {
        path: PathBuf,
        message: String,
    },
    /// The sweep ran to the end.
    Complete {
        summary: Box<RunSummary>,
        duration: Duration,
    },
    /// The sweep stopped early; the summary covers the work done so far.
    Cancelled {
        summary: Box<RunSummary>,
    },
}

impl From<&DeletionReport> for SweepProgress {
    fn from(report: &DeletionReport) -> Self {
        let path = report.path.clone();
        match &report.status {
            DeletionStatus::Deleted => Self::Deleted {
                path,
                size: report.size,
            },
            DeletionStatus::DryRun => Self::DryRun {
                path,
                size: report.size,
            },
            DeletionStatus::Failed(reason) => Self::Failed {
                path,
                reason: reason.clone(),
            },
        }
    }
}
