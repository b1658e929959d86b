/// Run summaries — aggregate per-file deletion reports into one result.
///
/// Aggregation is a commutative, associative fold: each deletion worker keeps
/// its own [`SummaryBuilder`] and the builders are merged once the workers
/// finish, so the order in which files complete never changes the summary.
use crate::deletion::{DeletionReport, DeletionStatus, FailureReason};
use crate::scanner::ScanIssue;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

/// A file the sweep meant to delete but could not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub reason: FailureReason,
}

/// Running totals over deletion reports.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SummaryBuilder {
    deleted: u64,
    dry_run_skipped: u64,
    failed: u64,
    not_attempted: u64,
    bytes_affected: u64,
    failures: Vec<FileFailure>,
}

impl SummaryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, report: &DeletionReport) {
        match &report.status {
            DeletionStatus::Deleted => {
                self.deleted += 1;
                self.bytes_affected += report.size;
            }
            DeletionStatus::DryRun => {
                self.dry_run_skipped += 1;
                self.bytes_affected += report.size;
            }
            DeletionStatus::Failed(reason) => {
                self.failed += 1;
                self.failures.push(FileFailure {
                    path: report.path.clone(),
                    reason: reason.clone(),
                });
            }
        }
    }

    /// An expired file that was dequeued after cancellation.
    pub fn record_not_attempted(&mut self) {
        self.not_attempted += 1;
    }

    pub fn merge(mut self, other: SummaryBuilder) -> SummaryBuilder {
        self.deleted += other.deleted;
        self.dry_run_skipped += other.dry_run_skipped;
        self.failed += other.failed;
        self.not_attempted += other.not_attempted;
        self.bytes_affected += other.bytes_affected;
        self.failures.extend(other.failures);
        self
    }

    /// Combine the deletion totals with what the scan and evaluation stages
    /// counted. Failures are sorted by path so the summary is stable across
    /// worker schedules.
    pub fn finish(self, totals: ScanTotals) -> RunSummary {
        let mut failures = self.failures;
        failures.sort_by(|a, b| a.path.cmp(&b.path));

        RunSummary {
            root: totals.root,
            cutoff: totals.cutoff,
            dry_run: totals.dry_run,
            scanned: totals.scanned,
            expired: totals.expired,
            retained: totals.scanned.saturating_sub(totals.expired),
            deleted: self.deleted,
            dry_run_skipped: self.dry_run_skipped,
            failed: self.failed,
            not_attempted: self.not_attempted,
            bytes_affected: self.bytes_affected,
            failures,
            scan_issues: totals.scan_issues,
            cancelled: totals.cancelled,
        }
    }
}

/// What the scan and evaluation stages contribute to a summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanTotals {
    pub root: PathBuf,
    pub cutoff: DateTime<Utc>,
    pub dry_run: bool,
    pub scanned: u64,
    pub expired: u64,
    pub scan_issues: Vec<ScanIssue>,
    pub cancelled: bool,
}

/// Final result of a sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub root: PathBuf,
    pub cutoff: DateTime<Utc>,
    pub dry_run: bool,
    /// Candidate files produced by the scan.
    pub scanned: u64,
    pub expired: u64,
    pub retained: u64,
    pub deleted: u64,
    /// Expired files left in place because of dry-run.
    pub dry_run_skipped: u64,
    pub failed: u64,
    /// Expired files not processed because the run was cancelled.
    pub not_attempted: u64,
    /// Bytes removed, or that would have been removed under dry-run.
    pub bytes_affected: u64,
    pub failures: Vec<FileFailure>,
    pub scan_issues: Vec<ScanIssue>,
    pub cancelled: bool,
}

/// Coarse classification of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// No file was older than the cutoff.
    NothingMatched,
    /// Every expired file was deleted (or reported under dry-run).
    Succeeded,
    /// Some deletions succeeded, some failed.
    Partial,
    /// Every attempted deletion failed.
    AllFailed,
    /// Stopped early; counts cover the work done before cancellation.
    Cancelled,
}

impl RunSummary {
    /// Aggregate a finished sequence of reports.
    pub fn from_reports<'a, I>(totals: ScanTotals, reports: I) -> Self
    where
        I: IntoIterator<Item = &'a DeletionReport>,
    {
        let builder = reports
            .into_iter()
            .fold(SummaryBuilder::new(), |mut acc, report| {
                acc.record(report);
                acc
            });
        builder.finish(totals)
    }

    pub fn outcome(&self) -> RunOutcome {
        let succeeded = self.deleted + self.dry_run_skipped;
        if self.cancelled {
            RunOutcome::Cancelled
        } else if self.expired == 0 {
            RunOutcome::NothingMatched
        } else if self.failed == 0 {
            RunOutcome::Succeeded
        } else if succeeded == 0 {
            RunOutcome::AllFailed
        } else {
            RunOutcome::Partial
        }
    }

    /// `true` when nothing failed and the run was not cut short.
    pub fn is_success(&self) -> bool {
        matches!(
            self.outcome(),
            RunOutcome::NothingMatched | RunOutcome::Succeeded
        )
    }
}
