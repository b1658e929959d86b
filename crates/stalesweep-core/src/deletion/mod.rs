/// Deletion executor — removes expired files and reports each outcome.
///
/// Every file is handled independently: one failure is recorded and the next
/// file is processed. Nothing is retried. A file that disappeared between
/// scan and delete (another sweep, a log rotator) is a normal, non-fatal
/// outcome and is reported as [`FailureReason::Vanished`].
///
/// # Worker pool
///
/// The caller's thread pulls expired outcomes from the (lazy) upstream
/// pipeline and pushes them into a bounded queue drained by `concurrency`
/// rayon workers. The queue bound caps how many records are in flight, so
/// memory does not grow with directory size. Each worker folds its reports
/// into a private [`SummaryBuilder`]; the builders are merged at the end.
use crate::analysis::EvaluationOutcome;
use crate::error::Result;
use crate::model::FileRecord;
use crate::report::SummaryBuilder;
use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Queue slots per worker between the producer and the deletion workers.
const QUEUE_SLOTS_PER_WORKER: usize = 64;

/// Cooperative cancellation flag shared between a sweep and its controller.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request the sweep to stop before its next file.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Why a deletion did not happen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FailureReason {
    PermissionDenied,
    /// Gone before we got to it.
    Vanished,
    /// Replaced by a directory since the scan.
    NowDirectory,
    Io(String),
}

impl FailureReason {
    fn from_io(err: &std::io::Error) -> Self {
        match err.kind() {
            ErrorKind::NotFound => Self::Vanished,
            ErrorKind::PermissionDenied => Self::PermissionDenied,
            _ => Self::Io(err.to_string()),
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PermissionDenied => f.write_str("permission denied"),
            Self::Vanished => f.write_str("file no longer exists"),
            Self::NowDirectory => f.write_str("path is now a directory"),
            Self::Io(message) => f.write_str(message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum DeletionStatus {
    Deleted,
    /// Would have been deleted; dry-run left it alone.
    DryRun,
    Failed(FailureReason),
}

/// Outcome for one expired file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletionReport {
    pub path: PathBuf,
    /// Size at scan time.
    pub size: u64,
    pub status: DeletionStatus,
}

/// Delete (or, under dry-run, pretend to delete) one file.
pub fn delete_file(record: &FileRecord, dry_run: bool) -> DeletionReport {
    let status = if dry_run {
        DeletionStatus::DryRun
    } else {
        match remove(&record.path) {
            Ok(()) => DeletionStatus::Deleted,
            Err(reason) => DeletionStatus::Failed(reason),
        }
    };

    match &status {
        DeletionStatus::Failed(reason) => {
            warn!("Could not delete {}: {reason}", record.path.display())
        }
        _ => debug!("{:?} {}", status, record.path.display()),
    }

    DeletionReport {
        path: record.path.clone(),
        size: record.size,
        status,
    }
}

/// Re-check the entry right before unlinking; the scan snapshot may be stale.
/// `symlink_metadata` so a followed link is removed as a link.
fn remove(path: &Path) -> std::result::Result<(), FailureReason> {
    let meta = std::fs::symlink_metadata(path).map_err(|e| FailureReason::from_io(&e))?;
    if meta.is_dir() {
        return Err(FailureReason::NowDirectory);
    }
    std::fs::remove_file(path).map_err(|e| FailureReason::from_io(&e))
}

/// Deletes expired files on a bounded worker pool.
pub struct DeletionExecutor<'a> {
    dry_run: bool,
    concurrency: usize,
    cancel: CancelToken,
    on_report: Option<&'a (dyn Fn(&DeletionReport) + Sync)>,
}

impl<'a> DeletionExecutor<'a> {
    /// `concurrency` is clamped to at least one worker.
    pub fn new(dry_run: bool, concurrency: usize, cancel: CancelToken) -> Self {
        Self {
            dry_run,
            concurrency: concurrency.max(1),
            cancel,
            on_report: None,
        }
    }

    /// Called from worker threads once per finished file.
    pub fn on_report(mut self, callback: &'a (dyn Fn(&DeletionReport) + Sync)) -> Self {
        self.on_report = Some(callback);
        self
    }

    /// Process every expired outcome in `outcomes`; retained ones are ignored.
    ///
    /// Stops pulling from `outcomes` once the cancel token is set. Expired
    /// outcomes already pulled or queued at that point are counted as not
    /// attempted.
    pub fn run<I>(&self, outcomes: I) -> Result<SummaryBuilder>
    where
        I: IntoIterator<Item = EvaluationOutcome>,
    {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.concurrency)
            .thread_name(|i| format!("stalesweep-delete-{i}"))
            .build()?;

        let (work_tx, work_rx) =
            crossbeam_channel::bounded::<FileRecord>(self.concurrency * QUEUE_SLOTS_PER_WORKER);
        let partials: Mutex<Vec<SummaryBuilder>> = Mutex::new(Vec::with_capacity(self.concurrency));
        let mut unqueued = SummaryBuilder::new();

        pool.in_place_scope(|scope| {
            for _ in 0..self.concurrency {
                let work_rx = work_rx.clone();
                let partials = &partials;
                scope.spawn(move |_| {
                    let mut acc = SummaryBuilder::new();
                    for record in work_rx.iter() {
                        if self.cancel.is_cancelled() {
                            acc.record_not_attempted();
                            continue;
                        }
                        let report = delete_file(&record, self.dry_run);
                        if let Some(callback) = self.on_report {
                            callback(&report);
                        }
                        acc.record(&report);
                    }
                    partials.lock().push(acc);
                });
            }

            for outcome in outcomes {
                if self.cancel.is_cancelled() {
                    debug!("Cancellation requested; no further files will be queued");
                    if outcome.is_expired() {
                        unqueued.record_not_attempted();
                    }
                    break;
                }
                if !outcome.is_expired() {
                    continue;
                }
                if work_tx.send(outcome.record).is_err() {
                    break;
                }
            }
            // Workers finish once the queue is drained and closed.
            drop(work_tx);
        });

        Ok(partials
            .into_inner()
            .into_iter()
            .fold(unqueued, SummaryBuilder::merge))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{Reason, TimestampSource, Verdict};
    use crate::report::{RunOutcome, ScanTotals};
    use chrono::Utc;
    use std::fs;

    fn record_for(path: &Path, size: u64) -> FileRecord {
        FileRecord {
            path: path.to_path_buf(),
            created: None,
            modified: Some(Utc::now()),
            size,
            depth: 1,
        }
    }

    fn expired(path: &Path, size: u64) -> EvaluationOutcome {
        EvaluationOutcome {
            record: record_for(path, size),
            verdict: Verdict::Expired,
            reason: Reason {
                source: TimestampSource::Modified,
                timestamp: Some(Utc::now()),
                cutoff: Utc::now(),
            },
        }
    }

    fn finish(builder: SummaryBuilder, expired: u64) -> crate::report::RunSummary {
        builder.finish(ScanTotals {
            root: PathBuf::from("/"),
            cutoff: Utc::now(),
            dry_run: false,
            scanned: expired,
            expired,
            scan_issues: Vec::new(),
            cancelled: false,
        })
    }

    #[test]
    fn deletes_a_regular_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("old.log");
        fs::write(&path, b"12345").unwrap();

        let report = delete_file(&record_for(&path, 5), false);
        assert_eq!(report.status, DeletionStatus::Deleted);
        assert!(!path.exists());
    }

    #[test]
    fn dry_run_leaves_the_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("old.log");
        fs::write(&path, b"12345").unwrap();

        let report = delete_file(&record_for(&path, 5), true);
        assert_eq!(report.status, DeletionStatus::DryRun);
        assert!(path.exists());
    }

    #[test]
    fn vanished_file_is_a_recorded_failure() {
        let tmp = tempfile::TempDir::new().unwrap();
        let report = delete_file(&record_for(&tmp.path().join("gone.txt"), 1), false);
        assert_eq!(
            report.status,
            DeletionStatus::Failed(FailureReason::Vanished)
        );
    }

    #[test]
    fn file_replaced_by_directory_is_not_removed() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("was_a_file");
        fs::create_dir(&path).unwrap();

        let report = delete_file(&record_for(&path, 1), false);
        assert_eq!(
            report.status,
            DeletionStatus::Failed(FailureReason::NowDirectory)
        );
        assert!(path.is_dir());
    }

    #[test]
    fn one_failure_does_not_stop_the_rest() {
        let tmp = tempfile::TempDir::new().unwrap();
        let a = tmp.path().join("a.log");
        let b = tmp.path().join("b.log");
        fs::write(&a, b"aa").unwrap();
        fs::write(&b, b"bbb").unwrap();
        let missing = tmp.path().join("missing.log");

        let outcomes = vec![expired(&a, 2), expired(&missing, 7), expired(&b, 3)];
        let builder = DeletionExecutor::new(false, 2, CancelToken::new())
            .run(outcomes)
            .unwrap();
        let summary = finish(builder, 3);

        assert_eq!(summary.deleted, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.deleted + summary.failed, 3);
        assert_eq!(summary.bytes_affected, 5);
        assert_eq!(summary.failures[0].path, missing);
        assert_eq!(summary.outcome(), RunOutcome::Partial);
        assert!(!a.exists() && !b.exists());
    }

    #[test]
    fn retained_outcomes_are_ignored() {
        let tmp = tempfile::TempDir::new().unwrap();
        let keep = tmp.path().join("keep.log");
        fs::write(&keep, b"k").unwrap();

        let mut outcome = expired(&keep, 1);
        outcome.verdict = Verdict::Retained;

        let builder = DeletionExecutor::new(false, 1, CancelToken::new())
            .run(vec![outcome])
            .unwrap();
        assert_eq!(builder, SummaryBuilder::new());
        assert!(keep.exists());
    }

    #[test]
    fn cancelled_executor_touches_nothing() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("old.log");
        fs::write(&path, b"x").unwrap();

        let cancel = CancelToken::new();
        cancel.cancel();
        let builder = DeletionExecutor::new(false, 4, cancel)
            .run(vec![expired(&path, 1)])
            .unwrap();
        let summary = finish(builder, 1);

        assert_eq!(summary.deleted, 0);
        assert_eq!(summary.not_attempted, 1);
        assert!(path.exists());
    }

    #[test]
    fn callback_sees_every_report() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut outcomes = Vec::new();
        for i in 0..20 {
            let path = tmp.path().join(format!("f{i:02}.tmp"));
            fs::write(&path, b"x").unwrap();
            outcomes.push(expired(&path, 1));
        }

        let seen = Mutex::new(Vec::new());
        let callback = |report: &DeletionReport| seen.lock().push(report.path.clone());
        DeletionExecutor::new(true, 3, CancelToken::new())
            .on_report(&callback)
            .run(outcomes)
            .unwrap();

        assert_eq!(seen.lock().len(), 20);
    }

    #[test]
    fn failure_reason_serialises_with_kind_tag() {
        let json = serde_json::to_string(&FailureReason::Io("busy".into())).unwrap();
        assert_eq!(json, r#"{"kind":"io","detail":"busy"}"#);
        let json = serde_json::to_string(&FailureReason::Vanished).unwrap();
        assert_eq!(json, r#"{"kind":"vanished"}"#);
    }
}
