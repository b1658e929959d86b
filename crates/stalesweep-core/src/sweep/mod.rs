/// Sweep module — the end-to-end pipeline.
///
/// A sweep is strictly ordered: validate options, resolve the cutoff, check
/// the root, then stream scan → evaluate → delete → summarize. Configuration
/// and path errors surface before any file is touched; per-file problems are
/// recorded in the [`RunSummary`] instead of aborting the run.
///
/// [`Sweep::run`] blocks the caller. [`start_sweep`] runs the same pipeline
/// on a background thread and streams [`SweepProgress`] messages, for
/// frontends that want live output and Ctrl-C handling.
pub mod options;
pub mod progress;

pub use options::SweepOptions;
pub use progress::SweepProgress;

use crate::analysis::{evaluate, EvaluationOutcome, TimestampPolicy, Verdict};
use crate::deletion::{delete_file, CancelToken, DeletionExecutor, DeletionReport};
use crate::error::{Result, SweepError};
use crate::model::FileRecord;
use crate::report::{RunSummary, ScanTotals};
use crate::scanner::{self, ScanIssue};
use crate::threshold::ExpirationCriterion;

use chrono::{DateTime, Utc};
use crossbeam_channel::{Receiver, Sender};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Instant;
use tracing::{info, trace, warn};

/// Maximum number of progress messages that may queue up in the channel.
///
/// A consumer that stops draining stalls the sweep rather than letting the
/// queue grow without bound.
pub const PROGRESS_CHANNEL_CAPACITY: usize = 4_096;

/// One configured sweep over a directory.
#[derive(Debug)]
pub struct Sweep {
    root: PathBuf,
    criterion: ExpirationCriterion,
    options: SweepOptions,
    now: Option<DateTime<Utc>>,
    cancel: CancelToken,
    progress: Option<Sender<SweepProgress>>,
}

impl Sweep {
    pub fn new(
        root: impl Into<PathBuf>,
        criterion: ExpirationCriterion,
        options: SweepOptions,
    ) -> Self {
        Self {
            root: root.into(),
            criterion,
            options,
            now: None,
            cancel: CancelToken::new(),
            progress: None,
        }
    }

    /// Pin "now" instead of reading the clock when the run starts.
    pub fn now(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    pub fn cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn progress(mut self, tx: Sender<SweepProgress>) -> Self {
        self.progress = Some(tx);
        self
    }

    pub fn run(self) -> Result<RunSummary> {
        let started = Instant::now();

        let scan_options = self.options.scan_options()?;
        let now = self.now.unwrap_or_else(Utc::now);
        let cutoff = self.criterion.resolve(now)?;
        let scan = scanner::scan_directory(&self.root, &scan_options)?;

        info!(
            "Sweeping {} for files {} (cutoff {}){}",
            self.root.display(),
            self.criterion,
            cutoff,
            if self.options.dry_run { " [dry run]" } else { "" }
        );

        let progress = self.progress.as_ref();
        emit(
            progress,
            SweepProgress::Started {
                root: self.root.clone(),
                cutoff,
                dry_run: self.options.dry_run,
            },
        );

        let policy = &self.options.timestamp_policy;
        let mut scanned = 0u64;
        let mut expired = 0u64;
        let mut scan_issues: Vec<ScanIssue> = Vec::new();

        let outcomes = scan
            .filter_map(|item| match item {
                Ok(record) => Some(record),
                Err(issue) => {
                    warn!("Skipping {}: {}", issue.path.display(), issue.message);
                    emit(
                        progress,
                        SweepProgress::ScanError {
                            path: issue.path.clone(),
                            message: issue.message.clone(),
                        },
                    );
                    scan_issues.push(issue);
                    None
                }
            })
            .map(|record| {
                scanned += 1;
                let (verdict, reason) = evaluate(&record, cutoff, policy);
                if verdict == Verdict::Expired {
                    expired += 1;
                }
                trace!("{:?} {}", verdict, record.path.display());
                EvaluationOutcome {
                    record,
                    verdict,
                    reason,
                }
            });

        let on_report = |report: &DeletionReport| emit(progress, SweepProgress::from(report));
        let deletions = DeletionExecutor::new(
            self.options.dry_run,
            self.options.concurrency,
            self.cancel.clone(),
        )
        .on_report(&on_report)
        .run(outcomes)?;

        let cancelled = self.cancel.is_cancelled();
        let summary = deletions.finish(ScanTotals {
            root: self.root.clone(),
            cutoff,
            dry_run: self.options.dry_run,
            scanned,
            expired,
            scan_issues,
            cancelled,
        });

        let duration = started.elapsed();
        if cancelled {
            info!(
                "Sweep cancelled after {:.2?}: {} deleted, {} not attempted",
                duration, summary.deleted, summary.not_attempted
            );
            emit(
                progress,
                SweepProgress::Cancelled {
                    summary: Box::new(summary.clone()),
                },
            );
        } else {
            info!(
                "Sweep complete in {:.2?}: {} scanned, {} expired, {} deleted, {} failed",
                duration, summary.scanned, summary.expired, summary.deleted, summary.failed
            );
            emit(
                progress,
                SweepProgress::Complete {
                    summary: Box::new(summary.clone()),
                    duration,
                },
            );
        }

        Ok(summary)
    }
}

fn emit(progress: Option<&Sender<SweepProgress>>, message: SweepProgress) {
    if let Some(tx) = progress {
        // A consumer that hung up does not stop the sweep.
        let _ = tx.send(message);
    }
}

/// Delete every file under `directory` that is older than `criterion`.
///
/// Blocks until done. Equivalent to `Sweep::new(..).run()`.
pub fn remove_expired_files(
    directory: &Path,
    criterion: &ExpirationCriterion,
    options: &SweepOptions,
) -> Result<RunSummary> {
    Sweep::new(directory, *criterion, options.clone()).run()
}

/// Whether the single file at `path` is older than `criterion` as of `now`.
///
/// Symlinks are followed. A directory is never expired.
pub fn is_expired(
    path: &Path,
    criterion: &ExpirationCriterion,
    policy: &TimestampPolicy,
    now: DateTime<Utc>,
) -> Result<bool> {
    let cutoff = criterion.resolve(now)?;
    Ok(match stat_file(path)? {
        Some(record) => evaluate(&record, cutoff, policy).0 == Verdict::Expired,
        None => false,
    })
}

/// Delete the single file at `path` if it is expired.
///
/// Returns `None` when the file is retained (or is a directory), otherwise
/// the deletion report. Honours `dry_run` and `timestamp_policy`; the scan
/// options (recursion, filters) do not apply to a single path.
pub fn remove_expired_file(
    path: &Path,
    criterion: &ExpirationCriterion,
    options: &SweepOptions,
) -> Result<Option<DeletionReport>> {
    let cutoff = criterion.resolve(Utc::now())?;
    let Some(record) = stat_file(path)? else {
        return Ok(None);
    };
    let (verdict, _) = evaluate(&record, cutoff, &options.timestamp_policy);
    if verdict == Verdict::Retained {
        return Ok(None);
    }
    Ok(Some(delete_file(&record, options.dry_run)))
}

fn stat_file(path: &Path) -> Result<Option<FileRecord>> {
    let meta =
        std::fs::metadata(path).map_err(|e| SweepError::from_stat(path.to_path_buf(), e))?;
    if meta.is_dir() {
        return Ok(None);
    }
    Ok(Some(FileRecord::from_metadata(path.to_path_buf(), 0, &meta)))
}

/// Handle to a sweep running on a background thread.
pub struct SweepHandle {
    /// Progress messages from the sweep thread. Closed once the sweep ends.
    pub progress_rx: Receiver<SweepProgress>,
    cancel: CancelToken,
    thread: thread::JoinHandle<Result<RunSummary>>,
}

impl SweepHandle {
    /// Request the sweep to stop before its next file.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// A clone of the token, e.g. for a signal handler.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Wait for the sweep to finish and return its result.
    ///
    /// Undelivered progress messages are discarded.
    pub fn wait(self) -> Result<RunSummary> {
        drop(self.progress_rx);
        match self.thread.join() {
            Ok(result) => result,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}

impl std::fmt::Debug for SweepHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SweepHandle")
            .field("cancelled", &self.is_cancelled())
            .field("finished", &self.thread.is_finished())
            .finish_non_exhaustive()
    }
}

/// Start a sweep on a background thread.
///
/// Any cancel token set on `sweep` is kept and shared with the handle.
/// Errors the sweep hits before starting (invalid options, missing root) are
/// returned from [`SweepHandle::wait`].
pub fn start_sweep(sweep: Sweep) -> Result<SweepHandle> {
    let (progress_tx, progress_rx) =
        crossbeam_channel::bounded::<SweepProgress>(PROGRESS_CHANNEL_CAPACITY);
    let cancel = sweep.cancel.clone();
    let sweep = sweep.progress(progress_tx);

    let thread = thread::Builder::new()
        .name("stalesweep-sweep".into())
        .spawn(move || sweep.run())
        .map_err(SweepError::Spawn)?;

    Ok(SweepHandle {
        progress_rx,
        cancel,
        thread,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use std::fs::{self, File};
    use std::time::{Duration, SystemTime};

    fn write_aged(dir: &Path, name: &str, days_old: u64) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, b"data").unwrap();
        let mtime = SystemTime::now() - Duration::from_secs(days_old * 86_400);
        File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(mtime)
            .unwrap();
        path
    }

    fn serial() -> SweepOptions {
        SweepOptions {
            concurrency: 1,
            ..Default::default()
        }
    }

    #[test]
    fn run_deletes_only_expired_files() {
        let tmp = tempfile::TempDir::new().unwrap();
        let old = write_aged(tmp.path(), "old.log", 10);
        let new = write_aged(tmp.path(), "new.log", 1);

        let summary = Sweep::new(tmp.path(), ExpirationCriterion::Days(5), serial())
            .run()
            .unwrap();

        assert_eq!(summary.scanned, 2);
        assert_eq!(summary.expired, 1);
        assert_eq!(summary.deleted, 1);
        assert!(!old.exists());
        assert!(new.exists());
    }

    #[test]
    fn invalid_criterion_fails_before_the_root_is_checked() {
        let err = Sweep::new("/definitely/not/here", ExpirationCriterion::Days(-1), serial())
            .run()
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn progress_stream_brackets_the_run() {
        let tmp = tempfile::TempDir::new().unwrap();
        write_aged(tmp.path(), "a.tmp", 30);
        write_aged(tmp.path(), "b.tmp", 30);

        let (tx, rx) = crossbeam_channel::unbounded();
        let options = SweepOptions {
            dry_run: true,
            ..serial()
        };
        Sweep::new(tmp.path(), ExpirationCriterion::Days(7), options)
            .progress(tx)
            .run()
            .unwrap();

        let events: Vec<SweepProgress> = rx.try_iter().collect();
        assert!(matches!(events.first(), Some(SweepProgress::Started { dry_run: true, .. })));
        assert!(matches!(events.last(), Some(SweepProgress::Complete { .. })));
        let dry = events
            .iter()
            .filter(|e| matches!(e, SweepProgress::DryRun { .. }))
            .count();
        assert_eq!(dry, 2);
    }

    #[test]
    fn pinned_now_controls_the_cutoff() {
        let tmp = tempfile::TempDir::new().unwrap();
        let file = write_aged(tmp.path(), "f.txt", 3);

        // Seen from ten days in the past the file does not exist yet, so it
        // is far newer than any cutoff.
        let past = Utc::now() - TimeDelta::try_days(10).unwrap();
        let summary = Sweep::new(tmp.path(), ExpirationCriterion::Days(1), serial())
            .now(past)
            .run()
            .unwrap();
        assert_eq!(summary.expired, 0);
        assert!(file.exists());
    }

    #[test]
    fn pre_cancelled_sweep_deletes_nothing() {
        let tmp = tempfile::TempDir::new().unwrap();
        let file = write_aged(tmp.path(), "old.bin", 100);

        let cancel = CancelToken::new();
        cancel.cancel();
        let summary = Sweep::new(tmp.path(), ExpirationCriterion::Days(1), serial())
            .cancel_token(cancel)
            .run()
            .unwrap();

        assert!(summary.cancelled);
        assert_eq!(summary.deleted, 0);
        assert!(file.exists());
    }

    #[test]
    fn single_file_helpers() {
        let tmp = tempfile::TempDir::new().unwrap();
        let old = write_aged(tmp.path(), "old.txt", 10);
        let new = write_aged(tmp.path(), "new.txt", 0);
        let criterion = ExpirationCriterion::Days(5);
        let policy = TimestampPolicy::Modified;

        assert!(is_expired(&old, &criterion, &policy, Utc::now()).unwrap());
        assert!(!is_expired(&new, &criterion, &policy, Utc::now()).unwrap());
        assert!(!is_expired(tmp.path(), &criterion, &policy, Utc::now()).unwrap());
        assert!(matches!(
            is_expired(&tmp.path().join("nope"), &criterion, &policy, Utc::now()),
            Err(SweepError::PathNotFound(_))
        ));

        assert!(remove_expired_file(&new, &criterion, &serial())
            .unwrap()
            .is_none());
        let report = remove_expired_file(&old, &criterion, &serial())
            .unwrap()
            .expect("old file is expired");
        assert_eq!(report.status, crate::deletion::DeletionStatus::Deleted);
        assert!(!old.exists());
        assert!(new.exists());
    }

    #[test]
    fn start_sweep_reports_errors_through_wait() {
        let tmp = tempfile::TempDir::new().unwrap();
        let handle = start_sweep(Sweep::new(
            tmp.path().join("missing"),
            ExpirationCriterion::Days(1),
            serial(),
        ))
        .unwrap();
        assert!(matches!(handle.wait(), Err(SweepError::PathNotFound(_))));
    }
}
