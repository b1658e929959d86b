/// StaleSweep Core — threshold resolution, scanning, expiry evaluation and deletion.
///
/// This crate contains all business logic with zero terminal dependencies.
/// It is designed to be reusable across different frontends (CLI, services,
/// scheduled jobs).
///
/// # Modules
///
/// - [`threshold`] — Expiration criteria and cutoff resolution.
/// - [`scanner`] — Lazy directory enumeration producing file records.
/// - [`analysis`] — Per-file expiry evaluation against a cutoff.
/// - [`deletion`] — Deletion executor with dry-run and cancellation.
/// - [`report`] — Aggregation of per-file reports into a run summary.
/// - [`sweep`] — The end-to-end pipeline and its background handle.
/// - [`model`] — File records and size formatting.
pub mod analysis;
pub mod deletion;
pub mod error;
pub mod model;
pub mod report;
pub mod scanner;
pub mod sweep;
pub mod threshold;

pub use analysis::{EvaluationOutcome, TimestampPolicy, Verdict};
pub use deletion::{CancelToken, DeletionReport, DeletionStatus, FailureReason};
pub use error::{Result, SweepError};
pub use model::FileRecord;
pub use report::{RunOutcome, RunSummary};
pub use sweep::{
    is_expired, remove_expired_file, remove_expired_files, start_sweep, Sweep, SweepHandle,
    SweepOptions, SweepProgress,
};
pub use threshold::{CriterionSpec, DatePattern, ExpirationCriterion};
