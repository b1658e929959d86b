/// Expiry evaluation — decide, per file, whether it is older than the cutoff.
///
/// Pure functions of their inputs: no clock reads, no filesystem access.
/// The boundary is exclusive: a timestamp equal to the cutoff is retained.
use crate::model::FileRecord;
use crate::threshold::DatePattern;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which timestamp of a file is compared against the cutoff.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampPolicy {
    /// Last modification time.
    #[default]
    Modified,
    /// Creation (birth) time, where the filesystem records it.
    Created,
    /// The later of creation and modification time.
    MostRecent,
    /// A date embedded in the file name.
    FilenameDate(DatePattern),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampSource {
    Created,
    Modified,
    FilenameDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Expired,
    Retained,
}

/// Why a verdict was reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reason {
    /// The timestamp the policy selected.
    pub source: TimestampSource,
    /// Its value; `None` when the file does not have one (no birth time on
    /// this filesystem, no date in the name).
    pub timestamp: Option<DateTime<Utc>>,
    pub cutoff: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvaluationOutcome {
    pub record: FileRecord,
    pub verdict: Verdict,
    pub reason: Reason,
}

impl EvaluationOutcome {
    pub fn is_expired(&self) -> bool {
        self.verdict == Verdict::Expired
    }
}

/// Classify one record.
///
/// A file whose selected timestamp is unavailable is always retained: an
/// unknown age never leads to a deletion.
pub fn evaluate(
    record: &FileRecord,
    cutoff: DateTime<Utc>,
    policy: &TimestampPolicy,
) -> (Verdict, Reason) {
    let (source, timestamp) = select_timestamp(record, policy);
    let verdict = match timestamp {
        Some(ts) if ts < cutoff => Verdict::Expired,
        _ => Verdict::Retained,
    };
    (
        verdict,
        Reason {
            source,
            timestamp,
            cutoff,
        },
    )
}

/// Lazily classify a sequence of records, preserving their order.
pub fn evaluate_scan<'p, I>(
    records: I,
    cutoff: DateTime<Utc>,
    policy: &'p TimestampPolicy,
) -> impl Iterator<Item = EvaluationOutcome> + 'p
where
    I: IntoIterator<Item = FileRecord>,
    I::IntoIter: 'p,
{
    records.into_iter().map(move |record| {
        let (verdict, reason) = evaluate(&record, cutoff, policy);
        EvaluationOutcome {
            record,
            verdict,
            reason,
        }
    })
}

fn select_timestamp(
    record: &FileRecord,
    policy: &TimestampPolicy,
) -> (TimestampSource, Option<DateTime<Utc>>) {
    match policy {
        TimestampPolicy::Modified => (TimestampSource::Modified, record.modified),
        TimestampPolicy::Created => (TimestampSource::Created, record.created),
        TimestampPolicy::MostRecent => match (record.created, record.modified) {
            (Some(created), Some(modified)) if created > modified => {
                (TimestampSource::Created, Some(created))
            }
            (_, Some(modified)) => (TimestampSource::Modified, Some(modified)),
            (Some(created), None) => (TimestampSource::Created, Some(created)),
            (None, None) => (TimestampSource::Modified, None),
        },
        TimestampPolicy::FilenameDate(pattern) => (
            TimestampSource::FilenameDate,
            pattern.extract(&record.file_name()),
        ),
    }
}
