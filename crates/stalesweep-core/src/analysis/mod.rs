/// Analysis modules — per-file decisions made after scanning.

pub mod expiry;

pub use expiry::{
    evaluate, evaluate_scan, EvaluationOutcome, Reason, TimestampPolicy, TimestampSource, Verdict,
};
