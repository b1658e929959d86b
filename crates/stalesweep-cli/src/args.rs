/// Command-line arguments and their translation into core types.
use chrono::{DateTime, TimeDelta, Utc};
use clap::{ArgAction, ArgGroup, Parser, ValueEnum};
use stalesweep_core::threshold::parse_instant;
use stalesweep_core::{
    CriterionSpec, DatePattern, ExpirationCriterion, SweepError, SweepOptions, TimestampPolicy,
};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "stalesweep")]
#[command(author, version, about = "Remove files older than an age threshold", long_about = None)]
#[command(group(
    ArgGroup::new("threshold")
        .required(true)
        .args(["days", "older_than", "before"]),
))]
pub struct Cli {
    /// Directory to sweep
    pub directory: PathBuf,

    /// Delete files older than N days
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    pub days: Option<i64>,

    /// Delete files older than a duration (e.g. "90m", "36h", "2weeks")
    #[arg(long, value_name = "AGE", value_parser = parse_age)]
    pub older_than: Option<TimeDelta>,

    /// Delete files older than an instant (e.g. "2025-01-01", RFC 3339)
    #[arg(long, value_name = "DATE", value_parser = parse_instant_arg)]
    pub before: Option<DateTime<Utc>>,

    /// Measure --days / --older-than from this instant instead of now
    #[arg(long, value_name = "INSTANT", value_parser = parse_instant_arg)]
    pub relative_to: Option<DateTime<Utc>>,

    /// Which file timestamp is compared against the threshold
    #[arg(long, value_enum, default_value_t = TimestampArg::Modified)]
    pub timestamp: TimestampArg,

    /// Read the age from a date in the file name (e.g. "%Y-%m-%d")
    #[arg(long, value_name = "PATTERN")]
    pub name_date: Option<String>,

    /// Only consider files with this extension (repeatable)
    #[arg(long = "ext", value_name = "EXT")]
    pub extensions: Vec<String>,

    /// Descend into subdirectories
    #[arg(short, long)]
    pub recursive: bool,

    /// Report what would be deleted without deleting anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Follow symbolic links (links themselves are removed, never targets)
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Ignore dot-files and dot-directories
    #[arg(long)]
    pub exclude_hidden: bool,

    /// Deletion worker threads [default: number of CPUs]
    #[arg(short = 'j', long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Print the run summary as JSON
    #[arg(long)]
    pub json: bool,

    /// Increase verbosity (-v per-file lines, -vv debug logs, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TimestampArg {
    Modified,
    Created,
    MostRecent,
}

impl Cli {
    /// Parse `std::env::args`, exiting with usage on error.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn log_level(&self) -> tracing::Level {
        match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }

    pub fn criterion(&self) -> Result<ExpirationCriterion, SweepError> {
        ExpirationCriterion::try_from(CriterionSpec {
            days: self.days,
            older_than: self.older_than,
            before: self.before,
            relative_to: self.relative_to,
        })
    }

    pub fn sweep_options(&self) -> Result<SweepOptions, SweepError> {
        let timestamp_policy = match &self.name_date {
            Some(pattern) => TimestampPolicy::FilenameDate(DatePattern::new(pattern)?),
            None => match self.timestamp {
                TimestampArg::Modified => TimestampPolicy::Modified,
                TimestampArg::Created => TimestampPolicy::Created,
                TimestampArg::MostRecent => TimestampPolicy::MostRecent,
            },
        };

        let defaults = SweepOptions::default();
        Ok(SweepOptions {
            recursive: self.recursive,
            timestamp_policy,
            dry_run: self.dry_run,
            follow_symlinks: self.follow_symlinks,
            include_hidden: !self.exclude_hidden,
            extensions: (!self.extensions.is_empty()).then(|| self.extensions.clone()),
            concurrency: self.jobs.unwrap_or(defaults.concurrency),
        })
    }
}

fn parse_age(s: &str) -> Result<TimeDelta, String> {
    let age = humantime::parse_duration(s).map_err(|e| e.to_string())?;
    TimeDelta::from_std(age).map_err(|_| format!("{s} is too long"))
}

fn parse_instant_arg(s: &str) -> Result<DateTime<Utc>, String> {
    parse_instant(s).map_err(|e| e.to_string())
}
