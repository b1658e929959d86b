/// Sweep options — everything about a run except the threshold itself.
use crate::analysis::TimestampPolicy;
use crate::error::{Result, SweepError};
use crate::scanner::{ExtensionFilter, ScanOptions};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepOptions {
    /// Descend into subdirectories.
    pub recursive: bool,
    pub timestamp_policy: TimestampPolicy,
    /// Report what would be deleted without deleting it.
    pub dry_run: bool,
    pub follow_symlinks: bool,
    pub include_hidden: bool,
    /// Only consider files with one of these extensions (`".log"` or `"log"`).
    pub extensions: Option<Vec<String>>,
    /// Deletion workers (and directory readers for recursive walks).
    pub concurrency: usize,
}

impl Default for SweepOptions {
    fn default() -> Self {
        Self {
            recursive: false,
            timestamp_policy: TimestampPolicy::default(),
            dry_run: false,
            follow_symlinks: false,
            include_hidden: true,
            extensions: None,
            concurrency: num_cpus::get(),
        }
    }
}

impl SweepOptions {
    /// Validate and derive the scanner's view of these options.
    pub fn scan_options(&self) -> Result<ScanOptions> {
        if self.concurrency == 0 {
            return Err(SweepError::InvalidOptions(
                "concurrency must be at least 1".into(),
            ));
        }

        let extensions = match &self.extensions {
            Some(list) if list.is_empty() => {
                return Err(SweepError::InvalidOptions(
                    "extension filter is set but empty".into(),
                ))
            }
            Some(list) => Some(ExtensionFilter::new(list)?),
            None => None,
        };

        Ok(ScanOptions {
            recursive: self.recursive,
            follow_symlinks: self.follow_symlinks,
            include_hidden: self.include_hidden,
            extensions,
            concurrency: self.concurrency,
        })
    }
}
