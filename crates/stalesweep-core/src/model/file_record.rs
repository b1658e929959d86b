/// A single regular file observed by the scanner.
///
/// Records are immutable snapshots taken at scan time. The filesystem may
/// change before the deletion stage reaches them (another process deletes or
/// replaces the file), so nothing downstream trusts a record blindly.
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::Metadata;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    /// Full path as produced by the walk (root joined with relative path).
    pub path: PathBuf,

    /// Birth time. `None` where the platform or filesystem does not record it.
    pub created: Option<DateTime<Utc>>,

    /// Last content modification time.
    pub modified: Option<DateTime<Utc>>,

    /// Logical size in bytes.
    pub size: u64,

    /// Distance below the scan root (direct children are depth 1).
    pub depth: usize,
}

impl FileRecord {
    /// Build a record from already-fetched metadata.
    ///
    /// `created()` returns `Err(Unsupported)` on filesystems without birth
    /// times; that is stored as `None` rather than treated as a failure.
    pub fn from_metadata(path: PathBuf, depth: usize, meta: &Metadata) -> Self {
        Self {
            path,
            created: meta.created().ok().map(DateTime::<Utc>::from),
            modified: meta.modified().ok().map(DateTime::<Utc>::from),
            size: meta.len(),
            depth,
        }
    }

    /// The directory listing this record was found in.
    pub fn parent_dir(&self) -> Option<&Path> {
        self.path.parent()
    }

    /// Final path component, lossily decoded.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}
