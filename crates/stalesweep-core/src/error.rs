/// Error taxonomy for a sweep.
///
/// Configuration and path errors abort a run before anything is deleted.
/// Per-file deletion failures are never raised through this type; they are
/// recorded in [`crate::deletion::DeletionReport`] and the run summary.
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = SweepError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum SweepError {
    /// The threshold cannot be turned into a cutoff instant.
    #[error("invalid expiration criterion: {0}")]
    InvalidCriterion(String),

    /// A sweep option is out of range.
    #[error("invalid option: {0}")]
    InvalidOptions(String),

    /// A file-name date pattern could not be compiled.
    #[error("invalid date pattern {pattern:?}: {reason}")]
    InvalidDatePattern { pattern: String, reason: String },

    #[error("path does not exist: {}", .0.display())]
    PathNotFound(PathBuf),

    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// Any other failure to inspect the sweep root.
    #[error("cannot access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to start deletion workers: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error("failed to spawn sweep thread: {0}")]
    Spawn(#[source] std::io::Error),
}

impl SweepError {
    /// `true` for errors caused by the caller's criterion or options.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidCriterion(_) | Self::InvalidOptions(_) | Self::InvalidDatePattern { .. }
        )
    }

    /// `true` for errors about the sweep root itself.
    pub fn is_path(&self) -> bool {
        matches!(
            self,
            Self::PathNotFound(_) | Self::NotADirectory(_) | Self::Io { .. }
        )
    }

    /// Map an `io::Error` from stat-ing `path` onto the path taxonomy.
    pub(crate) fn from_stat(path: PathBuf, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::PathNotFound(path)
        } else {
            Self::Io { path, source }
        }
    }
}
