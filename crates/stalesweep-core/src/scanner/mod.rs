/// Directory scanner — enumerates candidate files below a sweep root.
///
/// The walk is a `jwalk` iterator wrapped in [`Scan`], which yields one
/// [`ScanItem`] per regular file as the walk reaches it. Nothing is
/// collected up front: a sweep over a directory with millions of entries holds
/// only the records currently being evaluated or deleted.
///
/// # Symbolic links
///
/// By default links are not followed and link entries are not candidates at
/// all, which rules out directory cycles. With `follow_symlinks` the target's
/// metadata is used and the link path is the candidate (deleting it removes
/// the link, never the target). Loops then surface as [`ScanIssue`]s.
///
/// The scanner never writes to the filesystem.
pub mod filter;

pub use filter::ExtensionFilter;

use crate::error::{Result, SweepError};
use crate::model::FileRecord;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// One step of a scan: a candidate file, or an entry that could not be read.
pub type ScanItem = std::result::Result<FileRecord, ScanIssue>;

/// A non-fatal problem met during the walk (unreadable subdirectory,
/// vanished entry, symlink loop).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanIssue {
    pub path: PathBuf,
    pub message: String,
}

/// What to enumerate.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub recursive: bool,
    pub follow_symlinks: bool,
    pub include_hidden: bool,
    pub extensions: Option<ExtensionFilter>,
    /// Reader threads for recursive walks. 1 walks serially.
    pub concurrency: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            recursive: false,
            follow_symlinks: false,
            include_hidden: true,
            extensions: None,
            concurrency: 1,
        }
    }
}

/// A lazily evaluated scan. Finite and single-pass: once drained it cannot be
/// restarted; scan again for a fresh view.
pub struct Scan {
    root: PathBuf,
    recursive: bool,
    extensions: Option<ExtensionFilter>,
    entries: jwalk::DirEntryIter<((), ())>,
}

impl Scan {
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_recursive(&self) -> bool {
        self.recursive
    }
}

impl std::fmt::Debug for Scan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scan")
            .field("root", &self.root)
            .field("recursive", &self.recursive)
            .finish_non_exhaustive()
    }
}

impl Iterator for Scan {
    type Item = ScanItem;

    fn next(&mut self) -> Option<ScanItem> {
        loop {
            let entry = match self.entries.next()? {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| self.root.clone());
                    return Some(Err(ScanIssue {
                        path,
                        message: err.to_string(),
                    }));
                }
            };

            let file_type = entry.file_type();
            if file_type.is_dir() {
                continue;
            }

            let path = entry.path();

            // Only reachable when links are not followed.
            if file_type.is_symlink() {
                trace!("Skipping symlink {}", path.display());
                continue;
            }

            if let Some(filter) = &self.extensions {
                if !filter.matches(&path) {
                    continue;
                }
            }

            match entry.metadata() {
                Ok(meta) if meta.is_file() => {
                    return Some(Ok(FileRecord::from_metadata(path, entry.depth, &meta)));
                }
                // Sockets, FIFOs, device nodes.
                Ok(_) => {
                    trace!("Skipping special file {}", path.display());
                    continue;
                }
                Err(err) => {
                    return Some(Err(ScanIssue {
                        path,
                        message: err.to_string(),
                    }));
                }
            }
        }
    }
}

/// Start scanning `root`.
///
/// The root is checked eagerly so a missing or non-directory root fails here,
/// before any entry is produced. Everything below the root is read lazily.
pub fn scan_directory(root: &Path, options: &ScanOptions) -> Result<Scan> {
    let meta =
        std::fs::metadata(root).map_err(|e| SweepError::from_stat(root.to_path_buf(), e))?;
    if !meta.is_dir() {
        return Err(SweepError::NotADirectory(root.to_path_buf()));
    }

    let parallelism = if options.recursive && options.concurrency > 1 {
        jwalk::Parallelism::RayonNewPool(options.concurrency)
    } else {
        jwalk::Parallelism::Serial
    };

    let walker = jwalk::WalkDir::new(root)
        .skip_hidden(!options.include_hidden)
        .follow_links(options.follow_symlinks)
        .min_depth(1)
        .max_depth(if options.recursive { usize::MAX } else { 1 })
        .sort(true)
        .parallelism(parallelism);

    debug!(
        "Scanning {} (recursive: {}, follow symlinks: {}, hidden: {})",
        root.display(),
        options.recursive,
        options.follow_symlinks,
        options.include_hidden
    );

    Ok(Scan {
        root: root.to_path_buf(),
        recursive: options.recursive,
        extensions: options.extensions.clone(),
        entries: walker.into_iter(),
    })
}
