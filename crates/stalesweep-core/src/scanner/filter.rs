/// Extension allow-list applied while scanning.
use crate::error::{Result, SweepError};
use std::path::Path;

/// Only files whose final extension is in the list are candidates.
///
/// Matching is exact and case-sensitive on the last extension only, so
/// `notes.txt.bak` is a `.bak` file and a dotfile such as `.hidden` has no
/// extension at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionFilter {
    extensions: Vec<String>,
}

impl ExtensionFilter {
    /// Build from user input. Entries may be written with or without the
    /// leading dot (`".log"` and `"log"` are the same).
    pub fn new<S: AsRef<str>>(entries: &[S]) -> Result<Self> {
        let mut extensions = Vec::with_capacity(entries.len());
        for entry in entries {
            let raw = entry.as_ref();
            let ext = raw.strip_prefix('.').unwrap_or(raw);
            if ext.is_empty() || ext.contains(['/', '\\']) {
                return Err(SweepError::InvalidOptions(format!(
                    "invalid extension filter entry {raw:?}"
                )));
            }
            extensions.push(ext.to_string());
        }
        Ok(Self { extensions })
    }

    pub fn matches(&self, path: &Path) -> bool {
        match path.extension() {
            Some(ext) => {
                let ext = ext.to_string_lossy();
                self.extensions.iter().any(|allowed| *allowed == ext)
            }
            None => false,
        }
    }
}
