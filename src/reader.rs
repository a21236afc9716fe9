//! Lists the immediate children of one directory.

use crate::error::SyncerError;
use crate::options::SyncerOptions;
use crate::types::Entry;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::fs;
use std::path::Path;

/// Decides which children of a directory are reported.
#[derive(Debug, Clone)]
pub(crate) struct EntryFilter {
    include_hidden: bool,
    exclude: Option<GlobSet>,
}

impl EntryFilter {
    pub(crate) fn new(options: &SyncerOptions) -> Result<Self, SyncerError> {
        let exclude = if !options.exclude.is_empty() {
            let mut builder = GlobSetBuilder::new();
            for pattern in &options.exclude {
                let glob = Glob::new(pattern).map_err(|e| {
                    SyncerError::Pattern(format!("Invalid glob pattern '{}': {}", pattern, e))
                })?;
                builder.add(glob);
            }
            Some(
                builder
                    .build()
                    .map_err(|e| SyncerError::Pattern(format!("Failed to build glob set: {}", e)))?,
            )
        } else {
            None
        };
        Ok(Self {
            include_hidden: options.include_hidden,
            exclude,
        })
    }

    fn accepts(&self, name: &str, path: &Path) -> bool {
        if !self.include_hidden && name.starts_with('.') {
            return false;
        }
        match &self.exclude {
            Some(set) => !set.is_match(path),
            None => true,
        }
    }
}

/// Returns the children of `dir` in the order the filesystem lists them.
///
/// Symbolic links are reported as themselves and never followed. Children that
/// vanish between listing and `stat` are skipped.
///
/// # Errors
///
/// Returns [`SyncerError::Read`] if the directory cannot be opened or iterated.
pub(crate) fn read_entries(dir: &Path, filter: &EntryFilter) -> Result<Vec<Entry>, SyncerError> {
    let listing = fs::read_dir(dir).map_err(|e| SyncerError::read(dir, e))?;
    let mut entries = Vec::new();
    for child in listing {
        let child = child.map_err(|e| SyncerError::read(dir, e))?;
        let name = child.file_name().to_string_lossy().into_owned();
        let path = child.path();
        if !filter.accepts(&name, &path) {
            continue;
        }
        let metadata = match fs::symlink_metadata(&path) {
            Ok(metadata) => metadata,
            Err(_e) => {
                #[cfg(feature = "logging")]
                tracing::debug!("Skipping {}: {}", path.display(), _e);
                continue;
            }
        };
        entries.push(Entry::from_metadata(name, dir, &metadata));
    }
    Ok(entries)
}
