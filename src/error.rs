use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncerError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Cannot resolve path {path}: {source}")]
    PathResolution {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("Cannot read directory {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot hash {path}: {source}")]
    Hash {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot spawn {stage} thread for {path}: {source}")]
    Spawn {
        stage: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid pattern: {0}")]
    Pattern(String),
}

impl SyncerError {
    pub(crate) fn resolution(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SyncerError::PathResolution {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SyncerError::Read {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn hash(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SyncerError::Hash {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn spawn(
        stage: &'static str,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        SyncerError::Spawn {
            stage,
            path: path.into(),
            source,
        }
    }

    /// The filesystem path this error concerns, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            SyncerError::PathResolution { path, .. }
            | SyncerError::Read { path, .. }
            | SyncerError::Hash { path, .. }
            | SyncerError::Spawn { path, .. }
            | SyncerError::NotADirectory(path) => Some(path.as_path()),
            SyncerError::InvalidArgument(_) | SyncerError::Pattern(_) => None,
        }
    }
}
