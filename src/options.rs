use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Digest used to fingerprint file contents. Both variants produce 256 bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HashAlgorithm {
    #[default]
    Sha256,
    Sha512_256,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncerOptions {
    pub root: PathBuf,
    /// Upper bound on concurrently walked directories; `None` spawns one
    /// thread per directory.
    pub max_concurrency: Option<usize>,
    pub algorithm: HashAlgorithm,
    pub include_hidden: bool,
    pub exclude: Vec<String>,
}

impl Default for SyncerOptions {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            max_concurrency: None,
            algorithm: HashAlgorithm::Sha256,
            include_hidden: true,
            exclude: Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
pub struct SyncerBuilder {
    options: SyncerOptions,
}

impl SyncerBuilder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            options: SyncerOptions {
                root: root.into(),
                ..Default::default()
            },
        }
    }

    pub fn max_concurrency(mut self, limit: usize) -> Self {
        self.options.max_concurrency = Some(limit.max(1));
        self
    }

    pub fn unbounded(mut self) -> Self {
        self.options.max_concurrency = None;
        self
    }

    pub fn algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.options.algorithm = algorithm;
        self
    }

    pub fn include_hidden(mut self, yes: bool) -> Self {
        self.options.include_hidden = yes;
        self
    }

    pub fn exclude(mut self, patterns: Vec<String>) -> Self {
        self.options.exclude = patterns;
        self
    }

    pub fn build(self) -> SyncerOptions {
        self.options
    }
}
