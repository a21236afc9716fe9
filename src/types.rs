use serde::{Deserialize, Serialize};
use std::fs::{FileType, Metadata};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// What kind of object an [`Entry`] describes, as seen without following links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
    /// FIFOs, sockets and device nodes.
    Special,
}

impl EntryKind {
    fn from_file_type(file_type: FileType) -> Self {
        if file_type.is_symlink() {
            EntryKind::Symlink
        } else if file_type.is_dir() {
            EntryKind::Directory
        } else if file_type.is_file() {
            EntryKind::File
        } else {
            EntryKind::Special
        }
    }
}

/// One filesystem object observed during a walk.
///
/// Entries are created by the directory reader and only ever gain a content
/// hash afterwards, when the hashing stage processes a regular file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    name: String,
    directory_path: PathBuf,
    is_directory: bool,
    kind: EntryKind,
    size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    modified_at: Option<SystemTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content_hash: Option<String>,
}

impl Entry {
    pub(crate) fn from_metadata(
        name: String,
        directory_path: impl Into<PathBuf>,
        metadata: &Metadata,
    ) -> Self {
        Self {
            name,
            directory_path: directory_path.into(),
            is_directory: metadata.is_dir(),
            kind: EntryKind::from_file_type(metadata.file_type()),
            size: metadata.len(),
            modified_at: metadata.modified().ok(),
            content_hash: None,
        }
    }

    /// Base name of the object.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Absolute path of the containing directory.
    pub fn directory_path(&self) -> &Path {
        &self.directory_path
    }

    /// Full path of the object.
    pub fn path(&self) -> PathBuf {
        self.directory_path.join(&self.name)
    }

    pub fn is_directory(&self) -> bool {
        self.is_directory
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    /// Whether this is a regular file, the only kind that gets a content hash.
    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    /// Size in bytes at observation time.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn modified_at(&self) -> Option<SystemTime> {
        self.modified_at
    }

    /// Hex-encoded digest of the file's bytes.
    ///
    /// `None` for directories, symlinks, special files and for entries that
    /// have not been hashed.
    pub fn content_hash(&self) -> Option<&str> {
        self.content_hash.as_deref()
    }

    pub(crate) fn set_content_hash(&mut self, hash: String) {
        debug_assert!(self.content_hash.is_none(), "content hash attached twice");
        self.content_hash = Some(hash);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn entry_from_file_metadata() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "hello").unwrap();
        let metadata = fs::metadata(dir.path().join("a.txt")).unwrap();
        let entry = Entry::from_metadata("a.txt".into(), dir.path(), &metadata);
        assert_eq!(entry.name(), "a.txt");
        assert_eq!(entry.size(), 5);
        assert!(!entry.is_directory());
        assert!(entry.is_file());
        assert_eq!(entry.kind(), EntryKind::File);
        assert!(entry.content_hash().is_none());
        assert_eq!(entry.path(), dir.path().join("a.txt"));
    }

    #[test]
    fn unhashed_entry_omits_hash_in_json() {
        let dir = tempdir().unwrap();
        let metadata = fs::metadata(dir.path()).unwrap();
        let entry = Entry::from_metadata("sub".into(), "/r", &metadata);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["is_directory"], true);
        assert_eq!(json["kind"], "directory");
        assert!(json.get("content_hash").is_none());
    }

    #[cfg(unix)]
    #[test]
    fn symlink_kind_comes_from_link_itself() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("real")).unwrap();
        std::os::unix::fs::symlink(dir.path().join("real"), dir.path().join("link")).unwrap();
        let metadata = fs::symlink_metadata(dir.path().join("link")).unwrap();
        let entry = Entry::from_metadata("link".into(), dir.path(), &metadata);
        assert_eq!(entry.kind(), EntryKind::Symlink);
        assert!(!entry.is_directory());
        assert!(!entry.is_file());
    }
}
