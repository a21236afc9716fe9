use crate::cancel::CancellationToken;
use crate::error::SyncerError;
use crate::hasher;
use crate::options::SyncerOptions;
use crate::walker::{self, WalkItem};
use crossbeam_channel::{Receiver, select};
use std::fs;
use std::path::{Path, PathBuf};

/// Cancellable stream of hashed entries returned by [`recurse`].
///
/// Iteration ends when every directory has been walked and every file hashed,
/// or as soon as the token passed to [`recurse`] is cancelled.
#[derive(Debug)]
pub struct EntryStream {
    rx: Receiver<WalkItem>,
    token: CancellationToken,
    root: PathBuf,
}

impl EntryStream {
    /// The resolved absolute root being walked.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Cancels the walk and the hashing stage feeding this stream.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// The underlying channel, for use in a caller's own `select!`.
    pub fn receiver(&self) -> &Receiver<WalkItem> {
        &self.rx
    }
}

impl Iterator for EntryStream {
    type Item = WalkItem;

    fn next(&mut self) -> Option<Self::Item> {
        if self.token.is_cancelled() {
            return None;
        }
        let item = select! {
            recv(self.rx) -> msg => msg.ok()?,
            recv(self.token.signal()) -> _ => return None,
        };
        if self.token.is_cancelled() {
            #[cfg(feature = "logging")]
            tracing::debug!("Walk of {} cancelled", self.root.display());
            return None;
        }
        Some(item)
    }
}

fn resolve_root(root: &Path) -> Result<PathBuf, SyncerError> {
    if root.as_os_str().is_empty() {
        return Err(SyncerError::InvalidArgument(
            "root path must not be empty".to_string(),
        ));
    }
    let absolute = std::path::absolute(root).map_err(|e| SyncerError::resolution(root, e))?;
    let resolved = fs::canonicalize(&absolute).map_err(|e| SyncerError::resolution(root, e))?;
    let metadata = fs::metadata(&resolved).map_err(|e| SyncerError::resolution(root, e))?;
    if !metadata.is_dir() {
        return Err(SyncerError::NotADirectory(resolved));
    }
    Ok(resolved)
}

/// Walks `options.root` concurrently and hashes every regular file found.
///
/// Every directory below the root is reported once without a hash; every
/// other entry is reported once with one. Failures to list a directory or to
/// read a file arrive in-band as `Err` items and do not stop the stream.
///
/// # Errors
///
/// Fails before any work starts with
/// - [`SyncerError::InvalidArgument`] if the root is empty,
/// - [`SyncerError::PathResolution`] if it cannot be resolved or does not exist,
/// - [`SyncerError::NotADirectory`] if it is not a directory,
/// - [`SyncerError::Pattern`] if an exclude pattern is invalid,
/// - [`SyncerError::Spawn`] if the hashing thread cannot be started.
pub fn recurse(
    options: SyncerOptions,
    token: &CancellationToken,
) -> Result<EntryStream, SyncerError> {
    let root = resolve_root(&options.root)?;
    #[cfg(feature = "logging")]
    tracing::debug!(
        "Starting recurse with root: {} (max_concurrency: {:?}, algorithm: {:?})",
        root.display(),
        options.max_concurrency,
        options.algorithm
    );
    let options = SyncerOptions {
        root: root.clone(),
        ..options
    };
    let walked = walker::walk(&options, token)?;
    // On failure the walk's receiver is dropped, which stops the walker.
    let rx = hasher::hash(walked, options.algorithm, token)
        .map_err(|e| SyncerError::spawn("hash", &root, e))?;
    Ok(EntryStream {
        rx,
        token: token.clone(),
        root,
    })
}

/// [`recurse`] with default options.
///
/// # Errors
///
/// See [`recurse`].
pub fn recurse_path(
    root: impl Into<PathBuf>,
    token: &CancellationToken,
) -> Result<EntryStream, SyncerError> {
    recurse(
        SyncerOptions {
            root: root.into(),
            ..Default::default()
        },
        token,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;
    use std::thread;
    use std::time::Duration;
    use tempfile::tempdir;

    #[test]
    fn resolves_relative_components() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        let resolved = resolve_root(&dir.path().join("sub/..")).unwrap();
        assert_eq!(resolved, fs::canonicalize(dir.path()).unwrap());
    }

    #[test]
    fn empty_root_is_invalid_argument() {
        assert!(matches!(
            resolve_root(Path::new("")),
            Err(SyncerError::InvalidArgument(_))
        ));
    }

    #[test]
    fn cancel_wakes_a_caller_blocked_in_next() {
        let (tx, rx) = bounded::<WalkItem>(0);
        let token = CancellationToken::new();
        let mut stream = EntryStream {
            rx,
            token: token.clone(),
            root: PathBuf::from("/stalled"),
        };
        let (done_tx, done_rx) = bounded(1);
        let consumer = thread::spawn(move || {
            let next = stream.next();
            done_tx.send(next.is_none()).unwrap();
        });
        thread::sleep(Duration::from_millis(100));
        token.cancel();
        let finished = done_rx.recv_timeout(Duration::from_secs(3));
        drop(tx);
        assert_eq!(finished, Ok(true), "consumer still blocked after cancel");
        consumer.join().unwrap();
    }
}
