//! Content hashing stage.

use crate::cancel::CancellationToken;
use crate::error::SyncerError;
use crate::options::HashAlgorithm;
use crate::types::Entry;
use crate::walker::WalkItem;
use crossbeam_channel::{Receiver, Sender, bounded, select};
use sha2::digest::DynDigest;
use sha2::{Sha256, Sha512_256};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use std::thread;

const CHUNK_SIZE: usize = 64 * 1024;

/// Digests everything `reader` yields and returns the lowercase hex string.
///
/// The token is checked before every chunk, so an endless reader stops once
/// it is cancelled.
///
/// # Errors
///
/// Returns any error raised while reading, or an [`io::ErrorKind::Interrupted`]
/// error if `token` was cancelled first.
pub fn hash_reader<R: Read>(
    mut reader: R,
    algorithm: HashAlgorithm,
    token: &CancellationToken,
) -> io::Result<String> {
    let mut hasher: Box<dyn DynDigest> = match algorithm {
        HashAlgorithm::Sha256 => Box::new(Sha256::default()),
        HashAlgorithm::Sha512_256 => Box::new(Sha512_256::default()),
    };
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        if token.is_cancelled() {
            return Err(io::Error::new(
                io::ErrorKind::Interrupted,
                "hashing cancelled",
            ));
        }
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buf[..n]);
    }
    Ok(hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect())
}

#[cfg(unix)]
fn open_regular(path: &Path) -> io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;

    // Non-blocking open so a FIFO swapped in after the walk listed the path
    // cannot stall the stage.
    let file = std::fs::OpenOptions::new()
        .read(true)
        .custom_flags(libc::O_NONBLOCK)
        .open(path)?;
    ensure_regular(file)
}

#[cfg(not(unix))]
fn open_regular(path: &Path) -> io::Result<File> {
    ensure_regular(File::open(path)?)
}

fn ensure_regular(file: File) -> io::Result<File> {
    if file.metadata()?.is_file() {
        Ok(file)
    } else {
        Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "not a regular file",
        ))
    }
}

/// Hashes the regular file at `path`. The file is closed before returning.
///
/// # Errors
///
/// Returns [`SyncerError::Hash`] if the file cannot be opened or read, is not
/// a regular file, or `token` is cancelled midway.
pub fn hash_file(
    path: &Path,
    algorithm: HashAlgorithm,
    token: &CancellationToken,
) -> Result<String, SyncerError> {
    let file = open_regular(path).map_err(|e| SyncerError::hash(path, e))?;
    hash_reader(BufReader::new(file), algorithm, token).map_err(|e| SyncerError::hash(path, e))
}

fn process(item: WalkItem, algorithm: HashAlgorithm, token: &CancellationToken) -> WalkItem {
    let mut entry: Entry = item?;
    // Directories, symlinks and special files are reported as observed.
    if !entry.is_file() {
        return Ok(entry);
    }
    let path = entry.path();
    match hash_file(&path, algorithm, token) {
        Ok(hash) => {
            entry.set_content_hash(hash);
            Ok(entry)
        }
        Err(e) => {
            #[cfg(feature = "logging")]
            tracing::debug!("{}", e);
            Err(e)
        }
    }
}

/// Attaches a content hash to every file entry read from `input`.
///
/// Runs on its own thread until `input` closes or `token` is cancelled.
/// Only regular files are hashed. Directories, symlinks, special files and
/// upstream errors pass through untouched; a file that cannot be read is
/// forwarded as a [`SyncerError::Hash`] item and the stage moves on.
pub fn hash(
    input: Receiver<WalkItem>,
    algorithm: HashAlgorithm,
    token: &CancellationToken,
) -> io::Result<Receiver<WalkItem>> {
    let (tx, rx) = bounded(0);
    let token = token.clone();
    thread::Builder::new()
        .name("syncer-hash".into())
        .spawn(move || run(input, tx, algorithm, token))?;
    Ok(rx)
}

fn run(
    input: Receiver<WalkItem>,
    tx: Sender<WalkItem>,
    algorithm: HashAlgorithm,
    token: CancellationToken,
) {
    loop {
        let item = select! {
            recv(input) -> msg => match msg {
                Ok(item) => item,
                Err(_) => return,
            },
            recv(token.signal()) -> _ => return,
        };
        if token.is_cancelled() {
            return;
        }
        let processed = process(item, algorithm, &token);
        if token.is_cancelled() {
            return;
        }
        select! {
            send(tx, processed) -> res => if res.is_err() { return },
            recv(token.signal()) -> _ => return,
        }
    }
}
