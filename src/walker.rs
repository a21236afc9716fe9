//! Concurrent directory tree walk.
//!
//! Each directory is visited by its own task. A task lists the directory,
//! schedules a sub-walk for every child directory and emits every child as an
//! [`Entry`]. All tasks share clones of one rendezvous channel sender, so the
//! stream closes exactly when the last task has finished.
//!
//! Two schedulers are available: one OS thread per directory (unbounded) and,
//! with the `parallel` feature, a rayon pool of fixed size whose job queue
//! holds the pending directories.

use crate::cancel::CancellationToken;
use crate::error::SyncerError;
use crate::options::SyncerOptions;
use crate::reader::{EntryFilter, read_entries};
use crate::types::Entry;
use crossbeam_channel::{Receiver, Sender, bounded, select};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

/// Item carried on every stream of the pipeline.
pub type WalkItem = Result<Entry, SyncerError>;

#[derive(Clone)]
struct WalkContext {
    filter: Arc<EntryFilter>,
    tx: Sender<WalkItem>,
    token: CancellationToken,
}

impl WalkContext {
    /// Hands `item` to the receiver. Returns `false` once the walk should stop,
    /// either because the token was cancelled or the receiver is gone.
    fn emit(&self, item: WalkItem) -> bool {
        if self.token.is_cancelled() {
            return false;
        }
        select! {
            send(self.tx, item) -> res => res.is_ok(),
            recv(self.token.signal()) -> _ => false,
        }
    }
}

/// Walks `options.root` and returns the merged stream of everything below it.
///
/// The root itself is not emitted. A directory that cannot be listed yields a
/// single [`SyncerError::Read`] item and contributes nothing else; the rest of
/// the tree is unaffected.
///
/// # Errors
///
/// Returns [`SyncerError::Pattern`] if an exclude pattern does not compile.
pub fn walk(
    options: &SyncerOptions,
    token: &CancellationToken,
) -> Result<Receiver<WalkItem>, SyncerError> {
    let (tx, rx) = bounded(0);
    let ctx = WalkContext {
        filter: Arc::new(EntryFilter::new(options)?),
        tx,
        token: token.clone(),
    };
    let root = options.root.clone();
    match options.max_concurrency {
        None => spawn_thread(root, ctx),
        Some(limit) => spawn_bounded(root, ctx, limit),
    }
    Ok(rx)
}

/// Lists `dir`, schedules sub-walks through `schedule` and emits every child.
fn visit_directory<F>(dir: &Path, ctx: &WalkContext, schedule: F)
where
    F: Fn(PathBuf, WalkContext) -> io::Result<()>,
{
    if ctx.token.is_cancelled() {
        return;
    }
    let entries = match read_entries(dir, &ctx.filter) {
        Ok(entries) => entries,
        Err(e) => {
            #[cfg(feature = "logging")]
            tracing::debug!("{}", e);
            ctx.emit(Err(e));
            return;
        }
    };
    for entry in entries {
        if entry.is_directory() {
            let child = entry.path();
            if let Err(e) = schedule(child.clone(), ctx.clone()) {
                #[cfg(feature = "logging")]
                tracing::warn!("Failed to schedule walk of {}: {}", child.display(), e);
                if !ctx.emit(Err(SyncerError::spawn("walk", child, e))) {
                    return;
                }
            }
        }
        if !ctx.emit(Ok(entry)) {
            return;
        }
    }
}

fn spawn_thread(dir: PathBuf, ctx: WalkContext) {
    let fallback = ctx.clone();
    if let Err(e) = schedule_thread(dir.clone(), ctx) {
        fallback.emit(Err(SyncerError::spawn("walk", dir, e)));
    }
}

fn schedule_thread(dir: PathBuf, ctx: WalkContext) -> io::Result<()> {
    thread::Builder::new()
        .spawn(move || visit_directory(&dir, &ctx, schedule_thread))
        .map(|_| ())
}

#[cfg(feature = "parallel")]
fn spawn_bounded(root: PathBuf, ctx: WalkContext, limit: usize) {
    let pool = match rayon::ThreadPoolBuilder::new()
        .num_threads(limit.max(1))
        .thread_name(|i| format!("syncer-walk-{}", i))
        .build()
    {
        Ok(pool) => pool,
        Err(_e) => {
            #[cfg(feature = "logging")]
            tracing::warn!("Falling back to one thread per directory: {}", _e);
            spawn_thread(root, ctx);
            return;
        }
    };
    // Dropping the pool lets its threads drain every job spawned into it.
    pool.spawn(move || visit_directory(&root, &ctx, schedule_pooled));
}

#[cfg(feature = "parallel")]
fn schedule_pooled(dir: PathBuf, ctx: WalkContext) -> io::Result<()> {
    rayon::spawn(move || visit_directory(&dir, &ctx, schedule_pooled));
    Ok(())
}

#[cfg(not(feature = "parallel"))]
fn spawn_bounded(root: PathBuf, ctx: WalkContext, _limit: usize) {
    #[cfg(feature = "logging")]
    tracing::warn!("Concurrency limit requires the `parallel` feature; ignoring it");
    spawn_thread(root, ctx);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::SyncerBuilder;
    use std::fs;
    use tempfile::tempdir;

    fn names(rx: Receiver<WalkItem>) -> Vec<String> {
        let mut names: Vec<String> = rx
            .into_iter()
            .map(|item| item.unwrap().path().display().to_string())
            .collect();
        names.sort();
        names
    }

    fn sample_tree() -> tempfile::TempDir {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();
        fs::create_dir_all(dir.path().join("x/y/z")).unwrap();
        fs::write(dir.path().join("x/b.txt"), "b").unwrap();
        fs::write(dir.path().join("x/y/z/c.txt"), "c").unwrap();
        dir
    }

    #[test]
    fn emits_files_and_directories_once() {
        let dir = sample_tree();
        let options = SyncerBuilder::new(dir.path()).build();
        let rx = walk(&options, &CancellationToken::new()).unwrap();
        let root = dir.path();
        let mut expected: Vec<String> = ["a.txt", "x", "x/b.txt", "x/y", "x/y/z", "x/y/z/c.txt"]
            .iter()
            .map(|p| root.join(p).display().to_string())
            .collect();
        expected.sort();
        assert_eq!(names(rx), expected);
    }

    #[test]
    fn walked_entries_are_unhashed() {
        let dir = sample_tree();
        let options = SyncerBuilder::new(dir.path()).build();
        let rx = walk(&options, &CancellationToken::new()).unwrap();
        assert!(rx.into_iter().all(|item| item.unwrap().content_hash().is_none()));
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn bounded_pool_matches_thread_per_directory() {
        let dir = sample_tree();
        let unbounded = SyncerBuilder::new(dir.path()).build();
        let bounded = SyncerBuilder::new(dir.path()).max_concurrency(2).build();
        let token = CancellationToken::new();
        assert_eq!(
            names(walk(&unbounded, &token).unwrap()),
            names(walk(&bounded, &token).unwrap())
        );
    }

    #[test]
    fn missing_root_yields_one_read_failure() {
        let dir = tempdir().unwrap();
        let options = SyncerBuilder::new(dir.path().join("gone")).build();
        let items: Vec<_> = walk(&options, &CancellationToken::new())
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(items.len(), 1);
        assert!(matches!(items[0], Err(SyncerError::Read { .. })));
    }

    #[test]
    fn cancelled_walk_closes_without_items() {
        let dir = sample_tree();
        let token = CancellationToken::new();
        token.cancel();
        let options = SyncerBuilder::new(dir.path()).build();
        let rx = walk(&options, &token).unwrap();
        assert_eq!(rx.into_iter().count(), 0);
    }
}
