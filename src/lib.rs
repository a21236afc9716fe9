//! # Syncer
//!
//! `syncer` walks a directory tree concurrently and streams every entry it
//! finds, with a SHA-256 content hash attached to each regular file. It is the
//! scanning core of a directory synchronization tool.
//!
//! The pipeline has two stages connected by rendezvous channels: a walker that
//! spawns one task per directory and merges their output, and a hasher that
//! digests each file as it arrives. A single [`CancellationToken`] stops every
//! stage. Listing and hashing failures arrive in-band as `Err` items, so one
//! unreadable file never ends the walk.
//!
//! # Features
//!
//! - `parallel`: Enables a bounded walker pool via Rayon ([`SyncerBuilder::max_concurrency`]).
//! - `logging`: Enables debug logging via the `tracing` crate.
//!
//! # Example
//!
//! ```no_run
//! use syncer::{CancellationToken, HashAlgorithm, SyncerBuilder, recurse};
//!
//! let options = SyncerBuilder::new(".")
//!     .algorithm(HashAlgorithm::Sha256)
//!     .max_concurrency(8)
//!     .build();
//!
//! let token = CancellationToken::new();
//! let stream = recurse(options, &token).expect("Failed to start walk");
//!
//! for item in stream {
//!     match item {
//!         Ok(entry) => println!("{:?} {}", entry.content_hash(), entry.path().display()),
//!         Err(e) => eprintln!("{}", e),
//!     }
//! }
//! ```

mod cancel;
mod engine;
mod error;
pub mod hasher;
mod options;
pub mod output;
mod reader;
mod types;
pub mod walker;

pub use cancel::CancellationToken;
pub use engine::{EntryStream, recurse, recurse_path};
pub use error::SyncerError;
pub use options::{HashAlgorithm, SyncerBuilder, SyncerOptions};
pub use types::{Entry, EntryKind};
pub use walker::WalkItem;
