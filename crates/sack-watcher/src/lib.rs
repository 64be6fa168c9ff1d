//! Recursive file watching and ignore rules for the sack dev server.
//!
//! This crate turns file system notifications from the `notify` crate into a
//! stream of classified [`ChangeEvent`]s consumed from async code, and loads
//! the gitignore-style [`IgnoreRules`] used to decide which of those changes
//! matter.
//!
//! # Overview
//!
//! - Watch a set of roots (directories and single files), including
//!   directories created after startup
//! - Classify each change as written, created, removed, renamed, attribute
//!   only, or unknown
//! - Deliver every change as it happens, without debouncing
//! - Match ignore patterns against the base name of a changed path
//!
//! # Crate Dependencies
//!
//! ```text
//! sack-cli ──► sack-site ─────────────────────► sack-core
//!          └─► sack-reload ──► sack-watcher ──►
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use sack_watcher::{FileFilter, IgnoreRules, Watcher};
//! use camino::Utf8Path;
//!
//! # async fn example() -> Result<(), sack_watcher::WatchError> {
//! let rules = IgnoreRules::load_or_empty(Utf8Path::new(".gitignore"));
//! let (watcher, mut streams) = Watcher::open(["ui", "config.yaml"]).await?;
//!
//! loop {
//!     tokio::select! {
//!         Some(event) = streams.events.recv() => {
//!             if rules.should_process(&event.path) && !event.is_attribute_only() {
//!                 println!("{}: {}", event.kind, event.path);
//!             }
//!         }
//!         Some(err) = streams.errors.recv() => eprintln!("watch error: {err}"),
//!         else => break,
//!     }
//! }
//!
//! watcher.close().await
//! # }
//! ```
//!
//! # Error Handling
//!
//! ```
//! use sack_watcher::WatchError;
//!
//! fn handle_watch_error(err: WatchError) {
//!     if err.is_fatal() {
//!         eprintln!("Fatal watcher error: {err}");
//!     } else {
//!         eprintln!("Warning: {err}");
//!     }
//! }
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod error;
pub mod events;
pub mod filter;
pub mod watcher;

pub use error::WatchError;
pub use events::{ChangeEvent, ChangeKind};
pub use filter::{AcceptAllFilter, FileFilter, IgnoreRule, IgnoreRules, is_ignored};
pub use watcher::{WatchStreams, Watcher};
