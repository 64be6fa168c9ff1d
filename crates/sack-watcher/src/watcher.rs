//! Recursive file watcher with async event streams.
//!
//! This module provides the [`Watcher`] type that bridges the synchronous
//! `notify` crate to the tokio runtime.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                  Blocking Thread (spawn_blocking)                │
//! │  ┌───────────────────┐  Raw(event)  ┌──────────────────────────┐ │
//! │  │ RecommendedWatcher│ ───────────► │ run_watcher_loop         │ │
//! │  │ (one watch / dir) │              │ classify, register new   │ │
//! │  └───────────────────┘  Shutdown ─► │ directories, forward     │ │
//! │                                     └────────────┬─────────────┘ │
//! └──────────────────────────────────────────────────│───────────────┘
//!                                                    │ unbounded send
//!                                                    ▼
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                        Async Runtime (tokio)                     │
//! │   WatchStreams.events ──► broadcast loop                         │
//! │   WatchStreams.errors ──► broadcast loop (logged)                │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every directory under a root gets its own non-recursive registration, so
//! a directory created or moved in while the watcher runs is registered as
//! soon as its event arrives. Changes are forwarded one path at a time with no
//! coalescing; several writes in quick succession produce several events.

use std::sync::mpsc as std_mpsc;

use camino::{Utf8Path, Utf8PathBuf};
use ignore::WalkBuilder;
use notify::{RecommendedWatcher, RecursiveMode, Watcher as _};
use smallvec::SmallVec;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use sack_core::WatchConfig;

use crate::error::WatchError;
use crate::events::{ChangeEvent, ChangeKind};

/// Messages delivered to the blocking loop.
enum Message {
    /// A raw backend notification.
    Raw(notify::Result<notify::Event>),
    /// Stop watching and close the streams.
    Shutdown,
}

/// The receiving halves of a running watcher.
///
/// Both streams end (yield `None`) once the watcher has been closed or
/// dropped.
#[derive(Debug)]
pub struct WatchStreams {
    /// Classified change events, one per affected path.
    pub events: mpsc::UnboundedReceiver<ChangeEvent>,

    /// Errors reported by the backend while watching.
    pub errors: mpsc::UnboundedReceiver<WatchError>,
}

/// A running recursive watch over one or more roots.
///
/// # Lifecycle
///
/// 1. **Open**: [`Watcher::open`] checks that every root exists, registers
///    each directory beneath the roots, and moves the backend onto a blocking
///    thread. The event and error receivers are handed back separately as
///    [`WatchStreams`].
///
/// 2. **Run**: events flow until the watcher is closed. The consumer owns the
///    streams and can select over them freely.
///
/// 3. **Close**: [`Watcher::close`] stops the thread and waits for it, after
///    which both streams end. Dropping the watcher sends the same stop signal
///    without waiting.
///
/// # Examples
///
/// ```no_run
/// use sack_watcher::Watcher;
///
/// # async fn example() -> Result<(), sack_watcher::WatchError> {
/// let (watcher, mut streams) = Watcher::open(["ui", "config.yaml"]).await?;
///
/// while let Some(event) = streams.events.recv().await {
///     println!("{}: {}", event.kind, event.path);
/// }
///
/// watcher.close().await?;
/// # Ok(())
/// # }
/// ```
pub struct Watcher {
    /// Stop signal for the blocking loop. `None` once shutdown has started.
    shutdown_tx: Option<std_mpsc::Sender<Message>>,

    /// Handle to the blocking loop.
    task_handle: Option<JoinHandle<Result<(), WatchError>>>,

    /// The roots as given to [`Watcher::open`].
    roots: SmallVec<[Utf8PathBuf; 4]>,
}

impl std::fmt::Debug for Watcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Watcher")
            .field("roots", &self.roots)
            .field("is_running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl Watcher {
    /// Starts watching every root and everything beneath it.
    ///
    /// A root may be a directory (watched with all of its subdirectories) or
    /// a single file.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::PathNotFound`] if any root does not exist, and
    /// [`WatchError::Notify`] if the backend cannot be created or a root
    /// cannot be registered. Subdirectories that fail to register are logged
    /// and skipped.
    #[allow(clippy::unused_async)] // Async for API consistency with close()
    pub async fn open<I, P>(roots: I) -> Result<(Self, WatchStreams), WatchError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Utf8Path>,
    {
        let roots: SmallVec<[Utf8PathBuf; 4]> =
            roots.into_iter().map(|p| p.as_ref().to_owned()).collect();

        if let Some(missing) = roots.iter().find(|root| !root.exists()) {
            return Err(WatchError::path_not_found(missing.clone()));
        }

        let (message_tx, message_rx) = std_mpsc::channel();
        let callback_tx = message_tx.clone();
        let mut backend = notify::recommended_watcher(move |res| {
            // The loop has exited once this fails; nothing left to notify.
            let _ = callback_tx.send(Message::Raw(res));
        })?;

        let mut registered = 0;
        for root in &roots {
            registered += register_tree(&mut backend, root)?;
        }
        tracing::info!(roots = ?roots, directories = registered, "File watcher started");

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (error_tx, error_rx) = mpsc::unbounded_channel();

        let task_handle = tokio::task::spawn_blocking(move || {
            run_watcher_loop(backend, &message_rx, &event_tx, &error_tx)
        });

        let watcher = Self {
            shutdown_tx: Some(message_tx),
            task_handle: Some(task_handle),
            roots,
        };
        let streams = WatchStreams {
            events: event_rx,
            errors: error_rx,
        };
        Ok((watcher, streams))
    }

    /// Starts watching the roots named in a [`WatchConfig`].
    ///
    /// # Errors
    ///
    /// Same as [`Watcher::open`].
    pub async fn from_config(config: &WatchConfig) -> Result<(Self, WatchStreams), WatchError> {
        Self::open(config.roots.iter()).await
    }

    /// Returns the roots being watched.
    #[must_use]
    pub fn roots(&self) -> &[Utf8PathBuf] {
        &self.roots
    }

    /// Returns `true` while the blocking loop is alive.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.shutdown_tx.is_some() && self.task_handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stops watching and waits for the blocking loop to exit.
    ///
    /// Both [`WatchStreams`] end once this returns.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::ChannelClosed`] if the blocking loop panicked.
    pub async fn close(mut self) -> Result<(), WatchError> {
        if let Some(tx) = self.shutdown_tx.take() {
            // Already gone if the loop stopped on its own.
            let _ = tx.send(Message::Shutdown);
        }

        if let Some(handle) = self.task_handle.take() {
            match handle.await {
                Ok(result) => result?,
                Err(_join_error) => return Err(WatchError::ChannelClosed),
            }
        }

        Ok(())
    }
}

impl Drop for Watcher {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(Message::Shutdown);
        }
    }
}

/// Registers `root` and, for a directory, every directory beneath it.
///
/// Failing to register `root` itself is an error; failures below it are
/// logged. Returns the number of registrations made.
fn register_tree(backend: &mut RecommendedWatcher, root: &Utf8Path) -> Result<usize, WatchError> {
    backend.watch(root.as_std_path(), RecursiveMode::NonRecursive)?;
    if !root.is_dir() {
        return Ok(1);
    }

    let mut registered = 1;
    let walker = WalkBuilder::new(root)
        .standard_filters(false)
        .hidden(false)
        .follow_links(false)
        .build();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!(root = %root, error = %err, "Skipping unreadable directory entry");
                continue;
            }
        };

        // depth 0 is the root itself, already registered above
        if entry.depth() == 0 || !entry.file_type().is_some_and(|ft| ft.is_dir()) {
            continue;
        }

        match backend.watch(entry.path(), RecursiveMode::NonRecursive) {
            Ok(()) => registered += 1,
            Err(err) => tracing::warn!(
                path = %entry.path().display(),
                error = %err,
                "Failed to watch directory"
            ),
        }
    }

    Ok(registered)
}

/// Runs the backend until a shutdown message arrives.
///
/// Called from `spawn_blocking`. The backend is owned here so that new
/// directories can be registered as they appear. Returning drops both
/// senders, which ends the consumer's streams.
#[allow(clippy::needless_pass_by_value)] // Backend must be owned for the thread's lifetime
fn run_watcher_loop(
    mut backend: RecommendedWatcher,
    message_rx: &std_mpsc::Receiver<Message>,
    event_tx: &mpsc::UnboundedSender<ChangeEvent>,
    error_tx: &mpsc::UnboundedSender<WatchError>,
) -> Result<(), WatchError> {
    while let Ok(message) = message_rx.recv() {
        let event = match message {
            Message::Shutdown => break,
            Message::Raw(Ok(event)) => event,
            Message::Raw(Err(err)) => {
                tracing::debug!(error = %err, "Backend reported an error");
                if error_tx.send(WatchError::Notify(err)).is_err() {
                    tracing::debug!("Error stream closed");
                }
                continue;
            }
        };

        let Some(kind) = ChangeKind::from_event_kind(&event.kind) else {
            continue;
        };

        for path in event.paths {
            let path = match Utf8PathBuf::try_from(path) {
                Ok(path) => path,
                Err(err) => {
                    tracing::warn!(
                        path = %err.as_path().display(),
                        "Skipping non-UTF-8 path in file event"
                    );
                    if error_tx.send(WatchError::NonUtf8Path(err.into_path_buf())).is_err() {
                        tracing::debug!("Error stream closed");
                    }
                    continue;
                }
            };

            // Directories moved in from outside the roots arrive as renames.
            if matches!(kind, ChangeKind::Create | ChangeKind::Rename) && path.is_dir() {
                match register_tree(&mut backend, &path) {
                    Ok(count) => tracing::debug!(path = %path, directories = count, "Watching new directory"),
                    Err(err) => tracing::warn!(path = %path, error = %err, "Failed to watch new directory"),
                }
            }

            tracing::trace!(path = %path, kind = ?kind, "Forwarding change event");
            if event_tx.send(ChangeEvent::new(path, kind)).is_err() {
                tracing::debug!("Event stream closed, stopping watcher");
                return Ok(());
            }
        }
    }

    tracing::info!("File watcher stopped");
    Ok(())
}
