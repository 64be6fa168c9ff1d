//! Errors raised while loading ignore rules and watching the project tree.

use camino::Utf8PathBuf;

/// Errors from [`Watcher`](crate::Watcher) and [`IgnoreRules`](crate::IgnoreRules).
///
/// Startup errors come back from [`Watcher::open`](crate::Watcher::open).
/// Errors seen while running are sent on
/// [`WatchStreams::errors`](crate::WatchStreams) and never stop the watcher.
///
/// | Variant | When | Recoverable |
/// |---------|------|-------------|
/// | [`PathNotFound`](WatchError::PathNotFound) | a root is missing at startup | no |
/// | [`IgnoreFile`](WatchError::IgnoreFile) | `.sackignore` unreadable | yes, no rules |
/// | [`Notify`](WatchError::Notify) | backend failure | no at startup, yes while running |
/// | [`NonUtf8Path`](WatchError::NonUtf8Path) | an event names a non-UTF-8 path | yes, the path is skipped |
/// | [`ChannelClosed`](WatchError::ChannelClosed) | the watcher thread died | no |
///
/// ```
/// use sack_watcher::WatchError;
///
/// let err = WatchError::path_not_found("ui");
/// assert!(err.is_fatal());
/// assert_eq!(err.to_string(), "path does not exist: ui");
/// ```
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    /// The notify backend failed.
    #[error("notify watcher error: {0}")]
    Notify(#[from] notify::Error),

    /// A watch root does not exist.
    #[error("path does not exist: {0}")]
    PathNotFound(Utf8PathBuf),

    /// The ignore file could not be opened or read.
    #[error("failed to read ignore file {path}: {source}")]
    IgnoreFile {
        /// The ignore file path.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A change event named a path that is not valid UTF-8.
    #[error("path is not valid UTF-8: {}", _0.display())]
    NonUtf8Path(std::path::PathBuf),

    /// The watcher thread went away before it could be shut down cleanly.
    #[error("watcher channel closed unexpectedly")]
    ChannelClosed,
}

impl WatchError {
    /// Creates a new [`WatchError::PathNotFound`] error.
    #[inline]
    pub fn path_not_found(path: impl Into<Utf8PathBuf>) -> Self {
        Self::PathNotFound(path.into())
    }

    /// Returns `true` if watching can continue after this error.
    #[inline]
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::NonUtf8Path(_) | Self::IgnoreFile { .. })
    }

    /// Returns `true` if this error is fatal (watching should stop).
    #[inline]
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !self.is_recoverable()
    }

    /// Returns the file path associated with this error, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Utf8PathBuf> {
        match self {
            Self::PathNotFound(path) | Self::IgnoreFile { path, .. } => Some(path),
            Self::Notify(_) | Self::NonUtf8Path(_) | Self::ChannelClosed => None,
        }
    }
}
