//! Event types for file change notifications.
//!
//! This module provides [`ChangeEvent`], the unit the watcher streams to its
//! consumer, and [`ChangeKind`], the classification of a raw `notify` event.
//!
//! # Event Flow
//!
//! ```text
//! File System Change
//!        │
//!        ▼
//!   notify::Event (one or more paths)
//!        │  access events dropped
//!        ▼
//!   ChangeEvent per path
//!        │
//!        ▼
//!   Sent via unbounded channel to the broadcast loop
//! ```

use std::fmt;

use camino::Utf8PathBuf;
use notify::EventKind;
use notify::event::ModifyKind;

/// What happened to a path.
///
/// Attribute-only changes (permissions, timestamps) are kept distinct so that
/// consumers can ignore them without losing the rest of the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// File contents were written.
    Write,
    /// A file or directory was created.
    Create,
    /// A file or directory was removed.
    Remove,
    /// A file or directory was renamed or moved.
    Rename,
    /// Only metadata changed.
    AttributeOnly,
    /// The backend reported a change it could not describe.
    Unknown,
}

impl ChangeKind {
    /// Classifies a `notify` event kind.
    ///
    /// Returns `None` for access notifications (open, read, close), which are
    /// not mutations and never reach the event stream.
    ///
    /// # Examples
    ///
    /// ```
    /// use notify::EventKind;
    /// use notify::event::{CreateKind, ModifyKind, MetadataKind};
    /// use sack_watcher::ChangeKind;
    ///
    /// assert_eq!(
    ///     ChangeKind::from_event_kind(&EventKind::Create(CreateKind::File)),
    ///     Some(ChangeKind::Create)
    /// );
    /// assert_eq!(
    ///     ChangeKind::from_event_kind(&EventKind::Modify(ModifyKind::Metadata(MetadataKind::Permissions))),
    ///     Some(ChangeKind::AttributeOnly)
    /// );
    /// ```
    #[must_use]
    pub const fn from_event_kind(kind: &EventKind) -> Option<Self> {
        match kind {
            EventKind::Access(_) => None,
            EventKind::Create(_) => Some(Self::Create),
            EventKind::Modify(ModifyKind::Metadata(_)) => Some(Self::AttributeOnly),
            EventKind::Modify(ModifyKind::Name(_)) => Some(Self::Rename),
            EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Any | ModifyKind::Other) => {
                Some(Self::Write)
            }
            EventKind::Remove(_) => Some(Self::Remove),
            EventKind::Any | EventKind::Other => Some(Self::Unknown),
        }
    }

    /// Returns a short human-readable description used in log lines.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Write => "File written",
            Self::Create => "File created",
            Self::Remove => "File removed",
            Self::Rename => "File renamed",
            Self::AttributeOnly => "Attributes changed",
            Self::Unknown => "File changed",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single classified change to a single path.
///
/// # Examples
///
/// ```
/// use sack_watcher::{ChangeEvent, ChangeKind};
/// use camino::Utf8PathBuf;
///
/// let event = ChangeEvent::new(Utf8PathBuf::from("ui/html/index.html"), ChangeKind::Write);
/// assert_eq!(event.file_name(), Some("index.html"));
/// assert!(!event.is_attribute_only());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    /// The path that changed, as reported by the backend.
    pub path: Utf8PathBuf,

    /// The classified change.
    pub kind: ChangeKind,
}

impl ChangeEvent {
    /// Creates a new change event.
    #[inline]
    #[must_use]
    pub const fn new(path: Utf8PathBuf, kind: ChangeKind) -> Self {
        Self { path, kind }
    }

    /// Returns the final path component, if any.
    #[inline]
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name()
    }

    /// Returns `true` if only metadata changed.
    #[inline]
    #[must_use]
    pub const fn is_attribute_only(&self) -> bool {
        matches!(self.kind, ChangeKind::AttributeOnly)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{
        AccessKind, AccessMode, CreateKind, DataChange, MetadataKind, RemoveKind, RenameMode,
    };

    #[test]
    fn test_classify_mutations() {
        assert_eq!(
            ChangeKind::from_event_kind(&EventKind::Create(CreateKind::Folder)),
            Some(ChangeKind::Create)
        );
        assert_eq!(
            ChangeKind::from_event_kind(&EventKind::Modify(ModifyKind::Data(DataChange::Content))),
            Some(ChangeKind::Write)
        );
        assert_eq!(
            ChangeKind::from_event_kind(&EventKind::Modify(ModifyKind::Any)),
            Some(ChangeKind::Write)
        );
        assert_eq!(
            ChangeKind::from_event_kind(&EventKind::Modify(ModifyKind::Name(RenameMode::To))),
            Some(ChangeKind::Rename)
        );
        assert_eq!(
            ChangeKind::from_event_kind(&EventKind::Remove(RemoveKind::File)),
            Some(ChangeKind::Remove)
        );
    }

    #[test]
    fn test_classify_metadata_and_unknown() {
        assert_eq!(
            ChangeKind::from_event_kind(&EventKind::Modify(ModifyKind::Metadata(
                MetadataKind::Permissions
            ))),
            Some(ChangeKind::AttributeOnly)
        );
        assert_eq!(
            ChangeKind::from_event_kind(&EventKind::Any),
            Some(ChangeKind::Unknown)
        );
        assert_eq!(
            ChangeKind::from_event_kind(&EventKind::Other),
            Some(ChangeKind::Unknown)
        );
    }

    #[test]
    fn test_access_events_are_dropped() {
        assert_eq!(
            ChangeKind::from_event_kind(&EventKind::Access(AccessKind::Close(AccessMode::Write))),
            None
        );
        assert_eq!(
            ChangeKind::from_event_kind(&EventKind::Access(AccessKind::Any)),
            None
        );
    }

    #[test]
    fn test_change_kind_display() {
        assert_eq!(ChangeKind::Write.to_string(), "File written");
        assert_eq!(ChangeKind::Rename.to_string(), "File renamed");
    }

    #[test]
    fn test_change_event_accessors() {
        let event = ChangeEvent::new(Utf8PathBuf::from("ui/static/app.js"), ChangeKind::Create);
        assert_eq!(event.file_name(), Some("app.js"));
        assert!(!event.is_attribute_only());

        let chmod = ChangeEvent::new(Utf8PathBuf::from("ui"), ChangeKind::AttributeOnly);
        assert!(chmod.is_attribute_only());
    }
}
