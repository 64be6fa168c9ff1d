//! Error types for the sack-reload crate.

use crate::registry::SubscriberId;

/// Errors that can occur while notifying subscribers or rewriting responses.
///
/// Neither variant is fatal to the server: a closed subscriber is pruned and
/// a response that cannot be buffered is answered with a 500.
#[derive(Debug, thiserror::Error)]
pub enum ReloadError {
    /// A subscriber's connection has gone away.
    #[error("subscriber {0} is no longer connected")]
    SubscriberClosed(SubscriberId),

    /// A response body could not be buffered.
    #[error("failed to buffer response body: {0}")]
    Body(#[from] axum::Error),
}

impl ReloadError {
    /// Returns the subscriber this error concerns, if any.
    #[must_use]
    pub const fn subscriber(&self) -> Option<SubscriberId> {
        match self {
            Self::SubscriberClosed(id) => Some(*id),
            Self::Body(_) => None,
        }
    }
}
