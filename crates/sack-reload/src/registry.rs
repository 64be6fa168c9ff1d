//! The set of connected live-reload subscribers.
//!
//! Each WebSocket connection is represented by a [`Subscriber`]: the sending
//! half of an unbounded channel whose receiving half ([`SubscriberInbox`]) is
//! drained by the task that owns the socket. Broadcasting therefore never
//! waits on the network, and removing a subscriber from the registry drops
//! its sender, which ends the connection task and closes the socket.
//!
//! ```text
//!   broadcast("reload")
//!         │ lock, one pass
//!         ▼
//!   ┌──────────────┐   send ok    ┌──────────────────┐   ws text
//!   │ Subscriber 1 │ ───────────► │ SubscriberInbox 1│ ─────────► browser
//!   ├──────────────┤              └──────────────────┘
//!   │ Subscriber 2 │ ── send err ──► pruned
//!   └──────────────┘
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::sync::mpsc;

use crate::error::ReloadError;

/// The text frame that tells a page to reload itself.
pub const RELOAD_PAYLOAD: &str = "reload";

/// Identity of one subscriber connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Allocates a process-unique id.
    #[must_use]
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Receiving half of a subscriber channel, owned by the connection task.
pub type SubscriberInbox = mpsc::UnboundedReceiver<String>;

/// Handle used to push notifications to one connection.
#[derive(Debug, Clone)]
pub struct Subscriber {
    id: SubscriberId,
    tx: mpsc::UnboundedSender<String>,
}

impl Subscriber {
    /// Creates a subscriber and the inbox its connection task drains.
    #[must_use]
    pub fn channel() -> (Self, SubscriberInbox) {
        let (tx, rx) = mpsc::unbounded_channel();
        let subscriber = Self {
            id: SubscriberId::next(),
            tx,
        };
        (subscriber, rx)
    }

    /// Returns this subscriber's id.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> SubscriberId {
        self.id
    }

    /// Queues a text message for the connection.
    ///
    /// # Errors
    ///
    /// Returns [`ReloadError::SubscriberClosed`] if the connection task has
    /// already exited.
    pub fn send(&self, payload: &str) -> Result<(), ReloadError> {
        self.tx
            .send(payload.to_owned())
            .map_err(|_| ReloadError::SubscriberClosed(self.id))
    }
}

/// Outcome of one [`SubscriberRegistry::broadcast`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Subscribers the message was queued for.
    pub delivered: usize,
    /// Subscribers removed because their connection was gone.
    pub pruned: usize,
}

/// Shared, lock-protected set of subscribers.
///
/// Cloning is cheap and every clone sees the same set. Registration, removal
/// and broadcast each take the lock once, so a broadcast never observes a
/// half-registered subscriber.
///
/// # Examples
///
/// ```
/// use sack_reload::{Subscriber, SubscriberRegistry};
///
/// let registry = SubscriberRegistry::new();
/// let (subscriber, mut inbox) = Subscriber::channel();
/// registry.register(subscriber);
///
/// let report = registry.broadcast("reload");
/// assert_eq!(report.delivered, 1);
/// assert_eq!(inbox.try_recv().as_deref(), Ok("reload"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct SubscriberRegistry {
    inner: Arc<Mutex<FxHashMap<SubscriberId, Subscriber>>>,
}

impl SubscriberRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a subscriber. Returns `false` if it was already registered.
    pub fn register(&self, subscriber: Subscriber) -> bool {
        let id = subscriber.id();
        let mut guard = self.inner.lock();
        if guard.contains_key(&id) {
            return false;
        }
        guard.insert(id, subscriber);
        let total = guard.len();
        drop(guard);

        tracing::info!(subscriber = %id, total, "Live-reload client connected");
        true
    }

    /// Removes a subscriber. Returns `false` if it was not registered.
    ///
    /// Dropping the stored handle closes the subscriber's inbox, which ends
    /// its connection.
    pub fn remove(&self, id: SubscriberId) -> bool {
        let removed = self.inner.lock().remove(&id);
        if removed.is_some() {
            tracing::info!(subscriber = %id, "Live-reload client disconnected");
        }
        removed.is_some()
    }

    /// Sends `payload` to every subscriber, pruning those that fail.
    pub fn broadcast(&self, payload: &str) -> BroadcastReport {
        let mut report = BroadcastReport::default();
        self.inner.lock().retain(|id, subscriber| match subscriber.send(payload) {
            Ok(()) => {
                report.delivered += 1;
                true
            }
            Err(err) => {
                tracing::debug!(subscriber = %id, error = %err, "Pruning subscriber");
                report.pruned += 1;
                false
            }
        });
        report
    }

    /// Drops every subscriber, closing all connections.
    ///
    /// Returns how many were removed.
    pub fn close_all(&self) -> usize {
        let drained = std::mem::take(&mut *self.inner.lock());
        if !drained.is_empty() {
            tracing::debug!(count = drained.len(), "Closing all live-reload clients");
        }
        drained.len()
    }

    /// Returns the number of registered subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Returns `true` if nobody is subscribed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Returns `true` if `id` is registered.
    #[must_use]
    pub fn contains(&self, id: SubscriberId) -> bool {
        self.inner.lock().contains_key(&id)
    }
}
