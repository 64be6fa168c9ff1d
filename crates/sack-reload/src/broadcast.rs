//! The loop that turns file changes into reload notifications.
//!
//! ```text
//!  WatchStreams.events ─┐
//!                       ├─► select ─► ignored? ─► attribute only? ─► log ─► broadcast
//!  WatchStreams.errors ─┘                │               │
//!                                        ▼               ▼
//!                                      skip            skip
//! ```
//!
//! The loop runs until both streams have ended, which happens when the
//! watcher is closed. Every event that survives filtering produces exactly
//! one broadcast; nothing is coalesced.

use sack_watcher::{ChangeEvent, ChangeKind, FileFilter, WatchError, WatchStreams};
use tokio::task::JoinHandle;

use crate::registry::{RELOAD_PAYLOAD, SubscriberRegistry};

/// Counters describing what a [`BroadcastLoop`] did over its lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    /// Change events received.
    pub events_seen: usize,
    /// Events skipped because an ignore rule matched.
    pub ignored: usize,
    /// Events skipped because only metadata changed.
    pub attribute_only: usize,
    /// Broadcasts sent.
    pub broadcasts: usize,
    /// Backend errors received and logged.
    pub errors: usize,
}

/// Consumes a watcher's streams and notifies every subscriber of changes.
///
/// # Examples
///
/// ```no_run
/// use sack_reload::{BroadcastLoop, SubscriberRegistry};
/// use sack_watcher::{IgnoreRules, Watcher};
/// use camino::Utf8Path;
///
/// # async fn example() -> Result<(), sack_watcher::WatchError> {
/// let registry = SubscriberRegistry::new();
/// let rules = IgnoreRules::load_or_empty(Utf8Path::new(".gitignore"));
/// let (watcher, streams) = Watcher::open(["ui"]).await?;
///
/// let handle = BroadcastLoop::new(streams, rules, registry.clone()).spawn();
///
/// // ... serve until shutdown ...
///
/// watcher.close().await?;
/// let stats = handle.await.unwrap_or_default();
/// println!("sent {} reloads", stats.broadcasts);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct BroadcastLoop<F> {
    streams: WatchStreams,
    filter: F,
    registry: SubscriberRegistry,
    stats: LoopStats,
}

impl<F: FileFilter> BroadcastLoop<F> {
    /// Creates a loop over `streams`, skipping paths `filter` rejects.
    pub fn new(streams: WatchStreams, filter: F, registry: SubscriberRegistry) -> Self {
        Self {
            streams,
            filter,
            registry,
            stats: LoopStats::default(),
        }
    }

    /// Runs the loop on the tokio runtime.
    pub fn spawn(self) -> JoinHandle<LoopStats> {
        tokio::spawn(self.run())
    }

    /// Runs until both streams end, then returns the counters.
    pub async fn run(mut self) -> LoopStats {
        let mut events_open = true;
        let mut errors_open = true;

        while events_open || errors_open {
            tokio::select! {
                event = self.streams.events.recv(), if events_open => match event {
                    Some(event) => self.handle_event(&event),
                    None => events_open = false,
                },
                error = self.streams.errors.recv(), if errors_open => match error {
                    Some(error) => self.handle_error(&error),
                    None => errors_open = false,
                },
            }
        }

        tracing::debug!(stats = ?self.stats, "Reload loop finished");
        self.stats
    }

    fn handle_event(&mut self, event: &ChangeEvent) {
        self.stats.events_seen += 1;

        if !self.filter.should_process(&event.path) {
            self.stats.ignored += 1;
            tracing::debug!(path = %event.path, "Ignoring file");
            return;
        }

        match event.kind {
            ChangeKind::AttributeOnly => {
                self.stats.attribute_only += 1;
                tracing::trace!(path = %event.path, "Skipping attribute change");
                return;
            }
            ChangeKind::Unknown => tracing::info!(path = %event.path, "Unknown change"),
            kind => tracing::info!(path = %event.path, "{kind}"),
        }

        let report = self.registry.broadcast(RELOAD_PAYLOAD);
        self.stats.broadcasts += 1;
        tracing::debug!(
            delivered = report.delivered,
            pruned = report.pruned,
            "Reload broadcast"
        );
    }

    fn handle_error(&mut self, error: &WatchError) {
        self.stats.errors += 1;
        tracing::warn!(error = %error, "File watcher error");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Subscriber;
    use camino::Utf8PathBuf;
    use sack_watcher::{AcceptAllFilter, IgnoreRules};
    use tokio::sync::mpsc;

    struct Feed {
        events: mpsc::UnboundedSender<ChangeEvent>,
        errors: mpsc::UnboundedSender<WatchError>,
    }

    fn streams() -> (Feed, WatchStreams) {
        let (events_tx, events) = mpsc::unbounded_channel();
        let (errors_tx, errors) = mpsc::unbounded_channel();
        let feed = Feed {
            events: events_tx,
            errors: errors_tx,
        };
        (feed, WatchStreams { events, errors })
    }

    fn change(path: &str, kind: ChangeKind) -> ChangeEvent {
        ChangeEvent::new(Utf8PathBuf::from(path), kind)
    }

    fn drain(inbox: &mut crate::registry::SubscriberInbox) -> Vec<String> {
        std::iter::from_fn(|| inbox.try_recv().ok()).collect()
    }

    #[tokio::test]
    async fn test_one_broadcast_per_event() {
        let (feed, streams) = streams();
        let registry = SubscriberRegistry::new();
        let (subscriber, mut inbox) = Subscriber::channel();
        registry.register(subscriber);

        feed.events.send(change("ui/html/index.html", ChangeKind::Write)).unwrap();
        feed.events.send(change("ui/html/index.html", ChangeKind::Write)).unwrap();
        feed.events.send(change("ui/static/new.css", ChangeKind::Create)).unwrap();
        drop(feed);

        let stats = BroadcastLoop::new(streams, AcceptAllFilter, registry).run().await;

        assert_eq!(stats.events_seen, 3);
        assert_eq!(stats.broadcasts, 3);
        assert_eq!(drain(&mut inbox), vec!["reload"; 3]);
    }

    #[tokio::test]
    async fn test_ignored_and_attribute_events_are_skipped() {
        let (feed, streams) = streams();
        let registry = SubscriberRegistry::new();
        let (subscriber, mut inbox) = Subscriber::channel();
        registry.register(subscriber);

        let rules = IgnoreRules::parse("*.tmp\n");
        feed.events.send(change("ui/x.tmp", ChangeKind::Write)).unwrap();
        feed.events.send(change("ui/html/a.html", ChangeKind::AttributeOnly)).unwrap();
        feed.events.send(change("ui/html/a.html", ChangeKind::Rename)).unwrap();
        feed.events.send(change("ui/html/b.html", ChangeKind::Unknown)).unwrap();
        drop(feed);

        let stats = BroadcastLoop::new(streams, rules, registry).run().await;

        assert_eq!(
            stats,
            LoopStats {
                events_seen: 4,
                ignored: 1,
                attribute_only: 1,
                broadcasts: 2,
                errors: 0,
            }
        );
        assert_eq!(drain(&mut inbox).len(), 2);
    }

    #[tokio::test]
    async fn test_skipped_events_leave_registry_untouched() {
        let (feed, streams) = streams();
        let registry = SubscriberRegistry::new();
        let (alive, mut alive_inbox) = Subscriber::channel();
        let (dead, dead_inbox) = Subscriber::channel();
        let ids = [alive.id(), dead.id()];
        registry.register(alive);
        registry.register(dead);
        drop(dead_inbox);

        let rules = IgnoreRules::parse("*.tmp\n4913\n");
        feed.events.send(change("ui/x.tmp", ChangeKind::Write)).unwrap();
        feed.events.send(change("ui/html/4913", ChangeKind::Create)).unwrap();
        feed.events.send(change("ui/html/a.html", ChangeKind::AttributeOnly)).unwrap();
        drop(feed);

        let stats = BroadcastLoop::new(streams, rules, registry.clone()).run().await;

        assert_eq!(stats.broadcasts, 0);
        // A broadcast would have pruned the dead subscriber.
        assert_eq!(registry.len(), 2);
        assert!(ids.iter().all(|id| registry.contains(*id)));
        assert!(drain(&mut alive_inbox).is_empty());
    }

    #[tokio::test]
    async fn test_errors_are_logged_and_loop_continues() {
        let (feed, streams) = streams();
        let registry = SubscriberRegistry::new();
        let (subscriber, mut inbox) = Subscriber::channel();
        registry.register(subscriber);

        feed.errors.send(WatchError::ChannelClosed).unwrap();
        feed.events.send(change("ui/html/a.html", ChangeKind::Remove)).unwrap();
        drop(feed);

        let stats = BroadcastLoop::new(streams, AcceptAllFilter, registry).run().await;

        assert_eq!(stats.errors, 1);
        assert_eq!(stats.broadcasts, 1);
        assert_eq!(drain(&mut inbox), vec!["reload"]);
    }

    #[tokio::test]
    async fn test_loop_ends_only_when_both_streams_close() {
        let (feed, streams) = streams();
        let handle = BroadcastLoop::new(streams, AcceptAllFilter, SubscriberRegistry::new()).spawn();

        drop(feed.events);
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(!handle.is_finished());

        feed.errors.send(WatchError::ChannelClosed).unwrap();
        drop(feed.errors);

        let stats = handle.await.unwrap();
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.events_seen, 0);
    }

    #[tokio::test]
    async fn test_dead_subscriber_does_not_block_others() {
        let (feed, streams) = streams();
        let registry = SubscriberRegistry::new();
        let (alive, mut alive_inbox) = Subscriber::channel();
        let (dead, dead_inbox) = Subscriber::channel();
        registry.register(alive);
        registry.register(dead);
        drop(dead_inbox);

        feed.events.send(change("ui/html/a.html", ChangeKind::Write)).unwrap();
        feed.events.send(change("ui/html/a.html", ChangeKind::Write)).unwrap();
        drop(feed);

        BroadcastLoop::new(streams, AcceptAllFilter, registry.clone()).run().await;

        assert_eq!(registry.len(), 1);
        assert_eq!(drain(&mut alive_inbox).len(), 2);
    }
}
