use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::channel::NotificationChannel;
use crate::event::{EventKind, LifecycleEvent, Notification, UnknownEventKind};

/// Filter for subscribing to a subset of lifecycle events.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventFilter {
    /// If set, only events of these kinds are delivered.
    pub kinds: Option<Vec<EventKind>>,
}

impl EventFilter {
    /// Filter accepting only the given kinds.
    pub fn kinds(kinds: impl IntoIterator<Item = EventKind>) -> Self {
        Self {
            kinds: Some(kinds.into_iter().collect()),
        }
    }

    /// Parse a comma-separated kind list such as `"created,deleted"`.
    /// Blank input means "everything".
    pub fn parse(list: &str) -> Result<Self, UnknownEventKind> {
        let kinds = list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse)
            .collect::<Result<Vec<EventKind>, _>>()?;
        if kinds.is_empty() {
            Ok(Self::default())
        } else {
            Ok(Self { kinds: Some(kinds) })
        }
    }

    /// Returns `true` if the given notification matches this filter.
    pub fn matches(&self, notification: &Notification) -> bool {
        match self.kinds {
            Some(ref kinds) => kinds.contains(&notification.kind()),
            None => true,
        }
    }
}

/// A broadcast channel receiver for notifications.
pub type NotificationStream = broadcast::Receiver<Notification>;

/// Internal subscriber: a filter paired with a broadcast sender.
struct Subscriber {
    filter: EventFilter,
    sender: broadcast::Sender<Notification>,
}

/// Fan-out router that delivers notifications to matching subscribers.
struct EventRouter {
    subscribers: RwLock<Vec<Subscriber>>,
}

impl EventRouter {
    fn new() -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
        }
    }

    fn subscribe(&self, filter: EventFilter, capacity: usize) -> NotificationStream {
        let (tx, rx) = broadcast::channel(capacity);
        self.subscribers
            .write()
            .expect("router lock poisoned")
            .push(Subscriber { filter, sender: tx });
        rx
    }

    /// Stamp `event` with the next sequence number and route it to all
    /// matching subscribers, pruning those whose receivers have been dropped.
    ///
    /// Stamping happens under the write lock, so every subscriber sees
    /// sequence numbers in increasing order even with concurrent publishers.
    fn route(&self, seq: &AtomicU64, event: LifecycleEvent) -> (Notification, usize) {
        let mut delivered = 0;
        let mut subs = self.subscribers.write().expect("router lock poisoned");
        let notification = Notification {
            seq: seq.fetch_add(1, Ordering::SeqCst) + 1,
            event,
        };
        subs.retain(|sub| {
            if sub.filter.matches(&notification) {
                // Send fails only when every receiver is gone.
                let alive = sub.sender.send(notification.clone()).is_ok();
                if alive {
                    delivered += 1;
                }
                alive
            } else {
                sub.sender.receiver_count() > 0
            }
        });
        (notification, delivered)
    }

    fn subscriber_count(&self) -> usize {
        self.subscribers
            .read()
            .expect("router lock poisoned")
            .len()
    }
}

/// In-process fan-out notification channel.
///
/// Each subscriber gets a bounded queue of `capacity` notifications. A slow
/// subscriber that overflows its queue observes a lag and skips ahead; the
/// publisher is never held up.
pub struct BroadcastChannel {
    router: EventRouter,
    seq: AtomicU64,
    capacity: usize,
}

impl BroadcastChannel {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        info!(capacity, "notification channel ready");
        Self {
            router: EventRouter::new(),
            seq: AtomicU64::new(0),
            capacity,
        }
    }

    /// Subscribe to notifications matching the given filter.
    pub fn subscribe(&self, filter: EventFilter) -> NotificationStream {
        self.router.subscribe(filter, self.capacity)
    }

    /// Current number of live subscribers (stale ones are pruned lazily on
    /// the next publish).
    pub fn subscriber_count(&self) -> usize {
        self.router.subscriber_count()
    }

    /// Sequence number of the most recently published notification.
    pub fn last_seq(&self) -> u64 {
        self.seq.load(Ordering::SeqCst)
    }
}

impl Default for BroadcastChannel {
    fn default() -> Self {
        Self::new(256)
    }
}

impl NotificationChannel for BroadcastChannel {
    fn publish(&self, event: LifecycleEvent) {
        let (notification, delivered) = self.router.route(&self.seq, event);
        debug!(
            seq = notification.seq,
            kind = %notification.kind(),
            delivered,
            "notification published"
        );
    }
}

impl std::fmt::Debug for BroadcastChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BroadcastChannel")
            .field("subscribers", &self.subscriber_count())
            .field("last_seq", &self.last_seq())
            .field("capacity", &self.capacity)
            .finish()
    }
}
