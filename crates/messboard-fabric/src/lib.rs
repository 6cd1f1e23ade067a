//! Lifecycle event fabric for Messboard.
//!
//! The lifecycle engine announces every change to the record set through a
//! [`NotificationChannel`]. Publishing is fire-and-forget: the engine never
//! waits for observers, and a delivery problem never fails the operation that
//! produced the event.
//!
//! [`BroadcastChannel`] fans events out to any number of subscribers, each
//! with its own [`EventFilter`] and bounded queue. Delivery is at-most-once:
//! a subscriber that falls behind loses the oldest events.

pub mod broadcast;
pub mod channel;
pub mod event;

pub use broadcast::{BroadcastChannel, EventFilter, NotificationStream};
pub use channel::{NotificationChannel, NullChannel};
pub use event::{EventKind, LifecycleEvent, Notification, UnknownEventKind};
