use crate::event::LifecycleEvent;

/// Sink for lifecycle events.
///
/// `publish` must not block on observers and cannot fail from the caller's
/// point of view; implementations log their own delivery problems.
pub trait NotificationChannel: Send + Sync {
    fn publish(&self, event: LifecycleEvent);
}

/// Channel that drops every event. Used by one-shot CLI commands that have
/// no observers.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullChannel;

impl NotificationChannel for NullChannel {
    fn publish(&self, _event: LifecycleEvent) {}
}
