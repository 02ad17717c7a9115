//! Post-commit notifications and the sinks that deliver them.

use event_store::Version;
use tokio::sync::mpsc;

use crate::aggregate::EventSourced;

/// One persisted event, announced to subscribers after the enclosing save
/// committed. Emitted exactly once per record, in batch order.
pub struct Notification<T: EventSourced> {
    pub aggregate_id: T::Id,
    pub version: Version,
    pub event_type: String,
    pub event: T::Event,
}

impl<T: EventSourced> Clone for Notification<T> {
    fn clone(&self) -> Self {
        Self {
            aggregate_id: self.aggregate_id.clone(),
            version: self.version,
            event_type: self.event_type.clone(),
            event: self.event.clone(),
        }
    }
}

/// Delivery capability for committed-event notifications.
///
/// The repository treats every subscriber the same way, whether it is an
/// in-process callback or a bridge to an external broker. Delivery is
/// at-least-once from the consumer's point of view (a transport may redeliver
/// after a crash), so downstream command handling must tolerate replays.
pub trait NotificationSink<T: EventSourced>: Send + Sync {
    fn publish(&self, notification: Notification<T>);
}

/// Plain closures work as local subscribers.
impl<T, F> NotificationSink<T> for F
where
    T: EventSourced,
    F: Fn(Notification<T>) + Send + Sync,
{
    fn publish(&self, notification: Notification<T>) {
        self(notification)
    }
}

/// Sink that feeds notifications into an in-process channel, typically
/// drained by a [`crate::Dispatcher`] task. Best-effort: once the receiver
/// is gone, notifications are logged and dropped.
pub struct ChannelSink<T: EventSourced> {
    tx: mpsc::UnboundedSender<Notification<T>>,
}

impl<T: EventSourced> NotificationSink<T> for ChannelSink<T> {
    fn publish(&self, notification: Notification<T>) {
        if self.tx.send(notification).is_err() {
            tracing::warn!("notification channel closed, dropping notification");
        }
    }
}

/// Creates a sink/receiver pair for wiring a repository to a dispatcher.
pub fn notification_channel<T: EventSourced>()
-> (ChannelSink<T>, mpsc::UnboundedReceiver<Notification<T>>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ChannelSink { tx }, rx)
}
