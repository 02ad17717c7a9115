//! Repository: reconstitution, persistence, and the event type registry.

use std::collections::HashMap;

use event_store::{Backend, Codec, EventRecord, Version};

use crate::aggregate::{Aggregate, Event, EventKind, EventSourced};
use crate::error::{Result, SourcingError};
use crate::notification::{Notification, NotificationSink};

/// Decodes one persisted payload into the aggregate's tagged event.
/// Monomorphized per registered [`EventKind`] at registration time.
type DecodeFn<T, C> = fn(&C, &[u8]) -> event_store::Result<<T as EventSourced>::Event>;

/// Stores and retrieves events for aggregates of type `T`, and announces
/// every successfully persisted event to its subscribers.
///
/// Registration (`register_event`, `subscribe`) happens once at startup,
/// before the repository is shared; after that it is read-only and safe to
/// use from any number of tasks.
pub struct Repository<T, B, C>
where
    T: EventSourced,
    B: Backend<T::Id>,
    C: Codec,
{
    backend: B,
    codec: C,
    decoders: HashMap<&'static str, DecodeFn<T, C>>,
    sinks: Vec<Box<dyn NotificationSink<T>>>,
}

impl<T, B, C> Repository<T, B, C>
where
    T: EventSourced,
    B: Backend<T::Id>,
    C: Codec,
{
    /// Creates a repository over the given log backend and payload codec.
    pub fn new(backend: B, codec: C) -> Self {
        Self {
            backend,
            codec,
            decoders: HashMap::new(),
            sinks: Vec::new(),
        }
    }

    /// Returns a reference to the underlying backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Registers one event kind for deserialization. Every kind an
    /// aggregate can persist must be registered before any load; a record
    /// naming an unregistered type fails the load that encounters it.
    pub fn register_event<E: EventKind<T>>(&mut self) -> Result<()> {
        if self.decoders.contains_key(E::TYPE_NAME) {
            return Err(SourcingError::DuplicateEventType(E::TYPE_NAME));
        }
        self.decoders
            .insert(E::TYPE_NAME, |codec, bytes| {
                Ok(codec.decode::<E>(bytes)?.into())
            });
        Ok(())
    }

    /// Subscribes a sink to post-commit notifications.
    pub fn subscribe<S: NotificationSink<T> + 'static>(&mut self, sink: S) {
        self.sinks.push(Box::new(sink));
    }

    /// Loads the aggregate at its latest committed version.
    pub async fn load(&self, id: &T::Id) -> Result<Aggregate<T>> {
        self.load_at(id, None).await
    }

    /// Loads the aggregate replayed up to `ceiling` inclusive (`None` for
    /// the whole log). An identity with no committed events yields a valid
    /// zero-version aggregate.
    pub async fn load_at(&self, id: &T::Id, ceiling: Option<Version>) -> Result<Aggregate<T>> {
        let events = self.get_events(id, Version::zero(), ceiling).await?;
        let mut aggregate = Aggregate::new(id.clone());
        for event in &events {
            aggregate.replay(event);
        }
        Ok(aggregate)
    }

    /// Returns the decoded events of one aggregate with version in
    /// `[from, to]`, ascending.
    pub async fn get_events(
        &self,
        id: &T::Id,
        from: Version,
        to: Option<Version>,
    ) -> Result<Vec<T::Event>> {
        let records = self.backend.load(id, from, to).await?;
        records.iter().map(|r| self.decode_record(r)).collect()
    }

    /// Decodes one persisted record through the type registry.
    pub fn decode_record(&self, record: &EventRecord<T::Id>) -> Result<T::Event> {
        let decode = self
            .decoders
            .get(record.event_type.as_str())
            .ok_or_else(|| SourcingError::UnknownEventType(record.event_type.clone()))?;
        Ok(decode(&self.codec, &record.payload)?)
    }

    /// Persists the aggregate's uncommitted events as one atomic batch.
    ///
    /// Record versions are numbered from the aggregate's committed version,
    /// so the backend's `(id, version)` uniqueness doubles as a
    /// compare-and-set: a writer working from a stale load collides and the
    /// whole batch is rejected. Subscribers are notified once per event, in
    /// order, only after the backend confirmed the append.
    pub async fn save(&self, aggregate: &Aggregate<T>) -> Result<()> {
        let changes = aggregate.changes();
        if changes.is_empty() {
            return Ok(());
        }

        let base = aggregate.version();
        let mut records = Vec::with_capacity(changes.len());
        let mut notifications = Vec::with_capacity(changes.len());

        for (offset, event) in changes.iter().enumerate() {
            let version = base.advance(offset);
            records.push(EventRecord {
                aggregate_id: aggregate.id().clone(),
                version,
                event_type: event.event_type().to_string(),
                payload: event.encode(&self.codec)?,
            });
            notifications.push(Notification {
                aggregate_id: aggregate.id().clone(),
                version,
                event_type: event.event_type().to_string(),
                event: event.clone(),
            });
        }

        self.backend.append(records).await?;

        tracing::debug!(
            aggregate = T::aggregate_type(),
            aggregate_id = %aggregate.id(),
            events = changes.len(),
            from_version = %base,
            "events committed"
        );

        for notification in notifications {
            for sink in &self.sinks {
                sink.publish(notification.clone());
            }
        }

        Ok(())
    }
}
