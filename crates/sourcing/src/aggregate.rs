//! The aggregate kernel and the contracts domain modules implement.

use event_store::{Codec, Identity, Version};
use serde::{Serialize, de::DeserializeOwned};

use crate::command::{Command, CommandContext, CommandError};

/// An event-sourced domain state.
///
/// `Self` is the plain state value (rebuilt by replay, never persisted
/// directly); the two associated types pin down the identity and the closed
/// event set the runtime is generic over.
pub trait EventSourced: Default + Send + Sync + Sized + 'static {
    /// Opaque identity of one aggregate instance.
    type Id: Identity;

    /// The tagged event set for this state, usually an enum with one
    /// variant per [`EventKind`].
    type Event: Event<Self>;

    /// The aggregate type name, used in errors, logs, and table naming.
    fn aggregate_type() -> &'static str;
}

/// An immutable state transition.
///
/// `apply` must be deterministic and side-effect-free: the new state may
/// depend only on the event's own fields and the prior state.
pub trait Event<T>: Clone + Send + Sync + 'static {
    /// Applies this event to the state.
    fn apply(&self, state: &mut T);

    /// The registered type name of the concrete event kind.
    fn event_type(&self) -> &'static str;

    /// Encodes the concrete event payload (not the enum wrapper) for
    /// persistence. The type name in the record is what picks the decoder
    /// back out of the registry.
    fn encode<C: Codec>(&self, codec: &C) -> event_store::Result<Vec<u8>>;
}

/// One concrete event kind within an aggregate's closed event set.
///
/// Domain modules implement this per payload struct and register each kind
/// with the repository at startup. `extract` is the typed counterpart of a
/// runtime downcast: it succeeds exactly when the tagged event wraps this
/// kind.
pub trait EventKind<T: EventSourced>:
    Serialize + DeserializeOwned + Into<T::Event> + Send + Sync + 'static
{
    /// Persisted type name. Must be unique within the aggregate's event set.
    const TYPE_NAME: &'static str;

    /// Borrows this kind out of the tagged event, if it matches.
    fn extract(event: &T::Event) -> Option<&Self>;
}

/// In-memory reconstruction of one identity's current state.
///
/// Built fresh on every load, mutated only through [`Aggregate::replay`]
/// (committed history) and [`Aggregate::execute`] (new commands), and
/// discarded when the enclosing service call returns. `version` counts
/// committed events only; events produced by `execute` sit in `changes`
/// until a save persists them and a later load replays them.
pub struct Aggregate<T: EventSourced> {
    id: T::Id,
    state: T,
    version: Version,
    changes: Vec<T::Event>,
}

impl<T: EventSourced> Aggregate<T> {
    /// Creates a fresh, zero-version aggregate. An identity with no
    /// committed events starts here; there is no separate creation API.
    pub fn new(id: T::Id) -> Self {
        Self {
            id,
            state: T::default(),
            version: Version::zero(),
            changes: Vec::new(),
        }
    }

    /// Returns the aggregate identity.
    pub fn id(&self) -> &T::Id {
        &self.id
    }

    /// Returns the current state.
    pub fn state(&self) -> &T {
        &self.state
    }

    /// Returns the number of committed events replayed into this copy.
    pub fn version(&self) -> Version {
        self.version
    }

    /// Returns the not-yet-persisted events, in emission order.
    pub fn changes(&self) -> &[T::Event] {
        &self.changes
    }

    /// Applies one committed event during reconstitution.
    pub(crate) fn replay(&mut self, event: &T::Event) {
        event.apply(&mut self.state);
        self.version = self.version.next();
    }

    /// Runs a command against the current state.
    ///
    /// On success every returned event is applied in order and queued as an
    /// uncommitted change; `version` is untouched (it advances only when a
    /// later load observes the events as committed). Abort, retry, and
    /// rejection propagate without mutating the aggregate: commands must
    /// decide their full event list before returning.
    pub fn execute(&mut self, command: &dyn Command<T>) -> std::result::Result<(), CommandError> {
        let ctx = CommandContext::new(&self.id);
        let events = command.execute(&ctx, &self.state)?;
        for event in events {
            event.apply(&mut self.state);
            self.changes.push(event);
        }
        Ok(())
    }
}
