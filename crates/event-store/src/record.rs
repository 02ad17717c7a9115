use std::fmt::Display;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

/// Marker for types usable as an aggregate identity.
///
/// The runtime is generic over the identity: anything opaque, comparable,
/// hashable, and printable works (strings, UUIDs, domain newtypes).
pub trait Identity: Clone + Eq + Hash + Display + Send + Sync + 'static {}

impl<A: Clone + Eq + Hash + Display + Send + Sync + 'static> Identity for A {}

/// Per-aggregate event sequence number.
///
/// Record versions are 0-based: the first event of an identity is persisted
/// at version 0, and a log with N committed events occupies exactly
/// `0..N-1`. An aggregate's version is therefore the count of events it has
/// replayed, and doubles as the compare-and-set token for appends.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Version(i64);

impl Version {
    /// Creates a version from a raw value.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// The version of a fresh aggregate with no committed events.
    pub fn zero() -> Self {
        Self(0)
    }

    /// Returns the next version.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns this version advanced by `n` slots. Used when numbering the
    /// records of a multi-event batch from a known committed version.
    pub fn advance(&self, n: usize) -> Self {
        Self(self.0 + n as i64)
    }

    /// Returns the raw value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Version {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Version> for i64 {
    fn from(version: Version) -> Self {
        version.0
    }
}

/// The persisted form of one event.
///
/// `event_type` names the concrete event kind for the runtime's type
/// registry; `payload` is the codec-encoded event body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord<A> {
    pub aggregate_id: A,
    pub version: Version,
    pub event_type: String,
    pub payload: Vec<u8>,
}
