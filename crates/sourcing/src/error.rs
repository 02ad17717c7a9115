use event_store::EventStoreError;
use thiserror::Error;

/// Errors produced by the sourcing runtime.
#[derive(Debug, Error)]
pub enum SourcingError {
    /// The storage layer failed (including concurrency conflicts, which the
    /// service resolves internally and callers normally never see).
    #[error(transparent)]
    Store(#[from] EventStoreError),

    /// A persisted record names an event type that was never registered.
    /// Fatal: replaying this log cannot succeed until the type is known.
    #[error("unknown event type: {0}")]
    UnknownEventType(String),

    /// The command declined to run against the current state. Not a
    /// failure: no mutation occurred and nothing was persisted.
    #[error("command aborted")]
    Aborted,

    /// A fatal error while executing a command, with the command type,
    /// aggregate type, and identity attached for diagnostics.
    #[error("executing {command} on {aggregate} {aggregate_id}: {source}")]
    Execute {
        command: &'static str,
        aggregate: &'static str,
        aggregate_id: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Concurrency conflicts persisted across the whole retry budget.
    #[error("too many retries executing {command} on {aggregate} {aggregate_id}")]
    TooManyRetries {
        command: &'static str,
        aggregate: &'static str,
        aggregate_id: String,
    },

    /// An event type was registered twice. Raised at registration time.
    #[error("event type {0} is already registered")]
    DuplicateEventType(&'static str),

    /// A second rule was registered for the same event type.
    #[error("a rule for event type {0} is already registered")]
    DuplicateRule(&'static str),

    /// A rule function failed while reacting to a committed event.
    #[error("rule for {event_type} on aggregate {aggregate_id}: {source}")]
    Rule {
        event_type: String,
        aggregate_id: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl SourcingError {
    /// Returns true if this is the non-failure abort signal.
    pub fn is_aborted(&self) -> bool {
        matches!(self, SourcingError::Aborted)
    }

    /// Returns true if the retry budget was exhausted by conflicts.
    pub fn is_too_many_retries(&self) -> bool {
        matches!(self, SourcingError::TooManyRetries { .. })
    }
}

/// Result type for runtime operations.
pub type Result<T> = std::result::Result<T, SourcingError>;
