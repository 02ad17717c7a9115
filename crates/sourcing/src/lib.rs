//! Event-sourcing runtime.
//!
//! State is never stored directly: every aggregate is reconstituted by
//! replaying its committed event log, commands validate against that state
//! and emit new events, and the repository persists them with optimistic
//! concurrency control. A rule-based dispatcher turns committed events into
//! follow-up commands, forming an asynchronous choreography across the
//! aggregate's lifecycle.
//!
//! The pieces, bottom up:
//! - [`Event`], [`EventKind`], [`Command`]: the contracts a domain module
//!   implements for its closed set of events and commands
//! - [`Aggregate`]: one identity's replayed state plus its uncommitted events
//! - [`Repository`]: load/replay, save/notify, and the event type registry
//! - [`Service`]: the load/execute/save cycle with bounded conflict retries
//! - [`Dispatcher`]: reacts to committed events by issuing new commands

pub mod aggregate;
pub mod command;
pub mod error;
pub mod notification;
pub mod process;
pub mod repository;
pub mod service;

#[cfg(test)]
pub(crate) mod testdomain;

pub use aggregate::{Aggregate, Event, EventKind, EventSourced};
pub use command::{BoxedCommand, Command, CommandContext, CommandError};
pub use error::{Result, SourcingError};
pub use notification::{ChannelSink, Notification, NotificationSink, notification_channel};
pub use process::{Dispatcher, RuleResult};
pub use repository::Repository;
pub use service::{RetryPolicy, Service};
