//! Storage layer for the event-sourcing runtime.
//!
//! This crate defines the durable collaborators the runtime is built on:
//! - [`Backend`]: the append-only, per-identity, version-ordered event log
//! - [`Codec`]: payload serialization for persisted events
//! - [`InMemoryBackend`] and [`PostgresBackend`]: concrete log engines
//!
//! The `(aggregate_id, version)` pair is the primary key of every record and
//! the sole source of the optimistic concurrency guarantee: a writer that
//! tries to claim an already-occupied version slot gets
//! [`EventStoreError::ConcurrencyConflict`] and nothing is committed.

pub mod codec;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod record;
pub mod store;

pub use codec::{Codec, JsonCodec};
pub use error::{EventStoreError, Result};
pub use memory::InMemoryBackend;
pub use postgres::PostgresBackend;
pub use record::{EventRecord, Identity, Version};
pub use store::{Backend, validate_batch};
