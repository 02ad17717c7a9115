use async_trait::async_trait;

use crate::{EventRecord, EventStoreError, Identity, Result, Version};

/// Core trait for event log backends.
///
/// A backend is an append-only log of [`EventRecord`]s keyed by
/// `(aggregate_id, version)`. Implementations must be thread-safe and must
/// enforce global uniqueness of that key: appending a record into an
/// occupied slot fails the whole batch with
/// [`EventStoreError::ConcurrencyConflict`] and commits nothing.
#[async_trait]
pub trait Backend<A: Identity>: Send + Sync {
    /// Loads the records of one aggregate with version in `[from, to]`,
    /// ordered ascending by version. `to = None` means "to the end of the
    /// log".
    async fn load(
        &self,
        id: &A,
        from: Version,
        to: Option<Version>,
    ) -> Result<Vec<EventRecord<A>>>;

    /// Atomically appends a batch of records.
    ///
    /// Either every record is durably committed or none is. Callers are
    /// expected to pass a batch for a single identity with contiguous
    /// versions (see [`validate_batch`]).
    async fn append(&self, records: Vec<EventRecord<A>>) -> Result<()>;
}

/// Validates a batch before appending: non-empty, single identity,
/// contiguous versions.
pub fn validate_batch<A: Identity>(records: &[EventRecord<A>]) -> Result<()> {
    let first = records
        .first()
        .ok_or_else(|| EventStoreError::InvalidBatch("empty batch".to_string()))?;

    for record in records.iter().skip(1) {
        if record.aggregate_id != first.aggregate_id {
            return Err(EventStoreError::InvalidBatch(
                "all records must belong to the same aggregate".to_string(),
            ));
        }
    }

    let mut expected = first.version;
    for record in records.iter().skip(1) {
        expected = expected.next();
        if record.version != expected {
            return Err(EventStoreError::InvalidBatch(format!(
                "record versions must be contiguous: expected {}, got {}",
                expected, record.version
            )));
        }
    }

    Ok(())
}
