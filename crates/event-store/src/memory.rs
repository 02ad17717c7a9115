use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    EventRecord, EventStoreError, Identity, Result, Version,
    store::{Backend, validate_batch},
};

/// In-memory event log for tests and local development.
///
/// Stores records in a per-identity vector and simulates the uniqueness
/// constraint of a durable backend: the whole batch is checked against
/// occupied version slots before anything is inserted, so a conflicting
/// append commits nothing.
#[derive(Clone, Default)]
pub struct InMemoryBackend<A: Identity> {
    streams: Arc<RwLock<HashMap<A, Vec<EventRecord<A>>>>>,
}

impl<A: Identity> InMemoryBackend<A> {
    /// Creates a new empty backend.
    pub fn new() -> Self {
        Self {
            streams: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Returns the total number of records stored across all identities.
    pub async fn record_count(&self) -> usize {
        self.streams.read().await.values().map(Vec::len).sum()
    }

    /// Clears all stored records.
    pub async fn clear(&self) {
        self.streams.write().await.clear();
    }
}

#[async_trait]
impl<A: Identity> Backend<A> for InMemoryBackend<A> {
    async fn load(
        &self,
        id: &A,
        from: Version,
        to: Option<Version>,
    ) -> Result<Vec<EventRecord<A>>> {
        let streams = self.streams.read().await;
        let mut records: Vec<_> = streams
            .get(id)
            .map(|stream| {
                stream
                    .iter()
                    .filter(|r| r.version >= from && to.is_none_or(|to| r.version <= to))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        records.sort_by_key(|r| r.version);
        Ok(records)
    }

    async fn append(&self, records: Vec<EventRecord<A>>) -> Result<()> {
        validate_batch(&records)?;

        let mut streams = self.streams.write().await;

        // Reject the whole batch before touching the log, so a conflict
        // leaves nothing partially committed.
        for record in &records {
            let occupied = streams
                .get(&record.aggregate_id)
                .is_some_and(|stream| stream.iter().any(|r| r.version == record.version));
            if occupied {
                tracing::debug!(
                    aggregate_id = %record.aggregate_id,
                    version = %record.version,
                    "append rejected, version slot occupied"
                );
                return Err(EventStoreError::ConcurrencyConflict {
                    aggregate_id: record.aggregate_id.to_string(),
                    version: record.version,
                });
            }
        }

        for record in records {
            streams
                .entry(record.aggregate_id.clone())
                .or_default()
                .push(record);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, version: i64, event_type: &str) -> EventRecord<String> {
        EventRecord {
            aggregate_id: id.to_string(),
            version: Version::new(version),
            event_type: event_type.to_string(),
            payload: b"{}".to_vec(),
        }
    }

    #[tokio::test]
    async fn append_and_load_single_record() {
        let backend = InMemoryBackend::new();
        backend
            .append(vec![record("p1", 0, "Created")])
            .await
            .unwrap();

        let records = backend
            .load(&"p1".to_string(), Version::zero(), None)
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].version, Version::zero());
        assert_eq!(records[0].event_type, "Created");
    }

    #[tokio::test]
    async fn append_batch_keeps_order() {
        let backend = InMemoryBackend::new();
        backend
            .append(vec![
                record("p1", 0, "Created"),
                record("p1", 1, "Transferred"),
                record("p1", 2, "Discharged"),
            ])
            .await
            .unwrap();

        let records = backend
            .load(&"p1".to_string(), Version::zero(), None)
            .await
            .unwrap();
        let versions: Vec<i64> = records.iter().map(|r| r.version.as_i64()).collect();
        assert_eq!(versions, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn duplicate_version_conflicts_and_commits_nothing() {
        let backend = InMemoryBackend::new();
        backend
            .append(vec![record("p1", 0, "Created")])
            .await
            .unwrap();

        let result = backend
            .append(vec![record("p1", 0, "Created"), record("p1", 1, "Other")])
            .await;
        assert!(matches!(
            result,
            Err(EventStoreError::ConcurrencyConflict { .. })
        ));

        // The non-conflicting half of the batch must not have been stored.
        assert_eq!(backend.record_count().await, 1);
    }

    #[tokio::test]
    async fn conflict_detected_on_any_record_in_batch() {
        let backend = InMemoryBackend::new();
        backend
            .append(vec![record("p1", 0, "Created"), record("p1", 1, "Moved")])
            .await
            .unwrap();

        // Appending into the occupied tail slot conflicts.
        let result = backend.append(vec![record("p1", 1, "Moved")]).await;
        assert!(matches!(
            result,
            Err(EventStoreError::ConcurrencyConflict { .. })
        ));
        assert_eq!(backend.record_count().await, 2);
    }

    #[tokio::test]
    async fn load_respects_version_range() {
        let backend = InMemoryBackend::new();
        backend
            .append(vec![
                record("p1", 0, "E0"),
                record("p1", 1, "E1"),
                record("p1", 2, "E2"),
                record("p1", 3, "E3"),
            ])
            .await
            .unwrap();

        let id = "p1".to_string();
        let middle = backend
            .load(&id, Version::new(1), Some(Version::new(2)))
            .await
            .unwrap();
        let versions: Vec<i64> = middle.iter().map(|r| r.version.as_i64()).collect();
        assert_eq!(versions, vec![1, 2]);

        let tail = backend.load(&id, Version::new(2), None).await.unwrap();
        assert_eq!(tail.len(), 2);
    }

    #[tokio::test]
    async fn unknown_identity_yields_empty_log() {
        let backend: InMemoryBackend<String> = InMemoryBackend::new();
        let records = backend
            .load(&"missing".to_string(), Version::zero(), None)
            .await
            .unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn identities_are_isolated() {
        let backend = InMemoryBackend::new();
        backend
            .append(vec![record("p1", 0, "Created")])
            .await
            .unwrap();
        backend
            .append(vec![record("p2", 0, "Created")])
            .await
            .unwrap();

        let p1 = backend
            .load(&"p1".to_string(), Version::zero(), None)
            .await
            .unwrap();
        assert_eq!(p1.len(), 1);
        assert_eq!(backend.record_count().await, 2);
    }
}
