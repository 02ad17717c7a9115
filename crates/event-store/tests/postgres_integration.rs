//! PostgreSQL integration tests
//!
//! These tests need a local Docker daemon and share one container. Run with:
//!
//! ```bash
//! cargo test -p event-store --test postgres_integration -- --ignored --test-threads=1
//! ```

use std::sync::Arc;

use event_store::{Backend, EventRecord, EventStoreError, PostgresBackend, Version};
use sqlx::PgPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh backend with its own pool and a cleared table
async fn get_test_backend() -> PostgresBackend {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    let backend = PostgresBackend::new(pool, "patient").unwrap();
    backend.ensure_schema().await.unwrap();

    sqlx::query("TRUNCATE TABLE patient_events")
        .execute(backend.pool())
        .await
        .unwrap();

    backend
}

fn record(id: &str, version: i64, event_type: &str) -> EventRecord<String> {
    EventRecord {
        aggregate_id: id.to_string(),
        version: Version::new(version),
        event_type: event_type.to_string(),
        payload: br#"{"ward":1}"#.to_vec(),
    }
}

#[tokio::test]
#[ignore = "needs a local Docker daemon"]
async fn append_and_load_roundtrip() {
    let backend = get_test_backend().await;

    backend
        .append(vec![
            record("p1", 0, "PatientCreated"),
            record("p1", 1, "PatientTransferred"),
        ])
        .await
        .unwrap();

    let records = backend
        .load(&"p1".to_string(), Version::zero(), None)
        .await
        .unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].event_type, "PatientCreated");
    assert_eq!(records[1].version, Version::new(1));
    assert_eq!(records[0].payload, br#"{"ward":1}"#.to_vec());
}

#[tokio::test]
#[ignore = "needs a local Docker daemon"]
async fn duplicate_version_maps_to_concurrency_conflict() {
    let backend = get_test_backend().await;

    backend
        .append(vec![record("p1", 0, "PatientCreated")])
        .await
        .unwrap();

    let result = backend
        .append(vec![record("p1", 0, "PatientCreated")])
        .await;
    assert!(matches!(
        result,
        Err(EventStoreError::ConcurrencyConflict { .. })
    ));
}

#[tokio::test]
#[ignore = "needs a local Docker daemon"]
async fn conflicting_batch_commits_nothing() {
    let backend = get_test_backend().await;

    // Occupy version 1 only, so the next batch survives its first insert
    // and collides on its second.
    backend
        .append(vec![record("p1", 1, "PatientTransferred")])
        .await
        .unwrap();

    let result = backend
        .append(vec![
            record("p1", 0, "PatientCreated"),
            record("p1", 1, "PatientTransferred"),
        ])
        .await;
    assert!(matches!(
        result,
        Err(EventStoreError::ConcurrencyConflict { .. })
    ));

    // The insert at version 0 must have been rolled back with the batch.
    let records = backend
        .load(&"p1".to_string(), Version::zero(), None)
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].version, Version::new(1));
}

#[tokio::test]
#[ignore = "needs a local Docker daemon"]
async fn load_respects_version_ceiling() {
    let backend = get_test_backend().await;

    backend
        .append(vec![
            record("p1", 0, "E0"),
            record("p1", 1, "E1"),
            record("p1", 2, "E2"),
        ])
        .await
        .unwrap();

    let bounded = backend
        .load(&"p1".to_string(), Version::zero(), Some(Version::new(1)))
        .await
        .unwrap();
    let versions: Vec<i64> = bounded.iter().map(|r| r.version.as_i64()).collect();
    assert_eq!(versions, vec![0, 1]);
}

#[tokio::test]
#[ignore = "needs a local Docker daemon"]
async fn ensure_schema_is_idempotent() {
    let backend = get_test_backend().await;
    backend.ensure_schema().await.unwrap();
    backend.ensure_schema().await.unwrap();
}
