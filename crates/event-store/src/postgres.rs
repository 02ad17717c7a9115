use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::{
    EventRecord, EventStoreError, Identity, Result, Version,
    store::{Backend, validate_batch},
};

/// PostgreSQL-backed event log.
///
/// Each aggregate kind gets its own `{name}_events` table with
/// `PRIMARY KEY (aggregate_id, version)`; the primary key is what turns a
/// racing append into a unique violation, which this backend reports as
/// [`EventStoreError::ConcurrencyConflict`]. Identities are stored as text
/// via their `Display` form.
#[derive(Clone)]
pub struct PostgresBackend {
    pool: PgPool,
    table: String,
}

impl PostgresBackend {
    /// Creates a backend writing to `{aggregate_name}_events`.
    ///
    /// `aggregate_name` must be a plain identifier (letters, digits,
    /// underscores); it is interpolated into DDL/DML statements.
    pub fn new(pool: PgPool, aggregate_name: &str) -> Result<Self> {
        if aggregate_name.is_empty()
            || !aggregate_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(EventStoreError::InvalidBatch(format!(
                "invalid aggregate name for table: {aggregate_name:?}"
            )));
        }
        Ok(Self {
            pool,
            table: format!("{}_events", aggregate_name.to_ascii_lowercase()),
        })
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates the event table if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<()> {
        let ddl = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                aggregate_id TEXT NOT NULL,
                version BIGINT NOT NULL,
                event_type TEXT NOT NULL,
                payload BYTEA NOT NULL,
                PRIMARY KEY (aggregate_id, version)
            )
            "#,
            table = self.table
        );
        sqlx::query(&ddl).execute(&self.pool).await?;
        Ok(())
    }

    fn row_to_record<A: Identity>(id: &A, row: PgRow) -> Result<EventRecord<A>> {
        Ok(EventRecord {
            aggregate_id: id.clone(),
            version: Version::new(row.try_get("version")?),
            event_type: row.try_get("event_type")?,
            payload: row.try_get("payload")?,
        })
    }
}

#[async_trait]
impl<A: Identity> Backend<A> for PostgresBackend {
    async fn load(
        &self,
        id: &A,
        from: Version,
        to: Option<Version>,
    ) -> Result<Vec<EventRecord<A>>> {
        let rows = match to {
            Some(to) => {
                let sql = format!(
                    "SELECT version, event_type, payload FROM {table} \
                     WHERE aggregate_id = $1 AND version >= $2 AND version <= $3 \
                     ORDER BY version ASC",
                    table = self.table
                );
                sqlx::query(&sql)
                    .bind(id.to_string())
                    .bind(from.as_i64())
                    .bind(to.as_i64())
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!(
                    "SELECT version, event_type, payload FROM {table} \
                     WHERE aggregate_id = $1 AND version >= $2 \
                     ORDER BY version ASC",
                    table = self.table
                );
                sqlx::query(&sql)
                    .bind(id.to_string())
                    .bind(from.as_i64())
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        rows.into_iter()
            .map(|row| Self::row_to_record(id, row))
            .collect()
    }

    async fn append(&self, records: Vec<EventRecord<A>>) -> Result<()> {
        validate_batch(&records)?;

        let sql = format!(
            "INSERT INTO {table} (aggregate_id, version, event_type, payload) \
             VALUES ($1, $2, $3, $4)",
            table = self.table
        );

        let mut tx = self.pool.begin().await?;

        for record in &records {
            sqlx::query(&sql)
                .bind(record.aggregate_id.to_string())
                .bind(record.version.as_i64())
                .bind(&record.event_type)
                .bind(&record.payload)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    if let sqlx::Error::Database(ref db_err) = e {
                        if db_err.is_unique_violation() {
                            return EventStoreError::ConcurrencyConflict {
                                aggregate_id: record.aggregate_id.to_string(),
                                version: record.version,
                            };
                        }
                    }
                    EventStoreError::Database(e)
                })?;
        }

        tx.commit().await?;
        Ok(())
    }
}
