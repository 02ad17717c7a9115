//! Command execution service with conflict-retry semantics.

use std::sync::Arc;
use std::time::Duration;

use event_store::{Backend, Codec};

use crate::aggregate::EventSourced;
use crate::command::{Command, CommandError};
use crate::error::{Result, SourcingError};
use crate::repository::Repository;

/// Retry configuration for optimistic-concurrency conflicts.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Attempt budget for one `execute` call.
    pub max_attempts: usize,
    /// Fixed delay between attempts.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            backoff: Duration::from_millis(100),
        }
    }
}

/// Orchestrates the load/execute/save cycle for one aggregate type.
///
/// Concurrency conflicts are resolved here and only here: a save that loses
/// the version race is retried from a fresh load, so callers never see a raw
/// conflict, only success, a domain error, an abort, or
/// [`SourcingError::TooManyRetries`]. Concurrent calls for the same identity
/// are legal; the backend's version uniqueness decides the winner.
pub struct Service<T, B, C>
where
    T: EventSourced,
    B: Backend<T::Id>,
    C: Codec,
{
    repository: Arc<Repository<T, B, C>>,
    retry: RetryPolicy,
}

impl<T, B, C> Service<T, B, C>
where
    T: EventSourced,
    B: Backend<T::Id>,
    C: Codec,
{
    /// Creates a service with the default retry policy.
    pub fn new(repository: Arc<Repository<T, B, C>>) -> Self {
        Self {
            repository,
            retry: RetryPolicy::default(),
        }
    }

    /// Overrides the retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Returns the repository this service executes against.
    pub fn repository(&self) -> &Arc<Repository<T, B, C>> {
        &self.repository
    }

    /// Executes the command on the aggregate at its latest version.
    ///
    /// Every attempt starts from a freshly loaded aggregate, so event
    /// numbering always derives from the version that was just read and a
    /// retry can never reuse a stale counter.
    #[tracing::instrument(
        skip(self, command, id),
        fields(
            aggregate = T::aggregate_type(),
            aggregate_id = %id,
            command = command.command_type(),
        )
    )]
    pub async fn execute(&self, id: &T::Id, command: &dyn Command<T>) -> Result<()> {
        let started = std::time::Instant::now();

        for attempt in 1..=self.retry.max_attempts {
            let mut aggregate = match self.repository.load(id).await {
                Ok(aggregate) => aggregate,
                Err(err) => return Err(self.fatal(id, command, err)),
            };

            match aggregate.execute(command) {
                Ok(()) => {}
                Err(CommandError::Retry) => {
                    tracing::debug!(attempt, "command requested retry");
                    self.backoff(attempt).await;
                    continue;
                }
                Err(CommandError::Aborted) => return Err(SourcingError::Aborted),
                Err(CommandError::Rejected(source)) => {
                    return Err(SourcingError::Execute {
                        command: command.command_type(),
                        aggregate: T::aggregate_type(),
                        aggregate_id: id.to_string(),
                        source,
                    });
                }
            }

            match self.repository.save(&aggregate).await {
                Ok(()) => {
                    metrics::counter!("commands_executed_total").increment(1);
                    metrics::histogram!("command_execute_seconds")
                        .record(started.elapsed().as_secs_f64());
                    return Ok(());
                }
                Err(SourcingError::Store(err)) if err.is_concurrency_conflict() => {
                    metrics::counter!("command_conflicts_total").increment(1);
                    tracing::debug!(attempt, "version conflict, retrying from fresh load");
                    self.backoff(attempt).await;
                }
                Err(err) => return Err(self.fatal(id, command, err)),
            }
        }

        metrics::counter!("command_retries_exhausted_total").increment(1);
        tracing::warn!("retry budget exhausted");
        Err(SourcingError::TooManyRetries {
            command: command.command_type(),
            aggregate: T::aggregate_type(),
            aggregate_id: id.to_string(),
        })
    }

    async fn backoff(&self, attempt: usize) {
        if attempt < self.retry.max_attempts {
            tokio::time::sleep(self.retry.backoff).await;
        }
    }

    fn fatal(&self, id: &T::Id, command: &dyn Command<T>, source: SourcingError) -> SourcingError {
        SourcingError::Execute {
            command: command.command_type(),
            aggregate: T::aggregate_type(),
            aggregate_id: id.to_string(),
            source: Box::new(source),
        }
    }
}
