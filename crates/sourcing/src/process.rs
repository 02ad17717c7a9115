//! Reactive rule dispatch over committed-event notifications.

use std::collections::HashMap;
use std::sync::Arc;

use event_store::{Backend, Codec, EventRecord};
use tokio::sync::mpsc;

use crate::aggregate::{EventKind, EventSourced};
use crate::command::BoxedCommand;
use crate::error::{Result, SourcingError};
use crate::notification::Notification;
use crate::service::Service;

/// Outcome of one rule invocation: follow-up commands, or a failure the
/// rule could not resolve itself.
pub type RuleResult<T> =
    std::result::Result<Vec<BoxedCommand<T>>, Box<dyn std::error::Error + Send + Sync>>;

/// Erased rule: probes the tagged event for its kind and, on a match,
/// produces follow-up commands. A non-matching event yields none.
type BoxedRule<T> = Box<dyn Fn(&T, &<T as EventSourced>::Event) -> RuleResult<T> + Send + Sync>;

type ErrorSink = Box<dyn Fn(SourcingError) + Send + Sync>;

/// Runs registered rules against committed events and executes the commands
/// they produce.
///
/// One rule per event kind. An event with no rule is not an error; the
/// notification is simply dropped. Produced commands run through the
/// conflict-retrying [`Service`], and a command that aborts is treated as a
/// clean skip, which keeps dispatch safe when a transport redelivers a
/// notification whose effect already happened.
pub struct Dispatcher<T, B, C>
where
    T: EventSourced,
    B: Backend<T::Id>,
    C: Codec,
{
    service: Arc<Service<T, B, C>>,
    rules: HashMap<&'static str, BoxedRule<T>>,
    error_sink: ErrorSink,
}

impl<T, B, C> Dispatcher<T, B, C>
where
    T: EventSourced,
    B: Backend<T::Id>,
    C: Codec,
{
    /// Creates a dispatcher that executes rule output through `service`.
    pub fn new(service: Arc<Service<T, B, C>>) -> Self {
        Self {
            service,
            rules: HashMap::new(),
            error_sink: Box::new(|err| {
                tracing::error!(error = %err, "notification dispatch failed");
            }),
        }
    }

    /// Replaces the handler invoked when [`run`](Self::run) hits a dispatch
    /// error. The default logs and moves on.
    pub fn on_error<F>(mut self, sink: F) -> Self
    where
        F: Fn(SourcingError) + Send + Sync + 'static,
    {
        self.error_sink = Box::new(sink);
        self
    }

    /// Registers the rule for one event kind. The rule sees the aggregate's
    /// current state, which may already be ahead of the notified event.
    pub fn register_rule<E, F>(&mut self, rule: F) -> Result<()>
    where
        E: EventKind<T>,
        F: Fn(&T, &E) -> RuleResult<T> + Send + Sync + 'static,
    {
        if self.rules.contains_key(E::TYPE_NAME) {
            return Err(SourcingError::DuplicateRule(E::TYPE_NAME));
        }
        self.rules.insert(
            E::TYPE_NAME,
            Box::new(move |state, event| match E::extract(event) {
                Some(event) => rule(state, event),
                None => Ok(Vec::new()),
            }),
        );
        Ok(())
    }

    /// Dispatches one notification through its rule, if any.
    ///
    /// Commands that abort are swallowed; a failing rule body or anything
    /// else a produced command fails with is reported as
    /// [`SourcingError::Rule`].
    #[tracing::instrument(
        skip(self, notification),
        fields(
            aggregate = T::aggregate_type(),
            aggregate_id = %notification.aggregate_id,
            event_type = %notification.event_type,
        )
    )]
    pub async fn dispatch(&self, notification: &Notification<T>) -> Result<()> {
        let Some(rule) = self.rules.get(notification.event_type.as_str()) else {
            return Ok(());
        };

        let aggregate = self
            .service
            .repository()
            .load(&notification.aggregate_id)
            .await
            .map_err(|err| self.rule_error(notification, Box::new(err)))?;
        let commands = rule(aggregate.state(), &notification.event)
            .map_err(|err| self.rule_error(notification, err))?;
        metrics::counter!("notifications_dispatched_total").increment(1);

        for command in commands {
            match self
                .service
                .execute(&notification.aggregate_id, command.as_ref())
                .await
            {
                Ok(()) => {}
                Err(SourcingError::Aborted) => {
                    tracing::debug!(
                        command = command.command_type(),
                        "rule command aborted, skipping"
                    );
                }
                Err(err) => return Err(self.rule_error(notification, Box::new(err))),
            }
        }
        Ok(())
    }

    /// Dispatches straight from a persisted record, decoding only when a
    /// rule is registered for the record's event type.
    pub async fn dispatch_record(&self, record: &EventRecord<T::Id>) -> Result<()> {
        if !self.rules.contains_key(record.event_type.as_str()) {
            return Ok(());
        }
        let event = self.service.repository().decode_record(record)?;
        let notification = Notification {
            aggregate_id: record.aggregate_id.clone(),
            version: record.version,
            event_type: record.event_type.clone(),
            event,
        };
        self.dispatch(&notification).await
    }

    /// Drains the channel until every sender is gone, routing dispatch
    /// errors to the error sink. Meant to run as its own task, fed by a
    /// [`crate::notification_channel`] subscribed to the repository.
    pub async fn run(self, mut rx: mpsc::UnboundedReceiver<Notification<T>>) {
        while let Some(notification) = rx.recv().await {
            if let Err(err) = self.dispatch(&notification).await {
                (self.error_sink)(err);
            }
        }
        tracing::debug!(aggregate = T::aggregate_type(), "dispatcher channel closed");
    }

    fn rule_error(
        &self,
        notification: &Notification<T>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> SourcingError {
        SourcingError::Rule {
            event_type: notification.event_type.clone(),
            aggregate_id: notification.aggregate_id.to_string(),
            source,
        }
    }
}
