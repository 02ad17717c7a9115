//! Command contract and outcome signals.

use thiserror::Error;

use crate::aggregate::EventSourced;

/// Call-scoped context handed to a command.
///
/// Replaces the ambient "current aggregate id" channel of implicit-context
/// designs with an explicit, typed parameter.
pub struct CommandContext<'a, A> {
    aggregate_id: &'a A,
}

impl<'a, A> CommandContext<'a, A> {
    pub(crate) fn new(aggregate_id: &'a A) -> Self {
        Self { aggregate_id }
    }

    /// The identity of the aggregate the command is running against.
    pub fn aggregate_id(&self) -> &A {
        self.aggregate_id
    }
}

/// Non-success outcomes of command execution.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The command must not mutate state: a deliberate skip, not a failure.
    /// A command whose precondition no longer holds returns this, which is
    /// what makes reactive dispatch safe under redelivery.
    #[error("command aborted")]
    Aborted,

    /// The command wants to be re-run against a freshly reloaded aggregate.
    #[error("retry command")]
    Retry,

    /// Domain validation failed. Fatal for this execution; never retried.
    #[error(transparent)]
    Rejected(Box<dyn std::error::Error + Send + Sync>),
}

impl CommandError {
    /// Wraps a domain error as a command rejection.
    pub fn rejected<E: std::error::Error + Send + Sync + 'static>(err: E) -> Self {
        CommandError::Rejected(Box::new(err))
    }
}

/// A request to change an aggregate.
///
/// Commands are validated against the current state and translated into
/// zero or more events. Returning an empty list is a legal no-op (the
/// precondition was already satisfied); [`CommandError::Aborted`] means the
/// command declined to run at all.
pub trait Command<T: EventSourced>: Send + Sync {
    fn execute(
        &self,
        ctx: &CommandContext<'_, T::Id>,
        state: &T,
    ) -> std::result::Result<Vec<T::Event>, CommandError>;

    /// Name used in error context and logs.
    fn command_type(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Owned command trait object, as produced by dispatcher rules.
pub type BoxedCommand<T> = Box<dyn Command<T>>;
