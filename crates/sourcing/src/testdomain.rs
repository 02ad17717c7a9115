//! Minimal tally domain used by the runtime's own tests.

use event_store::Codec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::aggregate::{Event, EventKind, EventSourced};
use crate::command::{Command, CommandContext, CommandError};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tally {
    pub total: i64,
    pub closed: bool,
}

impl EventSourced for Tally {
    type Id = String;
    type Event = TallyEvent;

    fn aggregate_type() -> &'static str {
        "Tally"
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TallyIncremented {
    pub by: i64,
    pub recorded_by: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TallyClosed {}

#[derive(Debug, Clone)]
pub enum TallyEvent {
    Incremented(TallyIncremented),
    Closed(TallyClosed),
}

impl TallyEvent {
    pub fn incremented(by: i64, recorded_by: &str) -> Self {
        Self::Incremented(TallyIncremented {
            by,
            recorded_by: recorded_by.to_string(),
        })
    }
}

impl Event<Tally> for TallyEvent {
    fn apply(&self, state: &mut Tally) {
        match self {
            TallyEvent::Incremented(e) => state.total += e.by,
            TallyEvent::Closed(_) => state.closed = true,
        }
    }

    fn event_type(&self) -> &'static str {
        match self {
            TallyEvent::Incremented(_) => TallyIncremented::TYPE_NAME,
            TallyEvent::Closed(_) => TallyClosed::TYPE_NAME,
        }
    }

    fn encode<C: Codec>(&self, codec: &C) -> event_store::Result<Vec<u8>> {
        match self {
            TallyEvent::Incremented(e) => codec.encode(e),
            TallyEvent::Closed(e) => codec.encode(e),
        }
    }
}

impl EventKind<Tally> for TallyIncremented {
    const TYPE_NAME: &'static str = "TallyIncremented";

    fn extract(event: &TallyEvent) -> Option<&Self> {
        match event {
            TallyEvent::Incremented(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TallyIncremented> for TallyEvent {
    fn from(e: TallyIncremented) -> Self {
        Self::Incremented(e)
    }
}

impl EventKind<Tally> for TallyClosed {
    const TYPE_NAME: &'static str = "TallyClosed";

    fn extract(event: &TallyEvent) -> Option<&Self> {
        match event {
            TallyEvent::Closed(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TallyClosed> for TallyEvent {
    fn from(e: TallyClosed) -> Self {
        Self::Closed(e)
    }
}

#[derive(Debug, Error)]
pub enum TallyError {
    #[error("cannot increment by a negative amount")]
    NegativeIncrement,
}

pub struct Increment {
    pub by: i64,
}

impl Command<Tally> for Increment {
    fn execute(
        &self,
        ctx: &CommandContext<'_, String>,
        state: &Tally,
    ) -> Result<Vec<TallyEvent>, CommandError> {
        if state.closed {
            return Err(CommandError::Aborted);
        }
        if self.by < 0 {
            return Err(CommandError::rejected(TallyError::NegativeIncrement));
        }
        if self.by == 0 {
            return Ok(Vec::new());
        }
        Ok(vec![
            TallyIncremented {
                by: self.by,
                recorded_by: ctx.aggregate_id().clone(),
            }
            .into(),
        ])
    }
}

pub struct Close;

impl Command<Tally> for Close {
    fn execute(
        &self,
        _ctx: &CommandContext<'_, String>,
        state: &Tally,
    ) -> Result<Vec<TallyEvent>, CommandError> {
        if state.closed {
            return Err(CommandError::Aborted);
        }
        Ok(vec![TallyClosed {}.into()])
    }

    fn command_type(&self) -> &'static str {
        "Close"
    }
}

/// Multi-event command, for batch ordering and numbering tests.
pub struct IncrementTwiceAndClose {
    pub by: i64,
}

impl Command<Tally> for IncrementTwiceAndClose {
    fn execute(
        &self,
        ctx: &CommandContext<'_, String>,
        state: &Tally,
    ) -> Result<Vec<TallyEvent>, CommandError> {
        if state.closed {
            return Err(CommandError::Aborted);
        }
        let increment = TallyIncremented {
            by: self.by,
            recorded_by: ctx.aggregate_id().clone(),
        };
        Ok(vec![
            increment.clone().into(),
            increment.into(),
            TallyClosed {}.into(),
        ])
    }
}
