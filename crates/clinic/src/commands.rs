//! Patient admission commands.

use sourcing::{Command, CommandContext, CommandError};
use thiserror::Error;

use crate::events::{PatientCreated, PatientDischarged, PatientEvent, PatientTransferred};
use crate::state::{Patient, PatientId};

/// Domain errors raised by patient commands.
#[derive(Debug, Error)]
pub enum PatientError {
    #[error("patient is already admitted")]
    AlreadyAdmitted,

    #[error("patient has not been admitted")]
    NotAdmitted,
}

/// Admits a new patient to a ward.
pub struct Create {
    pub ward: u32,
    pub name: String,
    pub age: u32,
}

impl Command<Patient> for Create {
    fn execute(
        &self,
        _ctx: &CommandContext<'_, PatientId>,
        state: &Patient,
    ) -> Result<Vec<PatientEvent>, CommandError> {
        if state.admitted {
            return Err(CommandError::rejected(PatientError::AlreadyAdmitted));
        }
        Ok(vec![
            PatientCreated {
                ward: self.ward,
                name: self.name.clone(),
                age: self.age,
            }
            .into(),
        ])
    }

    fn command_type(&self) -> &'static str {
        "Create"
    }
}

/// Moves an admitted patient to another ward. Aborts once the patient has
/// been discharged, so a late or redelivered transfer never resurrects a
/// closed admission.
pub struct Transfer {
    pub new_ward: u32,
}

impl Command<Patient> for Transfer {
    fn execute(
        &self,
        _ctx: &CommandContext<'_, PatientId>,
        state: &Patient,
    ) -> Result<Vec<PatientEvent>, CommandError> {
        if state.discharged {
            return Err(CommandError::Aborted);
        }
        if !state.admitted {
            return Err(CommandError::rejected(PatientError::NotAdmitted));
        }
        Ok(vec![
            PatientTransferred {
                new_ward: self.new_ward,
            }
            .into(),
        ])
    }

    fn command_type(&self) -> &'static str {
        "Transfer"
    }
}

/// Closes an admission. Idempotent: discharging an already discharged
/// patient emits nothing.
pub struct Discharge;

impl Command<Patient> for Discharge {
    fn execute(
        &self,
        _ctx: &CommandContext<'_, PatientId>,
        state: &Patient,
    ) -> Result<Vec<PatientEvent>, CommandError> {
        if state.discharged {
            return Ok(Vec::new());
        }
        if !state.admitted {
            return Err(CommandError::rejected(PatientError::NotAdmitted));
        }
        Ok(vec![PatientDischarged {}.into()])
    }

    fn command_type(&self) -> &'static str {
        "Discharge"
    }
}
