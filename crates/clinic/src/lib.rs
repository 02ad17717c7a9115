//! Patient admission domain built on the sourcing runtime.
//!
//! A small but complete domain module: the [`Patient`] state, its closed
//! event set, the commands that produce those events, and the reactive
//! admission workflow (every new admission is moved to the next ward and
//! then discharged).

pub mod commands;
pub mod events;
pub mod state;

pub use commands::{Create, Discharge, PatientError, Transfer};
pub use events::{PatientCreated, PatientDischarged, PatientEvent, PatientTransferred};
pub use state::{Patient, PatientId};

use event_store::{Backend, Codec};
use sourcing::{BoxedCommand, Dispatcher, Repository};

/// Registers every patient event kind with the repository. Call once at
/// startup, before the first load.
pub fn register_patient_events<B, C>(
    repository: &mut Repository<Patient, B, C>,
) -> sourcing::Result<()>
where
    B: Backend<PatientId>,
    C: Codec,
{
    repository.register_event::<PatientCreated>()?;
    repository.register_event::<PatientTransferred>()?;
    repository.register_event::<PatientDischarged>()?;
    Ok(())
}

/// Wires the admission workflow: a created patient is transferred to the
/// next ward, and a transferred patient is discharged.
pub fn register_admission_rules<B, C>(
    dispatcher: &mut Dispatcher<Patient, B, C>,
) -> sourcing::Result<()>
where
    B: Backend<PatientId>,
    C: Codec,
{
    dispatcher.register_rule(|patient: &Patient, _e: &PatientCreated| {
        Ok(vec![Box::new(Transfer {
            new_ward: patient.ward + 1,
        }) as BoxedCommand<Patient>])
    })?;
    dispatcher.register_rule(|_patient: &Patient, _e: &PatientTransferred| {
        Ok(vec![Box::new(Discharge) as BoxedCommand<Patient>])
    })?;
    Ok(())
}
