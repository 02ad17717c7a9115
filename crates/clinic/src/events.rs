//! Patient admission events.

use event_store::Codec;
use serde::{Deserialize, Serialize};
use sourcing::{Event, EventKind};

use crate::state::Patient;

/// A patient was admitted to a ward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientCreated {
    /// Ward the patient was admitted to.
    pub ward: u32,

    /// Patient name.
    pub name: String,

    /// Patient age.
    pub age: u32,
}

/// A patient was moved to another ward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientTransferred {
    /// Ward the patient now occupies.
    pub new_ward: u32,
}

/// A patient left the clinic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientDischarged {}

/// The closed event set of the patient aggregate.
#[derive(Debug, Clone)]
pub enum PatientEvent {
    Created(PatientCreated),
    Transferred(PatientTransferred),
    Discharged(PatientDischarged),
}

impl Event<Patient> for PatientEvent {
    fn apply(&self, state: &mut Patient) {
        match self {
            PatientEvent::Created(e) => {
                state.ward = e.ward;
                state.name = e.name.clone();
                state.age = e.age;
                state.admitted = true;
            }
            PatientEvent::Transferred(e) => state.ward = e.new_ward,
            PatientEvent::Discharged(_) => state.discharged = true,
        }
    }

    fn event_type(&self) -> &'static str {
        match self {
            PatientEvent::Created(_) => PatientCreated::TYPE_NAME,
            PatientEvent::Transferred(_) => PatientTransferred::TYPE_NAME,
            PatientEvent::Discharged(_) => PatientDischarged::TYPE_NAME,
        }
    }

    fn encode<C: Codec>(&self, codec: &C) -> event_store::Result<Vec<u8>> {
        match self {
            PatientEvent::Created(e) => codec.encode(e),
            PatientEvent::Transferred(e) => codec.encode(e),
            PatientEvent::Discharged(e) => codec.encode(e),
        }
    }
}

impl EventKind<Patient> for PatientCreated {
    const TYPE_NAME: &'static str = "PatientCreated";

    fn extract(event: &PatientEvent) -> Option<&Self> {
        match event {
            PatientEvent::Created(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PatientCreated> for PatientEvent {
    fn from(e: PatientCreated) -> Self {
        Self::Created(e)
    }
}

impl EventKind<Patient> for PatientTransferred {
    const TYPE_NAME: &'static str = "PatientTransferred";

    fn extract(event: &PatientEvent) -> Option<&Self> {
        match event {
            PatientEvent::Transferred(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PatientTransferred> for PatientEvent {
    fn from(e: PatientTransferred) -> Self {
        Self::Transferred(e)
    }
}

impl EventKind<Patient> for PatientDischarged {
    const TYPE_NAME: &'static str = "PatientDischarged";

    fn extract(event: &PatientEvent) -> Option<&Self> {
        match event {
            PatientEvent::Discharged(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PatientDischarged> for PatientEvent {
    fn from(e: PatientDischarged) -> Self {
        Self::Discharged(e)
    }
}
