//! Patient identity and state.

use serde::{Deserialize, Serialize};
use sourcing::EventSourced;
use uuid::Uuid;

use crate::events::PatientEvent;

/// Unique identifier for a patient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatientId(Uuid);

impl PatientId {
    /// Creates a new random patient ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a patient ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for PatientId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PatientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for PatientId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Current state of one patient, rebuilt by replaying admission events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Patient {
    /// Ward the patient currently occupies.
    pub ward: u32,

    /// Patient name, recorded at admission.
    pub name: String,

    /// Patient age, recorded at admission.
    pub age: u32,

    /// Whether the patient has been admitted at all.
    pub admitted: bool,

    /// Whether the patient has been discharged. Discharge is terminal.
    pub discharged: bool,
}

impl EventSourced for Patient {
    type Id = PatientId;
    type Event = PatientEvent;

    fn aggregate_type() -> &'static str {
        "Patient"
    }
}
