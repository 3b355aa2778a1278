use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::Error;

use super::{
    AdministrationRecord, AdministrationRepository, Medication, MedicationRepository,
    Prescription, PrescriptionRepository, PrescriptionStatus,
};

/// Plain data loaded by a caller before invoking the engine.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    #[serde(default)]
    pub medications: Vec<Medication>,
    #[serde(default)]
    pub prescriptions: Vec<Prescription>,
    #[serde(default)]
    pub administrations: Vec<AdministrationRecord>,
}

/// Read-only store backing all three repositories from a [`Snapshot`].
#[derive(Clone, Debug, Default)]
pub struct InMemoryStore {
    medications: HashMap<String, Medication>,
    prescriptions: Vec<Prescription>,
    administrations: HashMap<String, Vec<AdministrationRecord>>,
}

impl InMemoryStore {
    pub fn new(snapshot: Snapshot) -> Self {
        let medications = snapshot
            .medications
            .into_iter()
            .map(|medication| (medication.id.clone(), medication))
            .collect();

        let mut administrations: HashMap<String, Vec<AdministrationRecord>> = HashMap::new();
        for record in snapshot.administrations {
            administrations
                .entry(record.prescription_id.clone())
                .or_default()
                .push(record);
        }

        Self {
            medications,
            prescriptions: snapshot.prescriptions,
            administrations,
        }
    }
}

impl From<Snapshot> for InMemoryStore {
    fn from(snapshot: Snapshot) -> Self {
        Self::new(snapshot)
    }
}

#[async_trait]
impl MedicationRepository for InMemoryStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<Medication>, Error> {
        Ok(self.medications.get(id).cloned())
    }
}

#[async_trait]
impl PrescriptionRepository for InMemoryStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<Prescription>, Error> {
        Ok(self.prescriptions.iter().find(|p| p.id == id).cloned())
    }

    async fn find_by_patient_id(&self, patient_id: &str) -> Result<Vec<Prescription>, Error> {
        Ok(self
            .prescriptions
            .iter()
            .filter(|p| p.patient_id == patient_id)
            .cloned()
            .collect())
    }

    async fn find_by_status(&self, status: PrescriptionStatus) -> Result<Vec<Prescription>, Error> {
        Ok(self
            .prescriptions
            .iter()
            .filter(|p| p.status == status)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl AdministrationRepository for InMemoryStore {
    async fn find_by_prescription_id(
        &self,
        prescription_id: &str,
    ) -> Result<Vec<AdministrationRecord>, Error> {
        Ok(self
            .administrations
            .get(prescription_id)
            .cloned()
            .unwrap_or_default())
    }
}
