use async_trait::async_trait;

use crate::errors::Error;

use super::{AdministrationRecord, Medication, Prescription, PrescriptionStatus};

#[async_trait]
pub trait MedicationRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Medication>, Error>;
}

#[async_trait]
pub trait PrescriptionRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Prescription>, Error>;

    async fn find_by_patient_id(&self, patient_id: &str) -> Result<Vec<Prescription>, Error>;

    async fn find_by_status(&self, status: PrescriptionStatus) -> Result<Vec<Prescription>, Error>;
}

#[async_trait]
pub trait AdministrationRepository: Send + Sync {
    async fn find_by_prescription_id(
        &self,
        prescription_id: &str,
    ) -> Result<Vec<AdministrationRecord>, Error>;
}
