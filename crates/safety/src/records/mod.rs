/// Medication reference data
pub mod medication;

/// Prescriptions and their dosage
pub mod prescription;

/// Administration records
pub mod administration;

/// Collaborator contracts
pub mod repository;

/// In-memory snapshot store
pub mod memory;

pub use administration::{AdministeredDose, AdministrationRecord, AdministrationStatus};
pub use medication::Medication;
pub use memory::{InMemoryStore, Snapshot};
pub use prescription::{Dosage, Prescription, PrescriptionPriority, PrescriptionStatus};
pub use repository::{AdministrationRepository, MedicationRepository, PrescriptionRepository};
