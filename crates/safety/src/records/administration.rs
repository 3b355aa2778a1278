use chrono::{DateTime, Utc};
use derive_new::new;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub enum AdministrationStatus {
    Completed,
    /// Dose was missed or refused.
    NotDone,
    Verified,
}

impl Default for AdministrationStatus {
    fn default() -> Self {
        Self::Completed
    }
}

/// Amount of medication actually given.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, new)]
pub struct AdministeredDose {
    pub value: f64,
    pub unit: String,
}

/// One real-world dose event.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct AdministrationRecord {
    pub id: String,
    pub prescription_id: String,
    pub patient_id: String,
    pub medication_id: String,
    pub dose: AdministeredDose,
    pub route: String,
    pub administered_by: String,
    pub administered_at: DateTime<Utc>,
    #[serde(default)]
    pub status: AdministrationStatus,
    pub reason_code: Option<String>,
    pub reason_text: Option<String>,
    pub notes: Option<String>,
}

impl AdministrationRecord {
    /// Whether the record documents a dose that was actually given.
    pub fn was_given(&self) -> bool {
        self.status != AdministrationStatus::NotDone
    }
}
