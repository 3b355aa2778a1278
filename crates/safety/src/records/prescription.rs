use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::schedule::{classify, FrequencyKind};

/// Prescription lifecycle status
#[derive(Clone, Copy, Debug, Serialize, Deserialize, Eq, PartialEq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum PrescriptionStatus {
    Draft,
    Active,
    OnHold,
    Completed,
    Cancelled,
    Stopped,
}

impl Default for PrescriptionStatus {
    fn default() -> Self {
        Self::Active
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum PrescriptionPriority {
    Routine,
    Urgent,
    Asap,
    Stat,
}

impl Default for PrescriptionPriority {
    fn default() -> Self {
        Self::Routine
    }
}

/// Dosage instructions embedded in a prescription.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Dosage {
    pub value: f64,
    pub unit: String,
    pub route: String,
    /// Free text, e.g. "Take one tablet BID" or "every 6 hours".
    pub frequency: String,
    pub duration: Option<String>,
    pub instructions: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Prescription {
    pub id: String,
    pub patient_id: String,
    pub medication_id: String,
    pub prescriber_id: String,
    pub dosage: Dosage,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: PrescriptionStatus,
    #[serde(default)]
    pub priority: PrescriptionPriority,
}

impl Prescription {
    /// Active status and not past its end date at `now`.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.status == PrescriptionStatus::Active
            && self.end_date.map_or(true, |end| end >= now)
    }

    pub fn frequency_kind(&self) -> FrequencyKind {
        classify(&self.dosage.frequency)
    }

    pub fn is_prn(&self) -> bool {
        self.frequency_kind() == FrequencyKind::Prn
    }
}
