use derive_new::new;
use serde::{Deserialize, Serialize};

/// Catalog entry for a medication.
#[derive(Clone, Debug, Default, Serialize, Deserialize, Eq, PartialEq, new)]
pub struct Medication {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub is_controlled: bool,
    #[serde(default)]
    pub is_high_alert: bool,
}
