use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Maps scanned barcodes to patient and medication ids.
pub trait BarcodeResolver: Send + Sync {
    fn patient_id(&self, barcode: &str) -> Option<String>;

    fn medication_id(&self, barcode: &str) -> Option<String>;
}

/// Barcode lookup tables, e.g. wristband and NDC/GTIN codes.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BarcodeIndex {
    #[serde(default)]
    pub patients: HashMap<String, String>,
    #[serde(default)]
    pub medications: HashMap<String, String>,
}

impl BarcodeIndex {
    pub fn with_patient(mut self, barcode: impl Into<String>, patient_id: impl Into<String>) -> Self {
        self.patients.insert(barcode.into(), patient_id.into());
        self
    }

    pub fn with_medication(
        mut self,
        barcode: impl Into<String>,
        medication_id: impl Into<String>,
    ) -> Self {
        self.medications.insert(barcode.into(), medication_id.into());
        self
    }
}

impl BarcodeResolver for BarcodeIndex {
    fn patient_id(&self, barcode: &str) -> Option<String> {
        self.patients.get(barcode.trim()).cloned()
    }

    fn medication_id(&self, barcode: &str) -> Option<String> {
        self.medications.get(barcode.trim()).cloned()
    }
}
