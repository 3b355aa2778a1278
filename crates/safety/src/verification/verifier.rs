use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::doses::MATCH_TOLERANCE_MINUTES;
use crate::errors::Error;
use crate::records::{AdministeredDose, Medication, Prescription};
use crate::schedule::{check_interval, generate, FrequencyKind};

use super::barcode::BarcodeResolver;

const DOSE_EPSILON: f64 = 1e-9;

/// Which of the rights an issue concerns.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, Eq, PartialEq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Check {
    Patient,
    Medication,
    Dose,
    Route,
    Time,
    Prescription,
}

#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct VerificationIssue {
    pub check: Check,
    pub message: String,
}

impl VerificationIssue {
    fn new(check: Check, message: impl Into<String>) -> Self {
        Self {
            check,
            message: message.into(),
        }
    }
}

/// A barcode-scanned administration awaiting verification.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, new)]
pub struct VerificationRequest {
    pub patient_barcode: String,
    pub medication_barcode: String,
    pub prescription_id: String,
    pub administered_dose: AdministeredDose,
    pub administered_route: String,
    pub administered_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct VerificationResult {
    pub success: bool,
    pub patient_id: Option<String>,
    pub medication_id: Option<String>,
    pub prescription_id: String,
    /// Blocking failures.
    pub errors: Vec<VerificationIssue>,
    /// Surfaced to the clinician, never blocking.
    pub warnings: Vec<VerificationIssue>,
}

/// Five Rights check at the point of administration.
///
/// Every check runs on every call so all failures are reported together.
/// Wrong patient, wrong medication and an inactive prescription block;
/// dose, route and timing differences are warnings.
#[derive(Clone)]
pub struct AdministrationVerifier {
    barcodes: Arc<dyn BarcodeResolver>,
}

impl AdministrationVerifier {
    pub fn new(barcodes: Arc<dyn BarcodeResolver>) -> Self {
        Self { barcodes }
    }

    /// `prescription` and `medication` must be the records the request's
    /// prescription id resolves to.
    pub fn verify(
        &self,
        request: &VerificationRequest,
        prescription: &Prescription,
        medication: &Medication,
    ) -> Result<VerificationResult, Error> {
        if request.prescription_id != prescription.id {
            return Err(Error::invalid_input(format!(
                "request is for prescription {}, got {}",
                request.prescription_id, prescription.id
            )));
        }
        if medication.id != prescription.medication_id {
            return Err(Error::invalid_input(format!(
                "prescription {} references medication {}, got {}",
                prescription.id, prescription.medication_id, medication.id
            )));
        }

        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        let patient_id = self.barcodes.patient_id(&request.patient_barcode);
        match patient_id.as_deref() {
            None => errors.push(VerificationIssue::new(
                Check::Patient,
                format!("Patient barcode {} not recognised", request.patient_barcode),
            )),
            Some(id) if id != prescription.patient_id => errors.push(VerificationIssue::new(
                Check::Patient,
                format!(
                    "Wrong patient: scanned {id}, prescription is for {}",
                    prescription.patient_id
                ),
            )),
            Some(_) => {}
        }

        let medication_id = self.barcodes.medication_id(&request.medication_barcode);
        match medication_id.as_deref() {
            None => errors.push(VerificationIssue::new(
                Check::Medication,
                format!(
                    "Medication barcode {} not recognised",
                    request.medication_barcode
                ),
            )),
            Some(id) if id != prescription.medication_id => errors.push(VerificationIssue::new(
                Check::Medication,
                format!(
                    "Wrong medication: scanned {id}, prescription is for {}",
                    prescription.medication_id
                ),
            )),
            Some(_) => {}
        }

        if !prescription.is_active(request.administered_at) {
            errors.push(VerificationIssue::new(
                Check::Prescription,
                format!("Prescription {} is not active", prescription.id),
            ));
        }

        if let Some(warning) = dose_warning(&request.administered_dose, prescription) {
            warnings.push(warning);
        }
        if let Some(warning) = route_warning(&request.administered_route, prescription) {
            warnings.push(warning);
        }
        if let Some(warning) = time_warning(request.administered_at, prescription)? {
            warnings.push(warning);
        }

        if medication.is_high_alert {
            warnings.push(VerificationIssue::new(
                Check::Medication,
                format!(
                    "{} is a high-alert medication: independent double-check required",
                    medication.name
                ),
            ));
        }
        if medication.is_controlled {
            warnings.push(VerificationIssue::new(
                Check::Medication,
                format!(
                    "{} is a controlled substance: witness required",
                    medication.name
                ),
            ));
        }

        let success = errors.is_empty();
        tracing::info!(
            "Verification of prescription {} {} with {} errors and {} warnings",
            prescription.id,
            if success { "passed" } else { "failed" },
            errors.len(),
            warnings.len()
        );

        Ok(VerificationResult {
            success,
            patient_id,
            medication_id,
            prescription_id: prescription.id.clone(),
            errors,
            warnings,
        })
    }
}

fn dose_warning(dose: &AdministeredDose, prescription: &Prescription) -> Option<VerificationIssue> {
    let prescribed = &prescription.dosage;
    let same_unit = dose.unit.trim().eq_ignore_ascii_case(prescribed.unit.trim());
    let same_value = (dose.value - prescribed.value).abs() <= DOSE_EPSILON;

    (!same_unit || !same_value).then(|| {
        VerificationIssue::new(
            Check::Dose,
            format!(
                "Administered dose {} {} differs from prescribed {} {}",
                dose.value, dose.unit, prescribed.value, prescribed.unit
            ),
        )
    })
}

fn route_warning(route: &str, prescription: &Prescription) -> Option<VerificationIssue> {
    let prescribed = &prescription.dosage.route;
    (!route.trim().eq_ignore_ascii_case(prescribed.trim())).then(|| {
        VerificationIssue::new(
            Check::Route,
            format!("Administered route {route} differs from prescribed {prescribed}"),
        )
    })
}

/// Warns when no scheduled dose lies within tolerance of `administered_at`.
fn time_warning(
    administered_at: DateTime<Utc>,
    prescription: &Prescription,
) -> Result<Option<VerificationIssue>, Error> {
    let kind = prescription.frequency_kind();
    if kind == FrequencyKind::Prn {
        return Ok(None);
    }
    if let Err(e) = check_interval(kind) {
        return Ok(Some(VerificationIssue::new(
            Check::Time,
            format!("Schedule cannot be determined: {e}"),
        )));
    }

    // Neighbouring days cover administrations close to midnight.
    let day_start = crate::doses::lists::start_of_day(administered_at);
    let (Some(from), Some(until)) = (
        day_start.checked_sub_signed(Duration::days(1)),
        day_start.checked_add_signed(Duration::days(2)),
    ) else {
        return Err(Error::invalid_input(format!(
            "administration time {administered_at} is out of range"
        )));
    };
    let scheduled = generate(kind, from, until)?;

    let tolerance = Duration::minutes(MATCH_TOLERANCE_MINUTES);
    let on_time = scheduled.iter().any(|instant| {
        let offset = administered_at - *instant;
        offset <= tolerance && offset >= -tolerance
    });

    Ok((!on_time).then(|| {
        VerificationIssue::new(
            Check::Time,
            format!(
                "No {} dose scheduled within {} minutes of {}",
                kind,
                MATCH_TOLERANCE_MINUTES,
                administered_at.format("%H:%M")
            ),
        )
    }))
}
