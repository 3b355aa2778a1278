use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::config::MonitorConfig;
use crate::errors::Error;
use crate::records::{
    AdministrationRecord, AdministrationRepository, Medication, MedicationRepository,
    Prescription, PrescriptionRepository, PrescriptionStatus,
};
use crate::schedule::check_interval;

use super::lists::{
    day_schedule, due_items, overdue_items, sort_overdue, DoseContext, DueItem, OverdueItem,
    ScheduledDose,
};

/// Loads a patient's (or the whole ward's) active prescriptions and runs
/// the due/overdue list builders over them.
pub struct DoseMonitor {
    prescriptions: Arc<dyn PrescriptionRepository>,
    medications: Arc<dyn MedicationRepository>,
    administrations: Arc<dyn AdministrationRepository>,
    config: MonitorConfig,
}

struct Loaded {
    prescription: Prescription,
    medication: Medication,
    administrations: Vec<AdministrationRecord>,
}

impl Loaded {
    fn context(&self) -> DoseContext<'_> {
        DoseContext::new(&self.prescription, &self.medication, &self.administrations)
    }
}

impl DoseMonitor {
    pub fn new(
        prescriptions: Arc<dyn PrescriptionRepository>,
        medications: Arc<dyn MedicationRepository>,
        administrations: Arc<dyn AdministrationRepository>,
        config: MonitorConfig,
    ) -> Self {
        Self {
            prescriptions,
            medications,
            administrations,
            config,
        }
    }

    /// Doses due in the next `window_minutes` (config default when `None`).
    pub async fn due_doses(
        &self,
        patient_id: Option<&str>,
        now: DateTime<Utc>,
        window_minutes: Option<i64>,
    ) -> Result<Vec<DueItem>, Error> {
        let config = MonitorConfig {
            due_window_minutes: window_minutes.unwrap_or(self.config.due_window_minutes),
            ..self.config
        };
        config.validate()?;

        let mut items = Vec::new();
        for loaded in self.load(patient_id, now).await? {
            items.extend(due_items(&loaded.context(), now, config.due_window_minutes)?);
        }
        items.sort_by(|a, b| {
            a.scheduled_time
                .cmp(&b.scheduled_time)
                .then_with(|| a.summary.medication_name.cmp(&b.summary.medication_name))
        });

        tracing::info!("Found {} due doses", items.len());
        Ok(items)
    }

    /// Doses at least `threshold_minutes` late today, most urgent first.
    pub async fn overdue_doses(
        &self,
        patient_id: Option<&str>,
        now: DateTime<Utc>,
        threshold_minutes: Option<i64>,
    ) -> Result<Vec<OverdueItem>, Error> {
        let config = MonitorConfig {
            overdue_threshold_minutes: threshold_minutes
                .unwrap_or(self.config.overdue_threshold_minutes),
            ..self.config
        };
        config.validate()?;

        let mut items = Vec::new();
        for loaded in self.load(patient_id, now).await? {
            items.extend(overdue_items(
                &loaded.context(),
                now,
                config.overdue_threshold_minutes,
            )?);
        }
        sort_overdue(&mut items);

        tracing::info!("Found {} overdue doses", items.len());
        Ok(items)
    }

    /// Today's full schedule for one patient, in time order.
    pub async fn day_schedule(
        &self,
        patient_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<ScheduledDose>, Error> {
        self.config.validate()?;

        let mut doses = Vec::new();
        for loaded in self.load(Some(patient_id), now).await? {
            doses.extend(day_schedule(
                &loaded.context(),
                now,
                self.config.overdue_threshold_minutes,
            )?);
        }
        doses.sort_by_key(|dose| dose.scheduled_time);
        Ok(doses)
    }

    /// Active, schedulable prescriptions with their medication and records.
    ///
    /// A prescription that cannot be scheduled or whose medication is
    /// missing is skipped so the rest of the ward still gets its list.
    async fn load(&self, patient_id: Option<&str>, now: DateTime<Utc>) -> Result<Vec<Loaded>, Error> {
        let prescriptions = match patient_id {
            Some(patient_id) => self.prescriptions.find_by_patient_id(patient_id).await?,
            None => self.prescriptions.find_by_status(PrescriptionStatus::Active).await?,
        };

        let mut loaded = Vec::new();
        for prescription in prescriptions {
            if !prescription.is_active(now) || prescription.is_prn() {
                continue;
            }
            if let Err(e) = check_interval(prescription.frequency_kind()) {
                tracing::warn!("Skipping prescription {}: {}", prescription.id, e);
                continue;
            }

            let Some(medication) = self.medications.find_by_id(&prescription.medication_id).await?
            else {
                tracing::warn!(
                    "Skipping prescription {}: medication {} not found",
                    prescription.id,
                    prescription.medication_id
                );
                continue;
            };

            let administrations = self
                .administrations
                .find_by_prescription_id(&prescription.id)
                .await?;

            loaded.push(Loaded {
                prescription,
                medication,
                administrations,
            });
        }

        Ok(loaded)
    }
}
