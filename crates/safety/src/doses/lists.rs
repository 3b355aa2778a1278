use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};
use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::errors::Error;
use crate::records::{AdministrationRecord, Medication, Prescription, PrescriptionPriority};
use crate::schedule::{generate, in_window, EndBound};

use super::matcher::{find_administration, match_dose, MatchState};
use super::severity::{classify_lateness, requires_escalation, OverdueSeverity};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum DoseStatus {
    Due,
    Overdue,
    Administered,
}

/// One prescription with everything needed to evaluate its doses.
#[derive(Clone, Copy, Debug, new)]
pub struct DoseContext<'a> {
    pub prescription: &'a Prescription,
    pub medication: &'a Medication,
    pub administrations: &'a [AdministrationRecord],
}

/// Prescription and medication fields shared by every dose list entry.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DoseSummary {
    pub prescription_id: String,
    pub patient_id: String,
    pub medication_id: String,
    pub medication_name: String,
    pub dose_value: f64,
    pub dose_unit: String,
    pub route: String,
    pub frequency: String,
    pub priority: PrescriptionPriority,
    pub is_high_alert: bool,
    pub is_controlled: bool,
}

impl From<&DoseContext<'_>> for DoseSummary {
    fn from(context: &DoseContext<'_>) -> Self {
        let prescription = context.prescription;
        Self {
            prescription_id: prescription.id.clone(),
            patient_id: prescription.patient_id.clone(),
            medication_id: prescription.medication_id.clone(),
            medication_name: context.medication.name.clone(),
            dose_value: prescription.dosage.value,
            dose_unit: prescription.dosage.unit.clone(),
            route: prescription.dosage.route.clone(),
            frequency: prescription.dosage.frequency.clone(),
            priority: prescription.priority,
            is_high_alert: context.medication.is_high_alert,
            is_controlled: context.medication.is_controlled,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DueItem {
    #[serde(flatten)]
    pub summary: DoseSummary,
    pub scheduled_time: DateTime<Utc>,
    pub status: DoseStatus,
    pub minutes_until_due: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct OverdueItem {
    #[serde(flatten)]
    pub summary: DoseSummary,
    pub scheduled_time: DateTime<Utc>,
    pub status: DoseStatus,
    pub overdue_minutes: i64,
    pub severity: OverdueSeverity,
    pub requires_escalation: bool,
}

/// A scheduled instant of the day and what happened to it.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ScheduledDose {
    #[serde(flatten)]
    pub summary: DoseSummary,
    pub scheduled_time: DateTime<Utc>,
    pub status: DoseStatus,
    pub administration_id: Option<String>,
    pub overdue_minutes: Option<i64>,
}

/// Pending doses scheduled in `[now, now + window_minutes]`, earliest first.
pub fn due_items(
    context: &DoseContext<'_>,
    now: DateTime<Utc>,
    window_minutes: i64,
) -> Result<Vec<DueItem>, Error> {
    if window_minutes <= 0 {
        return Err(Error::invalid_input(format!(
            "due window must be positive, got {window_minutes} minutes"
        )));
    }
    if context.prescription.is_prn() {
        return Ok(Vec::new());
    }

    let window_end = offset(now, minutes(window_minutes, "due window")?)?;
    let summary = DoseSummary::from(context);

    let items = pending_between(context, now, window_end)?
        .into_iter()
        .map(|scheduled_time| DueItem {
            summary: summary.clone(),
            scheduled_time,
            status: DoseStatus::Due,
            minutes_until_due: (scheduled_time - now).num_minutes(),
        })
        .collect();

    Ok(items)
}

/// Pending doses from the start of `now`'s day that are at least
/// `threshold_minutes` late.
pub fn overdue_items(
    context: &DoseContext<'_>,
    now: DateTime<Utc>,
    threshold_minutes: i64,
) -> Result<Vec<OverdueItem>, Error> {
    if threshold_minutes < 0 {
        return Err(Error::invalid_input(format!(
            "overdue threshold must not be negative, got {threshold_minutes} minutes"
        )));
    }
    if context.prescription.is_prn() {
        return Ok(Vec::new());
    }

    let cutoff = offset(now, -minutes(threshold_minutes, "overdue threshold")?)?;
    let summary = DoseSummary::from(context);

    let items = pending_between(context, start_of_day(now), now)?
        .into_iter()
        .filter(|scheduled| *scheduled <= cutoff)
        .map(|scheduled_time| {
            let overdue_minutes = (now - scheduled_time).num_minutes();
            let severity = classify_lateness(overdue_minutes);
            OverdueItem {
                summary: summary.clone(),
                scheduled_time,
                status: DoseStatus::Overdue,
                overdue_minutes,
                severity,
                requires_escalation: requires_escalation(severity, context.medication),
            }
        })
        .collect();

    Ok(items)
}

/// Every instant scheduled on `now`'s day with its status.
pub fn day_schedule(
    context: &DoseContext<'_>,
    now: DateTime<Utc>,
    threshold_minutes: i64,
) -> Result<Vec<ScheduledDose>, Error> {
    if threshold_minutes < 0 {
        return Err(Error::invalid_input(format!(
            "overdue threshold must not be negative, got {threshold_minutes} minutes"
        )));
    }
    if context.prescription.is_prn() {
        return Ok(Vec::new());
    }

    let day_start = start_of_day(now);
    let day_end = offset(day_start, Duration::days(1))?;
    let cutoff = offset(now, -minutes(threshold_minutes, "overdue threshold")?)?;
    let summary = DoseSummary::from(context);

    let doses = schedule(context, day_start, day_end)?
        .into_iter()
        .filter(|instant| in_window(*instant, day_start, day_end, EndBound::Exclusive))
        .map(|scheduled_time| {
            let administration = find_administration(scheduled_time, context.administrations);
            let status = match administration {
                Some(_) => DoseStatus::Administered,
                None if scheduled_time <= cutoff => DoseStatus::Overdue,
                None => DoseStatus::Due,
            };
            ScheduledDose {
                summary: summary.clone(),
                scheduled_time,
                status,
                administration_id: administration.map(|record| record.id.clone()),
                overdue_minutes: (status == DoseStatus::Overdue)
                    .then(|| (now - scheduled_time).num_minutes()),
            }
        })
        .collect();

    Ok(doses)
}

/// Most severe first, then most overdue first.
pub fn sort_overdue(items: &mut [OverdueItem]) {
    items.sort_by(|a, b| {
        a.severity
            .rank()
            .cmp(&b.severity.rank())
            .then_with(|| b.overdue_minutes.cmp(&a.overdue_minutes))
    });
}

pub(crate) fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.from_utc_datetime(&now.date_naive().and_time(NaiveTime::MIN))
}

fn minutes(value: i64, what: &str) -> Result<Duration, Error> {
    Duration::try_minutes(value)
        .ok_or_else(|| Error::invalid_input(format!("{what} of {value} minutes is out of range")))
}

fn offset(instant: DateTime<Utc>, delta: Duration) -> Result<DateTime<Utc>, Error> {
    instant.checked_add_signed(delta).ok_or_else(|| {
        Error::invalid_input(format!("{instant} shifted by {delta} is out of range"))
    })
}

/// The prescription's instants in `[start, end)`, with its id attached to
/// any scheduling error.
fn schedule(
    context: &DoseContext<'_>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<DateTime<Utc>>, Error> {
    generate(context.prescription.frequency_kind(), start, end).map_err(|e| match e {
        Error::InvalidInput { message } => Error::invalid_input(format!(
            "prescription {}: {message}",
            context.prescription.id
        )),
        other => other,
    })
}

/// Scheduled instants in `[start, end]` with no matching administration.
fn pending_between(
    context: &DoseContext<'_>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<DateTime<Utc>>, Error> {
    // every-N generation stops before its end; reach one second past it so
    // an instant exactly at the inclusive end is produced.
    let instants = schedule(context, start, offset(end, Duration::seconds(1))?)?;

    let pending = instants
        .into_iter()
        .filter(|instant| in_window(*instant, start, end, EndBound::Inclusive))
        .filter(|instant| match_dose(*instant, context.administrations) == MatchState::Pending)
        .collect::<Vec<_>>();

    tracing::debug!(
        "Prescription {} has {} pending doses between {} and {}",
        context.prescription.id,
        pending.len(),
        start,
        end
    );
    Ok(pending)
}
