use serde::{Deserialize, Serialize};

use crate::records::Medication;

const CRITICAL_AFTER_MINUTES: i64 = 120;
const HIGH_FROM_MINUTES: i64 = 60;
const MEDIUM_AFTER_MINUTES: i64 = 30;

/// How late an overdue dose is.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, Eq, PartialEq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum OverdueSeverity {
    Critical,
    High,
    Medium,
    Normal,
}

impl OverdueSeverity {
    /// Sort rank, most urgent first.
    pub fn rank(&self) -> u8 {
        match self {
            OverdueSeverity::Critical => 0,
            OverdueSeverity::High => 1,
            OverdueSeverity::Medium => 2,
            OverdueSeverity::Normal => 3,
        }
    }
}

/// Maps minutes overdue to a tier: over 120 is critical, 60 and over is
/// high, over 30 is medium.
pub fn classify_lateness(overdue_minutes: i64) -> OverdueSeverity {
    if overdue_minutes > CRITICAL_AFTER_MINUTES {
        OverdueSeverity::Critical
    } else if overdue_minutes >= HIGH_FROM_MINUTES {
        OverdueSeverity::High
    } else if overdue_minutes > MEDIUM_AFTER_MINUTES {
        OverdueSeverity::Medium
    } else {
        OverdueSeverity::Normal
    }
}

/// A late high-alert medication at high or critical tier needs escalation.
pub fn requires_escalation(severity: OverdueSeverity, medication: &Medication) -> bool {
    medication.is_high_alert
        && matches!(severity, OverdueSeverity::Critical | OverdueSeverity::High)
}
