/// Scheduled dose to administration matching
pub mod matcher;

/// Lateness severity tiers
pub mod severity;

/// Due, overdue and day-schedule list builders
pub mod lists;

/// Repository-backed dose monitor
pub mod monitor;

pub use lists::{
    day_schedule, due_items, overdue_items, sort_overdue, DoseContext, DoseStatus, DoseSummary,
    DueItem, OverdueItem, ScheduledDose,
};
pub use matcher::{find_administration, match_dose, MatchState, MATCH_TOLERANCE_MINUTES};
pub use monitor::DoseMonitor;
pub use severity::{classify_lateness, requires_escalation, OverdueSeverity};
