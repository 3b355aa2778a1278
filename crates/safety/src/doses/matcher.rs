use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::records::AdministrationRecord;

/// An administration this close to a scheduled instant satisfies it.
pub const MATCH_TOLERANCE_MINUTES: i64 = 30;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum MatchState {
    Administered,
    Pending,
}

/// The first given administration within tolerance of `scheduled`.
///
/// Records marked not-done never satisfy a dose.
pub fn find_administration<'a>(
    scheduled: DateTime<Utc>,
    administrations: &'a [AdministrationRecord],
) -> Option<&'a AdministrationRecord> {
    let tolerance = Duration::minutes(MATCH_TOLERANCE_MINUTES);
    administrations.iter().find(|record| {
        let offset = record.administered_at - scheduled;
        record.was_given() && offset <= tolerance && offset >= -tolerance
    })
}

pub fn match_dose(scheduled: DateTime<Utc>, administrations: &[AdministrationRecord]) -> MatchState {
    match find_administration(scheduled, administrations) {
        Some(_) => MatchState::Administered,
        None => MatchState::Pending,
    }
}
