use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// "every 6 hours", "every 8 hrs", "every six hours"
static EVERY_N_HOURS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bevery\s+(\w+)\s*(?:hours?|hrs?|h)\b").expect("valid every-N-hours pattern")
});

/// "q6h", "Q 4 hr", "q12 hours"
static Q_N_HOURS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bq\s*(\d+)\s*(?:hours?|hrs?|h)\b").expect("valid qNh pattern")
});

/// Canonical administration frequency.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, Eq, PartialEq, Hash)]
#[serde(tag = "kind", content = "hours", rename_all = "snake_case")]
pub enum FrequencyKind {
    OnceDaily,
    TwiceDaily,
    ThreeTimesDaily,
    FourTimesDaily,
    EveryNHours(u32),
    /// As needed; never scheduled.
    Prn,
    /// Nothing recognised. Scheduled like [`FrequencyKind::OnceDaily`].
    Unspecified,
}

impl fmt::Display for FrequencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrequencyKind::OnceDaily => f.write_str("once daily"),
            FrequencyKind::TwiceDaily => f.write_str("twice daily"),
            FrequencyKind::ThreeTimesDaily => f.write_str("three times daily"),
            FrequencyKind::FourTimesDaily => f.write_str("four times daily"),
            FrequencyKind::EveryNHours(n) => write!(f, "every {n} hours"),
            FrequencyKind::Prn => f.write_str("as needed"),
            FrequencyKind::Unspecified => f.write_str("unspecified"),
        }
    }
}

enum EveryN {
    Hours(u32),
    Unparseable,
    Absent,
}

/// Classifies a free-text dosing frequency.
///
/// Matching is case-insensitive and the first rule that matches wins:
/// as-needed, every N hours, four, three, two times daily, then daily.
/// An every-N pattern whose N does not parse resolves to
/// [`FrequencyKind::Unspecified`].
pub fn classify(frequency: &str) -> FrequencyKind {
    let text = frequency.to_lowercase();

    if text.contains("prn") || text.contains("as needed") {
        return FrequencyKind::Prn;
    }

    match every_n_hours(&text) {
        EveryN::Hours(n) => return FrequencyKind::EveryNHours(n),
        EveryN::Unparseable => {
            tracing::warn!("Unparseable interval in frequency '{}'", frequency);
            return FrequencyKind::Unspecified;
        }
        EveryN::Absent => {}
    }

    if text.contains("qid") || text.contains("four times daily") {
        FrequencyKind::FourTimesDaily
    } else if text.contains("tid") || text.contains("three times daily") {
        FrequencyKind::ThreeTimesDaily
    } else if text.contains("bid") || text.contains("twice daily") {
        FrequencyKind::TwiceDaily
    } else if text.contains("daily") {
        FrequencyKind::OnceDaily
    } else {
        FrequencyKind::Unspecified
    }
}

fn every_n_hours(text: &str) -> EveryN {
    let group = EVERY_N_HOURS
        .captures(text)
        .or_else(|| Q_N_HOURS.captures(text))
        .and_then(|captures| captures.get(1));

    match group {
        Some(n) => match n.as_str().parse::<u32>() {
            Ok(hours) => EveryN::Hours(hours),
            Err(_) => EveryN::Unparseable,
        },
        None => EveryN::Absent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn as_needed_wins_over_everything() {
        assert_eq!(classify("PRN"), FrequencyKind::Prn);
        assert_eq!(classify("daily prn for pain"), FrequencyKind::Prn);
        assert_eq!(classify("every 4 hours as needed"), FrequencyKind::Prn);
        assert_eq!(classify("BID as needed"), FrequencyKind::Prn);
    }

    #[test]
    fn every_n_hours_extracts_interval() {
        assert_eq!(classify("every 6 hours"), FrequencyKind::EveryNHours(6));
        assert_eq!(classify("Every 8 Hours"), FrequencyKind::EveryNHours(8));
        assert_eq!(classify("every 12 hrs"), FrequencyKind::EveryNHours(12));
        assert_eq!(classify("q4h"), FrequencyKind::EveryNHours(4));
        assert_eq!(classify("Q 6 hours"), FrequencyKind::EveryNHours(6));
    }

    #[test]
    fn every_n_hours_wins_over_daily_cues() {
        assert_eq!(classify("every 12 hours daily"), FrequencyKind::EveryNHours(12));
    }

    #[test]
    fn unparseable_interval_is_unspecified() {
        assert_eq!(classify("every six hours"), FrequencyKind::Unspecified);
        assert_eq!(
            classify("every 99999999999 hours daily"),
            FrequencyKind::Unspecified
        );
    }

    #[test]
    fn times_daily_precedence() {
        assert_eq!(classify("QID"), FrequencyKind::FourTimesDaily);
        assert_eq!(classify("four times daily"), FrequencyKind::FourTimesDaily);
        assert_eq!(classify("tid with meals"), FrequencyKind::ThreeTimesDaily);
        assert_eq!(classify("Three times daily"), FrequencyKind::ThreeTimesDaily);
        assert_eq!(classify("Take one tablet BID"), FrequencyKind::TwiceDaily);
        assert_eq!(classify("twice daily"), FrequencyKind::TwiceDaily);
        assert_eq!(classify("once daily"), FrequencyKind::OnceDaily);
        assert_eq!(classify("DAILY"), FrequencyKind::OnceDaily);
    }

    #[test]
    fn unknown_text_is_unspecified() {
        assert_eq!(classify(""), FrequencyKind::Unspecified);
        assert_eq!(classify("with breakfast"), FrequencyKind::Unspecified);
        assert_eq!(classify("every hour"), FrequencyKind::Unspecified);
    }

    #[test]
    fn serializes_with_interval() {
        let json = serde_json::to_value(FrequencyKind::EveryNHours(6)).unwrap();
        assert_eq!(json, serde_json::json!({ "kind": "every_n_hours", "hours": 6 }));
        let json = serde_json::to_value(FrequencyKind::TwiceDaily).unwrap();
        assert_eq!(json, serde_json::json!({ "kind": "twice_daily" }));
    }
}
