use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::Error;

use super::FrequencyKind;

const ONCE_DAILY: &[i64] = &[9];
const TWICE_DAILY: &[i64] = &[9, 17];
const THREE_TIMES_DAILY: &[i64] = &[9, 13, 21];
const FOUR_TIMES_DAILY: &[i64] = &[9, 13, 17, 21];

/// Longest accepted every-N interval: one leap year.
pub const MAX_INTERVAL_HOURS: u32 = 24 * 366;

/// Whether a window's end instant counts as inside the window.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum EndBound {
    Inclusive,
    Exclusive,
}

/// Generates the scheduled administration instants for `kind`.
///
/// Fixed-time kinds emit their clock anchors for every day from
/// `window_start`'s date up to the last day starting before `window_end`.
/// Anchors are not clipped to the window; use [`in_window`] for that.
/// `EveryNHours(n)` starts at the first hour of `window_start`'s day that is
/// a multiple of `n` and not earlier than `window_start`'s hour, stepping
/// `n` hours while strictly before `window_end`.
///
/// The output is ascending and free of duplicates. The same arguments
/// always produce the same sequence.
pub fn generate(
    kind: FrequencyKind,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> Result<Vec<DateTime<Utc>>, Error> {
    if window_end <= window_start {
        return Err(Error::invalid_input(format!(
            "schedule window must be positive, got {window_start} to {window_end}"
        )));
    }

    check_interval(kind)?;

    let instants = match kind {
        FrequencyKind::Prn => Vec::new(),
        FrequencyKind::OnceDaily | FrequencyKind::Unspecified => {
            fixed_anchors(ONCE_DAILY, window_start, window_end)
        }
        FrequencyKind::TwiceDaily => fixed_anchors(TWICE_DAILY, window_start, window_end),
        FrequencyKind::ThreeTimesDaily => {
            fixed_anchors(THREE_TIMES_DAILY, window_start, window_end)
        }
        FrequencyKind::FourTimesDaily => fixed_anchors(FOUR_TIMES_DAILY, window_start, window_end),
        FrequencyKind::EveryNHours(n) => every_n_hours(i64::from(n), window_start, window_end),
    };

    tracing::debug!("Generated {} instants for {}", instants.len(), kind);
    Ok(instants)
}

/// Rejects every-N intervals that cannot be scheduled: zero, or longer
/// than [`MAX_INTERVAL_HOURS`].
pub fn check_interval(kind: FrequencyKind) -> Result<(), Error> {
    match kind {
        FrequencyKind::EveryNHours(0) => Err(Error::invalid_input(
            "interval of every-N-hours must be at least 1",
        )),
        FrequencyKind::EveryNHours(n) if n > MAX_INTERVAL_HOURS => Err(Error::invalid_input(
            format!("interval of every-N-hours must be at most {MAX_INTERVAL_HOURS}, got {n}"),
        )),
        _ => Ok(()),
    }
}

/// Tests `instant` against `[start, end]` or `[start, end)`.
pub fn in_window(
    instant: DateTime<Utc>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    bound: EndBound,
) -> bool {
    instant >= start
        && match bound {
            EndBound::Inclusive => instant <= end,
            EndBound::Exclusive => instant < end,
        }
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

fn fixed_anchors(
    hours: &[i64],
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> Vec<DateTime<Utc>> {
    let mut instants = Vec::new();
    let mut day = Some(window_start.date_naive());

    while let Some(date) = day {
        let day_start = midnight(date);
        if day_start >= window_end {
            break;
        }
        instants.extend(
            hours
                .iter()
                .filter_map(|hour| day_start.checked_add_signed(Duration::hours(*hour))),
        );
        day = date.succ_opt();
    }

    instants
}

fn every_n_hours(
    n: i64,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> Vec<DateTime<Utc>> {
    let day_start = midnight(window_start.date_naive());
    let start_hour = i64::from(window_start.hour());
    let first_hour = (start_hour + n - 1) / n * n;

    // No multiple of n left today: continue at the next midnight.
    let first = if first_hour >= 24 {
        day_start.checked_add_signed(Duration::days(1))
    } else {
        day_start.checked_add_signed(Duration::hours(first_hour))
    };

    let step = Duration::hours(n);
    let mut instants = Vec::new();
    let mut next = first;
    // Stepping past the last representable instant ends the sequence.
    while let Some(instant) = next.filter(|instant| *instant < window_end) {
        instants.push(instant);
        next = instant.checked_add_signed(step);
    }
    instants
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, hour, minute, 0).unwrap()
    }

    #[test]
    fn prn_is_never_scheduled() {
        let instants = generate(FrequencyKind::Prn, at(10, 0, 0), at(20, 0, 0)).unwrap();
        assert!(instants.is_empty());
    }

    #[test]
    fn twice_daily_anchors_for_single_day() {
        let instants = generate(FrequencyKind::TwiceDaily, at(10, 0, 0), at(11, 0, 0)).unwrap();
        assert_eq!(instants, vec![at(10, 9, 0), at(10, 17, 0)]);
    }

    #[test]
    fn fixed_anchors_per_kind() {
        let start = at(10, 0, 0);
        let end = at(11, 0, 0);
        assert_eq!(
            generate(FrequencyKind::OnceDaily, start, end).unwrap(),
            vec![at(10, 9, 0)]
        );
        assert_eq!(
            generate(FrequencyKind::Unspecified, start, end).unwrap(),
            vec![at(10, 9, 0)]
        );
        assert_eq!(
            generate(FrequencyKind::ThreeTimesDaily, start, end).unwrap(),
            vec![at(10, 9, 0), at(10, 13, 0), at(10, 21, 0)]
        );
        assert_eq!(
            generate(FrequencyKind::FourTimesDaily, start, end).unwrap(),
            vec![at(10, 9, 0), at(10, 13, 0), at(10, 17, 0), at(10, 21, 0)]
        );
    }

    #[test]
    fn anchors_are_not_clipped_to_window() {
        let instants = generate(FrequencyKind::TwiceDaily, at(10, 12, 0), at(10, 13, 0)).unwrap();
        assert_eq!(instants, vec![at(10, 9, 0), at(10, 17, 0)]);
    }

    #[test]
    fn anchors_span_multiple_days() {
        let instants = generate(FrequencyKind::OnceDaily, at(10, 20, 0), at(12, 8, 0)).unwrap();
        assert_eq!(instants, vec![at(10, 9, 0), at(11, 9, 0), at(12, 9, 0)]);
    }

    #[test]
    fn every_six_hours_over_a_day() {
        let instants = generate(FrequencyKind::EveryNHours(6), at(10, 0, 0), at(11, 0, 0)).unwrap();
        assert_eq!(instants.len(), 4);
        for pair in instants.windows(2) {
            assert_eq!(pair[1] - pair[0], Duration::hours(6));
        }
        assert_eq!(instants[0], at(10, 0, 0));
    }

    #[test]
    fn every_n_starts_at_next_multiple_of_n() {
        let instants = generate(FrequencyKind::EveryNHours(4), at(10, 9, 45), at(10, 20, 0)).unwrap();
        assert_eq!(instants, vec![at(10, 12, 0), at(10, 16, 0)]);
    }

    #[test]
    fn every_n_keeps_hour_when_already_a_multiple() {
        let instants = generate(FrequencyKind::EveryNHours(6), at(10, 12, 30), at(10, 19, 0)).unwrap();
        assert_eq!(instants, vec![at(10, 12, 0), at(10, 18, 0)]);
    }

    #[test]
    fn every_n_rolls_over_to_next_midnight() {
        let instants = generate(FrequencyKind::EveryNHours(10), at(10, 21, 0), at(11, 12, 0)).unwrap();
        assert_eq!(instants, vec![at(11, 0, 0), at(11, 10, 0)]);
    }

    #[test]
    fn rejects_zero_interval() {
        let result = generate(FrequencyKind::EveryNHours(0), at(10, 0, 0), at(11, 0, 0));
        assert!(matches!(result, Err(Error::InvalidInput { .. })));
    }

    #[test]
    fn rejects_oversized_interval() {
        let result = generate(FrequencyKind::EveryNHours(3_000_000_000), at(10, 0, 0), at(11, 0, 0));
        assert!(matches!(result, Err(Error::InvalidInput { .. })));

        let longest = generate(
            FrequencyKind::EveryNHours(MAX_INTERVAL_HOURS),
            at(10, 0, 0),
            at(11, 0, 0),
        )
        .unwrap();
        assert_eq!(longest, vec![at(10, 0, 0)]);
    }

    #[test]
    fn stops_at_the_last_representable_instant() {
        let start = DateTime::<Utc>::MAX_UTC - Duration::hours(30);
        let instants = generate(FrequencyKind::EveryNHours(12), start, DateTime::<Utc>::MAX_UTC).unwrap();
        assert!(!instants.is_empty());
        assert!(instants.windows(2).all(|pair| pair[1] - pair[0] == Duration::hours(12)));
    }

    #[test]
    fn rejects_empty_or_negative_window() {
        assert!(matches!(
            generate(FrequencyKind::OnceDaily, at(10, 0, 0), at(10, 0, 0)),
            Err(Error::InvalidInput { .. })
        ));
        assert!(matches!(
            generate(FrequencyKind::OnceDaily, at(11, 0, 0), at(10, 0, 0)),
            Err(Error::InvalidInput { .. })
        ));
    }

    #[test]
    fn generation_is_repeatable() {
        let first = generate(FrequencyKind::FourTimesDaily, at(10, 6, 0), at(12, 6, 0)).unwrap();
        let second = generate(FrequencyKind::FourTimesDaily, at(10, 6, 0), at(12, 6, 0)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn window_bounds() {
        let start = at(10, 9, 0);
        let end = at(10, 17, 0);
        assert!(in_window(start, start, end, EndBound::Exclusive));
        assert!(in_window(end, start, end, EndBound::Inclusive));
        assert!(!in_window(end, start, end, EndBound::Exclusive));
        assert!(!in_window(at(10, 8, 59), start, end, EndBound::Inclusive));
    }
}
