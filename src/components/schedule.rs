//! Recurrence math for reminder notifications.
//!
//! `next_occurrence` is a pure function over `(base, frequency, now)`:
//! no I/O, no globals, deterministic. Everything else in the engine that
//! needs a future fire instant goes through it.

use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};

/// Minimum distance into the future, in minutes, for any computed
/// occurrence. The OS is free to deliver a freshly registered trigger
/// with variable latency; a save must never fire a notification right
/// back at the user.
pub const MIN_FUTURE_MARGIN_MINUTES: i64 = 5;

/// How often a reminder repeats.
///
/// The hourly cadences keep a fixed phase anchored to the original base
/// instant; the day and month cadences re-anchor to today's date at the
/// base time-of-day on every recompute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Frequency {
    Once,
    #[serde(rename = "EVERY_8_HOURS")]
    Every8Hours,
    #[serde(rename = "EVERY_12_HOURS")]
    Every12Hours,
    Daily,
    EveryTwoDays,
    EveryThreeDays,
    Weekly,
    Monthly,
}

impl Frequency {
    pub const ALL: [Frequency; 8] = [
        Frequency::Once,
        Frequency::Every8Hours,
        Frequency::Every12Hours,
        Frequency::Daily,
        Frequency::EveryTwoDays,
        Frequency::EveryThreeDays,
        Frequency::Weekly,
        Frequency::Monthly,
    ];

    pub fn is_recurring(&self) -> bool {
        !matches!(self, Frequency::Once)
    }

    /// Wire name, matching the values stored on reminder records.
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Once => "ONCE",
            Frequency::Every8Hours => "EVERY_8_HOURS",
            Frequency::Every12Hours => "EVERY_12_HOURS",
            Frequency::Daily => "DAILY",
            Frequency::EveryTwoDays => "EVERY_TWO_DAYS",
            Frequency::EveryThreeDays => "EVERY_THREE_DAYS",
            Frequency::Weekly => "WEEKLY",
            Frequency::Monthly => "MONTHLY",
        }
    }

    /// Fixed-phase hour step for the hourly cadences.
    fn hour_step(&self) -> Option<i64> {
        match self {
            Frequency::Every8Hours => Some(8),
            Frequency::Every12Hours => Some(12),
            _ => None,
        }
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A frequency string the engine does not recognize. Parsing is the
/// defensive boundary: the calculator itself is total over the enum.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized frequency: {0}")]
pub struct UnknownFrequency(pub String);

impl std::str::FromStr for Frequency {
    type Err = UnknownFrequency;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Frequency::ALL
            .into_iter()
            .find(|frequency| frequency.as_str() == s)
            .ok_or_else(|| UnknownFrequency(s.to_string()))
    }
}

/// Compute the next valid fire instant for a reminder, always strictly
/// beyond `now` plus the minimum-future margin.
///
/// - `Once`: the base instant unchanged if it is comfortably future,
///   otherwise `None`: the moment already passed or is imminent and
///   nothing should be registered.
/// - `Every8Hours` / `Every12Hours`: step forward from `base` in whole
///   cycles until past the margin. The cadence stays phase-locked to the
///   original base across repeated recomputes.
/// - `Daily` through `Monthly`: anchor at today's date at the base
///   time-of-day, then step forward until past the margin, so every
///   recompute targets the next eligible day boundary from now. Monthly
///   steps clamp to the end of shorter months.
pub fn next_occurrence(
    base: DateTime<Utc>,
    frequency: Frequency,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    let min_future = now + Duration::minutes(MIN_FUTURE_MARGIN_MINUTES);

    if frequency == Frequency::Once {
        return (base > min_future).then_some(base);
    }

    let mut next = if frequency.hour_step().is_some() {
        base
    } else {
        now.date_naive().and_time(base.time()).and_utc()
    };
    while next <= min_future {
        next = advance_one_cycle(next, frequency)?;
    }
    Some(next)
}

fn advance_one_cycle(from: DateTime<Utc>, frequency: Frequency) -> Option<DateTime<Utc>> {
    match frequency {
        Frequency::Once => None,
        Frequency::Every8Hours => Some(from + Duration::hours(8)),
        Frequency::Every12Hours => Some(from + Duration::hours(12)),
        Frequency::Daily => Some(from + Duration::days(1)),
        Frequency::EveryTwoDays => Some(from + Duration::days(2)),
        Frequency::EveryThreeDays => Some(from + Duration::days(3)),
        Frequency::Weekly => Some(from + Duration::days(7)),
        Frequency::Monthly => from.checked_add_months(Months::new(1)),
    }
}
