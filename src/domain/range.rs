//! Date-range presets.
//!
//! All bounds are UTC and day-aligned, matching how the upstream API publishes
//! daily documents.

use chrono::{DateTime, Duration, NaiveTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum RangePreset {
    Today,
    Tomorrow,
    Yesterday,
    #[value(name = "last-7-days")]
    Last7Days,
    #[value(name = "last-30-days")]
    Last30Days,
}

impl RangePreset {
    pub const ALL: [RangePreset; 5] = [
        RangePreset::Today,
        RangePreset::Tomorrow,
        RangePreset::Yesterday,
        RangePreset::Last7Days,
        RangePreset::Last30Days,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            RangePreset::Today => "Today",
            RangePreset::Tomorrow => "Tomorrow",
            RangePreset::Yesterday => "Yesterday",
            RangePreset::Last7Days => "Last 7 Days",
            RangePreset::Last30Days => "Last 30 Days",
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|&p| p == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateRange {
    Preset(RangePreset),
    Custom {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

impl DateRange {
    /// Resolve to `[start, end)` relative to `now`.
    pub fn resolve(self, now: DateTime<Utc>) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
        let today = midnight(now);
        let (start, end) = match self {
            DateRange::Preset(RangePreset::Today) => (today, today + Duration::days(1)),
            DateRange::Preset(RangePreset::Tomorrow) => {
                (today + Duration::days(1), today + Duration::days(2))
            }
            DateRange::Preset(RangePreset::Yesterday) => (today - Duration::days(1), today),
            DateRange::Preset(RangePreset::Last7Days) => (today - Duration::days(7), today),
            DateRange::Preset(RangePreset::Last30Days) => (today - Duration::days(30), today),
            DateRange::Custom { start, end } => (start, end),
        };
        if start >= end {
            return Err(PipelineError::Configuration(format!(
                "date range start {start} must precede end {end}"
            )));
        }
        Ok((start, end))
    }
}

/// True when the window spans at most 24 hours.
pub fn is_single_day(start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    end - start <= Duration::hours(24)
}

fn midnight(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 10, 15, 13, 37, 0).unwrap()
    }

    #[test]
    fn presets_are_day_aligned() {
        let (s, e) = DateRange::Preset(RangePreset::Today).resolve(now()).unwrap();
        assert_eq!(s, Utc.with_ymd_and_hms(2024, 10, 15, 0, 0, 0).unwrap());
        assert_eq!(e, Utc.with_ymd_and_hms(2024, 10, 16, 0, 0, 0).unwrap());

        let (s, e) = DateRange::Preset(RangePreset::Last7Days).resolve(now()).unwrap();
        assert_eq!(s, Utc.with_ymd_and_hms(2024, 10, 8, 0, 0, 0).unwrap());
        assert_eq!(e, Utc.with_ymd_and_hms(2024, 10, 15, 0, 0, 0).unwrap());
    }

    #[test]
    fn single_day_threshold_is_inclusive() {
        let (s, e) = DateRange::Preset(RangePreset::Yesterday).resolve(now()).unwrap();
        assert!(is_single_day(s, e));
        assert!(!is_single_day(s, e + Duration::minutes(15)));
    }

    #[test]
    fn custom_range_must_be_ordered() {
        let t = now();
        let err = DateRange::Custom { start: t, end: t }.resolve(t).unwrap_err();
        assert!(matches!(err, PipelineError::Configuration(_)));
    }
}
