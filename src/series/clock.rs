//! Absolute timestamps from period start + resolution + point position.
//!
//! A market document period carries a start instant, a resolution code such as
//! `PT15M`, and 1-based point positions. Point `n` starts at
//! `start + (n - 1) * resolution`.
//!
//! Resolution codes of the form `PT<N>M` and `PT<N>H` are understood. Any other
//! code falls back to a fixed step (60 minutes unless configured otherwise);
//! this is a policy, not an error.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};

use crate::error::{PipelineError, Result};

pub const DEFAULT_FALLBACK_MINUTES: u32 = 60;

/// Parse a resolution code into whole minutes.
///
/// Returns `None` for unrecognized or zero-length codes.
pub fn parse_resolution_minutes(code: &str) -> Option<u32> {
    let rest = code.trim().strip_prefix("PT")?;
    let (digits, factor) = if let Some(d) = rest.strip_suffix('M') {
        (d, 1)
    } else if let Some(d) = rest.strip_suffix('H') {
        (d, 60)
    } else {
        return None;
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let n: u32 = digits.parse().ok()?;
    let minutes = n.checked_mul(factor)?;
    (minutes > 0).then_some(minutes)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolutionClock {
    fallback_minutes: u32,
}

impl Default for ResolutionClock {
    fn default() -> Self {
        Self {
            fallback_minutes: DEFAULT_FALLBACK_MINUTES,
        }
    }
}

impl ResolutionClock {
    /// A clock with a custom fallback step; zero is clamped to one minute.
    pub fn with_fallback_minutes(minutes: u32) -> Self {
        Self {
            fallback_minutes: minutes.max(1),
        }
    }

    pub fn fallback_minutes(&self) -> u32 {
        self.fallback_minutes
    }

    /// Step length for a resolution code, applying the fallback policy.
    pub fn step_minutes(&self, resolution_code: &str) -> u32 {
        parse_resolution_minutes(resolution_code).unwrap_or(self.fallback_minutes)
    }

    /// Absolute start instant of the point at 1-based `position`.
    pub fn resolve(
        &self,
        period_start: DateTime<Utc>,
        resolution_code: &str,
        position: i64,
    ) -> Result<DateTime<Utc>> {
        if position < 1 {
            return Err(PipelineError::MalformedResolution(format!(
                "point position must be >= 1, got {position}"
            )));
        }
        let step = i64::from(self.step_minutes(resolution_code));
        let offset = (position - 1)
            .checked_mul(step)
            .and_then(Duration::try_minutes)
            .ok_or_else(|| {
                PipelineError::MalformedResolution(format!(
                    "position {position} at {step} min overflows the time axis"
                ))
            })?;
        period_start.checked_add_signed(offset).ok_or_else(|| {
            PipelineError::MalformedResolution(format!(
                "position {position} at {step} min overflows the time axis"
            ))
        })
    }
}

/// [`ResolutionClock::resolve`] with the default 60-minute fallback.
pub fn resolve(period_start: DateTime<Utc>, resolution_code: &str, position: i64) -> Result<DateTime<Utc>> {
    ResolutionClock::default().resolve(period_start, resolution_code, position)
}

/// Parse an instant that is always interpreted as UTC.
///
/// Accepts RFC 3339 (`2024-01-01T00:00:00+00:00`), the upstream minute form
/// (`2024-01-01T00:00Z`), the same without `Z`, space-separated variants, and
/// plain dates (midnight).
pub fn parse_utc_instant(raw: &str) -> Result<DateTime<Utc>> {
    let trimmed = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }

    let naive = trimmed.strip_suffix('Z').unwrap_or(trimmed);
    const FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ];
    for fmt in FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(naive, fmt) {
            return Ok(dt.and_utc());
        }
    }
    if let Ok(date) = chrono::NaiveDate::parse_from_str(naive, "%Y-%m-%d") {
        return Ok(date.and_time(chrono::NaiveTime::MIN).and_utc());
    }

    Err(PipelineError::DocumentParse(format!("invalid instant '{trimmed}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 23, 0, 0).unwrap()
    }

    #[test]
    fn quarter_hour_steps() {
        for position in 1..=200 {
            let t = resolve(start(), "PT15M", position).unwrap();
            assert_eq!(t, start() + Duration::minutes(15 * (position - 1)));
        }
    }

    #[test]
    fn hourly_steps() {
        assert_eq!(resolve(start(), "PT60M", 3).unwrap(), start() + Duration::hours(2));
        assert_eq!(resolve(start(), "PT1H", 3).unwrap(), start() + Duration::hours(2));
    }

    #[test]
    fn unrecognized_codes_fall_back_to_an_hour() {
        for code in ["", "P1D", "PT", "PTM", "PT-5M", "PT0M", "PT15S", "garbage", "PT1.5M"] {
            let t = resolve(start(), code, 2).unwrap();
            assert_eq!(t, start() + Duration::minutes(60), "code {code:?}");
        }
    }

    #[test]
    fn fallback_is_configurable() {
        let clock = ResolutionClock::with_fallback_minutes(30);
        assert_eq!(clock.resolve(start(), "P1Y", 3).unwrap(), start() + Duration::minutes(60));
        assert_eq!(clock.step_minutes("PT15M"), 15);
    }

    #[test]
    fn positions_below_one_are_rejected() {
        assert!(matches!(
            resolve(start(), "PT15M", 0),
            Err(PipelineError::MalformedResolution(_))
        ));
        assert!(matches!(
            resolve(start(), "PT15M", -4),
            Err(PipelineError::MalformedResolution(_))
        ));
    }

    #[test]
    fn instants_are_always_utc() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 1, 23, 0, 0).unwrap();
        for raw in [
            "2024-01-01T23:00Z",
            "2024-01-01T23:00",
            "2024-01-01T23:00:00Z",
            "2024-01-01T23:00:00+00:00",
            "2024-01-02T00:00:00+01:00",
            "2024-01-01 23:00",
        ] {
            assert_eq!(parse_utc_instant(raw).unwrap(), expected, "{raw}");
        }
        assert_eq!(
            parse_utc_instant("2024-01-02").unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap()
        );
        assert!(parse_utc_instant("yesterday").is_err());
    }
}
