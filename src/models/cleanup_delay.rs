//! Cleanup delay carried as ISO-8601 duration text.
//!
//! The delay is the elapsed time between a record being scheduled and the
//! moment it becomes eligible for cleanup. It is persisted and returned as the
//! canonical text form (`PT72H`, `PT1H30M`, `PT0.5S`), normalised to hours,
//! minutes and seconds so that `3 days` and `72 hours` encode identically.

use std::{fmt, str::FromStr};

use chrono::TimeDelta;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use thiserror::Error;

const NANOS_PER_SECOND: u32 = 1_000_000_000;
const SECONDS_PER_MINUTE: i64 = 60;
const SECONDS_PER_HOUR: i64 = 3_600;
const SECONDS_PER_DAY: i64 = 86_400;

/// Error returned when a delay string is not a supported ISO-8601 duration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid ISO-8601 duration '{value}': {reason}")]
pub struct ParseDelayError {
    value: String,
    reason: &'static str,
}

impl ParseDelayError {
    fn new(value: &str, reason: &'static str) -> Self {
        Self {
            value: value.to_string(),
            reason,
        }
    }
}

/// Non-negative elapsed time with nanosecond precision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CleanupDelay(TimeDelta);

impl CleanupDelay {
    pub fn from_days(days: u32) -> Self {
        Self(TimeDelta::seconds(i64::from(days) * SECONDS_PER_DAY))
    }

    pub fn from_hours(hours: u32) -> Self {
        Self(TimeDelta::seconds(i64::from(hours) * SECONDS_PER_HOUR))
    }

    pub fn from_secs(secs: u32) -> Self {
        Self(TimeDelta::seconds(i64::from(secs)))
    }

    pub fn as_time_delta(&self) -> TimeDelta {
        self.0
    }
}

impl TryFrom<TimeDelta> for CleanupDelay {
    type Error = ParseDelayError;

    fn try_from(delta: TimeDelta) -> Result<Self, Self::Error> {
        if delta < TimeDelta::zero() {
            return Err(ParseDelayError::new(
                &delta.to_string(),
                "negative delays are not supported",
            ));
        }
        Ok(Self(delta))
    }
}

impl fmt::Display for CleanupDelay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total_secs = self.0.num_seconds();
        let nanos = self.0.subsec_nanos();
        if total_secs == 0 && nanos == 0 {
            return f.write_str("PT0S");
        }

        let hours = total_secs / SECONDS_PER_HOUR;
        let minutes = (total_secs % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE;
        let secs = total_secs % SECONDS_PER_MINUTE;

        f.write_str("PT")?;
        if hours != 0 {
            write!(f, "{}H", hours)?;
        }
        if minutes != 0 {
            write!(f, "{}M", minutes)?;
        }
        if secs != 0 || nanos != 0 {
            if nanos == 0 {
                write!(f, "{}S", secs)?;
            } else {
                let fraction = format!("{:09}", nanos);
                write!(f, "{}.{}S", secs, fraction.trim_end_matches('0'))?;
            }
        }
        Ok(())
    }
}

impl FromStr for CleanupDelay {
    type Err = ParseDelayError;

    /// Parses `P[nD][T[nH][nM][n[.fffffffff]S]]`. Designators are
    /// case-insensitive and must appear in that order.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        parse_iso8601_duration(value)
            .map(Self)
            .map_err(|reason| ParseDelayError::new(value, reason))
    }
}

impl Serialize for CleanupDelay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CleanupDelay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// One `<number><designator>` pair of a duration.
struct Component<'a> {
    whole: &'a str,
    fraction: Option<&'a str>,
    designator: char,
}

fn split_components(part: &str) -> Result<Vec<Component<'_>>, &'static str> {
    let mut components = Vec::new();
    let mut start = 0;
    for (idx, ch) in part.char_indices() {
        if ch.is_ascii_digit() || ch == '.' {
            continue;
        }
        let number = &part[start..idx];
        if number.is_empty() {
            return Err("designator without a number");
        }
        let (whole, fraction) = match number.split_once('.') {
            Some((whole, fraction)) => (whole, Some(fraction)),
            None => (number, None),
        };
        if whole.is_empty() || fraction.is_some_and(|f| f.is_empty() || f.contains('.')) {
            return Err("malformed number");
        }
        components.push(Component {
            whole,
            fraction,
            designator: ch.to_ascii_uppercase(),
        });
        start = idx + ch.len_utf8();
    }
    if start != part.len() {
        return Err("number without a designator");
    }
    Ok(components)
}

fn scaled(whole: &str, unit_secs: i64) -> Result<i64, &'static str> {
    whole
        .parse::<i64>()
        .ok()
        .and_then(|n| n.checked_mul(unit_secs))
        .ok_or("value out of range")
}

fn parse_fraction(fraction: &str) -> Result<u32, &'static str> {
    if fraction.len() > 9 {
        return Err("fractional seconds beyond nanosecond precision");
    }
    let digits: u32 = fraction.parse().map_err(|_| "malformed number")?;
    Ok(digits * 10u32.pow(9 - fraction.len() as u32))
}

fn parse_iso8601_duration(value: &str) -> Result<TimeDelta, &'static str> {
    if value.starts_with('-') {
        return Err("negative delays are not supported");
    }
    let rest = value
        .strip_prefix(['P', 'p'])
        .ok_or("missing 'P' designator")?;

    let (date_part, time_part) = match rest.split_once(['T', 't']) {
        Some((_, "")) => return Err("'T' must be followed by a time component"),
        Some((date, time)) => (date, time),
        None => (rest, ""),
    };
    if date_part.is_empty() && time_part.is_empty() {
        return Err("no duration components");
    }

    let mut total_secs: i64 = 0;
    let mut nanos: u32 = 0;

    for component in split_components(date_part)? {
        if component.designator != 'D' {
            return Err("only days are supported before 'T'");
        }
        if component.fraction.is_some() {
            return Err("only seconds may carry a fraction");
        }
        total_secs = total_secs
            .checked_add(scaled(component.whole, SECONDS_PER_DAY)?)
            .ok_or("value out of range")?;
    }

    // H < M < S; each at most once.
    let mut last_rank = 0;
    for component in split_components(time_part)? {
        let (rank, unit_secs) = match component.designator {
            'H' => (1, SECONDS_PER_HOUR),
            'M' => (2, SECONDS_PER_MINUTE),
            'S' => (3, 1),
            _ => return Err("unknown time designator"),
        };
        if rank <= last_rank {
            return Err("time designators out of order");
        }
        last_rank = rank;

        if let Some(fraction) = component.fraction {
            if component.designator != 'S' {
                return Err("only seconds may carry a fraction");
            }
            nanos = parse_fraction(fraction)?;
        }
        total_secs = total_secs
            .checked_add(scaled(component.whole, unit_secs)?)
            .ok_or("value out of range")?;
    }

    debug_assert!(nanos < NANOS_PER_SECOND);
    TimeDelta::new(total_secs, nanos).ok_or("value out of range")
}
