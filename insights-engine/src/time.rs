//! Start/end time expressions and their normalisation to epoch seconds.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer};

use crate::error::InsightsError;

const SECONDS_PER_DAY: f64 = 86_400.0;

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// A point in time as the caller expressed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeSpec {
    /// Absolute epoch seconds.
    Epoch(i64),
    /// Calendar timestamp.
    At(DateTime<Utc>),
    /// Offset from "now"; negative values point to the past.
    Offset(Duration),
}

impl TimeSpec {
    pub fn now() -> Self {
        TimeSpec::Offset(Duration::zero())
    }

    pub fn days_ago(days: i64) -> Self {
        TimeSpec::Offset(-Duration::days(days))
    }

    /// Resolves to epoch seconds relative to `now`.
    ///
    /// Fails when an offset moves `now` outside the representable calendar.
    pub fn normalize(&self, now: DateTime<Utc>) -> Result<i64, InsightsError> {
        match self {
            TimeSpec::Epoch(seconds) => Ok(*seconds),
            TimeSpec::At(at) => Ok(at.timestamp()),
            TimeSpec::Offset(offset) => now
                .checked_add_signed(*offset)
                .map(|at| at.timestamp())
                .ok_or_else(|| InsightsError::InvalidTime {
                    input: self.to_string(),
                    reason: "offset is out of range".to_string(),
                }),
        }
    }

    /// Positive numbers are epoch seconds; zero or negative numbers are days from now.
    pub fn from_number(value: f64) -> Result<Self, InsightsError> {
        let invalid = |reason: &str| InsightsError::InvalidTime {
            input: value.to_string(),
            reason: reason.to_string(),
        };

        if !value.is_finite() {
            return Err(invalid("not a finite number"));
        }
        if value > 0.0 {
            let seconds = value as i64;
            return match Utc.timestamp_opt(seconds, 0).single() {
                Some(_) => Ok(TimeSpec::Epoch(seconds)),
                None => Err(invalid("epoch seconds are out of range")),
            };
        }
        offset_from_seconds(value * SECONDS_PER_DAY)
            .map(TimeSpec::Offset)
            .ok_or_else(|| invalid("day offset is out of range"))
    }
}

/// Saturating float casts land on `i64::MIN`/`MAX`, which `try_seconds` rejects.
fn offset_from_seconds(seconds: f64) -> Option<Duration> {
    if !seconds.is_finite() {
        return None;
    }
    Duration::try_seconds(seconds as i64)
}

impl From<i64> for TimeSpec {
    fn from(value: i64) -> Self {
        TimeSpec::Epoch(value)
    }
}

impl From<DateTime<Utc>> for TimeSpec {
    fn from(value: DateTime<Utc>) -> Self {
        TimeSpec::At(value)
    }
}

impl From<Duration> for TimeSpec {
    fn from(value: Duration) -> Self {
        TimeSpec::Offset(value)
    }
}

impl fmt::Display for TimeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeSpec::Epoch(seconds) => write!(f, "{}", seconds),
            TimeSpec::At(at) => write!(f, "{}", at.to_rfc3339()),
            TimeSpec::Offset(offset) => write!(f, "now{:+}s", offset.num_seconds()),
        }
    }
}

impl FromStr for TimeSpec {
    type Err = InsightsError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        let invalid = |reason: &str| InsightsError::InvalidTime {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        if trimmed.is_empty() {
            return Err(invalid("empty expression"));
        }

        if let Ok(number) = trimmed.parse::<f64>() {
            return TimeSpec::from_number(number).map_err(|_| invalid("number is out of range"));
        }

        if let Some(offset) = parse_offset(trimmed) {
            return offset.map(TimeSpec::Offset).map_err(|reason| invalid(&reason));
        }

        parse_calendar(trimmed)
            .map(TimeSpec::At)
            .ok_or_else(|| invalid("expected epoch seconds, a signed duration or a timestamp"))
    }
}

/// Returns `None` when the input does not look like a duration at all.
fn parse_offset(input: &str) -> Option<Result<Duration, String>> {
    let (negative, body) = match input.as_bytes()[0] {
        b'-' => (true, input[1..].trim_start()),
        b'+' => (false, input[1..].trim_start()),
        _ => (false, input),
    };
    let signed = body.len() != input.len();

    match humantime::parse_duration(body) {
        Ok(duration) => {
            let offset = match Duration::from_std(duration) {
                Ok(offset) => offset,
                Err(err) => return Some(Err(err.to_string())),
            };
            Some(Ok(if negative { -offset } else { offset }))
        }
        Err(err) if signed => Some(Err(err.to_string())),
        Err(_) => None,
    }
}

fn parse_calendar(input: &str) -> Option<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(input) {
        return Some(at.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct OffsetParts {
    #[serde(default)]
    weeks: f64,
    #[serde(default)]
    days: f64,
    #[serde(default)]
    hours: f64,
    #[serde(default)]
    minutes: f64,
    #[serde(default)]
    seconds: f64,
}

impl OffsetParts {
    fn to_offset(&self) -> Option<Duration> {
        offset_from_seconds(
            self.weeks * 7.0 * SECONDS_PER_DAY
                + self.days * SECONDS_PER_DAY
                + self.hours * 3_600.0
                + self.minutes * 60.0
                + self.seconds,
        )
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimeSpec {
    Integer(i64),
    Float(f64),
    Text(String),
    Parts(OffsetParts),
}

impl<'de> Deserialize<'de> for TimeSpec {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match RawTimeSpec::deserialize(deserializer)? {
            RawTimeSpec::Integer(value) => {
                TimeSpec::from_number(value as f64).map_err(serde::de::Error::custom)
            }
            RawTimeSpec::Float(value) => {
                TimeSpec::from_number(value).map_err(serde::de::Error::custom)
            }
            RawTimeSpec::Text(raw) => raw.parse().map_err(serde::de::Error::custom),
            RawTimeSpec::Parts(parts) => parts
                .to_offset()
                .map(TimeSpec::Offset)
                .ok_or_else(|| serde::de::Error::custom("time offset is out of range")),
        }
    }
}
