//! Calendar convention and wire timestamp parsing.
//!
//! Every instant is held as `DateTime<Utc>`. Calendar questions (which date,
//! which hour of the day, weekday or weekend) are answered in exactly one
//! reference offset, the [`Calendar`]. The default calendar is UTC.
//!
//! Wire timestamps come in two forms:
//! - **aware**: RFC 3339 with an explicit offset (`2024-03-04T08:00:00Z`),
//!   converted to UTC as given;
//! - **naive**: no offset (`2024-03-04T08:00:00`, `2024-03-04`), read as wall
//!   clock time in the calendar offset.
//!
//! One [`TimestampParser`] is used per request and rejects a request that
//! mixes both forms.

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset,
    TimeZone, Timelike, Utc, Weekday,
};

use crate::error::{InsightError, Result};

/// Reference offset used for every date, hour and weekday computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calendar {
    offset: FixedOffset,
}

impl Default for Calendar {
    fn default() -> Self {
        Self::utc()
    }
}

impl Calendar {
    pub fn utc() -> Self {
        Self { offset: Utc.fix() }
    }

    /// Calendar at a fixed offset east of UTC, in minutes.
    pub fn with_offset_minutes(minutes: i32) -> Result<Self> {
        let offset = minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                InsightError::invalid_input(format!(
                    "calendar offset of {minutes} minutes is out of range"
                ))
            })?;
        Ok(Self { offset })
    }

    pub fn offset_minutes(&self) -> i32 {
        self.offset.local_minus_utc() / 60
    }

    pub fn local(&self, ts: &DateTime<Utc>) -> DateTime<FixedOffset> {
        ts.with_timezone(&self.offset)
    }

    pub fn date_of(&self, ts: &DateTime<Utc>) -> NaiveDate {
        self.local(ts).date_naive()
    }

    pub fn hour_of(&self, ts: &DateTime<Utc>) -> u32 {
        self.local(ts).hour()
    }

    pub fn is_weekend(&self, ts: &DateTime<Utc>) -> bool {
        is_weekend_date(self.date_of(ts))
    }

    /// Convert calendar wall-clock time to an instant.
    pub fn from_local(&self, naive: NaiveDateTime) -> DateTime<Utc> {
        let shift = Duration::seconds(i64::from(self.offset.local_minus_utc()));
        Utc.from_utc_datetime(&(naive - shift))
    }

    /// First instant of `date` in this calendar.
    pub fn start_of_day(&self, date: NaiveDate) -> DateTime<Utc> {
        self.from_local(date.and_time(NaiveTime::MIN))
    }

    /// Formats an instant as calendar-local `YYYY-MM-DD HH:MM`.
    pub fn format_minute(&self, ts: &DateTime<Utc>) -> String {
        self.local(ts).format("%Y-%m-%d %H:%M").to_string()
    }

    /// Formats an instant as calendar-local `HH:MM`.
    pub fn format_clock(&self, ts: &DateTime<Utc>) -> String {
        self.local(ts).format("%H:%M").to_string()
    }
}

pub fn is_weekend_date(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

// ── Wire parsing ──────────────────────────────────────────────

/// Which of the two accepted wire forms a timestamp used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampForm {
    Aware,
    Naive,
}

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parses the timestamps of one request and enforces a single form.
#[derive(Debug, Clone)]
pub struct TimestampParser {
    calendar: Calendar,
    form: Option<TimestampForm>,
}

impl TimestampParser {
    pub fn new(calendar: Calendar) -> Self {
        Self {
            calendar,
            form: None,
        }
    }

    /// Form seen so far, `None` before the first timestamp.
    pub fn form(&self) -> Option<TimestampForm> {
        self.form
    }

    /// Parse `raw` (named `field` in error messages) into a UTC instant.
    pub fn parse(&mut self, field: &str, raw: &str) -> Result<DateTime<Utc>> {
        let raw = raw.trim();
        let (instant, form) = if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            (dt.with_timezone(&Utc), TimestampForm::Aware)
        } else if let Some(naive) = parse_naive(raw) {
            (self.calendar.from_local(naive), TimestampForm::Naive)
        } else {
            return Err(InsightError::invalid_input(format!(
                "{field}: unrecognised timestamp '{raw}'"
            )));
        };

        match self.form {
            None => self.form = Some(form),
            Some(seen) if seen != form => {
                return Err(InsightError::invalid_input(format!(
                    "{field}: timestamp '{raw}' mixes timezone-naive and timezone-aware forms"
                )));
            }
            Some(_) => {}
        }

        Ok(instant)
    }
}

fn parse_naive(raw: &str) -> Option<NaiveDateTime> {
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

/// Parse a calendar date (`YYYY-MM-DD`).
pub fn parse_date(field: &str, raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        InsightError::invalid_input(format!("{field}: expected a YYYY-MM-DD date, got '{raw}'"))
    })
}
