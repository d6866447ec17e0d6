//! Inclusive date windows and the window selector.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{InsightError, Result};
use crate::event::Timestamped;
use crate::time::Calendar;

/// Calendar-date range, inclusive at both ends. `start == end` is one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Window {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        let window = Self { start, end };
        window.validate()?;
        Ok(window)
    }

    pub fn single_day(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.start > self.end {
            return Err(InsightError::InvalidWindow {
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }

    /// Smallest window covering the calendar dates of `instants`.
    pub fn spanning<I>(calendar: &Calendar, instants: I) -> Option<Self>
    where
        I: IntoIterator<Item = DateTime<Utc>>,
    {
        instants.into_iter().fold(None, |acc, ts| {
            let date = calendar.date_of(&ts);
            Some(match acc {
                None => Window::single_day(date),
                Some(w) => Window {
                    start: w.start.min(date),
                    end: w.end.max(date),
                },
            })
        })
    }

    pub fn num_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Saturdays and Sundays in the window, counted from whole weeks plus
    /// the trailing partial week.
    pub fn weekend_days(&self) -> i64 {
        let total = self.num_days();
        let first = i64::from(self.start.weekday().num_days_from_monday());
        let partial = (0..total % 7).filter(|k| (first + k) % 7 >= 5).count() as i64;
        total / 7 * 2 + partial
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn contains(&self, calendar: &Calendar, ts: &DateTime<Utc>) -> bool {
        self.contains_date(calendar.date_of(ts))
    }

    /// Half-open instant range: first instant of `start` up to the first
    /// instant of the day after `end`.
    pub fn bounds(&self, calendar: &Calendar) -> (DateTime<Utc>, DateTime<Utc>) {
        let after_end = self.end.succ_opt().unwrap_or(NaiveDate::MAX);
        (
            calendar.start_of_day(self.start),
            calendar.start_of_day(after_end),
        )
    }

    /// Instant splitting the window into two equal halves.
    pub fn midpoint(&self, calendar: &Calendar) -> DateTime<Utc> {
        let (start, end) = self.bounds(calendar);
        start + (end - start) / 2
    }
}

impl std::fmt::Display for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

/// Events whose timestamp falls inside `window`, in their original order.
pub fn select_window<T>(events: &[T], window: &Window, calendar: &Calendar) -> Result<Vec<T>>
where
    T: Timestamped + Clone,
{
    window.validate()?;
    Ok(events
        .iter()
        .filter(|e| window.contains(calendar, &e.timestamp()))
        .cloned()
        .collect())
}
