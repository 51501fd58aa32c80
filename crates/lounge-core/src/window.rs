//! # Time Windows
//!
//! A report window is a calendar date range combined with a time-of-day
//! range. The time-of-day range may wrap past midnight, modelling a business
//! day such as 22:00-04:00.
//!
//! ## Matching Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Normal (t_from ≤ t_to):                                               │
//! │    date ∈ [from, to]  AND  time ∈ [t_from, t_to]                       │
//! │                                                                         │
//! │  Wrapping (t_from > t_to), e.g. 22:00-04:00 over Jan 1-3:              │
//! │                                                                         │
//! │   Jan 1        Jan 2        Jan 3        Jan 4                         │
//! │   ──────┬██████┼──────┬█████┼──────┬█████┼──────                       │
//! │       22:00  04:00  22:00  04:00  22:00  04:00                         │
//! │                                                                         │
//! │    (date ∈ [from, to]     AND time ≥ t_from)                           │
//! │ OR (date ∈ [from+1, to+1] AND time ≤ t_to)                             │
//! │                                                                         │
//! │  t_from == t_to is the normal case and matches that instant only.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The SQL rendering ([`TimeWindow::predicate`]) and the in-memory check
//! ([`TimeWindow::contains`]) implement the same rules; every report query
//! goes through the former.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::validation::ValidationResult;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";

// =============================================================================
// Time Window
// =============================================================================

/// Date range plus a time-of-day range that may wrap past midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TimeWindow {
    #[ts(as = "String")]
    pub date_from: NaiveDate,
    #[ts(as = "String")]
    pub date_to: NaiveDate,
    #[ts(as = "String")]
    pub time_from: NaiveTime,
    #[ts(as = "String")]
    pub time_to: NaiveTime,
}

/// A SQL condition with its positional parameters, in bind order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    pub sql: String,
    pub params: Vec<String>,
}

impl TimeWindow {
    /// Creates a window; the date range must not be reversed.
    pub fn new(
        date_from: NaiveDate,
        date_to: NaiveDate,
        time_from: NaiveTime,
        time_to: NaiveTime,
    ) -> ValidationResult<Self> {
        if date_to < date_from {
            return Err(ValidationError::EmptyInterval {
                field: "date range".to_string(),
            });
        }
        Ok(TimeWindow {
            date_from,
            date_to,
            time_from: truncate(time_from),
            time_to: truncate(time_to),
        })
    }

    /// Whole calendar days, both ends included.
    pub fn all_day(date_from: NaiveDate, date_to: NaiveDate) -> ValidationResult<Self> {
        let end_of_day = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
        Self::new(date_from, date_to, NaiveTime::MIN, end_of_day)
    }

    /// True when the time-of-day range crosses midnight.
    #[inline]
    pub fn wraps_midnight(&self) -> bool {
        self.time_from > self.time_to
    }

    /// Number of calendar days in the date range.
    pub fn day_count(&self) -> i64 {
        (self.date_to - self.date_from).num_days() + 1
    }

    /// The window of equal length immediately preceding this one, with the
    /// same time-of-day range.
    ///
    /// ```rust
    /// use chrono::NaiveDate;
    /// use lounge_core::TimeWindow;
    ///
    /// let d = |day| NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
    /// let prev = TimeWindow::all_day(d(8), d(14)).unwrap().previous();
    /// assert_eq!((prev.date_from, prev.date_to), (d(1), d(7)));
    /// ```
    pub fn previous(&self) -> Self {
        let span = self.date_to - self.date_from;
        let prev_to = self.date_from - Duration::days(1);
        TimeWindow {
            date_from: prev_to - span,
            date_to: prev_to,
            ..*self
        }
    }

    /// Renders the window as a SQL condition over `column`.
    ///
    /// `column` is interpolated verbatim and must be a trusted identifier;
    /// all values are bound as parameters.
    ///
    /// ```rust
    /// use chrono::{NaiveDate, NaiveTime};
    /// use lounge_core::TimeWindow;
    ///
    /// let w = TimeWindow::new(
    ///     NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
    ///     NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
    ///     NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
    ///     NaiveTime::from_hms_opt(4, 0, 0).unwrap(),
    /// )
    /// .unwrap();
    /// let p = w.predicate("b.start_time");
    /// assert_eq!(p.params, ["2024-01-01", "2024-01-03", "22:00:00", "2024-01-02", "2024-01-04", "04:00:00"]);
    /// ```
    pub fn predicate(&self, column: &str) -> Predicate {
        let from = self.date_from.format(DATE_FORMAT).to_string();
        let to = self.date_to.format(DATE_FORMAT).to_string();
        let t_from = self.time_from.format(TIME_FORMAT).to_string();
        let t_to = self.time_to.format(TIME_FORMAT).to_string();

        if !self.wraps_midnight() {
            return Predicate {
                sql: format!(
                    "(DATE({column}) BETWEEN ? AND ? AND TIME({column}) BETWEEN ? AND ?)"
                ),
                params: vec![from, to, t_from, t_to],
            };
        }

        let shifted_from = next_day(self.date_from).format(DATE_FORMAT).to_string();
        let shifted_to = next_day(self.date_to).format(DATE_FORMAT).to_string();
        Predicate {
            sql: format!(
                "((DATE({column}) BETWEEN ? AND ? AND TIME({column}) >= ?) \
                 OR (DATE({column}) BETWEEN ? AND ? AND TIME({column}) <= ?))"
            ),
            params: vec![from, to, t_from, shifted_from, shifted_to, t_to],
        }
    }

    /// In-memory counterpart of [`predicate`](Self::predicate).
    /// Sub-second precision is ignored, like SQLite's `TIME()`.
    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        let date = ts.date();
        let time = truncate(ts.time());

        if !self.wraps_midnight() {
            return self.in_dates(date) && time >= self.time_from && time <= self.time_to;
        }

        (self.in_dates(date) && time >= self.time_from)
            || (date >= next_day(self.date_from)
                && date <= next_day(self.date_to)
                && time <= self.time_to)
    }

    /// Business day `ts` belongs to. In a window that wraps past midnight
    /// the early-morning half belongs to the previous date.
    ///
    /// ```rust
    /// use chrono::{NaiveDate, NaiveTime};
    /// use lounge_core::TimeWindow;
    ///
    /// let d = |day| NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
    /// let night = TimeWindow::new(
    ///     d(1),
    ///     d(3),
    ///     NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
    ///     NaiveTime::from_hms_opt(4, 0, 0).unwrap(),
    /// )
    /// .unwrap();
    /// assert_eq!(night.business_date(d(2).and_hms_opt(23, 30, 0).unwrap()), d(2));
    /// assert_eq!(night.business_date(d(3).and_hms_opt(1, 0, 0).unwrap()), d(2));
    /// ```
    pub fn business_date(&self, ts: NaiveDateTime) -> NaiveDate {
        if self.wraps_midnight() && truncate(ts.time()) <= self.time_to {
            ts.date() - Duration::days(1)
        } else {
            ts.date()
        }
    }

    fn in_dates(&self, date: NaiveDate) -> bool {
        date >= self.date_from && date <= self.date_to
    }
}

fn truncate(t: NaiveTime) -> NaiveTime {
    t.with_nanosecond(0).unwrap_or(t)
}

fn next_day(d: NaiveDate) -> NaiveDate {
    d.succ_opt().unwrap_or(d)
}

// =============================================================================
// Parsing & Business Day
// =============================================================================

/// Parses `HH:MM` or `HH:MM:SS`.
pub fn parse_time_of_day(field: &str, value: &str) -> ValidationResult<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .map_err(|_| ValidationError::format(field, format!("expected HH:MM or HH:MM:SS, got '{value}'")))
}

/// Parses `YYYY-MM-DD`.
pub fn parse_date(field: &str, value: &str) -> ValidationResult<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|_| ValidationError::format(field, format!("expected YYYY-MM-DD, got '{value}'")))
}

/// Length in hours of the business day between `open` and `close`.
///
/// A closing time earlier than the opening time wraps into the next day;
/// equal times mean the venue is open around the clock.
///
/// ```rust
/// use chrono::NaiveTime;
/// use lounge_core::window::business_day_hours;
///
/// let t = |h| NaiveTime::from_hms_opt(h, 0, 0).unwrap();
/// assert_eq!(business_day_hours(t(12), t(2)), 14.0);
/// assert_eq!(business_day_hours(t(10), t(22)), 12.0);
/// ```
pub fn business_day_hours(open: NaiveTime, close: NaiveTime) -> f64 {
    let mut minutes = (close - open).num_minutes();
    if minutes <= 0 {
        minutes += 24 * 60;
    }
    minutes as f64 / 60.0
}

// =============================================================================
// Unit Tests
// =============================================================================
