//! # Report Parameters
//!
//! Turns the raw query-string style parameters a boundary receives into a
//! validated [`ReportQuery`].
//!
//! ## Defaults
//! | Parameter | Default          |
//! |-----------|------------------|
//! | `from`    | today − 7 days   |
//! | `to`      | today            |
//! | `tFrom`   | `00:00`          |
//! | `tTo`     | `23:59:59`       |
//! | `user_id` | `all` (no filter)|

use chrono::{Duration, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::validation::ValidationResult;
use crate::window::{parse_date, parse_time_of_day, TimeWindow};

const DEFAULT_LOOKBACK_DAYS: i64 = 7;

/// Report parameters as received, every field optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawReportParams {
    pub from: Option<String>,
    pub to: Option<String>,
    #[serde(rename = "tFrom")]
    pub t_from: Option<String>,
    #[serde(rename = "tTo")]
    pub t_to: Option<String>,
    pub user_id: Option<String>,
}

/// Validated report parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportQuery {
    pub window: TimeWindow,
    /// Restricts staff-attributed reports to one user.
    pub user_id: Option<i64>,
    /// Reference date for ages in the summary report.
    pub as_of: NaiveDate,
}

impl RawReportParams {
    /// Applies defaults relative to `today` and validates.
    ///
    /// ```rust
    /// use chrono::NaiveDate;
    /// use lounge_core::params::RawReportParams;
    ///
    /// let today = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
    /// let q = RawReportParams::default().parse(today).unwrap();
    /// assert_eq!(q.window.date_from, NaiveDate::from_ymd_opt(2024, 5, 3).unwrap());
    /// assert_eq!(q.window.date_to, today);
    /// assert_eq!(q.user_id, None);
    /// ```
    pub fn parse(&self, today: NaiveDate) -> ValidationResult<ReportQuery> {
        let date_from = match non_empty(&self.from) {
            Some(v) => parse_date("from", v)?,
            None => today - Duration::days(DEFAULT_LOOKBACK_DAYS),
        };
        let date_to = match non_empty(&self.to) {
            Some(v) => parse_date("to", v)?,
            None => today,
        };
        let time_from = match non_empty(&self.t_from) {
            Some(v) => parse_time_of_day("tFrom", v)?,
            None => NaiveTime::MIN,
        };
        let time_to = match non_empty(&self.t_to) {
            Some(v) => parse_time_of_day("tTo", v)?,
            None => NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN),
        };

        Ok(ReportQuery {
            window: TimeWindow::new(date_from, date_to, time_from, time_to)?,
            user_id: parse_user_filter(self.user_id.as_deref())?,
            as_of: today,
        })
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// `all`, empty and `0` mean "every user".
fn parse_user_filter(value: Option<&str>) -> ValidationResult<Option<i64>> {
    let value = match value.map(str::trim) {
        None | Some("") => return Ok(None),
        Some(v) if v.eq_ignore_ascii_case("all") => return Ok(None),
        Some(v) => v,
    };

    let id: i64 = value
        .parse()
        .map_err(|_| ValidationError::format("user_id", format!("expected a number or 'all', got '{value}'")))?;
    match id {
        0 => Ok(None),
        id if id < 0 => Err(ValidationError::MustBePositive {
            field: "user_id".to_string(),
        }),
        id => Ok(Some(id)),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 10).unwrap()
    }

    fn raw(from: &str, to: &str, t_from: &str, t_to: &str, user: &str) -> RawReportParams {
        RawReportParams {
            from: Some(from.to_string()),
            to: Some(to.to_string()),
            t_from: Some(t_from.to_string()),
            t_to: Some(t_to.to_string()),
            user_id: Some(user.to_string()),
        }
    }

    #[test]
    fn test_defaults() {
        let q = RawReportParams::default().parse(today()).unwrap();
        assert_eq!(q.window.time_from, NaiveTime::MIN);
        assert_eq!(q.window.time_to, NaiveTime::from_hms_opt(23, 59, 59).unwrap());
        assert_eq!(q.window.day_count(), 8);
        assert_eq!(q.as_of, today());
    }

    #[test]
    fn test_explicit_values() {
        let q = raw("2024-01-01", "2024-01-03", "22:00", "04:00", "7")
            .parse(today())
            .unwrap();
        assert!(q.window.wraps_midnight());
        assert_eq!(q.user_id, Some(7));
    }

    #[test]
    fn test_empty_strings_fall_back_to_defaults() {
        let q = raw("", " ", "", "", "all").parse(today()).unwrap();
        assert_eq!(q.window.date_to, today());
        assert_eq!(q.user_id, None);

        let q = raw("", "", "", "", "0").parse(today()).unwrap();
        assert_eq!(q.user_id, None);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(raw("2024-13-01", "", "", "", "").parse(today()).is_err());
        assert!(raw("", "", "7pm", "", "").parse(today()).is_err());
        assert!(raw("", "", "", "", "bob").parse(today()).is_err());
        assert!(raw("", "", "", "", "-3").parse(today()).is_err());
        assert!(raw("2024-02-01", "2024-01-01", "", "", "").parse(today()).is_err());
    }
}
