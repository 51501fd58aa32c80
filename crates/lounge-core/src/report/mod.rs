//! # Report Aggregation Engine
//!
//! Pure aggregation over fact rows loaded by the store layer.
//!
//! ## Data Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  lounge-db                         lounge-core::report                  │
//! │                                                                         │
//! │  scoped CTE (tenant + window  ──►  ReportFacts { bookings, lines,      │
//! │  + user filter + hold %)           payments }                           │
//! │                                         │                               │
//! │                  ┌──────────┬───────────┼───────────┬──────────┐        │
//! │                  ▼          ▼           ▼           ▼          ▼        │
//! │              summary    payroll    analytics   discounts    tables     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every report reads the same fact rows, so a booking in a window
//! contributes the same gross and net amounts to every report built from
//! that window. Net amounts use the booking's effective hold percent; see
//! [`facts::BookingFact::hold_percent`].

pub mod analytics;
pub mod discounts;
pub mod facts;
pub mod payroll;
pub mod summary;
pub mod tables;

pub use facts::{BookingFact, LineFact, PaymentFact, ReportFacts};

use chrono::{Datelike, NaiveDate};

/// Bucket name for payments without a payment type.
pub const UNSPECIFIED_PAYMENT_TYPE: &str = "Не указан";

/// Bucket name for discounts without a reason.
pub const NO_DISCOUNT_REASON: &str = "Без причины";

/// Rounds to two decimals for presentation.
#[inline]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Percent change from `previous` to `current`.
///
/// A zero baseline reports `0.0` rather than an infinite change.
///
/// ```rust
/// use lounge_core::report::percent_change;
///
/// assert_eq!(percent_change(1000.0, 1200.0), 20.0);
/// assert_eq!(percent_change(0.0, 500.0), 0.0);
/// ```
pub fn percent_change(previous: f64, current: f64) -> f64 {
    if previous == 0.0 {
        return 0.0;
    }
    round2((current - previous) * 100.0 / previous)
}

/// Bookings as a percentage of table-hour capacity.
///
/// `bookings × 100 / (tables × business_day_hours × days)`, zero when the
/// capacity is zero.
pub fn load_percent(bookings: i64, tables: i64, business_day_hours: f64, days: i64) -> f64 {
    let capacity = tables as f64 * business_day_hours * days as f64;
    if capacity <= 0.0 {
        return 0.0;
    }
    round2(bookings as f64 * 100.0 / capacity)
}

/// Age in full years on `today`.
pub fn age_on(birth_date: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birth_date.year();
    if (today.month(), today.day()) < (birth_date.month(), birth_date.day()) {
        age -= 1;
    }
    age
}

/// Safe average for presentation.
pub(crate) fn average(total: f64, count: i64) -> f64 {
    if count <= 0 {
        0.0
    } else {
        round2(total / count as f64)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_change() {
        assert_eq!(percent_change(1000.0, 1200.0), 20.0);
        assert_eq!(percent_change(1000.0, 800.0), -20.0);
        assert_eq!(percent_change(0.0, 0.0), 0.0);
        assert_eq!(percent_change(0.0, 1200.0), 0.0);
        assert_eq!(percent_change(3.0, 4.0), 33.33);
    }

    #[test]
    fn test_load_percent() {
        // 14 bookings over 2 tables × 14h × 1 day
        assert_eq!(load_percent(14, 2, 14.0, 1), 50.0);
        assert_eq!(load_percent(14, 0, 14.0, 1), 0.0);
        assert_eq!(load_percent(0, 3, 12.0, 7), 0.0);
    }

    #[test]
    fn test_age_on() {
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
        assert_eq!(age_on(d(2000, 5, 10), d(2024, 5, 10)), 24);
        assert_eq!(age_on(d(2000, 5, 11), d(2024, 5, 10)), 23);
        assert_eq!(age_on(d(2000, 2, 29), d(2024, 2, 28)), 23);
    }
}
