//! Analytics report: daily revenue series, hourly booking histogram and
//! per-category statistics.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{NaiveDate, Timelike};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::facts::ReportFacts;
use super::{average, round2};
use crate::types::CategoryKind;
use crate::window::TimeWindow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DailyRevenue {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub revenue: i64,
    pub net_revenue: f64,
    pub bookings: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct HourlyBookings {
    pub hour: u32,
    pub bookings: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStats {
    pub category_id: i64,
    pub name: String,
    pub kind: CategoryKind,
    pub quantity: i64,
    pub revenue: f64,
    /// Revenue per booking containing the category.
    pub avg_check: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    pub daily: Vec<DailyRevenue>,
    pub hourly: Vec<HourlyBookings>,
    pub categories: Vec<CategoryStats>,
}

pub fn build_analytics_report(facts: &ReportFacts, window: &TimeWindow) -> AnalyticsReport {
    // Every date of the window appears, with zeros on empty days
    let mut days: BTreeMap<NaiveDate, DailyRevenue> = BTreeMap::new();
    let mut date = window.date_from;
    while date <= window.date_to {
        days.insert(
            date,
            DailyRevenue {
                date,
                revenue: 0,
                net_revenue: 0.0,
                bookings: 0,
            },
        );
        match date.succ_opt() {
            Some(next) => date = next,
            None => break,
        }
    }

    let mut hours = [0i64; 24];
    for b in &facts.bookings {
        if let Some(day) = days.get_mut(&window.business_date(b.start_time)) {
            day.revenue += b.total_amount;
            day.net_revenue += b.net_revenue();
            day.bookings += 1;
        }
        hours[b.start_time.hour() as usize] += 1;
    }

    AnalyticsReport {
        daily: days
            .into_values()
            .map(|mut d| {
                d.net_revenue = round2(d.net_revenue);
                d
            })
            .collect(),
        hourly: hours
            .iter()
            .enumerate()
            .map(|(hour, &bookings)| HourlyBookings {
                hour: hour as u32,
                bookings,
            })
            .collect(),
        categories: category_stats(facts),
    }
}

fn category_stats(facts: &ReportFacts) -> Vec<CategoryStats> {
    let mut stats: HashMap<i64, (CategoryStats, HashSet<i64>)> = HashMap::new();

    for l in &facts.lines {
        let (entry, bookings) = stats.entry(l.category_id).or_insert_with(|| {
            (
                CategoryStats {
                    category_id: l.category_id,
                    name: l.category_name.clone(),
                    kind: l.category_kind,
                    quantity: 0,
                    revenue: 0.0,
                    avg_check: 0.0,
                },
                HashSet::new(),
            )
        });
        entry.quantity += l.quantity;
        entry.revenue += l.gross();
        bookings.insert(l.booking_id);
    }

    let mut rows: Vec<CategoryStats> = stats
        .into_values()
        .map(|(mut c, bookings)| {
            c.avg_check = average(c.revenue, bookings.len() as i64);
            c.revenue = round2(c.revenue);
            c
        })
        .collect();
    rows.sort_by(|a, b| {
        b.revenue
            .total_cmp(&a.revenue)
            .then_with(|| a.category_id.cmp(&b.category_id))
    });
    rows
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::facts::fixtures::*;
    use chrono::NaiveTime;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn test_daily_series_is_dense() {
        let window = TimeWindow::all_day(d(1), d(4)).unwrap();
        let facts = ReportFacts {
            bookings: vec![
                booking(1, None, 1, at(2, 20), 1000),
                booking(2, None, 1, at(2, 21), 500),
            ],
            ..Default::default()
        };
        let report = build_analytics_report(&facts, &window);

        assert_eq!(report.daily.len(), 4);
        assert_eq!(report.daily[0].bookings, 0);
        assert_eq!(report.daily[1].revenue, 1500);
        assert_eq!(report.hourly.len(), 24);
        assert_eq!(report.hourly[20].bookings, 1);
        assert_eq!(report.hourly[21].bookings, 1);
    }

    #[test]
    fn test_wrapping_window_assigns_night_to_business_day() {
        let window = TimeWindow::new(
            d(1),
            d(2),
            NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(4, 0, 0).unwrap(),
        )
        .unwrap();
        let facts = ReportFacts {
            bookings: vec![booking(1, None, 1, at(3, 1), 800)],
            ..Default::default()
        };
        let report = build_analytics_report(&facts, &window);
        assert_eq!(report.daily[1].date, d(2));
        assert_eq!(report.daily[1].revenue, 800);
    }

    #[test]
    fn test_category_avg_check() {
        let b1 = booking(1, None, 1, at(2, 20), 0);
        let b2 = booking(2, None, 1, at(2, 21), 0);
        let facts = ReportFacts {
            lines: vec![
                line(&b1, 1, CategoryKind::Bar, 2, 300, 0),
                line(&b1, 2, CategoryKind::Bar, 1, 400, 0),
                line(&b2, 1, CategoryKind::Bar, 1, 300, 0),
            ],
            bookings: vec![b1, b2],
            ..Default::default()
        };
        let report = build_analytics_report(&facts, &TimeWindow::all_day(d(2), d(2)).unwrap());

        assert_eq!(report.categories.len(), 1);
        assert_eq!(report.categories[0].quantity, 4);
        assert_eq!(report.categories[0].revenue, 1300.0);
        assert_eq!(report.categories[0].avg_check, 650.0);
    }
}
