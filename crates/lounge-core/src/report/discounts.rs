//! Discounts report.
//!
//! The discounted amount of a booking is `⌊subtotal × discount / 100⌋`,
//! where the subtotal is the sum of its line amounts after line discounts,
//! or the booking total when it has no lines.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::facts::{BookingFact, ReportFacts};
use super::{average, NO_DISCOUNT_REASON};

const TOP_REASONS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DiscountReason {
    pub reason: String,
    pub amount: i64,
    pub count: i64,
}

/// Bookings sharing one discount percent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DiscountBucket {
    pub discount: i64,
    pub count: i64,
    pub amount: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DiscountedBooking {
    pub booking_id: i64,
    #[ts(as = "String")]
    pub start_time: NaiveDateTime,
    pub client_name: Option<String>,
    pub discount: i64,
    pub reason: Option<String>,
    pub amount: i64,
    pub total_amount: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DiscountsReport {
    pub total_amount: i64,
    pub count: i64,
    pub average: f64,
    pub top_reasons: Vec<DiscountReason>,
    pub distribution: Vec<DiscountBucket>,
    pub bookings: Vec<DiscountedBooking>,
}

fn discounted_amount(booking: &BookingFact, subtotals: &HashMap<i64, f64>) -> i64 {
    let subtotal = subtotals
        .get(&booking.booking_id)
        .copied()
        .unwrap_or(booking.total_amount as f64);
    (subtotal * booking.discount as f64 / 100.0).floor() as i64
}

pub fn build_discounts_report(facts: &ReportFacts) -> DiscountsReport {
    let mut subtotals: HashMap<i64, f64> = HashMap::new();
    for l in &facts.lines {
        *subtotals.entry(l.booking_id).or_default() += l.gross();
    }

    let mut bookings: Vec<DiscountedBooking> = facts
        .bookings
        .iter()
        .filter(|b| b.discount > 0)
        .map(|b| DiscountedBooking {
            booking_id: b.booking_id,
            start_time: b.start_time,
            client_name: b.client_name.clone(),
            discount: b.discount,
            reason: b
                .discount_reason
                .as_ref()
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty()),
            amount: discounted_amount(b, &subtotals),
            total_amount: b.total_amount,
        })
        .collect();
    bookings.sort_by(|a, b| {
        a.start_time
            .cmp(&b.start_time)
            .then_with(|| a.booking_id.cmp(&b.booking_id))
    });

    let mut reasons: HashMap<String, DiscountReason> = HashMap::new();
    let mut buckets: BTreeMap<i64, DiscountBucket> = BTreeMap::new();
    for b in &bookings {
        let reason = b.reason.clone().unwrap_or_else(|| NO_DISCOUNT_REASON.to_string());
        let r = reasons.entry(reason.clone()).or_insert(DiscountReason {
            reason,
            amount: 0,
            count: 0,
        });
        r.amount += b.amount;
        r.count += 1;

        let bucket = buckets.entry(b.discount).or_insert(DiscountBucket {
            discount: b.discount,
            count: 0,
            amount: 0,
        });
        bucket.count += 1;
        bucket.amount += b.amount;
    }

    let mut top_reasons: Vec<DiscountReason> = reasons.into_values().collect();
    top_reasons.sort_by(|a, b| b.amount.cmp(&a.amount).then_with(|| a.reason.cmp(&b.reason)));
    top_reasons.truncate(TOP_REASONS);

    let total_amount: i64 = bookings.iter().map(|b| b.amount).sum();
    let count = bookings.len() as i64;

    DiscountsReport {
        total_amount,
        count,
        average: average(total_amount as f64, count),
        top_reasons,
        distribution: buckets.into_values().collect(),
        bookings,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::facts::fixtures::*;
    use crate::types::CategoryKind;

    fn discounted(id: i64, total: i64, discount: i64, reason: Option<&str>) -> BookingFact {
        let mut b = booking(id, None, 1, at(2, 18 + id as u32), total);
        b.discount = discount;
        b.discount_reason = reason.map(str::to_string);
        b
    }

    #[test]
    fn test_discounts_report() {
        let with_lines = discounted(1, 1800, 10, Some("День рождения"));
        let facts = ReportFacts {
            lines: vec![line(&with_lines, 1, CategoryKind::Bar, 4, 500, 0)],
            bookings: vec![
                with_lines,
                discounted(2, 999, 10, Some("День рождения")),
                discounted(3, 1000, 20, None),
                discounted(4, 5000, 0, Some("ignored")),
                discounted(5, 3000, 5, Some("  ")),
            ],
            ..Default::default()
        };
        let report = build_discounts_report(&facts);

        // 2000 × 10%, 999 × 10%, 1000 × 20%, 3000 × 5%
        let amounts: Vec<i64> = report.bookings.iter().map(|b| b.amount).collect();
        assert_eq!(amounts, vec![200, 99, 200, 150]);
        assert_eq!(report.count, 4);
        assert_eq!(report.total_amount, 649);
        assert_eq!(report.average, 162.25);

        assert_eq!(report.top_reasons[0].reason, NO_DISCOUNT_REASON);
        assert_eq!(report.top_reasons[0].amount, 350);
        assert_eq!(report.top_reasons[0].count, 2);
        assert_eq!(report.top_reasons[1].amount, 299);

        let percents: Vec<i64> = report.distribution.iter().map(|b| b.discount).collect();
        assert_eq!(percents, vec![5, 10, 20]);
    }

    #[test]
    fn test_no_discounts() {
        let report = build_discounts_report(&ReportFacts::default());
        assert_eq!(report.count, 0);
        assert_eq!(report.average, 0.0);
        assert!(report.top_reasons.is_empty());
    }
}
