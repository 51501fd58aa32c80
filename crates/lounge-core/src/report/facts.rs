//! Fact rows shared by every report.
//!
//! The store layer produces one row per booking, per booking line and per
//! payment for the bookings inside a window. All derived amounts (gross,
//! net, cost) are defined here once.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::CategoryKind;

/// A booking inside the report window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct BookingFact {
    pub booking_id: i64,
    pub client_id: Option<i64>,
    pub client_name: Option<String>,
    /// Acquisition channel name of the client, if any.
    pub channel_name: Option<String>,
    pub client_birth_date: Option<NaiveDate>,
    pub table_id: Option<i64>,
    pub user_id: i64,
    pub start_time: NaiveDateTime,
    pub total_amount: i64,
    pub discount: i64,
    pub discount_reason: Option<String>,
    /// Effective hold: the amount-weighted hold of the booking's payments,
    /// else the hold of its payment type, else zero.
    pub hold_percent: f64,
}

impl BookingFact {
    /// Total net of the payment hold.
    pub fn net_revenue(&self) -> f64 {
        Money::from_units(self.total_amount).net_of_hold(self.hold_percent)
    }

    pub fn is_walk_in(&self) -> bool {
        self.client_id.is_none()
    }
}

/// A booking line inside the report window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct LineFact {
    pub booking_id: i64,
    pub user_id: i64,
    pub table_id: Option<i64>,
    pub start_time: NaiveDateTime,
    pub item_id: i64,
    pub item_name: String,
    pub category_id: i64,
    pub category_name: String,
    pub category_kind: CategoryKind,
    pub quantity: i64,
    pub price: i64,
    pub discount: i64,
    pub buy_price: i64,
    pub is_set: bool,
    /// Some constituent of this set belongs to a hookah category.
    pub set_has_hookah: bool,
    pub hold_percent: f64,
}

impl LineFact {
    /// `price × quantity` after the line discount.
    pub fn gross(&self) -> f64 {
        (self.price * self.quantity) as f64 * (100 - self.discount) as f64 / 100.0
    }

    /// Gross after the booking's payment hold.
    pub fn net(&self) -> f64 {
        self.gross() * (100.0 - self.hold_percent) / 100.0
    }

    /// Purchase cost of the sold quantity.
    pub fn cost(&self) -> f64 {
        (self.quantity * self.buy_price) as f64
    }

    pub fn profit(&self) -> f64 {
        self.net() - self.cost()
    }

    /// Counts towards hookah commission.
    pub fn is_hookah(&self) -> bool {
        self.category_kind == CategoryKind::Hookah || (self.is_set && self.set_has_hookah)
    }

    /// Counts towards set commission. A set that contains a hookah is paid
    /// as a hookah, not twice.
    pub fn is_set_line(&self) -> bool {
        (self.is_set || self.category_kind == CategoryKind::Set) && !self.is_hookah()
    }
}

/// A payment inside the report window.
///
/// Bookings without split payment rows contribute one fact for their total
/// under their own payment type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PaymentFact {
    pub booking_id: i64,
    pub table_id: Option<i64>,
    pub payment_type_id: Option<i64>,
    pub payment_type_name: Option<String>,
    pub amount: i64,
    pub hold_percent: f64,
}

impl PaymentFact {
    pub fn net(&self) -> f64 {
        Money::from_units(self.amount).net_of_hold(self.hold_percent)
    }
}

/// Everything a report needs for one window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportFacts {
    pub bookings: Vec<BookingFact>,
    pub lines: Vec<LineFact>,
    pub payments: Vec<PaymentFact>,
}

impl ReportFacts {
    /// Σ booking totals.
    pub fn total_revenue(&self) -> i64 {
        self.bookings.iter().map(|b| b.total_amount).sum()
    }

    /// Σ booking totals net of hold.
    pub fn net_revenue(&self) -> f64 {
        self.bookings.iter().map(BookingFact::net_revenue).sum()
    }

    /// Distinct clients; each walk-in booking counts as its own guest.
    pub fn clients_count(&self) -> i64 {
        let mut ids: Vec<i64> = self.bookings.iter().filter_map(|b| b.client_id).collect();
        ids.sort_unstable();
        ids.dedup();
        let walk_ins = self.bookings.iter().filter(|b| b.is_walk_in()).count();
        (ids.len() + walk_ins) as i64
    }

    /// Keeps only facts attributed to `user_id`.
    pub fn for_user(&self, user_id: i64) -> ReportFacts {
        let bookings: Vec<BookingFact> = self
            .bookings
            .iter()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        let ids: std::collections::HashSet<i64> = bookings.iter().map(|b| b.booking_id).collect();

        ReportFacts {
            lines: self
                .lines
                .iter()
                .filter(|l| l.user_id == user_id)
                .cloned()
                .collect(),
            payments: self
                .payments
                .iter()
                .filter(|p| ids.contains(&p.booking_id))
                .cloned()
                .collect(),
            bookings,
        }
    }
}

// =============================================================================
// Test Fixtures
// =============================================================================

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn at(day: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    pub fn booking(id: i64, client: Option<i64>, user: i64, start: NaiveDateTime, total: i64) -> BookingFact {
        BookingFact {
            booking_id: id,
            client_id: client,
            client_name: client.map(|c| format!("Client {c}")),
            channel_name: None,
            client_birth_date: None,
            table_id: Some(1),
            user_id: user,
            start_time: start,
            total_amount: total,
            discount: 0,
            discount_reason: None,
            hold_percent: 0.0,
        }
    }

    pub fn line(booking: &BookingFact, item_id: i64, kind: CategoryKind, qty: i64, price: i64, buy: i64) -> LineFact {
        LineFact {
            booking_id: booking.booking_id,
            user_id: booking.user_id,
            table_id: booking.table_id,
            start_time: booking.start_time,
            item_id,
            item_name: format!("Item {item_id}"),
            category_id: kind as i64 + 1,
            category_name: format!("{kind:?}"),
            category_kind: kind,
            quantity: qty,
            price,
            discount: 0,
            buy_price: buy,
            is_set: false,
            set_has_hookah: false,
            hold_percent: booking.hold_percent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_line_amounts() {
        let mut b = booking(1, None, 1, at(2, 20), 1800);
        b.hold_percent = 10.0;
        let mut l = line(&b, 1, CategoryKind::Bar, 2, 1000, 300);
        l.discount = 10;

        assert_eq!(l.gross(), 1800.0);
        assert_eq!(l.net(), 1620.0);
        assert_eq!(l.cost(), 600.0);
        assert_eq!(l.profit(), 1020.0);
    }

    #[test]
    fn test_line_classification() {
        let b = booking(1, None, 1, at(2, 20), 0);

        let hookah = line(&b, 1, CategoryKind::Hookah, 1, 1500, 200);
        assert!(hookah.is_hookah());
        assert!(!hookah.is_set_line());

        let mut set = line(&b, 2, CategoryKind::Other, 1, 2500, 0);
        set.is_set = true;
        assert!(set.is_set_line());

        set.set_has_hookah = true;
        assert!(set.is_hookah());
        assert!(!set.is_set_line());

        let set_category = line(&b, 3, CategoryKind::Set, 1, 900, 0);
        assert!(set_category.is_set_line());
    }

    #[test]
    fn test_walk_ins_never_deduplicated() {
        let facts = ReportFacts {
            bookings: vec![
                booking(1, Some(10), 1, at(2, 20), 100),
                booking(2, Some(10), 1, at(3, 20), 100),
                booking(3, None, 1, at(3, 21), 100),
                booking(4, None, 2, at(3, 22), 100),
            ],
            ..Default::default()
        };
        assert_eq!(facts.clients_count(), 3);
        assert_eq!(facts.total_revenue(), 400);
        assert_eq!(facts.for_user(2).bookings.len(), 1);
    }
}
