//! # Money Module
//!
//! Provides the `Money` type for booking totals, prices and cashbox amounts.
//!
//! ## Whole Currency Units
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  The venue prices everything in whole roubles:                         │
//! │                                                                         │
//! │    booking.total_amount = 4500      → 4500 ₽                           │
//! │    price_item.buy_price = 120       → 120 ₽                            │
//! │                                                                         │
//! │  Stored amounts are integers. Percent-based derivations that the       │
//! │  business floors (bonus accrual, commissions) floor here; derivations  │
//! │  that reports keep fractional (hold-adjusted revenue) return f64.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use lounge_core::money::Money;
//!
//! let total = Money::from_units(4599);
//! assert_eq!(total.percent_floor(5).units(), 229); // 229.95 floors to 229
//! assert_eq!(total.net_of_hold(2.0), 4507.02);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in whole currency units.
///
/// ## Design Decisions
/// - **i64 (signed)**: refunds and cash withdrawals are negative deltas
/// - **Single field tuple struct**: zero-cost abstraction over i64
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from whole units.
    #[inline]
    pub const fn from_units(units: i64) -> Self {
        Money(units)
    }

    /// Returns the value in whole units.
    #[inline]
    pub const fn units(&self) -> i64 {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Returns `floor(self * percent / 100)`.
    ///
    /// ## Example
    /// ```rust
    /// use lounge_core::money::Money;
    ///
    /// // Bonus accrual: 5% of 1999 = 99.95 → 99
    /// assert_eq!(Money::from_units(1999).percent_floor(5).units(), 99);
    /// ```
    ///
    /// ## Implementation
    /// Integer math in i128 with Euclidean division, so the result floors
    /// towards negative infinity for negative amounts as well.
    pub fn percent_floor(&self, percent: i64) -> Money {
        let scaled = self.0 as i128 * percent as i128;
        Money(scaled.div_euclid(100) as i64)
    }

    /// Multiplies money by a quantity.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Returns the amount remaining after a payment-method hold.
    ///
    /// `hold_percent` is the share withheld by the payment processor, so
    /// the result is `amount * (1 - hold_percent / 100)`.
    pub fn net_of_hold(&self, hold_percent: f64) -> f64 {
        self.0 as f64 * (100.0 - hold_percent) / 100.0
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display for logs and CLI output.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ₽", self.0)
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by a quantity.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
