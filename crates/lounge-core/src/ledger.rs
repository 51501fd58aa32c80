//! # Ledger Arithmetic
//!
//! Cashbox operations and stock variance rules. The database crate applies
//! these inside transactions; this module only decides amounts.
//!
//! ## Cashbox Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  cashbox.amount  ==  Σ direction(op) × history.amount                  │
//! │                                                                         │
//! │  Operation        Label              Direction                         │
//! │  ───────────────  ─────────────────  ─────────                         │
//! │  Inventory        Инвентаризация        −1   (cash taken out)          │
//! │  Replenishment    Пополнение            +1                             │
//! │  BookingPayment   Оплата брони          +1                             │
//! │  BookingRefund    Возврат брони         −1                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::CashboxHistory;

/// Expense category for cashbox replenishments.
pub const CASHBOX_EXPENSE_CATEGORY: &str = "Касса";
/// Expense category for inventory shortages.
pub const INVENTORY_EXPENSE_CATEGORY: &str = "Инвентаризация";
/// Expense category for repairs.
pub const REPAIR_EXPENSE_CATEGORY: &str = "Ремонт";

// =============================================================================
// Cashbox Operations
// =============================================================================

/// A named cashbox mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub enum CashboxOperation {
    Inventory,
    Replenishment,
    BookingPayment,
    BookingRefund,
}

impl CashboxOperation {
    /// Label stored in the history row.
    pub const fn label(self) -> &'static str {
        match self {
            CashboxOperation::Inventory => "Инвентаризация",
            CashboxOperation::Replenishment => "Пополнение",
            CashboxOperation::BookingPayment => "Оплата брони",
            CashboxOperation::BookingRefund => "Возврат брони",
        }
    }

    /// Sign applied to a history amount.
    pub const fn direction(self) -> i64 {
        match self {
            CashboxOperation::Inventory | CashboxOperation::BookingRefund => -1,
            CashboxOperation::Replenishment | CashboxOperation::BookingPayment => 1,
        }
    }

    /// Reverse of [`label`](Self::label).
    pub fn from_label(label: &str) -> Option<Self> {
        [
            CashboxOperation::Inventory,
            CashboxOperation::Replenishment,
            CashboxOperation::BookingPayment,
            CashboxOperation::BookingRefund,
        ]
        .into_iter()
        .find(|op| op.label() == label)
    }
}

/// Amount actually taken out by an inventory of `requested`.
///
/// A non-positive request, or one larger than the balance, takes the whole
/// balance. A balance below zero takes nothing.
///
/// ```rust
/// use lounge_core::ledger::clamp_inventory_amount;
///
/// assert_eq!(clamp_inventory_amount(15000, 10000), 10000);
/// assert_eq!(clamp_inventory_amount(0, 10000), 10000);
/// assert_eq!(clamp_inventory_amount(2500, 10000), 2500);
/// assert_eq!(clamp_inventory_amount(0, -500), 0);
/// ```
pub fn clamp_inventory_amount(requested: i64, balance: i64) -> i64 {
    let balance = balance.max(0);
    if requested <= 0 || requested > balance {
        balance
    } else {
        requested
    }
}

/// Balance implied by a history.
///
/// Rows with an unknown label are ignored.
pub fn reconstruct_balance(history: &[CashboxHistory]) -> i64 {
    history
        .iter()
        .filter_map(|row| {
            CashboxOperation::from_label(&row.operation).map(|op| op.direction() * row.amount)
        })
        .sum()
}

// =============================================================================
// Stock Variance
// =============================================================================

/// What is being counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub enum StockTarget {
    PriceItem,
    Equipment,
}

/// One counted line of an inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CountedStock {
    pub entity_id: i64,
    pub actual: i64,
}

/// Expected against counted stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Variance {
    pub expected: i64,
    pub actual: i64,
}

impl Variance {
    pub fn new(expected: i64, actual: i64) -> Self {
        Variance { expected, actual }
    }

    /// `actual − expected`.
    pub fn difference(&self) -> i64 {
        self.actual - self.expected
    }

    pub fn is_shortage(&self) -> bool {
        self.difference() < 0
    }

    /// Missing units, zero for an excess.
    pub fn shortfall(&self) -> i64 {
        (-self.difference()).max(0)
    }

    /// Expense total for the shortage.
    pub fn shortage_cost(&self, unit_cost: i64) -> i64 {
        self.shortfall() * unit_cost
    }
}

/// Expense description for a shortage.
pub fn shortage_description(name: &str, shortfall: i64) -> String {
    format!("Недостача: {name}, {shortfall} шт.")
}

/// A counted line that could not be applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct InventoryFailure {
    pub entity_id: i64,
    pub reason: String,
}

/// Per-item outcome of an inventory run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct InventoryReport {
    pub applied: Vec<i64>,
    pub failed: Vec<InventoryFailure>,
}

impl InventoryReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
