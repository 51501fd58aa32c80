//! # Domain Types
//!
//! Core domain types used throughout Lounge.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Booking      │──►│  BookingItem    │──►│   PriceItem     │       │
//! │  │  client? table? │   │  qty, price     │   │  stock, prices  │       │
//! │  │  user, interval │   │  discount %     │   │  is_set ─┐      │       │
//! │  └───────┬─────────┘   └─────────────────┘   └──────────┼──────┘       │
//! │          │                                              ▼              │
//! │          ▼             ┌─────────────────┐   ┌─────────────────┐       │
//! │  ┌─────────────────┐   │    Category     │   │    SetItem      │       │
//! │  │ BookingPayment  │   │  kind: hookah,  │   │ constituent qty │       │
//! │  │ split tenders   │   │  bar, set, ...  │   └─────────────────┘       │
//! │  └─────────────────┘   └─────────────────┘                             │
//! │                                                                         │
//! │  Cashbox ──► CashboxHistory     Expense ◄── source (repair/inventory)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Tenancy
//! Every entity is scoped by a [`Tenant`] (company + branch). The tenant is
//! always passed explicitly; nothing is looked up from ambient state.
//!
//! ## Nullable References
//! Write inputs use `0` for "no client / no table / no payment type", the
//! way the boundary sends them. [`nullable_id`] turns those into `None`
//! before anything is persisted.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::ROLE_ADMIN;

/// Maps the boundary's `0 = absent` convention to `Option`.
///
/// ```rust
/// use lounge_core::nullable_id;
///
/// assert_eq!(nullable_id(0), None);
/// assert_eq!(nullable_id(7), Some(7));
/// ```
#[inline]
pub fn nullable_id(id: i64) -> Option<i64> {
    if id > 0 {
        Some(id)
    } else {
        None
    }
}

// =============================================================================
// Tenant
// =============================================================================

/// A (company, branch) pair scoping all data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub company_id: i64,
    pub branch_id: i64,
}

impl Tenant {
    /// Creates a tenant scope.
    #[inline]
    pub const fn new(company_id: i64, branch_id: i64) -> Self {
        Tenant {
            company_id,
            branch_id,
        }
    }
}

// =============================================================================
// Enums
// =============================================================================

/// Settlement state of a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Paid,
    #[default]
    Unpaid,
    Partial,
    Refunded,
}

/// How a staff member's hookah commission is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum HookahSalaryType {
    /// Percent of hookah revenue.
    #[default]
    Percent,
    /// Fixed amount per hookah sold.
    Fixed,
}

/// Business classification of a product category.
///
/// Reports and commissions classify by this tag, never by display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    Hookah,
    Bar,
    Set,
    Kitchen,
    #[default]
    Other,
}

impl CategoryKind {
    /// Default kind for a category created without an explicit one.
    ///
    /// Case-insensitive substring match on the display name. Only used when
    /// the category is created; the stored kind is authoritative afterwards.
    ///
    /// ```rust
    /// use lounge_core::CategoryKind;
    ///
    /// assert_eq!(CategoryKind::infer_from_name("Кальяны"), CategoryKind::Hookah);
    /// assert_eq!(CategoryKind::infer_from_name("Бар"), CategoryKind::Bar);
    /// assert_eq!(CategoryKind::infer_from_name("Сеты"), CategoryKind::Set);
    /// assert_eq!(CategoryKind::infer_from_name("Десерты"), CategoryKind::Other);
    /// ```
    pub fn infer_from_name(name: &str) -> Self {
        let name = name.to_lowercase();
        let has = |keys: &[&str]| keys.iter().any(|k| name.contains(k));

        if has(&["кальян", "hookah"]) {
            CategoryKind::Hookah
        } else if has(&["бар", "bar"]) {
            CategoryKind::Bar
        } else if has(&["сет", "set"]) {
            CategoryKind::Set
        } else if has(&["кухня", "kitchen"]) {
            CategoryKind::Kitchen
        } else {
            CategoryKind::Other
        }
    }
}

/// Soft-delete state of a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum ClientStatus {
    #[default]
    Active,
    Deleted,
}

/// What an expense row mirrors, if anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseSource {
    Repair,
    /// Price item shortage; `source_id` is an `inventory_history` row.
    Inventory,
    /// Equipment shortage; `source_id` is an `equipment_inventory_history` row.
    #[cfg_attr(feature = "sqlx", sqlx(rename = "equipment_inventory"))]
    #[serde(rename = "equipment_inventory")]
    EquipmentInventory,
    /// `source_id` is a `cashbox_history` row.
    Cashbox,
}

// =============================================================================
// Booking
// =============================================================================

/// A table reservation with its order lines and payments.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: i64,
    pub company_id: i64,
    pub branch_id: i64,
    /// `None` for a walk-in guest.
    pub client_id: Option<i64>,
    /// `None` for a booking not tied to a table.
    pub table_id: Option<i64>,
    /// Staff member the booking is attributed to.
    pub user_id: i64,
    #[ts(as = "String")]
    pub start_time: NaiveDateTime,
    #[ts(as = "String")]
    pub end_time: NaiveDateTime,
    pub note: Option<String>,
    /// Discount in percent (0-100).
    pub discount: i64,
    pub discount_reason: Option<String>,
    pub total_amount: i64,
    pub bonus_used: i64,
    pub payment_status: PaymentStatus,
    pub payment_type_id: Option<i64>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    pub items: Vec<BookingItem>,
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    pub payments: Vec<BookingPayment>,
}

impl Booking {
    /// Returns the total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_units(self.total_amount)
    }

    /// Half-open interval overlap with `[start, end)`.
    pub fn overlaps(&self, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        start < self.end_time && end > self.start_time
    }

    /// Split payments sum to the booking total.
    ///
    /// A booking without payment rows trivially reconciles.
    pub fn payments_reconcile(&self) -> bool {
        self.payments.is_empty()
            || self.payments.iter().map(|p| p.amount).sum::<i64>() == self.total_amount
    }
}

/// A line of a booking's order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BookingItem {
    pub id: i64,
    pub booking_id: i64,
    pub item_id: i64,
    pub quantity: i64,
    /// Unit price snapshot at the time of the booking.
    pub price: i64,
    /// Line discount in percent (0-100).
    pub discount: i64,
}

/// One tender of a booking's settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BookingPayment {
    pub id: i64,
    pub booking_id: i64,
    pub payment_type_id: i64,
    pub amount: i64,
}

/// Write model for creating or replacing a booking aggregate.
///
/// `client_id`, `table_id` and `payment_type_id` use `0` for "none".
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BookingInput {
    #[serde(default)]
    pub client_id: i64,
    #[serde(default)]
    pub table_id: i64,
    pub user_id: i64,
    #[ts(as = "String")]
    pub start_time: NaiveDateTime,
    #[ts(as = "String")]
    pub end_time: NaiveDateTime,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub discount: i64,
    #[serde(default)]
    pub discount_reason: Option<String>,
    pub total_amount: i64,
    #[serde(default)]
    pub bonus_used: i64,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub payment_type_id: i64,
    #[serde(default)]
    pub items: Vec<BookingItemInput>,
    #[serde(default)]
    pub payments: Vec<BookingPaymentInput>,
}

/// A line of a [`BookingInput`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BookingItemInput {
    pub item_id: i64,
    pub quantity: i64,
    pub price: i64,
    #[serde(default)]
    pub discount: i64,
}

/// A tender of a [`BookingInput`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BookingPaymentInput {
    pub payment_type_id: i64,
    pub amount: i64,
}

// =============================================================================
// Client
// =============================================================================

/// A guest with loyalty accumulators.
///
/// `bonus`, `visits` and `income` only ever grow, through atomic increments.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: i64,
    pub company_id: i64,
    pub branch_id: i64,
    pub name: String,
    pub phone: String,
    /// Acquisition channel.
    pub channel_id: Option<i64>,
    #[ts(as = "Option<String>")]
    pub birth_date: Option<NaiveDate>,
    pub bonus: i64,
    pub visits: i64,
    pub income: i64,
    pub status: ClientStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Write model for a client profile. Accumulators are not part of it.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ClientProfile {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub channel_id: i64,
    #[ts(as = "Option<String>")]
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
}

// =============================================================================
// Catalog
// =============================================================================

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i64,
    pub company_id: i64,
    pub branch_id: i64,
    pub name: String,
    pub kind: CategoryKind,
}

/// A sellable, stocked item. Sets are price items with `is_set` and
/// constituent [`SetItem`] rows.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PriceItem {
    pub id: i64,
    pub company_id: i64,
    pub branch_id: i64,
    pub name: String,
    pub category_id: i64,
    pub subcategory_id: Option<i64>,
    /// Current stock.
    pub quantity: i64,
    pub sale_price: i64,
    pub buy_price: i64,
    pub is_set: bool,
}

/// Write model for a price item.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewPriceItem {
    pub name: String,
    pub category_id: i64,
    #[serde(default)]
    pub subcategory_id: i64,
    #[serde(default)]
    pub quantity: i64,
    pub sale_price: i64,
    #[serde(default)]
    pub buy_price: i64,
}

/// A constituent of a set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SetItem {
    pub id: i64,
    pub set_id: i64,
    pub item_id: i64,
    pub quantity: i64,
    pub position: i64,
}

/// A composite price item with its ordered constituents.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PriceSet {
    pub id: i64,
    pub name: String,
    pub category_id: i64,
    pub subcategory_id: Option<i64>,
    pub price: i64,
    pub items: Vec<SetItem>,
}

/// Write model for a set: the set's own fields plus `(item_id, quantity)`
/// constituents in display order.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewPriceSet {
    pub name: String,
    pub category_id: i64,
    #[serde(default)]
    pub subcategory_id: i64,
    pub price: i64,
    pub items: Vec<(i64, i64)>,
}

/// A payment method and the share its processor withholds.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaymentType {
    pub id: i64,
    pub company_id: i64,
    pub branch_id: i64,
    pub name: String,
    pub hold_percent: f64,
}

/// A seat-able table in the venue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct VenueTable {
    pub id: i64,
    pub company_id: i64,
    pub branch_id: i64,
    pub name: String,
    pub seats: i64,
}

/// A client acquisition channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub id: i64,
    pub company_id: i64,
    pub branch_id: i64,
    pub name: String,
}

// =============================================================================
// Staff
// =============================================================================

/// A staff member and their compensation parameters.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub company_id: i64,
    pub branch_id: i64,
    pub name: String,
    pub phone: String,
    pub role: String,
    /// Fixed pay per shift.
    pub salary_shift: i64,
    /// Percent of hookah revenue or amount per hookah, see `hookah_salary_type`.
    pub salary_hookah: i64,
    /// Commission percent on set revenue.
    pub salary_bar: i64,
    pub hookah_salary_type: HookahSalaryType,
    pub permissions: Option<String>,
}

impl User {
    /// Whether the user shows up in the admin payroll report.
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }
}

/// Write model for a staff member.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub name: String,
    pub phone: String,
    pub role: String,
    #[serde(default)]
    pub salary_shift: i64,
    #[serde(default)]
    pub salary_hookah: i64,
    #[serde(default)]
    pub salary_bar: i64,
    #[serde(default)]
    pub hookah_salary_type: HookahSalaryType,
}

// =============================================================================
// Cashbox & Expenses
// =============================================================================

/// Per-tenant cash register balance.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Cashbox {
    pub id: i64,
    pub company_id: i64,
    pub branch_id: i64,
    pub amount: i64,
}

/// Append-only cashbox ledger entry.
///
/// `amount` is the magnitude moved; the operation decides the direction
/// (see [`crate::ledger::CashboxOperation::direction`]).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CashboxHistory {
    pub id: i64,
    pub company_id: i64,
    pub branch_id: i64,
    pub operation: String,
    pub amount: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// An expense row. Mirrored expenses carry an explicit source link.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: i64,
    pub company_id: i64,
    pub branch_id: i64,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub title: String,
    pub category_id: Option<i64>,
    pub total: i64,
    pub description: Option<String>,
    pub paid: bool,
    pub source_type: Option<ExpenseSource>,
    pub source_id: Option<i64>,
}

/// Write model for an expense.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewExpense {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub title: String,
    pub category_id: Option<i64>,
    pub total: i64,
    pub description: Option<String>,
    pub paid: bool,
    pub source_type: Option<ExpenseSource>,
    pub source_id: Option<i64>,
}

// =============================================================================
// Equipment & Repairs
// =============================================================================

/// Stocked venue equipment (hookah bowls, hoses, glassware...).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Equipment {
    pub id: i64,
    pub company_id: i64,
    pub branch_id: i64,
    pub name: String,
    pub quantity: i64,
    /// Unit replacement cost.
    pub price: i64,
}

/// A repair job; each repair is mirrored into one expense row.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Repair {
    pub id: i64,
    pub company_id: i64,
    pub branch_id: i64,
    pub equipment_id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub price: i64,
    #[ts(as = "String")]
    pub date: NaiveDate,
}

/// Write model for a repair.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewRepair {
    #[serde(default)]
    pub equipment_id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: i64,
    #[ts(as = "String")]
    pub date: NaiveDate,
}

/// Variance record written for every counted item during an inventory.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct VarianceRecord {
    pub id: i64,
    pub entity_id: i64,
    pub expected: i64,
    pub actual: i64,
    pub difference: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Settings
// =============================================================================

/// Per-tenant venue settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub company_id: i64,
    pub branch_id: i64,
    /// Default payment type for new bookings.
    pub payment_type_id: Option<i64>,
    /// Minutes after which a booking is locked against edits.
    pub block_time: i64,
    /// Percent of a booking total credited to the client's bonus.
    pub bonus_percent: i64,
    /// Opening time of the business day.
    #[ts(as = "String")]
    pub work_time_from: NaiveTime,
    /// Closing time; earlier than opening when the day wraps past midnight.
    #[ts(as = "String")]
    pub work_time_to: NaiveTime,
    /// Table count used for load capacity; `0` means "count the tables".
    pub tables_count: i64,
    /// Minutes before a booking to notify staff.
    pub notification_time: i64,
}

impl Settings {
    /// Settings for a tenant that never saved any.
    pub fn defaults_for(tenant: Tenant) -> Self {
        Settings {
            company_id: tenant.company_id,
            branch_id: tenant.branch_id,
            payment_type_id: None,
            block_time: 0,
            bonus_percent: 0,
            work_time_from: NaiveTime::from_hms_opt(12, 0, 0).unwrap_or(NaiveTime::MIN),
            work_time_to: NaiveTime::from_hms_opt(2, 0, 0).unwrap_or(NaiveTime::MIN),
            tables_count: 0,
            notification_time: 0,
        }
    }

    pub fn tenant(&self) -> Tenant {
        Tenant::new(self.company_id, self.branch_id)
    }
}

// =============================================================================
// Write Outcomes
// =============================================================================

/// Status of a best-effort side effect that runs after a committed write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum SideEffect {
    /// The side effect ran and committed.
    Applied,
    /// Nothing to do (e.g. walk-in booking has no client to credit).
    Skipped,
    /// The primary write committed but the side effect failed.
    Degraded { reason: String },
}

/// Result of a write whose primary effect committed, together with the
/// status of its best-effort follow-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteOutcome<T> {
    pub value: T,
    pub side_effect: SideEffect,
}

impl<T> WriteOutcome<T> {
    pub fn new(value: T, side_effect: SideEffect) -> Self {
        WriteOutcome { value, side_effect }
    }

    /// True when the primary write committed but its side effect did not.
    pub fn is_degraded(&self) -> bool {
        matches!(self.side_effect, SideEffect::Degraded { .. })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn booking(start: NaiveDateTime, end: NaiveDateTime, total: i64) -> Booking {
        Booking {
            id: 1,
            company_id: 1,
            branch_id: 1,
            client_id: None,
            table_id: Some(1),
            user_id: 1,
            start_time: start,
            end_time: end,
            note: None,
            discount: 0,
            discount_reason: None,
            total_amount: total,
            bonus_used: 0,
            payment_status: PaymentStatus::Unpaid,
            payment_type_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            items: Vec::new(),
            payments: Vec::new(),
        }
    }

    #[test]
    fn test_nullable_id() {
        assert_eq!(nullable_id(0), None);
        assert_eq!(nullable_id(-3), None);
        assert_eq!(nullable_id(12), Some(12));
    }

    #[test]
    fn test_booking_overlap_is_half_open() {
        let b = booking(at(20, 0), at(22, 0), 0);
        assert!(b.overlaps(at(21, 0), at(23, 0)));
        assert!(b.overlaps(at(19, 0), at(20, 30)));
        // Touching intervals do not overlap
        assert!(!b.overlaps(at(22, 0), at(23, 0)));
        assert!(!b.overlaps(at(18, 0), at(20, 0)));
    }

    #[test]
    fn test_payments_reconcile() {
        let mut b = booking(at(20, 0), at(22, 0), 3000);
        assert!(b.payments_reconcile());

        b.payments = vec![
            BookingPayment { id: 1, booking_id: 1, payment_type_id: 1, amount: 1000 },
            BookingPayment { id: 2, booking_id: 1, payment_type_id: 2, amount: 2000 },
        ];
        assert!(b.payments_reconcile());

        b.payments.pop();
        assert!(!b.payments_reconcile());
    }

    #[test]
    fn test_category_kind_inference() {
        assert_eq!(CategoryKind::infer_from_name("КАЛЬЯН"), CategoryKind::Hookah);
        assert_eq!(CategoryKind::infer_from_name("Hookah mixes"), CategoryKind::Hookah);
        assert_eq!(CategoryKind::infer_from_name("Барная карта"), CategoryKind::Bar);
        assert_eq!(CategoryKind::infer_from_name("Кухня"), CategoryKind::Kitchen);
    }

    #[test]
    fn test_payment_status_wire_format() {
        let json = serde_json::to_string(&PaymentStatus::Partial).unwrap();
        assert_eq!(json, "\"PARTIAL\"");
        assert_eq!(PaymentStatus::default(), PaymentStatus::Unpaid);
    }

    #[test]
    fn test_side_effect_outcome() {
        let ok = WriteOutcome::new(5, SideEffect::Applied);
        assert!(!ok.is_degraded());

        let degraded = WriteOutcome::new(
            5,
            SideEffect::Degraded {
                reason: "client missing".to_string(),
            },
        );
        assert!(degraded.is_degraded());
    }

    #[test]
    fn test_settings_defaults() {
        let s = Settings::defaults_for(Tenant::new(3, 4));
        assert_eq!(s.tenant(), Tenant::new(3, 4));
        assert_eq!(s.work_time_from, NaiveTime::from_hms_opt(12, 0, 0).unwrap());
        assert_eq!(s.work_time_to, NaiveTime::from_hms_opt(2, 0, 0).unwrap());
    }
}
