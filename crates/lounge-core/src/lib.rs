//! # lounge-core: Pure Business Logic for Lounge
//!
//! This crate contains the venue's business rules as pure functions with
//! zero I/O dependencies. The database crate loads rows, this crate turns
//! them into decisions and reports.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Lounge Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │            Boundary (CLI / HTTP handlers, not here)             │   │
//! │  │   parse params ──► ReportQuery ──► services ──► JSON payloads   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ lounge-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────────────┐  │   │
//! │  │   │  window  │ │  salary  │ │  ledger  │ │      report      │  │   │
//! │  │   │ midnight │ │ percent/ │ │ cashbox  │ │ summary, payroll │  │   │
//! │  │   │ wrapping │ │  fixed   │ │ variance │ │ analytics, ...   │  │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    lounge-db (Database Layer)                   │   │
//! │  │          SQLite queries, transactions, repositories             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain entities (Booking, Client, PriceItem, User, ...)
//! - [`money`] - Integer currency type
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation rules
//! - [`window`] - Date + time-of-day windows that may wrap past midnight
//! - [`params`] - Report parameter parsing with boundary defaults
//! - [`salary`] - Shift + commission pay calculator
//! - [`ledger`] - Cashbox operations and stock variance arithmetic
//! - [`report`] - Report aggregation engine over loaded fact rows
//!
//! ## Example Usage
//!
//! ```rust
//! use lounge_core::salary::{calculate_salary, Compensation, SalesVolume};
//! use lounge_core::HookahSalaryType;
//!
//! let pay = calculate_salary(
//!     &Compensation {
//!         salary_shift: 3000,
//!         salary_hookah: 500,
//!         hookah_salary_type: HookahSalaryType::Fixed,
//!         set_commission_percent: 10,
//!     },
//!     &SalesVolume {
//!         shifts_worked: 5,
//!         hookah_quantity: 10,
//!         hookah_revenue: 0.0,
//!         set_quantity: 4,
//!         set_revenue: 20000.0,
//!     },
//! );
//! assert_eq!(pay.total, 22000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod ledger;
pub mod money;
pub mod params;
pub mod report;
pub mod salary;
pub mod types;
pub mod validation;
pub mod window;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, ValidationError};
pub use money::Money;
pub use types::*;
pub use window::TimeWindow;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Channel bucket for clients without an acquisition channel and for
/// walk-in bookings without a client.
pub const GUEST_CHANNEL: &str = "Гость";

/// Staff role whose members appear in the admin payroll report.
pub const ROLE_ADMIN: &str = "admin";

/// Maximum discount, in percent, on a booking or a booking line.
pub const MAX_DISCOUNT_PERCENT: i64 = 100;
