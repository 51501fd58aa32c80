//! # lounge-db: Database Layer for Lounge
//!
//! SQLite persistence for the venue: bookings, clients, catalog, cashbox,
//! expenses, repairs, inventory, settings and report facts.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Lounge Data Flow                                 │
//! │                                                                         │
//! │  lounge-cli (or any boundary)                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     lounge-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Services    │───►│  Repositories │───►│   Database   │  │   │
//! │  │   │ BookingSvc    │    │ booking.rs    │    │  (pool.rs)   │  │   │
//! │  │   │ ReportSvc     │    │ cashbox.rs    │    │  SqlitePool  │  │   │
//! │  │   │               │    │ report.rs ... │    │  migrations  │  │   │
//! │  │   └───────┬───────┘    └───────────────┘    └──────────────┘  │   │
//! │  │           │                                                     │   │
//! │  │           ▼                                                     │   │
//! │  │   lounge-core: validation, salary, report builders              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//! - [`service`] - Booking writes and report generation
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lounge_db::{BookingPolicy, BookingService, Database, DbConfig, ReportService};
//!
//! let db = Database::new(DbConfig::new("lounge.db")).await?;
//!
//! let bookings = BookingService::new(db.clone(), BookingPolicy::strict());
//! let outcome = bookings.create(tenant, &input).await?;
//!
//! let reports = ReportService::new(db.clone());
//! let summary = reports.summary(tenant, &query).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod service;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::{
    BookingRepository, CashboxRepository, CatalogRepository, CategoryRepository,
    ClientRepository, ExpenseRepository, InventoryRepository, RepairRepository,
    ReportRepository, SettingsRepository,
};
pub use service::{BookingPolicy, BookingService, ReportService, DEFAULT_REPORT_TIMEOUT};
