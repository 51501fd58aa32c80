//! # Service Layer
//!
//! Operations that combine several repositories with business policy.
//!
//! - [`BookingService`] - booking writes with availability policy and
//!   best-effort loyalty accrual
//! - [`ReportService`] - the six reports, each under one read transaction
//!   and a deadline

pub mod booking;
pub mod report;

pub use booking::{BookingPolicy, BookingService};
pub use report::{ReportService, DEFAULT_REPORT_TIMEOUT};
