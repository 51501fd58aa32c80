//! # Error Types
//!
//! Domain-specific error types for lounge-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  lounge-core errors (this file)                                        │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  lounge-db errors (separate crate)                                     │
//! │  └── DbError          - Store failures, wraps the two above            │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → boundary status code    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDateTime;
use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations.
///
/// These are client errors: the request was well-formed but the venue's
/// rules reject it.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The table already has a booking overlapping the requested interval.
    ///
    /// ## When This Occurs
    /// ```text
    /// existing:   20:00 ────────── 23:00
    /// requested:          22:00 ────────── 01:00
    ///                     ▲ overlap → TableUnavailable
    /// ```
    #[error("Table {table_id} is not available between {start} and {end}")]
    TableUnavailable {
        table_id: i64,
        start: NaiveDateTime,
        end: NaiveDateTime,
    },

    /// A cashbox withdrawal larger than the balance.
    #[error("Cashbox holds {balance}, cannot take out {requested}")]
    InsufficientCash { balance: i64, requested: i64 },

    /// The operation is not valid in the current state.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before anything touches the store.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Invalid format (e.g., malformed date or time of day).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// An interval whose end does not come after its start.
    #[error("{field}: end must be after start")]
    EmptyInterval { field: String },
}

impl ValidationError {
    pub(crate) fn format(field: &str, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
