//! # Validation Module
//!
//! Input validation for write models, run before anything touches the store.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Layer 1: Boundary                                                     │
//! │  └── Deserialization, 0 → None for optional references                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Ranges (discount 0-100, quantity ≥ 0)                             │
//! │  └── Intervals (end after start)                                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: SQLite                                                       │
//! │  ├── CHECK (quantity >= 0)                                             │
//! │  └── UNIQUE / FOREIGN KEY constraints                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDateTime;

use crate::error::ValidationError;
use crate::types::{BookingInput, NewPriceSet, NewRepair};
use crate::MAX_DISCOUNT_PERCENT;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_NAME_LEN: usize = 200;

// =============================================================================
// Scalar Validators
// =============================================================================

/// Validates a display name (category, item, client, ...).
///
/// ## Example
/// ```rust
/// use lounge_core::validation::validate_name;
///
/// assert!(validate_name("name", "Кальяны").is_ok());
/// assert!(validate_name("name", "   ").is_err());
/// ```
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates a percent discount (0-100 inclusive).
pub fn validate_discount(field: &str, discount: i64) -> ValidationResult<()> {
    if !(0..=MAX_DISCOUNT_PERCENT).contains(&discount) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_DISCOUNT_PERCENT,
        });
    }
    Ok(())
}

/// Validates a quantity that may be zero but never negative.
pub fn validate_quantity(field: &str, quantity: i64) -> ValidationResult<()> {
    if quantity < 0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a monetary amount that may be zero but never negative.
pub fn validate_amount(field: &str, amount: i64) -> ValidationResult<()> {
    validate_quantity(field, amount)
}

/// Validates a required reference id.
pub fn validate_id(field: &str, id: i64) -> ValidationResult<()> {
    if id <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a payment-type hold percent.
pub fn validate_hold_percent(hold: f64) -> ValidationResult<()> {
    if !hold.is_finite() || !(0.0..=100.0).contains(&hold) {
        return Err(ValidationError::OutOfRange {
            field: "hold_percent".to_string(),
            min: 0,
            max: 100,
        });
    }
    Ok(())
}

/// Validates that an interval is non-empty.
pub fn validate_interval(
    field: &str,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> ValidationResult<()> {
    if end <= start {
        return Err(ValidationError::EmptyInterval {
            field: field.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Composite Validators
// =============================================================================

/// Validates a booking write model including every line and tender.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use lounge_core::validation::validate_booking_input;
/// use lounge_core::{BookingInput, BookingItemInput, PaymentStatus};
///
/// let day = NaiveDate::from_ymd_opt(2024, 3, 8).unwrap();
/// let mut input = BookingInput {
///     client_id: 0,
///     table_id: 2,
///     user_id: 1,
///     start_time: day.and_hms_opt(20, 0, 0).unwrap(),
///     end_time: day.and_hms_opt(22, 0, 0).unwrap(),
///     note: None,
///     discount: 0,
///     discount_reason: None,
///     total_amount: 1500,
///     bonus_used: 0,
///     payment_status: PaymentStatus::Unpaid,
///     payment_type_id: 0,
///     items: vec![BookingItemInput { item_id: 1, quantity: 1, price: 1500, discount: 0 }],
///     payments: vec![],
/// };
/// assert!(validate_booking_input(&input).is_ok());
///
/// input.items[0].quantity = -1;
/// assert!(validate_booking_input(&input).is_err());
/// ```
pub fn validate_booking_input(input: &BookingInput) -> ValidationResult<()> {
    validate_id("user_id", input.user_id)?;
    validate_interval("booking", input.start_time, input.end_time)?;
    validate_discount("discount", input.discount)?;
    validate_amount("total_amount", input.total_amount)?;
    validate_amount("bonus_used", input.bonus_used)?;

    for item in &input.items {
        validate_id("item_id", item.item_id)?;
        validate_quantity("quantity", item.quantity)?;
        validate_amount("price", item.price)?;
        validate_discount("item discount", item.discount)?;
    }

    for payment in &input.payments {
        validate_id("payment_type_id", payment.payment_type_id)?;
        validate_amount("payment amount", payment.amount)?;
    }

    Ok(())
}

/// Validates a set write model.
pub fn validate_price_set(set: &NewPriceSet) -> ValidationResult<()> {
    validate_name("name", &set.name)?;
    validate_id("category_id", set.category_id)?;
    validate_amount("price", set.price)?;

    if set.items.is_empty() {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        });
    }
    for (item_id, quantity) in &set.items {
        validate_id("item_id", *item_id)?;
        validate_id("quantity", *quantity)?;
    }
    Ok(())
}

/// Validates a repair write model.
pub fn validate_repair(repair: &NewRepair) -> ValidationResult<()> {
    validate_name("title", &repair.title)?;
    validate_amount("price", repair.price)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("name", "Бар").is_ok());
        assert!(validate_name("name", "").is_err());
        assert!(validate_name("name", &"я".repeat(200)).is_ok());
        assert!(validate_name("name", &"я".repeat(201)).is_err());
    }

    #[test]
    fn test_validate_discount() {
        assert!(validate_discount("discount", 0).is_ok());
        assert!(validate_discount("discount", 100).is_ok());
        assert!(validate_discount("discount", -1).is_err());
        assert!(validate_discount("discount", 101).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity("quantity", 0).is_ok());
        assert!(matches!(
            validate_quantity("quantity", -2),
            Err(ValidationError::Negative { .. })
        ));
    }

    #[test]
    fn test_validate_hold_percent() {
        assert!(validate_hold_percent(2.5).is_ok());
        assert!(validate_hold_percent(-0.1).is_err());
        assert!(validate_hold_percent(f64::NAN).is_err());
    }

    #[test]
    fn test_validate_interval() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let a = day.and_hms_opt(20, 0, 0).unwrap();
        let b = day.and_hms_opt(21, 0, 0).unwrap();
        assert!(validate_interval("booking", a, b).is_ok());
        assert!(validate_interval("booking", a, a).is_err());
        assert!(validate_interval("booking", b, a).is_err());
    }

    #[test]
    fn test_validate_price_set() {
        let mut set = NewPriceSet {
            name: "Кальян + чай".to_string(),
            category_id: 3,
            subcategory_id: 0,
            price: 2500,
            items: vec![(1, 1), (2, 1)],
        };
        assert!(validate_price_set(&set).is_ok());

        set.items.clear();
        assert!(validate_price_set(&set).is_err());

        set.items = vec![(1, 0)];
        assert!(validate_price_set(&set).is_err());
    }
}
