//! # Error Types
//!
//! Domain-specific error types for mandi-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  mandi-core errors (this file)                                         │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  mandi-db errors (separate crate)                                      │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → caller                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (batch number, quantities)
//! 3. Errors are enum variants, never String
//! 4. Each variant's message is what a clerk at the counter reads
//!
//! Several messages are fixed wording that operators already know by
//! heart; tests pin them.

use thiserror::Error;

use crate::types::PaymentMode;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations. They should be caught
/// and surfaced verbatim; the wording is part of the contract.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A sale asked for more units than the batch holds.
    ///
    /// Raised by the guarded stock decrease: the quantity check and the
    /// decrement are one statement, so two clerks cannot both win the
    /// last unit.
    #[error("Insufficient Stock. Available: {available}")]
    InsufficientStock {
        batch_number: String,
        available: i64,
        requested: i64,
    },

    /// A purchase return asked to send back more than is on hand.
    ///
    /// Returns ship physical goods out of the store room, so the batch
    /// must actually hold the quantity being returned.
    #[error("Cannot return {requested} of {batch_number}. Only {available} in stock.")]
    ReturnExceedsStock {
        batch_number: String,
        requested: i64,
        available: i64,
    },

    /// Payment mode not usable in this context.
    ///
    /// Wallet settles against customer credit and has no meaning on the
    /// supplier side.
    #[error("Payment mode '{mode:?}' is not supported here")]
    UnsupportedPaymentMode { mode: PaymentMode },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when submitted form data doesn't meet requirements, before
/// any business logic runs.
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

    /// Invalid format (e.g., unparseable amount, invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g., duplicate customer mobile).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },

    /// Mobile number contains non-digit characters.
    #[error("Mobile number must contain only digits.")]
    MobileNotNumeric,

    /// Mobile number is not exactly 10 digits.
    #[error("Mobile number must be exactly 10 digits.")]
    MobileWrongLength,

    /// Another customer already holds this mobile number.
    #[error("Customer with this mobile number already exists.")]
    MobileDuplicate,

    /// Selling price entered above the printed MRP.
    #[error("Selling price cannot be higher than MRP")]
    SellingPriceAboveMrp,
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_message() {
        let err = CoreError::InsufficientStock {
            batch_number: "LOT-42".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(err.to_string(), "Insufficient Stock. Available: 3");
    }

    #[test]
    fn test_return_exceeds_stock_message() {
        let err = CoreError::ReturnExceedsStock {
            batch_number: "LOT-42".to_string(),
            requested: 8,
            available: 2,
        };
        assert_eq!(
            err.to_string(),
            "Cannot return 8 of LOT-42. Only 2 in stock."
        );
    }

    #[test]
    fn test_mobile_messages() {
        assert_eq!(
            ValidationError::MobileNotNumeric.to_string(),
            "Mobile number must contain only digits."
        );
        assert_eq!(
            ValidationError::MobileWrongLength.to_string(),
            "Mobile number must be exactly 10 digits."
        );
        assert_eq!(
            ValidationError::MobileDuplicate.to_string(),
            "Customer with this mobile number already exists."
        );
    }

    #[test]
    fn test_selling_price_message() {
        assert_eq!(
            ValidationError::SellingPriceAboveMrp.to_string(),
            "Selling price cannot be higher than MRP"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "name".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
