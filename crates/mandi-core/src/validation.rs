//! # Validation Module
//!
//! Input validation rules shared by every write path.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Entry grid decoding (rows module)                            │
//! │  ├── Shape checks: ragged arrays, unparseable cells                    │
//! │  └── Skips rows the operator left blank                                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE - business rules                                 │
//! │  ├── Mobile number format and length                                   │
//! │  ├── Selling price vs MRP                                              │
//! │  └── Positive quantities and amounts                                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / UNIQUE constraints                                     │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::money::Money;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a customer mobile number.
///
/// ## Rules
/// - Required
/// - Digits only
/// - Exactly 10 digits
///
/// Uniqueness is checked against the database by the caller, which maps
/// a clash to [`ValidationError::MobileDuplicate`].
///
/// ## Example
/// ```
/// use mandi_core::validation::validate_mobile;
///
/// assert!(validate_mobile("9876543210").is_ok());
/// assert!(validate_mobile("98765-4321").is_err());
/// assert!(validate_mobile("123").is_err());
/// ```
pub fn validate_mobile(mobile: &str) -> ValidationResult<()> {
    let mobile = mobile.trim();

    if mobile.is_empty() {
        return Err(ValidationError::Required {
            field: "mobile".to_string(),
        });
    }

    if !mobile.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::MobileNotNumeric);
    }

    if mobile.len() != 10 {
        return Err(ValidationError::MobileWrongLength);
    }

    Ok(())
}

/// Validates a name field (customer, supplier, product, category).
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 255 characters
pub fn validate_name(name: &str, field: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.len() > 255 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 255,
        });
    }

    Ok(())
}

// =============================================================================
// Money Validators
// =============================================================================

/// A batch may never be priced above its printed MRP.
///
/// Zero means "not set" on either side and skips the check; a batch with
/// no MRP on record can carry any selling price.
pub fn validate_selling_price(selling: Money, mrp: Money) -> ValidationResult<()> {
    if selling.is_positive() && mrp.is_positive() && selling > mrp {
        return Err(ValidationError::SellingPriceAboveMrp);
    }

    Ok(())
}

/// Validates a payment amount.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Zero and negative payments are rejected
pub fn validate_payment_amount(amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "payment amount".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity value.
///
/// ## Rules
/// - Must be positive (> 0)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates a tax rate in basis points.
///
/// ## Rules
/// - Must be between 0 and 10000 (0% to 100%)
/// - GST slabs in practice are 0-2800 (0% to 28%)
pub fn validate_rate_bps(bps: i64) -> ValidationResult<()> {
    if !(0..=10000).contains(&bps) {
        return Err(ValidationError::OutOfRange {
            field: "tax_rate".to_string(),
            min: 0,
            max: 10000,
        });
    }

    Ok(())
}

/// Validates a supplier's credit period in days.
///
/// ## Rules
/// - Must be between 0 and 3650 (ten years)
///
/// The cap keeps `invoice_date + credit_period` safely inside chrono's
/// date range when the purchase repository derives due dates.
pub fn validate_credit_period(days: i64) -> ValidationResult<()> {
    if !(0..=3650).contains(&days) {
        return Err(ValidationError::OutOfRange {
            field: "credit_period_days".to_string(),
            min: 0,
            max: 3650,
        });
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format before it is used in a lookup.
///
/// ## Example
/// ```
/// use mandi_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000", "batch id").is_ok());
/// assert!(validate_uuid("not-a-uuid", "batch id").is_err());
/// ```
pub fn validate_uuid(id: &str, field: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
