//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  In many back-office systems:                                           │
//! │    ₹10.00 / 3 = ₹3.33 (×3 = ₹9.99)  → Lost ₹0.01!                      │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Paise                                            │
//! │    1000 paise / 3 = 333 paise (×3 = 999 paise)                         │
//! │    We KNOW we lost 1 paisa, and handle it explicitly                   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use mandi_core::money::Money;
//!
//! // Create from paise (preferred)
//! let rate = Money::from_paise(11800); // ₹118.00
//!
//! // Arithmetic operations
//! let line = rate * 10;                       // ₹1180.00
//! let total = line + Money::from_paise(500);  // ₹1185.00
//!
//! // Parse form input ("118", "118.5", "118.50")
//! let parsed: Money = "118.50".parse().unwrap();
//! assert_eq!(parsed.paise(), 11850);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use std::str::FromStr;
use thiserror::Error;

use crate::types::TaxRate;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (paise).
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for refunds and adjustments
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Derives**: Full serde support for JSON serialization
///
/// Every monetary value in the system flows through this type: batch
/// costs, invoice totals, payment amounts, wallet balances, refunds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from paise (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use mandi_core::money::Money;
    ///
    /// let price = Money::from_paise(1099); // Represents ₹10.99
    /// assert_eq!(price.paise(), 1099);
    /// ```
    #[inline]
    pub const fn from_paise(paise: i64) -> Self {
        Money(paise)
    }

    /// Creates a Money value from rupees and paise.
    ///
    /// ## Example
    /// ```rust
    /// use mandi_core::money::Money;
    ///
    /// let price = Money::from_rupees(10, 99); // ₹10.99
    /// assert_eq!(price.paise(), 1099);
    ///
    /// let refund = Money::from_rupees(-5, 50); // -₹5.50
    /// assert_eq!(refund.paise(), -550);
    /// ```
    ///
    /// ## Note
    /// For negative amounts, only the rupee part should be negative.
    /// `from_rupees(-5, 50)` = -₹5.50, not -₹4.50
    #[inline]
    pub const fn from_rupees(rupees: i64, paise: i64) -> Self {
        if rupees < 0 {
            Money(rupees * 100 - paise)
        } else {
            Money(rupees * 100 + paise)
        }
    }

    /// Returns the value in paise (smallest currency unit).
    #[inline]
    pub const fn paise(&self) -> i64 {
        self.0
    }

    /// Returns the rupee portion.
    #[inline]
    pub const fn rupees(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the paise portion (always 0-99).
    #[inline]
    pub const fn paise_part(&self) -> i64 {
        (self.0 % 100).abs()
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

    /// Clamps negative values to zero.
    ///
    /// Balance-due columns are never allowed to go below zero; an
    /// overpaid invoice simply shows a zero balance.
    #[inline]
    pub const fn clamp_non_negative(&self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            *self
        }
    }

    /// Calculates tax on this amount, rounding half-up.
    ///
    /// ## Implementation
    /// Integer math in i128: `(amount × bps + 5000) / 10000`.
    /// The +5000 provides the half-up rounding (5000/10000 = 0.5).
    /// This is the single rounding rule used everywhere a rate is
    /// applied, so repeated derivations always agree.
    ///
    /// ## Example
    /// ```rust
    /// use mandi_core::money::Money;
    /// use mandi_core::types::TaxRate;
    ///
    /// let basic_rate = Money::from_paise(10000); // ₹100.00
    /// let gst = TaxRate::from_bps(1800);         // 18%
    ///
    /// let tax = basic_rate.calculate_tax(gst);
    /// assert_eq!(tax.paise(), 1800); // ₹18.00
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        let tax_paise = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_paise(tax_paise as i64)
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use mandi_core::money::Money;
    ///
    /// let net_cost = Money::from_paise(11800); // ₹118.00 per unit
    /// let line_total = net_cost.multiply_quantity(10);
    /// assert_eq!(line_total.paise(), 118000); // ₹1180.00
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

/// Parses exactly two decimal places of precision from a plain decimal
/// string. Returns the value in hundredths ("118.5" → 11850).
///
/// Shared by [`Money`]'s `FromStr` (rupees → paise) and by the invoice
/// entry rows (percent → basis points). Rejects more than two fraction
/// digits rather than silently truncating.
pub(crate) fn parse_fixed_hundredths(s: &str) -> Option<i64> {
    let s = s.trim();
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    if digits.is_empty() {
        return None;
    }

    let (whole, frac) = match digits.split_once('.') {
        Some((w, f)) => (w, f),
        None => (digits, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return None;
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    if frac.len() > 2 {
        return None;
    }

    let whole: i64 = if whole.is_empty() {
        0
    } else {
        whole.parse().ok()?
    };
    let frac: i64 = match frac.len() {
        0 => 0,
        1 => frac.parse::<i64>().ok()? * 10,
        _ => frac.parse().ok()?,
    };

    let hundredths = whole.checked_mul(100)?.checked_add(frac)?;
    Some(if negative { -hundredths } else { hundredths })
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Error when parsing a money string.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid money amount: {0:?}")]
pub struct ParseMoneyError(pub String);

/// Parses decimal rupee strings as submitted by entry forms.
///
/// Accepts "118", "118.5", "118.50", and negatives. At most two
/// fraction digits (paise resolution). Empty and malformed strings
/// are errors; callers that treat empty as zero handle that before
/// parsing.
impl FromStr for Money {
    type Err = ParseMoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_fixed_hundredths(s)
            .map(Money::from_paise)
            .ok_or_else(|| ParseMoneyError(s.to_string()))
    }
}

/// Display implementation shows money in a human-readable format.
///
/// ## Note
/// This is for logs and error messages. Rendering layers format for
/// locale themselves.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}₹{}.{:02}", sign, self.rupees().abs(), self.paise_part())
    }
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

/// Addition of two Money values.
impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

/// Addition assignment (+=).
impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

/// Subtraction of two Money values.
impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

/// Subtraction assignment (-=).
impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by integer (for quantity calculations).
impl Mul<i32> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i32) -> Self {
        Money(self.0 * qty as i64)
    }
}

/// Multiplication by i64.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_paise() {
        let money = Money::from_paise(1099);
        assert_eq!(money.paise(), 1099);
        assert_eq!(money.rupees(), 10);
        assert_eq!(money.paise_part(), 99);
    }

    #[test]
    fn test_from_rupees() {
        let money = Money::from_rupees(10, 99);
        assert_eq!(money.paise(), 1099);

        let negative = Money::from_rupees(-5, 50);
        assert_eq!(negative.paise(), -550);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_paise(1099)), "₹10.99");
        assert_eq!(format!("{}", Money::from_paise(500)), "₹5.00");
        assert_eq!(format!("{}", Money::from_paise(-550)), "-₹5.50");
        assert_eq!(format!("{}", Money::from_paise(0)), "₹0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_paise(1000);
        let b = Money::from_paise(500);

        assert_eq!((a + b).paise(), 1500);
        assert_eq!((a - b).paise(), 500);
        let result: Money = a * 3;
        assert_eq!(result.paise(), 3000);
    }

    #[test]
    fn test_tax_calculation_combined_gst() {
        // ₹100.00 at 18% (9% CGST + 9% SGST) = ₹18.00
        let amount = Money::from_paise(10000);
        let rate = TaxRate::from_bps(1800);
        let tax = amount.calculate_tax(rate);
        assert_eq!(tax.paise(), 1800);
    }

    #[test]
    fn test_tax_calculation_rounds_half_up() {
        // ₹10.00 at 8.25% = ₹0.825 → ₹0.83
        let amount = Money::from_paise(1000);
        let rate = TaxRate::from_bps(825);
        let tax = amount.calculate_tax(rate);
        assert_eq!(tax.paise(), 83);
    }

    #[test]
    fn test_clamp_non_negative() {
        assert_eq!(Money::from_paise(-250).clamp_non_negative().paise(), 0);
        assert_eq!(Money::from_paise(250).clamp_non_negative().paise(), 250);
        assert_eq!(Money::zero().clamp_non_negative().paise(), 0);
    }

    #[test]
    fn test_parse() {
        assert_eq!("118".parse::<Money>().unwrap().paise(), 11800);
        assert_eq!("118.5".parse::<Money>().unwrap().paise(), 11850);
        assert_eq!("118.50".parse::<Money>().unwrap().paise(), 11850);
        assert_eq!("0".parse::<Money>().unwrap().paise(), 0);
        assert_eq!("-12.75".parse::<Money>().unwrap().paise(), -1275);
        assert_eq!(".5".parse::<Money>().unwrap().paise(), 50);

        assert!("".parse::<Money>().is_err());
        assert!("abc".parse::<Money>().is_err());
        assert!("12.345".parse::<Money>().is_err());
        assert!("12,50".parse::<Money>().is_err());
        assert!(".".parse::<Money>().is_err());
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        let positive = Money::from_paise(100);
        assert!(positive.is_positive());

        let negative = Money::from_paise(-100);
        assert!(negative.is_negative());
    }

    #[test]
    fn test_multiply_quantity() {
        let net_cost = Money::from_paise(11800);
        let line_total = net_cost.multiply_quantity(10);
        assert_eq!(line_total.paise(), 118000);
    }

    /// Documents the intentional precision loss of integer division.
    #[test]
    fn test_division_precision_loss_documented() {
        let ten_rupees = Money::from_paise(1000);
        let one_third = Money::from_paise(1000 / 3); // 333 paise
        let reconstructed: Money = one_third * 3; // 999 paise

        assert_eq!(reconstructed.paise(), 999);
        let lost = ten_rupees - reconstructed;
        assert_eq!(lost.paise(), 1);
    }
}
