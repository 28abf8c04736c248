//! # Settlement
//!
//! Derives the settlement state of an invoice from its total and the sum
//! of money received against it.
//!
//! ## The One Rule
//! ```text
//! raw_balance = total − paid
//!
//! raw_balance ≤ 1 paisa          →  PAID     (epsilon absorbs rounding)
//! paid = 0   (and total > 0)     →  UNPAID
//! otherwise                      →  PARTIAL
//!
//! balance_due = max(raw_balance, 0)
//! ```
//!
//! A zero-value invoice falls out of the first rule as PAID. Overpayment
//! is also PAID with a zero balance; the surplus is not tracked here.
//!
//! Both invoice sides recompute this after every write that can move
//! either figure: invoice create, invoice edit, payment create, payment
//! delete. The stored status is never trusted as an input.

use crate::money::Money;
use crate::types::PaymentStatus;

/// Paid-in-full tolerance. A stray paisa left by rounding never holds an
/// invoice open.
pub const SETTLEMENT_EPSILON: Money = Money::from_paise(1);

/// The derived settlement figures written back onto an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settlement {
    pub amount_paid: Money,
    pub balance_due: Money,
    pub status: PaymentStatus,
}

/// Settles an invoice total against the amount paid so far.
///
/// ## Example
/// ```
/// use mandi_core::money::Money;
/// use mandi_core::settle::settle;
/// use mandi_core::types::PaymentStatus;
///
/// let s = settle(Money::from_rupees(500, 0), Money::from_rupees(200, 0));
/// assert_eq!(s.status, PaymentStatus::Partial);
/// assert_eq!(s.balance_due, Money::from_rupees(300, 0));
/// ```
pub fn settle(total: Money, paid: Money) -> Settlement {
    let raw_balance = total - paid;
    let status = if raw_balance <= SETTLEMENT_EPSILON {
        PaymentStatus::Paid
    } else if paid.is_zero() {
        PaymentStatus::Unpaid
    } else {
        PaymentStatus::Partial
    };

    Settlement {
        amount_paid: paid,
        balance_due: raw_balance.clamp_non_negative(),
        status,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unpaid() {
        let s = settle(Money::from_paise(50_000), Money::zero());
        assert_eq!(s.status, PaymentStatus::Unpaid);
        assert_eq!(s.balance_due, Money::from_paise(50_000));
        assert_eq!(s.amount_paid, Money::zero());
    }

    #[test]
    fn test_partial() {
        let s = settle(Money::from_paise(50_000), Money::from_paise(20_000));
        assert_eq!(s.status, PaymentStatus::Partial);
        assert_eq!(s.balance_due, Money::from_paise(30_000));
    }

    #[test]
    fn test_paid_exact() {
        let s = settle(Money::from_paise(50_000), Money::from_paise(50_000));
        assert_eq!(s.status, PaymentStatus::Paid);
        assert_eq!(s.balance_due, Money::zero());
    }

    #[test]
    fn test_one_paisa_short_is_still_paid() {
        let s = settle(Money::from_paise(50_000), Money::from_paise(49_999));
        assert_eq!(s.status, PaymentStatus::Paid);
        // The real shortfall stays visible in the balance.
        assert_eq!(s.balance_due, Money::from_paise(1));
    }

    #[test]
    fn test_two_paise_short_is_partial() {
        let s = settle(Money::from_paise(50_000), Money::from_paise(49_998));
        assert_eq!(s.status, PaymentStatus::Partial);
        assert_eq!(s.balance_due, Money::from_paise(2));
    }

    #[test]
    fn test_overpaid_clamps_balance() {
        let s = settle(Money::from_paise(50_000), Money::from_paise(60_000));
        assert_eq!(s.status, PaymentStatus::Paid);
        assert_eq!(s.balance_due, Money::zero());
        assert_eq!(s.amount_paid, Money::from_paise(60_000));
    }

    #[test]
    fn test_zero_total_is_paid() {
        let s = settle(Money::zero(), Money::zero());
        assert_eq!(s.status, PaymentStatus::Paid);
        assert_eq!(s.balance_due, Money::zero());
    }

    #[test]
    fn test_one_paisa_invoice_with_nothing_paid_is_paid() {
        // Falls inside the epsilon; the tolerance wins over "nothing paid".
        let s = settle(Money::from_paise(1), Money::zero());
        assert_eq!(s.status, PaymentStatus::Paid);
    }
}
