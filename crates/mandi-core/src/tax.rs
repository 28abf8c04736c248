//! # Line Pricing
//!
//! GST pricing for purchase and sales lines.
//!
//! ## Two Different Shapes, On Purpose
//! ```text
//! Purchase line                       Sales line
//! ─────────────                       ──────────
//! tax per UNIT, then × qty            tax on the WHOLE line
//!
//! tax_per_unit  = rate(basic_rate)    taxable    = price × qty
//! net_cost/unit = basic + tax/unit    tax_amount = rate(taxable)
//! tax_amount    = tax/unit × qty      cgst       = tax_amount / 2   (floor)
//! line_total    = net/unit × qty      sgst       = tax_amount − cgst
//!                                     line_total = taxable + tax_amount
//! ```
//!
//! The rounding point differs: a purchase line rounds per unit and
//! multiplies, a sales line multiplies and rounds once. For awkward unit
//! rates the two give different paise totals, and both are correct for
//! their side of the ledger. Any odd paisa in the GST split lands on the
//! SGST half.
//!
//! The net cost per unit (basic rate + per-unit tax) is the landed cost
//! written onto the batch as its purchase price.

use crate::money::Money;
use crate::types::TaxRate;

// =============================================================================
// Purchase Pricing
// =============================================================================

/// Priced purchase line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurchaseLinePricing {
    /// GST on one unit at the basic rate.
    pub tax_per_unit: Money,
    /// Landed cost of one unit: basic rate + per-unit tax.
    pub net_cost_per_unit: Money,
    /// Per-unit tax × quantity.
    pub tax_amount: Money,
    /// Net cost per unit × quantity.
    pub line_total: Money,
}

/// Prices one purchase line.
///
/// ## Example
/// ```
/// use mandi_core::money::Money;
/// use mandi_core::tax::price_purchase_line;
/// use mandi_core::types::TaxRate;
///
/// // 10 bags at ₹100 basic, 18% GST
/// let line = price_purchase_line(Money::from_rupees(100, 0), 10, TaxRate::from_bps(1800));
/// assert_eq!(line.tax_per_unit, Money::from_rupees(18, 0));
/// assert_eq!(line.net_cost_per_unit, Money::from_rupees(118, 0));
/// assert_eq!(line.line_total, Money::from_rupees(1180, 0));
/// ```
pub fn price_purchase_line(basic_rate: Money, quantity: i64, rate: TaxRate) -> PurchaseLinePricing {
    let tax_per_unit = basic_rate.calculate_tax(rate);
    let net_cost_per_unit = basic_rate + tax_per_unit;
    PurchaseLinePricing {
        tax_per_unit,
        net_cost_per_unit,
        tax_amount: tax_per_unit.multiply_quantity(quantity),
        line_total: net_cost_per_unit.multiply_quantity(quantity),
    }
}

// =============================================================================
// Sales Pricing
// =============================================================================

/// Priced sales line with the GST split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SalesLinePricing {
    /// Unit price × quantity, before tax.
    pub taxable: Money,
    /// GST on the whole taxable amount.
    pub tax_amount: Money,
    /// Half the tax, rounded down.
    pub cgst: Money,
    /// The other half, carrying any odd paisa.
    pub sgst: Money,
    /// Taxable + tax.
    pub line_total: Money,
}

/// Prices one sales line at the given combined rate.
///
/// ## Example
/// ```
/// use mandi_core::money::Money;
/// use mandi_core::tax::price_sales_line;
/// use mandi_core::types::TaxRate;
///
/// let line = price_sales_line(Money::from_rupees(250, 0), 4, TaxRate::from_bps(500));
/// assert_eq!(line.taxable, Money::from_rupees(1000, 0));
/// assert_eq!(line.tax_amount, Money::from_rupees(50, 0));
/// assert_eq!(line.cgst + line.sgst, line.tax_amount);
/// ```
pub fn price_sales_line(unit_price: Money, quantity: i64, rate: TaxRate) -> SalesLinePricing {
    let taxable = unit_price.multiply_quantity(quantity);
    let tax_amount = taxable.calculate_tax(rate);
    let cgst = Money::from_paise(tax_amount.paise() / 2);
    let sgst = tax_amount - cgst;
    SalesLinePricing {
        taxable,
        tax_amount,
        cgst,
        sgst,
        line_total: taxable + tax_amount,
    }
}

// =============================================================================
// Margin
// =============================================================================

/// Margin of selling price over cost, as a display percentage.
///
/// Returns 0.0 when cost is zero or negative; a free batch has no
/// meaningful margin.
pub fn margin_percentage(cost: Money, selling: Money) -> f64 {
    if cost.paise() <= 0 {
        return 0.0;
    }
    (selling.paise() - cost.paise()) as f64 / cost.paise() as f64 * 100.0
}

// =============================================================================
// Unit Tests
// =============================================================================
