//! # Domain Types
//!
//! Core domain types for the agricultural-trade back office.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Master data          Inventory           Transactions                  │
//! │  ───────────          ─────────           ────────────                  │
//! │  Category (GST card)  Batch               PurchaseInvoice / Item        │
//! │  Manufacturer           (product,           SupplierPayment             │
//! │  Product                 batch_number,    SalesInvoice / Item           │
//! │  Supplier                mrp) is the        CustomerPayment             │
//! │  Customer (wallet)       natural key      PurchaseReturn / SalesReturn  │
//! │                                                                         │
//! │  Enums: UnitKind • PaymentStatus • PaymentMode                          │
//! │  Rates: TaxRate (basis points) • GstRate (cgst/sgst/igst)              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business key where one exists: product name, invoice number, customer
//!   mobile, the batch natural-key triple
//!
//! All monetary fields are stored as `*_paise` (i64) and exposed through
//! [`Money`] accessors; all rates are `*_bps` basis points.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 900 bps = 9% (a common CGST or SGST slab component)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaxRate(i64);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: i64) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a percentage (for convenience).
    pub fn from_percentage(pct: f64) -> Self {
        TaxRate((pct * 100.0).round() as i64)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> i64 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    /// Checks if tax rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

/// The GST rate card carried by a product category.
///
/// Intra-state transactions charge CGST + SGST; IGST applies to
/// inter-state movement and never enters the combined rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GstRate {
    pub cgst: TaxRate,
    pub sgst: TaxRate,
    pub igst: TaxRate,
}

impl GstRate {
    pub const fn new(cgst: TaxRate, sgst: TaxRate, igst: TaxRate) -> Self {
        GstRate { cgst, sgst, igst }
    }

    /// Combined intra-state rate: CGST + SGST.
    #[inline]
    pub const fn combined(&self) -> TaxRate {
        TaxRate::from_bps(self.cgst.bps() + self.sgst.bps())
    }
}

// =============================================================================
// Enums
// =============================================================================

/// Unit of measure a product is traded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    Bag,
    Packet,
    Bottle,
    Kg,
    Ltr,
}

/// Settlement state of an invoice, derived from its amounts.
///
/// Never set directly by callers: every write path recomputes it via
/// [`crate::settle::settle`] from (total, amount paid).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// No money received and the invoice has a positive total.
    Unpaid,
    /// Some money received, balance still open.
    Partial,
    /// Balance due within one paisa of zero (or a zero-value invoice).
    Paid,
}

impl Default for PaymentStatus {
    fn default() -> Self {
        PaymentStatus::Unpaid
    }
}

/// How a payment was made.
///
/// `Wallet` settles against the customer's stored credit and exists only
/// on the sales side; supplier payments reject it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentMode {
    Cash,
    Upi,
    Cheque,
    Bank,
    Wallet,
}

impl Default for PaymentMode {
    fn default() -> Self {
        PaymentMode::Cash
    }
}

/// How an invoice is paid at creation time.
///
/// `Full` marks the invoice settled for its grand total; `Amount` records
/// a partial figure; `None` leaves it unpaid. The settlement fields are
/// still derived, never trusted from input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitialPayment {
    #[default]
    None,
    Amount(Money),
    Full,
}

impl InitialPayment {
    /// Resolves the paid amount against the invoice total.
    pub fn resolve(&self, total: Money) -> Money {
        match self {
            InitialPayment::None => Money::zero(),
            InitialPayment::Amount(amount) => *amount,
            InitialPayment::Full => total,
        }
    }
}

// =============================================================================
// Master Data
// =============================================================================

/// A product category carrying the GST rate card.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Category {
    pub id: String,
    pub name: String,
    pub cgst_bps: i64,
    pub sgst_bps: i64,
    pub igst_bps: i64,
}

impl Category {
    /// The full GST rate card.
    #[inline]
    pub fn gst(&self) -> GstRate {
        GstRate::new(
            TaxRate::from_bps(self.cgst_bps),
            TaxRate::from_bps(self.sgst_bps),
            TaxRate::from_bps(self.igst_bps),
        )
    }

    /// Combined intra-state rate (CGST + SGST).
    #[inline]
    pub fn combined_rate(&self) -> TaxRate {
        self.gst().combined()
    }
}

/// A product manufacturer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Manufacturer {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
}

/// A tradeable product.
///
/// Purchase entry resolves products by exact name, so `name` is unique.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    pub id: String,
    pub name: String,
    /// Harmonized System of Nomenclature tax-classification code.
    pub hsn_code: String,
    pub unit: UnitKind,
    pub category_id: String,
    pub manufacturer_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A supplier of goods.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Supplier {
    pub id: String,
    pub name: String,
    pub gstin: String,
    pub phone: String,
    pub address: String,
    pub is_distributor: bool,
    /// Days of credit; used to derive purchase due dates when none given.
    pub credit_period_days: i64,
}

/// A customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Customer {
    pub id: String,
    pub name: String,
    /// Unique, exactly 10 digits.
    pub mobile: String,
    pub city: Option<String>,
    pub address: String,
    pub gstin: Option<String>,
    /// Stored credit; debited by wallet-mode payments.
    pub wallet_balance_paise: i64,
    pub created_at: DateTime<Utc>,
}

impl Customer {
    #[inline]
    pub fn wallet_balance(&self) -> Money {
        Money::from_paise(self.wallet_balance_paise)
    }
}

// =============================================================================
// Inventory
// =============================================================================

/// One lot of a product with its own cost, MRP, expiry and stock level.
///
/// Identified in business terms by (product, batch_number, MRP); purchase
/// entry upserts against that triple.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Batch {
    pub id: String,
    pub product_id: String,
    pub batch_number: String,
    pub manufacturing_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    /// Landed unit cost including tax, refreshed on every purchase.
    pub purchase_price_paise: i64,
    pub mrp_paise: i64,
    pub selling_price_paise: i64,
    pub pack_size: f64,
    pub pack_unit: String,
    pub current_quantity: i64,
    pub is_active: bool,
}

impl Batch {
    #[inline]
    pub fn purchase_price(&self) -> Money {
        Money::from_paise(self.purchase_price_paise)
    }

    #[inline]
    pub fn mrp(&self) -> Money {
        Money::from_paise(self.mrp_paise)
    }

    #[inline]
    pub fn selling_price(&self) -> Money {
        Money::from_paise(self.selling_price_paise)
    }

    /// Days until expiry, negative once past. None when no expiry is set.
    pub fn days_to_expiry(&self, today: NaiveDate) -> Option<i64> {
        self.expiry_date.map(|d| (d - today).num_days())
    }

    /// Expired strictly before today; expiring today still sells.
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expiry_date.map_or(false, |d| d < today)
    }
}

// =============================================================================
// Purchasing
// =============================================================================

/// A supplier invoice header.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PurchaseInvoice {
    pub id: String,
    pub supplier_id: String,
    pub invoice_number: String,
    pub invoice_date: NaiveDate,
    /// Derived as invoice_date + supplier credit period when not supplied.
    pub due_date: Option<NaiveDate>,
    /// Σ line totals + loading charges − additional discount.
    pub total_paise: i64,
    pub loading_charges_paise: i64,
    pub additional_discount_paise: i64,
    pub amount_paid_paise: i64,
    pub balance_due_paise: i64,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

impl PurchaseInvoice {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_paise(self.total_paise)
    }

    #[inline]
    pub fn amount_paid(&self) -> Money {
        Money::from_paise(self.amount_paid_paise)
    }

    #[inline]
    pub fn balance_due(&self) -> Money {
        Money::from_paise(self.balance_due_paise)
    }

    #[inline]
    pub fn loading_charges(&self) -> Money {
        Money::from_paise(self.loading_charges_paise)
    }

    #[inline]
    pub fn additional_discount(&self) -> Money {
        Money::from_paise(self.additional_discount_paise)
    }

    /// Open invoice past its due date.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        matches!(
            self.payment_status,
            PaymentStatus::Unpaid | PaymentStatus::Partial
        ) && self.due_date.map_or(false, |d| d < today)
    }
}

/// A line on a purchase invoice.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PurchaseItem {
    pub id: String,
    pub invoice_id: String,
    pub batch_id: String,
    pub quantity: i64,
    /// Pre-tax unit cost.
    pub basic_rate_paise: i64,
    /// Total tax for the line (per-unit tax × quantity).
    pub tax_paise: i64,
    /// Selling price set on the batch by this purchase.
    pub selling_price_paise: i64,
    /// Margin as submitted on entry, in basis points.
    pub margin_bps: i64,
    pub line_total_paise: i64,
}

impl PurchaseItem {
    #[inline]
    pub fn basic_rate(&self) -> Money {
        Money::from_paise(self.basic_rate_paise)
    }

    #[inline]
    pub fn tax_amount(&self) -> Money {
        Money::from_paise(self.tax_paise)
    }

    #[inline]
    pub fn selling_price(&self) -> Money {
        Money::from_paise(self.selling_price_paise)
    }

    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_paise(self.line_total_paise)
    }
}

/// A payment made to a supplier against a purchase invoice.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SupplierPayment {
    pub id: String,
    pub invoice_id: String,
    pub amount_paise: i64,
    pub payment_date: NaiveDate,
    pub mode: PaymentMode,
    /// Cheque number, UPI reference, bank transaction id.
    pub reference: Option<String>,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

impl SupplierPayment {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_paise(self.amount_paise)
    }
}

// =============================================================================
// Sales
// =============================================================================

/// A customer invoice header with the GST total split.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SalesInvoice {
    pub id: String,
    /// Walk-in sales have no customer.
    pub customer_id: Option<String>,
    pub invoice_number: String,
    pub invoice_date: NaiveDate,
    pub taxable_paise: i64,
    pub cgst_paise: i64,
    pub sgst_paise: i64,
    pub grand_total_paise: i64,
    pub amount_received_paise: i64,
    pub balance_due_paise: i64,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

impl SalesInvoice {
    #[inline]
    pub fn taxable(&self) -> Money {
        Money::from_paise(self.taxable_paise)
    }

    #[inline]
    pub fn cgst(&self) -> Money {
        Money::from_paise(self.cgst_paise)
    }

    #[inline]
    pub fn sgst(&self) -> Money {
        Money::from_paise(self.sgst_paise)
    }

    #[inline]
    pub fn grand_total(&self) -> Money {
        Money::from_paise(self.grand_total_paise)
    }

    #[inline]
    pub fn amount_received(&self) -> Money {
        Money::from_paise(self.amount_received_paise)
    }

    #[inline]
    pub fn balance_due(&self) -> Money {
        Money::from_paise(self.balance_due_paise)
    }
}

/// A line on a sales invoice.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SalesItem {
    pub id: String,
    pub invoice_id: String,
    pub batch_id: String,
    pub quantity: i64,
    pub unit_price_paise: i64,
    /// Combined rate applied, frozen at sale time.
    pub tax_rate_bps: i64,
    pub tax_paise: i64,
    pub line_total_paise: i64,
}

impl SalesItem {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_paise(self.unit_price_paise)
    }

    #[inline]
    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.tax_rate_bps)
    }

    #[inline]
    pub fn tax_amount(&self) -> Money {
        Money::from_paise(self.tax_paise)
    }

    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_paise(self.line_total_paise)
    }
}

/// A payment received from a customer against a sales invoice.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CustomerPayment {
    pub id: String,
    pub invoice_id: String,
    pub amount_paise: i64,
    pub payment_date: NaiveDate,
    pub mode: PaymentMode,
    pub reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl CustomerPayment {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_paise(self.amount_paise)
    }
}

// =============================================================================
// Returns
// =============================================================================

/// Goods sent back to a supplier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PurchaseReturn {
    pub id: String,
    pub supplier_id: String,
    pub original_invoice_id: Option<String>,
    pub return_date: NaiveDate,
    pub reason: String,
    pub refund_total_paise: i64,
}

impl PurchaseReturn {
    #[inline]
    pub fn refund_total(&self) -> Money {
        Money::from_paise(self.refund_total_paise)
    }
}

/// A purchase-return line; carries its own refund price.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PurchaseReturnItem {
    pub id: String,
    pub return_id: String,
    pub batch_id: String,
    pub quantity: i64,
    pub refund_price_paise: i64,
}

impl PurchaseReturnItem {
    #[inline]
    pub fn refund_price(&self) -> Money {
        Money::from_paise(self.refund_price_paise)
    }
}

/// Goods taken back from a customer.
///
/// The refund value lives on this header only; items record quantity
/// alone. That asymmetry with purchase returns is deliberate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SalesReturn {
    pub id: String,
    pub customer_id: Option<String>,
    pub original_invoice_id: Option<String>,
    pub return_date: NaiveDate,
    pub refund_total_paise: i64,
}

impl SalesReturn {
    #[inline]
    pub fn refund_total(&self) -> Money {
        Money::from_paise(self.refund_total_paise)
    }
}

/// A sales-return line: quantity only, no per-item price.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SalesReturnItem {
    pub id: String,
    pub return_id: String,
    pub batch_id: String,
    pub quantity: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tax_rate_from_bps() {
        let rate = TaxRate::from_bps(900);
        assert_eq!(rate.bps(), 900);
        assert!((rate.percentage() - 9.0).abs() < 0.001);
    }

    #[test]
    fn test_tax_rate_from_percentage() {
        let rate = TaxRate::from_percentage(18.0);
        assert_eq!(rate.bps(), 1800);
    }

    #[test]
    fn test_gst_combined_excludes_igst() {
        let gst = GstRate::new(
            TaxRate::from_bps(900),
            TaxRate::from_bps(900),
            TaxRate::from_bps(1800),
        );
        assert_eq!(gst.combined().bps(), 1800);
    }

    #[test]
    fn test_payment_status_default() {
        assert_eq!(PaymentStatus::default(), PaymentStatus::Unpaid);
    }

    #[test]
    fn test_initial_payment_resolve() {
        let total = Money::from_paise(10_000);
        assert_eq!(InitialPayment::None.resolve(total), Money::zero());
        assert_eq!(
            InitialPayment::Amount(Money::from_paise(2500)).resolve(total),
            Money::from_paise(2500)
        );
        assert_eq!(InitialPayment::Full.resolve(total), total);
    }

    #[test]
    fn test_batch_expiry_helpers() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let batch = Batch {
            id: "b1".into(),
            product_id: "p1".into(),
            batch_number: "LOT-1".into(),
            manufacturing_date: None,
            expiry_date: Some(NaiveDate::from_ymd_opt(2026, 3, 15).unwrap()),
            purchase_price_paise: 0,
            mrp_paise: 0,
            selling_price_paise: 0,
            pack_size: 0.0,
            pack_unit: "kg".into(),
            current_quantity: 0,
            is_active: true,
        };

        assert_eq!(batch.days_to_expiry(today), Some(5));
        assert!(!batch.is_expired(today));

        let past = Batch {
            expiry_date: Some(NaiveDate::from_ymd_opt(2026, 3, 9).unwrap()),
            ..batch.clone()
        };
        assert!(past.is_expired(today));
        assert_eq!(past.days_to_expiry(today), Some(-1));

        let no_expiry = Batch {
            expiry_date: None,
            ..batch
        };
        assert!(!no_expiry.is_expired(today));
        assert_eq!(no_expiry.days_to_expiry(today), None);
    }

    #[test]
    fn test_purchase_invoice_overdue() {
        let today = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
        let invoice = PurchaseInvoice {
            id: "pi1".into(),
            supplier_id: "s1".into(),
            invoice_number: "PB-001".into(),
            invoice_date: NaiveDate::from_ymd_opt(2026, 4, 1).unwrap(),
            due_date: Some(NaiveDate::from_ymd_opt(2026, 5, 1).unwrap()),
            total_paise: 50_000,
            loading_charges_paise: 0,
            additional_discount_paise: 0,
            amount_paid_paise: 0,
            balance_due_paise: 50_000,
            payment_status: PaymentStatus::Unpaid,
            created_at: Utc::now(),
        };
        assert!(invoice.is_overdue(today));

        let settled = PurchaseInvoice {
            payment_status: PaymentStatus::Paid,
            ..invoice.clone()
        };
        assert!(!settled.is_overdue(today));

        let undated = PurchaseInvoice {
            due_date: None,
            ..invoice
        };
        assert!(!undated.is_overdue(today));
    }
}
