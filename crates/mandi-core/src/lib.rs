//! # mandi-core: Pure Business Logic for the Mandi Back Office
//!
//! This crate is the **heart** of the system. It contains all business
//! logic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Mandi Architecture                                │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Entry Surface (out of scope here)               │   │
//! │  │    purchase grid ──► sales grid ──► payments ──► reports        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ row-parallel arrays                    │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ mandi-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │    tax    │  │  settle   │  │   │
//! │  │   │  Batch    │  │   Money   │  │ GST split │  │ reconcile │  │   │
//! │  │   │  Invoice  │  │  TaxRate  │  │  pricing  │  │  status   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐                 │   │
//! │  │   │   rows    │  │ reporting │  │ validation│     export      │   │
//! │  │   │ grid→typed│  │  trends   │  │   rules   │      CSV        │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘                 │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    mandi-db (Database Layer)                    │   │
//! │  │          SQLite repositories, migrations, transactions          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Batch, invoices, payments, returns)
//! - [`money`] - Money type with integer paise arithmetic (no floating point!)
//! - [`tax`] - GST pricing for purchase and sales lines
//! - [`settle`] - Payment settlement derivation
//! - [`rows`] - Entry-grid decoding (row-parallel arrays → typed rows)
//! - [`reporting`] - Monthly overview derivations
//! - [`validation`] - Business rule validation
//! - [`export`] - Customer CSV formatting
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in paise (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use mandi_core::money::Money;
//! use mandi_core::settle::settle;
//! use mandi_core::tax::price_purchase_line;
//! use mandi_core::types::{PaymentStatus, TaxRate};
//!
//! // 10 bags at ₹100 basic rate, 18% GST
//! let line = price_purchase_line(Money::from_rupees(100, 0), 10, TaxRate::from_bps(1800));
//! assert_eq!(line.line_total, Money::from_rupees(1180, 0));
//!
//! // Settle the invoice against a part payment
//! let s = settle(line.line_total, Money::from_rupees(1000, 0));
//! assert_eq!(s.status, PaymentStatus::Partial);
//! assert_eq!(s.balance_due, Money::from_rupees(180, 0));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod export;
pub mod money;
pub mod reporting;
pub mod rows;
pub mod settle;
pub mod tax;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use mandi_core::Money` instead of
// `use mandi_core::money::Money`

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use settle::{settle, Settlement, SETTLEMENT_EPSILON};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Batches with fewer units than this count as "low stock".
///
/// ## Business Reason
/// A fertilizer counter reorders by the bag, not the unit; single-digit
/// stock on any batch is the operator's cue to reorder.
pub const LOW_STOCK_THRESHOLD: i64 = 10;

/// Days ahead the dashboard looks for expiring batches.
pub const EXPIRING_SOON_DAYS: i64 = 30;

/// Window for the accounts-payable list to keep showing recently
/// settled invoices.
pub const RECENTLY_SETTLED_DAYS: i64 = 30;

/// Prefix for auto-generated sales invoice numbers
/// (`INV-%Y%m%d%H%M%S`).
pub const SALES_INVOICE_PREFIX: &str = "INV-";
