//! # Repository Module
//!
//! Database repository implementations for the mandi back office.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  Caller                                                                 │
//! │       │                                                                 │
//! │       │  db.purchases().create(draft, &rows)                            │
//! │       │  ↓                                                              │
//! │       ▼                                                                 │
//! │  PurchaseRepository                                                    │
//! │  ├── begin transaction                                                 │
//! │  ├── price lines (mandi-core), upsert batches, move stock              │
//! │  ├── settle the header (mandi-core)                                    │
//! │  └── commit, or roll everything back on the first error                │
//! │       │                                                                 │
//! │       │  SQL                                                            │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Cross-repository steps that must share a transaction (a purchase
//! upserting batches, a sale decrementing stock) go through `pub(crate)`
//! helpers that take a `&mut SqliteConnection`, so the caller's
//! transaction stays in charge.
//!
//! ## Available Repositories
//!
//! - [`catalog::CatalogRepository`] - Categories, manufacturers, products
//! - [`party::PartyRepository`] - Suppliers and customers
//! - [`inventory::InventoryRepository`] - Batches and stock movements
//! - [`purchase::PurchaseRepository`] - Purchase invoices and supplier payments
//! - [`sales::SalesRepository`] - Sales invoices and customer payments
//! - [`returns::ReturnsRepository`] - Purchase and sales returns
//! - [`reports::ReportsRepository`] - Read-only aggregates

pub mod catalog;
pub mod inventory;
pub mod party;
pub mod purchase;
pub mod reports;
pub mod returns;
pub mod sales;
