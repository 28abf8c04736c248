//! # mandi-db: Database Layer for the Mandi Back Office
//!
//! This crate provides database access for the mandi back office.
//! It uses SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Mandi Data Flow                                  │
//! │                                                                         │
//! │  Caller (create_purchase, record_payment, dashboard, ...)              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     mandi-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ (repository/) │    │  (embedded)  │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ SqlitePool    │    │ CatalogRepo   │    │ 001_init.sql │  │   │
//! │  │   │ Connection    │◄───│ PurchaseRepo  │    │ ...          │  │   │
//! │  │   │ Management    │    │ SalesRepo ... │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   WAL journal, foreign keys ON, every write in a transaction   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All arithmetic (pricing, settlement, report derivations) lives in
//! `mandi-core`; this crate only moves rows and keeps the write paths
//! atomic. Stock changes, invoice headers and payment rows always move
//! together or not at all.
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (catalog, purchase, ...)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mandi_db::{Database, DbConfig};
//!
//! // Create database with default config
//! let config = DbConfig::new("path/to/mandi.db");
//! let db = Database::new(config).await?;
//!
//! // Use repositories
//! let invoice = db.purchases().create(draft, &rows).await?;
//! let low = db.inventory().list(StockFilter::LowStock, today).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::catalog::CatalogRepository;
pub use repository::inventory::{InventoryRepository, StockFilter};
pub use repository::party::PartyRepository;
pub use repository::purchase::PurchaseRepository;
pub use repository::reports::ReportsRepository;
pub use repository::returns::ReturnsRepository;
pub use repository::sales::SalesRepository;
