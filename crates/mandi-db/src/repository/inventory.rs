//! # Inventory Repository
//!
//! Database operations for batches and stock movements.
//!
//! ## Stock Movement Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    How Stock Moves                                      │
//! │                                                                         │
//! │  Purchase line created      ──►  apply_delta(+qty)      (unchecked)    │
//! │  Purchase edited / deleted  ──►  apply_delta(−old qty)  (unchecked)    │
//! │  Sales line created         ──►  decrease(qty)          (guarded)      │
//! │  Sale deleted               ──►  apply_delta(+qty)      (unchecked)    │
//! │  Sales return               ──►  apply_delta(+qty)      (unchecked)    │
//! │  Purchase return            ──►  decrease_for_return    (guarded)      │
//! │                                                                         │
//! │  Guarded decrease is ONE statement:                                    │
//! │                                                                         │
//! │    UPDATE batches SET current_quantity = current_quantity - ?          │
//! │    WHERE id = ? AND current_quantity >= ?                              │
//! │                                                                         │
//! │  Check and decrement cannot be split by a concurrent writer, so two    │
//! │  clerks never both sell the last bag.                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Batch Identity
//! `(product_id, batch_number, mrp_paise)` is the natural key. Purchase
//! entry upserts against it: a repeat delivery of the same lot at the
//! same MRP merges into the existing batch instead of forking a new one,
//! and blank fields on the new bill never erase what an earlier bill
//! recorded.

use chrono::NaiveDate;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use mandi_core::validation::validate_selling_price;
use mandi_core::{Batch, CoreError, Money, LOW_STOCK_THRESHOLD};

// =============================================================================
// Inputs
// =============================================================================

/// Input for the natural-key batch upsert.
#[derive(Debug, Clone)]
pub struct BatchUpsert {
    pub product_id: String,
    pub batch_number: String,
    pub manufacturing_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    /// Landed unit cost (basic rate + tax). Always refreshed on merge.
    pub purchase_price: Money,
    /// Part of the natural key; never merged.
    pub mrp: Money,
    pub selling_price: Money,
    pub pack_size: f64,
    pub pack_unit: String,
}

/// Input for editing a batch directly from the inventory screen.
#[derive(Debug, Clone)]
pub struct BatchEdit {
    pub manufacturing_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub mrp: Money,
    pub selling_price: Money,
    pub pack_size: f64,
    pub pack_unit: String,
    pub is_active: bool,
}

/// Which slice of the inventory to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockFilter {
    /// All active batches.
    All,
    /// Active batches with some stock left but under the threshold.
    LowStock,
    /// Active batches with exactly zero stock.
    OutOfStock,
    /// Active batches whose expiry date has passed.
    Expired,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for batch and stock operations.
#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: SqlitePool,
}

impl InventoryRepository {
    /// Creates a new InventoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InventoryRepository { pool }
    }

    /// Gets a batch by ID.
    pub async fn get(&self, id: &str) -> DbResult<Option<Batch>> {
        let batch = sqlx::query_as::<_, Batch>(
            r#"
            SELECT id, product_id, batch_number, manufacturing_date, expiry_date,
                   purchase_price_paise, mrp_paise, selling_price_paise,
                   pack_size, pack_unit, current_quantity, is_active
            FROM batches
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(batch)
    }

    /// Lists all batches of one product, oldest lot first.
    pub async fn for_product(&self, product_id: &str) -> DbResult<Vec<Batch>> {
        let batches = sqlx::query_as::<_, Batch>(
            r#"
            SELECT id, product_id, batch_number, manufacturing_date, expiry_date,
                   purchase_price_paise, mrp_paise, selling_price_paise,
                   pack_size, pack_unit, current_quantity, is_active
            FROM batches
            WHERE product_id = ?1
            ORDER BY expiry_date IS NULL, expiry_date, batch_number
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(batches)
    }

    /// Lists active batches matching the filter, ordered by product name
    /// then batch number.
    pub async fn list(&self, filter: StockFilter, today: NaiveDate) -> DbResult<Vec<Batch>> {
        debug!(filter = ?filter, "Listing inventory");

        let batches = match filter {
            StockFilter::All => {
                sqlx::query_as::<_, Batch>(
                    r#"
                    SELECT b.id, b.product_id, b.batch_number, b.manufacturing_date,
                           b.expiry_date, b.purchase_price_paise, b.mrp_paise,
                           b.selling_price_paise, b.pack_size, b.pack_unit,
                           b.current_quantity, b.is_active
                    FROM batches b
                    JOIN products p ON p.id = b.product_id
                    WHERE b.is_active = 1
                    ORDER BY p.name, b.batch_number
                    "#,
                )
                .fetch_all(&self.pool)
                .await?
            }
            StockFilter::LowStock => {
                sqlx::query_as::<_, Batch>(
                    r#"
                    SELECT b.id, b.product_id, b.batch_number, b.manufacturing_date,
                           b.expiry_date, b.purchase_price_paise, b.mrp_paise,
                           b.selling_price_paise, b.pack_size, b.pack_unit,
                           b.current_quantity, b.is_active
                    FROM batches b
                    JOIN products p ON p.id = b.product_id
                    WHERE b.is_active = 1
                      AND b.current_quantity > 0
                      AND b.current_quantity < ?1
                    ORDER BY p.name, b.batch_number
                    "#,
                )
                .bind(LOW_STOCK_THRESHOLD)
                .fetch_all(&self.pool)
                .await?
            }
            StockFilter::OutOfStock => {
                sqlx::query_as::<_, Batch>(
                    r#"
                    SELECT b.id, b.product_id, b.batch_number, b.manufacturing_date,
                           b.expiry_date, b.purchase_price_paise, b.mrp_paise,
                           b.selling_price_paise, b.pack_size, b.pack_unit,
                           b.current_quantity, b.is_active
                    FROM batches b
                    JOIN products p ON p.id = b.product_id
                    WHERE b.is_active = 1 AND b.current_quantity = 0
                    ORDER BY p.name, b.batch_number
                    "#,
                )
                .fetch_all(&self.pool)
                .await?
            }
            StockFilter::Expired => {
                sqlx::query_as::<_, Batch>(
                    r#"
                    SELECT b.id, b.product_id, b.batch_number, b.manufacturing_date,
                           b.expiry_date, b.purchase_price_paise, b.mrp_paise,
                           b.selling_price_paise, b.pack_size, b.pack_unit,
                           b.current_quantity, b.is_active
                    FROM batches b
                    JOIN products p ON p.id = b.product_id
                    WHERE b.is_active = 1
                      AND b.expiry_date IS NOT NULL
                      AND b.expiry_date < ?1
                    ORDER BY p.name, b.batch_number
                    "#,
                )
                .bind(today)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(batches)
    }

    /// Total purchase value of stock on hand: Σ quantity × purchase price
    /// over active batches.
    pub async fn stock_value(&self) -> DbResult<Money> {
        let paise: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT SUM(current_quantity * purchase_price_paise)
            FROM batches
            WHERE is_active = 1
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(Money::from_paise(paise.unwrap_or(0)))
    }

    /// Upserts a batch against its natural key.
    ///
    /// See [`upsert_batch`] for the merge rules.
    pub async fn upsert(&self, draft: &BatchUpsert) -> DbResult<Batch> {
        let mut conn = self.pool.acquire().await?;
        upsert_batch(&mut conn, draft).await
    }

    /// Edits a batch's descriptive fields and prices.
    ///
    /// Stock is not editable here; it only moves through the ledger
    /// operations. Selling price above MRP is rejected.
    pub async fn update_batch(&self, id: &str, edit: BatchEdit) -> DbResult<()> {
        validate_selling_price(edit.selling_price, edit.mrp)?;

        debug!(id = %id, "Updating batch");

        let result = sqlx::query(
            r#"
            UPDATE batches SET
                manufacturing_date = ?2,
                expiry_date = ?3,
                mrp_paise = ?4,
                selling_price_paise = ?5,
                pack_size = ?6,
                pack_unit = ?7,
                is_active = ?8
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(edit.manufacturing_date)
        .bind(edit.expiry_date)
        .bind(edit.mrp.paise())
        .bind(edit.selling_price.paise())
        .bind(edit.pack_size)
        .bind(&edit.pack_unit)
        .bind(edit.is_active)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Batch", id));
        }

        Ok(())
    }

    /// Activates or deactivates a batch.
    ///
    /// Deactivated batches drop out of listings and stock value but keep
    /// their history rows.
    pub async fn set_active(&self, id: &str, active: bool) -> DbResult<()> {
        debug!(id = %id, active = %active, "Setting batch active flag");

        let result = sqlx::query("UPDATE batches SET is_active = ?2 WHERE id = ?1")
            .bind(id)
            .bind(active)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Batch", id));
        }

        Ok(())
    }

    /// Guarded stock decrease; fails when the batch holds less than `quantity`.
    pub async fn decrease(&self, batch_id: &str, quantity: i64) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        decrease_stock(&mut conn, batch_id, quantity).await
    }

    /// Unchecked stock adjustment by `delta` (positive or negative).
    pub async fn apply_delta(&self, batch_id: &str, delta: i64) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        adjust_stock(&mut conn, batch_id, delta).await
    }
}

// =============================================================================
// Transaction Helpers
// =============================================================================

/// Loads a batch inside a caller's transaction.
pub(crate) async fn require_batch(conn: &mut SqliteConnection, id: &str) -> DbResult<Batch> {
    sqlx::query_as::<_, Batch>(
        r#"
        SELECT id, product_id, batch_number, manufacturing_date, expiry_date,
               purchase_price_paise, mrp_paise, selling_price_paise,
               pack_size, pack_unit, current_quantity, is_active
        FROM batches
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| DbError::not_found("Batch", id))
}

/// Guarded decrease for sales lines.
///
/// The quantity check and the decrement are a single UPDATE; zero rows
/// affected means the guard refused (or the batch is gone), and the
/// batch is fetched once more only to shape the error.
pub(crate) async fn decrease_stock(
    conn: &mut SqliteConnection,
    batch_id: &str,
    quantity: i64,
) -> DbResult<()> {
    debug!(batch_id = %batch_id, quantity = %quantity, "Decreasing stock");

    let result = sqlx::query(
        r#"
        UPDATE batches
        SET current_quantity = current_quantity - ?2
        WHERE id = ?1 AND current_quantity >= ?2
        "#,
    )
    .bind(batch_id)
    .bind(quantity)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        let batch = require_batch(conn, batch_id).await?;
        return Err(CoreError::InsufficientStock {
            batch_number: batch.batch_number,
            available: batch.current_quantity,
            requested: quantity,
        }
        .into());
    }

    Ok(())
}

/// Guarded decrease for purchase returns.
///
/// Same statement as [`decrease_stock`], different refusal wording:
/// goods being shipped back must actually be on hand.
pub(crate) async fn decrease_stock_for_return(
    conn: &mut SqliteConnection,
    batch_id: &str,
    quantity: i64,
) -> DbResult<()> {
    debug!(batch_id = %batch_id, quantity = %quantity, "Decreasing stock for return");

    let result = sqlx::query(
        r#"
        UPDATE batches
        SET current_quantity = current_quantity - ?2
        WHERE id = ?1 AND current_quantity >= ?2
        "#,
    )
    .bind(batch_id)
    .bind(quantity)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        let batch = require_batch(conn, batch_id).await?;
        return Err(CoreError::ReturnExceedsStock {
            batch_number: batch.batch_number,
            requested: quantity,
            available: batch.current_quantity,
        }
        .into());
    }

    Ok(())
}

/// Unchecked stock adjustment.
///
/// Used for increases and for reversals during invoice edit/delete,
/// where the goods movement already happened and must be undone even if
/// some were sold in between.
pub(crate) async fn adjust_stock(
    conn: &mut SqliteConnection,
    batch_id: &str,
    delta: i64,
) -> DbResult<()> {
    debug!(batch_id = %batch_id, delta = %delta, "Adjusting stock");

    let result = sqlx::query(
        r#"
        UPDATE batches
        SET current_quantity = current_quantity + ?2
        WHERE id = ?1
        "#,
    )
    .bind(batch_id)
    .bind(delta)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Batch", batch_id));
    }

    Ok(())
}

/// Atomic get-or-create against the (product, batch_number, MRP) key.
///
/// ## Merge Rules
/// On conflict with an existing batch:
/// - `purchase_price` is always overwritten with the latest landed cost
/// - dates only fill in when the incoming value is present
/// - `selling_price`, `pack_size`, `pack_unit` only overwrite when the
///   incoming value is non-empty/non-zero
/// - stock is untouched; the caller moves it separately
pub(crate) async fn upsert_batch(
    conn: &mut SqliteConnection,
    draft: &BatchUpsert,
) -> DbResult<Batch> {
    let id = Uuid::new_v4().to_string();
    debug!(
        product_id = %draft.product_id,
        batch_number = %draft.batch_number,
        "Upserting batch"
    );

    let batch = sqlx::query_as::<_, Batch>(
        r#"
        INSERT INTO batches (
            id, product_id, batch_number, manufacturing_date, expiry_date,
            purchase_price_paise, mrp_paise, selling_price_paise,
            pack_size, pack_unit, current_quantity, is_active
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 0, 1)
        ON CONFLICT(product_id, batch_number, mrp_paise) DO UPDATE SET
            manufacturing_date = COALESCE(excluded.manufacturing_date, manufacturing_date),
            expiry_date = COALESCE(excluded.expiry_date, expiry_date),
            purchase_price_paise = excluded.purchase_price_paise,
            selling_price_paise = CASE
                WHEN excluded.selling_price_paise > 0 THEN excluded.selling_price_paise
                ELSE selling_price_paise
            END,
            pack_size = CASE
                WHEN excluded.pack_size > 0 THEN excluded.pack_size
                ELSE pack_size
            END,
            pack_unit = CASE
                WHEN excluded.pack_unit <> '' THEN excluded.pack_unit
                ELSE pack_unit
            END
        RETURNING id, product_id, batch_number, manufacturing_date, expiry_date,
                  purchase_price_paise, mrp_paise, selling_price_paise,
                  pack_size, pack_unit, current_quantity, is_active
        "#,
    )
    .bind(&id)
    .bind(&draft.product_id)
    .bind(&draft.batch_number)
    .bind(draft.manufacturing_date)
    .bind(draft.expiry_date)
    .bind(draft.purchase_price.paise())
    .bind(draft.mrp.paise())
    .bind(draft.selling_price.paise())
    .bind(draft.pack_size)
    .bind(&draft.pack_unit)
    .fetch_one(&mut *conn)
    .await?;

    Ok(batch)
}

// =============================================================================
// Unit Tests
// =============================================================================
