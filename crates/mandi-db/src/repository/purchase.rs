//! # Purchase Repository
//!
//! Supplier invoices: multi-row entry, batch upserts, payments, and
//! settlement.
//!
//! ## Create Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  PurchaseRows (grid columns)                                            │
//! │        │ decode                                                         │
//! │        ▼                                                                │
//! │  for each row:                                                          │
//! │    resolve product by exact name ──► category ──► combined GST rate    │
//! │    price line (tax per unit × qty)                                     │
//! │    upsert batch (landed cost refreshed) ──► stock += qty               │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  total = Σ line totals + loading charges − additional discount         │
//! │  settle(total, initial payment) ──► header + items inserted            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything above runs in one transaction; a bad row anywhere rolls
//! back every batch and stock write.
//!
//! ## Payment Bookkeeping
//! An initial payment at creation marks the header only. Payments
//! recorded afterwards are real `supplier_payments` rows, and every
//! recorded or deleted payment re-derives the header's paid amount from
//! the sum of its rows.

use chrono::{Duration, NaiveDate, Utc};
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::catalog::{require_category, require_product_by_name};
use crate::repository::inventory::{adjust_stock, upsert_batch, BatchUpsert};
use crate::repository::party::require_supplier;
use mandi_core::rows::{PurchaseRow, PurchaseRows};
use mandi_core::tax::{margin_percentage, price_purchase_line};
use mandi_core::validation::{validate_payment_amount, validate_quantity};
use mandi_core::{
    settle, CoreError, InitialPayment, Money, PaymentMode, PaymentStatus, PurchaseInvoice,
    PurchaseItem, SupplierPayment, ValidationError,
};

// =============================================================================
// Inputs
// =============================================================================

/// Header fields of a purchase entry.
#[derive(Debug, Clone)]
pub struct PurchaseDraft {
    pub supplier_id: String,
    pub invoice_number: String,
    pub invoice_date: NaiveDate,
    /// Defaults to invoice date + the supplier's credit period.
    pub due_date: Option<NaiveDate>,
    pub loading_charges: Money,
    pub additional_discount: Money,
    /// Only honored on create; edits keep the money already recorded.
    pub initial_payment: InitialPayment,
}

/// Input for recording a payment to a supplier.
#[derive(Debug, Clone)]
pub struct SupplierPaymentDraft {
    pub invoice_id: String,
    pub amount: Money,
    pub payment_date: NaiveDate,
    pub mode: PaymentMode,
    pub reference: Option<String>,
    pub notes: String,
}

// =============================================================================
// Detail Views
// =============================================================================

/// A purchase invoice with everything the detail screen shows.
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseDetail {
    pub invoice: PurchaseInvoice,
    pub supplier_name: String,
    pub items: Vec<PurchaseItemDetail>,
    /// Σ basic rate × quantity, before tax and charges.
    pub subtotal: Money,
    pub tax_total: Money,
}

/// One line of the detail view.
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseItemDetail {
    pub item: PurchaseItem,
    pub product_name: String,
    pub batch_number: String,
    /// Margin from the entered basic rate to the batch's current
    /// selling price.
    pub margin_pct: f64,
}

#[derive(sqlx::FromRow)]
struct PurchaseItemRow {
    #[sqlx(flatten)]
    item: PurchaseItem,
    product_name: String,
    batch_number: String,
    batch_selling_paise: i64,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for purchase invoices and supplier payments.
#[derive(Debug, Clone)]
pub struct PurchaseRepository {
    pool: SqlitePool,
}

impl PurchaseRepository {
    /// Creates a new PurchaseRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PurchaseRepository { pool }
    }

    /// Creates a purchase invoice from the entry grid.
    ///
    /// Batches are upserted and stocked, the header is settled against
    /// the initial payment, and the whole entry commits or rolls back
    /// as one unit.
    pub async fn create(
        &self,
        draft: PurchaseDraft,
        rows: &PurchaseRows,
    ) -> DbResult<PurchaseInvoice> {
        let rows = rows.rows()?;
        if rows.is_empty() {
            return Err(ValidationError::Required {
                field: "items".to_string(),
            }
            .into());
        }

        let mut tx = self.pool.begin().await?;

        let supplier = require_supplier(&mut tx, &draft.supplier_id).await?;
        let due_date = draft
            .due_date
            .unwrap_or(draft.invoice_date + Duration::days(supplier.credit_period_days));

        let invoice_id = Uuid::new_v4().to_string();
        let (items, items_total) = prepare_lines(&mut tx, &invoice_id, &rows).await?;

        let total = items_total + draft.loading_charges - draft.additional_discount;
        let paid = draft.initial_payment.resolve(total);
        let settlement = settle(total, paid);
        let created_at = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO purchase_invoices (
                id, supplier_id, invoice_number, invoice_date, due_date,
                total_paise, loading_charges_paise, additional_discount_paise,
                amount_paid_paise, balance_due_paise, payment_status, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&invoice_id)
        .bind(&draft.supplier_id)
        .bind(&draft.invoice_number)
        .bind(draft.invoice_date)
        .bind(due_date)
        .bind(total.paise())
        .bind(draft.loading_charges.paise())
        .bind(draft.additional_discount.paise())
        .bind(settlement.amount_paid.paise())
        .bind(settlement.balance_due.paise())
        .bind(settlement.status)
        .bind(created_at)
        .execute(&mut *tx)
        .await?;

        insert_items(&mut tx, &items).await?;
        tx.commit().await?;

        info!(
            invoice_number = %draft.invoice_number,
            lines = items.len(),
            total = %total,
            "Created purchase invoice"
        );

        Ok(PurchaseInvoice {
            id: invoice_id,
            supplier_id: draft.supplier_id,
            invoice_number: draft.invoice_number,
            invoice_date: draft.invoice_date,
            due_date: Some(due_date),
            total_paise: total.paise(),
            loading_charges_paise: draft.loading_charges.paise(),
            additional_discount_paise: draft.additional_discount.paise(),
            amount_paid_paise: settlement.amount_paid.paise(),
            balance_due_paise: settlement.balance_due.paise(),
            payment_status: settlement.status,
            created_at,
        })
    }

    /// Replaces an invoice's lines and header with a fresh entry.
    ///
    /// Old lines hand their stock back first, then the new grid is
    /// applied exactly as on create. The money already recorded on the
    /// invoice stays put and the header re-settles against it, so a
    /// paid invoice whose total grows reopens as partial.
    pub async fn edit(
        &self,
        invoice_id: &str,
        draft: PurchaseDraft,
        rows: &PurchaseRows,
    ) -> DbResult<PurchaseInvoice> {
        let rows = rows.rows()?;
        if rows.is_empty() {
            return Err(ValidationError::Required {
                field: "items".to_string(),
            }
            .into());
        }

        let mut tx = self.pool.begin().await?;

        let existing = fetch_invoice(&mut tx, invoice_id)
            .await?
            .ok_or_else(|| DbError::not_found("Purchase invoice", invoice_id))?;

        let old_items = fetch_items(&mut tx, invoice_id).await?;
        for item in &old_items {
            adjust_stock(&mut tx, &item.batch_id, -item.quantity).await?;
        }
        sqlx::query("DELETE FROM purchase_items WHERE invoice_id = ?1")
            .bind(invoice_id)
            .execute(&mut *tx)
            .await?;

        let supplier = require_supplier(&mut tx, &draft.supplier_id).await?;
        let due_date = draft
            .due_date
            .unwrap_or(draft.invoice_date + Duration::days(supplier.credit_period_days));

        let (items, items_total) = prepare_lines(&mut tx, invoice_id, &rows).await?;

        let total = items_total + draft.loading_charges - draft.additional_discount;
        let settlement = settle(total, existing.amount_paid());

        sqlx::query(
            r#"
            UPDATE purchase_invoices SET
                supplier_id = ?2,
                invoice_number = ?3,
                invoice_date = ?4,
                due_date = ?5,
                total_paise = ?6,
                loading_charges_paise = ?7,
                additional_discount_paise = ?8,
                amount_paid_paise = ?9,
                balance_due_paise = ?10,
                payment_status = ?11
            WHERE id = ?1
            "#,
        )
        .bind(invoice_id)
        .bind(&draft.supplier_id)
        .bind(&draft.invoice_number)
        .bind(draft.invoice_date)
        .bind(due_date)
        .bind(total.paise())
        .bind(draft.loading_charges.paise())
        .bind(draft.additional_discount.paise())
        .bind(settlement.amount_paid.paise())
        .bind(settlement.balance_due.paise())
        .bind(settlement.status)
        .execute(&mut *tx)
        .await?;

        insert_items(&mut tx, &items).await?;
        tx.commit().await?;

        info!(
            invoice_number = %draft.invoice_number,
            total = %total,
            "Edited purchase invoice"
        );

        Ok(PurchaseInvoice {
            id: invoice_id.to_string(),
            supplier_id: draft.supplier_id,
            invoice_number: draft.invoice_number,
            invoice_date: draft.invoice_date,
            due_date: Some(due_date),
            total_paise: total.paise(),
            loading_charges_paise: draft.loading_charges.paise(),
            additional_discount_paise: draft.additional_discount.paise(),
            amount_paid_paise: settlement.amount_paid.paise(),
            balance_due_paise: settlement.balance_due.paise(),
            payment_status: settlement.status,
            created_at: existing.created_at,
        })
    }

    /// Deletes an invoice, handing its stock back and cascading its
    /// line items and payments.
    pub async fn delete(&self, invoice_id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        if fetch_invoice(&mut tx, invoice_id).await?.is_none() {
            return Err(DbError::not_found("Purchase invoice", invoice_id));
        }

        let items = fetch_items(&mut tx, invoice_id).await?;
        for item in &items {
            adjust_stock(&mut tx, &item.batch_id, -item.quantity).await?;
        }

        sqlx::query("DELETE FROM purchase_invoices WHERE id = ?1")
            .bind(invoice_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        info!(invoice_id = %invoice_id, "Deleted purchase invoice");
        Ok(())
    }

    /// Gets an invoice header by ID.
    pub async fn get(&self, invoice_id: &str) -> DbResult<Option<PurchaseInvoice>> {
        let mut conn = self.pool.acquire().await?;
        fetch_invoice(&mut conn, invoice_id).await
    }

    /// Lists invoices, newest first, optionally filtered by settlement
    /// status.
    pub async fn list(
        &self,
        status: Option<PaymentStatus>,
        limit: u32,
    ) -> DbResult<Vec<PurchaseInvoice>> {
        let invoices = match status {
            Some(status) => {
                sqlx::query_as::<_, PurchaseInvoice>(
                    r#"
                    SELECT id, supplier_id, invoice_number, invoice_date, due_date,
                           total_paise, loading_charges_paise, additional_discount_paise,
                           amount_paid_paise, balance_due_paise, payment_status, created_at
                    FROM purchase_invoices
                    WHERE payment_status = ?1
                    ORDER BY invoice_date DESC, created_at DESC
                    LIMIT ?2
                    "#,
                )
                .bind(status)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, PurchaseInvoice>(
                    r#"
                    SELECT id, supplier_id, invoice_number, invoice_date, due_date,
                           total_paise, loading_charges_paise, additional_discount_paise,
                           amount_paid_paise, balance_due_paise, payment_status, created_at
                    FROM purchase_invoices
                    ORDER BY invoice_date DESC, created_at DESC
                    LIMIT ?1
                    "#,
                )
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(invoices)
    }

    /// Loads the full detail view of one invoice.
    pub async fn get_detail(&self, invoice_id: &str) -> DbResult<PurchaseDetail> {
        let mut conn = self.pool.acquire().await?;

        let invoice = fetch_invoice(&mut conn, invoice_id)
            .await?
            .ok_or_else(|| DbError::not_found("Purchase invoice", invoice_id))?;

        let supplier = require_supplier(&mut conn, &invoice.supplier_id).await?;

        let rows = sqlx::query_as::<_, PurchaseItemRow>(
            r#"
            SELECT pi.id, pi.invoice_id, pi.batch_id, pi.quantity,
                   pi.basic_rate_paise, pi.tax_paise, pi.selling_price_paise,
                   pi.margin_bps, pi.line_total_paise,
                   p.name AS product_name,
                   b.batch_number,
                   b.selling_price_paise AS batch_selling_paise
            FROM purchase_items pi
            JOIN batches b ON b.id = pi.batch_id
            JOIN products p ON p.id = b.product_id
            WHERE pi.invoice_id = ?1
            ORDER BY pi.rowid
            "#,
        )
        .bind(invoice_id)
        .fetch_all(&mut *conn)
        .await?;

        let mut subtotal = Money::zero();
        let mut tax_total = Money::zero();
        let items = rows
            .into_iter()
            .map(|row| {
                subtotal += row.item.basic_rate().multiply_quantity(row.item.quantity);
                tax_total += row.item.tax_amount();
                PurchaseItemDetail {
                    margin_pct: margin_percentage(
                        row.item.basic_rate(),
                        Money::from_paise(row.batch_selling_paise),
                    ),
                    product_name: row.product_name,
                    batch_number: row.batch_number,
                    item: row.item,
                }
            })
            .collect();

        Ok(PurchaseDetail {
            invoice,
            supplier_name: supplier.name,
            items,
            subtotal,
            tax_total,
        })
    }

    /// Records a payment to a supplier and re-settles the invoice from
    /// the sum of its payment rows.
    ///
    /// Wallet is a customer-side mode and is refused here.
    pub async fn record_payment(&self, draft: SupplierPaymentDraft) -> DbResult<SupplierPayment> {
        validate_payment_amount(draft.amount)?;
        if matches!(draft.mode, PaymentMode::Wallet) {
            return Err(CoreError::UnsupportedPaymentMode {
                mode: PaymentMode::Wallet,
            }
            .into());
        }

        let mut tx = self.pool.begin().await?;

        let invoice = fetch_invoice(&mut tx, &draft.invoice_id)
            .await?
            .ok_or_else(|| DbError::not_found("Purchase invoice", &draft.invoice_id))?;

        let id = Uuid::new_v4().to_string();
        let created_at = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO supplier_payments (
                id, invoice_id, amount_paise, payment_date, mode,
                reference, notes, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&id)
        .bind(&draft.invoice_id)
        .bind(draft.amount.paise())
        .bind(draft.payment_date)
        .bind(draft.mode)
        .bind(&draft.reference)
        .bind(&draft.notes)
        .bind(created_at)
        .execute(&mut *tx)
        .await?;

        resettle_invoice(&mut tx, &invoice).await?;
        tx.commit().await?;

        info!(
            invoice_number = %invoice.invoice_number,
            amount = %draft.amount,
            "Recorded supplier payment"
        );

        Ok(SupplierPayment {
            id,
            invoice_id: draft.invoice_id,
            amount_paise: draft.amount.paise(),
            payment_date: draft.payment_date,
            mode: draft.mode,
            reference: draft.reference,
            notes: draft.notes,
            created_at,
        })
    }

    /// Deletes a payment and re-settles its invoice; a paid invoice
    /// reopens.
    pub async fn delete_payment(&self, payment_id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let payment = sqlx::query_as::<_, SupplierPayment>(
            r#"
            SELECT id, invoice_id, amount_paise, payment_date, mode,
                   reference, notes, created_at
            FROM supplier_payments
            WHERE id = ?1
            "#,
        )
        .bind(payment_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("Payment", payment_id))?;

        sqlx::query("DELETE FROM supplier_payments WHERE id = ?1")
            .bind(payment_id)
            .execute(&mut *tx)
            .await?;

        let invoice = fetch_invoice(&mut tx, &payment.invoice_id)
            .await?
            .ok_or_else(|| DbError::not_found("Purchase invoice", &payment.invoice_id))?;
        resettle_invoice(&mut tx, &invoice).await?;

        tx.commit().await?;
        debug!(payment_id = %payment_id, "Deleted supplier payment");
        Ok(())
    }

    /// Lists an invoice's payments, newest first.
    pub async fn list_payments(&self, invoice_id: &str) -> DbResult<Vec<SupplierPayment>> {
        let payments = sqlx::query_as::<_, SupplierPayment>(
            r#"
            SELECT id, invoice_id, amount_paise, payment_date, mode,
                   reference, notes, created_at
            FROM supplier_payments
            WHERE invoice_id = ?1
            ORDER BY payment_date DESC, created_at DESC
            "#,
        )
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }
}

// =============================================================================
// Internals
// =============================================================================

async fn fetch_invoice(
    conn: &mut SqliteConnection,
    invoice_id: &str,
) -> DbResult<Option<PurchaseInvoice>> {
    let invoice = sqlx::query_as::<_, PurchaseInvoice>(
        r#"
        SELECT id, supplier_id, invoice_number, invoice_date, due_date,
               total_paise, loading_charges_paise, additional_discount_paise,
               amount_paid_paise, balance_due_paise, payment_status, created_at
        FROM purchase_invoices
        WHERE id = ?1
        "#,
    )
    .bind(invoice_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(invoice)
}

async fn fetch_items(
    conn: &mut SqliteConnection,
    invoice_id: &str,
) -> DbResult<Vec<PurchaseItem>> {
    let items = sqlx::query_as::<_, PurchaseItem>(
        r#"
        SELECT id, invoice_id, batch_id, quantity, basic_rate_paise,
               tax_paise, selling_price_paise, margin_bps, line_total_paise
        FROM purchase_items
        WHERE invoice_id = ?1
        ORDER BY rowid
        "#,
    )
    .bind(invoice_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(items)
}

/// Resolves, prices, and stocks every grid row. Returns the items ready
/// to insert (once the header exists) and their summed line total.
async fn prepare_lines(
    conn: &mut SqliteConnection,
    invoice_id: &str,
    rows: &[PurchaseRow],
) -> DbResult<(Vec<PurchaseItem>, Money)> {
    let mut items = Vec::with_capacity(rows.len());
    let mut items_total = Money::zero();

    for row in rows {
        validate_quantity(row.quantity)?;
        let product = require_product_by_name(conn, &row.product_name).await?;
        let category = require_category(conn, &product.category_id).await?;
        let pricing = price_purchase_line(row.basic_rate, row.quantity, category.combined_rate());

        let batch = upsert_batch(
            conn,
            &BatchUpsert {
                product_id: product.id,
                batch_number: row.batch_number.clone(),
                manufacturing_date: row.mfg_date,
                expiry_date: row.expiry_date,
                purchase_price: pricing.net_cost_per_unit,
                mrp: row.mrp,
                selling_price: row.selling_price,
                pack_size: row.pack_size,
                pack_unit: row.pack_unit.clone(),
            },
        )
        .await?;
        adjust_stock(conn, &batch.id, row.quantity).await?;

        items_total += pricing.line_total;
        items.push(PurchaseItem {
            id: Uuid::new_v4().to_string(),
            invoice_id: invoice_id.to_string(),
            batch_id: batch.id,
            quantity: row.quantity,
            basic_rate_paise: row.basic_rate.paise(),
            tax_paise: pricing.tax_amount.paise(),
            selling_price_paise: row.selling_price.paise(),
            margin_bps: row.margin_bps,
            line_total_paise: pricing.line_total.paise(),
        });
    }

    Ok((items, items_total))
}

async fn insert_items(conn: &mut SqliteConnection, items: &[PurchaseItem]) -> DbResult<()> {
    for item in items {
        sqlx::query(
            r#"
            INSERT INTO purchase_items (
                id, invoice_id, batch_id, quantity, basic_rate_paise,
                tax_paise, selling_price_paise, margin_bps, line_total_paise
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&item.id)
        .bind(&item.invoice_id)
        .bind(&item.batch_id)
        .bind(item.quantity)
        .bind(item.basic_rate_paise)
        .bind(item.tax_paise)
        .bind(item.selling_price_paise)
        .bind(item.margin_bps)
        .bind(item.line_total_paise)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/// Re-derives the header's paid amount from the sum of its payment
/// rows and writes the settlement back.
async fn resettle_invoice(
    conn: &mut SqliteConnection,
    invoice: &PurchaseInvoice,
) -> DbResult<()> {
    let paid: Option<i64> =
        sqlx::query_scalar("SELECT SUM(amount_paise) FROM supplier_payments WHERE invoice_id = ?1")
            .bind(&invoice.id)
            .fetch_one(&mut *conn)
            .await?;

    let settlement = settle(invoice.total(), Money::from_paise(paid.unwrap_or(0)));

    sqlx::query(
        r#"
        UPDATE purchase_invoices SET
            amount_paid_paise = ?2,
            balance_due_paise = ?3,
            payment_status = ?4
        WHERE id = ?1
        "#,
    )
    .bind(&invoice.id)
    .bind(settlement.amount_paid.paise())
    .bind(settlement.balance_due.paise())
    .bind(settlement.status)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
