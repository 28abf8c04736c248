//! # Sales Repository
//!
//! Customer invoices: guarded stock decrease, GST split, payments, and
//! the customer wallet.
//!
//! ## Create Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SalesRows (grid columns)                                               │
//! │        │ decode                                                         │
//! │        ▼                                                                │
//! │  for each row:                                                          │
//! │    load batch ──► product's category ──► combined GST rate (frozen)    │
//! │    guarded stock decrease (refuses past available quantity)            │
//! │    price line: taxable, tax, CGST ⌊tax/2⌋, SGST carries the odd paisa  │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  settle(grand total, initial payment)                                  │
//! │  money received up front becomes a real customer_payments row          │
//! │  wallet mode additionally debits the customer's stored credit          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wallet
//! A wallet payment spends the customer's stored credit, so it always
//! needs a customer on the invoice. The balance may go negative; the
//! ledger records what happened at the counter rather than refusing
//! the sale. Deleting a wallet payment (or the whole invoice) credits
//! the money back.

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::inventory::{adjust_stock, decrease_stock, require_batch};
use crate::repository::party::{adjust_wallet, require_customer};
use mandi_core::rows::SalesRows;
use mandi_core::tax::price_sales_line;
use mandi_core::validation::{validate_payment_amount, validate_uuid};
use mandi_core::{
    settle, CustomerPayment, InitialPayment, Money, PaymentMode, PaymentStatus, SalesInvoice,
    SalesItem, TaxRate, ValidationError, SALES_INVOICE_PREFIX,
};

// =============================================================================
// Inputs
// =============================================================================

/// Header fields of a sale entry.
#[derive(Debug, Clone)]
pub struct SalesDraft {
    /// None for walk-in sales.
    pub customer_id: Option<String>,
    /// Generated as `INV-<timestamp>` when not supplied.
    pub invoice_number: Option<String>,
    pub invoice_date: NaiveDate,
    pub initial_payment: InitialPayment,
    /// Mode recorded for the initial payment.
    pub payment_mode: PaymentMode,
}

/// Input for recording a payment from a customer.
#[derive(Debug, Clone)]
pub struct CustomerPaymentDraft {
    pub invoice_id: String,
    pub amount: Money,
    pub payment_date: NaiveDate,
    pub mode: PaymentMode,
    pub reference: Option<String>,
}

// =============================================================================
// Detail Views
// =============================================================================

/// A sales invoice with the lines as the bill shows them.
#[derive(Debug, Clone, Serialize)]
pub struct SalesDetail {
    pub invoice: SalesInvoice,
    pub customer_name: Option<String>,
    pub items: Vec<SalesItemDetail>,
}

/// One line of the bill.
#[derive(Debug, Clone, Serialize)]
pub struct SalesItemDetail {
    pub item: SalesItem,
    pub product_name: String,
    pub batch_number: String,
}

#[derive(sqlx::FromRow)]
struct SalesItemRow {
    #[sqlx(flatten)]
    item: SalesItem,
    product_name: String,
    batch_number: String,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for sales invoices and customer payments.
#[derive(Debug, Clone)]
pub struct SalesRepository {
    pool: SqlitePool,
}

impl SalesRepository {
    /// Creates a new SalesRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SalesRepository { pool }
    }

    /// Creates a sales invoice from the entry grid.
    ///
    /// Stock comes off every line's batch under the guard; the GST rate
    /// in force for each product is frozen onto its line. Money taken
    /// at the counter is recorded as a payment row in the draft's mode.
    pub async fn create(&self, draft: SalesDraft, rows: &SalesRows) -> DbResult<SalesInvoice> {
        let rows = rows.rows()?;
        if rows.is_empty() {
            return Err(ValidationError::Required {
                field: "items".to_string(),
            }
            .into());
        }

        let mut tx = self.pool.begin().await?;

        if let Some(customer_id) = &draft.customer_id {
            require_customer(&mut tx, customer_id).await?;
        }

        let invoice_id = Uuid::new_v4().to_string();
        let invoice_number = draft.invoice_number.clone().unwrap_or_else(|| {
            format!("{}{}", SALES_INVOICE_PREFIX, Utc::now().format("%Y%m%d%H%M%S"))
        });

        let mut taxable = Money::zero();
        let mut cgst = Money::zero();
        let mut sgst = Money::zero();
        let mut grand_total = Money::zero();
        let mut items = Vec::with_capacity(rows.len());

        for row in &rows {
            validate_uuid(&row.batch_id, "batch id")?;
            let batch = require_batch(&mut tx, &row.batch_id).await?;
            let rate_bps: i64 = sqlx::query_scalar(
                r#"
                SELECT c.cgst_bps + c.sgst_bps
                FROM products p
                JOIN categories c ON c.id = p.category_id
                WHERE p.id = ?1
                "#,
            )
            .bind(&batch.product_id)
            .fetch_one(&mut *tx)
            .await?;

            decrease_stock(&mut tx, &batch.id, row.quantity).await?;

            let pricing = price_sales_line(row.unit_price, row.quantity, TaxRate::from_bps(rate_bps));
            taxable += pricing.taxable;
            cgst += pricing.cgst;
            sgst += pricing.sgst;
            grand_total += pricing.line_total;

            items.push(SalesItem {
                id: Uuid::new_v4().to_string(),
                invoice_id: invoice_id.clone(),
                batch_id: batch.id,
                quantity: row.quantity,
                unit_price_paise: row.unit_price.paise(),
                tax_rate_bps: rate_bps,
                tax_paise: pricing.tax_amount.paise(),
                line_total_paise: pricing.line_total.paise(),
            });
        }

        let paid = draft.initial_payment.resolve(grand_total);
        let settlement = settle(grand_total, paid);
        let created_at = Utc::now();

        if paid.is_positive() && matches!(draft.payment_mode, PaymentMode::Wallet) {
            let customer_id = draft.customer_id.as_deref().ok_or(ValidationError::Required {
                field: "customer".to_string(),
            })?;
            adjust_wallet(&mut tx, customer_id, -paid.paise()).await?;
        }

        sqlx::query(
            r#"
            INSERT INTO sales_invoices (
                id, customer_id, invoice_number, invoice_date,
                taxable_paise, cgst_paise, sgst_paise, grand_total_paise,
                amount_received_paise, balance_due_paise, payment_status, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&invoice_id)
        .bind(&draft.customer_id)
        .bind(&invoice_number)
        .bind(draft.invoice_date)
        .bind(taxable.paise())
        .bind(cgst.paise())
        .bind(sgst.paise())
        .bind(grand_total.paise())
        .bind(settlement.amount_paid.paise())
        .bind(settlement.balance_due.paise())
        .bind(settlement.status)
        .bind(created_at)
        .execute(&mut *tx)
        .await?;

        for item in &items {
            sqlx::query(
                r#"
                INSERT INTO sales_items (
                    id, invoice_id, batch_id, quantity, unit_price_paise,
                    tax_rate_bps, tax_paise, line_total_paise
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )
            .bind(&item.id)
            .bind(&item.invoice_id)
            .bind(&item.batch_id)
            .bind(item.quantity)
            .bind(item.unit_price_paise)
            .bind(item.tax_rate_bps)
            .bind(item.tax_paise)
            .bind(item.line_total_paise)
            .execute(&mut *tx)
            .await?;
        }

        if paid.is_positive() {
            sqlx::query(
                r#"
                INSERT INTO customer_payments (
                    id, invoice_id, amount_paise, payment_date, mode, reference, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&invoice_id)
            .bind(paid.paise())
            .bind(draft.invoice_date)
            .bind(draft.payment_mode)
            .bind(Option::<String>::None)
            .bind(created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(
            invoice_number = %invoice_number,
            lines = items.len(),
            grand_total = %grand_total,
            "Created sales invoice"
        );

        Ok(SalesInvoice {
            id: invoice_id,
            customer_id: draft.customer_id,
            invoice_number,
            invoice_date: draft.invoice_date,
            taxable_paise: taxable.paise(),
            cgst_paise: cgst.paise(),
            sgst_paise: sgst.paise(),
            grand_total_paise: grand_total.paise(),
            amount_received_paise: settlement.amount_paid.paise(),
            balance_due_paise: settlement.balance_due.paise(),
            payment_status: settlement.status,
            created_at,
        })
    }

    /// Deletes a sale: stock goes back on every line's batch, wallet
    /// payments are credited back, and the line items and payments
    /// cascade away.
    pub async fn delete(&self, invoice_id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let invoice = fetch_invoice(&mut tx, invoice_id)
            .await?
            .ok_or_else(|| DbError::not_found("Sales invoice", invoice_id))?;

        let items = fetch_items(&mut tx, invoice_id).await?;
        for item in &items {
            adjust_stock(&mut tx, &item.batch_id, item.quantity).await?;
        }

        if let Some(customer_id) = &invoice.customer_id {
            let payments = fetch_payments(&mut tx, invoice_id).await?;
            for payment in &payments {
                if matches!(payment.mode, PaymentMode::Wallet) {
                    adjust_wallet(&mut tx, customer_id, payment.amount_paise).await?;
                }
            }
        }

        sqlx::query("DELETE FROM sales_invoices WHERE id = ?1")
            .bind(invoice_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        info!(invoice_id = %invoice_id, "Deleted sales invoice");
        Ok(())
    }

    /// Gets an invoice header by ID.
    pub async fn get(&self, invoice_id: &str) -> DbResult<Option<SalesInvoice>> {
        let mut conn = self.pool.acquire().await?;
        fetch_invoice(&mut conn, invoice_id).await
    }

    /// Lists invoices, newest first, optionally filtered by settlement
    /// status.
    pub async fn list(
        &self,
        status: Option<PaymentStatus>,
        limit: u32,
    ) -> DbResult<Vec<SalesInvoice>> {
        let invoices = match status {
            Some(status) => {
                sqlx::query_as::<_, SalesInvoice>(
                    r#"
                    SELECT id, customer_id, invoice_number, invoice_date,
                           taxable_paise, cgst_paise, sgst_paise, grand_total_paise,
                           amount_received_paise, balance_due_paise, payment_status, created_at
                    FROM sales_invoices
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
                sqlx::query_as::<_, SalesInvoice>(
                    r#"
                    SELECT id, customer_id, invoice_number, invoice_date,
                           taxable_paise, cgst_paise, sgst_paise, grand_total_paise,
                           amount_received_paise, balance_due_paise, payment_status, created_at
                    FROM sales_invoices
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

    /// Loads the full bill view of one invoice.
    pub async fn get_detail(&self, invoice_id: &str) -> DbResult<SalesDetail> {
        let mut conn = self.pool.acquire().await?;

        let invoice = fetch_invoice(&mut conn, invoice_id)
            .await?
            .ok_or_else(|| DbError::not_found("Sales invoice", invoice_id))?;

        let customer_name = match &invoice.customer_id {
            Some(customer_id) => Some(require_customer(&mut conn, customer_id).await?.name),
            None => None,
        };

        let rows = sqlx::query_as::<_, SalesItemRow>(
            r#"
            SELECT si.id, si.invoice_id, si.batch_id, si.quantity,
                   si.unit_price_paise, si.tax_rate_bps, si.tax_paise,
                   si.line_total_paise,
                   p.name AS product_name,
                   b.batch_number
            FROM sales_items si
            JOIN batches b ON b.id = si.batch_id
            JOIN products p ON p.id = b.product_id
            WHERE si.invoice_id = ?1
            ORDER BY si.rowid
            "#,
        )
        .bind(invoice_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(SalesDetail {
            invoice,
            customer_name,
            items: rows
                .into_iter()
                .map(|row| SalesItemDetail {
                    item: row.item,
                    product_name: row.product_name,
                    batch_number: row.batch_number,
                })
                .collect(),
        })
    }

    /// Records a payment from a customer and re-settles the invoice
    /// from the sum of its payment rows.
    ///
    /// Wallet mode spends the customer's stored credit on top of the
    /// usual bookkeeping.
    pub async fn record_payment(&self, draft: CustomerPaymentDraft) -> DbResult<CustomerPayment> {
        validate_payment_amount(draft.amount)?;

        let mut tx = self.pool.begin().await?;

        let invoice = fetch_invoice(&mut tx, &draft.invoice_id)
            .await?
            .ok_or_else(|| DbError::not_found("Sales invoice", &draft.invoice_id))?;

        if matches!(draft.mode, PaymentMode::Wallet) {
            let customer_id = invoice.customer_id.as_deref().ok_or(ValidationError::Required {
                field: "customer".to_string(),
            })?;
            adjust_wallet(&mut tx, customer_id, -draft.amount.paise()).await?;
        }

        let id = Uuid::new_v4().to_string();
        let created_at = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO customer_payments (
                id, invoice_id, amount_paise, payment_date, mode, reference, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&id)
        .bind(&draft.invoice_id)
        .bind(draft.amount.paise())
        .bind(draft.payment_date)
        .bind(draft.mode)
        .bind(&draft.reference)
        .bind(created_at)
        .execute(&mut *tx)
        .await?;

        resettle_invoice(&mut tx, &invoice).await?;
        tx.commit().await?;

        info!(
            invoice_number = %invoice.invoice_number,
            amount = %draft.amount,
            "Recorded customer payment"
        );

        Ok(CustomerPayment {
            id,
            invoice_id: draft.invoice_id,
            amount_paise: draft.amount.paise(),
            payment_date: draft.payment_date,
            mode: draft.mode,
            reference: draft.reference,
            created_at,
        })
    }

    /// Deletes a payment, crediting wallet money back, and re-settles
    /// its invoice.
    pub async fn delete_payment(&self, payment_id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let payment = sqlx::query_as::<_, CustomerPayment>(
            r#"
            SELECT id, invoice_id, amount_paise, payment_date, mode, reference, created_at
            FROM customer_payments
            WHERE id = ?1
            "#,
        )
        .bind(payment_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("Payment", payment_id))?;

        let invoice = fetch_invoice(&mut tx, &payment.invoice_id)
            .await?
            .ok_or_else(|| DbError::not_found("Sales invoice", &payment.invoice_id))?;

        if matches!(payment.mode, PaymentMode::Wallet) {
            if let Some(customer_id) = &invoice.customer_id {
                adjust_wallet(&mut tx, customer_id, payment.amount_paise).await?;
            }
        }

        sqlx::query("DELETE FROM customer_payments WHERE id = ?1")
            .bind(payment_id)
            .execute(&mut *tx)
            .await?;

        resettle_invoice(&mut tx, &invoice).await?;
        tx.commit().await?;

        debug!(payment_id = %payment_id, "Deleted customer payment");
        Ok(())
    }

    /// Lists an invoice's payments, newest first.
    pub async fn list_payments(&self, invoice_id: &str) -> DbResult<Vec<CustomerPayment>> {
        let mut conn = self.pool.acquire().await?;
        let mut payments = fetch_payments(&mut conn, invoice_id).await?;
        payments.sort_by(|a, b| {
            (b.payment_date, b.created_at).cmp(&(a.payment_date, a.created_at))
        });
        Ok(payments)
    }
}

// =============================================================================
// Internals
// =============================================================================

async fn fetch_invoice(
    conn: &mut SqliteConnection,
    invoice_id: &str,
) -> DbResult<Option<SalesInvoice>> {
    let invoice = sqlx::query_as::<_, SalesInvoice>(
        r#"
        SELECT id, customer_id, invoice_number, invoice_date,
               taxable_paise, cgst_paise, sgst_paise, grand_total_paise,
               amount_received_paise, balance_due_paise, payment_status, created_at
        FROM sales_invoices
        WHERE id = ?1
        "#,
    )
    .bind(invoice_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(invoice)
}

async fn fetch_items(conn: &mut SqliteConnection, invoice_id: &str) -> DbResult<Vec<SalesItem>> {
    let items = sqlx::query_as::<_, SalesItem>(
        r#"
        SELECT id, invoice_id, batch_id, quantity, unit_price_paise,
               tax_rate_bps, tax_paise, line_total_paise
        FROM sales_items
        WHERE invoice_id = ?1
        ORDER BY rowid
        "#,
    )
    .bind(invoice_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(items)
}

async fn fetch_payments(
    conn: &mut SqliteConnection,
    invoice_id: &str,
) -> DbResult<Vec<CustomerPayment>> {
    let payments = sqlx::query_as::<_, CustomerPayment>(
        r#"
        SELECT id, invoice_id, amount_paise, payment_date, mode, reference, created_at
        FROM customer_payments
        WHERE invoice_id = ?1
        "#,
    )
    .bind(invoice_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(payments)
}

/// Re-derives the header's received amount from the sum of its payment
/// rows and writes the settlement back.
async fn resettle_invoice(conn: &mut SqliteConnection, invoice: &SalesInvoice) -> DbResult<()> {
    let paid: Option<i64> =
        sqlx::query_scalar("SELECT SUM(amount_paise) FROM customer_payments WHERE invoice_id = ?1")
            .bind(&invoice.id)
            .fetch_one(&mut *conn)
            .await?;

    let settlement = settle(invoice.grand_total(), Money::from_paise(paid.unwrap_or(0)));

    sqlx::query(
        r#"
        UPDATE sales_invoices SET
            amount_received_paise = ?2,
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::catalog::{CategoryDraft, ManufacturerDraft, ProductDraft};
    use crate::repository::inventory::BatchUpsert;
    use crate::repository::party::CustomerDraft;
    use mandi_core::UnitKind;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// One GST 18% product with a stocked batch. Returns the batch id.
    async fn seed_batch(db: &Database, quantity: i64) -> String {
        let catalog = db.catalog();
        let category = catalog
            .create_category(CategoryDraft {
                name: "Fertilizers".to_string(),
                cgst_bps: 900,
                sgst_bps: 900,
                igst_bps: 1800,
            })
            .await
            .unwrap();
        let maker = catalog
            .create_manufacturer(ManufacturerDraft {
                name: "IFFCO".to_string(),
                description: None,
            })
            .await
            .unwrap();
        let product = catalog
            .create_product(ProductDraft {
                name: "Urea 45kg".to_string(),
                hsn_code: "3102".to_string(),
                unit: UnitKind::Bag,
                category_id: category.id,
                manufacturer_id: maker.id,
            })
            .await
            .unwrap();

        let inventory = db.inventory();
        let batch = inventory
            .upsert(&BatchUpsert {
                product_id: product.id,
                batch_number: "LOT-1".to_string(),
                manufacturing_date: None,
                expiry_date: None,
                purchase_price: Money::from_rupees(250, 0),
                mrp: Money::from_rupees(320, 0),
                selling_price: Money::from_rupees(300, 0),
                pack_size: 45.0,
                pack_unit: "kg".to_string(),
            })
            .await
            .unwrap();
        inventory.apply_delta(&batch.id, quantity).await.unwrap();
        batch.id
    }

    async fn seed_customer(db: &Database) -> String {
        db.parties()
            .create_customer(CustomerDraft {
                name: "Ramesh Kumar".to_string(),
                mobile: "9876501234".to_string(),
                city: Some("Nashik".to_string()),
                address: "Market Road".to_string(),
                gstin: None,
            })
            .await
            .unwrap()
            .id
    }

    fn cash_sale(invoice_number: &str) -> SalesDraft {
        SalesDraft {
            customer_id: None,
            invoice_number: Some(invoice_number.to_string()),
            invoice_date: date(2026, 8, 10),
            initial_payment: InitialPayment::None,
            payment_mode: PaymentMode::Cash,
        }
    }

    fn grid(batch_id: &str, qty: &str, price: &str) -> SalesRows {
        SalesRows {
            batch_ids: vec![batch_id.to_string()],
            quantities: vec![qty.to_string()],
            unit_prices: vec![price.to_string()],
        }
    }

    #[tokio::test]
    async fn test_create_splits_gst_and_decreases_stock() {
        let db = test_db().await;
        let batch_id = seed_batch(&db, 10).await;
        let repo = db.sales();

        // 4 × ₹300 at 18% → taxable ₹1200, tax ₹216, grand ₹1416.
        let invoice = repo
            .create(cash_sale("S-1"), &grid(&batch_id, "4", "300"))
            .await
            .unwrap();

        assert_eq!(invoice.taxable(), Money::from_rupees(1200, 0));
        assert_eq!(invoice.cgst(), Money::from_rupees(108, 0));
        assert_eq!(invoice.sgst(), Money::from_rupees(108, 0));
        assert_eq!(invoice.grand_total(), Money::from_rupees(1416, 0));
        assert_eq!(invoice.payment_status, PaymentStatus::Unpaid);

        let batch = db.inventory().get(&batch_id).await.unwrap().unwrap();
        assert_eq!(batch.current_quantity, 6);

        let detail = repo.get_detail(&invoice.id).await.unwrap();
        assert_eq!(detail.customer_name, None);
        assert_eq!(detail.items.len(), 1);
        assert_eq!(detail.items[0].product_name, "Urea 45kg");
        assert_eq!(detail.items[0].batch_number, "LOT-1");
        assert_eq!(detail.items[0].item.tax_rate_bps, 1800);
    }

    #[tokio::test]
    async fn test_odd_paisa_lands_on_sgst() {
        let db = test_db().await;
        let batch_id = seed_batch(&db, 10).await;

        // 2 × ₹0.75 → taxable 150p, tax 27p: CGST 13, SGST 14.
        let invoice = db
            .sales()
            .create(cash_sale("S-1"), &grid(&batch_id, "2", "0.75"))
            .await
            .unwrap();

        assert_eq!(invoice.cgst(), Money::from_paise(13));
        assert_eq!(invoice.sgst(), Money::from_paise(14));
        assert_eq!(invoice.grand_total(), Money::from_paise(177));
    }

    #[tokio::test]
    async fn test_insufficient_stock_blocks_the_sale() {
        let db = test_db().await;
        let batch_id = seed_batch(&db, 10).await;
        let repo = db.sales();

        let err = repo
            .create(cash_sale("S-1"), &grid(&batch_id, "11", "300"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Insufficient Stock. Available: 10");

        // Nothing happened: no invoice, stock untouched.
        assert!(repo.list(None, 10).await.unwrap().is_empty());
        let batch = db.inventory().get(&batch_id).await.unwrap().unwrap();
        assert_eq!(batch.current_quantity, 10);
    }

    #[tokio::test]
    async fn test_selling_the_last_unit_is_allowed() {
        let db = test_db().await;
        let batch_id = seed_batch(&db, 10).await;

        db.sales()
            .create(cash_sale("S-1"), &grid(&batch_id, "10", "300"))
            .await
            .unwrap();

        let batch = db.inventory().get(&batch_id).await.unwrap().unwrap();
        assert_eq!(batch.current_quantity, 0);
    }

    #[tokio::test]
    async fn test_zero_total_sale_settles_as_paid() {
        let db = test_db().await;
        let batch_id = seed_batch(&db, 10).await;
        let repo = db.sales();

        // A giveaway: price left blank decodes as zero.
        let invoice = repo
            .create(cash_sale("S-1"), &grid(&batch_id, "2", ""))
            .await
            .unwrap();

        assert!(invoice.grand_total().is_zero());
        assert_eq!(invoice.payment_status, PaymentStatus::Paid);
        // No money moved, so no payment row either.
        assert!(repo.list_payments(&invoice.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_generated_invoice_number_carries_prefix() {
        let db = test_db().await;
        let batch_id = seed_batch(&db, 10).await;

        let mut draft = cash_sale("unused");
        draft.invoice_number = None;
        let invoice = db
            .sales()
            .create(draft, &grid(&batch_id, "1", "300"))
            .await
            .unwrap();

        assert!(invoice.invoice_number.starts_with(SALES_INVOICE_PREFIX));
    }

    #[tokio::test]
    async fn test_initial_payment_becomes_a_payment_row() {
        let db = test_db().await;
        let batch_id = seed_batch(&db, 10).await;
        let repo = db.sales();

        let mut draft = cash_sale("S-1");
        draft.initial_payment = InitialPayment::Amount(Money::from_rupees(500, 0));
        draft.payment_mode = PaymentMode::Upi;
        let invoice = repo.create(draft, &grid(&batch_id, "4", "300")).await.unwrap();

        assert_eq!(invoice.payment_status, PaymentStatus::Partial);
        assert_eq!(invoice.balance_due(), Money::from_rupees(916, 0));

        let payments = repo.list_payments(&invoice.id).await.unwrap();
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].amount(), Money::from_rupees(500, 0));
        assert_eq!(payments[0].mode, PaymentMode::Upi);
        assert_eq!(payments[0].payment_date, date(2026, 8, 10));
    }

    #[tokio::test]
    async fn test_wallet_sale_debits_customer_and_delete_refunds() {
        let db = test_db().await;
        let batch_id = seed_batch(&db, 10).await;
        let customer_id = seed_customer(&db).await;
        let repo = db.sales();

        let draft = SalesDraft {
            customer_id: Some(customer_id.clone()),
            invoice_number: Some("S-1".to_string()),
            invoice_date: date(2026, 8, 10),
            initial_payment: InitialPayment::Full,
            payment_mode: PaymentMode::Wallet,
        };
        let invoice = repo.create(draft, &grid(&batch_id, "4", "300")).await.unwrap();
        assert_eq!(invoice.payment_status, PaymentStatus::Paid);

        // ₹1416 left the wallet; the balance is allowed to go negative.
        let customer = db.parties().get_customer(&customer_id).await.unwrap().unwrap();
        assert_eq!(customer.wallet_balance(), Money::from_rupees(-1416, 0));

        // Deleting the sale puts the stock and the wallet money back.
        repo.delete(&invoice.id).await.unwrap();
        let customer = db.parties().get_customer(&customer_id).await.unwrap().unwrap();
        assert!(customer.wallet_balance().is_zero());
        let batch = db.inventory().get(&batch_id).await.unwrap().unwrap();
        assert_eq!(batch.current_quantity, 10);
    }

    #[tokio::test]
    async fn test_wallet_needs_a_customer() {
        let db = test_db().await;
        let batch_id = seed_batch(&db, 10).await;

        let mut draft = cash_sale("S-1");
        draft.initial_payment = InitialPayment::Full;
        draft.payment_mode = PaymentMode::Wallet;
        let err = db
            .sales()
            .create(draft, &grid(&batch_id, "4", "300"))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Validation error: customer is required");
    }

    #[tokio::test]
    async fn test_record_and_delete_payment_resettle() {
        let db = test_db().await;
        let batch_id = seed_batch(&db, 10).await;
        let repo = db.sales();

        // Grand total ₹1416.
        let invoice = repo
            .create(cash_sale("S-1"), &grid(&batch_id, "4", "300"))
            .await
            .unwrap();

        let payment = repo
            .record_payment(CustomerPaymentDraft {
                invoice_id: invoice.id.clone(),
                amount: Money::from_rupees(1416, 0),
                payment_date: date(2026, 8, 11),
                mode: PaymentMode::Cash,
                reference: None,
            })
            .await
            .unwrap();

        let paid = repo.get(&invoice.id).await.unwrap().unwrap();
        assert_eq!(paid.payment_status, PaymentStatus::Paid);
        assert!(paid.balance_due().is_zero());

        repo.delete_payment(&payment.id).await.unwrap();
        let reopened = repo.get(&invoice.id).await.unwrap().unwrap();
        assert_eq!(reopened.payment_status, PaymentStatus::Unpaid);
        assert_eq!(reopened.balance_due(), Money::from_rupees(1416, 0));
    }

    #[tokio::test]
    async fn test_malformed_batch_id_rejected_before_lookup() {
        let db = test_db().await;
        seed_batch(&db, 10).await;

        let err = db
            .sales()
            .create(cash_sale("S-1"), &grid("not-a-uuid", "1", "300"))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation error: batch id has invalid format: must be a valid UUID"
        );
    }

    #[tokio::test]
    async fn test_empty_grid_rejected() {
        let db = test_db().await;
        seed_batch(&db, 10).await;

        let err = db
            .sales()
            .create(cash_sale("S-1"), &SalesRows::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Validation error: items is required");
    }

    #[tokio::test]
    async fn test_list_newest_first_with_status_filter() {
        let db = test_db().await;
        let batch_id = seed_batch(&db, 10).await;
        let repo = db.sales();

        let mut early = cash_sale("S-1");
        early.invoice_date = date(2026, 8, 1);
        early.initial_payment = InitialPayment::Full;
        repo.create(early, &grid(&batch_id, "1", "300")).await.unwrap();

        let mut late = cash_sale("S-2");
        late.invoice_date = date(2026, 8, 12);
        repo.create(late, &grid(&batch_id, "1", "300")).await.unwrap();

        let all = repo.list(None, 10).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].invoice_number, "S-2");

        let unpaid = repo.list(Some(PaymentStatus::Unpaid), 10).await.unwrap();
        assert_eq!(unpaid.len(), 1);
        assert_eq!(unpaid[0].invoice_number, "S-2");
    }
}
