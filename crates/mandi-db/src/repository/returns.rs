//! # Returns Repository
//!
//! Goods going back: to suppliers (purchase returns) and from
//! customers (sales returns).
//!
//! ## The Two Directions Are Not Mirrors
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Purchase return (goods leave the store room)                           │
//! │    stock  ──► guarded decrease; can't ship back what isn't there       │
//! │    refund ──► priced per item, summed onto the header                  │
//! │                                                                         │
//! │  Sales return (goods come back over the counter)                        │
//! │    stock  ──► plain increase                                            │
//! │    refund ──► header total only; items record quantity alone           │
//! │    customer ──► falls back to the original invoice's customer          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Returns adjust stock and record money owed. They do not touch the
//! original invoice's totals or settlement.

use chrono::NaiveDate;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::inventory::{adjust_stock, decrease_stock_for_return};
use crate::repository::party::{require_customer, require_supplier};
use mandi_core::rows::SalesRows;
use mandi_core::validation::validate_uuid;
use mandi_core::{
    Money, PurchaseReturn, PurchaseReturnItem, SalesReturn, SalesReturnItem, ValidationError,
};

// =============================================================================
// Inputs
// =============================================================================

/// Header fields of a purchase return.
#[derive(Debug, Clone)]
pub struct PurchaseReturnDraft {
    pub supplier_id: String,
    pub original_invoice_id: Option<String>,
    pub return_date: NaiveDate,
    pub reason: String,
}

/// Header fields of a sales return.
#[derive(Debug, Clone)]
pub struct SalesReturnDraft {
    /// Filled from the original invoice when left empty.
    pub customer_id: Option<String>,
    pub original_invoice_id: Option<String>,
    pub return_date: NaiveDate,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for purchase and sales returns.
#[derive(Debug, Clone)]
pub struct ReturnsRepository {
    pool: SqlitePool,
}

impl ReturnsRepository {
    /// Creates a new ReturnsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReturnsRepository { pool }
    }

    /// Records goods sent back to a supplier.
    ///
    /// Every line's quantity comes off its batch under the return
    /// guard, and the refund is priced per line at the grid's price.
    pub async fn create_purchase_return(
        &self,
        draft: PurchaseReturnDraft,
        rows: &SalesRows,
    ) -> DbResult<PurchaseReturn> {
        let rows = rows.rows()?;
        if rows.is_empty() {
            return Err(ValidationError::Required {
                field: "items".to_string(),
            }
            .into());
        }

        let mut tx = self.pool.begin().await?;

        require_supplier(&mut tx, &draft.supplier_id).await?;
        if let Some(invoice_id) = &draft.original_invoice_id {
            ensure_purchase_invoice(&mut tx, invoice_id).await?;
        }

        let return_id = Uuid::new_v4().to_string();
        let mut refund_total = Money::zero();
        let mut items = Vec::with_capacity(rows.len());

        for row in &rows {
            validate_uuid(&row.batch_id, "batch id")?;
            decrease_stock_for_return(&mut tx, &row.batch_id, row.quantity).await?;
            refund_total += row.unit_price.multiply_quantity(row.quantity);
            items.push(PurchaseReturnItem {
                id: Uuid::new_v4().to_string(),
                return_id: return_id.clone(),
                batch_id: row.batch_id.clone(),
                quantity: row.quantity,
                refund_price_paise: row.unit_price.paise(),
            });
        }

        sqlx::query(
            r#"
            INSERT INTO purchase_returns (
                id, supplier_id, original_invoice_id, return_date, reason, refund_total_paise
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&return_id)
        .bind(&draft.supplier_id)
        .bind(&draft.original_invoice_id)
        .bind(draft.return_date)
        .bind(&draft.reason)
        .bind(refund_total.paise())
        .execute(&mut *tx)
        .await?;

        for item in &items {
            sqlx::query(
                r#"
                INSERT INTO purchase_return_items (
                    id, return_id, batch_id, quantity, refund_price_paise
                ) VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )
            .bind(&item.id)
            .bind(&item.return_id)
            .bind(&item.batch_id)
            .bind(item.quantity)
            .bind(item.refund_price_paise)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(
            return_id = %return_id,
            lines = items.len(),
            refund = %refund_total,
            "Created purchase return"
        );

        Ok(PurchaseReturn {
            id: return_id,
            supplier_id: draft.supplier_id,
            original_invoice_id: draft.original_invoice_id,
            return_date: draft.return_date,
            reason: draft.reason,
            refund_total_paise: refund_total.paise(),
        })
    }

    /// Records goods taken back from a customer.
    ///
    /// Stock goes straight back onto each batch. The refund value lives
    /// on the header only; item rows carry just the quantity.
    pub async fn create_sales_return(
        &self,
        draft: SalesReturnDraft,
        rows: &SalesRows,
    ) -> DbResult<SalesReturn> {
        let rows = rows.rows()?;
        if rows.is_empty() {
            return Err(ValidationError::Required {
                field: "items".to_string(),
            }
            .into());
        }

        let mut tx = self.pool.begin().await?;

        let mut customer_id = draft.customer_id.clone();
        if let Some(invoice_id) = &draft.original_invoice_id {
            let original_customer: Option<String> =
                sqlx::query_scalar("SELECT customer_id FROM sales_invoices WHERE id = ?1")
                    .bind(invoice_id)
                    .fetch_optional(&mut *tx)
                    .await?
                    .ok_or_else(|| DbError::not_found("Sales invoice", invoice_id))?;
            if customer_id.is_none() {
                customer_id = original_customer;
            }
        }
        if let Some(customer_id) = &customer_id {
            require_customer(&mut tx, customer_id).await?;
        }

        let return_id = Uuid::new_v4().to_string();
        let mut refund_total = Money::zero();
        let mut items = Vec::with_capacity(rows.len());

        for row in &rows {
            validate_uuid(&row.batch_id, "batch id")?;
            adjust_stock(&mut tx, &row.batch_id, row.quantity).await?;
            refund_total += row.unit_price.multiply_quantity(row.quantity);
            items.push(SalesReturnItem {
                id: Uuid::new_v4().to_string(),
                return_id: return_id.clone(),
                batch_id: row.batch_id.clone(),
                quantity: row.quantity,
            });
        }

        sqlx::query(
            r#"
            INSERT INTO sales_returns (
                id, customer_id, original_invoice_id, return_date, refund_total_paise
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&return_id)
        .bind(&customer_id)
        .bind(&draft.original_invoice_id)
        .bind(draft.return_date)
        .bind(refund_total.paise())
        .execute(&mut *tx)
        .await?;

        for item in &items {
            sqlx::query(
                r#"
                INSERT INTO sales_return_items (id, return_id, batch_id, quantity)
                VALUES (?1, ?2, ?3, ?4)
                "#,
            )
            .bind(&item.id)
            .bind(&item.return_id)
            .bind(&item.batch_id)
            .bind(item.quantity)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(
            return_id = %return_id,
            lines = items.len(),
            refund = %refund_total,
            "Created sales return"
        );

        Ok(SalesReturn {
            id: return_id,
            customer_id,
            original_invoice_id: draft.original_invoice_id,
            return_date: draft.return_date,
            refund_total_paise: refund_total.paise(),
        })
    }

    /// Gets a purchase return by ID.
    pub async fn get_purchase_return(&self, id: &str) -> DbResult<Option<PurchaseReturn>> {
        let ret = sqlx::query_as::<_, PurchaseReturn>(
            r#"
            SELECT id, supplier_id, original_invoice_id, return_date, reason, refund_total_paise
            FROM purchase_returns
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(ret)
    }

    /// Lists purchase returns, newest first.
    pub async fn list_purchase_returns(&self) -> DbResult<Vec<PurchaseReturn>> {
        let returns = sqlx::query_as::<_, PurchaseReturn>(
            r#"
            SELECT id, supplier_id, original_invoice_id, return_date, reason, refund_total_paise
            FROM purchase_returns
            ORDER BY return_date DESC, rowid DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(returns)
    }

    /// Lists the lines of one purchase return.
    pub async fn purchase_return_items(
        &self,
        return_id: &str,
    ) -> DbResult<Vec<PurchaseReturnItem>> {
        let items = sqlx::query_as::<_, PurchaseReturnItem>(
            r#"
            SELECT id, return_id, batch_id, quantity, refund_price_paise
            FROM purchase_return_items
            WHERE return_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(return_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Gets a sales return by ID.
    pub async fn get_sales_return(&self, id: &str) -> DbResult<Option<SalesReturn>> {
        let ret = sqlx::query_as::<_, SalesReturn>(
            r#"
            SELECT id, customer_id, original_invoice_id, return_date, refund_total_paise
            FROM sales_returns
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(ret)
    }

    /// Lists sales returns, newest first.
    pub async fn list_sales_returns(&self) -> DbResult<Vec<SalesReturn>> {
        let returns = sqlx::query_as::<_, SalesReturn>(
            r#"
            SELECT id, customer_id, original_invoice_id, return_date, refund_total_paise
            FROM sales_returns
            ORDER BY return_date DESC, rowid DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(returns)
    }

    /// Lists the lines of one sales return.
    pub async fn sales_return_items(&self, return_id: &str) -> DbResult<Vec<SalesReturnItem>> {
        let items = sqlx::query_as::<_, SalesReturnItem>(
            r#"
            SELECT id, return_id, batch_id, quantity
            FROM sales_return_items
            WHERE return_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(return_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }
}

// =============================================================================
// Internals
// =============================================================================

async fn ensure_purchase_invoice(conn: &mut SqliteConnection, invoice_id: &str) -> DbResult<()> {
    let exists: Option<i64> =
        sqlx::query_scalar("SELECT 1 FROM purchase_invoices WHERE id = ?1")
            .bind(invoice_id)
            .fetch_optional(&mut *conn)
            .await?;

    if exists.is_none() {
        return Err(DbError::not_found("Purchase invoice", invoice_id));
    }
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
    use crate::repository::party::{CustomerDraft, SupplierDraft};
    use crate::repository::sales::SalesDraft;
    use mandi_core::{InitialPayment, PaymentMode, UnitKind};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn seed_batch(db: &Database, lot: &str, quantity: i64) -> String {
        let catalog = db.catalog();
        let category = catalog
            .create_category(CategoryDraft {
                name: format!("cat-{lot}"),
                cgst_bps: 900,
                sgst_bps: 900,
                igst_bps: 1800,
            })
            .await
            .unwrap();
        let maker = catalog
            .create_manufacturer(ManufacturerDraft {
                name: format!("mfr-{lot}"),
                description: None,
            })
            .await
            .unwrap();
        let product = catalog
            .create_product(ProductDraft {
                name: format!("Product {lot}"),
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
                batch_number: lot.to_string(),
                manufacturing_date: None,
                expiry_date: None,
                purchase_price: Money::from_rupees(295, 0),
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

    async fn seed_supplier(db: &Database) -> String {
        db.parties()
            .create_supplier(SupplierDraft {
                name: "Krishna Agro Agencies".to_string(),
                gstin: "27AABCU9603R1ZM".to_string(),
                phone: "9876543210".to_string(),
                address: "APMC Yard".to_string(),
                is_distributor: true,
                credit_period_days: 30,
            })
            .await
            .unwrap()
            .id
    }

    fn grid(batch_id: &str, qty: &str, price: &str) -> SalesRows {
        SalesRows {
            batch_ids: vec![batch_id.to_string()],
            quantities: vec![qty.to_string()],
            unit_prices: vec![price.to_string()],
        }
    }

    #[tokio::test]
    async fn test_purchase_return_refuses_more_than_on_hand() {
        let db = test_db().await;
        let batch_id = seed_batch(&db, "LOT-42", 2).await;
        let supplier_id = seed_supplier(&db).await;
        let repo = db.returns();

        let err = repo
            .create_purchase_return(
                PurchaseReturnDraft {
                    supplier_id,
                    original_invoice_id: None,
                    return_date: date(2026, 8, 20),
                    reason: "damaged bags".to_string(),
                },
                &grid(&batch_id, "8", "295"),
            )
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Cannot return 8 of LOT-42. Only 2 in stock.");
        assert!(repo.list_purchase_returns().await.unwrap().is_empty());
        let batch = db.inventory().get(&batch_id).await.unwrap().unwrap();
        assert_eq!(batch.current_quantity, 2);
    }

    #[tokio::test]
    async fn test_purchase_return_prices_each_line() {
        let db = test_db().await;
        let batch_id = seed_batch(&db, "LOT-1", 10).await;
        let supplier_id = seed_supplier(&db).await;
        let repo = db.returns();

        let ret = repo
            .create_purchase_return(
                PurchaseReturnDraft {
                    supplier_id: supplier_id.clone(),
                    original_invoice_id: None,
                    return_date: date(2026, 8, 20),
                    reason: "torn packing".to_string(),
                },
                &grid(&batch_id, "4", "295"),
            )
            .await
            .unwrap();

        assert_eq!(ret.refund_total(), Money::from_rupees(1180, 0));
        assert_eq!(ret.reason, "torn packing");

        let items = repo.purchase_return_items(&ret.id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 4);
        assert_eq!(items[0].refund_price(), Money::from_rupees(295, 0));

        let batch = db.inventory().get(&batch_id).await.unwrap().unwrap();
        assert_eq!(batch.current_quantity, 6);
    }

    #[tokio::test]
    async fn test_sales_return_adds_stock_back() {
        let db = test_db().await;
        let batch_id = seed_batch(&db, "LOT-1", 10).await;
        let repo = db.returns();

        let ret = repo
            .create_sales_return(
                SalesReturnDraft {
                    customer_id: None,
                    original_invoice_id: None,
                    return_date: date(2026, 8, 21),
                },
                &grid(&batch_id, "3", "300"),
            )
            .await
            .unwrap();

        // Refund is a header figure; the item row is quantity only.
        assert_eq!(ret.refund_total(), Money::from_rupees(900, 0));
        let items = repo.sales_return_items(&ret.id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 3);

        let batch = db.inventory().get(&batch_id).await.unwrap().unwrap();
        assert_eq!(batch.current_quantity, 13);
    }

    #[tokio::test]
    async fn test_sales_return_customer_falls_back_to_original_invoice() {
        let db = test_db().await;
        let batch_id = seed_batch(&db, "LOT-1", 10).await;
        let customer_id = db
            .parties()
            .create_customer(CustomerDraft {
                name: "Ramesh Kumar".to_string(),
                mobile: "9876501234".to_string(),
                city: None,
                address: String::new(),
                gstin: None,
            })
            .await
            .unwrap()
            .id;

        let sale = db
            .sales()
            .create(
                SalesDraft {
                    customer_id: Some(customer_id.clone()),
                    invoice_number: Some("S-1".to_string()),
                    invoice_date: date(2026, 8, 10),
                    initial_payment: InitialPayment::None,
                    payment_mode: PaymentMode::Cash,
                },
                &grid(&batch_id, "5", "300"),
            )
            .await
            .unwrap();

        let ret = db
            .returns()
            .create_sales_return(
                SalesReturnDraft {
                    customer_id: None,
                    original_invoice_id: Some(sale.id.clone()),
                    return_date: date(2026, 8, 15),
                },
                &grid(&batch_id, "2", "300"),
            )
            .await
            .unwrap();

        assert_eq!(ret.customer_id, Some(customer_id));
        assert_eq!(ret.original_invoice_id, Some(sale.id));
    }

    #[tokio::test]
    async fn test_empty_grids_rejected() {
        let db = test_db().await;
        let supplier_id = seed_supplier(&db).await;
        let repo = db.returns();

        let err = repo
            .create_purchase_return(
                PurchaseReturnDraft {
                    supplier_id,
                    original_invoice_id: None,
                    return_date: date(2026, 8, 20),
                    reason: String::new(),
                },
                &SalesRows::default(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Validation error: items is required");

        let err = repo
            .create_sales_return(
                SalesReturnDraft {
                    customer_id: None,
                    original_invoice_id: None,
                    return_date: date(2026, 8, 20),
                },
                &SalesRows::default(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Validation error: items is required");
    }

    #[tokio::test]
    async fn test_lists_are_newest_first() {
        let db = test_db().await;
        let batch_id = seed_batch(&db, "LOT-1", 20).await;
        let supplier_id = seed_supplier(&db).await;
        let repo = db.returns();

        for (day, qty) in [(5, "1"), (12, "2")] {
            repo.create_purchase_return(
                PurchaseReturnDraft {
                    supplier_id: supplier_id.clone(),
                    original_invoice_id: None,
                    return_date: date(2026, 8, day),
                    reason: String::new(),
                },
                &grid(&batch_id, qty, "295"),
            )
            .await
            .unwrap();
        }

        let returns = repo.list_purchase_returns().await.unwrap();
        assert_eq!(returns.len(), 2);
        assert_eq!(returns[0].return_date, date(2026, 8, 12));
    }
}
