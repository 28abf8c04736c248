//! # Party Repository
//!
//! Database operations for suppliers and customers.
//!
//! ## Key Operations
//! - CRUD plus name/GSTIN/mobile search for both parties
//! - Mobile validation and duplicate checks on the customer side
//! - Name-ordered customer listing (the CSV export order)
//!
//! The customer wallet balance is deliberately not writable here:
//! it moves only with wallet-mode payments, inside the sales
//! repository's transactions.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use mandi_core::validation::{validate_credit_period, validate_mobile, validate_name};
use mandi_core::{Customer, Supplier, ValidationError};

// =============================================================================
// Drafts
// =============================================================================

/// Input for creating or updating a supplier.
#[derive(Debug, Clone)]
pub struct SupplierDraft {
    pub name: String,
    pub gstin: String,
    pub phone: String,
    pub address: String,
    pub is_distributor: bool,
    /// Days of credit extended to us; drives purchase due dates.
    pub credit_period_days: i64,
}

impl Default for SupplierDraft {
    fn default() -> Self {
        SupplierDraft {
            name: String::new(),
            gstin: String::new(),
            phone: String::new(),
            address: String::new(),
            is_distributor: false,
            credit_period_days: 30,
        }
    }
}

/// Input for creating or updating a customer.
#[derive(Debug, Clone, Default)]
pub struct CustomerDraft {
    pub name: String,
    /// Exactly 10 digits; unique across customers.
    pub mobile: String,
    pub city: Option<String>,
    pub address: String,
    pub gstin: Option<String>,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for supplier and customer operations.
#[derive(Debug, Clone)]
pub struct PartyRepository {
    pool: SqlitePool,
}

impl PartyRepository {
    /// Creates a new PartyRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PartyRepository { pool }
    }

    // -------------------------------------------------------------------------
    // Suppliers
    // -------------------------------------------------------------------------

    /// Creates a supplier.
    pub async fn create_supplier(&self, draft: SupplierDraft) -> DbResult<Supplier> {
        validate_name(&draft.name, "supplier name")?;
        validate_credit_period(draft.credit_period_days)?;

        let id = Uuid::new_v4().to_string();
        debug!(id = %id, name = %draft.name, "Creating supplier");

        sqlx::query(
            r#"
            INSERT INTO suppliers (
                id, name, gstin, phone, address, is_distributor, credit_period_days
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&id)
        .bind(&draft.name)
        .bind(&draft.gstin)
        .bind(&draft.phone)
        .bind(&draft.address)
        .bind(draft.is_distributor)
        .bind(draft.credit_period_days)
        .execute(&self.pool)
        .await?;

        Ok(Supplier {
            id,
            name: draft.name,
            gstin: draft.gstin,
            phone: draft.phone,
            address: draft.address,
            is_distributor: draft.is_distributor,
            credit_period_days: draft.credit_period_days,
        })
    }

    /// Updates an existing supplier.
    pub async fn update_supplier(&self, id: &str, draft: SupplierDraft) -> DbResult<()> {
        validate_name(&draft.name, "supplier name")?;
        validate_credit_period(draft.credit_period_days)?;

        debug!(id = %id, "Updating supplier");

        let result = sqlx::query(
            r#"
            UPDATE suppliers SET
                name = ?2,
                gstin = ?3,
                phone = ?4,
                address = ?5,
                is_distributor = ?6,
                credit_period_days = ?7
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&draft.name)
        .bind(&draft.gstin)
        .bind(&draft.phone)
        .bind(&draft.address)
        .bind(draft.is_distributor)
        .bind(draft.credit_period_days)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Supplier", id));
        }

        Ok(())
    }

    /// Gets a supplier by ID.
    pub async fn get_supplier(&self, id: &str) -> DbResult<Option<Supplier>> {
        let supplier = sqlx::query_as::<_, Supplier>(
            r#"
            SELECT id, name, gstin, phone, address, is_distributor, credit_period_days
            FROM suppliers
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(supplier)
    }

    /// Lists all suppliers ordered by name.
    pub async fn list_suppliers(&self) -> DbResult<Vec<Supplier>> {
        let suppliers = sqlx::query_as::<_, Supplier>(
            r#"
            SELECT id, name, gstin, phone, address, is_distributor, credit_period_days
            FROM suppliers
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(suppliers)
    }

    /// Searches suppliers by name or GSTIN substring.
    pub async fn search_suppliers(&self, query: &str) -> DbResult<Vec<Supplier>> {
        let pattern = format!("%{}%", query.trim());
        debug!(query = %query, "Searching suppliers");

        let suppliers = sqlx::query_as::<_, Supplier>(
            r#"
            SELECT id, name, gstin, phone, address, is_distributor, credit_period_days
            FROM suppliers
            WHERE name LIKE ?1 OR gstin LIKE ?1
            ORDER BY name
            "#,
        )
        .bind(&pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(suppliers)
    }

    // -------------------------------------------------------------------------
    // Customers
    // -------------------------------------------------------------------------

    /// Creates a customer.
    ///
    /// ## Validation
    /// - Name must be non-empty
    /// - Mobile must be exactly 10 digits
    /// - Mobile must not belong to another customer
    pub async fn create_customer(&self, draft: CustomerDraft) -> DbResult<Customer> {
        validate_name(&draft.name, "customer name")?;
        validate_mobile(&draft.mobile)?;
        self.ensure_mobile_free(&draft.mobile, None).await?;

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        debug!(id = %id, name = %draft.name, "Creating customer");

        sqlx::query(
            r#"
            INSERT INTO customers (
                id, name, mobile, city, address, gstin, wallet_balance_paise, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7)
            "#,
        )
        .bind(&id)
        .bind(&draft.name)
        .bind(&draft.mobile)
        .bind(&draft.city)
        .bind(&draft.address)
        .bind(&draft.gstin)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Customer {
            id,
            name: draft.name,
            mobile: draft.mobile,
            city: draft.city,
            address: draft.address,
            gstin: draft.gstin,
            wallet_balance_paise: 0,
            created_at: now,
        })
    }

    /// Updates an existing customer.
    ///
    /// Wallet balance and creation time are not touched.
    pub async fn update_customer(&self, id: &str, draft: CustomerDraft) -> DbResult<()> {
        validate_name(&draft.name, "customer name")?;
        validate_mobile(&draft.mobile)?;
        self.ensure_mobile_free(&draft.mobile, Some(id)).await?;

        debug!(id = %id, "Updating customer");

        let result = sqlx::query(
            r#"
            UPDATE customers SET
                name = ?2,
                mobile = ?3,
                city = ?4,
                address = ?5,
                gstin = ?6
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&draft.name)
        .bind(&draft.mobile)
        .bind(&draft.city)
        .bind(&draft.address)
        .bind(&draft.gstin)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        Ok(())
    }

    /// Gets a customer by ID.
    pub async fn get_customer(&self, id: &str) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, name, mobile, city, address, gstin, wallet_balance_paise, created_at
            FROM customers
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Lists all customers ordered by name.
    ///
    /// This is the order the CSV export writes
    /// (`mandi_core::export::customer_csv`).
    pub async fn list_customers(&self) -> DbResult<Vec<Customer>> {
        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, name, mobile, city, address, gstin, wallet_balance_paise, created_at
            FROM customers
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }

    /// Searches customers by name or mobile substring.
    pub async fn search_customers(&self, query: &str) -> DbResult<Vec<Customer>> {
        let pattern = format!("%{}%", query.trim());
        debug!(query = %query, "Searching customers");

        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, name, mobile, city, address, gstin, wallet_balance_paise, created_at
            FROM customers
            WHERE name LIKE ?1 OR mobile LIKE ?1
            ORDER BY name
            "#,
        )
        .bind(&pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }

    /// Rejects a mobile number already held by another customer.
    ///
    /// The UNIQUE index is the backstop; this check exists to surface
    /// the fixed wording instead of a raw constraint error.
    async fn ensure_mobile_free(&self, mobile: &str, exclude_id: Option<&str>) -> DbResult<()> {
        let taken: i64 = match exclude_id {
            Some(id) => {
                sqlx::query_scalar(
                    "SELECT COUNT(*) FROM customers WHERE mobile = ?1 AND id <> ?2",
                )
                .bind(mobile)
                .bind(id)
                .fetch_one(&self.pool)
                .await?
            }
            None => {
                sqlx::query_scalar("SELECT COUNT(*) FROM customers WHERE mobile = ?1")
                    .bind(mobile)
                    .fetch_one(&self.pool)
                    .await?
            }
        };

        if taken > 0 {
            return Err(ValidationError::MobileDuplicate.into());
        }
        Ok(())
    }
}

// =============================================================================
// Transaction Helpers
// =============================================================================

/// Loads a supplier inside a caller's transaction.
pub(crate) async fn require_supplier(
    conn: &mut SqliteConnection,
    id: &str,
) -> DbResult<Supplier> {
    sqlx::query_as::<_, Supplier>(
        r#"
        SELECT id, name, gstin, phone, address, is_distributor, credit_period_days
        FROM suppliers
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| DbError::not_found("Supplier", id))
}

/// Loads a customer inside a caller's transaction.
pub(crate) async fn require_customer(
    conn: &mut SqliteConnection,
    id: &str,
) -> DbResult<Customer> {
    sqlx::query_as::<_, Customer>(
        r#"
        SELECT id, name, mobile, city, address, gstin, wallet_balance_paise, created_at
        FROM customers
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| DbError::not_found("Customer", id))
}

/// Moves a customer's wallet balance by `delta_paise`.
///
/// Negative deltas debit (wallet-mode payment recorded), positive
/// deltas credit back (wallet-mode payment deleted). Only the sales
/// repository calls this, always inside its own transaction.
pub(crate) async fn adjust_wallet(
    conn: &mut SqliteConnection,
    customer_id: &str,
    delta_paise: i64,
) -> DbResult<()> {
    debug!(customer_id = %customer_id, delta = %delta_paise, "Adjusting wallet");

    let result = sqlx::query(
        r#"
        UPDATE customers
        SET wallet_balance_paise = wallet_balance_paise + ?2
        WHERE id = ?1
        "#,
    )
    .bind(customer_id)
    .bind(delta_paise)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Customer", customer_id));
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
