//! # Reports Repository
//!
//! Read-only aggregates behind the overview cards, the dashboard, and
//! the accounts-payable screen.
//!
//! ## Calendar Months
//! Monthly figures group by the literal year+month of the invoice date
//! (`strftime('%Y-%m', ...)`), and "last month" is the true previous
//! calendar month. December 2026 compares against November 2026, never
//! December 2025. The month-over-month derivation itself is pure and
//! lives in `mandi_core::reporting`.
//!
//! Every function takes `today` explicitly; nothing in here reads the
//! clock.

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::SqlitePool;

use crate::error::DbResult;
use mandi_core::reporting::{month_key, previous_month_anchor, MonthlyComparison};
use mandi_core::{
    Money, PurchaseInvoice, SupplierPayment, EXPIRING_SOON_DAYS, LOW_STOCK_THRESHOLD,
    RECENTLY_SETTLED_DAYS,
};

// =============================================================================
// Read Models
// =============================================================================

/// A supplier with their summed purchase volume.
#[derive(Debug, Clone, Serialize)]
pub struct SupplierTotal {
    pub supplier_id: String,
    pub name: String,
    pub purchase_total: Money,
}

/// A city with its customer head count.
#[derive(Debug, Clone, Serialize)]
pub struct CityCount {
    pub city: String,
    pub customers: i64,
}

/// A category with its summed sales volume.
#[derive(Debug, Clone, Serialize)]
pub struct CategorySales {
    pub category_id: String,
    pub name: String,
    pub sales_total: Money,
}

/// The counters on the home screen.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    /// Active batches under the low-stock threshold, zero included.
    pub low_stock_count: i64,
    /// Active batches expiring within the next 30 days, today and the
    /// boundary day included.
    pub expiring_soon_count: i64,
    pub today_sales_total: Money,
    pub today_sales_count: i64,
}

/// A pending invoice on the accounts-payable screen.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PayableInvoice {
    #[sqlx(flatten)]
    pub invoice: PurchaseInvoice,
    pub supplier_name: String,
}

/// A supplier payment with the names the screen shows.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RecentSupplierPayment {
    #[sqlx(flatten)]
    pub payment: SupplierPayment,
    pub supplier_name: String,
    pub invoice_number: String,
}

/// Everything the accounts-payable screen needs in one load.
///
/// Pending keeps recently settled invoices visible so the operator can
/// see money that just went out, not only money still owed.
#[derive(Debug, Clone, Serialize)]
pub struct AccountsPayable {
    /// Open invoices plus ones settled within the last 30 days, by due
    /// date.
    pub pending: Vec<PayableInvoice>,
    /// Σ balance due over open invoices only.
    pub outstanding_total: Money,
    pub overdue_total: Money,
    pub overdue_count: i64,
    /// Σ supplier payments dated in today's calendar month.
    pub paid_this_month: Money,
    /// The 10 most recent payments.
    pub recent_payments: Vec<RecentSupplierPayment>,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for reporting aggregates.
#[derive(Debug, Clone)]
pub struct ReportsRepository {
    pool: SqlitePool,
}

impl ReportsRepository {
    /// Creates a new ReportsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReportsRepository { pool }
    }

    /// Purchase volume this calendar month against the previous one.
    pub async fn monthly_purchase_overview(&self, today: NaiveDate) -> DbResult<MonthlyComparison> {
        let this_month = self.month_total_purchases(&month_key(today)).await?;
        let last_month = self
            .month_total_purchases(&month_key(previous_month_anchor(today)))
            .await?;
        Ok(MonthlyComparison::from_totals(this_month, last_month))
    }

    /// Sales volume this calendar month against the previous one.
    pub async fn monthly_sales_overview(&self, today: NaiveDate) -> DbResult<MonthlyComparison> {
        let this_month = self.month_total_sales(&month_key(today)).await?;
        let last_month = self
            .month_total_sales(&month_key(previous_month_anchor(today)))
            .await?;
        Ok(MonthlyComparison::from_totals(this_month, last_month))
    }

    /// Suppliers ranked by all-time purchase volume.
    pub async fn top_suppliers(&self, n: u32) -> DbResult<Vec<SupplierTotal>> {
        let rows: Vec<(String, String, i64)> = sqlx::query_as(
            r#"
            SELECT s.id, s.name, SUM(pi.total_paise) AS total_paise
            FROM purchase_invoices pi
            JOIN suppliers s ON s.id = pi.supplier_id
            GROUP BY s.id, s.name
            ORDER BY total_paise DESC
            LIMIT ?1
            "#,
        )
        .bind(n)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(supplier_id, name, paise)| SupplierTotal {
                supplier_id,
                name,
                purchase_total: Money::from_paise(paise),
            })
            .collect())
    }

    /// Cities ranked by customer count. Customers without a city are
    /// left out.
    pub async fn top_cities(&self, n: u32) -> DbResult<Vec<CityCount>> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT city, COUNT(*) AS customers
            FROM customers
            WHERE city IS NOT NULL AND city <> ''
            GROUP BY city
            ORDER BY customers DESC, city
            LIMIT ?1
            "#,
        )
        .bind(n)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(city, customers)| CityCount { city, customers })
            .collect())
    }

    /// Categories ranked by all-time sales volume.
    pub async fn top_categories(&self, n: u32) -> DbResult<Vec<CategorySales>> {
        let rows: Vec<(String, String, i64)> = sqlx::query_as(
            r#"
            SELECT c.id, c.name, SUM(si.line_total_paise) AS total_paise
            FROM sales_items si
            JOIN batches b ON b.id = si.batch_id
            JOIN products p ON p.id = b.product_id
            JOIN categories c ON c.id = p.category_id
            GROUP BY c.id, c.name
            ORDER BY total_paise DESC
            LIMIT ?1
            "#,
        )
        .bind(n)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(category_id, name, paise)| CategorySales {
                category_id,
                name,
                sales_total: Money::from_paise(paise),
            })
            .collect())
    }

    /// The home-screen counters.
    pub async fn dashboard(&self, today: NaiveDate) -> DbResult<DashboardSnapshot> {
        let low_stock_count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM batches WHERE is_active = 1 AND current_quantity < ?1",
        )
        .bind(LOW_STOCK_THRESHOLD)
        .fetch_one(&self.pool)
        .await?;

        let expiring_soon_count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM batches
            WHERE is_active = 1
              AND expiry_date IS NOT NULL
              AND expiry_date BETWEEN ?1 AND ?2
            "#,
        )
        .bind(today)
        .bind(today + chrono::Duration::days(EXPIRING_SOON_DAYS))
        .fetch_one(&self.pool)
        .await?;

        let (today_total, today_count): (Option<i64>, i64) = sqlx::query_as(
            "SELECT SUM(grand_total_paise), COUNT(*) FROM sales_invoices WHERE invoice_date = ?1",
        )
        .bind(today)
        .fetch_one(&self.pool)
        .await?;

        Ok(DashboardSnapshot {
            low_stock_count,
            expiring_soon_count,
            today_sales_total: Money::from_paise(today_total.unwrap_or(0)),
            today_sales_count: today_count,
        })
    }

    /// The accounts-payable screen in one load.
    pub async fn accounts_payable(&self, today: NaiveDate) -> DbResult<AccountsPayable> {
        let recently_settled_after = today - chrono::Duration::days(RECENTLY_SETTLED_DAYS);

        let pending = sqlx::query_as::<_, PayableInvoice>(
            r#"
            SELECT pi.id, pi.supplier_id, pi.invoice_number, pi.invoice_date, pi.due_date,
                   pi.total_paise, pi.loading_charges_paise, pi.additional_discount_paise,
                   pi.amount_paid_paise, pi.balance_due_paise, pi.payment_status, pi.created_at,
                   s.name AS supplier_name
            FROM purchase_invoices pi
            JOIN suppliers s ON s.id = pi.supplier_id
            WHERE pi.payment_status IN ('unpaid', 'partial')
               OR (pi.payment_status = 'paid' AND pi.invoice_date >= ?1)
            ORDER BY pi.due_date IS NULL, pi.due_date, pi.invoice_date
            "#,
        )
        .bind(recently_settled_after)
        .fetch_all(&self.pool)
        .await?;

        let outstanding: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT SUM(balance_due_paise)
            FROM purchase_invoices
            WHERE payment_status IN ('unpaid', 'partial')
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let (overdue_total, overdue_count): (Option<i64>, i64) = sqlx::query_as(
            r#"
            SELECT SUM(balance_due_paise), COUNT(*)
            FROM purchase_invoices
            WHERE payment_status IN ('unpaid', 'partial')
              AND due_date IS NOT NULL
              AND due_date < ?1
            "#,
        )
        .bind(today)
        .fetch_one(&self.pool)
        .await?;

        let paid_this_month: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT SUM(amount_paise)
            FROM supplier_payments
            WHERE strftime('%Y-%m', payment_date) = ?1
            "#,
        )
        .bind(month_key(today))
        .fetch_one(&self.pool)
        .await?;

        let recent_payments = sqlx::query_as::<_, RecentSupplierPayment>(
            r#"
            SELECT sp.id, sp.invoice_id, sp.amount_paise, sp.payment_date, sp.mode,
                   sp.reference, sp.notes, sp.created_at,
                   s.name AS supplier_name,
                   pi.invoice_number
            FROM supplier_payments sp
            JOIN purchase_invoices pi ON pi.id = sp.invoice_id
            JOIN suppliers s ON s.id = pi.supplier_id
            ORDER BY sp.payment_date DESC, sp.created_at DESC
            LIMIT 10
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(AccountsPayable {
            pending,
            outstanding_total: Money::from_paise(outstanding.unwrap_or(0)),
            overdue_total: Money::from_paise(overdue_total.unwrap_or(0)),
            overdue_count,
            paid_this_month: Money::from_paise(paid_this_month.unwrap_or(0)),
            recent_payments,
        })
    }

    async fn month_total_purchases(&self, key: &str) -> DbResult<Money> {
        let paise: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(total_paise) FROM purchase_invoices WHERE strftime('%Y-%m', invoice_date) = ?1",
        )
        .bind(key)
        .fetch_one(&self.pool)
        .await?;
        Ok(Money::from_paise(paise.unwrap_or(0)))
    }

    async fn month_total_sales(&self, key: &str) -> DbResult<Money> {
        let paise: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(grand_total_paise) FROM sales_invoices WHERE strftime('%Y-%m', invoice_date) = ?1",
        )
        .bind(key)
        .fetch_one(&self.pool)
        .await?;
        Ok(Money::from_paise(paise.unwrap_or(0)))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
