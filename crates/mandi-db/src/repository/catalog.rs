//! # Catalog Repository
//!
//! Database operations for categories, manufacturers and products.
//!
//! ## Key Operations
//! - CRUD for the three master-data tables
//! - Product search by name substring
//! - Exact-name product lookup
//!
//! ## Name Resolution
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              Why products resolve by exact name                         │
//! │                                                                         │
//! │  The purchase entry grid carries product NAMES, not ids: the clerk     │
//! │  types what is printed on the supplier bill.                           │
//! │                                                                         │
//! │  "Urea 45kg"  ──lookup──►  products.name UNIQUE  ──►  Product row      │
//! │                                                                         │
//! │  A miss is a hard error: the whole invoice aborts rather than          │
//! │  silently creating a misspelled product.                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use mandi_core::validation::{validate_name, validate_rate_bps};
use mandi_core::{Category, Manufacturer, Product, UnitKind};

// =============================================================================
// Drafts
// =============================================================================

/// Input for creating or updating a category.
#[derive(Debug, Clone, Default)]
pub struct CategoryDraft {
    pub name: String,
    pub cgst_bps: i64,
    pub sgst_bps: i64,
    pub igst_bps: i64,
}

/// Input for creating or updating a manufacturer.
#[derive(Debug, Clone, Default)]
pub struct ManufacturerDraft {
    pub name: String,
    pub description: Option<String>,
}

/// Input for creating or updating a product.
#[derive(Debug, Clone)]
pub struct ProductDraft {
    pub name: String,
    pub hsn_code: String,
    pub unit: UnitKind,
    pub category_id: String,
    pub manufacturer_id: String,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for master-data catalog operations.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    /// Creates a new CatalogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    // -------------------------------------------------------------------------
    // Categories
    // -------------------------------------------------------------------------

    /// Creates a category with its GST rate card.
    pub async fn create_category(&self, draft: CategoryDraft) -> DbResult<Category> {
        validate_name(&draft.name, "category name")?;
        validate_rate_bps(draft.cgst_bps)?;
        validate_rate_bps(draft.sgst_bps)?;
        validate_rate_bps(draft.igst_bps)?;

        let id = Uuid::new_v4().to_string();
        debug!(id = %id, name = %draft.name, "Creating category");

        sqlx::query(
            r#"
            INSERT INTO categories (id, name, cgst_bps, sgst_bps, igst_bps)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&id)
        .bind(&draft.name)
        .bind(draft.cgst_bps)
        .bind(draft.sgst_bps)
        .bind(draft.igst_bps)
        .execute(&self.pool)
        .await?;

        Ok(Category {
            id,
            name: draft.name,
            cgst_bps: draft.cgst_bps,
            sgst_bps: draft.sgst_bps,
            igst_bps: draft.igst_bps,
        })
    }

    /// Updates an existing category.
    pub async fn update_category(&self, id: &str, draft: CategoryDraft) -> DbResult<()> {
        validate_name(&draft.name, "category name")?;
        validate_rate_bps(draft.cgst_bps)?;
        validate_rate_bps(draft.sgst_bps)?;
        validate_rate_bps(draft.igst_bps)?;

        debug!(id = %id, "Updating category");

        let result = sqlx::query(
            r#"
            UPDATE categories
            SET name = ?2, cgst_bps = ?3, sgst_bps = ?4, igst_bps = ?5
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&draft.name)
        .bind(draft.cgst_bps)
        .bind(draft.sgst_bps)
        .bind(draft.igst_bps)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id));
        }

        Ok(())
    }

    /// Gets a category by ID.
    pub async fn get_category(&self, id: &str) -> DbResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, name, cgst_bps, sgst_bps, igst_bps
            FROM categories
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    /// Lists all categories ordered by name.
    pub async fn list_categories(&self) -> DbResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, name, cgst_bps, sgst_bps, igst_bps
            FROM categories
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    // -------------------------------------------------------------------------
    // Manufacturers
    // -------------------------------------------------------------------------

    /// Creates a manufacturer.
    pub async fn create_manufacturer(&self, draft: ManufacturerDraft) -> DbResult<Manufacturer> {
        validate_name(&draft.name, "manufacturer name")?;

        let id = Uuid::new_v4().to_string();
        debug!(id = %id, name = %draft.name, "Creating manufacturer");

        sqlx::query(
            r#"
            INSERT INTO manufacturers (id, name, description)
            VALUES (?1, ?2, ?3)
            "#,
        )
        .bind(&id)
        .bind(&draft.name)
        .bind(&draft.description)
        .execute(&self.pool)
        .await?;

        Ok(Manufacturer {
            id,
            name: draft.name,
            description: draft.description,
        })
    }

    /// Updates an existing manufacturer.
    pub async fn update_manufacturer(&self, id: &str, draft: ManufacturerDraft) -> DbResult<()> {
        validate_name(&draft.name, "manufacturer name")?;

        let result = sqlx::query(
            r#"
            UPDATE manufacturers
            SET name = ?2, description = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&draft.name)
        .bind(&draft.description)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Manufacturer", id));
        }

        Ok(())
    }

    /// Gets a manufacturer by ID.
    pub async fn get_manufacturer(&self, id: &str) -> DbResult<Option<Manufacturer>> {
        let manufacturer = sqlx::query_as::<_, Manufacturer>(
            r#"
            SELECT id, name, description
            FROM manufacturers
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(manufacturer)
    }

    /// Lists all manufacturers ordered by name.
    pub async fn list_manufacturers(&self) -> DbResult<Vec<Manufacturer>> {
        let manufacturers = sqlx::query_as::<_, Manufacturer>(
            r#"
            SELECT id, name, description
            FROM manufacturers
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(manufacturers)
    }

    // -------------------------------------------------------------------------
    // Products
    // -------------------------------------------------------------------------

    /// Creates a product.
    pub async fn create_product(&self, draft: ProductDraft) -> DbResult<Product> {
        validate_name(&draft.name, "product name")?;

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        debug!(id = %id, name = %draft.name, "Creating product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, hsn_code, unit, category_id, manufacturer_id,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&id)
        .bind(&draft.name)
        .bind(&draft.hsn_code)
        .bind(draft.unit)
        .bind(&draft.category_id)
        .bind(&draft.manufacturer_id)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Product {
            id,
            name: draft.name,
            hsn_code: draft.hsn_code,
            unit: draft.unit,
            category_id: draft.category_id,
            manufacturer_id: draft.manufacturer_id,
            created_at: now,
            updated_at: now,
        })
    }

    /// Updates an existing product.
    pub async fn update_product(&self, id: &str, draft: ProductDraft) -> DbResult<()> {
        validate_name(&draft.name, "product name")?;

        debug!(id = %id, "Updating product");

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                hsn_code = ?3,
                unit = ?4,
                category_id = ?5,
                manufacturer_id = ?6,
                updated_at = ?7
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&draft.name)
        .bind(&draft.hsn_code)
        .bind(draft.unit)
        .bind(&draft.category_id)
        .bind(&draft.manufacturer_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Gets a product by ID.
    pub async fn get_product(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, hsn_code, unit, category_id, manufacturer_id,
                   created_at, updated_at
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a product by its exact name.
    ///
    /// ## Usage
    /// Purchase entry resolves bill lines through this lookup.
    pub async fn product_by_name(&self, name: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, hsn_code, unit, category_id, manufacturer_id,
                   created_at, updated_at
            FROM products
            WHERE name = ?1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Searches products by name substring, ordered by name.
    pub async fn search_products(&self, query: &str, limit: u32) -> DbResult<Vec<Product>> {
        let query = query.trim();
        debug!(query = %query, limit = %limit, "Searching products");

        let pattern = format!("%{}%", query);
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, hsn_code, unit, category_id, manufacturer_id,
                   created_at, updated_at
            FROM products
            WHERE name LIKE ?1
            ORDER BY name
            LIMIT ?2
            "#,
        )
        .bind(&pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = products.len(), "Search returned products");
        Ok(products)
    }

    /// Lists all products ordered by name.
    pub async fn list_products(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, hsn_code, unit, category_id, manufacturer_id,
                   created_at, updated_at
            FROM products
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }
}

// =============================================================================
// Transaction Helpers
// =============================================================================

/// Resolves a product by exact name inside a caller's transaction.
///
/// A miss is a hard [`DbError::NotFound`]: an invoice naming an unknown
/// product must abort as a whole.
pub(crate) async fn require_product_by_name(
    conn: &mut SqliteConnection,
    name: &str,
) -> DbResult<Product> {
    sqlx::query_as::<_, Product>(
        r#"
        SELECT id, name, hsn_code, unit, category_id, manufacturer_id,
               created_at, updated_at
        FROM products
        WHERE name = ?1
        "#,
    )
    .bind(name)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| DbError::not_found("Product", name))
}

/// Loads a category inside a caller's transaction.
pub(crate) async fn require_category(
    conn: &mut SqliteConnection,
    id: &str,
) -> DbResult<Category> {
    sqlx::query_as::<_, Category>(
        r#"
        SELECT id, name, cgst_bps, sgst_bps, igst_bps
        FROM categories
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| DbError::not_found("Category", id))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn gst_category(name: &str, half_bps: i64) -> CategoryDraft {
        CategoryDraft {
            name: name.to_string(),
            cgst_bps: half_bps,
            sgst_bps: half_bps,
            igst_bps: half_bps * 2,
        }
    }

    #[tokio::test]
    async fn test_category_roundtrip_and_combined_rate() {
        let db = test_db().await;
        let repo = db.catalog();

        let created = repo.create_category(gst_category("Fertilizer", 900)).await.unwrap();
        let loaded = repo.get_category(&created.id).await.unwrap().unwrap();

        assert_eq!(loaded.name, "Fertilizer");
        assert_eq!(loaded.combined_rate().bps(), 1800);
    }

    #[tokio::test]
    async fn test_categories_list_ordered_by_name() {
        let db = test_db().await;
        let repo = db.catalog();

        repo.create_category(gst_category("Seeds", 250)).await.unwrap();
        repo.create_category(gst_category("Fertilizer", 900)).await.unwrap();
        repo.create_category(gst_category("Pesticide", 900)).await.unwrap();

        let names: Vec<String> = repo
            .list_categories()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Fertilizer", "Pesticide", "Seeds"]);
    }

    #[tokio::test]
    async fn test_duplicate_category_name_rejected() {
        let db = test_db().await;
        let repo = db.catalog();

        repo.create_category(gst_category("Seeds", 250)).await.unwrap();
        let err = repo
            .create_category(gst_category("Seeds", 250))
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_category_rate_out_of_range_rejected() {
        let db = test_db().await;
        let err = db
            .catalog()
            .create_category(gst_category("Broken", 20_000))
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::Domain(_)));
    }

    async fn seed_product(db: &Database, name: &str) -> Product {
        let repo = db.catalog();
        let category = repo.create_category(gst_category(&format!("cat-{name}"), 900)).await.unwrap();
        let maker = repo
            .create_manufacturer(ManufacturerDraft {
                name: format!("mfr-{name}"),
                description: None,
            })
            .await
            .unwrap();
        repo.create_product(ProductDraft {
            name: name.to_string(),
            hsn_code: "3102".to_string(),
            unit: UnitKind::Bag,
            category_id: category.id,
            manufacturer_id: maker.id,
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_product_by_name_is_exact() {
        let db = test_db().await;
        seed_product(&db, "Urea 45kg").await;

        let repo = db.catalog();
        assert!(repo.product_by_name("Urea 45kg").await.unwrap().is_some());
        assert!(repo.product_by_name("Urea").await.unwrap().is_none());
        assert!(repo.product_by_name("urea 45kg").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_search_products_substring() {
        let db = test_db().await;
        seed_product(&db, "Urea 45kg").await;
        seed_product(&db, "DAP 50kg").await;
        seed_product(&db, "Urea Gold").await;

        let hits = db.catalog().search_products("Urea", 10).await.unwrap();
        let names: Vec<String> = hits.into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["Urea 45kg", "Urea Gold"]);
    }

    #[tokio::test]
    async fn test_update_product_touches_updated_at() {
        let db = test_db().await;
        let product = seed_product(&db, "Urea 45kg").await;

        let repo = db.catalog();
        repo.update_product(
            &product.id,
            ProductDraft {
                name: "Urea 45kg (new bag)".to_string(),
                hsn_code: product.hsn_code.clone(),
                unit: product.unit,
                category_id: product.category_id.clone(),
                manufacturer_id: product.manufacturer_id.clone(),
            },
        )
        .await
        .unwrap();

        let loaded = repo.get_product(&product.id).await.unwrap().unwrap();
        assert_eq!(loaded.name, "Urea 45kg (new bag)");
        assert!(loaded.updated_at >= product.updated_at);
    }

    #[tokio::test]
    async fn test_update_missing_manufacturer_not_found() {
        let db = test_db().await;
        let err = db
            .catalog()
            .update_manufacturer(
                "no-such-id",
                ManufacturerDraft {
                    name: "IFFCO".to_string(),
                    description: None,
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
