//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - CRUD operations and lookups the sale coordinator validates against
//! - Guarded stock adjustment (crate-internal, transaction-scoped)
//! - Low-stock listing for the reorder dashboard
//!
//! Stock is mutated only through [`adjust_stock`], and only by the sale
//! coordinator inside its transaction. The guarded UPDATE plus the
//! schema-level CHECK make a negative stock level unrepresentable.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use fiado_core::Product;

const PRODUCT_COLUMNS: &str = "id, name, purchase_price_cents, sale_price_cents, \
     stock, reorder_level, is_active, created_at, updated_at";

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a new product.
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, purchase_price_cents, sale_price_cents,
                stock, reorder_level, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.purchase_price_cents)
        .bind(product.sale_price_cents)
        .bind(product.stock)
        .bind(product.reorder_level)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Lists active products sorted by name.
    pub async fn list_active(&self, limit: u32) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE is_active = 1 ORDER BY name LIMIT ?1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Lists active products at or below their reorder level.
    ///
    /// Feeds the reorder dashboard; ordered by how far below the level
    /// each product has fallen.
    pub async fn low_stock(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE is_active = 1 AND stock <= reorder_level \
             ORDER BY (reorder_level - stock) DESC, name"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Soft-deletes a product by setting is_active = false.
    ///
    /// ## Why Soft Delete?
    /// Historical sale lines still reference this product.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE products SET is_active = 0, updated_at = ?2 WHERE id = ?1",
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts active products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Fetches a product row inside an open transaction.
pub(crate) async fn fetch_product(
    conn: &mut SqliteConnection,
    product_id: &str,
) -> DbResult<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
    ))
    .bind(product_id)
    .fetch_optional(conn)
    .await?;

    Ok(product)
}

/// Adjusts a product's stock by a delta inside an open transaction.
///
/// Delta update, not an absolute write: negative for sale lines,
/// positive when a deleted sale restores its lines.
///
/// The `stock + delta >= 0` guard means the update simply does not match
/// when it would drive stock negative; the caller sees
/// `rows_affected() == 0` and maps that to its own domain error.
///
/// ## Returns
/// `true` when the row was updated, `false` when the product is missing
/// or the delta would make stock negative.
pub(crate) async fn adjust_stock(
    conn: &mut SqliteConnection,
    product_id: &str,
    delta: i64,
) -> DbResult<bool> {
    debug!(id = %product_id, delta = %delta, "Adjusting stock");

    let now = Utc::now();

    let result = sqlx::query(
        r#"
        UPDATE products
        SET stock = stock + ?2, updated_at = ?3
        WHERE id = ?1 AND stock + ?2 >= 0
        "#,
    )
    .bind(product_id)
    .bind(delta)
    .bind(now)
    .execute(conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Helper to generate a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
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

    fn product(name: &str, stock: i64, reorder_level: i64) -> Product {
        let now = Utc::now();
        Product {
            id: generate_product_id(),
            name: name.to_string(),
            purchase_price_cents: 700,
            sale_price_cents: 1000,
            stock,
            reorder_level,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = test_db().await;
        let p = product("Beans 500g", 10, 3);

        db.products().insert(&p).await.unwrap();

        let found = db.products().get_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(found.name, "Beans 500g");
        assert_eq!(found.stock, 10);
        assert!(found.is_active);

        assert!(db.products().get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_low_stock_listing() {
        let db = test_db().await;
        let products = db.products();

        products.insert(&product("Plenty", 50, 5)).await.unwrap();
        products.insert(&product("Low", 2, 5)).await.unwrap();
        products.insert(&product("Empty", 0, 5)).await.unwrap();

        let low = products.low_stock().await.unwrap();
        let names: Vec<&str> = low.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Empty", "Low"]);
    }

    #[tokio::test]
    async fn test_adjust_stock_guard() {
        let db = test_db().await;
        let p = product("Milk 1L", 5, 0);
        db.products().insert(&p).await.unwrap();

        let mut conn = db.pool().acquire().await.unwrap();

        assert!(adjust_stock(&mut conn, &p.id, -3).await.unwrap());
        // Going below zero refuses instead of updating
        assert!(!adjust_stock(&mut conn, &p.id, -3).await.unwrap());
        // Unknown product refuses too
        assert!(!adjust_stock(&mut conn, "missing", 1).await.unwrap());

        drop(conn);
        let found = db.products().get_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(found.stock, 2);
    }

    #[tokio::test]
    async fn test_soft_delete() {
        let db = test_db().await;
        let p = product("Old item", 1, 0);
        db.products().insert(&p).await.unwrap();

        db.products().soft_delete(&p.id).await.unwrap();
        let found = db.products().get_by_id(&p.id).await.unwrap().unwrap();
        assert!(!found.is_active);

        assert!(matches!(
            db.products().soft_delete("missing").await,
            Err(DbError::NotFound { .. })
        ));
    }
}
