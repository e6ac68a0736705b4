//! # Product Repository
//!
//! Catalog reads (inventory listing, lookup by item code) and product inserts.
//!
//! ## Inventory Listing
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  products ──LEFT JOIN── categories   (category may be unset)           │
//! │      │                                                                  │
//! │      └────LEFT JOIN── inventory      (missing row reads as 0 / 0)      │
//! │                                                                         │
//! │  → InventoryEntry { item_code, prices, category_name,                   │
//! │                     qty_display, qty_godown }                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use godown_core::validation::validate_item_code;
use godown_core::{InventoryEntry, Product, ProductDetail};

/// Fields needed to create a product together with its stock row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub shop_id: String,
    pub category_id: Option<String>,
    pub item_code: String,
    pub cost_price_cents: i64,
    pub selling_price_cents: i64,
    pub vendor_name: Option<String>,
    pub remark: Option<String>,
    pub photo_url: Option<String>,
    pub qty_godown: i64,
    pub qty_display: i64,
}

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

    /// Lists every product of a shop with its category and stock.
    ///
    /// Ordered by item code so the listing is stable between calls.
    pub async fn list_inventory(&self, shop_id: &str) -> DbResult<Vec<InventoryEntry>> {
        debug!(shop_id = %shop_id, "Listing inventory");

        let entries = sqlx::query_as::<_, InventoryEntry>(
            r#"
            SELECT
                p.id,
                p.item_code,
                p.photo_url,
                p.cost_price_cents,
                p.selling_price_cents,
                p.vendor_name,
                p.remark,
                c.name AS category_name,
                COALESCE(i.qty_display, 0) AS qty_display,
                COALESCE(i.qty_godown, 0) AS qty_godown
            FROM products p
            LEFT JOIN categories c ON c.id = p.category_id
            LEFT JOIN inventory i ON i.product_id = p.id
            WHERE p.shop_id = ?1
            ORDER BY p.item_code
            "#,
        )
        .bind(shop_id)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = entries.len(), "Inventory listed");
        Ok(entries)
    }

    /// Looks a product up by item code, with category and stock.
    ///
    /// Item codes are unique per shop, not globally. Without `shop_id` the
    /// first match by creation order is returned.
    ///
    /// ## Arguments
    /// * `item_code` - Tag code (e.g. "TEA-500")
    /// * `shop_id` - Restrict the lookup to one shop
    pub async fn find_by_code(
        &self,
        item_code: &str,
        shop_id: Option<&str>,
    ) -> DbResult<Option<ProductDetail>> {
        debug!(item_code = %item_code, shop_id = ?shop_id, "Looking up product by code");

        let product = sqlx::query_as::<_, ProductDetail>(
            r#"
            SELECT
                p.id, p.shop_id, p.category_id, p.item_code,
                p.cost_price_cents, p.selling_price_cents,
                p.vendor_name, p.remark, p.photo_url,
                c.name AS category_name,
                COALESCE(i.qty_godown, 0) AS qty_godown,
                COALESCE(i.qty_display, 0) AS qty_display
            FROM products p
            LEFT JOIN categories c ON c.id = p.category_id
            LEFT JOIN inventory i ON i.product_id = p.id
            WHERE p.item_code = ?1
              AND (?2 IS NULL OR p.shop_id = ?2)
            ORDER BY p.created_at, p.rowid
            LIMIT 1
            "#,
        )
        .bind(item_code)
        .bind(shop_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Inserts a product and its inventory row in one transaction.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Inserted product
    /// * `Err(DbError::UniqueViolation)` - item code already used in this shop
    pub async fn insert(&self, new: &NewProduct) -> DbResult<Product> {
        let item_code = validate_item_code(&new.item_code)?;
        let now = Utc::now();

        let product = Product {
            id: Uuid::new_v4().to_string(),
            shop_id: new.shop_id.clone(),
            category_id: new.category_id.clone(),
            item_code,
            cost_price_cents: new.cost_price_cents,
            selling_price_cents: new.selling_price_cents,
            vendor_name: new.vendor_name.clone(),
            remark: new.remark.clone(),
            photo_url: new.photo_url.clone(),
            created_at: now,
            updated_at: now,
        };

        debug!(item_code = %product.item_code, shop_id = %product.shop_id, "Inserting product");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO products (
                id, shop_id, category_id, item_code,
                cost_price_cents, selling_price_cents,
                vendor_name, remark, photo_url,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&product.id)
        .bind(&product.shop_id)
        .bind(&product.category_id)
        .bind(&product.item_code)
        .bind(product.cost_price_cents)
        .bind(product.selling_price_cents)
        .bind(&product.vendor_name)
        .bind(&product.remark)
        .bind(&product.photo_url)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO inventory (product_id, qty_godown, qty_display, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&product.id)
        .bind(new.qty_godown)
        .bind(new.qty_display)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(product)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
