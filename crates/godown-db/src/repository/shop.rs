//! # Shop Repository
//!
//! Shop lookup and the per-shop category list.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use crate::repository::escape_like;
use godown_core::{Category, Shop};

/// Repository for shop database operations.
#[derive(Debug, Clone)]
pub struct ShopRepository {
    pool: SqlitePool,
}

impl ShopRepository {
    /// Creates a new ShopRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ShopRepository { pool }
    }

    /// Finds shops whose name contains `term`, case-insensitively.
    ///
    /// ## How It Works
    /// `LIKE '%term%'` with wildcards in the term escaped, so `"50%"` only
    /// matches a literal `50%`. SQLite's `LIKE` folds ASCII case.
    ///
    /// ## Arguments
    /// * `term` - Already validated search term (see `validate_search_term`)
    /// * `limit` - Maximum results to return
    pub async fn search(&self, term: &str, limit: u32) -> DbResult<Vec<Shop>> {
        debug!(term = %term, limit = %limit, "Searching shops");

        let pattern = format!("%{}%", escape_like(term));

        let shops = sqlx::query_as::<_, Shop>(
            r#"
            SELECT id, name, created_at
            FROM shops
            WHERE name LIKE ?1 ESCAPE '\'
            ORDER BY name
            LIMIT ?2
            "#,
        )
        .bind(pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = shops.len(), "Shop search returned");
        Ok(shops)
    }

    /// Gets a shop by ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Shop))` - Shop found
    /// * `Ok(None)` - Shop not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Shop>> {
        let shop = sqlx::query_as::<_, Shop>("SELECT id, name, created_at FROM shops WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(shop)
    }

    /// Creates a shop.
    pub async fn insert_shop(&self, name: &str) -> DbResult<Shop> {
        let shop = Shop {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            created_at: Utc::now(),
        };

        debug!(id = %shop.id, name = %shop.name, "Inserting shop");

        sqlx::query("INSERT INTO shops (id, name, created_at) VALUES (?1, ?2, ?3)")
            .bind(&shop.id)
            .bind(&shop.name)
            .bind(shop.created_at)
            .execute(&self.pool)
            .await?;

        Ok(shop)
    }

    /// Creates a category in a shop.
    pub async fn insert_category(&self, shop_id: &str, name: &str) -> DbResult<Category> {
        let category = Category {
            id: Uuid::new_v4().to_string(),
            shop_id: shop_id.to_string(),
            name: name.trim().to_string(),
            created_at: Utc::now(),
        };

        debug!(shop_id = %shop_id, name = %category.name, "Inserting category");

        sqlx::query(
            "INSERT INTO categories (id, shop_id, name, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&category.id)
        .bind(&category.shop_id)
        .bind(&category.name)
        .bind(category.created_at)
        .execute(&self.pool)
        .await?;

        Ok(category)
    }

    /// Lists a shop's categories by name.
    pub async fn list_categories(&self, shop_id: &str) -> DbResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, shop_id, name, created_at
            FROM categories
            WHERE shop_id = ?1
            ORDER BY name
            "#,
        )
        .bind(shop_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::error::DbError;
    use crate::repository::test_support::{database, shop};

    #[tokio::test]
    async fn test_search_is_case_insensitive_substring() {
        let db = database().await;
        shop(&db, "Lakshmi Tea House").await;
        shop(&db, "Green Teapot").await;
        shop(&db, "Hardware Corner").await;

        let found = db.shops().search("TEA", 20).await.unwrap();
        let names: Vec<_> = found.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Green Teapot", "Lakshmi Tea House"]);
    }

    #[tokio::test]
    async fn test_search_escapes_wildcards() {
        let db = database().await;
        shop(&db, "Sale 50% Off").await;
        shop(&db, "Sale 500 Mart").await;

        let found = db.shops().search("50%", 20).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Sale 50% Off");
    }

    #[tokio::test]
    async fn test_search_respects_limit() {
        let db = database().await;
        for i in 0..5 {
            shop(&db, &format!("Store {i}")).await;
        }
        assert_eq!(db.shops().search("Store", 3).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_get_by_id() {
        let db = database().await;
        let created = shop(&db, "Corner").await;

        let fetched = db.shops().get_by_id(&created.id).await.unwrap();
        assert_eq!(fetched.map(|s| s.name), Some("Corner".to_string()));
        assert!(db.shops().get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_categories() {
        let db = database().await;
        let s = shop(&db, "Corner").await;

        db.shops().insert_category(&s.id, "Tea").await.unwrap();
        db.shops().insert_category(&s.id, "Coffee").await.unwrap();

        let names: Vec<_> = db
            .shops()
            .list_categories(&s.id)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Coffee", "Tea"]);
    }

    #[tokio::test]
    async fn test_category_requires_existing_shop() {
        let db = database().await;
        let err = db.shops().insert_category("no-such-shop", "Tea").await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }
}
