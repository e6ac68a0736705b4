//! # Repository Module
//!
//! Database repository implementations for Godown POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   Handler ──► Repository method ──► SQL ──► typed record (FromRow)     │
//! │                     │                                                   │
//! │                     └──► godown-core rule (validation, transitions,    │
//! │                          totals, stock waterfall)                       │
//! │                                                                         │
//! │   Reads run on the pool. Every mutation runs in exactly one            │
//! │   transaction that starts by writing the order row.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ShopRepository`](shop::ShopRepository) - Shop search, categories
//! - [`ProductRepository`](product::ProductRepository) - Inventory listing, lookups, inserts
//! - [`OrderRepository`](order::OrderRepository) - Basket, PI and sale workflow

pub mod order;
pub mod product;
pub mod shop;

/// Escapes `%`, `_` and `\` so user input matches literally inside `LIKE`.
///
/// Pair with `ESCAPE '\'` in the query.
pub(crate) fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Fixtures shared by the repository tests.

    use crate::repository::product::NewProduct;
    use crate::{Database, DbConfig};
    use godown_core::{Inventory, Order, OrderItem, Product, Shop, ShortfallPolicy};

    pub async fn database() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    pub async fn database_with_policy(policy: ShortfallPolicy) -> Database {
        Database::new(DbConfig::in_memory().shortfall_policy(policy))
            .await
            .unwrap()
    }

    pub async fn find_order(db: &Database, order_id: &str) -> Option<Order> {
        sqlx::query_as::<_, Order>(
            r#"
            SELECT id, shop_id, client_id, status, discount_bps,
                   final_total_cents, created_at, updated_at
            FROM orders
            WHERE id = ?1
            "#,
        )
        .bind(order_id)
        .fetch_optional(db.pool())
        .await
        .unwrap()
    }

    pub async fn order_row(db: &Database, order_id: &str) -> Order {
        find_order(db, order_id).await.unwrap()
    }

    pub async fn order_items(db: &Database, order_id: &str) -> Vec<OrderItem> {
        sqlx::query_as::<_, OrderItem>(
            r#"
            SELECT id, order_id, product_id, quantity,
                   unit_price_cents, total_price_cents, created_at
            FROM order_items
            WHERE order_id = ?1
            ORDER BY created_at, rowid
            "#,
        )
        .bind(order_id)
        .fetch_all(db.pool())
        .await
        .unwrap()
    }

    /// `(qty_godown, qty_display)` of a product.
    pub async fn stock(db: &Database, product_id: &str) -> (i64, i64) {
        let inventory = sqlx::query_as::<_, Inventory>(
            "SELECT product_id, qty_godown, qty_display, updated_at FROM inventory WHERE product_id = ?1",
        )
        .bind(product_id)
        .fetch_one(db.pool())
        .await
        .unwrap();
        (inventory.qty_godown, inventory.qty_display)
    }

    /// Drops a product's stock row, leaving the product itself in place.
    pub async fn delete_inventory(db: &Database, product_id: &str) {
        let result = sqlx::query("DELETE FROM inventory WHERE product_id = ?1")
            .bind(product_id)
            .execute(db.pool())
            .await
            .unwrap();
        assert_eq!(result.rows_affected(), 1);
    }

    pub async fn shop(db: &Database, name: &str) -> Shop {
        db.shops().insert_shop(name).await.unwrap()
    }

    /// Inserts a product with the given selling price and stock.
    pub async fn product(
        db: &Database,
        shop_id: &str,
        item_code: &str,
        selling_price_cents: i64,
        qty_godown: i64,
        qty_display: i64,
    ) -> Product {
        db.products()
            .insert(&NewProduct {
                shop_id: shop_id.to_string(),
                category_id: None,
                item_code: item_code.to_string(),
                cost_price_cents: selling_price_cents / 2,
                selling_price_cents,
                vendor_name: None,
                remark: None,
                photo_url: None,
                qty_godown,
                qty_display,
            })
            .await
            .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::escape_like;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("tea"), "tea");
        assert_eq!(escape_like("50%"), "50\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("c:\\x"), "c:\\\\x");
    }
}
