//! # Order Repository
//!
//! The basket workflow: create, edit lines, convert to PI, finalize, delete.
//!
//! ## Transaction Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │    UPDATE orders SET updated_at = now WHERE id = ? RETURNING *          │
//! │      │   (first statement is a write: takes SQLite's write lock,        │
//! │      │    so two workflows on the same order run one after the other)   │
//! │      ▼                                                                  │
//! │    ensure_permitted(status, action)      ── reject → ROLLBACK           │
//! │      ▼                                                                  │
//! │    mutation (upsert line / delete line / set discount / waterfall)      │
//! │      ▼                                                                  │
//! │    recalc_total: Σ total_price × (1 - discount) → final_total_cents     │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Any error drops the transaction uncommitted, which rolls it back.
//!
//! ## Finalize (stock waterfall)
//! ```text
//! for each line (by product id):
//!     read inventory ──► StockLevel::deduct(qty, policy)  (godown-core)
//!         ──► UPDATE inventory ... WHERE qty_godown = old AND qty_display = old
//!         ──► INSERT backorders (only when something was backordered)
//! UPDATE orders SET status = 'sold'
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use godown_core::order::{apply_quantity_change, ensure_permitted, merged_quantity};
use godown_core::validation::{validate_client_name, validate_quantity, validate_quantity_change};
use godown_core::{
    Backorder, BasketLine, CoreError, DiscountRate, Money, Order, OrderAction, OrderDetails,
    OrderStatus, OrderSummary, OrderTotals, ShortfallPolicy, StockDeduction, StockLevel,
};

const ORDER_COLUMNS: &str =
    "id, shop_id, client_id, status, discount_bps, final_total_cents, created_at, updated_at";

// =============================================================================
// Result Types
// =============================================================================

/// A freshly created basket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedBasket {
    pub order_id: String,
    pub shop_id: String,
    pub client_id: String,
    pub client_name: String,
}

/// Stock taken for one line of a finalized order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineDeduction {
    pub product_id: String,
    pub item_code: String,
    pub quantity: i64,
    #[serde(flatten)]
    pub deduction: StockDeduction,
}

/// Outcome of a successful finalize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalizedOrder {
    pub order_id: String,
    pub status: OrderStatus,
    pub final_total_cents: i64,
    pub lines: Vec<LineDeduction>,
}

/// Header row shared by basket and order detail queries.
#[derive(Debug, sqlx::FromRow)]
struct DetailHeader {
    order_id: String,
    shop_id: String,
    client_name: String,
    status: OrderStatus,
    discount_bps: u32,
    final_total_cents: i64,
}

/// One line joined with its stock, read during finalize.
#[derive(Debug, sqlx::FromRow)]
struct StockLine {
    product_id: String,
    item_code: String,
    quantity: i64,
    qty_godown: Option<i64>,
    qty_display: Option<i64>,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
    shortfall_policy: ShortfallPolicy,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool, shortfall_policy: ShortfallPolicy) -> Self {
        OrderRepository {
            pool,
            shortfall_policy,
        }
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// The most recent open (`bucket`) order of a shop with its lines.
    ///
    /// ## Returns
    /// * `Ok(None)` - the shop has no open basket
    pub async fn latest_basket(&self, shop_id: &str) -> DbResult<Option<OrderDetails>> {
        let mut tx = self.pool.begin().await?;

        let header = sqlx::query_as::<_, DetailHeader>(
            r#"
            SELECT o.id AS order_id, o.shop_id, c.name AS client_name,
                   o.status, o.discount_bps, o.final_total_cents
            FROM orders o
            JOIN clients c ON c.id = o.client_id
            WHERE o.shop_id = ?1 AND o.status = 'bucket'
            ORDER BY o.created_at DESC, o.rowid DESC
            LIMIT 1
            "#,
        )
        .bind(shop_id)
        .fetch_optional(&mut *tx)
        .await?;

        let details = match header {
            Some(header) => Some(load_details(&mut tx, header).await?),
            None => None,
        };

        tx.commit().await?;
        Ok(details)
    }

    /// One order with status, discount, totals and lines.
    pub async fn details(&self, order_id: &str) -> DbResult<Option<OrderDetails>> {
        let mut tx = self.pool.begin().await?;

        let header = sqlx::query_as::<_, DetailHeader>(
            r#"
            SELECT o.id AS order_id, o.shop_id, c.name AS client_name,
                   o.status, o.discount_bps, o.final_total_cents
            FROM orders o
            JOIN clients c ON c.id = o.client_id
            WHERE o.id = ?1
            "#,
        )
        .bind(order_id)
        .fetch_optional(&mut *tx)
        .await?;

        let details = match header {
            Some(header) => Some(load_details(&mut tx, header).await?),
            None => None,
        };

        tx.commit().await?;
        Ok(details)
    }

    /// Every order of a shop with its client's name, newest first.
    pub async fn list_for_shop(&self, shop_id: &str) -> DbResult<Vec<OrderSummary>> {
        let orders = sqlx::query_as::<_, OrderSummary>(
            r#"
            SELECT o.id, o.shop_id, o.client_id, c.name AS client_name,
                   o.status, o.discount_bps, o.final_total_cents,
                   o.created_at, o.updated_at
            FROM orders o
            JOIN clients c ON c.id = o.client_id
            WHERE o.shop_id = ?1
            ORDER BY o.created_at DESC, o.rowid DESC
            "#,
        )
        .bind(shop_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    // -------------------------------------------------------------------------
    // Basket lifecycle
    // -------------------------------------------------------------------------

    /// Creates a client and an empty `bucket` order for them.
    ///
    /// ## Returns
    /// * `Err(CoreError::ShopNotFound)` - unknown shop
    pub async fn create_basket(&self, shop_id: &str, client_name: &str) -> DbResult<CreatedBasket> {
        let client_name = validate_client_name(client_name)?;

        let shop_exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM shops WHERE id = ?1")
            .bind(shop_id)
            .fetch_optional(&self.pool)
            .await?;
        if shop_exists.is_none() {
            return Err(CoreError::ShopNotFound(shop_id.to_string()).into());
        }

        let now = Utc::now();
        let basket = CreatedBasket {
            order_id: Uuid::new_v4().to_string(),
            shop_id: shop_id.to_string(),
            client_id: Uuid::new_v4().to_string(),
            client_name,
        };

        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO clients (id, shop_id, name, created_at) VALUES (?1, ?2, ?3, ?4)")
            .bind(&basket.client_id)
            .bind(&basket.shop_id)
            .bind(&basket.client_name)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, shop_id, client_id, status,
                discount_bps, final_total_cents, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, 0, 0, ?5, ?5)
            "#,
        )
        .bind(&basket.order_id)
        .bind(&basket.shop_id)
        .bind(&basket.client_id)
        .bind(OrderStatus::Bucket)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(order_id = %basket.order_id, shop_id = %shop_id, "Basket created");
        Ok(basket)
    }

    /// Adds `qty` of a product to an order, or grows its existing line.
    ///
    /// The unit price is the product's selling price now; an existing line
    /// keeps the price it was created with.
    ///
    /// ## Returns
    /// The order totals after the change.
    pub async fn add_item(&self, order_id: &str, product_id: &str, qty: i64) -> DbResult<OrderTotals> {
        validate_quantity(qty)?;
        debug!(order_id = %order_id, product_id = %product_id, qty = qty, "Adding item");

        let mut tx = self.pool.begin().await?;
        let order = lock_order(&mut tx, order_id, OrderAction::EditItems).await?;

        let selling_price: i64 = sqlx::query_scalar(
            "SELECT selling_price_cents FROM products WHERE id = ?1 AND shop_id = ?2",
        )
        .bind(product_id)
        .bind(&order.shop_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;

        let existing: Option<i64> = sqlx::query_scalar(
            "SELECT quantity FROM order_items WHERE order_id = ?1 AND product_id = ?2",
        )
        .bind(order_id)
        .bind(product_id)
        .fetch_optional(&mut *tx)
        .await?;
        merged_quantity(existing.unwrap_or(0), qty)?;

        sqlx::query(
            r#"
            INSERT INTO order_items (id, order_id, product_id, quantity, unit_price_cents, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT (order_id, product_id)
            DO UPDATE SET quantity = order_items.quantity + excluded.quantity
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(order_id)
        .bind(product_id)
        .bind(qty)
        .bind(selling_price)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        let totals = recalc_total(&mut tx, order_id).await?;
        tx.commit().await?;

        Ok(totals)
    }

    /// Changes a line's quantity by `change`. At zero or below the line is
    /// removed.
    pub async fn update_quantity(
        &self,
        order_id: &str,
        product_id: &str,
        change: i64,
    ) -> DbResult<OrderTotals> {
        validate_quantity_change(change)?;
        debug!(order_id = %order_id, product_id = %product_id, change = change, "Updating quantity");

        let mut tx = self.pool.begin().await?;
        lock_order(&mut tx, order_id, OrderAction::EditItems).await?;

        let current: i64 = sqlx::query_scalar(
            "SELECT quantity FROM order_items WHERE order_id = ?1 AND product_id = ?2",
        )
        .bind(order_id)
        .bind(product_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| item_not_found(order_id, product_id))?;

        match apply_quantity_change(current, change)? {
            Some(quantity) => {
                sqlx::query(
                    "UPDATE order_items SET quantity = ?3 WHERE order_id = ?1 AND product_id = ?2",
                )
                .bind(order_id)
                .bind(product_id)
                .bind(quantity)
                .execute(&mut *tx)
                .await?;
            }
            None => {
                debug!(order_id = %order_id, product_id = %product_id, "Quantity reached zero, removing line");
                delete_line(&mut tx, order_id, product_id).await?;
            }
        }

        let totals = recalc_total(&mut tx, order_id).await?;
        tx.commit().await?;

        Ok(totals)
    }

    /// Removes a line from an order.
    pub async fn remove_item(&self, order_id: &str, product_id: &str) -> DbResult<OrderTotals> {
        debug!(order_id = %order_id, product_id = %product_id, "Removing item");

        let mut tx = self.pool.begin().await?;
        lock_order(&mut tx, order_id, OrderAction::EditItems).await?;

        if !delete_line(&mut tx, order_id, product_id).await? {
            return Err(item_not_found(order_id, product_id));
        }

        let totals = recalc_total(&mut tx, order_id).await?;
        tx.commit().await?;

        Ok(totals)
    }

    /// Turns a basket into a proforma invoice with the given discount.
    pub async fn convert_to_pi(&self, order_id: &str, discount: DiscountRate) -> DbResult<OrderTotals> {
        let mut tx = self.pool.begin().await?;
        lock_order(&mut tx, order_id, OrderAction::ConvertToPi).await?;

        sqlx::query("UPDATE orders SET status = ?2, discount_bps = ?3 WHERE id = ?1")
            .bind(order_id)
            .bind(OrderStatus::Pi)
            .bind(discount.bps())
            .execute(&mut *tx)
            .await?;

        let totals = recalc_total(&mut tx, order_id).await?;
        tx.commit().await?;

        info!(
            order_id = %order_id,
            discount_bps = discount.bps(),
            final_total = %totals.final_total,
            "Order converted to PI"
        );
        Ok(totals)
    }

    /// Completes the sale: deducts stock godown-first and marks the order
    /// `sold`.
    ///
    /// Runs once per order. A second call finds the order `sold` and is
    /// rejected before any stock is touched.
    ///
    /// ## Errors
    /// * `CoreError::OrderNotFound` / `InvalidOrderStatus`
    /// * `CoreError::InventoryMissing` - a line's product has no stock row
    /// * `CoreError::InsufficientStock` - under the `Reject` policy
    /// * `DbError::Conflict` - the stock row changed between read and write.
    ///   Unreachable on SQLite: `lock_order` holds the database write lock
    ///   for the whole transaction, so the compare-and-swap always matches.
    pub async fn finalize(&self, order_id: &str) -> DbResult<FinalizedOrder> {
        let mut tx = self.pool.begin().await?;
        let order = lock_order(&mut tx, order_id, OrderAction::Finalize).await?;

        let lines = sqlx::query_as::<_, StockLine>(
            r#"
            SELECT oi.product_id, p.item_code, oi.quantity,
                   inv.qty_godown, inv.qty_display
            FROM order_items oi
            JOIN products p ON p.id = oi.product_id
            LEFT JOIN inventory inv ON inv.product_id = oi.product_id
            WHERE oi.order_id = ?1
            ORDER BY oi.product_id
            "#,
        )
        .bind(order_id)
        .fetch_all(&mut *tx)
        .await?;

        let now = Utc::now();
        let mut deductions = Vec::with_capacity(lines.len());

        for line in lines {
            let (Some(qty_godown), Some(qty_display)) = (line.qty_godown, line.qty_display) else {
                return Err(CoreError::InventoryMissing(line.item_code).into());
            };

            let plan = StockLevel::new(qty_godown, qty_display).deduct(
                &line.item_code,
                line.quantity,
                self.shortfall_policy,
            )?;

            let updated = sqlx::query(
                r#"
                UPDATE inventory
                SET qty_godown = ?2, qty_display = ?3, updated_at = ?4
                WHERE product_id = ?1 AND qty_godown = ?5 AND qty_display = ?6
                "#,
            )
            .bind(&line.product_id)
            .bind(plan.after.qty_godown)
            .bind(plan.after.qty_display)
            .bind(now)
            .bind(plan.before.qty_godown)
            .bind(plan.before.qty_display)
            .execute(&mut *tx)
            .await?;

            if updated.rows_affected() == 0 {
                return Err(DbError::conflict("Inventory", line.product_id));
            }

            if plan.backordered > 0 {
                sqlx::query(
                    r#"
                    INSERT INTO backorders (id, order_id, product_id, quantity, created_at)
                    VALUES (?1, ?2, ?3, ?4, ?5)
                    "#,
                )
                .bind(Uuid::new_v4().to_string())
                .bind(order_id)
                .bind(&line.product_id)
                .bind(plan.backordered)
                .bind(now)
                .execute(&mut *tx)
                .await?;
            }

            debug!(
                product_id = %line.product_id,
                from_godown = plan.from_godown,
                from_display = plan.from_display,
                backordered = plan.backordered,
                "Stock deducted"
            );

            deductions.push(LineDeduction {
                product_id: line.product_id,
                item_code: line.item_code,
                quantity: line.quantity,
                deduction: plan,
            });
        }

        sqlx::query("UPDATE orders SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(order_id)
            .bind(OrderStatus::Sold)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(order_id = %order_id, lines = deductions.len(), "Order finalized");
        Ok(FinalizedOrder {
            order_id: order.id,
            status: OrderStatus::Sold,
            final_total_cents: order.final_total_cents,
            lines: deductions,
        })
    }

    /// Deletes a draft basket: its lines first, then the order.
    pub async fn delete(&self, order_id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;
        lock_order(&mut tx, order_id, OrderAction::Delete).await?;

        let lines = sqlx::query("DELETE FROM order_items WHERE order_id = ?1")
            .bind(order_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        sqlx::query("DELETE FROM orders WHERE id = ?1")
            .bind(order_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(order_id = %order_id, lines = lines, "Basket deleted");
        Ok(())
    }
}

// =============================================================================
// Transaction helpers
// =============================================================================

/// Takes the write lock on an order and checks `action` is allowed.
///
/// The `UPDATE ... RETURNING` is the first statement of every mutating
/// transaction, so it both serialises writers and reads the current status.
async fn lock_order(conn: &mut SqliteConnection, order_id: &str, action: OrderAction) -> DbResult<Order> {
    let order = sqlx::query_as::<_, Order>(&format!(
        "UPDATE orders SET updated_at = ?2 WHERE id = ?1 RETURNING {ORDER_COLUMNS}"
    ))
    .bind(order_id)
    .bind(Utc::now())
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;

    ensure_permitted(&order.id, order.status, action)?;
    Ok(order)
}

/// Recomputes and stores an order's final total.
///
/// No lines count as a zero subtotal; a missing order counts as no discount.
async fn recalc_total(conn: &mut SqliteConnection, order_id: &str) -> DbResult<OrderTotals> {
    let subtotal: i64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(total_price_cents), 0) FROM order_items WHERE order_id = ?1",
    )
    .bind(order_id)
    .fetch_one(&mut *conn)
    .await?;

    let discount_bps: Option<u32> = sqlx::query_scalar("SELECT discount_bps FROM orders WHERE id = ?1")
        .bind(order_id)
        .fetch_optional(&mut *conn)
        .await?;

    let totals = OrderTotals::new(
        Money::from_cents(subtotal),
        DiscountRate::from_bps(discount_bps.unwrap_or(0)),
    );

    sqlx::query("UPDATE orders SET final_total_cents = ?2 WHERE id = ?1")
        .bind(order_id)
        .bind(totals.final_total.cents())
        .execute(&mut *conn)
        .await?;

    debug!(
        order_id = %order_id,
        subtotal = %totals.subtotal,
        final_total = %totals.final_total,
        "Order total recalculated"
    );
    Ok(totals)
}

/// Deletes one line. Returns whether a row existed.
async fn delete_line(conn: &mut SqliteConnection, order_id: &str, product_id: &str) -> DbResult<bool> {
    let result = sqlx::query("DELETE FROM order_items WHERE order_id = ?1 AND product_id = ?2")
        .bind(order_id)
        .bind(product_id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Loads the lines and backorders for a detail header and assembles the view.
async fn load_details(conn: &mut SqliteConnection, header: DetailHeader) -> DbResult<OrderDetails> {
    let lines = sqlx::query_as::<_, BasketLine>(
        r#"
        SELECT oi.product_id, p.item_code, oi.quantity,
               oi.unit_price_cents, oi.total_price_cents
        FROM order_items oi
        JOIN products p ON p.id = oi.product_id
        WHERE oi.order_id = ?1
        ORDER BY oi.created_at, oi.rowid
        "#,
    )
    .bind(&header.order_id)
    .fetch_all(&mut *conn)
    .await?;

    let backorders = sqlx::query_as::<_, Backorder>(
        r#"
        SELECT id, order_id, product_id, quantity, created_at
        FROM backorders
        WHERE order_id = ?1
        ORDER BY product_id
        "#,
    )
    .bind(&header.order_id)
    .fetch_all(&mut *conn)
    .await?;

    let subtotal: Money = lines.iter().map(|l| Money::from_cents(l.total_price_cents)).sum();

    Ok(OrderDetails {
        order_id: header.order_id,
        shop_id: header.shop_id,
        client_name: header.client_name,
        status: header.status,
        discount_percent: DiscountRate::from_bps(header.discount_bps).percentage(),
        subtotal_cents: subtotal.cents(),
        final_total_cents: header.final_total_cents,
        order_items: lines,
        backorders,
    })
}

fn item_not_found(order_id: &str, product_id: &str) -> DbError {
    CoreError::OrderItemNotFound {
        order_id: order_id.to_string(),
        product_id: product_id.to_string(),
    }
    .into()
}

// =============================================================================
// Unit Tests
// =============================================================================
