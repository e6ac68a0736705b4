//! # Domain Types
//!
//! Records stored by the shop backend and the joined views it returns.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌──────────┐     ┌──────────────┐     ┌────────────────┐              │
//! │  │   Shop   │◄────│   Product    │◄────│   Inventory    │  1:1         │
//! │  │  id      │     │  item_code   │     │  qty_godown    │              │
//! │  │  name    │     │  prices      │     │  qty_display   │              │
//! │  └────┬─────┘     └──────▲───────┘     └────────────────┘              │
//! │       │                  │                                              │
//! │  ┌────▼─────┐     ┌──────┴───────┐     ┌────────────────┐              │
//! │  │  Client  │◄────│    Order     │────►│   OrderItem    │  1:N         │
//! │  │  name    │     │  status      │     │  quantity      │              │
//! │  └──────────┘     │  discount    │     │  unit_price    │              │
//! │                   │  final_total │     │  total_price   │              │
//! │                   └──────────────┘     └────────────────┘              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Records derive `sqlx::FromRow` behind the `sqlx` feature so godown-db can
//! map query rows straight into them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::{DiscountRate, Money};

// =============================================================================
// Shop & Catalog
// =============================================================================

/// A shop (the tenant of every other record).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Shop {
    pub id: String,
    pub name: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A product category within a shop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Category {
    pub id: String,
    pub shop_id: String,
    pub name: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A product a shop sells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    pub shop_id: String,

    pub category_id: Option<String>,

    /// Business identifier printed on the tag.
    pub item_code: String,

    /// Purchase cost in cents.
    pub cost_price_cents: i64,

    /// Price charged to the client, in cents.
    pub selling_price_cents: i64,

    pub vendor_name: Option<String>,

    pub remark: Option<String>,

    pub photo_url: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the selling price as Money.
    #[inline]
    pub fn selling_price(&self) -> Money {
        Money::from_cents(self.selling_price_cents)
    }
}

/// Stock counters for one product.
///
/// `qty_godown` is back-room storage, `qty_display` is what sits on the
/// shop floor. They are independent counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Inventory {
    pub product_id: String,
    pub qty_godown: i64,
    pub qty_display: i64,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// A client named on a basket. Created ad hoc, one per basket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Client {
    pub id: String,
    pub shop_id: String,
    pub name: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Order Status
// =============================================================================

/// Lifecycle of an order: `bucket → pi → sold`, never backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Draft basket, freely editable and deletable.
    Bucket,
    /// Proforma invoice: discount locked, items still editable.
    Pi,
    /// Completed sale, stock deducted. Terminal.
    Sold,
}

impl OrderStatus {
    /// Stored / wire name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Bucket => "bucket",
            OrderStatus::Pi => "pi",
            OrderStatus::Sold => "sold",
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Bucket
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Order
// =============================================================================

/// An order (basket, PI or sale).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Order {
    pub id: String,
    pub shop_id: String,
    pub client_id: String,
    pub status: OrderStatus,
    /// Order-level discount in basis points (1250 = 12.5%).
    pub discount_bps: u32,
    /// Σ line totals minus the discount, kept current by every mutation.
    pub final_total_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Order {
    #[inline]
    pub fn discount(&self) -> DiscountRate {
        DiscountRate::from_bps(self.discount_bps)
    }

    #[inline]
    pub fn final_total(&self) -> Money {
        Money::from_cents(self.final_total_cents)
    }
}

/// A line on an order. The unit price is frozen when the line is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    pub quantity: i64,
    /// Selling price at the time the line was created.
    pub unit_price_cents: i64,
    /// quantity × unit_price, computed by the database.
    pub total_price_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl OrderItem {
    #[inline]
    pub fn total_price(&self) -> Money {
        Money::from_cents(self.total_price_cents)
    }
}

/// Quantity a finalized order could not take from stock
/// (only written under [`ShortfallPolicy::Backorder`](crate::stock::ShortfallPolicy)).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Backorder {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    pub quantity: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Views (joined read models)
// =============================================================================

/// One row of a shop's inventory listing (product + category + stock).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InventoryEntry {
    /// Product id.
    pub id: String,
    pub item_code: String,
    pub photo_url: Option<String>,
    pub cost_price_cents: i64,
    pub selling_price_cents: i64,
    pub vendor_name: Option<String>,
    pub remark: Option<String>,
    pub category_name: Option<String>,
    pub qty_display: i64,
    pub qty_godown: i64,
}

/// A product looked up by item code, with its category and stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ProductDetail {
    pub id: String,
    pub shop_id: String,
    pub category_id: Option<String>,
    pub item_code: String,
    pub cost_price_cents: i64,
    pub selling_price_cents: i64,
    pub vendor_name: Option<String>,
    pub remark: Option<String>,
    pub photo_url: Option<String>,
    pub category_name: Option<String>,
    pub qty_godown: i64,
    pub qty_display: i64,
}

/// An order line joined with the product's item code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct BasketLine {
    pub product_id: String,
    pub item_code: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub total_price_cents: i64,
}

/// An order in a shop's order history, with the client's name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderSummary {
    pub id: String,
    pub shop_id: String,
    pub client_id: String,
    pub client_name: String,
    pub status: OrderStatus,
    pub discount_bps: u32,
    pub final_total_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Full view of one order: header, totals and lines.
///
/// Used both for the open basket of a shop and for order details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderDetails {
    pub order_id: String,
    pub shop_id: String,
    pub client_name: String,
    pub status: OrderStatus,
    /// Discount as a percentage (display only; stored as basis points).
    pub discount_percent: f64,
    pub subtotal_cents: i64,
    pub final_total_cents: i64,
    pub order_items: Vec<BasketLine>,
    /// Units finalize could not take from stock. Empty unless the order was
    /// sold under the backorder policy.
    pub backorders: Vec<Backorder>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_default() {
        assert_eq!(OrderStatus::default(), OrderStatus::Bucket);
    }

    #[test]
    fn test_order_status_wire_names() {
        assert_eq!(OrderStatus::Pi.to_string(), "pi");
        assert_eq!(
            serde_json::to_string(&OrderStatus::Bucket).unwrap(),
            "\"bucket\""
        );
        let sold: OrderStatus = serde_json::from_str("\"sold\"").unwrap();
        assert_eq!(sold, OrderStatus::Sold);
    }
}
