//! # Domain Errors
//!
//! ```text
//! ValidationError ──► CoreError ──► DbError (godown-db) ──► ApiError (apps/api)
//!  bad input          rule broken    storage failure          {code, message}
//! ```
//!
//! `CoreError` variants carry the ids involved so the API can name them in
//! its message without another lookup.

use thiserror::Error;

use crate::order::OrderAction;
use crate::types::OrderStatus;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Shop not found: {0}")]
    ShopNotFound(String),

    /// Looked up by id or by item code.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// The product is not a line on the order.
    #[error("Product {product_id} is not in order {order_id}")]
    OrderItemNotFound {
        order_id: String,
        product_id: String,
    },

    /// The shop has no open basket.
    #[error("No open basket for shop {0}")]
    BasketNotFound(String),

    /// A product on an order being finalized has no inventory row.
    #[error("No inventory record for product {0}")]
    InventoryMissing(String),

    /// Godown and display together cannot cover a line.
    ///
    /// ## User Workflow
    /// ```text
    /// Finalize order (line: 12 × TEA-500)
    ///      │
    ///      ▼
    /// Stock: godown=5, display=4 → available=9
    ///      │
    ///      ▼
    /// InsufficientStock { item_code: "TEA-500", available: 9, requested: 12 }
    ///      │
    ///      ▼
    /// Nothing is deducted, order stays open
    /// ```
    #[error("Insufficient stock for {item_code}: available {available}, requested {requested}")]
    InsufficientStock {
        item_code: String,
        available: i64,
        requested: i64,
    },

    /// The order's status forbids `action`, e.g. editing a sold order or
    /// deleting a PI.
    #[error("Order {order_id} is {current_status}, cannot {action}")]
    InvalidOrderStatus {
        order_id: String,
        current_status: OrderStatus,
        action: OrderAction,
    },

    #[error("Line quantity {requested} is above the limit of {max}")]
    QuantityTooLarge { requested: i64, max: i64 },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Malformed request input, caught before any lookup or write.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field} is missing")]
    Required { field: String },

    #[error("{field} needs at least {min} characters")]
    TooShort { field: String, min: usize },

    #[error("{field} allows at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must lie in {min}..={max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} must be greater than zero")]
    MustBePositive { field: String },

    /// Not a UUID, not a finite number, and the like.
    #[error("{field} is malformed: {reason}")]
    InvalidFormat { field: String, reason: String },
}

pub type CoreResult<T> = Result<T, CoreError>;
