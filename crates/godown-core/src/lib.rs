//! # godown-core: Pure Business Logic for Godown POS
//!
//! Everything a shop counter needs to decide *what* should happen to an
//! order, with no opinion about *where* the data lives.
//!
//! ## Where It Sits
//! ```text
//!   shop front-end ──JSON──► apps/api ──► godown-db ──► godown-core
//!                                          (SQLite)      (this crate)
//!
//!   Shop search ─► Inventory ─► Basket ─► PI ─► Sale
//!                                 └─── every step's rules live here ───┘
//! ```
//!
//! No I/O: everything here is a value type or a pure function, so the rules
//! are tested without a database.
//!
//! ## Modules
//!
//! - [`types`] - Domain records (Shop, Product, Order, OrderItem, views)
//! - [`money`] - Money and DiscountRate with integer arithmetic
//! - [`order`] - Order status transitions, quantity rules, totals
//! - [`stock`] - Godown-first stock deduction ("waterfall")
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use godown_core::money::{DiscountRate, Money};
//! use godown_core::order::OrderTotals;
//!
//! let lines = [Money::from_cents(60_000), Money::from_cents(40_000)];
//! let totals = OrderTotals::from_lines(lines, DiscountRate::from_bps(1000));
//!
//! assert_eq!(totals.subtotal.cents(), 100_000);
//! assert_eq!(totals.final_total.cents(), 90_000);
//! ```

pub mod error;
pub mod money;
pub mod order;
pub mod stock;
pub mod types;
pub mod validation;

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{DiscountRate, Money};
pub use order::{OrderAction, OrderTotals};
pub use stock::{ShortfallPolicy, StockDeduction, StockLevel};
pub use types::*;

/// Maximum quantity of a single product on one order line.
///
/// Catches a slipped key (1000 typed for 10) before it reaches a PI.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Minimum length of a trimmed shop search term.
pub const MIN_SEARCH_TERM_LEN: usize = 2;
