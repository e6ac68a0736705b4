//! # godown-db: Database Layer for Godown POS
//!
//! SQLite storage for shops, catalog, stock and orders, plus the
//! transactional order workflows built on godown-core's rules.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   apps/api handlers                                                     │
//! │        │                                                                │
//! │        ▼                                                                │
//! │   ┌──────────────────────── godown-db ─────────────────────────────┐   │
//! │   │                                                                 │   │
//! │   │  Database ──► shops()     ShopRepository     search, clients   │   │
//! │   │           ──► products()  ProductRepository  inventory, lookup │   │
//! │   │           ──► orders()    OrderRepository    basket workflow   │   │
//! │   │                                                                 │   │
//! │   │  pool (SqlitePool, WAL)      migrations (embedded)              │   │
//! │   └─────────────────────────────────────────────────────────────────┘   │
//! │        │                                                                │
//! │        ▼                                                                │
//! │   godown-core  (OrderTotals, StockLevel::deduct, ensure_permitted)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use godown_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("godown.db")).await?;
//!
//! let shops = db.shops().search("tea", 20).await?;
//! let basket = db.orders().create_basket(&shops[0].id, "Walk-in").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::order::{CreatedBasket, FinalizedOrder, LineDeduction, OrderRepository};
pub use repository::product::{NewProduct, ProductRepository};
pub use repository::shop::ShopRepository;
