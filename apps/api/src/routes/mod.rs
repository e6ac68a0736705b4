//! # Routes
//!
//! ```text
//! GET    /health
//! GET    /search?name=
//! GET    /inventory/{shop_id}
//! GET    /product/by-code?item_code=[&shop_id=]
//! POST   /basket/create               { shop_id, client_name }
//! POST   /basket/add                  { order_id, product_id, qty = 1 }
//! GET    /basket/{shop_id}
//! GET    /basket/details/{order_id}
//! GET    /orders/list/{shop_id}
//! POST   /order/update-qty            { order_id, product_id, change }
//! DELETE /order/remove-item?order_id=&product_id=
//! POST   /order/convert-to-pi         { order_id, discount_percent }
//! POST   /order/finalize?order_id=
//! POST   /order/finalize-sale?order_id=
//! DELETE /order/delete/{order_id}
//! ```

pub mod basket;
pub mod catalog;
pub mod health;
pub mod orders;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::routing::{delete, get, post};
use axum::Router;
use serde::Serialize;

use godown_core::OrderTotals;

use crate::error::ApiError;
use crate::state::AppState;

/// All routes, without state or middleware.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        // Catalog
        .route("/search", get(catalog::search_shops))
        .route("/inventory/{shop_id}", get(catalog::inventory))
        .route("/product/by-code", get(catalog::product_by_code))
        // Basket
        .route("/basket/create", post(basket::create_basket))
        .route("/basket/add", post(basket::add_item))
        .route("/basket/details/{order_id}", get(basket::basket_details))
        .route("/basket/{shop_id}", get(basket::latest_basket))
        // Orders
        .route("/orders/list/{shop_id}", get(orders::list_orders))
        .route("/order/update-qty", post(orders::update_quantity))
        .route("/order/remove-item", delete(orders::remove_item))
        .route("/order/convert-to-pi", post(orders::convert_to_pi))
        .route("/order/finalize", post(orders::finalize))
        .route("/order/finalize-sale", post(orders::finalize))
        .route("/order/delete/{order_id}", delete(orders::delete_order))
}

/// Body of every successful order mutation.
#[derive(Debug, Clone, Serialize)]
pub struct MutationResponse {
    pub status: &'static str,
    pub order_id: String,
    pub final_total_cents: i64,
}

impl MutationResponse {
    pub fn success(order_id: impl Into<String>, totals: &OrderTotals) -> Self {
        MutationResponse {
            status: "success",
            order_id: order_id.into(),
            final_total_cents: totals.final_total.cents(),
        }
    }
}

// Malformed bodies and query strings answer with the same `{code, message}`
// shape as every other error.

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

/// A required query/body string, trimmed, or a `Required` validation error.
pub(crate) fn required(field: &str, value: Option<String>) -> Result<String, ApiError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(godown_core::ValidationError::Required {
            field: field.to_string(),
        }
        .into()),
    }
}
