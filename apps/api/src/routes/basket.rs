//! # Basket Handlers
//!
//! Creating a basket, adding items, and reading baskets back.
//!
//! ## Basket Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  POST /basket/create ──► bucket ──► POST /basket/add (repeatable)       │
//! │                            │                                            │
//! │                            ├──► POST /order/convert-to-pi ──► pi        │
//! │                            │                                   │        │
//! │                            └──► POST /order/finalize ◄─────────┘        │
//! │                                          │                              │
//! │                                          ▼                              │
//! │                                         sold                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::debug;

use godown_core::validation::validate_uuid;
use godown_core::{CoreError, OrderDetails};
use godown_db::CreatedBasket;

use crate::error::ApiResult;
use crate::routes::MutationResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateBasketRequest {
    pub shop_id: String,
    pub client_name: String,
}

#[derive(Debug, Serialize)]
pub struct CreateBasketResponse {
    pub status: &'static str,
    #[serde(flatten)]
    pub basket: CreatedBasket,
}

/// `POST /basket/create`
///
/// Creates the client and an empty `bucket` order for them.
pub async fn create_basket(
    State(state): State<AppState>,
    payload: Result<Json<CreateBasketRequest>, JsonRejection>,
) -> ApiResult<Json<CreateBasketResponse>> {
    let Json(req) = payload?;
    validate_uuid("shop_id", &req.shop_id)?;

    let basket = state
        .db
        .orders()
        .create_basket(&req.shop_id, &req.client_name)
        .await?;

    Ok(Json(CreateBasketResponse {
        status: "success",
        basket,
    }))
}

fn default_qty() -> i64 {
    1
}

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub order_id: String,
    pub product_id: String,
    #[serde(default = "default_qty")]
    pub qty: i64,
}

/// `POST /basket/add`
///
/// Adds a product line, or grows the existing line for that product.
pub async fn add_item(
    State(state): State<AppState>,
    payload: Result<Json<AddItemRequest>, JsonRejection>,
) -> ApiResult<Json<MutationResponse>> {
    let Json(req) = payload?;
    validate_uuid("order_id", &req.order_id)?;
    validate_uuid("product_id", &req.product_id)?;
    debug!(order_id = %req.order_id, product_id = %req.product_id, qty = req.qty, "add_item");

    let totals = state
        .db
        .orders()
        .add_item(&req.order_id, &req.product_id, req.qty)
        .await?;

    Ok(Json(MutationResponse::success(req.order_id, &totals)))
}

/// `GET /basket/{shop_id}`
///
/// The shop's most recent open basket with its lines.
pub async fn latest_basket(
    State(state): State<AppState>,
    Path(shop_id): Path<String>,
) -> ApiResult<Json<OrderDetails>> {
    validate_uuid("shop_id", &shop_id)?;

    let basket = state
        .db
        .orders()
        .latest_basket(&shop_id)
        .await?
        .ok_or(CoreError::BasketNotFound(shop_id))?;

    Ok(Json(basket))
}

/// `GET /basket/details/{order_id}`
pub async fn basket_details(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> ApiResult<Json<OrderDetails>> {
    validate_uuid("order_id", &order_id)?;

    let details = state
        .db
        .orders()
        .details(&order_id)
        .await?
        .ok_or(CoreError::OrderNotFound(order_id))?;

    Ok(Json(details))
}
