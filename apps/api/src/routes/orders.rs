//! # Order Handlers
//!
//! Order history, line edits, PI conversion, finalize and delete.
//!
//! ## Finalize
//! ```text
//! POST /order/finalize?order_id=…
//!      │
//!      ▼
//! for each line: godown first, then display     (ShortfallPolicy decides
//!      │                                          what happens past zero)
//!      ▼
//! status = sold  → { status: "success", order_status: "sold", lines: [...] }
//!
//! Second call → 409 INVALID_STATE, stock untouched
//! ```

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use godown_core::validation::{validate_discount_percent, validate_uuid};
use godown_core::{OrderStatus, OrderSummary};
use godown_db::LineDeduction;

use crate::error::ApiResult;
use crate::routes::{required, MutationResponse};
use crate::state::AppState;

/// `GET /orders/list/{shop_id}`
///
/// All orders of the shop with client names, newest first.
pub async fn list_orders(
    State(state): State<AppState>,
    Path(shop_id): Path<String>,
) -> ApiResult<Json<Vec<OrderSummary>>> {
    validate_uuid("shop_id", &shop_id)?;
    let orders = state.db.orders().list_for_shop(&shop_id).await?;
    Ok(Json(orders))
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub order_id: String,
    pub product_id: String,
    pub change: i64,
}

/// `POST /order/update-qty`
///
/// Adds `change` (may be negative) to a line. A line that drops to zero or
/// below is removed.
pub async fn update_quantity(
    State(state): State<AppState>,
    payload: Result<Json<UpdateQuantityRequest>, JsonRejection>,
) -> ApiResult<Json<MutationResponse>> {
    let Json(req) = payload?;
    validate_uuid("order_id", &req.order_id)?;
    validate_uuid("product_id", &req.product_id)?;

    let totals = state
        .db
        .orders()
        .update_quantity(&req.order_id, &req.product_id, req.change)
        .await?;

    Ok(Json(MutationResponse::success(req.order_id, &totals)))
}

#[derive(Debug, Deserialize)]
pub struct RemoveItemParams {
    pub order_id: Option<String>,
    pub product_id: Option<String>,
}

/// `DELETE /order/remove-item?order_id=&product_id=`
pub async fn remove_item(
    State(state): State<AppState>,
    params: Result<Query<RemoveItemParams>, QueryRejection>,
) -> ApiResult<Json<MutationResponse>> {
    let Query(params) = params?;
    let order_id = required("order_id", params.order_id)?;
    let product_id = required("product_id", params.product_id)?;
    validate_uuid("order_id", &order_id)?;
    validate_uuid("product_id", &product_id)?;

    let totals = state.db.orders().remove_item(&order_id, &product_id).await?;
    Ok(Json(MutationResponse::success(order_id, &totals)))
}

#[derive(Debug, Deserialize)]
pub struct ConvertToPiRequest {
    pub order_id: String,
    pub discount_percent: f64,
}

/// `POST /order/convert-to-pi`
///
/// Locks in the discount (0-100 %) and moves the basket to `pi`.
pub async fn convert_to_pi(
    State(state): State<AppState>,
    payload: Result<Json<ConvertToPiRequest>, JsonRejection>,
) -> ApiResult<Json<MutationResponse>> {
    let Json(req) = payload?;
    validate_uuid("order_id", &req.order_id)?;
    let discount = validate_discount_percent(req.discount_percent)?;

    let totals = state.db.orders().convert_to_pi(&req.order_id, discount).await?;
    Ok(Json(MutationResponse::success(req.order_id, &totals)))
}

#[derive(Debug, Deserialize)]
pub struct OrderIdParams {
    pub order_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FinalizeResponse {
    pub status: &'static str,
    pub order_id: String,
    pub order_status: OrderStatus,
    pub final_total_cents: i64,
    pub lines: Vec<LineDeduction>,
}

/// `POST /order/finalize?order_id=` (also `/order/finalize-sale`)
pub async fn finalize(
    State(state): State<AppState>,
    params: Result<Query<OrderIdParams>, QueryRejection>,
) -> ApiResult<Json<FinalizeResponse>> {
    let Query(params) = params?;
    let order_id = required("order_id", params.order_id)?;
    validate_uuid("order_id", &order_id)?;
    debug!(order_id = %order_id, "finalize");

    let finalized = state.db.orders().finalize(&order_id).await?;
    info!(
        order_id = %finalized.order_id,
        final_total_cents = finalized.final_total_cents,
        "Sale finalized"
    );

    Ok(Json(FinalizeResponse {
        status: "success",
        order_id: finalized.order_id,
        order_status: finalized.status,
        final_total_cents: finalized.final_total_cents,
        lines: finalized.lines,
    }))
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub status: &'static str,
    pub order_id: String,
}

/// `DELETE /order/delete/{order_id}`
///
/// Only draft (`bucket`) orders can be deleted.
pub async fn delete_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> ApiResult<Json<DeleteResponse>> {
    validate_uuid("order_id", &order_id)?;
    state.db.orders().delete(&order_id).await?;

    Ok(Json(DeleteResponse {
        status: "success",
        order_id,
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::test_support::{test_app, TestApp};

    /// Basket holding `qty` of one product; returns (shop_id, product_id, order_id).
    async fn basket_with(app: &TestApp, price: i64, godown: i64, display: i64, qty: i64) -> (String, String, String) {
        let (shop_id, product_id) = app.shop_with_product("TEA-500", price, godown, display).await;
        let basket = app.db.orders().create_basket(&shop_id, "Asha").await.unwrap();
        app.db
            .orders()
            .add_item(&basket.order_id, &product_id, qty)
            .await
            .unwrap();
        (shop_id, product_id, basket.order_id)
    }

    #[tokio::test]
    async fn test_update_qty_and_remove_item() {
        let app = test_app().await;
        let (_, product_id, order_id) = basket_with(&app, 250, 0, 0, 2).await;

        let (status, body) = app
            .post(
                "/order/update-qty",
                json!({ "order_id": order_id, "product_id": product_id, "change": 3 }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["final_total_cents"], 1_250);

        let (status, body) = app
            .delete(&format!("/order/remove-item?order_id={order_id}&product_id={product_id}"))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["final_total_cents"], 0);

        let (status, body) = app
            .delete(&format!("/order/remove-item?order_id={order_id}&product_id={product_id}"))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_convert_to_pi_then_finalize() {
        let app = test_app().await;
        let (shop_id, _, order_id) = basket_with(&app, 50_000, 5, 10, 2).await;

        let (status, body) = app
            .post(
                "/order/convert-to-pi",
                json!({ "order_id": order_id, "discount_percent": 10 }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["final_total_cents"], 90_000);

        let (status, body) = app
            .request(
                axum::http::Method::POST,
                &format!("/order/finalize?order_id={order_id}"),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["order_status"], "sold");
        assert_eq!(body["final_total_cents"], 90_000);
        assert_eq!(body["lines"][0]["from_godown"], 2);

        assert_eq!(app.stock(&shop_id, "TEA-500").await, (3, 10));

        // The alias hits the same guarded workflow.
        let (status, body) = app
            .request(
                axum::http::Method::POST,
                &format!("/order/finalize-sale?order_id={order_id}"),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "INVALID_STATE");

        assert_eq!(app.stock(&shop_id, "TEA-500").await, (3, 10));
    }

    #[tokio::test]
    async fn test_finalize_insufficient_stock() {
        let app = test_app().await;
        let (_, _, order_id) = basket_with(&app, 100, 1, 1, 5).await;

        let (status, body) = app
            .request(
                axum::http::Method::POST,
                &format!("/order/finalize?order_id={order_id}"),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "INSUFFICIENT_STOCK");
    }

    #[tokio::test]
    async fn test_discount_out_of_range() {
        let app = test_app().await;
        let (_, _, order_id) = basket_with(&app, 100, 1, 1, 1).await;

        let (status, body) = app
            .post(
                "/order/convert-to-pi",
                json!({ "order_id": order_id, "discount_percent": 120 }),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_delete_only_in_bucket() {
        let app = test_app().await;
        let (shop_id, _, order_id) = basket_with(&app, 100, 1, 1, 1).await;

        let (status, _) = app.delete(&format!("/order/delete/{order_id}")).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = app.get(&format!("/basket/details/{order_id}")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let basket = app.db.orders().create_basket(&shop_id, "Ravi").await.unwrap();
        app.post(
            "/order/convert-to-pi",
            json!({ "order_id": basket.order_id, "discount_percent": 0 }),
        )
        .await;

        let (status, body) = app.delete(&format!("/order/delete/{}", basket.order_id)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "INVALID_STATE");
    }

    #[tokio::test]
    async fn test_list_orders() {
        let app = test_app().await;
        let (shop_id, _, first) = basket_with(&app, 100, 1, 1, 1).await;
        let second = app.db.orders().create_basket(&shop_id, "Ravi").await.unwrap();

        let (status, body) = app.get(&format!("/orders/list/{shop_id}")).await;
        assert_eq!(status, StatusCode::OK);
        let orders = body.as_array().unwrap();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0]["id"], second.order_id.as_str());
        assert_eq!(orders[0]["client_name"], "Ravi");
        assert_eq!(orders[1]["id"], first.as_str());
    }

    #[tokio::test]
    async fn test_finalize_requires_order_id() {
        let app = test_app().await;
        let (status, body) = app
            .request(axum::http::Method::POST, "/order/finalize", None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }
}
