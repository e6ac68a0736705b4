//! # Catalog Handlers
//!
//! Shop search, per-shop inventory and product lookup by item code.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Shop picker         GET /search?name=lak                               │
//! │      │                  → { results: [ {id, name, ...} ], count }       │
//! │      ▼                                                                  │
//! │  Inventory grid      GET /inventory/{shop_id}                           │
//! │      │                  → [ {item_code, prices, category, stock} ]      │
//! │      ▼                                                                  │
//! │  Tag scan            GET /product/by-code?item_code=TEA-500&shop_id=…   │
//! │                         → {id, item_code, ..., qty_godown, qty_display} │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::debug;

use godown_core::validation::{validate_item_code, validate_search_term, validate_uuid};
use godown_core::{CoreError, InventoryEntry, ProductDetail, Shop};

use crate::error::ApiResult;
use crate::routes::required;
use crate::state::AppState;

/// Upper bound on shops returned by one search.
pub const SEARCH_LIMIT: u32 = 50;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<Shop>,
    pub count: usize,
}

/// `GET /search?name=`
///
/// Case-insensitive substring match on shop names. The trimmed term must be
/// at least 2 characters.
pub async fn search_shops(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> ApiResult<Json<SearchResponse>> {
    let Query(params) = params?;
    let term = validate_search_term(params.name.as_deref().unwrap_or(""))?;
    debug!(term = %term, "search_shops");

    let results = state.db.shops().search(&term, SEARCH_LIMIT).await?;
    Ok(Json(SearchResponse {
        count: results.len(),
        results,
    }))
}

/// `GET /inventory/{shop_id}`
///
/// Every product of the shop with its category name and both stock counters,
/// ordered by item code.
pub async fn inventory(
    State(state): State<AppState>,
    Path(shop_id): Path<String>,
) -> ApiResult<Json<Vec<InventoryEntry>>> {
    validate_uuid("shop_id", &shop_id)?;

    if state.db.shops().get_by_id(&shop_id).await?.is_none() {
        return Err(CoreError::ShopNotFound(shop_id).into());
    }

    let entries = state.db.products().list_inventory(&shop_id).await?;
    Ok(Json(entries))
}

#[derive(Debug, Deserialize)]
pub struct ProductByCodeParams {
    pub item_code: Option<String>,
    pub shop_id: Option<String>,
}

/// `GET /product/by-code?item_code=[&shop_id=]`
pub async fn product_by_code(
    State(state): State<AppState>,
    params: Result<Query<ProductByCodeParams>, QueryRejection>,
) -> ApiResult<Json<ProductDetail>> {
    let Query(params) = params?;
    let item_code = validate_item_code(&required("item_code", params.item_code)?)?;

    let shop_id = params.shop_id.filter(|s| !s.trim().is_empty());
    if let Some(shop_id) = &shop_id {
        validate_uuid("shop_id", shop_id)?;
    }

    let product = state
        .db
        .products()
        .find_by_code(&item_code, shop_id.as_deref())
        .await?
        .ok_or(CoreError::ProductNotFound(item_code))?;

    Ok(Json(product))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::test_support::test_app;

    #[tokio::test]
    async fn test_search() {
        let app = test_app().await;
        app.db.shops().insert_shop("Lakshmi Stores").await.unwrap();
        app.db.shops().insert_shop("Lake View Mart").await.unwrap();
        app.db.shops().insert_shop("Hardware Hub").await.unwrap();

        let (status, body) = app.get("/search?name=%20LAK%20").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 2);
        assert_eq!(body["results"][0]["name"], "Lake View Mart");
    }

    #[tokio::test]
    async fn test_search_term_too_short() {
        let app = test_app().await;

        let (status, body) = app.get("/search?name=%20a%20").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");

        let (status, _) = app.get("/search").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_inventory() {
        let app = test_app().await;
        let (shop_id, _) = app.shop_with_product("TEA-500", 35_000, 5, 10).await;

        let (status, body) = app.get(&format!("/inventory/{shop_id}")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["item_code"], "TEA-500");
        assert_eq!(body[0]["qty_godown"], 5);
        assert_eq!(body[0]["qty_display"], 10);
    }

    #[tokio::test]
    async fn test_inventory_unknown_shop() {
        let app = test_app().await;
        let (status, body) = app
            .get("/inventory/550e8400-e29b-41d4-a716-446655440000")
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");

        let (status, _) = app.get("/inventory/not-a-uuid").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_product_by_code() {
        let app = test_app().await;
        let (shop_id, product_id) = app.shop_with_product("TEA-500", 35_000, 5, 10).await;

        let (status, body) = app
            .get(&format!("/product/by-code?item_code=TEA-500&shop_id={shop_id}"))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], product_id.as_str());
        assert_eq!(body["selling_price_cents"], 35_000);

        let (status, body) = app.get("/product/by-code?item_code=NOPE-1").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
    }
}
