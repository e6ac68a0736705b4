//! # godown-api: HTTP Server for Godown POS
//!
//! JSON endpoints for shop search, inventory, baskets, PI conversion and
//! sale finalization.
//!
//! ## Request Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Browser ──► CorsLayer ──► TraceLayer ──► Router ──► handler            │
//! │                                                        │                │
//! │                             validate input (godown-core::validation)   │
//! │                                                        │                │
//! │                             one repository call (godown-db)            │
//! │                                                        │                │
//! │                             Json<T>  or  ApiError {code, message}      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`config`] - Layered settings (`godown.toml`, `GODOWN_*`)
//! - [`error`] - `ApiError` and its HTTP mapping
//! - [`routes`] - Handlers grouped by area
//! - [`state`] - Shared handler state

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use axum::http::{header, Method};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::{ApiConfig, ConfigError};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use state::AppState;

/// Builds the application router with CORS and request tracing.
///
/// ## Example
/// ```rust,ignore
/// let state = AppState::new(db, config);
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await?;
/// axum::serve(listener, godown_api::app(state)).await?;
/// ```
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(state.config.cors_origins()))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION]);

    routes::router()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Drives the router in-process against an in-memory database.

    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use axum::Router;
    use serde_json::Value;
    use tower::ServiceExt;

    use godown_core::ShortfallPolicy;
    use godown_db::{Database, DbConfig, NewProduct};

    use crate::{app, ApiConfig, AppState};

    pub struct TestApp {
        pub router: Router,
        pub db: Database,
    }

    pub async fn test_app() -> TestApp {
        test_app_with_policy(ShortfallPolicy::default()).await
    }

    pub async fn test_app_with_policy(policy: ShortfallPolicy) -> TestApp {
        let db = Database::new(DbConfig::in_memory().shortfall_policy(policy))
            .await
            .unwrap();
        let config = ApiConfig {
            shortfall_policy: policy,
            ..ApiConfig::default()
        };
        let router = app(AppState::new(db.clone(), config));
        TestApp { router, db }
    }

    impl TestApp {
        pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
            let builder = Request::builder().method(method).uri(uri);
            let request = match body {
                Some(json) => builder
                    .header("content-type", "application/json")
                    .body(Body::from(json.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };

            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            let json = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap_or(Value::Null)
            };
            (status, json)
        }

        pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
            self.request(Method::GET, uri, None).await
        }

        pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
            self.request(Method::POST, uri, Some(body)).await
        }

        pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
            self.request(Method::DELETE, uri, None).await
        }

        /// `(qty_godown, qty_display)` as the by-code lookup reports it.
        pub async fn stock(&self, shop_id: &str, item_code: &str) -> (i64, i64) {
            let (status, body) = self
                .get(&format!("/product/by-code?item_code={item_code}&shop_id={shop_id}"))
                .await;
            assert_eq!(status, StatusCode::OK);
            (
                body["qty_godown"].as_i64().unwrap(),
                body["qty_display"].as_i64().unwrap(),
            )
        }

        /// Shop with one product; returns (shop_id, product_id).
        pub async fn shop_with_product(
            &self,
            item_code: &str,
            price_cents: i64,
            qty_godown: i64,
            qty_display: i64,
        ) -> (String, String) {
            let shop = self.db.shops().insert_shop("Lakshmi Stores").await.unwrap();
            let product = self
                .db
                .products()
                .insert(&NewProduct {
                    shop_id: shop.id.clone(),
                    category_id: None,
                    item_code: item_code.to_string(),
                    cost_price_cents: price_cents / 2,
                    selling_price_cents: price_cents,
                    vendor_name: None,
                    remark: None,
                    photo_url: None,
                    qty_godown,
                    qty_display,
                })
                .await
                .unwrap();
            (shop.id, product.id)
        }
    }
}
