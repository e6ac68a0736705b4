//! Liveness and database health.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};
use tracing::warn;

use godown_db::migrations::migration_status;

use crate::state::AppState;

/// `GET /health`
///
/// 200 when the database answers and all migrations are applied, 503
/// otherwise.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let database = state.db.health_check().await;
    let migrations = match migration_status(state.db.pool()).await {
        Ok(status) => Some(status),
        Err(e) => {
            warn!(error = %e, "Could not read migration status");
            None
        }
    };

    let healthy = database && migrations.is_some_and(|m| m.is_current());
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let body = json!({
        "status": if healthy { "ok" } else { "degraded" },
        "database": database,
        "migrations": migrations.map(|m| json!({ "total": m.total, "applied": m.applied })),
        "version": env!("CARGO_PKG_VERSION"),
    });

    (status, Json(body))
}
