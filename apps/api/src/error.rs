//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  ValidationError ──► CoreError ──► DbError ──► ApiError ──► Response    │
//! │                                                                         │
//! │  Response body:  { "code": "NOT_FOUND", "message": "Order not found" } │
//! │                                                                         │
//! │  VALIDATION_ERROR    400     NOT_FOUND        404                      │
//! │  INVALID_STATE       409     INSUFFICIENT_STOCK 409                    │
//! │  CONFLICT            409     DATABASE_ERROR   500 (logged)             │
//! │  INTERNAL            500                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use godown_core::{CoreError, ValidationError};
use godown_db::DbError;

/// API error returned from handlers.
///
/// ## Serialization
/// ```json
/// {
///   "code": "INVALID_STATE",
///   "message": "Order 6f1c... is sold, cannot finalize"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Input validation failed (400)
    ValidationError,

    /// Resource not found (404)
    NotFound,

    /// Order status does not allow the operation (409)
    InvalidState,

    /// Stock cannot cover a line, or a line has no stock row (409)
    InsufficientStock,

    /// A concurrent update won (409)
    Conflict,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::InvalidState | ErrorCode::InsufficientStock | ErrorCode::Conflict => {
                StatusCode::CONFLICT
            }
            ErrorCode::DatabaseError | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let code = match err {
            CoreError::Validation(e) => return ApiError::from(e),
            CoreError::ShopNotFound(_)
            | CoreError::ProductNotFound(_)
            | CoreError::OrderNotFound(_)
            | CoreError::OrderItemNotFound { .. }
            | CoreError::BasketNotFound(_) => ErrorCode::NotFound,
            CoreError::InvalidOrderStatus { .. } => ErrorCode::InvalidState,
            CoreError::InsufficientStock { .. } | CoreError::InventoryMissing(_) => {
                ErrorCode::InsufficientStock
            }
            CoreError::QuantityTooLarge { .. } => ErrorCode::ValidationError,
        };
        ApiError::new(code, err.to_string())
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Domain(e) => ApiError::from(e),
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { .. } => ApiError::validation(err.to_string()),
            DbError::Conflict { .. } => {
                tracing::warn!(error = %err, "Lost a concurrent update");
                ApiError::new(ErrorCode::Conflict, err.to_string())
            }
            other => {
                tracing::error!(error = %other, "Database operation failed");
                ApiError::new(ErrorCode::DatabaseError, format!("Database error: {}", other))
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.code.status(), Json(self)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use godown_core::{OrderAction, OrderStatus};

    #[test]
    fn test_domain_errors_map_to_codes() {
        let err = ApiError::from(DbError::from(CoreError::OrderNotFound("o1".into())));
        assert_eq!(err.code, ErrorCode::NotFound);

        let err = ApiError::from(CoreError::InvalidOrderStatus {
            order_id: "o1".into(),
            current_status: OrderStatus::Sold,
            action: OrderAction::Finalize,
        });
        assert_eq!(err.code, ErrorCode::InvalidState);
        assert_eq!(err.code.status(), StatusCode::CONFLICT);
        assert_eq!(err.message, "Order o1 is sold, cannot finalize");

        let err = ApiError::from(CoreError::InventoryMissing("TEA-500".into()));
        assert_eq!(err.code, ErrorCode::InsufficientStock);
    }

    #[test]
    fn test_validation_keeps_message() {
        let err = ApiError::from(DbError::from(ValidationError::TooShort {
            field: "search term".into(),
            min: 2,
        }));
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.message, "search term needs at least 2 characters");
    }

    #[test]
    fn test_database_error_includes_cause() {
        let err = ApiError::from(DbError::QueryFailed("disk I/O error".into()));
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert_eq!(err.code.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.message.contains("disk I/O error"));
    }

    #[test]
    fn test_conflict() {
        let err = ApiError::from(DbError::conflict("Inventory", "p1"));
        assert_eq!(err.code, ErrorCode::Conflict);
    }
}
