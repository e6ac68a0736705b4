//! # Validation Module
//!
//! Input validation for the shop API.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP extractors (axum)                                       │
//! │  └── Type validation (JSON / query deserialization)                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  └── Business rule validation (lengths, ranges, formats)               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (quantity > 0), CHECK (status IN ...)                       │
//! │  ├── UNIQUE (order_id, product_id)                                     │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::money::{DiscountRate, BPS_PER_WHOLE};
use crate::{MAX_ITEM_QUANTITY, MIN_SEARCH_TERM_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a shop search term.
///
/// ## Rules
/// - Trimmed length must be at least 2 characters
/// - Maximum 100 characters
///
/// ## Returns
/// The trimmed term.
///
/// ## Example
/// ```rust
/// use godown_core::validation::validate_search_term;
///
/// assert_eq!(validate_search_term("  ab ").unwrap(), "ab");
/// assert!(validate_search_term(" a ").is_err());
/// ```
pub fn validate_search_term(term: &str) -> ValidationResult<String> {
    let term = term.trim();

    if term.chars().count() < MIN_SEARCH_TERM_LEN {
        return Err(ValidationError::TooShort {
            field: "search term".to_string(),
            min: MIN_SEARCH_TERM_LEN,
        });
    }

    if term.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "search term".to_string(),
            max: 100,
        });
    }

    Ok(term.to_string())
}

/// Validates a client name for a new basket. Returns the trimmed name.
pub fn validate_client_name(name: &str) -> ValidationResult<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "client_name".to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "client_name".to_string(),
            max: 200,
        });
    }

    Ok(name.to_string())
}

/// Validates an item code (the product's tag code). Returns it trimmed.
pub fn validate_item_code(code: &str) -> ValidationResult<String> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "item_code".to_string(),
        });
    }

    if code.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "item_code".to_string(),
            max: 50,
        });
    }

    Ok(code.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity being added to an order.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a signed quantity change (`+1`, `-1`, ...).
///
/// Zero is rejected: it would be a write that changes nothing.
pub fn validate_quantity_change(change: i64) -> ValidationResult<()> {
    if change == 0 || change.abs() > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "change".to_string(),
            min: -MAX_ITEM_QUANTITY,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a discount percentage and converts it to a [`DiscountRate`].
///
/// ## Rules
/// - Must be a finite number
/// - Must be between 0 and 100 (inclusive)
///
/// ## Example
/// ```rust
/// use godown_core::validation::validate_discount_percent;
///
/// assert_eq!(validate_discount_percent(12.5).unwrap().bps(), 1250);
/// assert!(validate_discount_percent(-1.0).is_err());
/// assert!(validate_discount_percent(100.5).is_err());
/// ```
pub fn validate_discount_percent(pct: f64) -> ValidationResult<DiscountRate> {
    if !pct.is_finite() {
        return Err(ValidationError::InvalidFormat {
            field: "discount_percent".to_string(),
            reason: "must be a finite number".to_string(),
        });
    }

    let rate = DiscountRate::from_percentage(pct);
    if pct < 0.0 || rate.bps() > BPS_PER_WHOLE {
        return Err(ValidationError::OutOfRange {
            field: "discount_percent".to_string(),
            min: 0,
            max: 100,
        });
    }

    Ok(rate)
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string.
///
/// ## Arguments
/// * `field` - name used in the error (`order_id`, `product_id`, ...)
/// * `id` - the value to check
///
/// ## Example
/// ```rust
/// use godown_core::validation::validate_uuid;
///
/// assert!(validate_uuid("order_id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("order_id", "not-a-uuid").is_err());
/// ```
pub fn validate_uuid(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
