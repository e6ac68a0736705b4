//! # Order Rules
//!
//! Status transitions, line-quantity arithmetic and order totals.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   create ──► ┌────────┐  convert-to-pi  ┌──────┐   finalize  ┌──────┐  │
//! │              │ bucket │ ──────────────► │  pi  │ ──────────► │ sold │  │
//! │              └───┬────┘                 └──────┘             └──────┘  │
//! │                  │         finalize                             ▲      │
//! │                  ├──────────────────────────────────────────────┘      │
//! │                  │                                                      │
//! │                  └──► delete (bucket only)                              │
//! │                                                                         │
//! │   Item edits (add / update-qty / remove): bucket, pi                   │
//! │   Nothing moves backwards. sold is terminal.                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, CoreResult};
use crate::money::{DiscountRate, Money};
use crate::types::OrderStatus;
use crate::MAX_ITEM_QUANTITY;

// =============================================================================
// Actions
// =============================================================================

/// Something a caller wants to do to an existing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderAction {
    /// Add, re-quantify or remove a line.
    EditItems,
    ConvertToPi,
    Finalize,
    Delete,
}

impl fmt::Display for OrderAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderAction::EditItems => "edit items",
            OrderAction::ConvertToPi => "convert to pi",
            OrderAction::Finalize => "finalize",
            OrderAction::Delete => "delete",
        };
        f.write_str(s)
    }
}

// =============================================================================
// Transitions
// =============================================================================

impl OrderStatus {
    /// Whether `action` may run while the order is in this status.
    pub const fn permits(&self, action: OrderAction) -> bool {
        match action {
            OrderAction::EditItems | OrderAction::Finalize => {
                matches!(self, OrderStatus::Bucket | OrderStatus::Pi)
            }
            OrderAction::ConvertToPi | OrderAction::Delete => {
                matches!(self, OrderStatus::Bucket)
            }
        }
    }

    /// Status after `action` succeeds. `None` means the order is gone.
    pub const fn after(&self, action: OrderAction) -> Option<OrderStatus> {
        match action {
            OrderAction::EditItems => Some(*self),
            OrderAction::ConvertToPi => Some(OrderStatus::Pi),
            OrderAction::Finalize => Some(OrderStatus::Sold),
            OrderAction::Delete => None,
        }
    }
}

/// Rejects `action` unless `status` permits it.
///
/// ## Example
/// ```rust
/// use godown_core::order::{ensure_permitted, OrderAction};
/// use godown_core::OrderStatus;
///
/// assert!(ensure_permitted("o-1", OrderStatus::Bucket, OrderAction::Delete).is_ok());
/// assert!(ensure_permitted("o-1", OrderStatus::Pi, OrderAction::Delete).is_err());
/// ```
pub fn ensure_permitted(order_id: &str, status: OrderStatus, action: OrderAction) -> CoreResult<()> {
    if status.permits(action) {
        Ok(())
    } else {
        Err(CoreError::InvalidOrderStatus {
            order_id: order_id.to_string(),
            current_status: status,
            action,
        })
    }
}

// =============================================================================
// Line Quantities
// =============================================================================

/// Quantity of a line after adding `qty` more of the same product.
///
/// Re-adding a product never creates a second line; it grows the existing one.
pub fn merged_quantity(existing: i64, qty: i64) -> CoreResult<i64> {
    let merged = existing + qty;
    if merged > MAX_ITEM_QUANTITY {
        return Err(CoreError::QuantityTooLarge {
            requested: merged,
            max: MAX_ITEM_QUANTITY,
        });
    }
    Ok(merged)
}

/// Applies a signed quantity change to a line.
///
/// ## Returns
/// * `Ok(Some(qty))` - the line's new quantity
/// * `Ok(None)` - the line drops to zero or below and must be removed
pub fn apply_quantity_change(current: i64, change: i64) -> CoreResult<Option<i64>> {
    let next = current + change;
    if next <= 0 {
        return Ok(None);
    }
    if next > MAX_ITEM_QUANTITY {
        return Err(CoreError::QuantityTooLarge {
            requested: next,
            max: MAX_ITEM_QUANTITY,
        });
    }
    Ok(Some(next))
}

// =============================================================================
// Totals
// =============================================================================

/// Totals of an order as persisted on the order row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    /// Σ quantity × unit_price over all lines.
    pub subtotal: Money,
    pub discount: DiscountRate,
    /// subtotal minus the discount amount (rounded half-to-even).
    pub final_total: Money,
}

impl OrderTotals {
    /// Totals for an already-summed subtotal.
    pub fn new(subtotal: Money, discount: DiscountRate) -> Self {
        OrderTotals {
            subtotal,
            discount,
            final_total: subtotal.apply_discount(discount),
        }
    }

    /// Totals from individual line totals. No lines means zero.
    pub fn from_lines(lines: impl IntoIterator<Item = Money>, discount: DiscountRate) -> Self {
        OrderTotals::new(lines.into_iter().sum(), discount)
    }

    pub fn discount_amount(&self) -> Money {
        self.subtotal - self.final_total
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_ACTIONS: [OrderAction; 4] = [
        OrderAction::EditItems,
        OrderAction::ConvertToPi,
        OrderAction::Finalize,
        OrderAction::Delete,
    ];

    #[test]
    fn test_bucket_permits_everything() {
        for action in ALL_ACTIONS {
            assert!(OrderStatus::Bucket.permits(action), "{action}");
        }
    }

    #[test]
    fn test_pi_permits_edits_and_finalize_only() {
        assert!(OrderStatus::Pi.permits(OrderAction::EditItems));
        assert!(OrderStatus::Pi.permits(OrderAction::Finalize));
        assert!(!OrderStatus::Pi.permits(OrderAction::ConvertToPi));
        assert!(!OrderStatus::Pi.permits(OrderAction::Delete));
    }

    #[test]
    fn test_sold_is_terminal() {
        for action in ALL_ACTIONS {
            assert!(!OrderStatus::Sold.permits(action), "{action}");
        }
    }

    #[test]
    fn test_transitions_never_go_backwards() {
        let rank = |s: OrderStatus| match s {
            OrderStatus::Bucket => 0,
            OrderStatus::Pi => 1,
            OrderStatus::Sold => 2,
        };
        for status in [OrderStatus::Bucket, OrderStatus::Pi, OrderStatus::Sold] {
            for action in ALL_ACTIONS {
                if let (true, Some(next)) = (status.permits(action), status.after(action)) {
                    assert!(rank(next) >= rank(status));
                }
            }
        }
    }

    #[test]
    fn test_ensure_permitted_error() {
        let err = ensure_permitted("o-9", OrderStatus::Sold, OrderAction::Finalize).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidOrderStatus {
                current_status: OrderStatus::Sold,
                action: OrderAction::Finalize,
                ..
            }
        ));
    }

    #[test]
    fn test_merged_quantity() {
        assert_eq!(merged_quantity(2, 3).unwrap(), 5);
        assert!(matches!(
            merged_quantity(998, 2),
            Err(CoreError::QuantityTooLarge { requested: 1000, .. })
        ));
    }

    #[test]
    fn test_quantity_change_to_zero_removes_line() {
        assert_eq!(apply_quantity_change(3, -1).unwrap(), Some(2));
        assert_eq!(apply_quantity_change(3, -3).unwrap(), None);
        assert_eq!(apply_quantity_change(3, -10).unwrap(), None);
        assert_eq!(apply_quantity_change(3, 4).unwrap(), Some(7));
        assert!(apply_quantity_change(990, 10).is_err());
    }

    #[test]
    fn test_totals_from_lines() {
        let totals = OrderTotals::from_lines(
            [Money::from_cents(30_000), Money::from_cents(70_000)],
            DiscountRate::from_bps(1000),
        );
        assert_eq!(totals.subtotal.cents(), 100_000);
        assert_eq!(totals.final_total.cents(), 90_000);
        assert_eq!(totals.discount_amount().cents(), 10_000);
    }

    #[test]
    fn test_totals_without_lines_is_zero() {
        let totals = OrderTotals::from_lines(Vec::<Money>::new(), DiscountRate::from_bps(2500));
        assert!(totals.subtotal.is_zero());
        assert!(totals.final_total.is_zero());
    }
}
