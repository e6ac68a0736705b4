//! # Stock Waterfall
//!
//! Plans how a sold quantity is taken out of a product's two stock pools.
//!
//! ## Godown First, Then Display
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  need = 8          godown = 5          display = 10                     │
//! │                                                                         │
//! │  1. take min(need, godown) from godown   → 5 taken, godown = 0          │
//! │  2. remainder = 3 spills to display      → 3 taken, display = 7         │
//! │  3. anything display cannot cover goes to the ShortfallPolicy           │
//! │                                                                         │
//! │  Reject         → error, nothing changes                                │
//! │  AllowNegative  → display goes below zero                               │
//! │  Backorder      → display stops at zero, the rest is backordered        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Planning is pure. godown-db applies the returned [`StockDeduction`] inside
//! the finalize transaction.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};

// =============================================================================
// Shortfall Policy
// =============================================================================

/// What to do when godown and display together cannot cover a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ShortfallPolicy {
    /// Fail the whole finalization; stock and status stay as they were.
    Reject,
    /// Let display stock go negative.
    AllowNegative,
    /// Clamp display at zero and record the uncovered quantity.
    Backorder,
}

impl Default for ShortfallPolicy {
    fn default() -> Self {
        ShortfallPolicy::Reject
    }
}

// =============================================================================
// Stock Level
// =============================================================================

/// The two counters of one product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockLevel {
    pub qty_godown: i64,
    pub qty_display: i64,
}

impl StockLevel {
    pub const fn new(qty_godown: i64, qty_display: i64) -> Self {
        StockLevel {
            qty_godown,
            qty_display,
        }
    }

    /// Units that can actually be taken (negative counters count as zero).
    pub fn available(&self) -> i64 {
        self.qty_godown.max(0) + self.qty_display.max(0)
    }

    /// Plans the deduction of `needed` units.
    ///
    /// A negative counter is treated as empty and left as it is; the
    /// deficit is never written back as zero.
    ///
    /// ## Arguments
    /// * `item_code` - used in the insufficient-stock error
    /// * `needed` - units sold, must be positive
    /// * `policy` - shortfall handling
    ///
    /// ## Example
    /// ```rust
    /// use godown_core::stock::{ShortfallPolicy, StockLevel};
    ///
    /// let plan = StockLevel::new(5, 10)
    ///     .deduct("TEA-500", 8, ShortfallPolicy::Reject)
    ///     .unwrap();
    ///
    /// assert_eq!(plan.after, StockLevel::new(0, 7));
    /// assert_eq!(plan.from_godown, 5);
    /// assert_eq!(plan.from_display, 3);
    /// ```
    pub fn deduct(
        &self,
        item_code: &str,
        needed: i64,
        policy: ShortfallPolicy,
    ) -> CoreResult<StockDeduction> {
        if needed <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "quantity".to_string(),
            }
            .into());
        }

        let from_godown = needed.min(self.qty_godown.max(0));
        let remainder = needed - from_godown;
        let display_available = self.qty_display.max(0);

        let (from_display, backordered) = if remainder <= display_available {
            (remainder, 0)
        } else {
            match policy {
                ShortfallPolicy::Reject => {
                    return Err(CoreError::InsufficientStock {
                        item_code: item_code.to_string(),
                        available: self.available(),
                        requested: needed,
                    });
                }
                ShortfallPolicy::AllowNegative => (remainder, 0),
                ShortfallPolicy::Backorder => (display_available, remainder - display_available),
            }
        };

        Ok(StockDeduction {
            from_godown,
            from_display,
            backordered,
            before: *self,
            after: StockLevel::new(
                self.qty_godown - from_godown,
                self.qty_display - from_display,
            ),
        })
    }
}

// =============================================================================
// Stock Deduction
// =============================================================================

/// The outcome of planning one line's deduction.
///
/// `from_godown + from_display + backordered` always equals the quantity
/// sold, and neither counter ever increases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockDeduction {
    pub from_godown: i64,
    pub from_display: i64,
    pub backordered: i64,
    pub before: StockLevel,
    pub after: StockLevel,
}

impl StockDeduction {
    pub fn total(&self) -> i64 {
        self.from_godown + self.from_display + self.backordered
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const POLICIES: [ShortfallPolicy; 3] = [
        ShortfallPolicy::Reject,
        ShortfallPolicy::AllowNegative,
        ShortfallPolicy::Backorder,
    ];

    #[test]
    fn test_godown_covers_need() {
        for policy in POLICIES {
            let plan = StockLevel::new(10, 4).deduct("X", 7, policy).unwrap();
            assert_eq!(plan.after, StockLevel::new(3, 4));
            assert_eq!(plan.from_display, 0);
        }
    }

    #[test]
    fn test_godown_exactly_covers_need() {
        let plan = StockLevel::new(7, 4)
            .deduct("X", 7, ShortfallPolicy::Reject)
            .unwrap();
        assert_eq!(plan.after, StockLevel::new(0, 4));
    }

    #[test]
    fn test_spill_into_display() {
        let plan = StockLevel::new(5, 10)
            .deduct("X", 8, ShortfallPolicy::Reject)
            .unwrap();
        assert_eq!(plan.after, StockLevel::new(0, 7));
        assert_eq!(plan.total(), 8);
    }

    #[test]
    fn test_reject_when_short() {
        let err = StockLevel::new(5, 4)
            .deduct("TEA-500", 12, ShortfallPolicy::Reject)
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock {
                available: 9,
                requested: 12,
                ..
            }
        ));
    }

    #[test]
    fn test_allow_negative_display() {
        let plan = StockLevel::new(5, 4)
            .deduct("X", 12, ShortfallPolicy::AllowNegative)
            .unwrap();
        assert_eq!(plan.after, StockLevel::new(0, -3));
        assert_eq!(plan.from_display, 7);
        assert_eq!(plan.backordered, 0);
    }

    #[test]
    fn test_backorder_clamps_display() {
        let plan = StockLevel::new(5, 4)
            .deduct("X", 12, ShortfallPolicy::Backorder)
            .unwrap();
        assert_eq!(plan.after, StockLevel::new(0, 0));
        assert_eq!(plan.backordered, 3);
        assert_eq!(plan.total(), 12);
    }

    #[test]
    fn test_negative_counters_are_not_drawn_from() {
        let plan = StockLevel::new(-2, 5)
            .deduct("X", 3, ShortfallPolicy::Reject)
            .unwrap();
        assert_eq!(plan.from_godown, 0);
        assert_eq!(plan.after, StockLevel::new(-2, 2));

        // A godown deficit is kept, not reset to zero.
        let plan = StockLevel::new(-2, 10)
            .deduct("X", 3, ShortfallPolicy::Reject)
            .unwrap();
        assert_eq!(plan.from_display, 3);
        assert_eq!(plan.after, StockLevel::new(-2, 7));
    }

    #[test]
    fn test_rejects_non_positive_need() {
        assert!(StockLevel::new(1, 1)
            .deduct("X", 0, ShortfallPolicy::AllowNegative)
            .is_err());
    }

    #[test]
    fn test_counters_never_increase() {
        for godown in -2..6 {
            for display in -2..6 {
                for needed in 1..10 {
                    for policy in POLICIES {
                        let before = StockLevel::new(godown, display);
                        if let Ok(plan) = before.deduct("X", needed, policy) {
                            assert!(plan.after.qty_godown <= godown);
                            assert!(plan.after.qty_display <= display);
                            assert_eq!(plan.total(), needed);
                        }
                    }
                }
            }
        }
    }
}
