//! # Money Module
//!
//! Provides [`Money`] for monetary values and [`DiscountRate`] for the
//! order-level percentage discount.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │    subtotal × (1 - 12.5/100) in f64 drifts by fractions of a cent,     │
//! │    and the drift differs between the API and the database.             │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents + Basis Points                             │
//! │    subtotal_cents × bps / 10000, rounded half-to-even exactly once     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use godown_core::money::{DiscountRate, Money};
//!
//! let subtotal = Money::from_cents(100_000);
//! let total = subtotal.apply_discount(DiscountRate::from_bps(1000)); // 10% off
//! assert_eq!(total.cents(), 90_000);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

/// Basis points in 100%.
pub const BPS_PER_WHOLE: u32 = 10_000;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents / paise).
///
/// ## Where Money is Used
/// ```text
/// Product.selling_price ──► OrderItem.unit_price (snapshot)
///                                   │
///                                   ▼
///                  OrderItem.total_price = qty × unit_price
///                                   │
///                                   ▼
///              Σ lines ──► apply_discount ──► Order.final_total
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ## Example
    /// ```rust
    /// use godown_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from whole units and cents.
    ///
    /// For negative amounts only the major unit should be negative:
    /// `from_major_minor(-5, 50)` is -5.50.
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the whole-unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the cents portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative.
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies a unit price by a quantity (a line total).
    ///
    /// ## Example
    /// ```rust
    /// use godown_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299);
    /// assert_eq!(unit_price.multiply_quantity(3).cents(), 897);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Amount taken off by a discount, rounded half-to-even to the cent.
    ///
    /// ## Bankers Rounding
    /// ```text
    /// ┌─────────────────────────────────────────────────────────────────────┐
    /// │  Exact half cents go to the nearest EVEN cent:                      │
    /// │    12.5 → 12,  13.5 → 14,  -12.5 → -12                              │
    /// │  Everything else rounds to the nearest cent.                        │
    /// └─────────────────────────────────────────────────────────────────────┘
    /// ```
    ///
    /// ## Example
    /// ```rust
    /// use godown_core::money::{DiscountRate, Money};
    ///
    /// // 1.25 at 10% = 0.125 → 0.12
    /// let off = Money::from_cents(125).discount_amount(DiscountRate::from_bps(1000));
    /// assert_eq!(off.cents(), 12);
    /// ```
    pub fn discount_amount(&self, rate: DiscountRate) -> Money {
        // i128 keeps `cents × bps` from overflowing on large subtotals
        let raw = self.0 as i128 * rate.bps() as i128;
        Money::from_cents(div_round_half_even(raw, BPS_PER_WHOLE as i128) as i64)
    }

    /// Applies a percentage discount and returns what is left to pay.
    pub fn apply_discount(&self, rate: DiscountRate) -> Money {
        *self - self.discount_amount(rate)
    }
}

/// Integer division rounding exact halves to the even neighbour.
///
/// `den` must be positive.
fn div_round_half_even(num: i128, den: i128) -> i128 {
    let quotient = num.div_euclid(den);
    let twice_remainder = num.rem_euclid(den) * 2;

    if twice_remainder > den || (twice_remainder == den && quotient % 2 != 0) {
        quotient + 1
    } else {
        quotient
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Plain decimal rendering (`1234.50`); currency symbols belong to the UI.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Discount Rate
// =============================================================================

/// Order discount in basis points (1 bp = 0.01%).
///
/// ## Why Basis Points?
/// The client sends a percentage such as `12.5`. Storing `1250` keeps two
/// decimal places exactly and lets the total be computed with integers only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DiscountRate(u32);

impl DiscountRate {
    /// Creates a discount from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        DiscountRate(bps)
    }

    /// Converts a percentage to basis points, rounding half-to-even.
    ///
    /// Range checking happens in
    /// [`validate_discount_percent`](crate::validation::validate_discount_percent);
    /// this only converts.
    pub fn from_percentage(pct: f64) -> Self {
        DiscountRate((pct * 100.0).round_ties_even().max(0.0) as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// No discount.
    #[inline]
    pub const fn zero() -> Self {
        DiscountRate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for DiscountRate {
    fn default() -> Self {
        DiscountRate::zero()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.major(), 10);
        assert_eq!(money.minor(), 99);
    }

    #[test]
    fn test_from_major_minor() {
        assert_eq!(Money::from_major_minor(10, 99).cents(), 1099);
        assert_eq!(Money::from_major_minor(-5, 50).cents(), -550);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "10.99");
        assert_eq!(Money::from_cents(500).to_string(), "5.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
        assert_eq!(Money::zero().to_string(), "0.00");
    }

    #[test]
    fn test_arithmetic_and_sum() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);

        let total: Money = vec![a, b, b].into_iter().sum();
        assert_eq!(total.cents(), 2000);
    }

    #[test]
    fn test_ten_percent_of_one_thousand() {
        let subtotal = Money::from_major_minor(1000, 0);
        let total = subtotal.apply_discount(DiscountRate::from_bps(1000));
        assert_eq!(total, Money::from_major_minor(900, 0));
    }

    #[test]
    fn test_discount_rounds_half_to_even() {
        let ten_pct = DiscountRate::from_bps(1000);

        // 12.5 → 12 (even), 13.5 → 14 (even)
        assert_eq!(Money::from_cents(125).discount_amount(ten_pct).cents(), 12);
        assert_eq!(Money::from_cents(135).discount_amount(ten_pct).cents(), 14);

        // Non-halves round to nearest
        assert_eq!(Money::from_cents(126).discount_amount(ten_pct).cents(), 13);
        assert_eq!(Money::from_cents(124).discount_amount(ten_pct).cents(), 12);

        assert_eq!(Money::from_cents(125).apply_discount(ten_pct).cents(), 113);
    }

    #[test]
    fn test_half_even_negative_values() {
        assert_eq!(div_round_half_even(-25, 10), -2);
        assert_eq!(div_round_half_even(-35, 10), -4);
        assert_eq!(div_round_half_even(-26, 10), -3);
    }

    #[test]
    fn test_zero_and_full_discount() {
        let subtotal = Money::from_cents(4321);
        assert_eq!(subtotal.apply_discount(DiscountRate::zero()), subtotal);
        assert_eq!(
            subtotal.apply_discount(DiscountRate::from_bps(BPS_PER_WHOLE)),
            Money::zero()
        );
    }

    #[test]
    fn test_discount_rate_from_percentage() {
        assert_eq!(DiscountRate::from_percentage(10.0).bps(), 1000);
        assert_eq!(DiscountRate::from_percentage(12.5).bps(), 1250);
        assert_eq!(DiscountRate::from_percentage(0.125).bps(), 12);
        assert!((DiscountRate::from_bps(825).percentage() - 8.25).abs() < 1e-9);
    }

    #[test]
    fn test_multiply_quantity() {
        assert_eq!(Money::from_cents(299).multiply_quantity(3).cents(), 897);
    }
}
