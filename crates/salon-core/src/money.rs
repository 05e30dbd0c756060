//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │    60000 × 0.025 = 1500.0000000000002  ❌                               │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units + basis-point rates                  │
//! │    6_000_000 kop × 250 bps / 10000 = 150_000 kop (exactly 1500.00)      │
//! │                                                                         │
//! │  Discount accounting closes exactly:                                    │
//! │    final_cost + Σ discounts == base_cost                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use salon_core::money::Money;
//! use salon_core::types::Rate;
//!
//! let base = Money::from_major(60_000);
//! let bulk = base.percentage(Rate::from_bps(250)); // 2.5%
//! assert_eq!(bulk, Money::from_major(1_500));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};
use ts_rs::TS;

use crate::types::Rate;
use crate::CURRENCY_SYMBOL;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (kopecks).
///
/// ## Design Decisions
/// - **i64 (signed)**: a monthly payment may legitimately go negative when the
///   caller over-pays the down payment, so the type must carry a sign
/// - **Single field tuple struct**: zero-cost abstraction over i64
///
/// ## Where Money is Used
/// ```text
/// ServiceSelection.unit_price × quantity × procedure_count ──► base_cost
///
/// base_cost ──► discounts ──► final_cost ──► down payment + monthly payment
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units (kopecks).
    ///
    /// ## Example
    /// ```rust
    /// use salon_core::money::Money;
    ///
    /// let price = Money::from_minor(300_050); // 3000.50
    /// assert_eq!(price.minor(), 300_050);
    /// ```
    #[inline]
    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    /// Creates a Money value from whole currency units.
    ///
    /// Prices in the salon price list are whole roubles, so this is the
    /// constructor used by seed data and tests.
    #[inline]
    pub const fn from_major(major: i64) -> Self {
        Money(major * 100)
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn minor(&self) -> i64 {
        self.0
    }

    /// Returns the whole-unit portion (truncated toward zero).
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor-unit portion (always 0-99).
    #[inline]
    pub const fn minor_part(&self) -> i64 {
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

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Floors the value at zero.
    #[inline]
    pub fn non_negative(self) -> Self {
        self.max(Money::zero())
    }

    /// `self + other`, or `None` on overflow.
    #[inline]
    pub const fn checked_add(self, other: Money) -> Option<Money> {
        match self.0.checked_add(other.0) {
            Some(sum) => Some(Money(sum)),
            None => None,
        }
    }

    /// `self × qty`, or `None` on overflow.
    ///
    /// ## Example
    /// ```rust
    /// use salon_core::money::Money;
    ///
    /// let unit_price = Money::from_major(3_000);
    /// assert_eq!(unit_price.checked_mul(20), Some(Money::from_major(60_000)));
    /// assert_eq!(Money::from_minor(i64::MAX).checked_mul(2), None);
    /// ```
    #[inline]
    pub const fn checked_mul(self, qty: u32) -> Option<Money> {
        match self.0.checked_mul(qty as i64) {
            Some(product) => Some(Money(product)),
            None => None,
        }
    }

    /// Returns `rate` of this amount, rounded half away from zero.
    ///
    /// ## Implementation
    /// Integer math in i128: `amount × bps / 10000`, rounded.
    ///
    /// ## Example
    /// ```rust
    /// use salon_core::money::Money;
    /// use salon_core::types::Rate;
    ///
    /// let base = Money::from_major(60_000);
    /// assert_eq!(base.percentage(Rate::from_bps(2_500)), Money::from_major(15_000));
    /// ```
    pub fn percentage(&self, rate: Rate) -> Money {
        Money::from_minor(div_round(
            self.0 as i128 * rate.bps() as i128,
            Rate::SCALE as i128,
        ) as i64)
    }

    /// Returns `self × numerator / denominator`, rounded half away from zero,
    /// or `None` when the result does not fit.
    ///
    /// A zero denominator yields zero instead of panicking; the pricing
    /// engine relies on this for empty selections.
    pub fn checked_mul_div(&self, numerator: i64, denominator: i64) -> Option<Money> {
        if denominator == 0 {
            return Some(Money::zero());
        }
        let (num, den) = if denominator < 0 {
            (-(self.0 as i128 * numerator as i128), -(denominator as i128))
        } else {
            (self.0 as i128 * numerator as i128, denominator as i128)
        };
        i64::try_from(div_round(num, den)).ok().map(Money)
    }

    /// Splits the amount into `parts` equal payments (rounded).
    ///
    /// ## Example
    /// ```rust
    /// use salon_core::money::Money;
    ///
    /// let remaining = Money::from_major(30_000);
    /// assert_eq!(remaining.split(6), Money::from_major(5_000));
    /// assert_eq!(remaining.split(0), Money::zero());
    /// ```
    #[inline]
    pub fn split(&self, parts: u32) -> Money {
        if parts == 0 {
            return Money::zero();
        }
        // |self / parts| <= |self|
        Money(div_round(self.0 as i128, parts as i128) as i64)
    }
}

/// Integer division rounding half away from zero. `den` must be positive.
fn div_round(num: i128, den: i128) -> i128 {
    debug_assert!(den > 0);
    let half = den / 2;
    if num >= 0 {
        (num + half) / den
    } else {
        (num - half) / den
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows money as `60000.00 ₽`.
///
/// ## Note
/// Used in human-readable messages (unavailability reasons, logs).
/// The presentation layer does its own localized formatting.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}{}.{:02} {}",
            sign,
            self.major().abs(),
            self.minor_part(),
            CURRENCY_SYMBOL
        )
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

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
