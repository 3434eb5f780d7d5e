//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! Floating point cannot represent most decimal amounts exactly, and a
//! running account accumulates postings over years. Every monetary value
//! in the system is therefore an integer number of cents (`i64`), and
//! zero-balance checks are exact integer comparisons.
//!
//! ## Usage
//! ```rust
//! use fiado_core::money::Money;
//!
//! // Create from cents (never from floats - no such constructor exists)
//! let price = Money::from_cents(1500); // $15.00
//!
//! let line_total = price.times(2);     // $30.00
//! assert_eq!(line_total.cents(), 3000);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};

/// A monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: intermediate arithmetic may dip below zero before
///   clamping; the ledger itself never stores a negative amount
/// - **Single-field tuple struct**: zero-cost abstraction over i64
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use fiado_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // $10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (dollars) portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    ///
    /// Account cleanup eligibility is decided with this exact comparison;
    /// balances are sums of exact postings, so no epsilon is involved.
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

    /// Subtracts, flooring the result at zero.
    ///
    /// This is the clamp rule used when a sale charge is reversed: if the
    /// reversal is larger than what is currently owed, the balance lands
    /// on zero instead of going negative.
    ///
    /// ## Example
    /// ```rust
    /// use fiado_core::money::Money;
    ///
    /// let owed = Money::from_cents(500);
    /// assert_eq!(owed.saturating_sub(Money::from_cents(800)), Money::zero());
    /// assert_eq!(owed.saturating_sub(Money::from_cents(200)).cents(), 300);
    /// ```
    #[inline]
    pub const fn saturating_sub(self, other: Self) -> Self {
        let diff = self.0 - other.0;
        if diff < 0 {
            Money(0)
        } else {
            Money(diff)
        }
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use fiado_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(1500);
    /// assert_eq!(unit_price.times(2).cents(), 3000);
    /// ```
    #[inline]
    pub const fn times(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

/// Display implementation shows money in a human-readable format.
///
/// For debugging and receipts. GUI display formatting is a frontend concern.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}${}.{:02}", sign, self.dollars().abs(), self.cents_part())
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

// =============================================================================
// Unit Tests
// =============================================================================
