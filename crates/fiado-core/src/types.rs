//! # Domain Types
//!
//! Core domain types used throughout Fiado.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                │
//! │                                                                     │
//! │  ┌───────────────┐   ┌───────────────┐   ┌───────────────┐         │
//! │  │    Product    │   │   Customer    │   │    Account    │         │
//! │  │  ───────────  │   │  ───────────  │   │  ───────────  │         │
//! │  │  id (UUID)    │   │  id (UUID)    │   │  customer_id  │         │
//! │  │  stock        │   │  name         │   │  total_debt   │         │
//! │  │  sale_price   │   │  contact      │   │  pending      │         │
//! │  └───────────────┘   └───────────────┘   └───────┬───────┘         │
//! │                                                  │                  │
//! │  ┌───────────────┐   ┌───────────────┐   ┌───────┴───────┐         │
//! │  │     Sale      │──►│   SaleLine    │   │   Movement    │         │
//! │  │  customer_id? │   │  quantity     │   │   Payment     │         │
//! │  │  total        │   │  unit_price   │   │  (audit trail)│         │
//! │  └───────────────┘   └───────────────┘   └───────────────┘         │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A `Sale` without a customer is a cash sale: it moves stock but never
//! touches an account. A `Sale` with a customer posts its total as a
//! charge on that customer's running account.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
///
/// `stock` is mutated only by the sale coordinator, in the same
/// transaction that writes the sale rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name.
    pub name: String,

    /// What the store pays for one unit, in cents.
    pub purchase_price_cents: i64,

    /// What the customer pays for one unit, in cents.
    pub sale_price_cents: i64,

    /// On-hand quantity. Never negative.
    pub stock: i64,

    /// Stock level at or below which the product shows up on the
    /// reorder list.
    pub reorder_level: i64,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the sale price as a Money type.
    #[inline]
    pub fn sale_price(&self) -> Money {
        Money::from_cents(self.sale_price_cents)
    }

    /// Returns the purchase price as a Money type.
    #[inline]
    pub fn purchase_price(&self) -> Money {
        Money::from_cents(self.purchase_price_cents)
    }

    /// Checks if the requested quantity is available.
    #[inline]
    pub fn can_sell(&self, quantity: i64) -> bool {
        quantity > 0 && self.stock >= quantity
    }

    /// Checks if the product has fallen to or below its reorder level.
    #[inline]
    pub fn needs_restock(&self) -> bool {
        self.stock <= self.reorder_level
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A customer. Owns at most one running account (created lazily on the
/// first credit sale).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Customer {
    /// Unique identifier (UUID v4).
    pub id: String,

    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,

    /// Whether customer is active (soft delete).
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Account
// =============================================================================

/// A customer's running account.
///
/// Balances are denormalized running totals kept in lockstep with the
/// movement log inside the same transaction. Invariant:
/// `0 <= pending_balance_cents <= total_debt_cents`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Account {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Owning customer. One account per customer.
    pub customer_id: String,

    /// Cumulative lifetime debits, in cents.
    pub total_debt_cents: i64,

    /// Current amount owed, in cents.
    pub pending_balance_cents: i64,

    /// When a charge, payment, or reversal last touched this account.
    pub last_updated: DateTime<Utc>,

    pub is_active: bool,
}

impl Account {
    /// Returns the cumulative lifetime debt as Money.
    #[inline]
    pub fn total_debt(&self) -> Money {
        Money::from_cents(self.total_debt_cents)
    }

    /// Returns the current amount owed as Money.
    #[inline]
    pub fn pending_balance(&self) -> Money {
        Money::from_cents(self.pending_balance_cents)
    }

    /// True when both balances are exactly zero. Settled accounts are
    /// eligible for cleanup.
    #[inline]
    pub fn is_settled(&self) -> bool {
        self.total_debt_cents == 0 && self.pending_balance_cents == 0
    }
}

/// Balance snapshot returned by the ledger's balance query.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct AccountBalance {
    pub total_debt_cents: i64,
    pub pending_balance_cents: i64,
    pub last_updated: DateTime<Utc>,
}

/// Dashboard row: a customer with money still owed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct AccountSummary {
    pub customer_id: String,
    pub customer_name: String,
    pub pending_balance_cents: i64,
    pub last_updated: DateTime<Utc>,
}

// =============================================================================
// Movements
// =============================================================================

/// The kind of a ledger movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    /// A debit: the customer owes more.
    Charge,
    /// A credit: the customer paid something back.
    Payment,
}

/// An immutable ledger entry.
///
/// Movements are append-only; the single exception is a full sale
/// reversal, which deletes the movement rows tied to the reversed sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Movement {
    /// Unique identifier (UUID v4).
    pub id: String,

    pub customer_id: String,
    pub kind: MovementKind,

    /// Always positive; the kind carries the direction.
    pub amount_cents: i64,

    pub description: String,

    /// Present on charges produced by a sale; used to undo exactly those
    /// entries when the sale is deleted.
    pub sale_id: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl Movement {
    /// Returns the movement amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Payments
// =============================================================================

/// How a payment was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Transfer,
    Check,
    Card,
}

/// A payment (abono) against a customer's pending balance.
///
/// Integer primary key: the receipt sequence is derived from
/// `MAX(id) + 1`, unlike the UUID keys used elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Payment {
    pub id: i64,
    pub customer_id: String,
    pub amount_cents: i64,
    pub method: PaymentMethod,
    pub description: Option<String>,

    /// Human-readable receipt identifier, e.g. `ABO-20260806-0001`.
    pub receipt_number: String,

    pub created_at: DateTime<Utc>,
}

impl Payment {
    /// Returns the payment amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Sales
// =============================================================================

/// A completed sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// None for a cash sale; Some posts the total to this customer's
    /// account.
    pub customer_id: Option<String>,

    /// Sum of line subtotals, in cents.
    pub total_cents: i64,

    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Sale {
    /// Returns the sale total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// True when this sale was made on credit.
    #[inline]
    pub fn is_credit(&self) -> bool {
        self.customer_id.is_some()
    }
}

/// One line of a sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleLine {
    /// Unique identifier (UUID v4).
    pub id: String,

    pub sale_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub unit_price_cents: i64,

    /// quantity × unit_price, stored so history survives price edits.
    pub subtotal_cents: i64,
}

impl SaleLine {
    /// Returns the line subtotal as Money.
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }
}

/// Input for one line of a sale to be created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSaleLine {
    pub product_id: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
}

impl NewSaleLine {
    /// Computes the line subtotal in cents.
    #[inline]
    pub fn subtotal_cents(&self) -> i64 {
        self.quantity * self.unit_price_cents
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(stock: i64, reorder_level: i64) -> Product {
        let now = Utc::now();
        Product {
            id: "p1".to_string(),
            name: "Rice 1kg".to_string(),
            purchase_price_cents: 800,
            sale_price_cents: 1200,
            stock,
            reorder_level,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_can_sell() {
        let p = product(5, 2);
        assert!(p.can_sell(1));
        assert!(p.can_sell(5));
        assert!(!p.can_sell(6));
        assert!(!p.can_sell(0));
        assert!(!p.can_sell(-3));
    }

    #[test]
    fn test_needs_restock() {
        assert!(product(2, 2).needs_restock());
        assert!(product(0, 2).needs_restock());
        assert!(!product(3, 2).needs_restock());
    }

    #[test]
    fn test_account_is_settled() {
        let account = Account {
            id: "a1".to_string(),
            customer_id: "c1".to_string(),
            total_debt_cents: 0,
            pending_balance_cents: 0,
            last_updated: Utc::now(),
            is_active: true,
        };
        assert!(account.is_settled());

        // Fully paid but with lifetime debt is not settled
        let paid_off = Account {
            total_debt_cents: 3000,
            ..account
        };
        assert!(!paid_off.is_settled());
    }

    #[test]
    fn test_enum_wire_format() {
        // The GUI boundary sees the same lowercase tokens the database
        // stores
        assert_eq!(
            serde_json::to_string(&MovementKind::Charge).unwrap(),
            "\"charge\""
        );
        assert_eq!(
            serde_json::to_string(&PaymentMethod::Transfer).unwrap(),
            "\"transfer\""
        );

        let method: PaymentMethod = serde_json::from_str("\"cash\"").unwrap();
        assert_eq!(method, PaymentMethod::Cash);
    }

    #[test]
    fn test_new_sale_line_subtotal() {
        let line = NewSaleLine {
            product_id: "p1".to_string(),
            quantity: 2,
            unit_price_cents: 1500,
        };
        assert_eq!(line.subtotal_cents(), 3000);
    }
}
