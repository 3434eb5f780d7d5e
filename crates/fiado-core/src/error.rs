//! # Error Types
//!
//! Domain-specific error types for fiado-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                          Error Types                                │
//! │                                                                     │
//! │  fiado-core errors (this file)                                     │
//! │  └── CoreError        - Business rule violations                   │
//! │      └── LineIssue    - Per-line sale validation findings          │
//! │                                                                     │
//! │  fiado-db errors (separate crate)                                  │
//! │  ├── DbError          - Store/infrastructure failures              │
//! │  └── LedgerError      - Domain | Store, per compound operation     │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (amounts, ids, line numbers)
//! 3. Errors are enum variants, never String
//! 4. Domain errors are expected outcomes; they are returned, not logged

use std::fmt;
use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations. They are detected
/// before any mutation, so a `CoreError` never leaves partial state
/// behind.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A monetary amount that must be positive was zero or negative.
    #[error("Invalid amount: {amount_cents} cents (must be positive)")]
    InvalidAmount { amount_cents: i64 },

    /// The customer has no running account.
    ///
    /// Raised by payment registration only: paying into a debt that does
    /// not exist is a caller error, while charging lazily creates the
    /// account.
    #[error("No account found for customer: {0}")]
    AccountNotFound(String),

    /// Payment larger than the pending balance.
    ///
    /// Payments may never create a credit balance in the customer's
    /// favor.
    #[error(
        "Payment of {requested_cents} cents exceeds pending balance of {pending_cents} cents"
    )]
    AmountExceedsBalance {
        requested_cents: i64,
        pending_cents: i64,
    },

    /// A sale must contain at least one line.
    #[error("Sale has no lines")]
    EmptySale,

    /// Sale has exceeded the maximum allowed number of lines.
    #[error("Sale cannot have more than {max} lines")]
    SaleTooLarge { max: usize },

    /// One or more sale lines failed validation.
    ///
    /// Carries every failing line with its reason so the caller can
    /// report them all at once, never a single generic message.
    #[error("Sale validation failed: {}", format_issues(.issues))]
    InvalidSale { issues: Vec<LineIssue> },

    /// Product cannot be found (or is inactive).
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Customer cannot be found (or is inactive).
    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    /// Sale not found.
    #[error("Sale not found: {0}")]
    SaleNotFound(String),
}

impl CoreError {
    /// True when any line of an `InvalidSale` failed for the given kind
    /// of issue. Convenience for callers that branch on stock problems.
    pub fn has_line_issue(&self, predicate: impl Fn(&LineIssueKind) -> bool) -> bool {
        match self {
            CoreError::InvalidSale { issues } => issues.iter().any(|i| predicate(&i.kind)),
            _ => false,
        }
    }
}

fn format_issues(issues: &[LineIssue]) -> String {
    issues
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

// =============================================================================
// Per-Line Validation Issues
// =============================================================================

/// A validation finding on one line of a sale request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIssue {
    /// Zero-based index of the offending line in the request.
    pub line: usize,
    pub kind: LineIssueKind,
}

impl fmt::Display for LineIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.kind)
    }
}

/// What is wrong with a sale line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineIssueKind {
    /// The referenced product does not exist.
    #[error("product {product_id} not found")]
    ProductNotFound { product_id: String },

    /// The referenced product has been deactivated.
    #[error("product {product_id} is inactive")]
    ProductInactive { product_id: String },

    /// Quantity must be positive.
    #[error("quantity {quantity} is not positive")]
    InvalidQuantity { quantity: i64 },

    /// Unit price must be positive.
    #[error("unit price {unit_price_cents} cents is not positive")]
    InvalidUnitPrice { unit_price_cents: i64 },

    /// Requested quantity exceeds on-hand stock.
    #[error("insufficient stock: available {available}, requested {requested}")]
    InsufficientStock { available: i64, requested: i64 },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::AmountExceedsBalance {
            requested_cents: 3001,
            pending_cents: 3000,
        };
        assert_eq!(
            err.to_string(),
            "Payment of 3001 cents exceeds pending balance of 3000 cents"
        );

        let err = CoreError::InvalidAmount { amount_cents: -5 };
        assert_eq!(err.to_string(), "Invalid amount: -5 cents (must be positive)");
    }

    #[test]
    fn test_invalid_sale_lists_every_line() {
        let err = CoreError::InvalidSale {
            issues: vec![
                LineIssue {
                    line: 0,
                    kind: LineIssueKind::InvalidQuantity { quantity: 0 },
                },
                LineIssue {
                    line: 2,
                    kind: LineIssueKind::InsufficientStock {
                        available: 5,
                        requested: 9999,
                    },
                },
            ],
        };

        let msg = err.to_string();
        assert!(msg.contains("line 0: quantity 0 is not positive"));
        assert!(msg.contains("line 2: insufficient stock: available 5, requested 9999"));
    }

    #[test]
    fn test_has_line_issue() {
        let err = CoreError::InvalidSale {
            issues: vec![LineIssue {
                line: 0,
                kind: LineIssueKind::InsufficientStock {
                    available: 5,
                    requested: 9999,
                },
            }],
        };

        assert!(err.has_line_issue(|k| matches!(k, LineIssueKind::InsufficientStock { .. })));
        assert!(!err.has_line_issue(|k| matches!(k, LineIssueKind::ProductNotFound { .. })));

        let other = CoreError::EmptySale;
        assert!(!other.has_line_issue(|_| true));
    }
}
