//! # Validation Module
//!
//! Business rule validation for sale requests and monetary amounts.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                              │
//! │                                                                     │
//! │  Layer 1: THIS MODULE - pure business rule validation              │
//! │  ├── runs before any row is written                                │
//! │  └── reports every failing sale line, not just the first          │
//! │           │                                                         │
//! │           ▼                                                         │
//! │  Layer 2: Database (SQLite)                                        │
//! │  ├── CHECK (stock >= 0), CHECK (amount_cents > 0)                  │
//! │  └── UNIQUE / foreign key constraints                              │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use crate::error::{CoreError, CoreResult, LineIssue, LineIssueKind};
use crate::types::{NewSaleLine, Product};
use crate::MAX_SALE_LINES;

/// Validates a monetary amount that must be strictly positive.
///
/// ## Example
/// ```rust
/// use fiado_core::validation::validate_amount_cents;
///
/// assert!(validate_amount_cents(1500).is_ok());
/// assert!(validate_amount_cents(0).is_err());
/// assert!(validate_amount_cents(-100).is_err());
/// ```
pub fn validate_amount_cents(amount_cents: i64) -> CoreResult<()> {
    if amount_cents <= 0 {
        return Err(CoreError::InvalidAmount { amount_cents });
    }
    Ok(())
}

/// Validates the lines of a sale request against the products they
/// reference, collecting one issue per failing line.
///
/// `products` maps product id to the product row as read at the start of
/// the sale transaction. A missing entry means the product does not
/// exist.
///
/// Returns an empty vector when every line is sellable.
pub fn validate_sale_lines(
    lines: &[NewSaleLine],
    products: &HashMap<String, Product>,
) -> Vec<LineIssue> {
    let mut issues = Vec::new();

    for (index, line) in lines.iter().enumerate() {
        let kind = match products.get(&line.product_id) {
            None => Some(LineIssueKind::ProductNotFound {
                product_id: line.product_id.clone(),
            }),
            Some(product) if !product.is_active => Some(LineIssueKind::ProductInactive {
                product_id: line.product_id.clone(),
            }),
            Some(product) => {
                if line.quantity <= 0 {
                    Some(LineIssueKind::InvalidQuantity {
                        quantity: line.quantity,
                    })
                } else if line.unit_price_cents <= 0 {
                    Some(LineIssueKind::InvalidUnitPrice {
                        unit_price_cents: line.unit_price_cents,
                    })
                } else if product.stock < line.quantity {
                    Some(LineIssueKind::InsufficientStock {
                        available: product.stock,
                        requested: line.quantity,
                    })
                } else {
                    None
                }
            }
        };

        if let Some(kind) = kind {
            issues.push(LineIssue { line: index, kind });
        }
    }

    issues
}

/// Validates a whole sale request and computes its total.
///
/// ## Rules
/// - At least one line, at most [`MAX_SALE_LINES`]
/// - Every line passes [`validate_sale_lines`]
///
/// ## Returns
/// The sale total in cents (sum of line subtotals).
pub fn validate_sale(
    lines: &[NewSaleLine],
    products: &HashMap<String, Product>,
) -> CoreResult<i64> {
    if lines.is_empty() {
        return Err(CoreError::EmptySale);
    }

    if lines.len() > MAX_SALE_LINES {
        return Err(CoreError::SaleTooLarge {
            max: MAX_SALE_LINES,
        });
    }

    let issues = validate_sale_lines(lines, products);
    if !issues.is_empty() {
        return Err(CoreError::InvalidSale { issues });
    }

    Ok(lines.iter().map(NewSaleLine::subtotal_cents).sum())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn product(id: &str, stock: i64) -> Product {
        let now = Utc::now();
        Product {
            id: id.to_string(),
            name: format!("Product {id}"),
            purchase_price_cents: 700,
            sale_price_cents: 1000,
            stock,
            reorder_level: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn catalog(products: Vec<Product>) -> HashMap<String, Product> {
        products.into_iter().map(|p| (p.id.clone(), p)).collect()
    }

    fn line(product_id: &str, quantity: i64, unit_price_cents: i64) -> NewSaleLine {
        NewSaleLine {
            product_id: product_id.to_string(),
            quantity,
            unit_price_cents,
        }
    }

    #[test]
    fn test_validate_amount_cents() {
        assert!(validate_amount_cents(1).is_ok());
        assert!(validate_amount_cents(100_000).is_ok());
        assert!(matches!(
            validate_amount_cents(0),
            Err(CoreError::InvalidAmount { amount_cents: 0 })
        ));
        assert!(validate_amount_cents(-1500).is_err());
    }

    #[test]
    fn test_valid_sale_computes_total() {
        let products = catalog(vec![product("p1", 10), product("p2", 3)]);
        let lines = vec![line("p1", 2, 1500), line("p2", 1, 800)];

        assert_eq!(validate_sale(&lines, &products).unwrap(), 3800);
    }

    #[test]
    fn test_empty_sale_rejected() {
        let products = catalog(vec![]);
        assert!(matches!(
            validate_sale(&[], &products),
            Err(CoreError::EmptySale)
        ));
    }

    #[test]
    fn test_issues_reported_per_line() {
        let products = catalog(vec![product("p1", 5)]);
        let lines = vec![
            line("p1", 2, 1500),   // fine
            line("ghost", 1, 100), // unknown product
            line("p1", 0, 100),    // bad quantity
            line("p1", 1, 0),      // bad price
            line("p1", 9, 100),    // more than stock
        ];

        let issues = validate_sale_lines(&lines, &products);
        assert_eq!(issues.len(), 4);

        assert_eq!(issues[0].line, 1);
        assert!(matches!(
            issues[0].kind,
            LineIssueKind::ProductNotFound { .. }
        ));

        assert_eq!(issues[1].line, 2);
        assert!(matches!(
            issues[1].kind,
            LineIssueKind::InvalidQuantity { quantity: 0 }
        ));

        assert_eq!(issues[2].line, 3);
        assert!(matches!(
            issues[2].kind,
            LineIssueKind::InvalidUnitPrice { .. }
        ));

        assert_eq!(issues[3].line, 4);
        assert!(matches!(
            issues[3].kind,
            LineIssueKind::InsufficientStock {
                available: 5,
                requested: 9
            }
        ));
    }

    #[test]
    fn test_inactive_product_rejected() {
        let mut p = product("p1", 5);
        p.is_active = false;
        let products = catalog(vec![p]);

        let issues = validate_sale_lines(&[line("p1", 1, 100)], &products);
        assert_eq!(issues.len(), 1);
        assert!(matches!(
            issues[0].kind,
            LineIssueKind::ProductInactive { .. }
        ));
    }

    #[test]
    fn test_stock_boundary() {
        let products = catalog(vec![product("p1", 5)]);

        // Exactly the stock is sellable
        assert!(validate_sale_lines(&[line("p1", 5, 100)], &products).is_empty());
        // One more is not
        assert_eq!(
            validate_sale_lines(&[line("p1", 6, 100)], &products).len(),
            1
        );
    }

    #[test]
    fn test_too_many_lines_rejected() {
        let products = catalog(vec![product("p1", i64::MAX)]);
        let lines: Vec<NewSaleLine> = (0..=MAX_SALE_LINES).map(|_| line("p1", 1, 100)).collect();

        assert!(matches!(
            validate_sale(&lines, &products),
            Err(CoreError::SaleTooLarge { .. })
        ));
    }
}
