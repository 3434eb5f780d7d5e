//! # Sale Coordinator
//!
//! The only path that creates or destroys a sale, and the only caller
//! allowed to mutate stock in tandem with the account ledger.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                        Sale Lifecycle                               │
//! │                                                                     │
//! │  create_sale(customer?, lines, notes)     ── ONE TRANSACTION ──    │
//! │     ├── validate every line (reported per line)                    │
//! │     ├── insert sale + sale_lines                                   │
//! │     ├── stock -= quantity per line (guarded)                       │
//! │     └── customer present? ensure account + charge(total, sale_id)  │
//! │                                                                     │
//! │  delete_sale(sale_id)                     ── ONE TRANSACTION ──    │
//! │     ├── stock += quantity per line                                 │
//! │     ├── customer present? reverse charge (zero-floored),           │
//! │     │                     delete the sale's movements              │
//! │     └── delete sale_lines + sale                                   │
//! │                                                                     │
//! │  A partial reversal (stock restored, ledger not) cannot exist:     │
//! │  both live or die with the same commit.                            │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Callers that want a settled account removed after a reversal invoke
//! `AccountRepository::cleanup_if_empty` afterwards; the coordinator
//! never deletes accounts on its own.

use std::collections::HashMap;

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, LedgerResult};
use crate::repository::account::reverse_sale_charge_tx;
use crate::repository::{account, product};
use fiado_core::validation::validate_sale;
use fiado_core::{CoreError, LineIssue, LineIssueKind, Money, NewSaleLine, Product, Sale, SaleLine};

const SALE_COLUMNS: &str = "id, customer_id, total_cents, notes, created_at";

const SALE_LINE_COLUMNS: &str =
    "id, sale_id, product_id, quantity, unit_price_cents, subtotal_cents";

/// Repository for sale operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Creates a sale: rows, stock decrement, and - for a credit sale -
    /// the account charge, all in one transaction.
    ///
    /// `customer_id = None` is a cash sale: stock moves, no account is
    /// created or touched.
    ///
    /// ## Errors
    /// - `EmptySale` when there are no lines
    /// - `InvalidSale { issues }` listing every failing line (missing or
    ///   inactive product, non-positive quantity or price, quantity over
    ///   stock) - detected before any row is written
    /// - `CustomerNotFound` when a customer id is given but unknown
    ///
    /// Any error, including one from the charge step, rolls the whole
    /// transaction back.
    pub async fn create_sale(
        &self,
        customer_id: Option<&str>,
        lines: &[NewSaleLine],
        notes: Option<&str>,
    ) -> LedgerResult<Sale> {
        if lines.is_empty() {
            return Err(CoreError::EmptySale.into());
        }

        let mut tx = self.pool.begin().await?;

        if let Some(customer_id) = customer_id {
            let count: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM customers WHERE id = ?1 AND is_active = 1",
            )
            .bind(customer_id)
            .fetch_one(&mut *tx)
            .await?;

            if count == 0 {
                return Err(CoreError::CustomerNotFound(customer_id.to_string()).into());
            }
        }

        // Read every referenced product once, inside the transaction, so
        // validation and the stock writes see the same state.
        let mut products: HashMap<String, Product> = HashMap::new();
        for line in lines {
            if !products.contains_key(&line.product_id) {
                if let Some(p) = product::fetch_product(&mut *tx, &line.product_id).await? {
                    products.insert(line.product_id.clone(), p);
                }
            }
        }

        let total_cents = validate_sale(lines, &products)?;

        let now = Utc::now();
        let sale = Sale {
            id: Uuid::new_v4().to_string(),
            customer_id: customer_id.map(str::to_string),
            total_cents,
            notes: notes.map(str::to_string),
            created_at: now,
        };

        debug!(sale_id = %sale.id, total = %sale.total(), lines = lines.len(), "Creating sale");

        sqlx::query(
            r#"
            INSERT INTO sales (id, customer_id, total_cents, notes, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.customer_id)
        .bind(sale.total_cents)
        .bind(&sale.notes)
        .bind(sale.created_at)
        .execute(&mut *tx)
        .await?;

        for (index, line) in lines.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO sale_lines (
                    id, sale_id, product_id, quantity, unit_price_cents, subtotal_cents
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&sale.id)
            .bind(&line.product_id)
            .bind(line.quantity)
            .bind(line.unit_price_cents)
            .bind(line.subtotal_cents())
            .execute(&mut *tx)
            .await?;

            let updated =
                product::adjust_stock(&mut *tx, &line.product_id, -line.quantity).await?;
            if !updated {
                // The guarded UPDATE refused; report it on the line that
                // asked for more than the shelf holds.
                let available = products
                    .get(&line.product_id)
                    .map(|p| p.stock)
                    .unwrap_or(0);
                return Err(CoreError::InvalidSale {
                    issues: vec![LineIssue {
                        line: index,
                        kind: LineIssueKind::InsufficientStock {
                            available,
                            requested: line.quantity,
                        },
                    }],
                }
                .into());
            }
        }

        if let Some(customer_id) = customer_id {
            account::charge_tx(&mut *tx, customer_id, total_cents, "Sale", Some(&sale.id))
                .await?;
        }

        tx.commit().await?;

        info!(
            sale_id = %sale.id,
            total = %Money::from_cents(total_cents),
            on_credit = customer_id.is_some(),
            "Sale created"
        );

        Ok(sale)
    }

    /// Deletes a sale, fully reversing it in one transaction.
    ///
    /// Order within the transaction: restore stock per line, reverse the
    /// account charge (zero-floored) and delete its movements, then
    /// delete the sale rows.
    ///
    /// The account itself is left in place even if the reversal zeroed
    /// it; call `cleanup_if_empty` afterwards to remove it.
    ///
    /// ## Errors
    /// `SaleNotFound` when the id does not exist. Store failures roll
    /// the whole reversal back - stock, ledger, and rows stay exactly
    /// as they were.
    pub async fn delete_sale(&self, sale_id: &str) -> LedgerResult<()> {
        let mut tx = self.pool.begin().await?;

        let sale = fetch_sale(&mut *tx, sale_id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;

        let lines = fetch_lines(&mut *tx, sale_id).await?;

        for line in &lines {
            let updated =
                product::adjust_stock(&mut *tx, &line.product_id, line.quantity).await?;
            if !updated {
                // Products are only ever soft-deleted, so the row must
                // still exist; a miss here is store corruption.
                return Err(DbError::not_found("Product", &line.product_id).into());
            }
        }

        if let Some(customer_id) = &sale.customer_id {
            reverse_sale_charge_tx(&mut *tx, customer_id, sale.total_cents, sale_id).await?;
        }

        sqlx::query("DELETE FROM sale_lines WHERE sale_id = ?1")
            .bind(sale_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM sales WHERE id = ?1")
            .bind(sale_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(
            sale_id = %sale_id,
            total = %sale.total(),
            on_credit = sale.customer_id.is_some(),
            "Sale deleted and reversed"
        );

        Ok(())
    }

    /// Gets a sale by ID.
    pub async fn get_by_id(&self, sale_id: &str) -> LedgerResult<Option<Sale>> {
        let mut conn = self.pool.acquire().await?;
        Ok(fetch_sale(&mut conn, sale_id).await?)
    }

    /// Gets the lines of a sale, in insertion order.
    pub async fn lines_of(&self, sale_id: &str) -> LedgerResult<Vec<SaleLine>> {
        let mut conn = self.pool.acquire().await?;
        Ok(fetch_lines(&mut conn, sale_id).await?)
    }

    /// Lists the most recent sales, newest first.
    pub async fn list_recent(&self, limit: u32) -> LedgerResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales \
             ORDER BY created_at DESC, rowid DESC LIMIT ?1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;

        Ok(sales)
    }
}

async fn fetch_sale(conn: &mut SqliteConnection, sale_id: &str) -> Result<Option<Sale>, DbError> {
    let sale = sqlx::query_as::<_, Sale>(&format!(
        "SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1"
    ))
    .bind(sale_id)
    .fetch_optional(conn)
    .await?;

    Ok(sale)
}

async fn fetch_lines(
    conn: &mut SqliteConnection,
    sale_id: &str,
) -> Result<Vec<SaleLine>, DbError> {
    let lines = sqlx::query_as::<_, SaleLine>(&format!(
        "SELECT {SALE_LINE_COLUMNS} FROM sale_lines WHERE sale_id = ?1 ORDER BY rowid"
    ))
    .bind(sale_id)
    .fetch_all(conn)
    .await?;

    Ok(lines)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LedgerError;
    use crate::pool::{Database, DbConfig};
    use crate::repository::customer::generate_customer_id;
    use crate::repository::product::generate_product_id;
    use fiado_core::{Customer, PaymentMethod};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn seed_customer(db: &Database, name: &str) -> String {
        let now = Utc::now();
        let customer = Customer {
            id: generate_customer_id(),
            name: name.to_string(),
            phone: None,
            email: None,
            address: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.customers().insert(&customer).await.unwrap();
        customer.id
    }

    async fn seed_product(db: &Database, name: &str, stock: i64, price_cents: i64) -> String {
        let now = Utc::now();
        let product = Product {
            id: generate_product_id(),
            name: name.to_string(),
            purchase_price_cents: price_cents / 2,
            sale_price_cents: price_cents,
            stock,
            reorder_level: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.products().insert(&product).await.unwrap();
        product.id
    }

    fn line(product_id: &str, quantity: i64, unit_price_cents: i64) -> NewSaleLine {
        NewSaleLine {
            product_id: product_id.to_string(),
            quantity,
            unit_price_cents,
        }
    }

    async fn stock_of(db: &Database, product_id: &str) -> i64 {
        db.products()
            .get_by_id(product_id)
            .await
            .unwrap()
            .unwrap()
            .stock
    }

    fn domain_err(err: LedgerError) -> CoreError {
        match err {
            LedgerError::Domain(e) => e,
            LedgerError::Store(e) => panic!("expected domain error, got store error: {e}"),
        }
    }

    #[tokio::test]
    async fn test_credit_sale_charges_fresh_account() {
        // Customer with no account buys 2 x $15.00 on credit
        let db = test_db().await;
        let customer_id = seed_customer(&db, "Ana").await;
        let product_id = seed_product(&db, "Rice 1kg", 10, 1500).await;

        let sale = db
            .sales()
            .create_sale(Some(&customer_id), &[line(&product_id, 2, 1500)], None)
            .await
            .unwrap();

        assert_eq!(sale.total_cents, 3000);
        assert!(sale.is_credit());
        assert_eq!(stock_of(&db, &product_id).await, 8);

        let balance = db
            .accounts()
            .balance_of(&customer_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(balance.total_debt_cents, 3000);
        assert_eq!(balance.pending_balance_cents, 3000);

        // The charge movement carries the sale id
        let movements = db.accounts().movements_of(&customer_id, 10).await.unwrap();
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].sale_id.as_deref(), Some(sale.id.as_str()));
    }

    #[tokio::test]
    async fn test_full_payment_settles_pending_but_not_lifetime_debt() {
        let db = test_db().await;
        let customer_id = seed_customer(&db, "Ana").await;
        let product_id = seed_product(&db, "Rice 1kg", 10, 1500).await;

        db.sales()
            .create_sale(Some(&customer_id), &[line(&product_id, 2, 1500)], None)
            .await
            .unwrap();

        db.accounts()
            .pay(&customer_id, 3000, PaymentMethod::Cash, None, "ABO-20260806-0001")
            .await
            .unwrap();

        let balance = db
            .accounts()
            .balance_of(&customer_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(balance.pending_balance_cents, 0);
        assert_eq!(balance.total_debt_cents, 3000);

        // Lifetime debt keeps the account alive
        assert!(!db.accounts().cleanup_if_empty(&customer_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_sale_round_trips_stock_and_balances() {
        let db = test_db().await;
        let customer_id = seed_customer(&db, "Ana").await;
        let product_id = seed_product(&db, "Rice 1kg", 10, 1500).await;

        let sale = db
            .sales()
            .create_sale(Some(&customer_id), &[line(&product_id, 2, 1500)], None)
            .await
            .unwrap();

        db.sales().delete_sale(&sale.id).await.unwrap();

        assert_eq!(stock_of(&db, &product_id).await, 10);

        let balance = db
            .accounts()
            .balance_of(&customer_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(balance.total_debt_cents, 0);
        assert_eq!(balance.pending_balance_cents, 0);

        // Movements tied to the sale are gone
        assert!(db
            .accounts()
            .movements_of(&customer_id, 10)
            .await
            .unwrap()
            .is_empty());

        // Sale rows are gone
        assert!(db.sales().get_by_id(&sale.id).await.unwrap().is_none());
        assert!(db.sales().lines_of(&sale.id).await.unwrap().is_empty());

        // Now the account is settled and cleanup removes it
        assert!(db.accounts().cleanup_if_empty(&customer_id).await.unwrap());
        assert!(db
            .accounts()
            .balance_of(&customer_id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_reversal_clamps_balances_at_zero() {
        let db = test_db().await;
        let customer_id = seed_customer(&db, "Ana").await;
        let product_id = seed_product(&db, "Rice 1kg", 10, 1500).await;

        let sale = db
            .sales()
            .create_sale(Some(&customer_id), &[line(&product_id, 2, 1500)], None)
            .await
            .unwrap();

        // Partial payment first: pending 2000, lifetime 3000
        db.accounts()
            .pay(&customer_id, 1000, PaymentMethod::Cash, None, "ABO-20260806-0001")
            .await
            .unwrap();

        // Reversing the full 3000 floors pending at zero instead of -1000
        db.sales().delete_sale(&sale.id).await.unwrap();

        let balance = db
            .accounts()
            .balance_of(&customer_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(balance.total_debt_cents, 0);
        assert_eq!(balance.pending_balance_cents, 0);
    }

    #[tokio::test]
    async fn test_insufficient_stock_rejected_with_no_side_effects() {
        let db = test_db().await;
        let customer_id = seed_customer(&db, "Ana").await;
        let product_id = seed_product(&db, "Rice 1kg", 5, 100).await;

        let err = db
            .sales()
            .create_sale(Some(&customer_id), &[line(&product_id, 9999, 100)], None)
            .await
            .unwrap_err();

        let core = domain_err(err);
        assert!(core.has_line_issue(|k| matches!(
            k,
            LineIssueKind::InsufficientStock {
                available: 5,
                requested: 9999
            }
        )));

        // No stock change, no account, no sale rows
        assert_eq!(stock_of(&db, &product_id).await, 5);
        assert!(db
            .accounts()
            .balance_of(&customer_id)
            .await
            .unwrap()
            .is_none());
        assert!(db.sales().list_recent(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cash_sale_never_touches_accounts() {
        let db = test_db().await;
        let product_id = seed_product(&db, "Rice 1kg", 10, 1500).await;

        let sale = db
            .sales()
            .create_sale(None, &[line(&product_id, 3, 1500)], None)
            .await
            .unwrap();

        assert!(!sale.is_credit());
        assert_eq!(stock_of(&db, &product_id).await, 7);

        let accounts: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM accounts")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(accounts, 0);

        // Deleting it only restores stock
        db.sales().delete_sale(&sale.id).await.unwrap();
        assert_eq!(stock_of(&db, &product_id).await, 10);
    }

    #[tokio::test]
    async fn test_validation_reports_every_bad_line() {
        let db = test_db().await;
        let product_id = seed_product(&db, "Rice 1kg", 5, 100).await;

        let err = db
            .sales()
            .create_sale(
                None,
                &[
                    line(&product_id, 1, 100), // fine
                    line("ghost", 1, 100),     // unknown product
                    line(&product_id, 0, 100), // bad quantity
                ],
                None,
            )
            .await
            .unwrap_err();

        match domain_err(err) {
            CoreError::InvalidSale { issues } => {
                assert_eq!(issues.len(), 2);
                assert_eq!(issues[0].line, 1);
                assert!(matches!(
                    issues[0].kind,
                    LineIssueKind::ProductNotFound { .. }
                ));
                assert_eq!(issues[1].line, 2);
                assert!(matches!(
                    issues[1].kind,
                    LineIssueKind::InvalidQuantity { .. }
                ));
            }
            other => panic!("expected InvalidSale, got {other:?}"),
        }

        assert_eq!(stock_of(&db, &product_id).await, 5);
    }

    #[tokio::test]
    async fn test_empty_sale_and_unknown_parties() {
        let db = test_db().await;
        let product_id = seed_product(&db, "Rice 1kg", 5, 100).await;

        let err = db.sales().create_sale(None, &[], None).await.unwrap_err();
        assert!(matches!(domain_err(err), CoreError::EmptySale));

        let err = db
            .sales()
            .create_sale(Some("ghost"), &[line(&product_id, 1, 100)], None)
            .await
            .unwrap_err();
        assert!(matches!(domain_err(err), CoreError::CustomerNotFound(_)));

        let err = db.sales().delete_sale("missing").await.unwrap_err();
        assert!(matches!(domain_err(err), CoreError::SaleNotFound(_)));
    }

    #[tokio::test]
    async fn test_multi_line_sale_totals_and_lines() {
        let db = test_db().await;
        let customer_id = seed_customer(&db, "Ana").await;
        let rice = seed_product(&db, "Rice 1kg", 10, 1500).await;
        let beans = seed_product(&db, "Beans 500g", 8, 900).await;

        let sale = db
            .sales()
            .create_sale(
                Some(&customer_id),
                &[line(&rice, 2, 1500), line(&beans, 3, 900)],
                Some("weekly groceries"),
            )
            .await
            .unwrap();

        assert_eq!(sale.total_cents, 3000 + 2700);
        assert_eq!(sale.notes.as_deref(), Some("weekly groceries"));

        let lines = db.sales().lines_of(&sale.id).await.unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].subtotal_cents, 3000);
        assert_eq!(lines[1].subtotal_cents, 2700);

        let recent = db.sales().list_recent(10).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id, sale.id);
    }
}
