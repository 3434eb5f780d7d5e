//! # Account Ledger
//!
//! The customer running-account ledger: balances, movement history,
//! payments, and cleanup.
//!
//! ## Ledger Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                     Account Ledger State                            │
//! │                                                                     │
//! │  accounts (one per customer, running totals, authoritative)        │
//! │  ├── total_debt_cents      cumulative lifetime debits              │
//! │  └── pending_balance_cents current amount owed                     │
//! │                                                                     │
//! │  movements (append-only audit trail)                               │
//! │  ├── charge  ── posted by a credit sale, carries the sale id       │
//! │  └── payment ── posted by an abono                                 │
//! │                                                                     │
//! │  payments (receipt-numbered abono records)                         │
//! │                                                                     │
//! │  Invariant at all times:                                           │
//! │      0 <= pending_balance_cents <= total_debt_cents                │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every mutating operation updates the running totals and the movement
//! log inside the same transaction, so they can never drift apart. The
//! transaction is also the lock: the read-modify-write of
//! `pending_balance` only ever happens between `begin()` and `commit()`.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbResult, LedgerResult};
use fiado_core::validation::validate_amount_cents;
use fiado_core::{
    Account, AccountBalance, AccountSummary, CoreError, Money, Movement, MovementKind, Payment,
    PaymentMethod,
};

const ACCOUNT_COLUMNS: &str =
    "id, customer_id, total_debt_cents, pending_balance_cents, last_updated, is_active";

const MOVEMENT_COLUMNS: &str =
    "id, customer_id, kind, amount_cents, description, sale_id, created_at";

const PAYMENT_COLUMNS: &str =
    "id, customer_id, amount_cents, method, description, receipt_number, created_at";

/// Repository owning account balances and their audit trail.
///
/// The only writers besides this repository are the transaction-scoped
/// helpers at the bottom of this module, which the sale coordinator
/// calls inside its own transaction.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    pool: SqlitePool,
}

impl AccountRepository {
    /// Creates a new AccountRepository.
    pub fn new(pool: SqlitePool) -> Self {
        AccountRepository { pool }
    }

    /// Ensures the customer has an account, creating a zero-balance one
    /// if needed.
    ///
    /// Idempotent: calling it again returns the existing account id and
    /// writes nothing.
    ///
    /// ## Errors
    /// `CustomerNotFound` when the customer id does not resolve to an
    /// active customer.
    pub async fn ensure_account(&self, customer_id: &str) -> LedgerResult<String> {
        let mut tx = self.pool.begin().await?;
        let account_id = ensure_account_tx(&mut *tx, customer_id).await?;
        tx.commit().await?;
        Ok(account_id)
    }

    /// Posts a debit to the customer's account.
    ///
    /// Creates the account lazily if this is the customer's first
    /// charge. In one transaction: bumps both running totals, appends a
    /// `charge` movement, touches `last_updated`.
    ///
    /// ## Errors
    /// - `InvalidAmount` when `amount_cents <= 0` (checked before any
    ///   write)
    /// - `CustomerNotFound` when the customer does not exist
    pub async fn charge(
        &self,
        customer_id: &str,
        amount_cents: i64,
        description: &str,
        sale_id: Option<&str>,
    ) -> LedgerResult<()> {
        validate_amount_cents(amount_cents)?;

        let mut tx = self.pool.begin().await?;
        charge_tx(&mut *tx, customer_id, amount_cents, description, sale_id).await?;
        tx.commit().await?;

        info!(
            customer_id = %customer_id,
            amount = %Money::from_cents(amount_cents),
            "Charge posted"
        );
        Ok(())
    }

    /// Registers a payment (abono) against the customer's pending
    /// balance.
    ///
    /// In one transaction: decrements `pending_balance`, appends a
    /// `payment` movement, inserts the receipt-numbered payment record.
    /// `total_debt` is untouched - it is a lifetime figure.
    ///
    /// ## Errors
    /// - `InvalidAmount` when `amount_cents <= 0`
    /// - `AccountNotFound` when the customer has no account
    /// - `AmountExceedsBalance` when the payment is larger than the
    ///   pending balance (a payment may never flip the account into a
    ///   credit balance)
    pub async fn pay(
        &self,
        customer_id: &str,
        amount_cents: i64,
        method: PaymentMethod,
        description: Option<&str>,
        receipt_number: &str,
    ) -> LedgerResult<Payment> {
        validate_amount_cents(amount_cents)?;

        let mut tx = self.pool.begin().await?;

        let account = fetch_account(&mut *tx, customer_id)
            .await?
            .ok_or_else(|| CoreError::AccountNotFound(customer_id.to_string()))?;

        if amount_cents > account.pending_balance_cents {
            return Err(CoreError::AmountExceedsBalance {
                requested_cents: amount_cents,
                pending_cents: account.pending_balance_cents,
            }
            .into());
        }

        let now = Utc::now();
        let new_pending = account.pending_balance() - Money::from_cents(amount_cents);

        sqlx::query(
            r#"
            UPDATE accounts
            SET pending_balance_cents = ?2, last_updated = ?3
            WHERE customer_id = ?1
            "#,
        )
        .bind(customer_id)
        .bind(new_pending.cents())
        .bind(now)
        .execute(&mut *tx)
        .await?;

        insert_movement(
            &mut *tx,
            customer_id,
            MovementKind::Payment,
            amount_cents,
            description.unwrap_or("Payment"),
            None,
            now,
        )
        .await?;

        let result = sqlx::query(
            r#"
            INSERT INTO payments (
                customer_id, amount_cents, method, description, receipt_number, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(customer_id)
        .bind(amount_cents)
        .bind(method)
        .bind(description)
        .bind(receipt_number)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let payment_id = result.last_insert_rowid();

        tx.commit().await?;

        info!(
            customer_id = %customer_id,
            amount = %Money::from_cents(amount_cents),
            receipt_number = %receipt_number,
            remaining = %new_pending,
            "Payment registered"
        );

        Ok(Payment {
            id: payment_id,
            customer_id: customer_id.to_string(),
            amount_cents,
            method,
            description: description.map(str::to_string),
            receipt_number: receipt_number.to_string(),
            created_at: now,
        })
    }

    /// Returns the customer's balance snapshot, or None when no account
    /// exists.
    pub async fn balance_of(&self, customer_id: &str) -> LedgerResult<Option<AccountBalance>> {
        let balance = sqlx::query_as::<_, AccountBalance>(
            r#"
            SELECT total_debt_cents, pending_balance_cents, last_updated
            FROM accounts
            WHERE customer_id = ?1
            "#,
        )
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(crate::error::DbError::from)?;

        Ok(balance)
    }

    /// Returns the customer's most recent movements, newest first.
    ///
    /// Bounded snapshot, not a live cursor.
    pub async fn movements_of(&self, customer_id: &str, limit: u32) -> LedgerResult<Vec<Movement>> {
        let movements = sqlx::query_as::<_, Movement>(&format!(
            "SELECT {MOVEMENT_COLUMNS} FROM movements \
             WHERE customer_id = ?1 \
             ORDER BY created_at DESC, rowid DESC LIMIT ?2"
        ))
        .bind(customer_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(crate::error::DbError::from)?;

        Ok(movements)
    }

    /// Returns the customer's most recent payments, newest first.
    pub async fn payments_of(&self, customer_id: &str, limit: u32) -> LedgerResult<Vec<Payment>> {
        let payments = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments \
             WHERE customer_id = ?1 \
             ORDER BY id DESC LIMIT ?2"
        ))
        .bind(customer_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(crate::error::DbError::from)?;

        Ok(payments)
    }

    /// Lists customers that still owe money, largest balance first.
    ///
    /// Dashboard query; read-only.
    pub async fn list_with_pending(&self) -> LedgerResult<Vec<AccountSummary>> {
        let summaries = sqlx::query_as::<_, AccountSummary>(
            r#"
            SELECT a.customer_id, c.name AS customer_name,
                   a.pending_balance_cents, a.last_updated
            FROM accounts a
            JOIN customers c ON c.id = a.customer_id
            WHERE a.pending_balance_cents > 0
            ORDER BY a.pending_balance_cents DESC, c.name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(crate::error::DbError::from)?;

        Ok(summaries)
    }

    /// Deletes the account, its movements, and its payments - if and
    /// only if both balances are exactly zero.
    ///
    /// Returns whether a deletion occurred. Never called automatically
    /// by other operations: callers invoke it after flows that might
    /// zero an account out (a full sale reversal), and may ignore a
    /// failure - a leftover settled account is cosmetic, not corrupt.
    pub async fn cleanup_if_empty(&self, customer_id: &str) -> LedgerResult<bool> {
        let mut tx = self.pool.begin().await?;

        let account = match fetch_account(&mut *tx, customer_id).await? {
            Some(account) => account,
            None => return Ok(false),
        };

        // Exact integer comparison; balances are sums of exact postings
        if !account.is_settled() {
            return Ok(false);
        }

        sqlx::query("DELETE FROM movements WHERE customer_id = ?1")
            .bind(customer_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM payments WHERE customer_id = ?1")
            .bind(customer_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM accounts WHERE id = ?1")
            .bind(&account.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(customer_id = %customer_id, "Settled account cleaned up");
        Ok(true)
    }
}

// =============================================================================
// Transaction-Scoped Helpers
// =============================================================================
// These run inside a caller-owned transaction. The sale coordinator uses
// them so that stock, sale rows, and ledger postings commit or roll back
// as one unit.

/// Fetches the account row for a customer inside an open transaction.
pub(crate) async fn fetch_account(
    conn: &mut SqliteConnection,
    customer_id: &str,
) -> DbResult<Option<Account>> {
    let account = sqlx::query_as::<_, Account>(&format!(
        "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE customer_id = ?1"
    ))
    .bind(customer_id)
    .fetch_optional(conn)
    .await?;

    Ok(account)
}

/// Idempotent account creation inside an open transaction.
pub(crate) async fn ensure_account_tx(
    conn: &mut SqliteConnection,
    customer_id: &str,
) -> LedgerResult<String> {
    let customer_count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM customers WHERE id = ?1 AND is_active = 1",
    )
    .bind(customer_id)
    .fetch_one(&mut *conn)
    .await?;

    if customer_count == 0 {
        return Err(CoreError::CustomerNotFound(customer_id.to_string()).into());
    }

    if let Some(account) = fetch_account(conn, customer_id).await? {
        return Ok(account.id);
    }

    let account_id = Uuid::new_v4().to_string();
    let now = Utc::now();

    debug!(customer_id = %customer_id, account_id = %account_id, "Creating account");

    sqlx::query(
        r#"
        INSERT INTO accounts (
            id, customer_id, total_debt_cents, pending_balance_cents, last_updated, is_active
        ) VALUES (?1, ?2, 0, 0, ?3, 1)
        "#,
    )
    .bind(&account_id)
    .bind(customer_id)
    .bind(now)
    .execute(conn)
    .await?;

    Ok(account_id)
}

/// Posts a charge inside an open transaction.
///
/// Ensures the account, bumps both running totals, appends the `charge`
/// movement. The caller has already validated the amount.
pub(crate) async fn charge_tx(
    conn: &mut SqliteConnection,
    customer_id: &str,
    amount_cents: i64,
    description: &str,
    sale_id: Option<&str>,
) -> LedgerResult<()> {
    ensure_account_tx(conn, customer_id).await?;

    let now = Utc::now();

    sqlx::query(
        r#"
        UPDATE accounts
        SET total_debt_cents = total_debt_cents + ?2,
            pending_balance_cents = pending_balance_cents + ?2,
            last_updated = ?3
        WHERE customer_id = ?1
        "#,
    )
    .bind(customer_id)
    .bind(amount_cents)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    insert_movement(
        conn,
        customer_id,
        MovementKind::Charge,
        amount_cents,
        description,
        sale_id,
        now,
    )
    .await?;

    Ok(())
}

/// Undoes a sale's charge inside an open transaction.
///
/// Decrements both running totals by the sale's amount, **floored at
/// zero** - reversing more than is currently owed clamps to zero
/// instead of erroring, a tolerance for historical data drift - and
/// deletes the movement row(s) tied to the sale. A missing account is
/// the fully-drifted case of the same tolerance: the movements still
/// get deleted, the balance update is a no-op.
pub(crate) async fn reverse_sale_charge_tx(
    conn: &mut SqliteConnection,
    customer_id: &str,
    amount_cents: i64,
    sale_id: &str,
) -> LedgerResult<()> {
    let amount = Money::from_cents(amount_cents);

    if let Some(account) = fetch_account(conn, customer_id).await? {
        let new_total = account.total_debt().saturating_sub(amount);
        let new_pending = account.pending_balance().saturating_sub(amount);
        let now = Utc::now();

        sqlx::query(
            r#"
            UPDATE accounts
            SET total_debt_cents = ?2, pending_balance_cents = ?3, last_updated = ?4
            WHERE customer_id = ?1
            "#,
        )
        .bind(customer_id)
        .bind(new_total.cents())
        .bind(new_pending.cents())
        .bind(now)
        .execute(&mut *conn)
        .await?;

        debug!(
            customer_id = %customer_id,
            reversed = %amount,
            total_debt = %new_total,
            pending = %new_pending,
            "Sale charge reversed"
        );
    } else {
        debug!(customer_id = %customer_id, sale_id = %sale_id, "No account to reverse");
    }

    sqlx::query("DELETE FROM movements WHERE sale_id = ?1")
        .bind(sale_id)
        .execute(conn)
        .await?;

    Ok(())
}

/// Appends a movement row inside an open transaction.
async fn insert_movement(
    conn: &mut SqliteConnection,
    customer_id: &str,
    kind: MovementKind,
    amount_cents: i64,
    description: &str,
    sale_id: Option<&str>,
    created_at: DateTime<Utc>,
) -> LedgerResult<()> {
    sqlx::query(
        r#"
        INSERT INTO movements (
            id, customer_id, kind, amount_cents, description, sale_id, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(customer_id)
    .bind(kind)
    .bind(amount_cents)
    .bind(description)
    .bind(sale_id)
    .bind(created_at)
    .execute(conn)
    .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
