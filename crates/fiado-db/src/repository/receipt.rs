//! # Receipt Numbers
//!
//! Sequential, human-readable identifiers for payment receipts.
//!
//! Format: `ABO-YYYYMMDD-NNNN`, where `NNNN` is one past the highest
//! payment id so far, zero-padded to four digits. A display convenience,
//! not a uniqueness mechanism - the UNIQUE constraint on
//! `payments.receipt_number` is what actually enforces distinctness.

use chrono::Utc;
use sqlx::SqlitePool;

use crate::error::DbResult;
use fiado_core::RECEIPT_PREFIX;

/// Produces the next receipt number for a payment.
///
/// ## Example
/// `ABO-20260806-0001` for the first payment registered on 2026-08-06.
///
/// Reads `MAX(id)` without locking; with a single writer that is exact.
// TODO: move the sequence to a dedicated counter table if a second
// writing terminal is ever introduced.
pub async fn next_receipt_number(pool: &SqlitePool) -> DbResult<String> {
    let max_id: i64 = sqlx::query_scalar("SELECT COALESCE(MAX(id), 0) FROM payments")
        .fetch_one(pool)
        .await?;

    let date = Utc::now().format("%Y%m%d");
    Ok(format!("{}-{}-{:04}", RECEIPT_PREFIX, date, max_id + 1))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::customer::generate_customer_id;
    use fiado_core::{Customer, PaymentMethod};

    async fn seed_customer(db: &Database) -> String {
        let now = Utc::now();
        let customer = Customer {
            id: generate_customer_id(),
            name: "Ana".to_string(),
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

    #[tokio::test]
    async fn test_format_and_sequence() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let customer_id = seed_customer(&db).await;

        let today = Utc::now().format("%Y%m%d").to_string();

        let first = next_receipt_number(db.pool()).await.unwrap();
        assert_eq!(first, format!("ABO-{today}-0001"));

        // Register a payment under that receipt, then the sequence moves
        db.accounts()
            .charge(&customer_id, 5000, "Sale", None)
            .await
            .unwrap();
        db.accounts()
            .pay(&customer_id, 1000, PaymentMethod::Cash, None, &first)
            .await
            .unwrap();

        let second = next_receipt_number(db.pool()).await.unwrap();
        assert_eq!(second, format!("ABO-{today}-0002"));
    }

    #[tokio::test]
    async fn test_sequence_unmoved_by_failed_payment() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let customer_id = seed_customer(&db).await;

        db.accounts()
            .charge(&customer_id, 500, "Sale", None)
            .await
            .unwrap();

        let receipt = next_receipt_number(db.pool()).await.unwrap();
        // Over-balance payment rolls back, so no payment row was written
        assert!(db
            .accounts()
            .pay(&customer_id, 9999, PaymentMethod::Cash, None, &receipt)
            .await
            .is_err());

        assert_eq!(next_receipt_number(db.pool()).await.unwrap(), receipt);
    }
}
