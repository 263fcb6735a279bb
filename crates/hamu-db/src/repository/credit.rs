//! # Credit Repository
//!
//! The signed credit ledger. Rows represent genuine repayments and the
//! synthetic adjustments the reconciliation engine posts (offline
//! overpayment refunds, credit-balance consumption).
//!
//! The reconciler never reads individual rows for its math - it folds
//! the signed sum and joins it with the CREDIT-mode cost sums from
//! sales and refills.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use hamu_core::CreditEntry;

use crate::error::DbResult;

const SELECT_COLUMNS: &str = "id, shop_id, customer_id, money_paid_cents, \
     payment_mode, payment_date, agent_name, client_id";

/// Repository for credit-ledger entries.
#[derive(Debug, Clone)]
pub struct CreditRepository {
    pool: SqlitePool,
}

impl CreditRepository {
    /// Creates a new repository with the given pool.
    pub fn new(pool: SqlitePool) -> Self {
        CreditRepository { pool }
    }

    /// Inserts a credit entry inside the caller's transaction.
    ///
    /// Synthetic postings must commit atomically with the refill that
    /// caused them, so this is the only insert path.
    pub async fn insert(&self, conn: &mut SqliteConnection, entry: &CreditEntry) -> DbResult<()> {
        debug!(
            entry_id = %entry.id,
            customer_id = %entry.customer_id,
            amount = entry.money_paid_cents,
            agent = %entry.agent_name,
            "Inserting credit entry"
        );

        sqlx::query(
            r#"
            INSERT INTO credit_entries
                (id, shop_id, customer_id, money_paid_cents,
                 payment_mode, payment_date, agent_name, client_id)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.shop_id)
        .bind(&entry.customer_id)
        .bind(entry.money_paid_cents)
        .bind(entry.payment_mode)
        .bind(entry.payment_date)
        .bind(&entry.agent_name)
        .bind(&entry.client_id)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Idempotency gate: finds an entry previously synced under this
    /// client-assigned key.
    pub async fn find_by_client_id(&self, client_id: &str) -> DbResult<Option<CreditEntry>> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM credit_entries WHERE client_id = ?");
        let entry = sqlx::query_as::<_, CreditEntry>(&sql)
            .bind(client_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(entry)
    }

    /// Lists a customer's credit entries, newest first.
    pub async fn list_for_customer(&self, customer_id: &str) -> DbResult<Vec<CreditEntry>> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM credit_entries \
             WHERE customer_id = ? ORDER BY payment_date DESC, id DESC"
        );
        let entries = sqlx::query_as::<_, CreditEntry>(&sql)
            .bind(customer_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(entries)
    }

    /// Signed sum of everything posted against the customer: the
    /// "repaid" input to the credit reconciler.
    pub async fn total_paid(&self, customer_id: &str) -> DbResult<i64> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(money_paid_cents), 0) FROM credit_entries \
             WHERE customer_id = ?",
        )
        .bind(customer_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::Utc;
    use hamu_core::{Customer, PaymentMode, Shop, CREDIT_USED_ACTOR, OFFLINE_SYNC_ACTOR};

    async fn seeded_db() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.shops()
            .insert(&Shop {
                id: "shop-1".to_string(),
                shop_name: "Hamu Waters".to_string(),
                free_refill_interval: 10,
                created_at: Utc::now(),
            })
            .await
            .unwrap();
        db.customers()
            .insert(&Customer {
                id: "c1".to_string(),
                shop_id: "shop-1".to_string(),
                names: "Allan Thome".to_string(),
                phone_number: "0712345678".to_string(),
                apartment_name: None,
                room_number: None,
                date_registered: Utc::now(),
                client_id: None,
            })
            .await
            .unwrap();
        db
    }

    fn entry(id: &str, amount: i64, agent: &str) -> CreditEntry {
        CreditEntry {
            id: id.to_string(),
            shop_id: "shop-1".to_string(),
            customer_id: "c1".to_string(),
            money_paid_cents: amount,
            payment_mode: PaymentMode::Cash,
            payment_date: Utc::now(),
            agent_name: agent.to_string(),
            client_id: None,
        }
    }

    async fn commit_entry(db: &Database, e: &CreditEntry) {
        let mut tx = db.pool().begin().await.unwrap();
        db.credits().insert(&mut tx, e).await.unwrap();
        tx.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_signed_sum() {
        let db = seeded_db().await;

        commit_entry(&db, &entry("e1", 20000, "Jane Agent")).await;
        commit_entry(&db, &entry("e2", 5000, OFFLINE_SYNC_ACTOR)).await;
        commit_entry(&db, &entry("e3", -8000, CREDIT_USED_ACTOR)).await;

        assert_eq!(db.credits().total_paid("c1").await.unwrap(), 17000);
        assert_eq!(db.credits().total_paid("other").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_list_preserves_agent_tags() {
        let db = seeded_db().await;

        commit_entry(&db, &entry("e1", -5000, CREDIT_USED_ACTOR)).await;

        let entries = db.credits().list_for_customer("c1").await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].agent_name, CREDIT_USED_ACTOR);
        assert_eq!(entries[0].money_paid_cents, -5000);
    }
}
