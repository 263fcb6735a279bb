//! # Refill Repository
//!
//! Refill events carry the loyalty columns the split calculator fixed
//! at creation time (free/paid quantities, is_free flags). The loyalty
//! reconciler reads them back in chronological order; the cumulative
//! per-package quantity sum is the input to the next split.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use hamu_core::Refill;

use crate::error::DbResult;

const SELECT_COLUMNS: &str = "id, shop_id, customer_id, package_id, quantity, \
     payment_mode, cost_cents, is_free, is_partially_free, free_quantity, \
     paid_quantity, loyalty_refill_count, created_at, agent_name, client_id";

/// Repository for refill events.
#[derive(Debug, Clone)]
pub struct RefillRepository {
    pool: SqlitePool,
}

impl RefillRepository {
    /// Creates a new repository with the given pool.
    pub fn new(pool: SqlitePool) -> Self {
        RefillRepository { pool }
    }

    /// Inserts a refill inside the caller's transaction, so the stock
    /// deductions and credit postings it causes commit or roll back
    /// with it.
    pub async fn insert(&self, conn: &mut SqliteConnection, refill: &Refill) -> DbResult<()> {
        debug!(
            refill_id = %refill.id,
            quantity = refill.quantity,
            free = refill.free_quantity,
            "Inserting refill"
        );

        sqlx::query(
            r#"
            INSERT INTO refills
                (id, shop_id, customer_id, package_id, quantity,
                 payment_mode, cost_cents, is_free, is_partially_free,
                 free_quantity, paid_quantity, loyalty_refill_count,
                 created_at, agent_name, client_id)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&refill.id)
        .bind(&refill.shop_id)
        .bind(&refill.customer_id)
        .bind(&refill.package_id)
        .bind(refill.quantity)
        .bind(refill.payment_mode)
        .bind(refill.cost_cents)
        .bind(refill.is_free)
        .bind(refill.is_partially_free)
        .bind(refill.free_quantity)
        .bind(refill.paid_quantity)
        .bind(refill.loyalty_refill_count)
        .bind(refill.created_at)
        .bind(&refill.agent_name)
        .bind(&refill.client_id)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Fetches a refill by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Refill>> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM refills WHERE id = ?");
        let refill = sqlx::query_as::<_, Refill>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(refill)
    }

    /// Idempotency gate: finds a refill previously synced under this
    /// client-assigned key.
    pub async fn find_by_client_id(&self, client_id: &str) -> DbResult<Option<Refill>> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM refills WHERE client_id = ?");
        let refill = sqlx::query_as::<_, Refill>(&sql)
            .bind(client_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(refill)
    }

    /// Lists a customer's refills in chronological order - the order
    /// the loyalty reconciler needs to find the latest free refill.
    pub async fn list_for_customer(&self, customer_id: &str) -> DbResult<Vec<Refill>> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM refills \
             WHERE customer_id = ? ORDER BY created_at ASC, id ASC"
        );
        let refills = sqlx::query_as::<_, Refill>(&sql)
            .bind(customer_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(refills)
    }

    /// Cumulative quantity this customer has ever refilled of one
    /// package. The "total before" input of the free/paid split.
    pub async fn total_quantity_for_package(
        &self,
        customer_id: &str,
        package_id: &str,
    ) -> DbResult<i64> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(quantity), 0) FROM refills \
             WHERE customer_id = ? AND package_id = ?",
        )
        .bind(customer_id)
        .bind(package_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }

    /// In-transaction variant of [`total_quantity_for_package`], so the
    /// split is computed against the same snapshot the refill row is
    /// written into.
    ///
    /// [`total_quantity_for_package`]: RefillRepository::total_quantity_for_package
    pub async fn total_quantity_for_package_in(
        &self,
        conn: &mut SqliteConnection,
        customer_id: &str,
        package_id: &str,
    ) -> DbResult<i64> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(quantity), 0) FROM refills \
             WHERE customer_id = ? AND package_id = ?",
        )
        .bind(customer_id)
        .bind(package_id)
        .fetch_one(&mut *conn)
        .await?;

        Ok(total)
    }

    /// Sum of costs the customer took on credit via refills.
    pub async fn total_credit_cost(&self, customer_id: &str) -> DbResult<i64> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(cost_cents), 0) FROM refills \
             WHERE customer_id = ? AND payment_mode = 'CREDIT'",
        )
        .bind(customer_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }

    /// The customer's most recent refill date, for activity status.
    pub async fn last_refill_at(&self, customer_id: &str) -> DbResult<Option<DateTime<Utc>>> {
        let last: Option<DateTime<Utc>> = sqlx::query_scalar(
            "SELECT MAX(created_at) FROM refills WHERE customer_id = ?",
        )
        .bind(customer_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(last)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use hamu_core::{Customer, Package, PaymentMode, SaleType, Shop};

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
        db.packages()
            .insert(&Package {
                id: "p1".to_string(),
                shop_id: "shop-1".to_string(),
                water_amount_label: "20".to_string(),
                bottle_type: None,
                price_cents: 5000,
                sale_type: SaleType::Refill,
                description: None,
            })
            .await
            .unwrap();
        db
    }

    fn refill(id: &str, quantity: i64, free: i64, at: DateTime<Utc>) -> Refill {
        let paid = quantity - free;
        Refill {
            id: id.to_string(),
            shop_id: "shop-1".to_string(),
            customer_id: Some("c1".to_string()),
            package_id: "p1".to_string(),
            quantity,
            payment_mode: PaymentMode::Cash,
            cost_cents: 5000 * paid,
            is_free: free > 0 && paid == 0,
            is_partially_free: free > 0 && paid > 0,
            free_quantity: free,
            paid_quantity: paid,
            loyalty_refill_count: paid,
            created_at: at,
            agent_name: "Jane Agent".to_string(),
            client_id: None,
        }
    }

    async fn commit_refill(db: &Database, r: &Refill) {
        let mut tx = db.pool().begin().await.unwrap();
        db.refills().insert(&mut tx, r).await.unwrap();
        tx.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_roundtrip_preserves_split_columns() {
        let db = seeded_db().await;

        commit_refill(&db, &refill("r1", 3, 1, Utc::now())).await;

        let fetched = db.refills().get_by_id("r1").await.unwrap().unwrap();
        assert_eq!(fetched.free_quantity, 1);
        assert_eq!(fetched.paid_quantity, 2);
        assert!(fetched.is_partially_free);
        assert!(!fetched.is_free);
        assert_eq!(fetched.loyalty_refill_count, 2);
    }

    #[tokio::test]
    async fn test_cumulative_quantity_sum() {
        let db = seeded_db().await;
        let now = Utc::now();

        commit_refill(&db, &refill("r1", 4, 0, now)).await;
        commit_refill(&db, &refill("r2", 5, 0, now)).await;

        assert_eq!(
            db.refills()
                .total_quantity_for_package("c1", "p1")
                .await
                .unwrap(),
            9
        );
        assert_eq!(
            db.refills()
                .total_quantity_for_package("c1", "other")
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_list_chronological() {
        let db = seeded_db().await;
        let now = Utc::now();

        commit_refill(&db, &refill("r2", 1, 0, now)).await;
        commit_refill(&db, &refill("r1", 1, 0, now - chrono::Duration::days(1))).await;

        let refills = db.refills().list_for_customer("c1").await.unwrap();
        assert_eq!(refills[0].id, "r1");
        assert_eq!(refills[1].id, "r2");
    }

    #[tokio::test]
    async fn test_last_refill_at() {
        let db = seeded_db().await;

        assert!(db.refills().last_refill_at("c1").await.unwrap().is_none());

        let at = Utc::now();
        commit_refill(&db, &refill("r1", 1, 0, at - chrono::Duration::days(3))).await;
        commit_refill(&db, &refill("r2", 1, 0, at)).await;

        let last = db.refills().last_refill_at("c1").await.unwrap().unwrap();
        assert!((last - at).num_seconds().abs() < 2);
    }
}
