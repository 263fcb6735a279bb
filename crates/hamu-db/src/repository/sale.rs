//! # Sale Repository
//!
//! Bottle/bundle sale events. Immutable after insert; the only lookups
//! are the idempotency gate, per-customer history, and the CREDIT-mode
//! cost sum the credit reconciler folds.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use hamu_core::Sale;

use crate::error::DbResult;

const SELECT_COLUMNS: &str = "id, shop_id, customer_id, package_id, quantity, \
     payment_mode, cost_cents, sold_at, agent_name, client_id";

/// Repository for sale events.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new repository with the given pool.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Inserts a sale inside the caller's transaction, so the stock
    /// deductions it causes commit or roll back with it.
    pub async fn insert(&self, conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
        debug!(sale_id = %sale.id, quantity = sale.quantity, "Inserting sale");

        sqlx::query(
            r#"
            INSERT INTO sales
                (id, shop_id, customer_id, package_id, quantity,
                 payment_mode, cost_cents, sold_at, agent_name, client_id)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.shop_id)
        .bind(&sale.customer_id)
        .bind(&sale.package_id)
        .bind(sale.quantity)
        .bind(sale.payment_mode)
        .bind(sale.cost_cents)
        .bind(sale.sold_at)
        .bind(&sale.agent_name)
        .bind(&sale.client_id)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Fetches a sale by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM sales WHERE id = ?");
        let sale = sqlx::query_as::<_, Sale>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(sale)
    }

    /// Idempotency gate: finds a sale previously synced under this
    /// client-assigned key.
    pub async fn find_by_client_id(&self, client_id: &str) -> DbResult<Option<Sale>> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM sales WHERE client_id = ?");
        let sale = sqlx::query_as::<_, Sale>(&sql)
            .bind(client_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(sale)
    }

    /// Lists a customer's sales, newest first.
    pub async fn list_for_customer(&self, customer_id: &str) -> DbResult<Vec<Sale>> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM sales \
             WHERE customer_id = ? ORDER BY sold_at DESC"
        );
        let sales = sqlx::query_as::<_, Sale>(&sql)
            .bind(customer_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(sales)
    }

    /// Sum of costs the customer took on credit via sales.
    ///
    /// One of the two "owed" inputs to the credit reconciler (the other
    /// is the refill-side sum).
    pub async fn total_credit_cost(&self, customer_id: &str) -> DbResult<i64> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(cost_cents), 0) FROM sales \
             WHERE customer_id = ? AND payment_mode = 'CREDIT'",
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
