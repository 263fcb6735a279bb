//! # Expense and Meter-Reading Repositories
//!
//! Plain offline-syncable records. No derivation logic hangs off these
//! tables; they exist for book-keeping and carry the same client_id
//! idempotency gate as the transaction tables.

use sqlx::SqlitePool;
use tracing::debug;

use hamu_core::{Expense, MeterReading};

use crate::error::DbResult;

const EXPENSE_COLUMNS: &str =
    "id, shop_id, description, cost_cents, agent_name, created_at, client_id";
const METER_COLUMNS: &str =
    "id, shop_id, agent_name, value, reading_type, reading_date, client_id";

// =============================================================================
// Expenses
// =============================================================================

/// Repository for expense records.
#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    pool: SqlitePool,
}

impl ExpenseRepository {
    /// Creates a new repository with the given pool.
    pub fn new(pool: SqlitePool) -> Self {
        ExpenseRepository { pool }
    }

    /// Inserts a new expense.
    pub async fn insert(&self, expense: &Expense) -> DbResult<()> {
        debug!(expense_id = %expense.id, cost = expense.cost_cents, "Inserting expense");

        sqlx::query(
            r#"
            INSERT INTO expenses
                (id, shop_id, description, cost_cents, agent_name, created_at, client_id)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&expense.id)
        .bind(&expense.shop_id)
        .bind(&expense.description)
        .bind(expense.cost_cents)
        .bind(&expense.agent_name)
        .bind(expense.created_at)
        .bind(&expense.client_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Idempotency gate: finds an expense previously synced under this
    /// client-assigned key.
    pub async fn find_by_client_id(&self, client_id: &str) -> DbResult<Option<Expense>> {
        let sql = format!("SELECT {EXPENSE_COLUMNS} FROM expenses WHERE client_id = ?");
        let expense = sqlx::query_as::<_, Expense>(&sql)
            .bind(client_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(expense)
    }

    /// Lists a shop's expenses, newest first.
    pub async fn list_for_shop(&self, shop_id: &str) -> DbResult<Vec<Expense>> {
        let sql = format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses \
             WHERE shop_id = ? ORDER BY created_at DESC"
        );
        let expenses = sqlx::query_as::<_, Expense>(&sql)
            .bind(shop_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(expenses)
    }
}

// =============================================================================
// Meter Readings
// =============================================================================

/// Repository for water meter readings.
#[derive(Debug, Clone)]
pub struct MeterReadingRepository {
    pool: SqlitePool,
}

impl MeterReadingRepository {
    /// Creates a new repository with the given pool.
    pub fn new(pool: SqlitePool) -> Self {
        MeterReadingRepository { pool }
    }

    /// Inserts a new meter reading.
    pub async fn insert(&self, reading: &MeterReading) -> DbResult<()> {
        debug!(
            reading_id = %reading.id,
            value = reading.value,
            "Inserting meter reading"
        );

        sqlx::query(
            r#"
            INSERT INTO meter_readings
                (id, shop_id, agent_name, value, reading_type, reading_date, client_id)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&reading.id)
        .bind(&reading.shop_id)
        .bind(&reading.agent_name)
        .bind(reading.value)
        .bind(&reading.reading_type)
        .bind(reading.reading_date)
        .bind(&reading.client_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Idempotency gate: finds a reading previously synced under this
    /// client-assigned key.
    pub async fn find_by_client_id(&self, client_id: &str) -> DbResult<Option<MeterReading>> {
        let sql = format!("SELECT {METER_COLUMNS} FROM meter_readings WHERE client_id = ?");
        let reading = sqlx::query_as::<_, MeterReading>(&sql)
            .bind(client_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(reading)
    }

    /// Lists a shop's meter readings, newest first.
    pub async fn list_for_shop(&self, shop_id: &str) -> DbResult<Vec<MeterReading>> {
        let sql = format!(
            "SELECT {METER_COLUMNS} FROM meter_readings \
             WHERE shop_id = ? ORDER BY reading_date DESC"
        );
        let readings = sqlx::query_as::<_, MeterReading>(&sql)
            .bind(shop_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(readings)
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
    use hamu_core::Shop;

    async fn db_with_shop() -> Database {
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
        db
    }

    #[tokio::test]
    async fn test_expense_roundtrip() {
        let db = db_with_shop().await;
        let repo = db.expenses();

        repo.insert(&Expense {
            id: "x1".to_string(),
            shop_id: "shop-1".to_string(),
            description: "Generator fuel".to_string(),
            cost_cents: 150000,
            agent_name: "Jane Agent".to_string(),
            created_at: Utc::now(),
            client_id: Some("exp-key-1".to_string()),
        })
        .await
        .unwrap();

        let found = repo.find_by_client_id("exp-key-1").await.unwrap().unwrap();
        assert_eq!(found.description, "Generator fuel");

        let all = repo.list_for_shop("shop-1").await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_meter_reading_roundtrip() {
        let db = db_with_shop().await;
        let repo = db.meter_readings();

        repo.insert(&MeterReading {
            id: "m1".to_string(),
            shop_id: "shop-1".to_string(),
            agent_name: "Jane Agent".to_string(),
            value: 48210,
            reading_type: "opening".to_string(),
            reading_date: Utc::now(),
            client_id: None,
        })
        .await
        .unwrap();

        let all = repo.list_for_shop("shop-1").await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].value, 48210);
        assert!(repo.find_by_client_id("none").await.unwrap().is_none());
    }
}
