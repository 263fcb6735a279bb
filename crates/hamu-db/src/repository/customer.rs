//! # Customer Repository
//!
//! Customer reference data. Customers hold no running totals - loyalty,
//! credit and activity are derived from event history on read.
//!
//! Customer registration is itself offline-syncable, so the repository
//! exposes the same client_id idempotency lookup the event tables have.

use sqlx::SqlitePool;
use tracing::debug;

use hamu_core::Customer;

use crate::error::DbResult;

const SELECT_COLUMNS: &str = "id, shop_id, names, phone_number, apartment_name, \
     room_number, date_registered, client_id";

/// Repository for customer records.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new repository with the given pool.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Inserts a new customer.
    pub async fn insert(&self, customer: &Customer) -> DbResult<()> {
        debug!(
            customer_id = %customer.id,
            shop_id = %customer.shop_id,
            "Inserting customer"
        );

        sqlx::query(
            r#"
            INSERT INTO customers
                (id, shop_id, names, phone_number, apartment_name,
                 room_number, date_registered, client_id)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.shop_id)
        .bind(&customer.names)
        .bind(&customer.phone_number)
        .bind(&customer.apartment_name)
        .bind(&customer.room_number)
        .bind(customer.date_registered)
        .bind(&customer.client_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Fetches a customer by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM customers WHERE id = ?");
        let customer = sqlx::query_as::<_, Customer>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(customer)
    }

    /// Idempotency gate: finds a customer previously synced under this
    /// client-assigned key.
    pub async fn find_by_client_id(&self, client_id: &str) -> DbResult<Option<Customer>> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM customers WHERE client_id = ?");
        let customer = sqlx::query_as::<_, Customer>(&sql)
            .bind(client_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(customer)
    }

    /// Lists all customers of a shop, most recently registered first.
    pub async fn list_for_shop(&self, shop_id: &str) -> DbResult<Vec<Customer>> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM customers \
             WHERE shop_id = ? ORDER BY date_registered DESC"
        );
        let customers = sqlx::query_as::<_, Customer>(&sql)
            .bind(shop_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(customers)
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

    fn sample_customer(id: &str, client_id: Option<&str>) -> Customer {
        Customer {
            id: id.to_string(),
            shop_id: "shop-1".to_string(),
            names: "Allan Thome".to_string(),
            phone_number: "0712345678".to_string(),
            apartment_name: Some("Greenview".to_string()),
            room_number: Some("B12".to_string()),
            date_registered: Utc::now(),
            client_id: client_id.map(String::from),
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = db_with_shop().await;
        let repo = db.customers();

        repo.insert(&sample_customer("c1", None)).await.unwrap();

        let customer = repo.get_by_id("c1").await.unwrap().unwrap();
        assert_eq!(customer.names, "Allan Thome");
        assert_eq!(customer.apartment_name.as_deref(), Some("Greenview"));
    }

    #[tokio::test]
    async fn test_find_by_client_id() {
        let db = db_with_shop().await;
        let repo = db.customers();

        repo.insert(&sample_customer("c1", Some("device-key-1")))
            .await
            .unwrap();

        let found = repo.find_by_client_id("device-key-1").await.unwrap();
        assert_eq!(found.unwrap().id, "c1");

        assert!(repo.find_by_client_id("unknown").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_client_id_rejected() {
        let db = db_with_shop().await;
        let repo = db.customers();

        repo.insert(&sample_customer("c1", Some("device-key-1")))
            .await
            .unwrap();

        let err = repo
            .insert(&sample_customer("c2", Some("device-key-1")))
            .await
            .unwrap_err();
        assert!(matches!(err, crate::DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_list_for_shop() {
        let db = db_with_shop().await;
        let repo = db.customers();

        repo.insert(&sample_customer("c1", None)).await.unwrap();
        repo.insert(&sample_customer("c2", None)).await.unwrap();

        let customers = repo.list_for_shop("shop-1").await.unwrap();
        assert_eq!(customers.len(), 2);
    }
}
