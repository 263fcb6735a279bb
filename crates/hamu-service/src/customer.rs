//! # Customer Service
//!
//! Customer registration (offline-syncable) and the derived per-customer
//! views: loyalty status and activity bucket.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use hamu_core::{
    loyalty_status, validate_customer_names, ActivityStatus, Customer, LoyaltyStatus,
};
use hamu_db::Database;

use crate::error::{ServiceError, ServiceResult};

/// Input for registering a customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCustomer {
    pub shop_id: String,
    pub names: String,
    pub phone_number: String,
    pub apartment_name: Option<String>,
    pub room_number: Option<String>,
    /// Offline-registered customers carry the device-side timestamp.
    pub date_registered: Option<DateTime<Utc>>,
    /// Idempotency key for offline sync.
    pub client_id: Option<String>,
}

/// Service for customer records and derived views.
#[derive(Debug, Clone)]
pub struct CustomerService {
    db: Database,
}

impl CustomerService {
    /// Creates a new customer service.
    pub fn new(db: Database) -> Self {
        CustomerService { db }
    }

    /// Registers a customer.
    #[instrument(skip(self, input), fields(shop_id = %input.shop_id))]
    pub async fn create_customer(&self, input: CreateCustomer) -> ServiceResult<Customer> {
        // Idempotency gate
        if let Some(client_id) = &input.client_id {
            if let Some(existing) = self.db.customers().find_by_client_id(client_id).await? {
                info!(
                    customer_id = %existing.id,
                    %client_id,
                    "Duplicate sync; returning existing customer"
                );
                return Ok(existing);
            }
        }

        validate_customer_names(&input.names)?;

        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            shop_id: input.shop_id.clone(),
            names: input.names.trim().to_string(),
            phone_number: input.phone_number.trim().to_string(),
            apartment_name: input.apartment_name.clone(),
            room_number: input.room_number.clone(),
            date_registered: input.date_registered.unwrap_or_else(Utc::now),
            client_id: input.client_id.clone(),
        };
        self.db.customers().insert(&customer).await?;

        info!(customer_id = %customer.id, "Customer registered");
        Ok(customer)
    }

    /// Fetches a customer, or NotFound.
    pub async fn get(&self, customer_id: &str) -> ServiceResult<Customer> {
        self.db
            .customers()
            .get_by_id(customer_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Customer", customer_id))
    }

    /// Lists a shop's customers, most recently registered first.
    pub async fn list_for_shop(&self, shop_id: &str) -> ServiceResult<Vec<Customer>> {
        Ok(self.db.customers().list_for_shop(shop_id).await?)
    }

    /// Derives a customer's loyalty status from their refill history
    /// and the shop's free-refill interval.
    pub async fn loyalty(&self, customer_id: &str) -> ServiceResult<LoyaltyStatus> {
        let customer = self.get(customer_id).await?;
        let shop = self
            .db
            .shops()
            .get_by_id(&customer.shop_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Shop", &customer.shop_id))?;

        let history = self.db.refills().list_for_customer(&customer.id).await?;
        Ok(loyalty_status(&history, shop.free_refill_interval))
    }

    /// Derives a customer's activity bucket from their most recent
    /// refill date.
    pub async fn activity(&self, customer_id: &str) -> ServiceResult<ActivityStatus> {
        let customer = self.get(customer_id).await?;
        let last_refill = self.db.refills().last_refill_at(&customer.id).await?;

        Ok(ActivityStatus::derive(
            last_refill,
            customer.date_registered,
            Utc::now(),
        ))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use hamu_core::{Package, PaymentMode, Refill, SaleType, Shop};
    use hamu_db::DbConfig;

    async fn seeded() -> (Database, CustomerService) {
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
        let svc = CustomerService::new(db.clone());
        (db, svc)
    }

    fn registration(client_id: Option<&str>) -> CreateCustomer {
        CreateCustomer {
            shop_id: "shop-1".to_string(),
            names: "Allan Thome".to_string(),
            phone_number: "0712345678".to_string(),
            apartment_name: None,
            room_number: None,
            date_registered: None,
            client_id: client_id.map(String::from),
        }
    }

    async fn paid_refill(db: &Database, customer_id: &str, id: &str, days_ago: i64) {
        let mut tx = db.pool().begin().await.unwrap();
        db.refills()
            .insert(
                &mut tx,
                &Refill {
                    id: id.to_string(),
                    shop_id: "shop-1".to_string(),
                    customer_id: Some(customer_id.to_string()),
                    package_id: "p1".to_string(),
                    quantity: 1,
                    payment_mode: PaymentMode::Cash,
                    cost_cents: 5000,
                    is_free: false,
                    is_partially_free: false,
                    free_quantity: 0,
                    paid_quantity: 1,
                    loyalty_refill_count: 1,
                    created_at: Utc::now() - chrono::Duration::days(days_ago),
                    agent_name: "Jane Agent".to_string(),
                    client_id: None,
                },
            )
            .await
            .unwrap();
        tx.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_register_and_idempotency() {
        let (_db, svc) = seeded().await;

        let first = svc.create_customer(registration(Some("reg-1"))).await.unwrap();
        let second = svc.create_customer(registration(Some("reg-1"))).await.unwrap();
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_empty_names_rejected() {
        let (_db, svc) = seeded().await;
        let mut input = registration(None);
        input.names = "  ".to_string();
        assert!(svc.create_customer(input).await.is_err());
    }

    #[tokio::test]
    async fn test_loyalty_after_nine_refills() {
        let (db, svc) = seeded().await;
        let customer = svc.create_customer(registration(None)).await.unwrap();

        for i in 0..9 {
            paid_refill(&db, &customer.id, &format!("r{i}"), 9 - i).await;
        }

        let status = svc.loyalty(&customer.id).await.unwrap();
        assert_eq!(status.current_points, 9);
        assert_eq!(status.refills_until_free, 1);
    }

    #[tokio::test]
    async fn test_activity_buckets() {
        let (db, svc) = seeded().await;
        let customer = svc.create_customer(registration(None)).await.unwrap();

        // Fresh registration, no refills
        assert_eq!(svc.activity(&customer.id).await.unwrap(), ActivityStatus::New);

        paid_refill(&db, &customer.id, "r1", 45).await;
        assert_eq!(
            svc.activity(&customer.id).await.unwrap(),
            ActivityStatus::Active
        );

        paid_refill(&db, &customer.id, "r2", 2).await;
        assert_eq!(
            svc.activity(&customer.id).await.unwrap(),
            ActivityStatus::VeryActive
        );
    }
}
