//! # Expense and Meter-Reading Services
//!
//! Book-keeping records with the same idempotency gate as the
//! transaction paths. No derivation logic hangs off these.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use hamu_core::{
    validate_agent_name, validate_amount_cents, Expense, MeterReading, ValidationError,
};
use hamu_db::Database;

use crate::error::ServiceResult;

/// Input for recording an expense.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateExpense {
    pub shop_id: String,
    pub description: String,
    pub cost_cents: i64,
    pub agent_name: String,
    /// Offline-synced expenses carry the device-side timestamp.
    pub created_at: Option<DateTime<Utc>>,
    /// Idempotency key for offline sync.
    pub client_id: Option<String>,
}

/// Input for recording a meter reading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMeterReading {
    pub shop_id: String,
    pub agent_name: String,
    pub value: i64,
    pub reading_type: String,
    /// Offline-synced readings carry the device-side timestamp.
    pub reading_date: Option<DateTime<Utc>>,
    /// Idempotency key for offline sync.
    pub client_id: Option<String>,
}

/// Service for expenses and meter readings.
#[derive(Debug, Clone)]
pub struct RecordsService {
    db: Database,
}

impl RecordsService {
    /// Creates a new records service.
    pub fn new(db: Database) -> Self {
        RecordsService { db }
    }

    /// Records an expense.
    #[instrument(skip(self, input), fields(shop_id = %input.shop_id))]
    pub async fn create_expense(&self, input: CreateExpense) -> ServiceResult<Expense> {
        // Idempotency gate
        if let Some(client_id) = &input.client_id {
            if let Some(existing) = self.db.expenses().find_by_client_id(client_id).await? {
                info!(
                    expense_id = %existing.id,
                    %client_id,
                    "Duplicate sync; returning existing expense"
                );
                return Ok(existing);
            }
        }

        if input.description.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "description".to_string(),
            }
            .into());
        }
        validate_amount_cents("cost", input.cost_cents)?;
        validate_agent_name(&input.agent_name)?;

        let expense = Expense {
            id: Uuid::new_v4().to_string(),
            shop_id: input.shop_id.clone(),
            description: input.description.trim().to_string(),
            cost_cents: input.cost_cents,
            agent_name: input.agent_name.trim().to_string(),
            created_at: input.created_at.unwrap_or_else(Utc::now),
            client_id: input.client_id.clone(),
        };
        self.db.expenses().insert(&expense).await?;

        info!(expense_id = %expense.id, cost = expense.cost_cents, "Expense recorded");
        Ok(expense)
    }

    /// Records a meter reading.
    #[instrument(skip(self, input), fields(shop_id = %input.shop_id))]
    pub async fn create_meter_reading(
        &self,
        input: CreateMeterReading,
    ) -> ServiceResult<MeterReading> {
        // Idempotency gate
        if let Some(client_id) = &input.client_id {
            if let Some(existing) = self.db.meter_readings().find_by_client_id(client_id).await? {
                info!(
                    reading_id = %existing.id,
                    %client_id,
                    "Duplicate sync; returning existing meter reading"
                );
                return Ok(existing);
            }
        }

        validate_agent_name(&input.agent_name)?;
        if input.value < 0 {
            return Err(ValidationError::MustBeNonNegative {
                field: "value".to_string(),
            }
            .into());
        }

        let reading = MeterReading {
            id: Uuid::new_v4().to_string(),
            shop_id: input.shop_id.clone(),
            agent_name: input.agent_name.trim().to_string(),
            value: input.value,
            reading_type: input.reading_type.clone(),
            reading_date: input.reading_date.unwrap_or_else(Utc::now),
            client_id: input.client_id.clone(),
        };
        self.db.meter_readings().insert(&reading).await?;

        info!(reading_id = %reading.id, value = reading.value, "Meter reading recorded");
        Ok(reading)
    }

    /// A shop's expenses, newest first.
    pub async fn list_expenses(&self, shop_id: &str) -> ServiceResult<Vec<Expense>> {
        Ok(self.db.expenses().list_for_shop(shop_id).await?)
    }

    /// A shop's meter readings, newest first.
    pub async fn list_meter_readings(&self, shop_id: &str) -> ServiceResult<Vec<MeterReading>> {
        Ok(self.db.meter_readings().list_for_shop(shop_id).await?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use hamu_core::Shop;
    use hamu_db::DbConfig;

    async fn service() -> RecordsService {
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
        RecordsService::new(db)
    }

    #[tokio::test]
    async fn test_expense_idempotency() {
        let svc = service().await;
        let input = CreateExpense {
            shop_id: "shop-1".to_string(),
            description: "Generator fuel".to_string(),
            cost_cents: 150000,
            agent_name: "Jane Agent".to_string(),
            created_at: None,
            client_id: Some("exp-1".to_string()),
        };

        let first = svc.create_expense(input.clone()).await.unwrap();
        let second = svc.create_expense(input).await.unwrap();
        assert_eq!(first.id, second.id);

        assert_eq!(svc.list_expenses("shop-1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_expense_validation() {
        let svc = service().await;
        let input = CreateExpense {
            shop_id: "shop-1".to_string(),
            description: "  ".to_string(),
            cost_cents: 100,
            agent_name: "Jane Agent".to_string(),
            created_at: None,
            client_id: None,
        };
        assert!(svc.create_expense(input).await.is_err());
    }

    #[tokio::test]
    async fn test_meter_reading_roundtrip() {
        let svc = service().await;
        let reading = svc
            .create_meter_reading(CreateMeterReading {
                shop_id: "shop-1".to_string(),
                agent_name: "Jane Agent".to_string(),
                value: 48210,
                reading_type: "closing".to_string(),
                reading_date: None,
                client_id: None,
            })
            .await
            .unwrap();

        assert_eq!(reading.value, 48210);
        assert_eq!(svc.list_meter_readings("shop-1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_negative_meter_value_rejected() {
        let svc = service().await;
        let result = svc
            .create_meter_reading(CreateMeterReading {
                shop_id: "shop-1".to_string(),
                agent_name: "Jane Agent".to_string(),
                value: -1,
                reading_type: "closing".to_string(),
                reading_date: None,
                client_id: None,
            })
            .await;
        assert!(result.is_err());
    }
}
