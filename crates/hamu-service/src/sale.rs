//! # Sale Service
//!
//! Creates bottle/bundle sale transactions: idempotency gate, pricing,
//! and the stock deductions the sale physically consumes, all in one
//! transaction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use hamu_core::{
    validate_agent_name, validate_quantity, CoreError, PaymentMode, Sale,
};
use hamu_db::Database;

use crate::error::{ServiceError, ServiceResult};
use crate::reconcile::ReconciliationEngine;

/// Input for creating a sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSale {
    pub shop_id: String,
    /// Walk-in sales pass None.
    pub customer_id: Option<String>,
    pub package_id: String,
    pub quantity: i64,
    pub payment_mode: PaymentMode,
    /// Offline-synced sales carry the cost the device charged; online
    /// sales pass None and the price is derived from the package.
    pub cost_cents: Option<i64>,
    /// Offline-synced sales carry the device-side timestamp.
    pub sold_at: Option<DateTime<Utc>>,
    pub agent_name: String,
    /// Idempotency key for offline sync; None for online sales.
    pub client_id: Option<String>,
}

/// Service for sale transactions.
#[derive(Debug, Clone)]
pub struct SaleService {
    db: Database,
    engine: ReconciliationEngine,
}

impl SaleService {
    /// Creates a new sale service.
    pub fn new(db: Database) -> Self {
        let engine = ReconciliationEngine::new(db.clone());
        SaleService { db, engine }
    }

    /// Creates a sale.
    ///
    /// ## Flow
    /// 1. Idempotency gate: a known client_id returns the existing sale
    /// 2. Validation, shop and package lookups
    /// 3. Stock deduction planning (missing mappings are logged, never
    ///    block the sale)
    /// 4. One transaction: sale row + deduction entries
    #[instrument(skip(self, input), fields(shop_id = %input.shop_id, package_id = %input.package_id))]
    pub async fn create_sale(&self, input: CreateSale) -> ServiceResult<Sale> {
        // Idempotency gate
        if let Some(client_id) = &input.client_id {
            if let Some(existing) = self.db.sales().find_by_client_id(client_id).await? {
                info!(sale_id = %existing.id, %client_id, "Duplicate sync; returning existing sale");
                return Ok(existing);
            }
        }

        validate_quantity(input.quantity)?;
        validate_agent_name(&input.agent_name)?;

        self.db
            .shops()
            .get_by_id(&input.shop_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Shop", &input.shop_id))?;
        let package = self
            .db
            .packages()
            .get_by_id(&input.package_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Package", &input.package_id))?;

        let now = Utc::now();
        let sold_at = input.sold_at.unwrap_or(now);
        let cost_cents = match input.cost_cents {
            // Offline device cost is authoritative, never recalculated
            Some(cost) => cost,
            None => package.price().multiply_quantity(input.quantity).cents(),
        };

        // Plan deductions on pool reads before the write transaction
        let deductions = match self
            .engine
            .plan_for_sale(&package, input.quantity, &input.agent_name, now)
            .await
        {
            Ok(plan) => plan,
            Err(ServiceError::Core(err @ CoreError::MissingStockMapping { .. })) => {
                warn!(%err, "Stock not deducted for sale; continuing");
                Vec::new()
            }
            Err(other) => return Err(other),
        };

        let sale = Sale {
            id: Uuid::new_v4().to_string(),
            shop_id: input.shop_id.clone(),
            customer_id: input.customer_id.clone(),
            package_id: package.id.clone(),
            quantity: input.quantity,
            payment_mode: input.payment_mode,
            cost_cents,
            sold_at,
            agent_name: input.agent_name.trim().to_string(),
            client_id: input.client_id.clone(),
        };

        let mut tx = self.db.pool().begin().await?;
        self.db.sales().insert(&mut tx, &sale).await?;
        for entry in &deductions {
            self.db.stock().append_log(&mut tx, entry).await?;
        }
        tx.commit().await?;

        info!(
            sale_id = %sale.id,
            cost = sale.cost_cents,
            deductions = deductions.len(),
            "Sale created"
        );
        Ok(sale)
    }

    /// A customer's sale history, newest first.
    pub async fn list_for_customer(&self, customer_id: &str) -> ServiceResult<Vec<Sale>> {
        Ok(self.db.sales().list_for_customer(customer_id).await?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use hamu_core::{Package, SaleType, Shop, StockItem, StockItemType};
    use hamu_db::DbConfig;

    async fn seeded() -> (Database, SaleService) {
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
                water_amount_label: "18".to_string(),
                bottle_type: Some("hard".to_string()),
                price_cents: 25000,
                sale_type: SaleType::Sale,
                description: None,
            })
            .await
            .unwrap();
        let svc = SaleService::new(db.clone());
        (db, svc)
    }

    async fn add_stock(db: &Database, id: &str, name: &str, item_type: StockItemType, level: i64) {
        db.stock()
            .insert_item(&StockItem {
                id: id.to_string(),
                shop_id: "shop-1".to_string(),
                name: name.to_string(),
                item_type,
                threshold: 0,
                reorder_point: 0,
            })
            .await
            .unwrap();
        let mut tx = db.pool().begin().await.unwrap();
        db.stock()
            .append_log(
                &mut tx,
                &hamu_core::StockLogEntry {
                    id: Uuid::new_v4().to_string(),
                    stock_item_id: id.to_string(),
                    shop_id: "shop-1".to_string(),
                    quantity_change: level,
                    notes: "Opening stock".to_string(),
                    actor_name: "Seed".to_string(),
                    logged_at: Utc::now(),
                },
            )
            .await
            .unwrap();
        tx.commit().await.unwrap();
    }

    fn sale_input(quantity: i64, client_id: Option<&str>) -> CreateSale {
        CreateSale {
            shop_id: "shop-1".to_string(),
            customer_id: None,
            package_id: "p1".to_string(),
            quantity,
            payment_mode: PaymentMode::Cash,
            cost_cents: None,
            sold_at: None,
            agent_name: "Jane Agent".to_string(),
            client_id: client_id.map(String::from),
        }
    }

    #[tokio::test]
    async fn test_sale_deducts_bottle_and_label() {
        let (db, svc) = seeded().await;
        add_stock(&db, "b1", "18L hard bottle", StockItemType::Bottle, 100).await;
        add_stock(&db, "l1", "Brand labels", StockItemType::Label, 100).await;

        let sale = svc.create_sale(sale_input(3, None)).await.unwrap();
        assert_eq!(sale.cost_cents, 75000); // 3 × 250.00

        assert_eq!(db.stock().current_level("b1").await.unwrap(), 97);
        assert_eq!(db.stock().current_level("l1").await.unwrap(), 97);
    }

    #[tokio::test]
    async fn test_missing_mapping_does_not_block_sale() {
        let (db, svc) = seeded().await;
        // No bottle or label items configured

        let sale = svc.create_sale(sale_input(1, None)).await.unwrap();

        // Sale committed despite the reconciliation gap
        assert!(db.sales().get_by_id(&sale.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_idempotency_gate_returns_existing() {
        let (db, svc) = seeded().await;
        add_stock(&db, "b1", "18L hard bottle", StockItemType::Bottle, 100).await;
        add_stock(&db, "l1", "Brand labels", StockItemType::Label, 100).await;

        let first = svc.create_sale(sale_input(2, Some("dev-1"))).await.unwrap();
        let second = svc.create_sale(sale_input(2, Some("dev-1"))).await.unwrap();

        assert_eq!(first.id, second.id);
        // Stock deducted exactly once
        assert_eq!(db.stock().current_level("b1").await.unwrap(), 98);
    }

    #[tokio::test]
    async fn test_offline_cost_is_authoritative() {
        let (_db, svc) = seeded().await;

        let mut input = sale_input(2, Some("dev-2"));
        input.cost_cents = Some(40000); // device charged a discount price

        let sale = svc.create_sale(input).await.unwrap();
        assert_eq!(sale.cost_cents, 40000);
    }

    #[tokio::test]
    async fn test_unknown_shop_rejected() {
        let (_db, svc) = seeded().await;
        let mut input = sale_input(1, None);
        input.shop_id = "ghost".to_string();

        assert!(matches!(
            svc.create_sale(input).await.unwrap_err(),
            ServiceError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_unknown_package_rejected() {
        let (_db, svc) = seeded().await;
        let mut input = sale_input(1, None);
        input.package_id = "missing".to_string();

        assert!(matches!(
            svc.create_sale(input).await.unwrap_err(),
            ServiceError::NotFound { .. }
        ));
    }
}
