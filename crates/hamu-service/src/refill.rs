//! # Refill Service
//!
//! Creates refill transactions: idempotency gate, loyalty split, stock
//! deductions, credit adjustments, and the post-commit loyalty
//! notification.
//!
//! ## Creation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create_refill(input)                                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  idempotency gate (client_id) ──► known? return existing, unchanged    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  lookups: shop interval, package, customer, deduction plan             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN TRANSACTION                                                     │
//! │    total_before = Σ quantity (customer, package)   ← same snapshot     │
//! │    split       = free/paid threshold crossing                         │
//! │    refill row  + cap/label deductions                                  │
//! │    overpayment refund (+, offline only), credit applied (−)            │
//! │  COMMIT                                                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SMS (online refills with a customer; failures never roll back)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use hamu_core::{
    loyalty_status, offline_overpayment, split_refill, validate_agent_name, validate_quantity,
    CoreError, CreditEntry, Customer, Money, PaymentMode, Refill, RefillSplit,
    CREDIT_USED_ACTOR, OFFLINE_SYNC_ACTOR,
};
use hamu_db::Database;

use crate::error::{ServiceError, ServiceResult};
use crate::reconcile::ReconciliationEngine;
use crate::sms::SmsNotifier;

/// Input for creating a refill.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRefill {
    pub shop_id: String,
    /// Walk-in refills pass None and get no loyalty tracking.
    pub customer_id: Option<String>,
    pub package_id: String,
    pub quantity: i64,
    pub payment_mode: PaymentMode,
    /// Offline-synced refills carry the cost the device charged, which
    /// is authoritative; online refills pass None and pay price × paid
    /// quantity.
    pub cost_cents: Option<i64>,
    /// Credit balance applied toward this refill. Posted as a negative
    /// credit entry against the customer.
    pub credit_applied_cents: i64,
    /// Offline-synced refills carry the device-side timestamp.
    pub created_at: Option<DateTime<Utc>>,
    pub agent_name: String,
    /// Idempotency key for offline sync; None for online refills.
    pub client_id: Option<String>,
}

/// Service for refill transactions.
#[derive(Clone)]
pub struct RefillService {
    db: Database,
    engine: ReconciliationEngine,
    sms: Arc<dyn SmsNotifier>,
}

impl RefillService {
    /// Creates a new refill service.
    pub fn new(db: Database, sms: Arc<dyn SmsNotifier>) -> Self {
        let engine = ReconciliationEngine::new(db.clone());
        RefillService { db, engine, sms }
    }

    /// Creates a refill.
    #[instrument(skip(self, input), fields(shop_id = %input.shop_id, package_id = %input.package_id))]
    pub async fn create_refill(&self, input: CreateRefill) -> ServiceResult<Refill> {
        // Idempotency gate
        if let Some(client_id) = &input.client_id {
            if let Some(existing) = self.db.refills().find_by_client_id(client_id).await? {
                info!(
                    refill_id = %existing.id,
                    %client_id,
                    "Duplicate sync; returning existing refill"
                );
                return Ok(existing);
            }
        }

        validate_quantity(input.quantity)?;
        validate_agent_name(&input.agent_name)?;

        let shop = self
            .db
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
        let customer = match &input.customer_id {
            Some(id) => Some(
                self.db
                    .customers()
                    .get_by_id(id)
                    .await?
                    .ok_or_else(|| ServiceError::not_found("Customer", id))?,
            ),
            None => None,
        };

        let now = Utc::now();
        let created_at = input.created_at.unwrap_or(now);

        // Plan deductions on pool reads before the write transaction
        let deductions = match self
            .engine
            .plan_for_refill(&package, input.quantity, &input.agent_name, now)
            .await
        {
            Ok(plan) => plan,
            Err(ServiceError::Core(err @ CoreError::MissingStockMapping { .. })) => {
                warn!(%err, "Stock not deducted for refill; continuing");
                Vec::new()
            }
            Err(other) => return Err(other),
        };

        let mut tx = self.db.pool().begin().await?;

        // Free/paid split, from the cumulative package quantity as of
        // this transaction's snapshot
        let split = match &customer {
            Some(customer) if shop.loyalty_enabled() => {
                let total_before = self
                    .db
                    .refills()
                    .total_quantity_for_package_in(&mut tx, &customer.id, &package.id)
                    .await?;
                split_refill(total_before, input.quantity, shop.free_refill_interval)
            }
            _ => RefillSplit::all_paid(input.quantity),
        };

        let cost_cents = match input.cost_cents {
            // Offline device cost is authoritative, never recalculated
            Some(cost) => cost,
            None => package
                .price()
                .multiply_quantity(split.paid_quantity)
                .cents(),
        };

        let refill = Refill {
            id: Uuid::new_v4().to_string(),
            shop_id: input.shop_id.clone(),
            customer_id: customer.as_ref().map(|c| c.id.clone()),
            package_id: package.id.clone(),
            quantity: input.quantity,
            payment_mode: input.payment_mode,
            cost_cents,
            is_free: split.is_free,
            is_partially_free: split.is_partially_free,
            free_quantity: split.free_quantity,
            paid_quantity: split.paid_quantity,
            loyalty_refill_count: split.loyalty_refill_count(),
            created_at,
            agent_name: input.agent_name.trim().to_string(),
            client_id: input.client_id.clone(),
        };
        self.db.refills().insert(&mut tx, &refill).await?;

        for entry in &deductions {
            self.db.stock().append_log(&mut tx, entry).await?;
        }

        if let Some(customer) = &customer {
            // Overpayment refunds only apply to offline-synced refills:
            // online cost is derived from the split in the first place
            if input.client_id.is_some() {
                if let Some(refund) = offline_overpayment(
                    Money::from_cents(cost_cents),
                    package.price(),
                    split.paid_quantity,
                ) {
                    info!(
                        customer_id = %customer.id,
                        refund = refund.cents(),
                        "Offline refill overpaid; posting refund credit"
                    );
                    self.db
                        .credits()
                        .insert(
                            &mut tx,
                            &credit_adjustment(
                                &refill,
                                customer,
                                refund.cents(),
                                OFFLINE_SYNC_ACTOR,
                                now,
                            ),
                        )
                        .await?;
                }
            }

            // Applied credit balance is consumed whether the refill came
            // from a device sync or was entered directly
            if input.credit_applied_cents > 0 {
                self.db
                    .credits()
                    .insert(
                        &mut tx,
                        &credit_adjustment(
                            &refill,
                            customer,
                            -input.credit_applied_cents,
                            CREDIT_USED_ACTOR,
                            now,
                        ),
                    )
                    .await?;
            }
        }

        tx.commit().await?;

        info!(
            refill_id = %refill.id,
            free = refill.free_quantity,
            paid = refill.paid_quantity,
            cost = refill.cost_cents,
            "Refill created"
        );

        // Fire-and-forget: notification failures never affect the
        // committed refill
        if input.client_id.is_none() {
            if let Some(customer) = &customer {
                if let Err(err) = self.notify(customer, &split, shop.free_refill_interval).await {
                    warn!(%err, customer_id = %customer.id, "Loyalty notification failed");
                }
            }
        }

        Ok(refill)
    }

    /// Sends the post-refill loyalty notification, if any applies.
    async fn notify(
        &self,
        customer: &Customer,
        split: &RefillSplit,
        interval: i64,
    ) -> ServiceResult<()> {
        if split.free_quantity > 0 {
            self.sms.send_free_refill_thanks(
                &customer.phone_number,
                &customer.names,
                split.free_quantity,
            );
            return Ok(());
        }

        let history = self.db.refills().list_for_customer(&customer.id).await?;
        if loyalty_status(&history, interval).refills_until_free == 1 {
            self.sms
                .send_almost_free_reminder(&customer.phone_number, &customer.names);
        }

        Ok(())
    }

    /// A customer's refill history, in chronological order.
    pub async fn list_for_customer(&self, customer_id: &str) -> ServiceResult<Vec<Refill>> {
        Ok(self.db.refills().list_for_customer(customer_id).await?)
    }
}

// Synthetic entries post as CASH at processing time, not with the
// refill's payment mode or device timestamp.
fn credit_adjustment(
    refill: &Refill,
    customer: &Customer,
    amount_cents: i64,
    actor: &str,
    posted_at: DateTime<Utc>,
) -> CreditEntry {
    CreditEntry {
        id: Uuid::new_v4().to_string(),
        shop_id: refill.shop_id.clone(),
        customer_id: customer.id.clone(),
        money_paid_cents: amount_cents,
        payment_mode: PaymentMode::Cash,
        payment_date: posted_at,
        agent_name: actor.to_string(),
        client_id: None,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sms::NoopSms;
    use hamu_core::{Package, SaleType, Shop, StockItem, StockItemType};
    use hamu_db::DbConfig;

    const PRICE: i64 = 5000;

    async fn seeded(interval: i64) -> (Database, RefillService) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.shops()
            .insert(&Shop {
                id: "shop-1".to_string(),
                shop_name: "Hamu Waters".to_string(),
                free_refill_interval: interval,
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
                price_cents: PRICE,
                sale_type: SaleType::Refill,
                description: None,
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

        for (id, name, item_type) in [
            ("cap1", "Bottle caps", StockItemType::Cap),
            ("lab1", "Brand labels", StockItemType::Label),
        ] {
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
                        quantity_change: 1000,
                        notes: "Opening stock".to_string(),
                        actor_name: "Seed".to_string(),
                        logged_at: Utc::now(),
                    },
                )
                .await
                .unwrap();
            tx.commit().await.unwrap();
        }

        let svc = RefillService::new(db.clone(), Arc::new(NoopSms));
        (db, svc)
    }

    fn refill_input(quantity: i64, client_id: Option<&str>) -> CreateRefill {
        CreateRefill {
            shop_id: "shop-1".to_string(),
            customer_id: Some("c1".to_string()),
            package_id: "p1".to_string(),
            quantity,
            payment_mode: PaymentMode::Cash,
            cost_cents: None,
            credit_applied_cents: 0,
            created_at: None,
            agent_name: "Jane Agent".to_string(),
            client_id: client_id.map(String::from),
        }
    }

    #[tokio::test]
    async fn test_plain_refill_all_paid() {
        let (db, svc) = seeded(10).await;

        let refill = svc.create_refill(refill_input(2, None)).await.unwrap();

        assert_eq!(refill.free_quantity, 0);
        assert_eq!(refill.paid_quantity, 2);
        assert_eq!(refill.cost_cents, 2 * PRICE);
        assert!(!refill.is_free);

        // Cap and label each deducted by the quantity
        assert_eq!(db.stock().current_level("cap1").await.unwrap(), 998);
        assert_eq!(db.stock().current_level("lab1").await.unwrap(), 998);

        // No credit applied, no overpayment: nothing posted
        assert!(db.credits().list_for_customer("c1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_tenth_unit_is_free() {
        let (_db, svc) = seeded(10).await;

        for _ in 0..9 {
            svc.create_refill(refill_input(1, None)).await.unwrap();
        }
        let tenth = svc.create_refill(refill_input(1, None)).await.unwrap();

        assert!(tenth.is_free);
        assert_eq!(tenth.free_quantity, 1);
        assert_eq!(tenth.paid_quantity, 0);
        assert_eq!(tenth.cost_cents, 0);
    }

    #[tokio::test]
    async fn test_partially_free_refill() {
        let (_db, svc) = seeded(10).await;

        svc.create_refill(refill_input(8, None)).await.unwrap();
        let second = svc.create_refill(refill_input(3, None)).await.unwrap();

        assert!(second.is_partially_free);
        assert!(!second.is_free);
        assert_eq!(second.free_quantity, 1);
        assert_eq!(second.paid_quantity, 2);
        assert_eq!(second.cost_cents, 2 * PRICE);
    }

    #[tokio::test]
    async fn test_walk_in_gets_no_loyalty() {
        let (_db, svc) = seeded(10).await;

        let mut input = refill_input(10, None);
        input.customer_id = None;
        let refill = svc.create_refill(input).await.unwrap();

        assert_eq!(refill.free_quantity, 0);
        assert_eq!(refill.paid_quantity, 10);
    }

    #[tokio::test]
    async fn test_loyalty_disabled_shop() {
        let (_db, svc) = seeded(0).await;

        for _ in 0..12 {
            let refill = svc.create_refill(refill_input(1, None)).await.unwrap();
            assert_eq!(refill.free_quantity, 0);
        }
    }

    #[tokio::test]
    async fn test_idempotency_gate_returns_existing() {
        let (db, svc) = seeded(10).await;

        let first = svc.create_refill(refill_input(1, Some("dev-1"))).await.unwrap();
        let second = svc.create_refill(refill_input(1, Some("dev-1"))).await.unwrap();

        assert_eq!(first.id, second.id);
        // Replay deducted nothing further
        assert_eq!(db.stock().current_level("cap1").await.unwrap(), 999);
    }

    #[tokio::test]
    async fn test_offline_overpayment_posts_refund() {
        let (db, svc) = seeded(10).await;

        // Bring the customer to 9 cumulative units
        for _ in 0..9 {
            svc.create_refill(refill_input(1, None)).await.unwrap();
        }

        // Offline device didn't know the 10th was free and charged full
        // price
        let mut input = refill_input(1, Some("dev-1"));
        input.cost_cents = Some(PRICE);
        let refill = svc.create_refill(input).await.unwrap();

        // Charged cost stays as recorded
        assert_eq!(refill.cost_cents, PRICE);
        assert!(refill.is_free);

        // But the overpayment came back as credit, posted as a CASH
        // adjustment at sync time
        let entries = db.credits().list_for_customer("c1").await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].money_paid_cents, PRICE);
        assert_eq!(entries[0].agent_name, OFFLINE_SYNC_ACTOR);
        assert_eq!(entries[0].payment_mode, PaymentMode::Cash);
    }

    #[tokio::test]
    async fn test_credit_applied_posts_negative_entry() {
        let (db, svc) = seeded(10).await;

        let device_time = Utc::now() - chrono::Duration::days(3);
        let mut input = refill_input(2, Some("dev-2"));
        input.payment_mode = PaymentMode::Mpesa;
        input.cost_cents = Some(2 * PRICE);
        input.credit_applied_cents = 4000;
        input.created_at = Some(device_time);
        svc.create_refill(input).await.unwrap();

        let entries = db.credits().list_for_customer("c1").await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].money_paid_cents, -4000);
        assert_eq!(entries[0].agent_name, CREDIT_USED_ACTOR);

        // Adjustment posts as CASH at sync time, not with the refill's
        // mode or device timestamp
        assert_eq!(entries[0].payment_mode, PaymentMode::Cash);
        assert!(entries[0].payment_date > device_time);
    }

    #[tokio::test]
    async fn test_online_credit_applied_posts_entry() {
        let (db, svc) = seeded(10).await;

        // Agent applies the customer's credit balance at the counter
        let mut input = refill_input(1, None);
        input.credit_applied_cents = 4000;
        svc.create_refill(input).await.unwrap();

        let entries = db.credits().list_for_customer("c1").await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].money_paid_cents, -4000);
        assert_eq!(entries[0].agent_name, CREDIT_USED_ACTOR);
    }

    #[tokio::test]
    async fn test_unknown_customer_rejected() {
        let (_db, svc) = seeded(10).await;

        let mut input = refill_input(1, None);
        input.customer_id = Some("ghost".to_string());

        assert!(matches!(
            svc.create_refill(input).await.unwrap_err(),
            ServiceError::NotFound { .. }
        ));
    }
}
