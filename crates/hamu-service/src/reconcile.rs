//! # Inventory Reconciliation Engine
//!
//! Maps each sale or refill to the stock items it physically consumes
//! and plans the negative ledger entries for them.
//!
//! ## Consumption Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Sale of a bottled package (bottle_type set)                           │
//! │    → Bottle item whose name contains the bottle type   × quantity     │
//! │    → Label item                                        × quantity     │
//! │                                                                         │
//! │  Sale of a bundle package (no bottle_type)                             │
//! │    → Bundle item whose name contains the water label   × quantity     │
//! │                                                                         │
//! │  Refill (customer's own container)                                     │
//! │    → Cap item                                          × quantity     │
//! │    → Label item                                        × quantity     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Missing Mappings Are Non-Fatal
//! A shop that hasn't defined a cap SKU must still be able to sell
//! water. Planning fails with [`CoreError::MissingStockMapping`]; the
//! calling service logs a warning and commits the transaction without
//! the deduction. The ledger stays consistent - it just doesn't track
//! that consumable for that shop yet.
//!
//! Planning runs on pool reads *before* the caller opens its write
//! transaction, so the plan never holds the transaction open across
//! lookups.

use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use hamu_core::{CoreError, Package, StockItem, StockItemType, StockLogEntry};
use hamu_db::Database;

use crate::error::ServiceResult;

/// Plans stock deductions for sales and refills.
#[derive(Debug, Clone)]
pub struct ReconciliationEngine {
    db: Database,
}

impl ReconciliationEngine {
    /// Creates a new engine over the given database.
    pub fn new(db: Database) -> Self {
        ReconciliationEngine { db }
    }

    /// Plans the deductions a sale consumes.
    ///
    /// Bottled packages consume a bottle (matched by bottle type) and a
    /// label per unit; bundle packages consume a pre-packed bundle
    /// (matched by water amount label) per unit.
    pub async fn plan_for_sale(
        &self,
        package: &Package,
        quantity: i64,
        actor_name: &str,
        now: DateTime<Utc>,
    ) -> ServiceResult<Vec<StockLogEntry>> {
        match &package.bottle_type {
            Some(bottle_type) => {
                let bottle = self
                    .require_item_by_name(package, StockItemType::Bottle, bottle_type)
                    .await?;
                let label = self.require_item(package, StockItemType::Label).await?;

                debug!(
                    package_id = %package.id,
                    bottle = %bottle.name,
                    quantity,
                    "Planned bottled-sale deductions"
                );

                Ok(vec![
                    deduction(&bottle, quantity, "Bottle sale", actor_name, now),
                    deduction(&label, quantity, "Bottle sale", actor_name, now),
                ])
            }
            None => {
                let bundle = self
                    .require_item_by_name(package, StockItemType::Bundle, &package.water_amount_label)
                    .await?;

                debug!(
                    package_id = %package.id,
                    bundle = %bundle.name,
                    quantity,
                    "Planned bundle-sale deduction"
                );

                Ok(vec![deduction(
                    &bundle,
                    quantity,
                    "Bundle sale",
                    actor_name,
                    now,
                )])
            }
        }
    }

    /// Plans the deductions a refill consumes: one cap and one label
    /// per unit.
    pub async fn plan_for_refill(
        &self,
        package: &Package,
        quantity: i64,
        actor_name: &str,
        now: DateTime<Utc>,
    ) -> ServiceResult<Vec<StockLogEntry>> {
        let cap = self.require_item(package, StockItemType::Cap).await?;
        let label = self.require_item(package, StockItemType::Label).await?;

        debug!(package_id = %package.id, quantity, "Planned refill deductions");

        Ok(vec![
            deduction(&cap, quantity, "Refill", actor_name, now),
            deduction(&label, quantity, "Refill", actor_name, now),
        ])
    }

    async fn require_item(
        &self,
        package: &Package,
        item_type: StockItemType,
    ) -> ServiceResult<StockItem> {
        self.db
            .stock()
            .find_by_type(&package.shop_id, item_type)
            .await?
            .ok_or_else(|| {
                CoreError::MissingStockMapping {
                    shop_id: package.shop_id.clone(),
                    needed: format!("{item_type:?}"),
                }
                .into()
            })
    }

    async fn require_item_by_name(
        &self,
        package: &Package,
        item_type: StockItemType,
        needle: &str,
    ) -> ServiceResult<StockItem> {
        self.db
            .stock()
            .find_by_type_and_name(&package.shop_id, item_type, needle)
            .await?
            .ok_or_else(|| {
                CoreError::MissingStockMapping {
                    shop_id: package.shop_id.clone(),
                    needed: format!("{item_type:?} matching '{needle}'"),
                }
                .into()
            })
    }
}

fn deduction(
    item: &StockItem,
    quantity: i64,
    notes: &str,
    actor_name: &str,
    now: DateTime<Utc>,
) -> StockLogEntry {
    StockLogEntry {
        id: Uuid::new_v4().to_string(),
        stock_item_id: item.id.clone(),
        shop_id: item.shop_id.clone(),
        quantity_change: -quantity,
        notes: notes.to_string(),
        actor_name: actor_name.to_string(),
        logged_at: now,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
