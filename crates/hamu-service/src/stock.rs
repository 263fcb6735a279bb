//! # Stock Service
//!
//! Stock item management, manual adjustments and level queries.
//!
//! ## Manual Adjustment Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  adjust(item, kind, magnitude)                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  acquire adjustment mutex      ← one manual adjustment at a time       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN TRANSACTION                                                     │
//! │    level = SUM(quantity_change)   ← re-derived inside the tx, so a    │
//! │    delta = adjustment_delta(...)    concurrent commit can't slip in   │
//! │    append ledger entry              between check and write           │
//! │  COMMIT                                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Subtract rejections (insufficient stock) write nothing: the failed
//! transaction rolls back and the ledger is untouched.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{info, instrument};
use uuid::Uuid;

use hamu_core::{
    adjustment_delta, validate_agent_name, AdjustmentKind, StockItem, StockItemType,
    StockLogEntry,
};
use hamu_db::Database;

use crate::error::{ServiceError, ServiceResult};

// =============================================================================
// Inputs and Views
// =============================================================================

/// Input for creating a stock item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateStockItem {
    pub shop_id: String,
    pub name: String,
    pub item_type: StockItemType,
    pub threshold: i64,
    pub reorder_point: i64,
    /// Opening quantity; written as the item's first ledger entry.
    pub opening_quantity: i64,
    pub agent_name: String,
}

/// A stock item with its derived level and alert flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockLevel {
    pub item: StockItem,
    /// Derived: sum of the item's ledger entries.
    pub level: i64,
    /// Level at or below the low-stock threshold.
    pub low_stock: bool,
    /// Level at or below the reorder point.
    pub needs_reorder: bool,
}

// =============================================================================
// Stock Service
// =============================================================================

/// Service for stock items and manual ledger adjustments.
#[derive(Debug, Clone)]
pub struct StockService {
    db: Database,
    /// Serializes manual adjustments so a subtract/set check-then-write
    /// can't race another adjustment.
    adjust_lock: Arc<Mutex<()>>,
}

impl StockService {
    /// Creates a new stock service.
    pub fn new(db: Database) -> Self {
        StockService {
            db,
            adjust_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Creates a stock item, with an opening ledger entry when the
    /// opening quantity is positive.
    #[instrument(skip(self, input), fields(shop_id = %input.shop_id, name = %input.name))]
    pub async fn create_item(&self, input: CreateStockItem) -> ServiceResult<StockItem> {
        validate_agent_name(&input.agent_name)?;
        if input.opening_quantity < 0 {
            return Err(hamu_core::ValidationError::MustBeNonNegative {
                field: "opening_quantity".to_string(),
            }
            .into());
        }

        let item = StockItem {
            id: Uuid::new_v4().to_string(),
            shop_id: input.shop_id.clone(),
            name: input.name.clone(),
            item_type: input.item_type,
            threshold: input.threshold,
            reorder_point: input.reorder_point,
        };
        self.db.stock().insert_item(&item).await?;

        if input.opening_quantity > 0 {
            let mut tx = self.db.pool().begin().await?;
            self.db
                .stock()
                .append_log(
                    &mut tx,
                    &StockLogEntry {
                        id: Uuid::new_v4().to_string(),
                        stock_item_id: item.id.clone(),
                        shop_id: item.shop_id.clone(),
                        quantity_change: input.opening_quantity,
                        notes: "Opening stock".to_string(),
                        actor_name: input.agent_name.clone(),
                        logged_at: Utc::now(),
                    },
                )
                .await?;
            tx.commit().await?;
        }

        info!(item_id = %item.id, opening = input.opening_quantity, "Stock item created");
        Ok(item)
    }

    /// Applies a manual adjustment (add / subtract / set) as a new
    /// ledger entry.
    ///
    /// Returns the appended entry. A subtract below zero is rejected
    /// with `InsufficientStock` and writes nothing.
    #[instrument(skip(self, notes))]
    pub async fn adjust(
        &self,
        item_id: &str,
        kind: AdjustmentKind,
        magnitude: i64,
        agent_name: &str,
        notes: &str,
    ) -> ServiceResult<StockLogEntry> {
        validate_agent_name(agent_name)?;

        let item = self
            .db
            .stock()
            .get_item(item_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Stock item", item_id))?;

        // Serialize the check-then-append with other manual adjustments
        let _guard = self.adjust_lock.lock().await;

        let mut tx = self.db.pool().begin().await?;

        let current = self.db.stock().current_level_in(&mut tx, item_id).await?;
        let delta = adjustment_delta(&item.name, current, kind, magnitude)?;

        let entry = StockLogEntry {
            id: Uuid::new_v4().to_string(),
            stock_item_id: item.id.clone(),
            shop_id: item.shop_id.clone(),
            quantity_change: delta,
            notes: notes.to_string(),
            actor_name: agent_name.trim().to_string(),
            logged_at: Utc::now(),
        };
        self.db.stock().append_log(&mut tx, &entry).await?;

        tx.commit().await?;

        info!(
            item = %item.name,
            level_before = current,
            delta,
            "Manual stock adjustment applied"
        );
        Ok(entry)
    }

    /// Derives the current level of one item.
    pub async fn current_level(&self, item_id: &str) -> ServiceResult<i64> {
        // Existence check so a typo'd ID reads as an error, not level 0
        self.db
            .stock()
            .get_item(item_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Stock item", item_id))?;

        Ok(self.db.stock().current_level(item_id).await?)
    }

    /// Lists a shop's items with derived levels and alert flags.
    pub async fn stock_levels(&self, shop_id: &str) -> ServiceResult<Vec<StockLevel>> {
        let items = self.db.stock().list_items(shop_id).await?;

        let mut levels = Vec::with_capacity(items.len());
        for item in items {
            let level = self.db.stock().current_level(&item.id).await?;
            levels.push(StockLevel {
                low_stock: level <= item.threshold,
                needs_reorder: level <= item.reorder_point,
                item,
                level,
            });
        }

        Ok(levels)
    }

    /// Ledger history for one item, newest first.
    pub async fn history(&self, item_id: &str) -> ServiceResult<Vec<StockLogEntry>> {
        Ok(self.db.stock().history_for_item(item_id).await?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
