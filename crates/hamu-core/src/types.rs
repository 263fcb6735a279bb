//! # Domain Types
//!
//! Core domain types used throughout Hamu POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Reference entities (mutable, shop-owned)                              │
//! │  ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐                   │
//! │  │   Shop   │ │ Customer │ │ Package  │ │StockItem │                   │
//! │  └──────────┘ └──────────┘ └──────────┘ └──────────┘                   │
//! │                                                                         │
//! │  Event rows (immutable once committed)                                 │
//! │  ┌──────────┐ ┌──────────┐ ┌───────────┐ ┌─────────────┐              │
//! │  │   Sale   │ │  Refill  │ │CreditEntry│ │StockLogEntry│              │
//! │  └──────────┘ └──────────┘ └───────────┘ └─────────────┘              │
//! │  ┌──────────┐ ┌────────────┐                                          │
//! │  │ Expense  │ │MeterReading│                                          │
//! │  └──────────┘ └────────────┘                                          │
//! │                                                                         │
//! │  Current values (stock level, loyalty points, credit balance) are      │
//! │  NEVER stored on an entity - always derived from the event rows.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - `client_id` (event rows): optional client-assigned idempotency key
//!   for offline sync deduplication

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Payment Mode
// =============================================================================

/// How a transaction was paid.
///
/// `Credit` transactions accrue debt that the credit reconciler derives
/// from history; they are the only mode the credit model sums as "owed".
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentMode {
    /// Physical cash payment.
    Cash,
    /// Mobile money payment.
    Mpesa,
    /// Deferred payment - accrues customer debt.
    Credit,
}

// =============================================================================
// Sale Type
// =============================================================================

/// Whether a package is sold as a new bottle/bundle or as a refill of the
/// customer's own container.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaleType {
    /// New bottle or bundle leaves the shop.
    Sale,
    /// Water only - customer brings their container.
    Refill,
}

// =============================================================================
// Stock Item Type
// =============================================================================

/// Category of an inventory SKU, used by the reconciliation engine to
/// resolve which items a sale or refill consumes.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockItemType {
    /// Empty bottles (consumed by bottle sales).
    Bottle,
    /// Bottle caps (consumed by refills).
    Cap,
    /// Brand labels (consumed by sales and refills).
    Label,
    /// Pre-packed water bundles (consumed by bundle sales).
    Bundle,
    /// Anything else tracked manually.
    Other,
}

// =============================================================================
// Adjustment Kind
// =============================================================================

/// Manual stock adjustment intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustmentKind {
    /// Append +magnitude.
    Add,
    /// Append -magnitude; rejected if the level would go negative.
    Subtract,
    /// Append (magnitude - current level) so the level becomes exactly
    /// the magnitude.
    Set,
}

// =============================================================================
// Shop
// =============================================================================

/// The tenant boundary. Every record in the system is owned by a shop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Shop {
    pub id: String,
    pub shop_name: String,
    /// Paid refill units required before one is granted free.
    /// `<= 0` disables loyalty for the shop.
    pub free_refill_interval: i64,
    pub created_at: DateTime<Utc>,
}

impl Shop {
    /// Whether the loyalty program is active for this shop.
    #[inline]
    pub fn loyalty_enabled(&self) -> bool {
        self.free_refill_interval > 0
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A buyer. Holds no mutable running totals - loyalty points, free-refill
/// count, credit balance and activity status are all derived on read from
/// Sale/Refill/CreditEntry history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Customer {
    pub id: String,
    pub shop_id: String,
    pub names: String,
    pub phone_number: String,
    pub apartment_name: Option<String>,
    pub room_number: Option<String>,
    pub date_registered: DateTime<Utc>,
    /// Idempotency key for customers registered offline.
    pub client_id: Option<String>,
}

// =============================================================================
// Activity Status
// =============================================================================

/// Customer activity bucket derived from the most recent refill date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityStatus {
    /// Registered within the last 30 days, no refills yet.
    New,
    /// Last refill within 30 days.
    VeryActive,
    /// Last refill within 60 days.
    Active,
    /// Last refill within 90 days.
    Irregular,
    /// No refill in over 90 days (or never, and not new).
    Inactive,
}

impl ActivityStatus {
    /// Derives the status from the last refill date and registration
    /// date, relative to `now`.
    pub fn derive(
        last_refill: Option<DateTime<Utc>>,
        date_registered: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        match last_refill {
            None => {
                if (now - date_registered).num_days() <= 30 {
                    ActivityStatus::New
                } else {
                    ActivityStatus::Inactive
                }
            }
            Some(last) => {
                let days = (now - last).num_days();
                if days <= 30 {
                    ActivityStatus::VeryActive
                } else if days <= 60 {
                    ActivityStatus::Active
                } else if days <= 90 {
                    ActivityStatus::Irregular
                } else {
                    ActivityStatus::Inactive
                }
            }
        }
    }
}

// =============================================================================
// Package
// =============================================================================

/// A sellable unit definition - immutable reference data per shop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Package {
    pub id: String,
    pub shop_id: String,
    /// Water volume label, e.g. "18" for an 18L bottle.
    pub water_amount_label: String,
    /// Bottle type for bottled packages; None for bulk/refill-only
    /// packages.
    pub bottle_type: Option<String>,
    pub price_cents: i64,
    pub sale_type: SaleType,
    pub description: Option<String>,
}

impl Package {
    /// Returns the unit price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// Stock Item
// =============================================================================

/// An inventory SKU within a shop.
///
/// ## No Stored Quantity
/// The current level is a derived value: the sum of all
/// [`StockLogEntry::quantity_change`] rows for this item. This entity
/// never carries mutable quantity state, so it can never drift from the
/// ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockItem {
    pub id: String,
    pub shop_id: String,
    pub name: String,
    pub item_type: StockItemType,
    /// Low-stock alert level.
    pub threshold: i64,
    /// Level at which a reorder should be placed.
    pub reorder_point: i64,
}

// =============================================================================
// Stock Log Entry
// =============================================================================

/// An immutable, append-only ledger row.
///
/// Entries are never updated or deleted - corrections are new
/// compensating entries. Current level = sum of `quantity_change`,
/// which is order-independent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockLogEntry {
    pub id: String,
    pub stock_item_id: String,
    pub shop_id: String,
    /// Signed delta: positive = addition, negative = removal.
    pub quantity_change: i64,
    pub notes: String,
    pub actor_name: String,
    /// Retained for audit/history; the level derivation does not depend
    /// on order.
    pub logged_at: DateTime<Utc>,
}

// =============================================================================
// Sale
// =============================================================================

/// A bottle/bundle sale transaction. Immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: String,
    pub shop_id: String,
    /// Walk-in sales have no customer.
    pub customer_id: Option<String>,
    pub package_id: String,
    pub quantity: i64,
    pub payment_mode: PaymentMode,
    pub cost_cents: i64,
    pub sold_at: DateTime<Utc>,
    pub agent_name: String,
    /// Idempotency key assigned by the recording device when offline.
    pub client_id: Option<String>,
}

impl Sale {
    /// Returns the charged cost as Money.
    #[inline]
    pub fn cost(&self) -> Money {
        Money::from_cents(self.cost_cents)
    }
}

// =============================================================================
// Refill
// =============================================================================

/// A refill transaction, richer than [`Sale`] because of loyalty
/// tracking.
///
/// ## Invariants
/// - `free_quantity + paid_quantity == quantity`
/// - `loyalty_refill_count == paid_quantity` (only paid units accrue
///   loyalty credit)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Refill {
    pub id: String,
    pub shop_id: String,
    pub customer_id: Option<String>,
    pub package_id: String,
    pub quantity: i64,
    pub payment_mode: PaymentMode,
    /// The amount actually charged. For offline-synced refills this is
    /// fixed by the recording device and never recalculated.
    pub cost_cents: i64,
    /// Entirely free (every unit granted by loyalty).
    pub is_free: bool,
    /// Some but not all units granted by loyalty. Display metadata only;
    /// the canonical free predicate is `is_free`.
    pub is_partially_free: bool,
    pub free_quantity: i64,
    pub paid_quantity: i64,
    /// The portion of this transaction's quantity counting toward the
    /// loyalty interval. Always equals `paid_quantity`.
    pub loyalty_refill_count: i64,
    pub created_at: DateTime<Utc>,
    pub agent_name: String,
    pub client_id: Option<String>,
}

impl Refill {
    /// Returns the charged cost as Money.
    #[inline]
    pub fn cost(&self) -> Money {
        Money::from_cents(self.cost_cents)
    }
}

// =============================================================================
// Credit Entry
// =============================================================================

/// A credit-ledger row. Represents both genuine repayments against
/// CREDIT-mode debt and synthetic adjustments posted by the
/// reconciliation engine.
///
/// ## Sign Convention (load-bearing)
/// - positive `money_paid_cents`: reduces outstanding debt / increases
///   usable balance (repayments, offline-overpayment refunds)
/// - negative `money_paid_cents`: consumes usable balance (credit
///   applied toward a refill)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CreditEntry {
    pub id: String,
    pub shop_id: String,
    pub customer_id: String,
    pub money_paid_cents: i64,
    pub payment_mode: PaymentMode,
    pub payment_date: DateTime<Utc>,
    /// Synthetic entries carry the fixed short tags "OfflineSync" and
    /// "CreditUsed".
    pub agent_name: String,
    pub client_id: Option<String>,
}

impl CreditEntry {
    /// Returns the signed amount as Money.
    #[inline]
    pub fn money_paid(&self) -> Money {
        Money::from_cents(self.money_paid_cents)
    }
}

// =============================================================================
// Expense
// =============================================================================

/// A shop expense recorded by an agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Expense {
    pub id: String,
    pub shop_id: String,
    pub description: String,
    pub cost_cents: i64,
    pub agent_name: String,
    pub created_at: DateTime<Utc>,
    pub client_id: Option<String>,
}

// =============================================================================
// Meter Reading
// =============================================================================

/// A water meter reading recorded at the shop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct MeterReading {
    pub id: String,
    pub shop_id: String,
    pub agent_name: String,
    pub value: i64,
    pub reading_type: String,
    pub reading_date: DateTime<Utc>,
    pub client_id: Option<String>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_loyalty_enabled() {
        let mut shop = Shop {
            id: "s1".to_string(),
            shop_name: "Hamu Waters".to_string(),
            free_refill_interval: 10,
            created_at: Utc::now(),
        };
        assert!(shop.loyalty_enabled());

        shop.free_refill_interval = 0;
        assert!(!shop.loyalty_enabled());
    }

    #[test]
    fn test_activity_status_buckets() {
        let now = Utc::now();
        let registered = now - Duration::days(400);

        assert_eq!(
            ActivityStatus::derive(Some(now - Duration::days(5)), registered, now),
            ActivityStatus::VeryActive
        );
        assert_eq!(
            ActivityStatus::derive(Some(now - Duration::days(45)), registered, now),
            ActivityStatus::Active
        );
        assert_eq!(
            ActivityStatus::derive(Some(now - Duration::days(75)), registered, now),
            ActivityStatus::Irregular
        );
        assert_eq!(
            ActivityStatus::derive(Some(now - Duration::days(120)), registered, now),
            ActivityStatus::Inactive
        );
    }

    #[test]
    fn test_activity_status_no_refills() {
        let now = Utc::now();
        assert_eq!(
            ActivityStatus::derive(None, now - Duration::days(10), now),
            ActivityStatus::New
        );
        assert_eq!(
            ActivityStatus::derive(None, now - Duration::days(90), now),
            ActivityStatus::Inactive
        );
    }
}
