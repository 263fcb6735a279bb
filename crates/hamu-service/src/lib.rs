//! # hamu-service: Orchestration Tier for Hamu POS
//!
//! Composes the pure reconciliation logic in hamu-core with the
//! repositories in hamu-db into the transactional operations the
//! backend exposes.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Hamu POS Service Tier                            │
//! │                                                                         │
//! │  caller (HTTP tier, sync endpoint, CLI)                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  hamu-service (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │  SaleService      create_sale (gate → price → deduct)          │   │
//! │  │  RefillService    create_refill (gate → split → deduct →       │   │
//! │  │                   credit adjustments → SMS)                    │   │
//! │  │  StockService     create_item, adjust, stock_levels, history   │   │
//! │  │  CreditService    record_payment, status, history              │   │
//! │  │  CustomerService  create_customer, loyalty, activity           │   │
//! │  │  RecordsService   create_expense, create_meter_reading         │   │
//! │  │                                                                 │   │
//! │  │  ReconciliationEngine  sale/refill → stock deduction plan      │   │
//! │  │  SmsNotifier (trait)   post-commit loyalty notifications       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                               │                                 │
//! │       ▼                               ▼                                 │
//! │  hamu-core (pure math)           hamu-db (SQLite)                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Conventions
//!
//! - Every create operation starts with the client_id idempotency gate:
//!   a replayed offline record returns the existing row unchanged
//! - Multi-row writes (transaction + deductions + credit postings) run
//!   in one SQLite transaction; lookups run on the pool beforehand
//! - Missing stock mappings are logged warnings, never sale/refill
//!   failures

// =============================================================================
// Module Declarations
// =============================================================================

pub mod credit;
pub mod customer;
pub mod error;
pub mod reconcile;
pub mod records;
pub mod refill;
pub mod sale;
pub mod sms;
pub mod stock;

// =============================================================================
// Re-exports
// =============================================================================

pub use credit::{CreateCreditPayment, CreditService};
pub use customer::{CreateCustomer, CustomerService};
pub use error::{ServiceError, ServiceResult};
pub use reconcile::ReconciliationEngine;
pub use records::{CreateExpense, CreateMeterReading, RecordsService};
pub use refill::{CreateRefill, RefillService};
pub use sale::{CreateSale, SaleService};
pub use sms::{NoopSms, SmsNotifier};
pub use stock::{CreateStockItem, StockLevel, StockService};

use std::sync::Arc;

use hamu_db::Database;

/// All services over one database, wired together.
///
/// Convenience for embedders; each service is independently cloneable
/// and cheap to construct if finer wiring is needed.
#[derive(Clone)]
pub struct HamuServices {
    pub sales: SaleService,
    pub refills: RefillService,
    pub stock: StockService,
    pub credits: CreditService,
    pub customers: CustomerService,
    pub records: RecordsService,
}

impl HamuServices {
    /// Wires all services over the given database and SMS transport.
    pub fn new(db: Database, sms: Arc<dyn SmsNotifier>) -> Self {
        HamuServices {
            sales: SaleService::new(db.clone()),
            refills: RefillService::new(db.clone(), sms),
            stock: StockService::new(db.clone()),
            credits: CreditService::new(db.clone()),
            customers: CustomerService::new(db.clone()),
            records: RecordsService::new(db),
        }
    }
}
