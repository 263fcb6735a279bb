//! # hamu-db: Database Layer for Hamu POS
//!
//! This crate provides database access for the Hamu water-refill POS
//! backend. It uses SQLite for storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Hamu POS Data Flow                               │
//! │                                                                         │
//! │  Service operation (create_refill, adjust_stock, ...)                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     hamu-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │(refill.rs ...)│    │  (embedded)  │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ SqlitePool    │    │ RefillRepo    │    │ 001_init.sql │  │   │
//! │  │   │ Connection    │◄───│ StockRepo     │    │ ...          │  │   │
//! │  │   │ Management    │    │ CreditRepo    │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database (WAL mode, foreign keys on)                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations per aggregate
//!
//! ## Transaction Seam
//!
//! Reads go through the pool. Write methods for event rows (sales,
//! refills, credit entries, stock logs) take `&mut SqliteConnection`
//! so the service tier can compose several writes into one
//! transaction:
//!
//! ```rust,ignore
//! let mut tx = db.pool().begin().await?;
//! db.refills().insert(&mut tx, &refill).await?;
//! db.stock().append_log(&mut tx, &cap_deduction).await?;
//! db.stock().append_log(&mut tx, &label_deduction).await?;
//! tx.commit().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::credit::CreditRepository;
pub use repository::customer::CustomerRepository;
pub use repository::package::PackageRepository;
pub use repository::records::{ExpenseRepository, MeterReadingRepository};
pub use repository::refill::RefillRepository;
pub use repository::sale::SaleRepository;
pub use repository::shop::ShopRepository;
pub use repository::stock::StockRepository;
