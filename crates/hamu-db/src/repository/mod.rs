//! # Repository Module
//!
//! Database repository implementations for Hamu POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  Service operation                                                     │
//! │       │                                                                 │
//! │       │  db.refills().total_quantity_for_package(cust, pkg)            │
//! │       │  ↓                                                              │
//! │       ▼                                                                 │
//! │  RefillRepository                                                      │
//! │  ├── insert(&self, conn, refill)        ← transaction-joining write   │
//! │  ├── find_by_client_id(&self, key)      ← idempotency gate lookup     │
//! │  ├── list_for_customer(&self, id)                                     │
//! │  └── total_quantity_for_package(...)    ← cumulative loyalty input    │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Benefits:                                                              │
//! │  • SQL is isolated in one place                                        │
//! │  • Ledger sums live next to the tables they fold                       │
//! │  • Transaction composition stays in the service tier                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`shop::ShopRepository`] - Tenant records
//! - [`customer::CustomerRepository`] - Customer reference data
//! - [`package::PackageRepository`] - Sellable unit definitions
//! - [`stock::StockRepository`] - Stock items and the append-only ledger
//! - [`sale::SaleRepository`] - Bottle/bundle sale events
//! - [`refill::RefillRepository`] - Refill events with loyalty columns
//! - [`credit::CreditRepository`] - Signed credit-ledger entries
//! - [`records::ExpenseRepository`] / [`records::MeterReadingRepository`]
//!   - Other offline-syncable records

pub mod credit;
pub mod customer;
pub mod package;
pub mod records;
pub mod refill;
pub mod sale;
pub mod shop;
pub mod stock;
