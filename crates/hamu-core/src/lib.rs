//! # hamu-core: Pure Business Logic for Hamu POS
//!
//! This crate is the **heart** of the Hamu water-refill POS backend. It
//! contains the stock/credit/loyalty reconciliation core as pure
//! functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Hamu POS Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              HTTP / sync tier (out of scope)                    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    hamu-service                                 │   │
//! │  │    create_sale, create_refill, adjust_stock, status queries    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ hamu-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │  ledger   │  │  loyalty  │  │  credit   │  │   types   │  │   │
//! │  │   │ fold/sum  │  │split/points│ │ balances  │  │  entities │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    hamu-db (Database Layer)                     │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Shop, Customer, Refill, StockLogEntry, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`ledger`] - Stock-ledger fold and manual-adjustment delta rules
//! - [`loyalty`] - Free-refill split and loyalty status derivation
//! - [`credit`] - Credit balance reconciliation
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Derived, never stored**: stock levels, loyalty points and credit
//!    balances are pure folds over immutable event history
//! 2. **No I/O**: database, network, file system access is FORBIDDEN here
//! 3. **Integer money**: all monetary values are in cents (i64)
//! 4. **Explicit errors**: all errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use hamu_core::loyalty::split_refill;
//!
//! // Customer has bought 9 units of this package; shop grants every
//! // 10th unit free. The incoming single unit crosses the threshold.
//! let split = split_refill(9, 1, 10);
//! assert_eq!(split.free_quantity, 1);
//! assert!(split.is_free);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod credit;
pub mod error;
pub mod ledger;
pub mod loyalty;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use hamu_core::Money` instead of
// `use hamu_core::money::Money`

pub use credit::{credit_status, offline_overpayment, CreditStatus};
pub use error::{CoreError, CoreResult, ValidationError};
pub use ledger::{adjustment_delta, current_level};
pub use loyalty::{
    accrued_since_last_free, is_next_refill_free, loyalty_status, split_refill, LoyaltyStatus,
    RefillSplit,
};
pub use money::Money;
pub use types::*;
pub use validation::{
    validate_agent_name, validate_amount_cents, validate_customer_names, validate_quantity,
};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Actor tag on synthetic credit entries posted when an offline-synced
/// refill overpaid relative to the correct free/paid split.
///
/// ## Why a constant?
/// The tag is part of the credit ledger's audit trail and must fit the
/// 20-character actor column; keeping it in one place keeps postings
/// and queries in agreement.
pub const OFFLINE_SYNC_ACTOR: &str = "OfflineSync";

/// Actor tag on synthetic credit entries posted when a customer applies
/// existing credit balance toward a refill.
pub const CREDIT_USED_ACTOR: &str = "CreditUsed";

/// Fallback agent name when a recording device supplies none.
pub const DEFAULT_AGENT_NAME: &str = "System";
