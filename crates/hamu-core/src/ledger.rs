//! # Stock Ledger Math
//!
//! Pure functions over the append-only stock ledger.
//!
//! ## Derived-State-Instead-Of-Stored-Counters
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  Why The Level Is Never Stored                          │
//! │                                                                         │
//! │  stock_logs:  +100   -3   -3   +50   -1   ...                          │
//! │                 │     │    │     │    │                                 │
//! │                 └─────┴────┴─────┴────┴──► fold: SUM(quantity_change)  │
//! │                                                  = current level        │
//! │                                                                         │
//! │  • A sum is order-independent: sync order does not matter              │
//! │  • Corrections are new compensating entries, never edits               │
//! │  • There is no cached counter to drift or invalidate                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The database layer computes the same fold in SQL
//! (`SUM(quantity_change)`); this module is the reference implementation
//! and the home of the manual-adjustment delta rules.

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::{AdjustmentKind, StockLogEntry};

/// Folds ledger entries into the current stock level.
///
/// Order-independent: any permutation of the same entries produces the
/// same level.
pub fn current_level<'a, I>(entries: I) -> i64
where
    I: IntoIterator<Item = &'a StockLogEntry>,
{
    entries.into_iter().map(|e| e.quantity_change).sum()
}

/// Computes the signed delta to append for a manual adjustment.
///
/// ## Rules
/// - `Add`: delta = +magnitude
/// - `Subtract`: delta = -magnitude; rejected with
///   [`CoreError::InsufficientStock`] if the resulting level would go
///   negative
/// - `Set`: delta = magnitude - current level
///
/// `magnitude` must be positive for Add/Subtract and non-negative for
/// Set.
///
/// ## Example
/// ```rust
/// use hamu_core::ledger::adjustment_delta;
/// use hamu_core::types::AdjustmentKind;
///
/// // Level is 40, set it to 25: append -15
/// let delta = adjustment_delta("caps", 40, AdjustmentKind::Set, 25).unwrap();
/// assert_eq!(delta, -15);
/// ```
pub fn adjustment_delta(
    item_name: &str,
    current: i64,
    kind: AdjustmentKind,
    magnitude: i64,
) -> CoreResult<i64> {
    match kind {
        AdjustmentKind::Add => {
            if magnitude <= 0 {
                return Err(ValidationError::MustBePositive {
                    field: "quantity".to_string(),
                }
                .into());
            }
            Ok(magnitude)
        }
        AdjustmentKind::Subtract => {
            if magnitude <= 0 {
                return Err(ValidationError::MustBePositive {
                    field: "quantity".to_string(),
                }
                .into());
            }
            if current - magnitude < 0 {
                return Err(CoreError::InsufficientStock {
                    item: item_name.to_string(),
                    available: current,
                    requested: magnitude,
                });
            }
            Ok(-magnitude)
        }
        AdjustmentKind::Set => {
            if magnitude < 0 {
                return Err(ValidationError::MustBeNonNegative {
                    field: "quantity".to_string(),
                }
                .into());
            }
            Ok(magnitude - current)
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
