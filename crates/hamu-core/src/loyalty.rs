//! # Loyalty / Free-Refill Calculator
//!
//! Derives a customer's loyalty position purely from refill history plus
//! the shop's `free_refill_interval`. Nothing here is stored - every
//! figure is recomputed from the log on demand.
//!
//! ## The Two Calculations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. STATUS (read path)                                                  │
//! │     refill history ──► points, refills-until-free, redeemed count      │
//! │                                                                         │
//! │  2. SPLIT (write path)                                                  │
//! │     cumulative package quantity before + new quantity                   │
//! │         ──► how many units of THIS refill are free vs paid              │
//! │                                                                         │
//! │  The split operates on cumulative package quantity crossing interval   │
//! │  thresholds, NOT on refill-row counts: a refill of quantity 3 moves    │
//! │  the customer 3 units along the interval.                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Canonical Free Predicate
//! A refill is "free" for loyalty purposes iff `is_free` is true.
//! Partially-free refills count their paid units through
//! `loyalty_refill_count` and do not reset the window.

use serde::{Deserialize, Serialize};

use crate::types::Refill;

// =============================================================================
// Loyalty Status
// =============================================================================

/// A customer's derived loyalty position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoyaltyStatus {
    /// Paid units accrued toward the next free refill.
    pub current_points: i64,
    /// Paid units still needed before the next free refill.
    pub refills_until_free: i64,
    /// Total free refills granted so far.
    pub free_refills_redeemed: i64,
}

impl LoyaltyStatus {
    /// Loyalty disabled (interval <= 0): everything reads as zero.
    pub const fn disabled() -> Self {
        LoyaltyStatus {
            current_points: 0,
            refills_until_free: 0,
            free_refills_redeemed: 0,
        }
    }
}

// =============================================================================
// Refill Split
// =============================================================================

/// The free/paid split for one incoming refill.
///
/// Invariant: `free_quantity + paid_quantity == quantity` and the
/// refill's `loyalty_refill_count` is always `paid_quantity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefillSplit {
    pub free_quantity: i64,
    pub paid_quantity: i64,
    pub is_free: bool,
    pub is_partially_free: bool,
}

impl RefillSplit {
    /// A split with no free units (loyalty disabled or anonymous
    /// customer).
    pub const fn all_paid(quantity: i64) -> Self {
        RefillSplit {
            free_quantity: 0,
            paid_quantity: quantity,
            is_free: false,
            is_partially_free: false,
        }
    }

    /// The loyalty accrual for this split. Only paid units count.
    #[inline]
    pub const fn loyalty_refill_count(&self) -> i64 {
        self.paid_quantity
    }
}

// =============================================================================
// Accrual Window
// =============================================================================

/// Sums `loyalty_refill_count` over the customer's non-free refills
/// strictly after their most recent free refill (or over all non-free
/// refills when no free refill exists).
///
/// `refills` is the customer's full refill history in any order.
pub fn accrued_since_last_free(refills: &[Refill]) -> i64 {
    let last_free = refills
        .iter()
        .filter(|r| r.is_free)
        .map(|r| r.created_at)
        .max();

    refills
        .iter()
        .filter(|r| !r.is_free)
        .filter(|r| match last_free {
            Some(cutoff) => r.created_at > cutoff,
            None => true,
        })
        .map(|r| r.loyalty_refill_count)
        .sum()
}

// =============================================================================
// Status Derivation
// =============================================================================

/// Derives the customer's loyalty status from their refill history.
///
/// ## Algorithm
/// - `accrued` = sum of `loyalty_refill_count` over the window since the
///   last free refill
/// - `redeemed` = max(count of `is_free` refills, accrued / interval) -
///   the max guards against undercounting when free refills were granted
///   by a path that didn't maintain `loyalty_refill_count` consistently
/// - `current_points` = (accrued - redeemed) mod interval
/// - `refills_until_free` = interval - current_points when points > 0,
///   else a full interval
///
/// ## Edge Case
/// `interval <= 0` disables loyalty: every figure is zero, and no
/// division happens.
pub fn loyalty_status(refills: &[Refill], interval: i64) -> LoyaltyStatus {
    if interval <= 0 {
        return LoyaltyStatus::disabled();
    }

    let accrued = accrued_since_last_free(refills);
    let granted_free = refills.iter().filter(|r| r.is_free).count() as i64;
    let free_refills_redeemed = granted_free.max(accrued / interval);

    let current_points = (accrued - free_refills_redeemed).rem_euclid(interval);
    let refills_until_free = if current_points > 0 {
        interval - current_points
    } else {
        interval
    };

    LoyaltyStatus {
        current_points,
        refills_until_free,
        free_refills_redeemed,
    }
}

/// Whether the customer's next refill unit would be granted free.
pub fn is_next_refill_free(refills: &[Refill], interval: i64) -> bool {
    if interval <= 0 {
        return false;
    }
    accrued_since_last_free(refills) >= interval
}

// =============================================================================
// Split Derivation
// =============================================================================

/// Computes the free/paid split for an incoming refill from the
/// customer's cumulative quantity for the same package.
///
/// ## Threshold Crossing
/// ```text
/// interval = 10, total_before = 9, quantity = 1
///     thresholds before: 9 / 10 = 0
///     thresholds after: 10 / 10 = 1
///     free = min(1 - 0, 1) = 1  →  the 10th unit is free
/// ```
///
/// A quantity large enough to cross several thresholds earns several
/// free units, but never more than the quantity itself.
pub fn split_refill(total_quantity_before: i64, quantity: i64, interval: i64) -> RefillSplit {
    if interval <= 0 || quantity <= 0 {
        return RefillSplit::all_paid(quantity.max(0));
    }

    let total_after = total_quantity_before + quantity;
    let thresholds_before = total_quantity_before / interval;
    let thresholds_after = total_after / interval;

    let free_quantity = (thresholds_after - thresholds_before).min(quantity).max(0);
    let paid_quantity = quantity - free_quantity;

    RefillSplit {
        free_quantity,
        paid_quantity,
        is_free: free_quantity > 0 && paid_quantity == 0,
        is_partially_free: free_quantity > 0 && paid_quantity > 0,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
