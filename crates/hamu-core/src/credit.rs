//! # Credit Balance Reconciler
//!
//! Derives a customer's credit position from immutable history: the
//! CREDIT-mode sales/refills they owe for, and the signed credit-ledger
//! entries posted against them.
//!
//! ## The Sign Convention
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  money_paid > 0   repayment, or overpayment refund from offline sync   │
//! │                   → reduces outstanding / increases usable balance     │
//! │                                                                         │
//! │  money_paid < 0   credit balance consumed toward a new refill          │
//! │                   → reduces usable balance                             │
//! │                                                                         │
//! │  outstanding = max(0, owed - repaid)      (what the customer owes)     │
//! │  balance     = repaid - owed              (signed net position)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Credit Status
// =============================================================================

/// A customer's derived credit position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditStatus {
    /// Total ever taken on credit (sum of CREDIT-mode sale/refill
    /// costs).
    pub total_credit: Money,
    /// Non-negative amount currently owed.
    pub outstanding: Money,
    /// Signed net position: positive = usable credit, negative = debt.
    pub balance: Money,
    /// Percentage of credit repaid, clamped to 0..=100. 100 when the
    /// customer never took credit.
    pub repayment_rate: u8,
}

/// Derives the credit status from the two ledger sums.
///
/// `total_owed` is the sum of `cost` over all CREDIT-mode sales and
/// refills; `total_repaid` is the signed sum of `money_paid` over all
/// credit entries (genuine repayments plus synthetic adjustments).
pub fn credit_status(total_owed: Money, total_repaid: Money) -> CreditStatus {
    let balance = total_repaid - total_owed;
    let outstanding = (total_owed - total_repaid).clamp_non_negative();

    let repayment_rate = if total_owed.is_positive() {
        let rate = (total_repaid.cents() * 100 + total_owed.cents() / 2) / total_owed.cents();
        rate.clamp(0, 100) as u8
    } else {
        100
    };

    CreditStatus {
        total_credit: total_owed,
        outstanding,
        balance,
        repayment_rate,
    }
}

/// The overpayment to refund after an offline-synced refill.
///
/// The charged cost is fixed by the offline device and never rewritten;
/// when it exceeds what the correct paid-quantity split implies, the
/// difference is posted as a positive credit entry instead.
///
/// Returns `None` when nothing was overpaid.
pub fn offline_overpayment(charged: Money, unit_price: Money, paid_quantity: i64) -> Option<Money> {
    let correct_cost = unit_price.multiply_quantity(paid_quantity);
    if charged > correct_cost {
        Some(charged - correct_cost)
    } else {
        None
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outstanding_and_balance() {
        // Owed KES 500, repaid KES 200
        let status = credit_status(Money::from_cents(50000), Money::from_cents(20000));
        assert_eq!(status.outstanding.cents(), 30000);
        assert_eq!(status.balance.cents(), -30000);
        assert_eq!(status.total_credit.cents(), 50000);
        assert_eq!(status.repayment_rate, 40);
    }

    #[test]
    fn test_overpaid_customer_has_positive_balance() {
        let status = credit_status(Money::from_cents(10000), Money::from_cents(15000));
        assert_eq!(status.outstanding.cents(), 0);
        assert_eq!(status.balance.cents(), 5000);
        assert_eq!(status.repayment_rate, 100);
    }

    #[test]
    fn test_no_credit_taken() {
        let status = credit_status(Money::zero(), Money::zero());
        assert_eq!(status.outstanding.cents(), 0);
        assert_eq!(status.balance.cents(), 0);
        assert_eq!(status.repayment_rate, 100);
    }

    #[test]
    fn test_repayment_reduces_outstanding_exactly() {
        // A repayment of K reduces outstanding by K (clamped at 0)
        // and increases balance by K
        let owed = Money::from_cents(40000);
        let before = credit_status(owed, Money::from_cents(10000));
        let after = credit_status(owed, Money::from_cents(10000 + 7000));

        assert_eq!(before.outstanding - after.outstanding, Money::from_cents(7000));
        assert_eq!(after.balance - before.balance, Money::from_cents(7000));
    }

    #[test]
    fn test_negative_entries_consume_balance() {
        // Repaid 100, then consumed 60 of it: net repaid 40
        let status = credit_status(Money::zero(), Money::from_cents(4000));
        assert_eq!(status.balance.cents(), 4000);
        assert_eq!(status.outstanding.cents(), 0);
    }

    #[test]
    fn test_offline_overpayment() {
        // Charged full cost 100 for a unit that should have been free
        let refund = offline_overpayment(Money::from_cents(10000), Money::from_cents(10000), 0);
        assert_eq!(refund, Some(Money::from_cents(10000)));

        // Charged exactly right: nothing to refund
        assert_eq!(
            offline_overpayment(Money::from_cents(10000), Money::from_cents(10000), 1),
            None
        );

        // Undercharged (device-side discount): never clawed back
        assert_eq!(
            offline_overpayment(Money::from_cents(5000), Money::from_cents(10000), 1),
            None
        );
    }
}
