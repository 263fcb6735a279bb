//! # Credit Service
//!
//! Records repayments against customer debt and derives the credit
//! position.
//!
//! The "owed" side of the position is never written anywhere - it is
//! the sum of CREDIT-mode sale and refill costs. The "repaid" side is
//! the signed sum of credit-ledger entries. Status is pure arithmetic
//! over the two sums.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use hamu_core::{
    credit_status, validate_agent_name, validate_amount_cents, CreditEntry, CreditStatus, Money,
    PaymentMode,
};
use hamu_db::Database;

use crate::error::{ServiceError, ServiceResult};

/// Input for recording a credit repayment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCreditPayment {
    pub shop_id: String,
    pub customer_id: String,
    /// Amount repaid, in cents. Must be non-negative; synthetic negative
    /// entries are posted only by the refill sync path.
    pub amount_cents: i64,
    pub payment_mode: PaymentMode,
    /// Offline-synced payments carry the device-side timestamp.
    pub payment_date: Option<DateTime<Utc>>,
    pub agent_name: String,
    /// Idempotency key for offline sync.
    pub client_id: Option<String>,
}

/// Service for the credit ledger.
#[derive(Debug, Clone)]
pub struct CreditService {
    db: Database,
}

impl CreditService {
    /// Creates a new credit service.
    pub fn new(db: Database) -> Self {
        CreditService { db }
    }

    /// Records a repayment.
    #[instrument(skip(self, input), fields(customer_id = %input.customer_id))]
    pub async fn record_payment(&self, input: CreateCreditPayment) -> ServiceResult<CreditEntry> {
        // Idempotency gate
        if let Some(client_id) = &input.client_id {
            if let Some(existing) = self.db.credits().find_by_client_id(client_id).await? {
                info!(
                    entry_id = %existing.id,
                    %client_id,
                    "Duplicate sync; returning existing credit entry"
                );
                return Ok(existing);
            }
        }

        validate_amount_cents("amount", input.amount_cents)?;
        validate_agent_name(&input.agent_name)?;

        let customer = self
            .db
            .customers()
            .get_by_id(&input.customer_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Customer", &input.customer_id))?;

        let entry = CreditEntry {
            id: Uuid::new_v4().to_string(),
            shop_id: input.shop_id.clone(),
            customer_id: customer.id.clone(),
            money_paid_cents: input.amount_cents,
            payment_mode: input.payment_mode,
            payment_date: input.payment_date.unwrap_or_else(Utc::now),
            agent_name: input.agent_name.trim().to_string(),
            client_id: input.client_id.clone(),
        };

        let mut tx = self.db.pool().begin().await?;
        self.db.credits().insert(&mut tx, &entry).await?;
        tx.commit().await?;

        info!(entry_id = %entry.id, amount = entry.money_paid_cents, "Credit payment recorded");
        Ok(entry)
    }

    /// Derives a customer's credit position.
    pub async fn status(&self, customer_id: &str) -> ServiceResult<CreditStatus> {
        self.db
            .customers()
            .get_by_id(customer_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Customer", customer_id))?;

        let owed = self.db.sales().total_credit_cost(customer_id).await?
            + self.db.refills().total_credit_cost(customer_id).await?;
        let repaid = self.db.credits().total_paid(customer_id).await?;

        Ok(credit_status(
            Money::from_cents(owed),
            Money::from_cents(repaid),
        ))
    }

    /// A customer's credit-ledger history, newest first.
    pub async fn history(&self, customer_id: &str) -> ServiceResult<Vec<CreditEntry>> {
        Ok(self.db.credits().list_for_customer(customer_id).await?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
