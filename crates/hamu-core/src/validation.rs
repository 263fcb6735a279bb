//! # Validation Module
//!
//! Input validation utilities for Hamu POS.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP tier (out of scope here)                                │
//! │  ├── Basic format checks                                               │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Service entry points                                         │
//! │  └── THIS MODULE: business rule validation                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  ├── UNIQUE client_id indexes                                          │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Maximum length of an agent/actor name, matching the storage column.
pub const MAX_AGENT_NAME_LEN: usize = 20;

/// Maximum quantity of a single transaction.
///
/// ## Business Reason
/// Prevents accidental over-recording (e.g. typing 1000 instead of 10).
pub const MAX_QUANTITY: i64 = 999;

/// Validates a transaction quantity.
///
/// ## Rules
/// - Must be positive
/// - Must not exceed [`MAX_QUANTITY`]
pub fn validate_quantity(quantity: i64) -> ValidationResult<()> {
    if quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    if quantity > MAX_QUANTITY {
        return Err(ValidationError::TooLong {
            field: "quantity".to_string(),
            max: MAX_QUANTITY as usize,
        });
    }
    Ok(())
}

/// Validates a monetary amount that must not be negative (costs,
/// repayments).
pub fn validate_amount_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustBeNonNegative {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates an agent/actor name.
///
/// ## Rules
/// - Must not be empty
/// - Must fit the 20-character storage column (the synthetic tags
///   "OfflineSync" and "CreditUsed" were chosen to fit it)
pub fn validate_agent_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "agent_name".to_string(),
        });
    }

    if name.len() > MAX_AGENT_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "agent_name".to_string(),
            max: MAX_AGENT_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates a customer name.
pub fn validate_customer_names(names: &str) -> ValidationResult<()> {
    let names = names.trim();

    if names.is_empty() {
        return Err(ValidationError::Required {
            field: "names".to_string(),
        });
    }

    if names.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "names".to_string(),
            max: 100,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
