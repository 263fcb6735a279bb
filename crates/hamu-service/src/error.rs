//! # Service Error Types
//!
//! The error type callers of the service tier see. Domain errors from
//! hamu-core and storage errors from hamu-db converge here.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  hamu-core CoreError ──┐                                               │
//! │                        ├──► ServiceError ──► caller                    │
//! │  hamu-db   DbError   ──┘                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use hamu_core::{CoreError, ValidationError};
use hamu_db::DbError;

/// Errors returned by service operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        entity: &'static str,
        id: String,
    },

    /// Domain rule violation (insufficient stock, missing stock
    /// mapping, invalid input).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Input validation failure at a service entry point.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Storage failure.
    #[error(transparent)]
    Db(#[from] DbError),
}

impl ServiceError {
    /// Creates a NotFound error.
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        ServiceError::NotFound {
            entity,
            id: id.into(),
        }
    }
}

// Transactions begin/commit on the sqlx pool directly, so sqlx errors
// surface here too. Route them through DbError to keep its constraint
// mapping (unique violation, FK, pool states).
impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        ServiceError::Db(DbError::from(err))
    }
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlx_errors_map_through_db() {
        let err: ServiceError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, ServiceError::Db(_)));
    }

    #[test]
    fn test_not_found_message() {
        let err = ServiceError::not_found("Shop", "s-404");
        assert_eq!(err.to_string(), "Shop not found: s-404");
    }
}
