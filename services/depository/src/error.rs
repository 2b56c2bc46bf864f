//! Error types for the depository service

use thiserror::Error;

/// Ledger-specific error types
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Request was malformed before it reached storage
    #[error("Invalid input: {reason}")]
    InvalidInput {
        /// Why the input was rejected
        reason: String,
    },

    /// Tenant namespace has not been provisioned
    #[error("Tenant not found: {tenant_id}")]
    TenantNotFound {
        /// The tenant identifier that could not be resolved
        tenant_id: String,
    },

    /// Debit would drive the position below zero
    #[error(
        "Insufficient balance for {tenant_id}/{instrument}: held {held}, attempted delta {attempted}"
    )]
    InsufficientBalance {
        /// Owning tenant
        tenant_id: String,
        /// Instrument being debited
        instrument: String,
        /// Quantity held before the attempt
        held: i64,
        /// The delta that was rejected
        attempted: i64,
    },

    /// Provisioning attempted for an already-registered tenant identity
    #[error("Tenant already provisioned: {tenant_id}")]
    Conflict {
        /// The tenant identifier that already exists
        tenant_id: String,
    },

    /// Company registration attempted for an already-listed ticker
    #[error("Company already listed: {ticker}")]
    CompanyConflict {
        /// The ticker that already exists in the registry
        ticker: String,
    },

    /// Company lookup or removal for a ticker that is not listed
    #[error("Company not found: {ticker}")]
    CompanyNotFound {
        /// The ticker that could not be found
        ticker: String,
    },

    /// Storage layer failure (lock acquisition, unit of work, commit)
    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl LedgerError {
    /// Whether a caller-initiated retry could succeed.
    ///
    /// Only storage failures are potentially transient (lock-wait timeout,
    /// connection loss). Everything else requires the caller to change the
    /// request or the system state first.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}

/// Type alias for ledger results
pub type LedgerResult<T> = Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_storage_errors_are_retryable() {
        assert!(LedgerError::Storage(anyhow::anyhow!("connection reset")).is_retryable());
        assert!(
            !LedgerError::InvalidInput {
                reason: "zero delta".to_string()
            }
            .is_retryable()
        );
        assert!(
            !LedgerError::InsufficientBalance {
                tenant_id: "GOVT123".to_string(),
                instrument: "ACME".to_string(),
                held: 10,
                attempted: -20,
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_insufficient_balance_carries_full_context() {
        let err = LedgerError::InsufficientBalance {
            tenant_id: "GOVT123".to_string(),
            instrument: "ACME".to_string(),
            held: 100,
            attempted: -150,
        };
        let msg = err.to_string();
        assert!(msg.contains("GOVT123"));
        assert!(msg.contains("ACME"));
        assert!(msg.contains("100"));
        assert!(msg.contains("-150"));
    }
}
