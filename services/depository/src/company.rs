//! Company registry
//!
//! Shared listing of the companies whose shares the depository tracks, kept
//! in the platform schema alongside the tenant registry. Pure bookkeeping:
//! the ledger engine never consults it, and mutation requests reference
//! tickers by string. Registered once per listing, removed on delisting.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};

/// A listed company
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyRecord {
    /// Ticker symbol, unique across the platform
    pub ticker: String,
    /// Registered company name
    pub company_name: String,
    /// Face value per share
    pub face_value: i64,
}

/// Platform-wide registry of listed companies
#[async_trait]
pub trait CompanyRegistry: Send + Sync {
    /// List a company.
    ///
    /// Returns [`LedgerError::CompanyConflict`] without touching anything
    /// when the ticker is already registered.
    async fn add_company(&self, company: &CompanyRecord) -> LedgerResult<()>;

    /// Every listed company, in no particular order
    async fn list_companies(&self) -> LedgerResult<Vec<CompanyRecord>>;

    /// Delist a company by ticker.
    ///
    /// Returns [`LedgerError::CompanyNotFound`] when the ticker was never
    /// listed (or already removed).
    async fn remove_company(&self, ticker: &str) -> LedgerResult<()>;
}

/// Shape checks shared by every registry backend
pub(crate) fn validate_company(company: &CompanyRecord) -> LedgerResult<()> {
    if company.ticker.is_empty() {
        return Err(LedgerError::InvalidInput {
            reason: "ticker cannot be empty".to_string(),
        });
    }
    if company.company_name.is_empty() {
        return Err(LedgerError::InvalidInput {
            reason: "company name cannot be empty".to_string(),
        });
    }
    if company.face_value <= 0 {
        return Err(LedgerError::InvalidInput {
            reason: format!("face value must be positive, got {}", company.face_value),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acme() -> CompanyRecord {
        CompanyRecord {
            ticker: "ACME".to_string(),
            company_name: "Acme Industries".to_string(),
            face_value: 10,
        }
    }

    #[test]
    fn test_valid_company_passes() {
        assert!(validate_company(&acme()).is_ok());
    }

    #[test]
    fn test_empty_ticker_rejected() {
        let mut company = acme();
        company.ticker.clear();
        assert!(matches!(
            validate_company(&company),
            Err(LedgerError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_nonpositive_face_value_rejected() {
        for face_value in [0, -5] {
            let mut company = acme();
            company.face_value = face_value;
            assert!(
                matches!(
                    validate_company(&company),
                    Err(LedgerError::InvalidInput { .. })
                ),
                "accepted face value {face_value}"
            );
        }
    }
}
