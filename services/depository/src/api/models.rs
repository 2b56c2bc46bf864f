//! REST API models and request/response types

use serde::{Deserialize, Serialize};

/// Tenant provisioning request
#[derive(Debug, Serialize, Deserialize)]
pub struct ProvisionTenantRequest {
    /// External tenant identifier (e.g. government-issued id)
    pub tenant_id: String,
    /// Human-readable tenant name
    pub display_name: String,
}

/// Tenant provisioning result
#[derive(Debug, Serialize, Deserialize)]
pub struct ProvisionTenantResponse {
    /// The provisioned tenant identifier
    pub tenant_id: String,
}

/// Credit/debit request for one tenant+instrument position
#[derive(Debug, Serialize, Deserialize)]
pub struct MutatePositionRequest {
    /// Owning tenant
    pub tenant_id: String,
    /// Instrument identifier (e.g. ticker symbol)
    pub instrument: String,
    /// Quantity to credit or debit; must be positive, the route decides the sign
    pub quantity: i64,
}

/// Result of a position mutation
#[derive(Debug, Serialize, Deserialize)]
pub struct MutatePositionResponse {
    /// Owning tenant
    pub tenant_id: String,
    /// Mutated instrument
    pub instrument: String,
    /// Quantity held after the mutation; 0 means the position was removed
    pub new_quantity: i64,
}

/// One entry in a portfolio listing
#[derive(Debug, Serialize, Deserialize)]
pub struct HoldingEntry {
    /// Instrument identifier
    pub instrument: String,
    /// Held quantity, always >= 1
    pub quantity: i64,
}

/// Portfolio listing response
#[derive(Debug, Serialize, Deserialize)]
pub struct PortfolioResponse {
    /// Owning tenant
    pub tenant_id: String,
    /// Every position the tenant holds, in no particular order
    pub holdings: Vec<HoldingEntry>,
}

/// Company listing request
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterCompanyRequest {
    /// Ticker symbol, unique across the platform
    pub ticker: String,
    /// Registered company name
    pub company_name: String,
    /// Face value per share
    pub face_value: i64,
}

/// One entry in the company listing
#[derive(Debug, Serialize, Deserialize)]
pub struct CompanyEntry {
    /// Ticker symbol
    pub ticker: String,
    /// Registered company name
    pub company_name: String,
    /// Face value per share
    pub face_value: i64,
}

/// Company listing response
#[derive(Debug, Serialize, Deserialize)]
pub struct CompanyListResponse {
    /// Every listed company, in no particular order
    pub companies: Vec<CompanyEntry>,
}

/// Company delisting result
#[derive(Debug, Serialize, Deserialize)]
pub struct DelistCompanyResponse {
    /// The delisted ticker
    pub ticker: String,
}

/// Error payload for failed requests
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code identifier
    pub error: String,
    /// Human-readable error message
    pub message: String,
    /// Whether a retry could succeed
    pub retryable: bool,
}

/// Generic API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the request was successful
    pub success: bool,
    /// Response data (if successful)
    pub data: Option<T>,
    /// Error details (if failed)
    pub error: Option<ErrorResponse>,
    /// Response timestamp
    pub timestamp: i64,
}

impl<T> ApiResponse<T> {
    /// Create a successful API response
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }

    /// Create an error API response
    #[must_use]
    pub fn error(error: ErrorResponse) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}
