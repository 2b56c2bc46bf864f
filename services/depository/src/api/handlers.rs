//! HTTP handlers
//!
//! The only layer that turns [`LedgerError`] into HTTP statuses and
//! user-facing messages; the core returns structured outcomes and stays
//! transport-free.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde_json::{Value, json};
use tracing::{error, info};

use crate::api::models::{
    ApiResponse, CompanyEntry, CompanyListResponse, DelistCompanyResponse, ErrorResponse,
    HoldingEntry, MutatePositionRequest, MutatePositionResponse, PortfolioResponse,
    ProvisionTenantRequest, ProvisionTenantResponse, RegisterCompanyRequest,
};
use crate::company::CompanyRecord;
use crate::error::LedgerError;
use crate::Depository;

fn status_for(err: &LedgerError) -> StatusCode {
    match err {
        LedgerError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
        LedgerError::TenantNotFound { .. } => StatusCode::NOT_FOUND,
        LedgerError::InsufficientBalance { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        LedgerError::Conflict { .. } | LedgerError::CompanyConflict { .. } => StatusCode::CONFLICT,
        LedgerError::CompanyNotFound { .. } => StatusCode::NOT_FOUND,
        LedgerError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn code_for(err: &LedgerError) -> &'static str {
    match err {
        LedgerError::InvalidInput { .. } => "INVALID_INPUT",
        LedgerError::TenantNotFound { .. } => "TENANT_NOT_FOUND",
        LedgerError::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
        LedgerError::Conflict { .. } => "TENANT_CONFLICT",
        LedgerError::CompanyConflict { .. } => "COMPANY_CONFLICT",
        LedgerError::CompanyNotFound { .. } => "COMPANY_NOT_FOUND",
        LedgerError::Storage(_) => "STORAGE_ERROR",
    }
}

fn reject<T>(err: &LedgerError) -> (StatusCode, Json<ApiResponse<T>>) {
    if matches!(err, LedgerError::Storage(_)) {
        error!("Storage failure: {err:#}");
    }
    (
        status_for(err),
        Json(ApiResponse::error(ErrorResponse {
            error: code_for(err).to_string(),
            message: err.to_string(),
            retryable: err.is_retryable(),
        })),
    )
}

fn bad_request<T>(message: &str) -> (StatusCode, Json<ApiResponse<T>>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::error(ErrorResponse {
            error: "INVALID_INPUT".to_string(),
            message: message.to_string(),
            retryable: false,
        })),
    )
}

/// Liveness probe
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy", "service": "depository" }))
}

/// Provision a new tenant namespace
pub async fn provision_tenant(
    State(depository): State<Arc<Depository>>,
    Json(request): Json<ProvisionTenantRequest>,
) -> (StatusCode, Json<ApiResponse<ProvisionTenantResponse>>) {
    info!("Provisioning request for tenant {}", request.tenant_id);

    match depository
        .provision(&request.tenant_id, &request.display_name)
        .await
    {
        Ok(()) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(ProvisionTenantResponse {
                tenant_id: request.tenant_id,
            })),
        ),
        Err(err) => reject(&err),
    }
}

/// Credit shares to a tenant position
pub async fn credit_position(
    State(depository): State<Arc<Depository>>,
    Json(request): Json<MutatePositionRequest>,
) -> (StatusCode, Json<ApiResponse<MutatePositionResponse>>) {
    mutate(&depository, request, 1).await
}

/// Debit shares from a tenant position
pub async fn debit_position(
    State(depository): State<Arc<Depository>>,
    Json(request): Json<MutatePositionRequest>,
) -> (StatusCode, Json<ApiResponse<MutatePositionResponse>>) {
    mutate(&depository, request, -1).await
}

async fn mutate(
    depository: &Depository,
    request: MutatePositionRequest,
    sign: i64,
) -> (StatusCode, Json<ApiResponse<MutatePositionResponse>>) {
    // Transport-level shape checks; the engine re-validates its own inputs.
    if request.tenant_id.is_empty() {
        return bad_request("tenant_id is required");
    }
    if request.quantity <= 0 {
        return bad_request("quantity must be positive");
    }

    let delta = sign * request.quantity;
    match depository
        .apply_delta(&request.tenant_id, &request.instrument, delta)
        .await
    {
        Ok(new_quantity) => (
            StatusCode::OK,
            Json(ApiResponse::success(MutatePositionResponse {
                tenant_id: request.tenant_id,
                instrument: request.instrument,
                new_quantity,
            })),
        ),
        Err(err) => reject(&err),
    }
}

/// Register a company in the platform-wide listing
pub async fn register_company(
    State(depository): State<Arc<Depository>>,
    Json(request): Json<RegisterCompanyRequest>,
) -> (StatusCode, Json<ApiResponse<CompanyEntry>>) {
    let company = CompanyRecord {
        ticker: request.ticker,
        company_name: request.company_name,
        face_value: request.face_value,
    };

    match depository.add_company(&company).await {
        Ok(()) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(CompanyEntry {
                ticker: company.ticker,
                company_name: company.company_name,
                face_value: company.face_value,
            })),
        ),
        Err(err) => reject(&err),
    }
}

/// List every registered company
pub async fn list_companies(
    State(depository): State<Arc<Depository>>,
) -> (StatusCode, Json<ApiResponse<CompanyListResponse>>) {
    match depository.list_companies().await {
        Ok(companies) => (
            StatusCode::OK,
            Json(ApiResponse::success(CompanyListResponse {
                companies: companies
                    .into_iter()
                    .map(|c| CompanyEntry {
                        ticker: c.ticker,
                        company_name: c.company_name,
                        face_value: c.face_value,
                    })
                    .collect(),
            })),
        ),
        Err(err) => reject(&err),
    }
}

/// Delist a company by ticker
pub async fn delist_company(
    State(depository): State<Arc<Depository>>,
    Path(ticker): Path<String>,
) -> (StatusCode, Json<ApiResponse<DelistCompanyResponse>>) {
    match depository.remove_company(&ticker).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse::success(DelistCompanyResponse { ticker })),
        ),
        Err(err) => reject(&err),
    }
}

/// List every position a tenant holds
pub async fn portfolio(
    State(depository): State<Arc<Depository>>,
    Path(tenant_id): Path<String>,
) -> (StatusCode, Json<ApiResponse<PortfolioResponse>>) {
    match depository.portfolio(&tenant_id).await {
        Ok(positions) => (
            StatusCode::OK,
            Json(ApiResponse::success(PortfolioResponse {
                tenant_id,
                holdings: positions
                    .into_iter()
                    .map(|p| HoldingEntry {
                        instrument: p.instrument,
                        quantity: p.quantity,
                    })
                    .collect(),
            })),
        ),
        Err(err) => reject(&err),
    }
}
