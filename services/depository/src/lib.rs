//! Share Depository Service
//!
//! Multi-tenant ownership tracking for tradable share positions. Each tenant
//! (investor) owns an isolated storage namespace; positions are mutated only
//! through the transactional ledger engine, which enforces:
//! - non-negative balances
//! - exactly-once application of each delta
//! - no lost updates under concurrent credit/debit on the same key
//! - deletion of positions that reach zero (zero-quantity rows never exist)

#![warn(missing_docs)]
#![forbid(unsafe_code)]

use std::sync::Arc;

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

pub mod api;
pub mod company;
pub mod config;
pub mod error;
pub mod ledger;
pub mod namespace;
pub mod store;

pub use company::{CompanyRecord, CompanyRegistry};
pub use config::DepositoryConfig;
pub use error::{LedgerError, LedgerResult};
pub use ledger::LedgerEngine;
pub use namespace::{NamespaceId, TenantDirectory, TenantRecord};
pub use store::{MemoryBackend, Position, PositionStore, PostgresBackend};

/// The depository service facade: tenant directory plus ledger engine wired
/// over one storage backend.
pub struct Depository {
    directory: Arc<dyn TenantDirectory>,
    companies: Arc<dyn CompanyRegistry>,
    engine: LedgerEngine,
}

impl std::fmt::Debug for Depository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Depository").finish_non_exhaustive()
    }
}

impl Depository {
    /// Connect to Postgres, run migrations and wire the service
    pub async fn connect(config: &DepositoryConfig) -> Result<Self> {
        info!("Connecting to database");

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await?;

        store::postgres::run_migrations(&pool).await?;

        let backend = Arc::new(PostgresBackend::new(pool));
        info!("Depository initialized with Postgres backend");
        Ok(Self::from_backend(backend.clone(), backend.clone(), backend))
    }

    /// Wire the service over the embedded in-memory backend
    #[must_use]
    pub fn in_memory() -> Self {
        let backend = Arc::new(MemoryBackend::new());
        Self::from_backend(backend.clone(), backend.clone(), backend)
    }

    /// Wire the service over any directory + registry + store triple
    pub fn from_backend(
        directory: Arc<dyn TenantDirectory>,
        companies: Arc<dyn CompanyRegistry>,
        store: Arc<dyn PositionStore>,
    ) -> Self {
        let engine = LedgerEngine::new(directory.clone(), store);
        Self {
            directory,
            companies,
            engine,
        }
    }

    /// Provision a tenant: register the identity, create its namespace and
    /// seed empty position storage as one atomic unit of work.
    pub async fn provision(&self, tenant_id: &str, display_name: &str) -> LedgerResult<()> {
        self.directory.provision(tenant_id, display_name).await
    }

    /// Whether a tenant's namespace has been provisioned
    pub async fn tenant_exists(&self, tenant_id: &str) -> LedgerResult<bool> {
        self.directory.exists(tenant_id).await
    }

    /// Apply a signed quantity delta to one tenant+instrument position
    pub async fn apply_delta(
        &self,
        tenant_id: &str,
        instrument: &str,
        delta: i64,
    ) -> LedgerResult<i64> {
        self.engine.apply_delta(tenant_id, instrument, delta).await
    }

    /// Credit shares: apply a positive delta
    pub async fn credit(&self, tenant_id: &str, instrument: &str, quantity: i64) -> LedgerResult<i64> {
        if quantity <= 0 {
            return Err(LedgerError::InvalidInput {
                reason: "credit quantity must be positive".to_string(),
            });
        }
        self.engine.apply_delta(tenant_id, instrument, quantity).await
    }

    /// Debit shares: apply a negative delta
    pub async fn debit(&self, tenant_id: &str, instrument: &str, quantity: i64) -> LedgerResult<i64> {
        if quantity <= 0 {
            return Err(LedgerError::InvalidInput {
                reason: "debit quantity must be positive".to_string(),
            });
        }
        self.engine.apply_delta(tenant_id, instrument, -quantity).await
    }

    /// List every position a tenant holds
    pub async fn portfolio(&self, tenant_id: &str) -> LedgerResult<Vec<Position>> {
        self.engine.portfolio(tenant_id).await
    }

    /// Register a company in the platform-wide listing
    pub async fn add_company(&self, company: &CompanyRecord) -> LedgerResult<()> {
        self.companies.add_company(company).await
    }

    /// Every listed company
    pub async fn list_companies(&self) -> LedgerResult<Vec<CompanyRecord>> {
        self.companies.list_companies().await
    }

    /// Delist a company by ticker
    pub async fn remove_company(&self, ticker: &str) -> LedgerResult<()> {
        self.companies.remove_company(ticker).await
    }
}
