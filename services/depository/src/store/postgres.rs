//! Postgres backend
//!
//! One schema per tenant namespace holding a single `positions` table, plus a
//! shared `platform.tenants` registry. Row serialization comes from
//! `SELECT ... FOR UPDATE` inside a transaction; the transaction rolls back on
//! drop, which covers both failure paths and abandoned requests.
//!
//! Namespace tokens reach SQL text only through [`NamespaceId`], which is
//! charset-validated at provisioning time and read back from the registry on
//! every other path. Values always go through bind parameters.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::{debug, info};

use crate::company::{CompanyRecord, CompanyRegistry, validate_company};
use crate::error::{LedgerError, LedgerResult};
use crate::namespace::{NamespaceId, TenantDirectory, TenantRecord};
use crate::store::{Position, PositionStore, PositionUnitOfWork};

/// Tenant directory and position store backed by Postgres
#[derive(Debug, Clone)]
pub struct PostgresBackend {
    /// Connection pool, injected by the process entry point
    pool: PgPool,
}

impl PostgresBackend {
    /// Wrap an existing connection pool
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Run database migrations: the shared platform schema and tenant registry.
///
/// Per-tenant schemas are created by provisioning, not here.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    info!("Running database migrations");

    sqlx::query("CREATE SCHEMA IF NOT EXISTS platform")
        .execute(pool)
        .await?;

    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS platform.tenants (
            tenant_id TEXT PRIMARY KEY,
            display_name TEXT NOT NULL,
            namespace TEXT NOT NULL UNIQUE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        ",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS platform.companies (
            ticker TEXT PRIMARY KEY,
            company_name TEXT NOT NULL,
            face_value BIGINT NOT NULL CHECK (face_value > 0)
        )
        ",
    )
    .execute(pool)
    .await?;

    info!("Database migrations completed");
    Ok(())
}

fn positions_table(namespace: &NamespaceId) -> String {
    format!("\"{}\".positions", namespace.as_str())
}

#[async_trait]
impl TenantDirectory for PostgresBackend {
    async fn provision(&self, tenant_id: &str, display_name: &str) -> LedgerResult<()> {
        if display_name.is_empty() {
            return Err(LedgerError::InvalidInput {
                reason: "display name cannot be empty".to_string(),
            });
        }
        let namespace = NamespaceId::for_tenant(tenant_id)?;

        let mut txn = self
            .pool
            .begin()
            .await
            .context("failed to start provisioning transaction")?;

        let result = sqlx::query(
            r"
            INSERT INTO platform.tenants (tenant_id, display_name, namespace)
            VALUES ($1, $2, $3)
            ON CONFLICT (tenant_id) DO NOTHING
            ",
        )
        .bind(tenant_id)
        .bind(display_name)
        .bind(namespace.as_str())
        .execute(&mut *txn)
        .await
        .context("failed to register tenant identity")?;

        if result.rows_affected() == 0 {
            // Identity already registered: short-circuit, touch nothing else.
            return Err(LedgerError::Conflict {
                tenant_id: tenant_id.to_string(),
            });
        }

        sqlx::query(&format!("CREATE SCHEMA \"{}\"", namespace.as_str()))
            .execute(&mut *txn)
            .await
            .with_context(|| format!("failed to create namespace {namespace}"))?;

        sqlx::query(&format!(
            r"
            CREATE TABLE {} (
                instrument TEXT PRIMARY KEY,
                quantity BIGINT NOT NULL CHECK (quantity > 0)
            )
            ",
            positions_table(&namespace)
        ))
        .execute(&mut *txn)
        .await
        .with_context(|| format!("failed to seed position storage in {namespace}"))?;

        txn.commit()
            .await
            .context("failed to commit provisioning transaction")?;

        info!("Provisioned tenant {} in namespace {}", tenant_id, namespace);
        Ok(())
    }

    async fn resolve(&self, tenant_id: &str) -> LedgerResult<Option<TenantRecord>> {
        let row = sqlx::query(
            "SELECT tenant_id, display_name, namespace FROM platform.tenants WHERE tenant_id = $1",
        )
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await
        .context("failed to look up tenant registry")?;

        Ok(row.map(|row| TenantRecord {
            tenant_id: row.get("tenant_id"),
            display_name: row.get("display_name"),
            namespace: NamespaceId::from_registry(row.get("namespace")),
        }))
    }
}

#[async_trait]
impl CompanyRegistry for PostgresBackend {
    async fn add_company(&self, company: &CompanyRecord) -> LedgerResult<()> {
        validate_company(company)?;

        let result = sqlx::query(
            r"
            INSERT INTO platform.companies (ticker, company_name, face_value)
            VALUES ($1, $2, $3)
            ON CONFLICT (ticker) DO NOTHING
            ",
        )
        .bind(&company.ticker)
        .bind(&company.company_name)
        .bind(company.face_value)
        .execute(&self.pool)
        .await
        .context("failed to register company")?;

        if result.rows_affected() == 0 {
            return Err(LedgerError::CompanyConflict {
                ticker: company.ticker.clone(),
            });
        }

        info!("Listed company {}", company.ticker);
        Ok(())
    }

    async fn list_companies(&self) -> LedgerResult<Vec<CompanyRecord>> {
        let rows = sqlx::query("SELECT ticker, company_name, face_value FROM platform.companies")
            .fetch_all(&self.pool)
            .await
            .context("failed to list companies")?;

        Ok(rows
            .into_iter()
            .map(|row| CompanyRecord {
                ticker: row.get("ticker"),
                company_name: row.get("company_name"),
                face_value: row.get("face_value"),
            })
            .collect())
    }

    async fn remove_company(&self, ticker: &str) -> LedgerResult<()> {
        let result = sqlx::query("DELETE FROM platform.companies WHERE ticker = $1")
            .bind(ticker)
            .execute(&self.pool)
            .await
            .context("failed to delete company")?;

        if result.rows_affected() == 0 {
            return Err(LedgerError::CompanyNotFound {
                ticker: ticker.to_string(),
            });
        }

        info!("Delisted company {}", ticker);
        Ok(())
    }
}

#[async_trait]
impl PositionStore for PostgresBackend {
    async fn begin(&self, namespace: &NamespaceId) -> LedgerResult<Box<dyn PositionUnitOfWork>> {
        let txn = self
            .pool
            .begin()
            .await
            .context("failed to start unit of work")?;
        Ok(Box::new(PostgresUnitOfWork {
            txn,
            namespace: namespace.clone(),
        }))
    }

    async fn list_all(&self, namespace: &NamespaceId) -> LedgerResult<Vec<Position>> {
        let rows = sqlx::query(&format!(
            "SELECT instrument, quantity FROM {}",
            positions_table(namespace)
        ))
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("failed to list positions in {namespace}"))?;

        Ok(rows
            .into_iter()
            .map(|row| Position {
                instrument: row.get("instrument"),
                quantity: row.get("quantity"),
            })
            .collect())
    }
}

/// A transaction-scoped unit of work; rolls back on drop unless committed
struct PostgresUnitOfWork {
    txn: Transaction<'static, Postgres>,
    namespace: NamespaceId,
}

#[async_trait]
impl PositionUnitOfWork for PostgresUnitOfWork {
    async fn locked_read(&mut self, instrument: &str) -> LedgerResult<Option<i64>> {
        let row = sqlx::query(&format!(
            "SELECT quantity FROM {} WHERE instrument = $1 FOR UPDATE",
            positions_table(&self.namespace)
        ))
        .bind(instrument)
        .fetch_optional(&mut *self.txn)
        .await
        .context("failed to lock and read current quantity")?;

        Ok(row.map(|row| row.get("quantity")))
    }

    async fn upsert(&mut self, instrument: &str, quantity: i64) -> LedgerResult<()> {
        sqlx::query(&format!(
            r"
            INSERT INTO {} (instrument, quantity)
            VALUES ($1, $2)
            ON CONFLICT (instrument)
            DO UPDATE SET quantity = EXCLUDED.quantity
            ",
            positions_table(&self.namespace)
        ))
        .bind(instrument)
        .bind(quantity)
        .execute(&mut *self.txn)
        .await
        .context("failed to upsert position")?;

        debug!(
            "Staged upsert {}/{} -> {}",
            self.namespace, instrument, quantity
        );
        Ok(())
    }

    async fn delete(&mut self, instrument: &str) -> LedgerResult<()> {
        sqlx::query(&format!(
            "DELETE FROM {} WHERE instrument = $1",
            positions_table(&self.namespace)
        ))
        .bind(instrument)
        .execute(&mut *self.txn)
        .await
        .context("failed to delete position")?;

        debug!("Staged delete {}/{}", self.namespace, instrument);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> LedgerResult<()> {
        self.txn
            .commit()
            .await
            .context("failed to commit unit of work")?;
        Ok(())
    }
}
