//! Embedded in-memory backend
//!
//! Implements the same contract as the Postgres backend with per-row async
//! mutexes standing in for row locks: units of work on the same
//! namespace+instrument serialize, different keys never block each other.
//! Writes are staged inside the unit of work and applied on commit only, so
//! dropping an uncommitted unit of work discards them.
//!
//! Backs the test suite and the `--memory` mode of the binary.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use tokio::sync::OwnedMutexGuard;

use crate::company::{CompanyRecord, CompanyRegistry, validate_company};
use crate::error::{LedgerError, LedgerResult};
use crate::namespace::{NamespaceId, TenantDirectory, TenantRecord};
use crate::store::{Position, PositionStore, PositionUnitOfWork};

/// Row key: (namespace token, instrument)
type RowKey = (String, String);

#[derive(Default)]
struct MemoryInner {
    /// Tenant registry, keyed by tenant id
    tenants: RwLock<FxHashMap<String, TenantRecord>>,
    /// Company registry, keyed by ticker
    companies: RwLock<FxHashMap<String, CompanyRecord>>,
    /// Committed positions
    positions: RwLock<FxHashMap<RowKey, i64>>,
    /// Row locks, created on first touch
    row_locks: Mutex<FxHashMap<RowKey, Arc<tokio::sync::Mutex<()>>>>,
}

/// In-memory tenant directory and position store
#[derive(Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<MemoryInner>,
}

impl MemoryBackend {
    /// Create an empty backend
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn row_lock(&self, key: &RowKey) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.inner.row_locks.lock();
        Arc::clone(
            locks
                .entry(key.clone())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(()))),
        )
    }
}

impl std::fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBackend")
            .field("tenants", &self.inner.tenants.read().len())
            .field("positions", &self.inner.positions.read().len())
            .finish()
    }
}

#[async_trait]
impl TenantDirectory for MemoryBackend {
    async fn provision(&self, tenant_id: &str, display_name: &str) -> LedgerResult<()> {
        if display_name.is_empty() {
            return Err(LedgerError::InvalidInput {
                reason: "display name cannot be empty".to_string(),
            });
        }
        let namespace = NamespaceId::for_tenant(tenant_id)?;

        let mut tenants = self.inner.tenants.write();
        if tenants.contains_key(tenant_id) {
            return Err(LedgerError::Conflict {
                tenant_id: tenant_id.to_string(),
            });
        }
        tenants.insert(
            tenant_id.to_string(),
            TenantRecord {
                tenant_id: tenant_id.to_string(),
                display_name: display_name.to_string(),
                namespace,
            },
        );
        Ok(())
    }

    async fn resolve(&self, tenant_id: &str) -> LedgerResult<Option<TenantRecord>> {
        Ok(self.inner.tenants.read().get(tenant_id).cloned())
    }
}

#[async_trait]
impl CompanyRegistry for MemoryBackend {
    async fn add_company(&self, company: &CompanyRecord) -> LedgerResult<()> {
        validate_company(company)?;

        let mut companies = self.inner.companies.write();
        if companies.contains_key(&company.ticker) {
            return Err(LedgerError::CompanyConflict {
                ticker: company.ticker.clone(),
            });
        }
        companies.insert(company.ticker.clone(), company.clone());
        Ok(())
    }

    async fn list_companies(&self) -> LedgerResult<Vec<CompanyRecord>> {
        Ok(self.inner.companies.read().values().cloned().collect())
    }

    async fn remove_company(&self, ticker: &str) -> LedgerResult<()> {
        if self.inner.companies.write().remove(ticker).is_none() {
            return Err(LedgerError::CompanyNotFound {
                ticker: ticker.to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl PositionStore for MemoryBackend {
    async fn begin(&self, namespace: &NamespaceId) -> LedgerResult<Box<dyn PositionUnitOfWork>> {
        Ok(Box::new(MemoryUnitOfWork {
            backend: self.clone(),
            namespace: namespace.clone(),
            guards: Vec::new(),
            staged: Vec::new(),
        }))
    }

    async fn list_all(&self, namespace: &NamespaceId) -> LedgerResult<Vec<Position>> {
        let positions = self.inner.positions.read();
        Ok(positions
            .iter()
            .filter(|((ns, _), _)| ns == namespace.as_str())
            .map(|((_, instrument), quantity)| Position {
                instrument: instrument.clone(),
                quantity: *quantity,
            })
            .collect())
    }
}

/// A staged write, applied to committed state on commit only
#[derive(Debug)]
enum StagedWrite {
    Upsert(RowKey, i64),
    Delete(RowKey),
}

struct MemoryUnitOfWork {
    backend: MemoryBackend,
    namespace: NamespaceId,
    /// Held row locks; released when the unit of work is dropped
    guards: Vec<(RowKey, OwnedMutexGuard<()>)>,
    staged: Vec<StagedWrite>,
}

impl MemoryUnitOfWork {
    fn key(&self, instrument: &str) -> RowKey {
        (self.namespace.as_str().to_string(), instrument.to_string())
    }

    async fn acquire_row(&mut self, key: &RowKey) {
        if self.guards.iter().any(|(held, _)| held == key) {
            return;
        }
        let cell = self.backend.row_lock(key);
        let guard = cell.lock_owned().await;
        self.guards.push((key.clone(), guard));
    }

    /// Staged view of one row, falling back to committed state
    fn read_through(&self, key: &RowKey) -> Option<i64> {
        for write in self.staged.iter().rev() {
            match write {
                StagedWrite::Upsert(k, q) if k == key => return Some(*q),
                StagedWrite::Delete(k) if k == key => return None,
                _ => {}
            }
        }
        self.backend.inner.positions.read().get(key).copied()
    }
}

#[async_trait]
impl PositionUnitOfWork for MemoryUnitOfWork {
    async fn locked_read(&mut self, instrument: &str) -> LedgerResult<Option<i64>> {
        let key = self.key(instrument);
        self.acquire_row(&key).await;
        Ok(self.read_through(&key))
    }

    async fn upsert(&mut self, instrument: &str, quantity: i64) -> LedgerResult<()> {
        let key = self.key(instrument);
        self.acquire_row(&key).await;
        self.staged.push(StagedWrite::Upsert(key, quantity));
        Ok(())
    }

    async fn delete(&mut self, instrument: &str) -> LedgerResult<()> {
        let key = self.key(instrument);
        self.acquire_row(&key).await;
        self.staged.push(StagedWrite::Delete(key));
        Ok(())
    }

    async fn commit(self: Box<Self>) -> LedgerResult<()> {
        let mut positions = self.backend.inner.positions.write();
        for write in &self.staged {
            match write {
                StagedWrite::Upsert(key, quantity) => {
                    positions.insert(key.clone(), *quantity);
                }
                StagedWrite::Delete(key) => {
                    positions.remove(key);
                }
            }
        }
        // Row locks release when `self` drops, after the writes are visible.
        Ok(())
    }
}
