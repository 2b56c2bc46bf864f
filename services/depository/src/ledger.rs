//! Ledger mutation engine
//!
//! The one place position state changes. Applies a signed quantity delta to a
//! single tenant+instrument position inside an atomic unit of work: locked
//! read, balance validation, write-back. Holds no in-process locks; all
//! serialization is delegated to the storage backend's row lock, so
//! concurrent deltas on the same key apply in some total order and deltas on
//! different keys never block each other.

use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{LedgerError, LedgerResult};
use crate::namespace::TenantDirectory;
use crate::store::{Position, PositionStore};

/// The ledger mutation engine
#[derive(Clone)]
pub struct LedgerEngine {
    directory: Arc<dyn TenantDirectory>,
    store: Arc<dyn PositionStore>,
}

impl LedgerEngine {
    /// Create an engine over a tenant directory and a position store
    pub fn new(directory: Arc<dyn TenantDirectory>, store: Arc<dyn PositionStore>) -> Self {
        Self { directory, store }
    }

    /// Apply a signed quantity delta to one tenant+instrument position.
    ///
    /// Positive deltas credit, negative deltas debit. Returns the new
    /// quantity. Exactly one row is created, updated or deleted per
    /// successful call; a position that reaches zero is deleted rather than
    /// stored. The engine never retries — [`LedgerError::Storage`] is the
    /// only retryable class and retry is the caller's decision.
    pub async fn apply_delta(
        &self,
        tenant_id: &str,
        instrument: &str,
        delta: i64,
    ) -> LedgerResult<i64> {
        if instrument.is_empty() {
            return Err(LedgerError::InvalidInput {
                reason: "instrument cannot be empty".to_string(),
            });
        }
        if delta == 0 {
            return Err(LedgerError::InvalidInput {
                reason: "quantity delta cannot be zero".to_string(),
            });
        }

        let record = self
            .directory
            .resolve(tenant_id)
            .await?
            .ok_or_else(|| LedgerError::TenantNotFound {
                tenant_id: tenant_id.to_string(),
            })?;

        let mut uow = self.store.begin(&record.namespace).await?;

        // Absent row is the valid "never held / fully sold" zero state.
        let current = uow.locked_read(instrument).await?.unwrap_or(0);

        // Held quantities have no upper bound, so a credit can push a
        // position past i64::MAX; reject it instead of wrapping.
        let new_quantity =
            current
                .checked_add(delta)
                .ok_or_else(|| LedgerError::InvalidInput {
                    reason: format!(
                        "delta {delta} overflows held quantity {current} for {tenant_id}/{instrument}"
                    ),
                })?;
        if new_quantity < 0 {
            // Dropping the unit of work rolls it back; nothing was written.
            return Err(LedgerError::InsufficientBalance {
                tenant_id: tenant_id.to_string(),
                instrument: instrument.to_string(),
                held: current,
                attempted: delta,
            });
        }

        if new_quantity == 0 {
            uow.delete(instrument).await?;
        } else {
            uow.upsert(instrument, new_quantity).await?;
        }
        uow.commit().await?;

        info!(
            "Applied delta {} to {}/{}: {} -> {}",
            delta, tenant_id, instrument, current, new_quantity
        );
        Ok(new_quantity)
    }

    /// List every position a tenant holds.
    ///
    /// Committed state only, no ordering guarantee, quantities always >= 1.
    /// An unprovisioned tenant is an error; a provisioned tenant holding
    /// nothing yields an empty listing.
    pub async fn portfolio(&self, tenant_id: &str) -> LedgerResult<Vec<Position>> {
        let record = self
            .directory
            .resolve(tenant_id)
            .await?
            .ok_or_else(|| LedgerError::TenantNotFound {
                tenant_id: tenant_id.to_string(),
            })?;

        let positions = self.store.list_all(&record.namespace).await?;
        debug!(
            "Portfolio for {}: {} position(s)",
            tenant_id,
            positions.len()
        );
        Ok(positions)
    }
}

impl std::fmt::Debug for LedgerEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerEngine").finish_non_exhaustive()
    }
}
