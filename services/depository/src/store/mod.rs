//! Position store contract
//!
//! The ledger engine is storage-agnostic: it only needs atomic units of work
//! with row-level locking reads. Two backends implement the contract — the
//! Postgres backend used in deployment and an embedded in-memory backend for
//! tests and local runs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::LedgerResult;
use crate::namespace::NamespaceId;

pub mod memory;
pub mod postgres;

pub use memory::MemoryBackend;
pub use postgres::PostgresBackend;

/// One held instrument position within a tenant namespace.
///
/// Quantity is always >= 1 when read back: a position that reaches zero is
/// deleted, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Instrument identifier, unique within the tenant namespace
    pub instrument: String,
    /// Held quantity
    pub quantity: i64,
}

/// Durable per-tenant position storage
#[async_trait]
pub trait PositionStore: Send + Sync {
    /// Open an atomic unit of work against one tenant namespace.
    ///
    /// Everything done through the returned handle is all-or-nothing: it
    /// becomes visible on [`PositionUnitOfWork::commit`] and is discarded if
    /// the handle is dropped first.
    async fn begin(&self, namespace: &NamespaceId) -> LedgerResult<Box<dyn PositionUnitOfWork>>;

    /// List every position in a namespace.
    ///
    /// Reads committed state only, takes no locks and promises no ordering.
    /// Read skew across concurrent in-flight mutations is acceptable since
    /// each row is independently consistent.
    async fn list_all(&self, namespace: &NamespaceId) -> LedgerResult<Vec<Position>>;
}

/// An in-flight atomic unit of work on one tenant namespace.
///
/// Dropping the handle without calling [`commit`](Self::commit) rolls back
/// every staged operation, including the case of a caller abandoning the
/// request mid-flight.
#[async_trait]
pub trait PositionUnitOfWork: Send {
    /// Read the current quantity of an instrument under an exclusive row lock.
    ///
    /// Concurrent units of work on the same instrument block here until this
    /// unit of work completes. An absent row is the valid "quantity 0" state
    /// and returns `None`, not an error.
    async fn locked_read(&mut self, instrument: &str) -> LedgerResult<Option<i64>>;

    /// Insert or overwrite the position with a fully recomputed quantity
    async fn upsert(&mut self, instrument: &str, quantity: i64) -> LedgerResult<()>;

    /// Remove the position row entirely
    async fn delete(&mut self, instrument: &str) -> LedgerResult<()>;

    /// Commit the unit of work, making all staged operations visible at once
    async fn commit(self: Box<Self>) -> LedgerResult<()>;
}
