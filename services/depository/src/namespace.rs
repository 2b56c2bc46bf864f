//! Tenant namespace directory
//!
//! Every tenant owns exactly one isolated storage namespace. The directory is
//! the registry mapping tenant identifiers to pre-validated namespace tokens:
//! tokens are minted once at provisioning time and looked up on every access,
//! never re-derived from untrusted input on the request path.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};

/// Longest tenant identifier we accept.
///
/// The Postgres backend embeds the token in a schema name, and Postgres
/// truncates identifiers beyond 63 bytes; `tenant_` leaves 56 for the id.
pub const MAX_TENANT_ID_LEN: usize = 56;

/// A validated storage-namespace token.
///
/// Construction is the only place tenant input touches identifier syntax;
/// everything downstream treats the token as opaque and safe to embed in
/// quoted identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NamespaceId(String);

impl NamespaceId {
    /// Mint the namespace token for a tenant identifier.
    ///
    /// Identifiers are restricted to ASCII alphanumerics, `_` and `-`, the
    /// charset of the government-issued ids the platform registers.
    pub fn for_tenant(tenant_id: &str) -> LedgerResult<Self> {
        if tenant_id.is_empty() {
            return Err(LedgerError::InvalidInput {
                reason: "tenant id cannot be empty".to_string(),
            });
        }
        if tenant_id.len() > MAX_TENANT_ID_LEN {
            return Err(LedgerError::InvalidInput {
                reason: format!(
                    "tenant id exceeds {MAX_TENANT_ID_LEN} bytes: {tenant_id}"
                ),
            });
        }
        if !tenant_id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
        {
            return Err(LedgerError::InvalidInput {
                reason: format!("tenant id contains invalid characters: {tenant_id}"),
            });
        }
        Ok(Self(format!("tenant_{tenant_id}")))
    }

    /// Rehydrate a token read back from the registry.
    ///
    /// Registry rows were validated at provisioning time, so this performs no
    /// re-validation.
    #[must_use]
    pub(crate) fn from_registry(token: String) -> Self {
        Self(token)
    }

    /// The token as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NamespaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A provisioned tenant identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantRecord {
    /// External tenant identifier (e.g. a government-issued id)
    pub tenant_id: String,
    /// Human-readable display name
    pub display_name: String,
    /// The tenant's storage namespace
    pub namespace: NamespaceId,
}

/// Registry of provisioned tenant namespaces.
///
/// Implementations must make `provision` a single atomic unit of work:
/// identity registration, namespace creation and empty position storage either
/// all land or none do. Partial provisioning is unrecoverable because the rest
/// of the system takes namespace existence to mean full provisioning.
#[async_trait]
pub trait TenantDirectory: Send + Sync {
    /// Provision a tenant: register the identity, create its namespace and
    /// seed empty position storage.
    ///
    /// Returns [`LedgerError::Conflict`] without touching anything when the
    /// identity is already registered.
    async fn provision(&self, tenant_id: &str, display_name: &str) -> LedgerResult<()>;

    /// Resolve a tenant identifier to its registry record.
    ///
    /// `None` means the tenant was never provisioned, which is distinct from
    /// a provisioned tenant that holds nothing.
    async fn resolve(&self, tenant_id: &str) -> LedgerResult<Option<TenantRecord>>;

    /// Whether a tenant's namespace has been provisioned
    async fn exists(&self, tenant_id: &str) -> LedgerResult<bool> {
        Ok(self.resolve(tenant_id).await?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_token_format() {
        let ns = NamespaceId::for_tenant("GOVT123").unwrap();
        assert_eq!(ns.as_str(), "tenant_GOVT123");
    }

    #[test]
    fn test_empty_tenant_id_rejected() {
        assert!(matches!(
            NamespaceId::for_tenant(""),
            Err(LedgerError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_injection_shaped_ids_rejected() {
        for id in ["a;DROP SCHEMA platform", "a\"b", "a.b", "a b", "a'--"] {
            assert!(
                matches!(
                    NamespaceId::for_tenant(id),
                    Err(LedgerError::InvalidInput { .. })
                ),
                "accepted: {id}"
            );
        }
    }

    #[test]
    fn test_length_cap() {
        let long = "x".repeat(MAX_TENANT_ID_LEN + 1);
        assert!(NamespaceId::for_tenant(&long).is_err());
        let max = "x".repeat(MAX_TENANT_ID_LEN);
        assert!(NamespaceId::for_tenant(&max).is_ok());
    }

    #[test]
    fn test_hyphen_and_underscore_allowed() {
        assert!(NamespaceId::for_tenant("IN-29_AB").is_ok());
    }
}
