//! PID providers and protocol-keyed dispatch.
//!
//! ## Module Organization
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`doi`] | DOI provider: the reserve/publicize/withdraw state machine |
//!
//! A [`PidProvider`] is the full public surface a record-lifecycle workflow
//! may call. Implementations are selected by the record's protocol string
//! through [`ProviderRegistry`], a plain strategy table, so new identifier
//! systems plug in without touching the orchestration code.

mod doi;

pub use doi::{DoiProvider, EzidDoiProvider};

use std::collections::HashMap;

use crate::anvl::MetadataMap;
use crate::client::{RegistryError, RegistryResult};
use crate::record::PidRecord;

/// Operations a dataset-lifecycle workflow may invoke against one
/// identifier system.
///
/// Failure policy is part of the contract and deliberately asymmetric:
/// `create_identifier`, `modify_identifier`, `already_exists`, and the fetch
/// phase of `delete_identifier` propagate typed errors, while
/// `publicize_identifier` soft-fails to `bool` and the lookup operations
/// swallow registry failures into empty maps. Callers rely on that split;
/// do not unify it.
pub trait PidProvider: Send + Sync {
    /// Protocol string this provider serves, e.g. `doi`.
    fn protocol(&self) -> &str;

    /// Whether registration is deferred until the record is published.
    /// Providers that reserve at creation time answer `false`.
    fn register_when_published(&self) -> bool;

    /// Uniqueness guard: does the registry already hold this identifier?
    /// Registry failures propagate; the caller must treat "unknown" as a
    /// hard stop, not as "available".
    fn already_exists(&self, record: &PidRecord) -> RegistryResult<bool>;

    /// Reserve the record's identifier in the registry. On success the
    /// record is marked registered and the registry confirmation is
    /// returned. Not idempotent: reserving an existing identifier fails
    /// with [`RegistryError::Conflict`].
    fn create_identifier(&self, record: &mut PidRecord) -> RegistryResult<String>;

    /// Current registry metadata for the record's identifier; empty when
    /// the entry is missing or the registry cannot be consulted.
    fn get_identifier_metadata(&self, record: &PidRecord) -> MetadataMap;

    /// Read-only availability probe for a candidate identifier built from
    /// parts. Empty is the expected answer for a free identifier; registry
    /// failures are swallowed and also map to empty.
    fn lookup_metadata_from_identifier(
        &self,
        protocol: &str,
        authority: &str,
        separator: &str,
        local: &str,
    ) -> MetadataMap;

    /// Partial metadata update for the record's identifier. Returns the
    /// identifier string on success.
    fn modify_identifier(
        &self,
        record: &PidRecord,
        metadata: &MetadataMap,
    ) -> RegistryResult<String>;

    /// Retire the record's identifier: hard-delete a reserved entry,
    /// tombstone a public one. The fetch phase propagates; never guesses
    /// when the current registry status cannot be read.
    fn delete_identifier(&self, record: &PidRecord) -> RegistryResult<()>;

    /// Transition the identifier to public. Soft-fail: returns `false` and
    /// logs instead of raising, so record publication is not blocked by a
    /// registry hiccup.
    fn publicize_identifier(&self, record: &PidRecord) -> bool;

    /// The registry-facing identifier string for the record. Fails when no
    /// local identifier has been assigned yet.
    fn identifier_from_record(&self, record: &PidRecord) -> RegistryResult<String>;
}

/// Strategy table mapping protocol strings to provider implementations.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Box<dyn PidProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider under its own protocol key. A later registration
    /// for the same protocol replaces the earlier one.
    pub fn register(&mut self, provider: Box<dyn PidProvider>) {
        self.providers
            .insert(provider.protocol().to_string(), provider);
    }

    /// Provider for a protocol string.
    pub fn get(&self, protocol: &str) -> RegistryResult<&dyn PidProvider> {
        self.providers
            .get(protocol)
            .map(|p| p.as_ref())
            .ok_or_else(|| RegistryError::UnknownProtocol(protocol.to_string()))
    }

    /// Provider matching the record's protocol.
    pub fn for_record(&self, record: &PidRecord) -> RegistryResult<&dyn PidProvider> {
        self.get(&record.protocol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::RegistryClient;
    use crate::config::RegistryConfig;
    use crate::testing::MockTransport;

    fn registry_with_doi() -> ProviderRegistry {
        let config = RegistryConfig::default().with_credentials("apitest", "apitest");
        let client = RegistryClient::new(MockTransport::new(), &config);
        let mut registry = ProviderRegistry::new();
        registry.register(Box::new(DoiProvider::new(client, &config)));
        registry
    }

    #[test]
    fn test_dispatch_by_protocol() {
        let registry = registry_with_doi();
        assert_eq!(registry.get("doi").unwrap().protocol(), "doi");
    }

    #[test]
    fn test_unknown_protocol_is_typed_error() {
        let registry = registry_with_doi();
        assert!(matches!(
            registry.get("hdl"),
            Err(RegistryError::UnknownProtocol(_))
        ));
    }

    #[test]
    fn test_for_record_uses_record_protocol() {
        let registry = registry_with_doi();
        let record = PidRecord::new("doi", "10.5072/FK2", "/");
        assert!(registry.for_record(&record).is_ok());

        let other = PidRecord::new("hdl", "1902.1", "/");
        assert!(registry.for_record(&other).is_err());
    }
}
