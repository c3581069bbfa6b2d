//! DOI provider: the reserve/publicize/withdraw state machine.
//!
//! A record moves through `unregistered → reserved → public → withdrawn`
//! with respect to the registry. Withdrawal is only reachable from public;
//! a reserved identifier is hard-deleted from the registry instead (the
//! registry enforces that precondition). Public identifiers are never
//! deleted; withdrawal tombstones the entry and points `_target` away
//! from the record's landing page.

use chrono::Utc;
use log::{debug, info, warn};

use crate::anvl::MetadataMap;
use crate::client::{
    warn_with_causes, FetchOutcome, HttpRegistryClient, RegistryClient, RegistryError,
    RegistryResult, RegistryTransport, STATUS_KEY, STATUS_PUBLIC, STATUS_RESERVED,
    STATUS_WITHDRAWN, TARGET_KEY, UNAVAILABLE_SENTINEL,
};
use crate::config::RegistryConfig;
use crate::identifier::GlobalIdentifier;
use crate::record::PidRecord;

use super::PidProvider;

/// DOI provider over an EZID-style registry.
///
/// Generic over the transport so the state machine is testable against an
/// in-memory registry; see [`EzidDoiProvider`] for the production alias.
pub struct DoiProvider<T: RegistryTransport> {
    client: RegistryClient<T>,
    site_url: String,
    registry_url: String,
    publisher: String,
}

/// Production HTTP-backed DOI provider.
pub type EzidDoiProvider = DoiProvider<crate::client::HttpRegistryTransport>;

impl EzidDoiProvider {
    /// Build the production provider from configuration, logging in to the
    /// registry eagerly (tolerant of failure, see [`HttpRegistryClient`]).
    pub fn from_config(config: &RegistryConfig) -> RegistryResult<Self> {
        let client = HttpRegistryClient::from_config(config)?;
        Ok(Self::new(client, config))
    }
}

impl<T: RegistryTransport> DoiProvider<T> {
    /// Wrap an already-constructed client.
    pub fn new(client: RegistryClient<T>, config: &RegistryConfig) -> Self {
        Self {
            client,
            site_url: config.site_url.trim_end_matches('/').to_string(),
            registry_url: config.base_url.trim_end_matches('/').to_string(),
            publisher: config.publisher.clone(),
        }
    }

    /// The wrapped client, mainly for test inspection.
    pub fn client(&self) -> &RegistryClient<T> {
        &self.client
    }

    /// Landing page the identifier resolves to while the record is live.
    fn target_url(&self, identifier: &str) -> String {
        format!("{}/dataset.xhtml?persistentId={}", self.site_url, identifier)
    }

    /// Generic registry landing page used once content is withdrawn, so the
    /// identifier stops resolving to the record.
    fn registry_landing_url(&self, identifier: &str) -> String {
        format!("{}/id/{}", self.registry_url, identifier)
    }

    /// Creator/title/publisher triple shared by create and update metadata.
    /// Empty authors and publisher become the registry's `:unav` sentinel.
    fn update_metadata(&self, record: &PidRecord) -> MetadataMap {
        debug!("update_metadata");
        let mut authors = record.authors_str();
        if authors.is_empty() {
            authors = UNAVAILABLE_SENTINEL.to_string();
        }
        let mut publisher = self.publisher.clone();
        if publisher.is_empty() {
            publisher = UNAVAILABLE_SENTINEL.to_string();
        }

        let mut metadata = MetadataMap::new();
        metadata.insert("datacite.creator".to_string(), authors);
        metadata.insert("datacite.title".to_string(), record.title().to_string());
        metadata.insert("datacite.publisher".to_string(), publisher);
        metadata
    }

    /// Full metadata written at reservation time (everything but `_status`,
    /// which the state machine sets per transition).
    fn create_metadata(&self, record: &PidRecord, identifier: &str) -> MetadataMap {
        debug!("create_metadata");
        let mut metadata = self.update_metadata(record);
        metadata.insert(
            "datacite.publicationyear".to_string(),
            Utc::now().format("%Y").to_string(),
        );
        metadata.insert("datacite.resourcetype".to_string(), "Dataset".to_string());
        metadata.insert(TARGET_KEY.to_string(), self.target_url(identifier));
        metadata
    }

    /// Rewrite `_status` together with the descriptive triple and the
    /// record's landing page. Soft-fail: a registry error has already been
    /// logged by the client and surfaces only as `false`.
    fn update_identifier_status(&self, record: &PidRecord, status: &str) -> bool {
        debug!("update_identifier_status {}", status);
        let identifier = match self.identifier_from_record(record) {
            Ok(identifier) => identifier,
            Err(err) => {
                warn_with_causes("update_identifier_status", &err);
                return false;
            }
        };
        let mut metadata = self.update_metadata(record);
        metadata.insert(STATUS_KEY.to_string(), status.to_string());
        metadata.insert(TARGET_KEY.to_string(), self.target_url(&identifier));
        self.client.set_metadata(&identifier, &metadata).is_ok()
    }
}

impl<T: RegistryTransport> PidProvider for DoiProvider<T> {
    fn protocol(&self) -> &str {
        "doi"
    }

    fn register_when_published(&self) -> bool {
        false
    }

    fn already_exists(&self, record: &PidRecord) -> RegistryResult<bool> {
        debug!("already_exists");
        let identifier = self.identifier_from_record(record)?;
        match self.client.fetch(&identifier) {
            FetchOutcome::Found(metadata) => Ok(!metadata.is_empty()),
            FetchOutcome::NotFound => Ok(false),
            FetchOutcome::Transient(cause) => {
                let err = RegistryError::Unavailable(cause);
                warn_with_causes("already_exists", &err);
                Err(err)
            }
        }
    }

    fn create_identifier(&self, record: &mut PidRecord) -> RegistryResult<String> {
        debug!("create_identifier");
        let identifier = self.identifier_from_record(record)?;
        let mut metadata = self.create_metadata(record, &identifier);
        metadata.insert(STATUS_KEY.to_string(), STATUS_RESERVED.to_string());

        let receipt = self.client.create_identifier(&identifier, &metadata)?;
        debug!("created identifier, receipt: {}", receipt);
        record.mark_registered(Utc::now(), Some(receipt.clone()));
        Ok(receipt)
    }

    fn get_identifier_metadata(&self, record: &PidRecord) -> MetadataMap {
        debug!("get_identifier_metadata");
        let identifier = match self.identifier_from_record(record) {
            Ok(identifier) => identifier,
            Err(err) => {
                warn_with_causes("get_identifier_metadata", &err);
                return MetadataMap::new();
            }
        };
        match self.client.fetch(&identifier) {
            FetchOutcome::Found(metadata) => metadata,
            FetchOutcome::NotFound => MetadataMap::new(),
            FetchOutcome::Transient(cause) => {
                let err = RegistryError::Unavailable(cause);
                warn_with_causes("get_identifier_metadata", &err);
                MetadataMap::new()
            }
        }
    }

    fn lookup_metadata_from_identifier(
        &self,
        protocol: &str,
        authority: &str,
        separator: &str,
        local: &str,
    ) -> MetadataMap {
        debug!("lookup_metadata_from_identifier");
        let identifier = GlobalIdentifier::new(protocol, authority, separator, local).format();
        match self.client.fetch(&identifier) {
            FetchOutcome::Found(metadata) => metadata,
            _ => {
                // A free identifier is the expected answer here, not an error.
                debug!("identifier {} is free", identifier);
                MetadataMap::new()
            }
        }
    }

    fn modify_identifier(
        &self,
        record: &PidRecord,
        metadata: &MetadataMap,
    ) -> RegistryResult<String> {
        debug!("modify_identifier");
        let identifier = self.identifier_from_record(record)?;
        self.client.set_metadata(&identifier, metadata)?;
        Ok(identifier)
    }

    fn delete_identifier(&self, record: &PidRecord) -> RegistryResult<()> {
        debug!("delete_identifier");
        let identifier = self.identifier_from_record(record)?;

        let metadata = match self.client.fetch(&identifier) {
            FetchOutcome::Found(metadata) => metadata,
            FetchOutcome::NotFound => {
                let err = RegistryError::NotFoundOrRegistryError(identifier.clone());
                warn_with_causes("delete_identifier", &err);
                return Err(err);
            }
            FetchOutcome::Transient(cause) => {
                let err = RegistryError::Unavailable(cause);
                warn_with_causes("delete_identifier", &err);
                return Err(err);
            }
        };

        match metadata.get(STATUS_KEY).map(String::as_str) {
            Some(STATUS_RESERVED) => {
                info!("deleting reserved identifier {}", identifier);
                // Failure already logged by the client; the registry keeps
                // the reserved entry and the local flag stays as it was.
                let _ = self.client.delete_identifier(&identifier);
                Ok(())
            }
            Some(STATUS_PUBLIC) => {
                // Released content is never hard-deleted: tombstone the
                // entry, then break the forward link to the record.
                self.update_identifier_status(record, STATUS_WITHDRAWN);
                let mut target = MetadataMap::new();
                target.insert(
                    TARGET_KEY.to_string(),
                    self.registry_landing_url(&identifier),
                );
                // Failure already logged; the tombstone status is in place.
                let _ = self.modify_identifier(record, &target);
                Ok(())
            }
            other => {
                warn!(
                    "identifier {} has unexpected _status {:?}; leaving it untouched",
                    identifier, other
                );
                Ok(())
            }
        }
    }

    fn publicize_identifier(&self, record: &PidRecord) -> bool {
        debug!("publicize_identifier");
        self.update_identifier_status(record, STATUS_PUBLIC)
    }

    fn identifier_from_record(&self, record: &PidRecord) -> RegistryResult<String> {
        record
            .global_id()
            .map(|id| id.format())
            .ok_or_else(|| {
                RegistryError::ValidationFailed(
                    "record has no local identifier assigned".to_string(),
                )
            })
    }
}
