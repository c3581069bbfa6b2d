//! Registry protocol client.
//!
//! ## Module Organization
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`transport`] | Wire-level contract and the HTTP implementation |
//! | [`error`] | Typed registry errors and the result alias |
//!
//! [`RegistryClient`] wraps a transport with the uniform failure policy:
//! every registry failure is logged at WARN (message plus cause chain)
//! before it is re-raised to the caller. The client holds no business
//! state; status decisions live in [`crate::provider`].

mod error;
mod transport;

pub use error::{RegistryError, RegistryResult};
pub use transport::{FetchOutcome, HttpRegistryTransport, RegistryTransport};

pub(crate) use error::warn_with_causes;

use log::{debug, warn};

use crate::anvl::MetadataMap;
use crate::config::RegistryConfig;

/// Registry-reserved metadata key holding the identifier status.
pub const STATUS_KEY: &str = "_status";
/// Registry-reserved metadata key holding the landing-page URL.
pub const TARGET_KEY: &str = "_target";

/// `_status` value for an identifier created but not publicly resolvable.
pub const STATUS_RESERVED: &str = "reserved";
/// `_status` value for a publicly resolvable identifier.
pub const STATUS_PUBLIC: &str = "public";
/// `_status` value written when a public identifier is withdrawn.
pub const STATUS_WITHDRAWN: &str = "unavailable | withdrawn by author";

/// Registry sentinel for "unavailable / not applicable" metadata values.
pub const UNAVAILABLE_SENTINEL: &str = ":unav";

/// Client for one naming-authority registry.
///
/// Constructed once per process and passed by reference to all callers; the
/// session is established at construction and never renewed. Construction is
/// tolerant: a failed login is logged and leaves the client degraded
/// (reads work, privileged calls fail) rather than aborting startup.
pub struct RegistryClient<T: RegistryTransport> {
    transport: T,
}

/// Convenience alias for the production HTTP-backed client.
pub type HttpRegistryClient = RegistryClient<HttpRegistryTransport>;

impl RegistryClient<HttpRegistryTransport> {
    /// Build an HTTP client from configuration and log in eagerly.
    pub fn from_config(config: &RegistryConfig) -> RegistryResult<Self> {
        let transport = HttpRegistryTransport::new(config)?;
        Ok(Self::new(transport, config))
    }
}

impl<T: RegistryTransport> RegistryClient<T> {
    /// Wrap an already-constructed transport and log in eagerly.
    pub fn new(mut transport: T, config: &RegistryConfig) -> Self {
        match &config.credentials {
            Some(credentials) => {
                if let Err(err) = transport.login(&credentials.username, &credentials.password) {
                    warn!("registry login failed; client will run degraded");
                    warn_with_causes("login", &err);
                }
            }
            None => {
                warn!("no registry credentials configured; privileged calls will fail");
            }
        }
        Self { transport }
    }

    /// The underlying transport, mainly for test inspection.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Fetch metadata, keeping the tagged outcome. Call sites that need to
    /// distinguish absence from failure (withdraw, lookup) use this; the
    /// public `get_metadata` deliberately conflates the two.
    pub fn fetch(&self, identifier: &str) -> FetchOutcome {
        debug!("fetch {}", identifier);
        self.transport.fetch(identifier)
    }

    /// Fetch metadata for an identifier that is expected to exist.
    ///
    /// Fails with [`RegistryError::NotFoundOrRegistryError`] both when the
    /// identifier is absent and when the registry is unreachable; the
    /// caller cannot distinguish the two (documented protocol limitation).
    pub fn get_metadata(&self, identifier: &str) -> RegistryResult<MetadataMap> {
        debug!("get_metadata {}", identifier);
        match self.transport.fetch(identifier) {
            FetchOutcome::Found(metadata) => Ok(metadata),
            FetchOutcome::NotFound => {
                let err = RegistryError::NotFoundOrRegistryError(identifier.to_string());
                warn_with_causes("get_metadata", &err);
                Err(err)
            }
            FetchOutcome::Transient(cause) => {
                let err = RegistryError::NotFoundOrRegistryError(cause);
                warn_with_causes("get_metadata", &err);
                Err(err)
            }
        }
    }

    /// Create an identifier with initial metadata. Not idempotent: a second
    /// create for the same identifier fails with [`RegistryError::Conflict`].
    pub fn create_identifier(
        &self,
        identifier: &str,
        metadata: &MetadataMap,
    ) -> RegistryResult<String> {
        debug!("create_identifier {}", identifier);
        self.transport.create(identifier, metadata).map_err(|err| {
            warn_with_causes("create_identifier", &err);
            err
        })
    }

    /// Partial metadata update: keys absent from `metadata` are untouched.
    pub fn set_metadata(&self, identifier: &str, metadata: &MetadataMap) -> RegistryResult<()> {
        debug!("set_metadata {}", identifier);
        self.transport.update(identifier, metadata).map_err(|err| {
            warn_with_causes("set_metadata", &err);
            err
        })
    }

    /// Hard-delete an identifier. The registry enforces that only reserved
    /// identifiers may be deleted.
    pub fn delete_identifier(&self, identifier: &str) -> RegistryResult<()> {
        debug!("delete_identifier {}", identifier);
        self.transport.delete(identifier).map_err(|err| {
            warn_with_causes("delete_identifier", &err);
            err
        })
    }
}
