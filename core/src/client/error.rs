//! Registry error types.

use thiserror::Error;

/// Errors surfaced by registry operations.
///
/// Low-level transport failures are always logged at WARN before being
/// wrapped in one of these; logging is not a substitute for propagation.
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    /// Transport or authentication failure reaching the registry.
    #[error("registry unavailable: {0}")]
    Unavailable(String),

    /// Create attempted for an identifier the registry already holds.
    #[error("identifier already exists in registry: {0}")]
    Conflict(String),

    /// The identifier is absent, or the registry failed in a way the
    /// protocol does not distinguish from absence. Callers of
    /// `get_metadata` cannot tell the two apart; this is a documented
    /// limitation of the underlying API.
    #[error("identifier not found or registry error: {0}")]
    NotFoundOrRegistryError(String),

    /// The registry refused the operation, e.g. a hard delete of an
    /// identifier whose `_status` is not `reserved`.
    #[error("registry precondition failed: {0}")]
    PreconditionFailed(String),

    /// Malformed record state or descriptive metadata upstream of the
    /// registry call, e.g. no local identifier assigned yet.
    #[error("validation failed: {0}")]
    ValidationFailed(String),

    /// Registration was configured as mandatory and did not succeed; the
    /// enclosing create/publish operation must be abandoned.
    #[error("registration required but failed: {0}")]
    RegistrationRequiredButFailed(String),

    /// No provider is registered for the record's protocol.
    #[error("no identifier provider registered for protocol '{0}'")]
    UnknownProtocol(String),

    /// Uniqueness guard tripped during record creation.
    #[error(
        "record with identifier '{identifier}', protocol '{protocol}' and authority '{authority}' already exists"
    )]
    DuplicateIdentifier {
        identifier: String,
        protocol: String,
        authority: String,
    },
}

/// Result alias for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Log an operation failure and its cause chain at WARN level.
pub(crate) fn warn_with_causes(operation: &str, err: &(dyn std::error::Error + 'static)) {
    log::warn!("{} failed: {}", operation, err);
    let mut source = err.source();
    while let Some(cause) = source {
        log::warn!("caused by: {}", cause);
        source = cause.source();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_identifier_message() {
        let err = RegistryError::DuplicateIdentifier {
            identifier: "ABCD12".into(),
            protocol: "doi".into(),
            authority: "10.5072/FK2".into(),
        };
        let message = err.to_string();
        assert!(message.contains("ABCD12"));
        assert!(message.contains("doi"));
        assert!(message.contains("10.5072/FK2"));
    }
}
