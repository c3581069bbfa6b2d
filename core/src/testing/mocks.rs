//! Mock implementations for testing.
//!
//! [`MockTransport`] is an in-memory registry: a map of identifier →
//! metadata with the same visible behavior as the real naming authority
//! (duplicate creates conflict, partial updates merge, deletes are refused
//! unless the entry is reserved, and privileged calls require a prior
//! successful login). Failure modes are switchable so tests can force the
//! degraded paths.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::anvl::MetadataMap;
use crate::client::{
    FetchOutcome, RegistryError, RegistryResult, RegistryTransport, STATUS_KEY, STATUS_RESERVED,
};
use crate::record::PidRecord;
use crate::sequence::IdentifierSequence;

/// An in-memory registry transport with configurable failure modes.
pub struct MockTransport {
    entries: Mutex<HashMap<String, MetadataMap>>,
    calls: Mutex<Vec<String>>,
    accept_logins: bool,
    authenticated: Mutex<bool>,
    unreachable: Option<String>,
    write_failure: Option<String>,
}

impl MockTransport {
    /// A reachable registry that accepts any login.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            accept_logins: true,
            authenticated: Mutex::new(false),
            unreachable: None,
            write_failure: None,
        }
    }

    /// A registry that rejects every login; privileged calls then fail.
    pub fn rejecting_logins() -> Self {
        Self {
            accept_logins: false,
            ..Self::new()
        }
    }

    /// A registry that cannot be reached at all: fetches report a transient
    /// failure and every other call errors.
    pub fn unreachable(message: impl Into<String>) -> Self {
        Self {
            unreachable: Some(message.into()),
            ..Self::new()
        }
    }

    /// A reachable registry whose privileged writes all fail.
    pub fn failing_writes(message: impl Into<String>) -> Self {
        Self {
            write_failure: Some(message.into()),
            ..Self::new()
        }
    }

    /// Seed an entry, as if it had been created earlier.
    pub fn with_entry(self, identifier: impl Into<String>, metadata: MetadataMap) -> Self {
        self.entries
            .lock()
            .unwrap()
            .insert(identifier.into(), metadata);
        self
    }

    /// Current metadata for an identifier, if the entry exists.
    pub fn entry(&self, identifier: &str) -> Option<MetadataMap> {
        self.entries.lock().unwrap().get(identifier).cloned()
    }

    /// Every call made against this transport, in order, as
    /// `"<operation> <identifier>"` strings.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls whose operation name matches `operation`.
    pub fn call_count(&self, operation: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.split(' ').next() == Some(operation))
            .count()
    }

    fn record_call(&self, operation: &str, identifier: &str) {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{} {}", operation, identifier));
    }

    fn check_reachable(&self) -> RegistryResult<()> {
        match &self.unreachable {
            Some(message) => Err(RegistryError::Unavailable(message.clone())),
            None => Ok(()),
        }
    }

    fn check_session(&self) -> RegistryResult<()> {
        if *self.authenticated.lock().unwrap() {
            Ok(())
        } else {
            Err(RegistryError::Unavailable(
                "no authenticated registry session".to_string(),
            ))
        }
    }

    fn check_writable(&self) -> RegistryResult<()> {
        match &self.write_failure {
            Some(message) => Err(RegistryError::Unavailable(message.clone())),
            None => Ok(()),
        }
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryTransport for MockTransport {
    fn login(&mut self, username: &str, _password: &str) -> RegistryResult<()> {
        self.record_call("login", username);
        self.check_reachable()?;
        if !self.accept_logins {
            return Err(RegistryError::Unavailable(
                "login rejected with status 401".to_string(),
            ));
        }
        *self.authenticated.lock().unwrap() = true;
        Ok(())
    }

    fn fetch(&self, identifier: &str) -> FetchOutcome {
        self.record_call("fetch", identifier);
        if let Some(message) = &self.unreachable {
            return FetchOutcome::Transient(message.clone());
        }
        match self.entries.lock().unwrap().get(identifier) {
            Some(metadata) => FetchOutcome::Found(metadata.clone()),
            None => FetchOutcome::NotFound,
        }
    }

    fn create(&self, identifier: &str, metadata: &MetadataMap) -> RegistryResult<String> {
        self.record_call("create", identifier);
        self.check_reachable()?;
        self.check_session()?;
        self.check_writable()?;

        let mut entries = self.entries.lock().unwrap();
        if entries.contains_key(identifier) {
            return Err(RegistryError::Conflict(identifier.to_string()));
        }
        entries.insert(identifier.to_string(), metadata.clone());
        Ok(identifier.to_string())
    }

    fn update(&self, identifier: &str, metadata: &MetadataMap) -> RegistryResult<()> {
        self.record_call("update", identifier);
        self.check_reachable()?;
        self.check_session()?;
        self.check_writable()?;

        let mut entries = self.entries.lock().unwrap();
        let Some(entry) = entries.get_mut(identifier) else {
            return Err(RegistryError::NotFoundOrRegistryError(
                identifier.to_string(),
            ));
        };
        for (name, value) in metadata {
            entry.insert(name.clone(), value.clone());
        }
        Ok(())
    }

    fn delete(&self, identifier: &str) -> RegistryResult<()> {
        self.record_call("delete", identifier);
        self.check_reachable()?;
        self.check_session()?;
        self.check_writable()?;

        let mut entries = self.entries.lock().unwrap();
        let Some(entry) = entries.get(identifier) else {
            return Err(RegistryError::NotFoundOrRegistryError(
                identifier.to_string(),
            ));
        };
        if entry.get(STATUS_KEY).map(String::as_str) != Some(STATUS_RESERVED) {
            return Err(RegistryError::PreconditionFailed(format!(
                "identifier {} is not reserved",
                identifier
            )));
        }
        entries.remove(identifier);
        Ok(())
    }
}

/// A sequence generator that hands out pre-seeded local identifiers.
pub struct MockSequence {
    queue: Mutex<Vec<String>>,
}

impl MockSequence {
    /// Identifiers are handed out in the order given.
    pub fn with_identifiers(identifiers: &[&str]) -> Self {
        let mut queue: Vec<String> = identifiers.iter().map(|s| s.to_string()).collect();
        queue.reverse();
        Self {
            queue: Mutex::new(queue),
        }
    }
}

impl IdentifierSequence for MockSequence {
    fn generate(&self, _record: &PidRecord) -> String {
        self.queue
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| "EXHAUSTED".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authenticated(mut transport: MockTransport) -> MockTransport {
        transport.login("apitest", "apitest").unwrap();
        transport
    }

    #[test]
    fn test_partial_update_merges_keys() {
        let transport = authenticated(MockTransport::new());
        let initial: MetadataMap = [
            ("_status".to_string(), "reserved".to_string()),
            ("datacite.title".to_string(), "Old".to_string()),
        ]
        .into_iter()
        .collect();
        transport.create("doi:10.5072/FK2/X", &initial).unwrap();

        let update: MetadataMap = [("datacite.title".to_string(), "New".to_string())]
            .into_iter()
            .collect();
        transport.update("doi:10.5072/FK2/X", &update).unwrap();

        let entry = transport.entry("doi:10.5072/FK2/X").unwrap();
        assert_eq!(entry.get("_status").unwrap(), "reserved");
        assert_eq!(entry.get("datacite.title").unwrap(), "New");
    }

    #[test]
    fn test_delete_requires_reserved_status() {
        let transport = authenticated(MockTransport::new());
        let public: MetadataMap = [("_status".to_string(), "public".to_string())]
            .into_iter()
            .collect();
        transport.create("doi:10.5072/FK2/X", &public).unwrap();

        assert!(matches!(
            transport.delete("doi:10.5072/FK2/X"),
            Err(RegistryError::PreconditionFailed(_))
        ));
        assert!(transport.entry("doi:10.5072/FK2/X").is_some());
    }

    #[test]
    fn test_privileged_calls_require_login() {
        let transport = MockTransport::new();
        assert!(matches!(
            transport.create("doi:10.5072/FK2/X", &MetadataMap::new()),
            Err(RegistryError::Unavailable(_))
        ));
    }

    #[test]
    fn test_call_recording() {
        let transport = authenticated(MockTransport::new());
        let _ = transport.fetch("doi:10.5072/FK2/X");
        let _ = transport.fetch("doi:10.5072/FK2/Y");
        assert_eq!(transport.call_count("fetch"), 2);
        assert_eq!(transport.call_count("delete"), 0);
    }

    #[test]
    fn test_mock_sequence_order() {
        let sequence = MockSequence::with_identifiers(&["AAA", "BBB"]);
        let record = PidRecord::new("doi", "10.5072/FK2", "/");
        assert_eq!(sequence.generate(&record), "AAA");
        assert_eq!(sequence.generate(&record), "BBB");
    }
}
