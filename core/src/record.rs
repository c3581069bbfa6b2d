//! The identifiable record model.
//!
//! A [`PidRecord`] is any entity that can hold a persistent identifier: the
//! identifier parts, the local registration flag, and the ordered descriptive
//! fields the registry metadata is derived from. Records are never deleted
//! locally once the registry knows about them; a withdrawn identifier is
//! tombstoned via its registry `_status`, not by removing the record.

use crate::identifier::GlobalIdentifier;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Publication state of the record's current version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionState {
    /// Unpublished working version.
    Draft,
    /// Publicly released version.
    Released,
}

impl Default for VersionState {
    fn default() -> Self {
        VersionState::Draft
    }
}

/// A record that can hold a persistent identifier.
///
/// The local identifier part is assigned once and never reassigned;
/// [`PidRecord::assign_identifier`] ignores later calls. `is_registered`
/// flips to `true` only after a confirmed registry write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PidRecord {
    /// Identifier system, e.g. `doi`.
    pub protocol: String,
    /// Authority namespace, e.g. `10.5072/FK2`.
    pub authority: String,
    /// Separator between authority and local part.
    pub separator: String,
    identifier: Option<String>,
    is_registered: bool,
    registration_time: Option<DateTime<Utc>>,
    registration_receipt: Option<String>,
    /// Descriptive fields in display order (`author`, `title`, ...).
    fields: Vec<(String, String)>,
    /// Publication state of the current version.
    pub version_state: VersionState,
}

impl PidRecord {
    /// Create an unregistered record with no local identifier yet.
    pub fn new(
        protocol: impl Into<String>,
        authority: impl Into<String>,
        separator: impl Into<String>,
    ) -> Self {
        Self {
            protocol: protocol.into(),
            authority: authority.into(),
            separator: separator.into(),
            identifier: None,
            is_registered: false,
            registration_time: None,
            registration_receipt: None,
            fields: Vec::new(),
            version_state: VersionState::default(),
        }
    }

    /// Append a descriptive field, preserving insertion order.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Set the publication state.
    pub fn with_version_state(mut self, state: VersionState) -> Self {
        self.version_state = state;
        self
    }

    /// Assign the local identifier part. A second call is a no-op: the local
    /// identifier is immutable once assigned.
    pub fn assign_identifier(&mut self, local: impl Into<String>) {
        if self.identifier.is_none() {
            self.identifier = Some(local.into());
        }
    }

    /// The local identifier part, if assigned.
    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref()
    }

    /// The fully-qualified identifier, if the local part has been assigned.
    pub fn global_id(&self) -> Option<GlobalIdentifier> {
        self.identifier.as_ref().map(|local| {
            GlobalIdentifier::new(
                self.protocol.clone(),
                self.authority.clone(),
                self.separator.clone(),
                local.clone(),
            )
        })
    }

    /// Whether a registry write has been confirmed for this record.
    pub fn is_registered(&self) -> bool {
        self.is_registered
    }

    /// When the registry write was confirmed.
    pub fn registration_time(&self) -> Option<DateTime<Utc>> {
        self.registration_time
    }

    /// The confirmation string returned by the registry at reservation time.
    pub fn registration_receipt(&self) -> Option<&str> {
        self.registration_receipt.as_deref()
    }

    /// Record a confirmed registry write.
    pub fn mark_registered(&mut self, time: DateTime<Utc>, receipt: Option<String>) {
        self.is_registered = true;
        self.registration_time = Some(time);
        if receipt.is_some() {
            self.registration_receipt = receipt;
        }
    }

    /// First value of the named descriptive field.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// All values of the named descriptive field, in insertion order.
    pub fn field_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> {
        self.fields
            .iter()
            .filter(move |(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Authors joined with `"; "`, in insertion order. Empty when the record
    /// carries no `author` fields.
    pub fn authors_str(&self) -> String {
        self.field_values("author").collect::<Vec<_>>().join("; ")
    }

    /// Record title, or the empty string when absent.
    pub fn title(&self) -> &str {
        self.field("title").unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_assigned_once() {
        let mut record = PidRecord::new("doi", "10.5072/FK2", "/");
        assert!(record.identifier().is_none());
        record.assign_identifier("ABCD12");
        record.assign_identifier("OTHER");
        assert_eq!(record.identifier(), Some("ABCD12"));
    }

    #[test]
    fn test_global_id_requires_identifier() {
        let mut record = PidRecord::new("doi", "10.5072/FK2", "/");
        assert!(record.global_id().is_none());
        record.assign_identifier("ABCD12");
        assert_eq!(
            record.global_id().unwrap().format(),
            "doi:10.5072/FK2/ABCD12"
        );
    }

    #[test]
    fn test_authors_str_joins_in_order() {
        let record = PidRecord::new("doi", "10.5072/FK2", "/")
            .with_field("author", "Smith, Jane")
            .with_field("title", "Test Dataset")
            .with_field("author", "Doe, John");
        assert_eq!(record.authors_str(), "Smith, Jane; Doe, John");
        assert_eq!(record.title(), "Test Dataset");
    }

    #[test]
    fn test_authors_str_empty_without_authors() {
        let record = PidRecord::new("doi", "10.5072/FK2", "/");
        assert_eq!(record.authors_str(), "");
        assert_eq!(record.title(), "");
    }

    #[test]
    fn test_mark_registered() {
        let mut record = PidRecord::new("doi", "10.5072/FK2", "/");
        record.assign_identifier("ABCD12");
        assert!(!record.is_registered());
        record.mark_registered(Utc::now(), Some("doi:10.5072/FK2/ABCD12".into()));
        assert!(record.is_registered());
        assert!(record.registration_time().is_some());
        assert_eq!(
            record.registration_receipt(),
            Some("doi:10.5072/FK2/ABCD12")
        );
    }
}
