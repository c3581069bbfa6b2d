//! Global identifier formatting and parsing.
//!
//! A global identifier is the concatenation `protocol:authority<separator>local`,
//! e.g. `doi:10.5072/FK2/ABCD12` with protocol `doi`, authority `10.5072/FK2`,
//! separator `/`, and local part `ABCD12`. The authority may itself contain the
//! separator character; parsing therefore splits on the *last* occurrence.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A fully-qualified persistent identifier.
///
/// No character-set validation is applied; callers guarantee well-formed
/// parts. The registry is addressed by the formatted string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GlobalIdentifier {
    /// Identifier system, e.g. `doi`.
    pub protocol: String,
    /// Namespace the naming authority manages, e.g. `10.5072/FK2`.
    pub authority: String,
    /// Separator between authority and local part, e.g. `/`.
    pub separator: String,
    /// Local identifier part, unique within the authority namespace.
    pub local: String,
}

impl GlobalIdentifier {
    /// Build an identifier from its four parts.
    pub fn new(
        protocol: impl Into<String>,
        authority: impl Into<String>,
        separator: impl Into<String>,
        local: impl Into<String>,
    ) -> Self {
        Self {
            protocol: protocol.into(),
            authority: authority.into(),
            separator: separator.into(),
            local: local.into(),
        }
    }

    /// Concatenate the parts into the registry-facing identifier string.
    pub fn format(&self) -> String {
        format!(
            "{}:{}{}{}",
            self.protocol, self.authority, self.separator, self.local
        )
    }

    /// Parse a formatted identifier back into its parts.
    ///
    /// The separator used at format time must be supplied because it is not
    /// self-describing. Returns `None` when the string does not contain a
    /// protocol prefix or the separator. The local part must not contain the
    /// separator; the authority may.
    pub fn parse(formatted: &str, separator: &str) -> Option<Self> {
        let (protocol, rest) = formatted.split_once(':')?;
        let (authority, local) = rest.rsplit_once(separator)?;
        if protocol.is_empty() || authority.is_empty() || local.is_empty() {
            return None;
        }
        Some(Self::new(protocol, authority, separator, local))
    }
}

impl fmt::Display for GlobalIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format() {
        let id = GlobalIdentifier::new("doi", "10.5072/FK2", "/", "ABCD12");
        assert_eq!(id.format(), "doi:10.5072/FK2/ABCD12");
    }

    #[test]
    fn test_parse_round_trip() {
        let cases = [
            ("doi", "10.5072/FK2", "/", "ABCD12"),
            ("doi", "10.5072", "/", "XYZ"),
            ("hdl", "1902.1", "/", "10002"),
            ("doi", "10.50-72", "-", "AB"),
        ];
        for (protocol, authority, separator, local) in cases {
            let id = GlobalIdentifier::new(protocol, authority, separator, local);
            let parsed = GlobalIdentifier::parse(&id.format(), separator)
                .unwrap_or_else(|| panic!("failed to parse {}", id));
            assert_eq!(parsed, id);
        }
    }

    #[test]
    fn test_parse_authority_containing_separator() {
        let parsed = GlobalIdentifier::parse("doi:10.5072/FK2/ABCD12", "/").unwrap();
        assert_eq!(parsed.authority, "10.5072/FK2");
        assert_eq!(parsed.local, "ABCD12");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(GlobalIdentifier::parse("no-protocol-part", "/").is_none());
        assert!(GlobalIdentifier::parse("doi:noseparator", "/").is_none());
        assert!(GlobalIdentifier::parse("doi:10.5072/", "/").is_none());
    }

    #[test]
    fn test_display_matches_format() {
        let id = GlobalIdentifier::new("doi", "10.5072/FK2", "/", "ABCD12");
        assert_eq!(id.to_string(), id.format());
    }
}
