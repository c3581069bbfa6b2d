//! ANVL codec for the registry metadata API.
//!
//! The naming authority exchanges metadata as ANVL: one `name: value` line per
//! element, UTF-8 text. Structural characters are percent-encoded: `%`, CR,
//! LF, and leading whitespace in both names and values, plus `:` in names so
//! the element boundary stays unambiguous. Decoding is tolerant: blank lines
//! and lines without a colon are skipped, and malformed percent escapes are
//! passed through verbatim rather than rejected.

use std::collections::BTreeMap;

/// Metadata element map exchanged with the registry.
///
/// A `BTreeMap` keeps encode order deterministic.
pub type MetadataMap = BTreeMap<String, String>;

/// Encode a metadata map as an ANVL request body.
pub fn encode(metadata: &MetadataMap) -> String {
    let mut out = String::new();
    for (name, value) in metadata {
        out.push_str(&escape_name(name));
        out.push_str(": ");
        out.push_str(&escape_value(value));
        out.push('\n');
    }
    out
}

/// Decode an ANVL response body into a metadata map.
pub fn decode(body: &str) -> MetadataMap {
    let mut metadata = MetadataMap::new();
    for line in body.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        metadata.insert(
            unescape(name.trim()),
            unescape(value.strip_prefix(' ').unwrap_or(value)),
        );
    }
    metadata
}

fn escape_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for (i, c) in name.chars().enumerate() {
        match c {
            '%' => out.push_str("%25"),
            ':' => out.push_str("%3A"),
            '\r' => out.push_str("%0D"),
            '\n' => out.push_str("%0A"),
            ' ' | '\t' if i == 0 => push_escaped(&mut out, c),
            _ => out.push(c),
        }
    }
    out
}

fn escape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for (i, c) in value.chars().enumerate() {
        match c {
            '%' => out.push_str("%25"),
            '\r' => out.push_str("%0D"),
            '\n' => out.push_str("%0A"),
            ' ' | '\t' if i == 0 => push_escaped(&mut out, c),
            _ => out.push(c),
        }
    }
    out
}

/// Escaping the first character is enough to protect leading whitespace:
/// whatever follows the escape sequence is no longer leading.
fn push_escaped(out: &mut String, c: char) {
    out.push('%');
    out.push_str(if c == ' ' { "20" } else { "09" });
}

fn unescape(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let Some(byte) = hex_pair(bytes[i + 1], bytes[i + 2]) {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_pair(hi: u8, lo: u8) -> Option<u8> {
    let hi = (hi as char).to_digit(16)?;
    let lo = (lo as char).to_digit(16)?;
    Some((hi as u8) << 4 | lo as u8)
}
