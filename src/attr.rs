//! Ordered `key=value` attribute lists (RFC 5802 §7 `attr-val` / `value`).
//!
//! SCRAM messages are comma-joined sequences of single-character-keyed
//! attributes. `AuthMessage` (RFC 5802 §3) is defined as the literal
//! concatenation of three such messages, so reconstructing it byte-for-byte
//! requires preserving the exact order and exact separator placement the
//! attributes were parsed in — a `HashMap` would silently reorder them.

use crate::error::Error;

/// Single-character attribute keys used across GS2/SCRAM messages.
pub const USERNAME: char = 'n';
pub const RESERVED_MEXT: char = 'm';
pub const NONCE: char = 'r';
pub const CHANNEL_BINDING: char = 'c';
pub const SALT: char = 's';
pub const ITERATION_COUNT: char = 'i';
pub const PROOF: char = 'p';
pub const VERIFIER: char = 'v';
pub const SERVER_ERROR: char = 'e';
pub const AUTHZID: char = 'a';

/// An ordered, insertion-preserving `key=value` list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeMap {
    entries: Vec<(char, String)>,
}

impl AttributeMap {
    /// An empty map.
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Sets a `key=value` pair. An existing entry for `key` has its value
    /// updated in place, keeping its original position; a new key is
    /// appended at the end.
    pub fn push(&mut self, key: char, value: impl Into<String>) -> &mut Self {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = value.into(),
            None => self.entries.push((key, value.into())),
        }
        self
    }

    /// Returns the value of the first entry with the given key, if any.
    pub fn get(&self, key: char) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// True if no entry with the given key is present.
    pub fn is_missing(&self, key: char) -> bool {
        self.get(key).is_none()
    }

    /// Returns the entries in the order they were parsed or pushed.
    pub fn entries(&self) -> &[(char, String)] {
        &self.entries
    }

    /// Parses a comma-separated `key=value` sequence. Each token must match
    /// `[A-Za-z]=.*` per RFC 5802's `attr-val` grammar; a malformed token is
    /// reported as [`ProtocolError::InvalidEncoding`](crate::error::ProtocolError::InvalidEncoding).
    pub fn parse(s: &str) -> Result<Self, Error> {
        let mut map = Self::new();
        if s.is_empty() {
            return Ok(map);
        }
        for token in s.split(',') {
            let mut chars = token.chars();
            let key = chars.next().ok_or(crate::error::ProtocolError::InvalidEncoding)?;
            if chars.next() != Some('=') {
                return Err(crate::error::ProtocolError::InvalidEncoding.into());
            }
            let value = &token[2..];
            map.push(key, value);
        }
        Ok(map)
    }

    /// Serializes back to `key=value,key=value,...` form.
    pub fn to_string(&self) -> String {
        self.entries
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl std::fmt::Display for AttributeMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_preserves_order() {
        let map = AttributeMap::parse("n=user,r=abc123").unwrap();
        assert_eq!(map.get(USERNAME), Some("user"));
        assert_eq!(map.get(NONCE), Some("abc123"));
        assert_eq!(map.entries()[0].0, USERNAME);
        assert_eq!(map.entries()[1].0, NONCE);
    }

    #[test]
    fn round_trips_through_display() {
        let mut map = AttributeMap::new();
        map.push(NONCE, "abc").push(SALT, "ZGVm").push(ITERATION_COUNT, "4096");
        assert_eq!(map.to_string(), "r=abc,s=ZGVm,i=4096");
        assert_eq!(AttributeMap::parse(&map.to_string()).unwrap(), map);
    }

    #[test]
    fn rejects_missing_equals() {
        assert!(AttributeMap::parse("n").is_err());
        assert!(AttributeMap::parse("nvalue").is_err());
    }

    #[test]
    fn empty_string_parses_to_empty_map() {
        let map = AttributeMap::parse("").unwrap();
        assert_eq!(map.entries().len(), 0);
    }

    #[test]
    fn setting_an_existing_key_updates_value_in_place() {
        let map = AttributeMap::parse("r=first,r=second").unwrap();
        assert_eq!(map.get(NONCE), Some("second"));
        assert_eq!(map.entries().len(), 1);
        assert_eq!(map.entries()[0].0, NONCE);
    }

    #[test]
    fn push_appends_new_keys_and_updates_existing_ones() {
        let mut map = AttributeMap::new();
        map.push(NONCE, "abc").push(SALT, "ZGVm");
        map.push(NONCE, "xyz");
        assert_eq!(map.entries().len(), 2);
        assert_eq!(map.entries()[0], (NONCE, "xyz".to_string()));
        assert_eq!(map.entries()[1], (SALT, "ZGVm".to_string()));
    }
}
