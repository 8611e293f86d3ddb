//! Best-effort `key: value` extraction from WHOIS response text.
//!
//! WHOIS has no response grammar. Registries mostly emit one field per line
//! and repeat fields across registry/registrar sections, so the first
//! occurrence of a key is kept and later ones are ignored.

use std::sync::OnceLock;

use regex::Regex;
use serde::ser::{Serialize, SerializeMap, Serializer};

fn line_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Key is everything before the first colon; value is the remainder.
    RE.get_or_init(|| Regex::new(r"^\s*([^:]+):(.*)$").expect("valid regex"))
}

/// Field name to first-seen value, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedFields {
    fields: Vec<(String, String)>,
}

impl ParsedFields {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// First non-empty value among `keys`, tried in order.
    pub fn first_of(&self, keys: &[&str]) -> Option<&str> {
        keys.iter()
            .find_map(|key| self.get(key).filter(|value| !value.is_empty()))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Insert unless the key already holds a non-empty value. An empty
    /// value is replaced in place, keeping the key's first-seen position.
    fn insert_first(&mut self, key: &str, value: &str) {
        match self.fields.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) if existing.is_empty() => *existing = value.to_string(),
            Some(_) => {}
            None => self.fields.push((key.to_string(), value.to_string())),
        }
    }
}

impl Serialize for ParsedFields {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Parse raw WHOIS text into fields.
///
/// Keys starting with `%` or `#` are comment/banner lines and are skipped,
/// as are lines with an empty key. `Key:` with nothing after it records
/// `""` until a populated occurrence of the same key turns up.
pub fn parse_response(raw: &str) -> ParsedFields {
    let mut parsed = ParsedFields::default();

    for line in raw.lines() {
        let Some(caps) = line_pattern().captures(line) else {
            continue;
        };
        let key = caps[1].trim();
        let value = caps[2].trim();

        if key.is_empty() || key.starts_with('%') || key.starts_with('#') {
            continue;
        }

        parsed.insert_first(key, value);
    }

    parsed
}
